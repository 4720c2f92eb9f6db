use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Validation,
    NotFound,
    Storage,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Internal => "Internal",
            ErrorKind::Usage => "Usage",
            ErrorKind::Validation => "Validation",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Storage => "Storage",
            ErrorKind::Io => "Io",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "Internal" => Some(ErrorKind::Internal),
            "Usage" => Some(ErrorKind::Usage),
            "Validation" => Some(ErrorKind::Validation),
            "NotFound" => Some(ErrorKind::NotFound),
            "Storage" => Some(ErrorKind::Storage),
            "Io" => Some(ErrorKind::Io),
            _ => None,
        }
    }
}

/// A single rejected field, reported alongside `ErrorKind::Validation`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    id: Option<i64>,
    issues: Vec<FieldIssue>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            id: None,
            issues: Vec::new(),
            source: None,
        }
    }

    pub fn not_found(id: i64) -> Self {
        Self::new(ErrorKind::NotFound)
            .with_message("User not found")
            .with_id(id)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_issues(mut self, issues: Vec<FieldIssue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(id) = self.id {
            write!(f, " (id: {id})")?;
        }
        for issue in &self.issues {
            write!(f, "; {}: {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::new(ErrorKind::Storage)
            .with_message("database operation failed")
            .with_source(err)
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Validation => 4,
        ErrorKind::Storage => 5,
        ErrorKind::Io => 8,
    }
}
