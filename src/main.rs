//! Purpose: `userdesk` CLI entry point.
//! Role: Binary crate root; parses args, starts the API or UI server.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Server configuration is resolved once, before any socket is bound.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};

mod command_dispatch;
mod http;
mod serve;
mod ui_serve;

use command_dispatch::dispatch_command;
use userdesk::api::{Error, ErrorKind, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `userdesk --help`."));
            }
        },
    };

    dispatch_command(cli.command)
}

#[derive(Parser)]
#[command(
    name = "userdesk",
    version,
    about = "User records over HTTP: a JSON CRUD API and a form UI",
    long_about = None,
    before_help = r#"Two processes talk over HTTP:
  - `serve` runs the record API backed by a SQLite file
  - `ui` runs the browser form/list view that calls the API
"#,
    after_help = r#"EXAMPLES
  $ userdesk serve --db ./users.db                 # API on 127.0.0.1:8000
  $ BACKEND_URL=http://127.0.0.1:8000 userdesk ui  # UI on 127.0.0.1:8501
  $ curl -s localhost:8000/users/

  $ userdesk <command> --help"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Serve the user record API over HTTP",
        long_about = r#"Serve the user record API over HTTP (loopback by default).

Routes: POST/GET /users/, GET/PUT/DELETE /users/{id}, GET /healthz."#,
        after_help = r#"EXAMPLES
  $ userdesk serve
  $ userdesk serve --bind 127.0.0.1:9000 --db /var/lib/userdesk/users.db
  $ userdesk serve check --json

NOTES
  - Non-loopback binds require --allow-non-loopback
  - Cross-origin requests are allowed from any origin, with credentials
  - Set RUST_LOG (e.g. debug) to adjust log verbosity"#
    )]
    Serve {
        #[command(subcommand)]
        subcommand: Option<ServeSubcommand>,
        #[command(flatten)]
        run: ServeRunArgs,
    },
    #[command(
        about = "Serve the form UI that manages users through the API",
        after_help = r#"EXAMPLES
  $ userdesk ui
  $ BACKEND_URL=http://10.0.0.5:8000 userdesk ui --bind 127.0.0.1:8600

NOTES
  - The backend URL is read once at startup (--backend-url or BACKEND_URL)"#
    )]
    Ui(UiArgs),
    #[command(
        about = "Generate shell completion scripts",
        after_help = r#"EXAMPLES
  $ userdesk completion bash > ~/.local/share/bash-completion/completions/userdesk
  $ userdesk completion zsh > ~/.zfunc/_userdesk"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ServeSubcommand {
    #[command(
        about = "Validate serve config and print it without starting",
        after_help = r#"NOTES
  - Exits non-zero when config is invalid
  - Does not bind sockets or open the database"#
    )]
    Check {
        #[arg(long, help = "Emit JSON instead of human-readable output")]
        json: bool,
    },
}

#[derive(Args)]
struct ServeRunArgs {
    #[arg(long, default_value = "127.0.0.1:8000", help = "Bind address")]
    bind: String,
    #[arg(
        long,
        env = "USERDESK_DB",
        default_value = "users.db",
        value_name = "PATH",
        help = "SQLite database file",
        value_hint = ValueHint::FilePath
    )]
    db: PathBuf,
    #[arg(long, help = "Allow binding to a non-loopback address")]
    allow_non_loopback: bool,
    #[arg(
        long,
        default_value_t = serve::DEFAULT_MAX_BODY_BYTES,
        help = "Maximum request body size in bytes"
    )]
    max_body_bytes: u64,
}

#[derive(Args)]
struct UiArgs {
    #[arg(long, default_value = "127.0.0.1:8501", help = "Bind address")]
    bind: String,
    #[arg(
        long,
        env = "BACKEND_URL",
        default_value = ui_serve::DEFAULT_BACKEND_URL,
        help = "Base URL of the record API"
    )]
    backend_url: String,
    #[arg(long, help = "Allow binding to a non-loopback address")]
    allow_non_loopback: bool,
}

fn parse_bind(bind: &str) -> Result<SocketAddr, Error> {
    bind.parse().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid bind address")
            .with_hint("Use a host:port value like 127.0.0.1:8000.")
    })
}

fn serve_config_from_run_args(run: ServeRunArgs) -> Result<serve::ServeConfig, Error> {
    Ok(serve::ServeConfig {
        bind: parse_bind(&run.bind)?,
        db_path: run.db,
        allow_non_loopback: run.allow_non_loopback,
        max_body_bytes: run.max_body_bytes,
    })
}

fn ui_config_from_args(args: UiArgs) -> Result<ui_serve::UiConfig, Error> {
    Ok(ui_serve::UiConfig {
        bind: parse_bind(&args.bind)?,
        backend_url: args.backend_url,
        allow_non_loopback: args.allow_non_loopback,
    })
}

fn build_runtime() -> Result<tokio::runtime::Runtime, Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to start runtime")
                .with_source(err)
        })
}

fn emit_json(value: Value) {
    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    println!("{text}");
}

fn emit_serve_check_report(config: &serve::ServeConfig, json: bool) {
    let base_url = format!("http://{}", config.bind);
    if json {
        emit_json(json!({
            "check": {
                "status": "valid",
                "listen": config.bind.to_string(),
                "base_url": base_url,
                "db": config.db_path.display().to_string(),
                "max_body_bytes": config.max_body_bytes,
                "allow_non_loopback": config.allow_non_loopback,
            }
        }));
        return;
    }
    println!("serve config is valid");
    println!("  Listen: {}", config.bind);
    println!("  Users:  {base_url}/users/");
    println!("  DB:     {}", config.db_path.display());
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Validation => "invalid input".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Storage => "storage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(err.kind().as_str()));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(id) = err.id() {
        inner.insert("id".to_string(), json!(id));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
