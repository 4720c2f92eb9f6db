//! Purpose: Spawn `userdesk` server processes for integration tests.
//! Exports: `TestServer`, `serial`, `sample_fields`, `TestResult`.
//! Role: Shared harness for the API, UI, and CLI integration suites.
//! Invariants: Tests that start servers hold the `serial` guard for their whole body.
//! Invariants: Server processes are killed on drop; readiness waits are bounded.
#![allow(dead_code)]

use std::io::Read;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::{Duration, Instant};

use userdesk::api::{RecordClient, RecordFields};

pub type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

static SERVER_LOCK: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    SERVER_LOCK
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

pub struct TestServer {
    child: Child,
    pub base_url: String,
}

impl TestServer {
    /// Start the record API on a fresh port against `db`.
    pub fn api(db: &Path) -> TestResult<Self> {
        Self::start("/healthz", |command, bind| {
            command
                .arg("serve")
                .arg("--bind")
                .arg(bind)
                .arg("--db")
                .arg(db);
        })
    }

    /// Start the form UI on a fresh port, pointed at `backend_url`.
    pub fn ui(backend_url: &str) -> TestResult<Self> {
        Self::start("/", |command, bind| {
            command
                .arg("ui")
                .arg("--bind")
                .arg(bind)
                .env("BACKEND_URL", backend_url);
        })
    }

    fn start(ready_path: &str, configure: impl Fn(&mut Command, &str)) -> TestResult<Self> {
        let mut last_err: Option<Box<dyn std::error::Error>> = None;
        for _attempt in 0..3 {
            let port = pick_port()?;
            let bind = format!("127.0.0.1:{port}");
            let base_url = format!("http://{bind}");

            let mut command = Command::new(env!("CARGO_BIN_EXE_userdesk"));
            command
                .env_remove("USERDESK_DB")
                .env("RUST_LOG", "warn")
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
            configure(&mut command, &bind);
            let mut child = command.spawn()?;

            match wait_for_server(&mut child, &format!("{base_url}{ready_path}")) {
                Ok(()) => return Ok(Self { child, base_url }),
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    last_err = Some(err);
                    sleep(Duration::from_millis(30));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| "server failed to start".into()))
    }

    pub fn client(&self) -> TestResult<RecordClient> {
        Ok(RecordClient::new(self.base_url.clone())?)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn sample_fields(name: &str) -> RecordFields {
    RecordFields {
        name: name.to_string(),
        age: 30,
        gender: "Female".to_string(),
        pincode: "560001".to_string(),
        address: "12 Lake Road".to_string(),
    }
}

pub fn pick_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn wait_for_server(child: &mut Child, url: &str) -> TestResult<()> {
    let start = Instant::now();
    loop {
        if let Ok(resp) = ureq::get(url).call() {
            if resp.status() == 200 {
                return Ok(());
            }
        }
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let detail = stderr.trim();
            return Err(format!(
                "server exited before ready (status: {status}, stderr: {})",
                if detail.is_empty() { "<empty>" } else { detail }
            )
            .into());
        }
        if start.elapsed() > Duration::from_secs(8) {
            return Err("server did not start in time".into());
        }
        sleep(Duration::from_millis(20));
    }
}
