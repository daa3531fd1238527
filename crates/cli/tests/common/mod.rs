use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server};

pub const TOKEN: &str = "tok-test";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// A TownHall API stand-in on a random local port. Login always succeeds;
/// everything else goes to the test's handler.
pub struct FakeApi {
    pub base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeApi {
    pub fn spawn(handler: impl Fn(&Recorded) -> (u16, Value) + Send + 'static) -> Self {
        let server = Server::http("127.0.0.1:0").expect("http server");
        let base = format!("http://{}/api", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for mut req in server.incoming_requests() {
                let mut body = String::new();
                let _ = req.as_reader().read_to_string(&mut body);
                let recorded = Recorded {
                    method: req.method().to_string(),
                    url: req.url().to_string(),
                    authorization: req
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("Authorization"))
                        .map(|h| h.value.as_str().to_string()),
                    body,
                };
                let (status, payload) = if recorded.url == "/api/auth/login/" {
                    (200, json!({"token": TOKEN, "user": citizen()}))
                } else {
                    handler(&recorded)
                };
                seen.lock().expect("requests lock").push(recorded);

                let text = if payload.is_null() {
                    String::new()
                } else {
                    payload.to_string()
                };
                let response = Response::from_string(text)
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes("Content-Type", "application/json")
                            .expect("content-type header"),
                    );
                let _ = req.respond(response);
            }
        });

        Self { base, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn count(&self, method: &str, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

pub fn citizen() -> Value {
    json!({
        "id": 7,
        "email": "ana@example.com",
        "firstName": "Ana",
        "lastName": "Lee",
        "role": "citizen",
        "is_superuser": false
    })
}

pub struct TestEnv {
    tmp: TempDir,
    pub home: PathBuf,
    api_url: String,
}

impl TestEnv {
    pub fn new(api_url: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        Self {
            tmp,
            home,
            api_url: api_url.to_string(),
        }
    }

    pub fn with_api(api: &FakeApi) -> Self {
        Self::new(&api.base)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.tmp.path().to_path_buf()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("townhall");
        cmd.current_dir(self.tmp.path())
            .env("HOME", &self.home)
            .env("TOWNHALL_API_URL", &self.api_url)
            .env_remove("TOWNHALL_CONFIG")
            .env_remove("TOWNHALL_PASSWORD")
            .env_remove("TOWNHALL_LOG");
        cmd
    }

    pub fn sign_in(&self) {
        self.cmd()
            .args(["login", "--email", "ana@example.com", "--password", "pw"])
            .assert()
            .success();
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}
