use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use tiny_http::{Header, Response, Server};
use townhall_api::ApiClient;
use townhall_core::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

pub type Handler = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

pub struct FakeApi {
    pub base: String,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeApi {
    pub fn spawn(handler: impl Fn(&Recorded) -> (u16, String) + Send + Sync + 'static) -> Self {
        let server = Server::http("127.0.0.1:0").expect("http server");
        let base = format!("http://{}/api", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let handler: Box<Handler> = Box::new(handler);

        thread::spawn(move || {
            for mut req in server.incoming_requests() {
                let mut body = String::new();
                let _ = req.as_reader().read_to_string(&mut body);
                let authorization = req
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_string());
                let recorded = Recorded {
                    method: req.method().to_string(),
                    url: req.url().to_string(),
                    authorization,
                    body,
                };
                let (status, payload) = handler(&recorded);
                seen.lock().expect("requests lock").push(recorded);
                let response = Response::from_string(payload)
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

    pub fn client(&self) -> ApiClient {
        let config = ClientConfig {
            base_url: self.base.clone(),
            timeout: Some(std::time::Duration::from_secs(5)),
            session_path: "unused.db".into(),
        };
        ApiClient::new(&config).expect("client")
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }
}
