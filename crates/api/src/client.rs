use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use townhall_core::ClientError;
use townhall_core::config::ClientConfig;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Required,
    Public,
}

/// The token is fixed at construction; a new sign-in builds a new client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
            http,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth: Auth,
    ) -> Result<T, ClientError> {
        let req = self.request(Method::GET, path, auth)?.query(query);
        self.send(Method::GET, path, req)
    }

    pub fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
    ) -> Result<T, ClientError> {
        let req = self.request(Method::POST, path, auth)?.json(body);
        self.send(Method::POST, path, req)
    }

    pub fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let req = self.request(Method::PUT, path, Auth::Required)?.json(body);
        self.send(Method::PUT, path, req)
    }

    pub fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let req = self.request(Method::PATCH, path, Auth::Required)?.json(body);
        self.send(Method::PATCH, path, req)
    }

    pub fn delete(&self, path: &str) -> Result<(), ClientError> {
        let req = self.request(Method::DELETE, path, Auth::Required)?;
        let _: Value = self.send(Method::DELETE, path, req)?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str, auth: Auth) -> Result<RequestBuilder, ClientError> {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header(ACCEPT, "application/json");
        if auth == Auth::Required {
            let token = self.token.as_deref().ok_or(ClientError::NotSignedIn)?;
            req = req.header(AUTHORIZATION, format!("Token {token}"));
        }
        Ok(req)
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, ClientError> {
        let resp = req.send().map_err(|e| {
            warn!(%method, path, error = %e, "request failed to send");
            ClientError::Network(e.to_string())
        })?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        debug!(%method, path, status = status.as_u16(), "api response");

        if !status.is_success() {
            let err = error_from_body(status.as_u16(), &body);
            warn!(%method, path, status = status.as_u16(), error = %err, "api request rejected");
            return Err(err);
        }

        decode_body(&body)
    }
}

/// Empty bodies (204 replies) decode as JSON `null`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Prefers the body's `error`, then `detail`, then a generic message.
pub fn error_from_body(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["error", "detail"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });
    ClientError::server(
        status,
        message.unwrap_or_else(|| format!("Request failed with status {status}")),
    )
}
