// net.rs
//! Blocking HTTP transport shared by the listing fetcher and the catalog client.
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("could not read response body: {0}")]
    Body(String),
}

/// `GET url?query` with extra headers, returning status + body.
///
/// Anything that never produces a response (DNS, TLS, timeout) is a
/// `TransportError`; non-2xx statuses are returned as normal responses.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let mut req = self.client.get(url).query(query);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let resp = req.send().map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse::new(status, body))
    }
}
