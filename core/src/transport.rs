//! Executes `HttpRequest`s.
//!
//! `UreqTransport` is the blocking implementation used by default. Error
//! statuses come back as ordinary `HttpResponse`s so the client can map
//! them; only failures below HTTP (DNS, connect, timeout, reset) become
//! `Error::Transport`. File uploads go out through ureq's multipart form.

use tracing::debug;
use ureq::unversioned::multipart::{Form, Part};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP round-trip. Implementations must not retry.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self
                    .agent
                    .get(&request.url)
                    .header("user-agent", self.user_agent.as_str());
                for (key, value) in &request.params {
                    builder = builder.query(key, value);
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self
                    .agent
                    .post(&request.url)
                    .header("user-agent", self.user_agent.as_str());
                for (key, value) in &request.params {
                    builder = builder.query(key, value);
                }
                match &request.upload {
                    Some(upload) => {
                        let part = Part::bytes(&upload.content).file_name(&upload.file_name);
                        builder.send(Form::new().part("file", part))
                    }
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| {
            debug!(url = %request.url, "transport failure: {e}");
            Error::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
