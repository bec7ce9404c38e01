//! HTTP requests and responses as plain data.
//!
//! # Design
//! `TodoistClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network; a [`Transport`](crate::Transport)
//! performs the round-trip in between. Every Todoist v8 endpoint takes its
//! arguments as URL query parameters, for GET and POST alike, so a request is
//! described by its method, URL and parameter list. `upload_file` is the one
//! exception: it also carries a file, sent as a `multipart/form-data` body.

use std::fmt;

/// HTTP method for a request. The v8 endpoints only use these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// `url` never contains the parameters, so it is safe to log; the session
/// token and password only ever live in `params`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    /// File sent as the `file` part of a multipart body.
    pub upload: Option<FileUpload>,
}

/// A file attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.content.len())
            .finish()
    }
}

impl HttpRequest {
    pub(crate) fn new(method: HttpMethod, url: String) -> Self {
        Self {
            method,
            url,
            params: Vec::new(),
            upload: None,
        }
    }

    pub(crate) fn file(mut self, file_name: &str, content: Vec<u8>) -> Self {
        self.upload = Some(FileUpload {
            file_name: file_name.to_string(),
            content,
        });
        self
    }

    pub(crate) fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub(crate) fn opt_param(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Value of the first parameter named `key`.
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
