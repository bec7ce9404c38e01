//! Entry point: a `Session` couples the request builder with a transport and
//! turns credentials into an authenticated [`User`].
//!
//! # Design
//! There is no process-wide default client. Callers create a `Session` (or
//! several, e.g. against different base URLs) and every `User` obtained from
//! it holds an `Arc<AuthContext>`: the session, the token, and an "active"
//! flag. Projects, tasks and the other domain objects share that context, so
//! logging the user out disables every object derived from it at once.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::client::TodoistClient;
use crate::command::{Command, CommandType};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::options::SignupDetails;
use crate::transport::{Transport, UreqTransport};
use crate::types::{SyncResponse, UserData};
use crate::user::User;

#[derive(Clone)]
pub struct Session {
    client: TodoistClient,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(&config.base_url, UreqTransport::new(config))
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(&ClientConfig::from_env()?))
    }

    pub fn with_transport(base_url: &str, transport: impl Transport + 'static) -> Self {
        Self {
            client: TodoistClient::new(base_url),
            transport: Arc::new(transport),
        }
    }

    pub fn client(&self) -> &TodoistClient {
        &self.client
    }

    /// Execute one request. Never retries.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "sending request");
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, url = %request.url, "received response");
        Ok(response)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let response = self.send(self.client.build_login(email, password))?;
        self.authenticated(self.client.parse_user(response)?)
    }

    pub fn login_with_google(&self, email: &str, oauth2_token: &str) -> Result<User> {
        let request = self.client.build_login_with_google(email, oauth2_token, None);
        let response = self.send(request)?;
        self.authenticated(self.client.parse_user(response)?)
    }

    /// Log in with an API token obtained elsewhere. The token is checked by
    /// reading the `user` resource.
    pub fn login_with_api_token(&self, api_token: &str) -> Result<User> {
        let response = self.send(self.client.build_sync_read(api_token, &["user"])?)?;
        let sync = self.client.parse_sync(response)?;
        let mut data = sync
            .user
            .ok_or_else(|| Error::Deserialization("sync response did not include the user".to_string()))?;
        if data.token.is_empty() {
            data.token = api_token.to_string();
        }
        self.authenticated(data)
    }

    pub fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        details: &SignupDetails,
    ) -> Result<User> {
        require("full name", full_name)?;
        require("email", email)?;
        require("password", password)?;
        let request = self.client.build_register(email, full_name, password, details);
        let response = self.send(request)?;
        self.authenticated(self.client.parse_user(response)?)
    }

    /// Register by linking a Google account; logs in if the account exists.
    pub fn register_with_google(
        &self,
        full_name: &str,
        email: &str,
        oauth2_token: &str,
        details: &SignupDetails,
    ) -> Result<User> {
        require("full name", full_name)?;
        require("email", email)?;
        let request = self
            .client
            .build_login_with_google(email, oauth2_token, Some((full_name, details)));
        let response = self.send(request)?;
        self.authenticated(self.client.parse_user(response)?)
    }

    fn authenticated(&self, data: UserData) -> Result<User> {
        if data.token.is_empty() {
            return Err(Error::Authentication {
                status: None,
                message: "service returned an empty token".to_string(),
            });
        }
        info!(user_id = data.id, "authenticated");
        let auth = Arc::new(AuthContext {
            session: self.clone(),
            token: data.token.clone(),
            active: AtomicBool::new(true),
        });
        Ok(User::new(auth, data))
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Authenticated access shared by a user and every object derived from it.
pub(crate) struct AuthContext {
    session: Session,
    token: String,
    active: AtomicBool,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("session", &self.session)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub(crate) fn token(&self) -> Result<&str> {
        if !self.is_active() {
            return Err(Error::logged_out());
        }
        Ok(&self.token)
    }

    /// One authenticated round-trip.
    pub(crate) fn call<T>(
        &self,
        build: impl FnOnce(&TodoistClient, &str) -> Result<HttpRequest>,
        parse: impl FnOnce(&TodoistClient, HttpResponse) -> Result<T>,
    ) -> Result<T> {
        let token = self.token()?;
        let client = &self.session.client;
        let request = build(client, token)?;
        let response = self.session.send(request)?;
        parse(client, response)
    }

    pub(crate) fn sync(&self, resource_types: &[&str]) -> Result<SyncResponse> {
        self.call(
            |client, token| client.build_sync_read(token, resource_types),
            |client, response| client.parse_sync(response),
        )
    }

    pub(crate) fn run(&self, command: &Command) -> Result<SyncResponse> {
        debug!(command = ?command.kind, "running command");
        self.call(
            |client, token| client.build_sync_commands(token, std::slice::from_ref(command)),
            |client, response| client.parse_command_result(response, command),
        )
    }

    pub(crate) fn execute(&self, kind: CommandType, args: impl Serialize) -> Result<()> {
        self.run(&Command::new(kind, args)?).map(|_| ())
    }

    /// Run a command that creates an object. The object is rebuilt from the
    /// arguments that were sent and the id the service assigned, so no read
    /// follows the write.
    pub(crate) fn create<T: DeserializeOwned>(&self, kind: CommandType, args: impl Serialize) -> Result<T> {
        let command = Command::new(kind, args)?;
        let response = self.run(&command)?;
        command.created(&response)
    }
}
