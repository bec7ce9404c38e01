//! Stateless request builder and response parser for the Todoist v8 API.
//!
//! # Design
//! `TodoistClient` holds only a `base_url` and carries no mutable state
//! between calls. Each endpoint has a `build_*` method producing an
//! `HttpRequest` and is paired with a `parse_*` method consuming the
//! `HttpResponse`. Whoever sits in between (normally a
//! [`Session`](crate::Session)) executes the round-trip, which keeps this
//! layer deterministic and testable without a network.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::options::{Event, NotificationService, SignupDetails};
use crate::types::{
    CommandStatus, CompletedItemsPage, FileAttachment, ItemData, ObjectId, Priority, ProductivityStats, QueryResult,
    RedirectLink, SyncResponse, UserData,
};

/// Sync token requesting a full (non-incremental) sync.
const FULL_SYNC: &str = "*";

/// Builds requests for, and parses responses from, one Todoist v8 base URL.
///
/// Cheap to clone. Never performs IO.
#[derive(Debug, Clone)]
pub struct TodoistClient {
    base_url: String,
}

impl TodoistClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, endpoint: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}/{endpoint}", self.base_url))
    }

    pub fn build_login(&self, email: &str, password: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "login")
            .param("email", email)
            .param("password", password)
    }

    /// Log in with a Google oauth2 token. With `signup` set, the account is
    /// created if it does not exist yet, which the service only accepts as a
    /// POST.
    pub fn build_login_with_google(
        &self,
        email: &str,
        oauth2_token: &str,
        signup: Option<(&str, &SignupDetails)>,
    ) -> HttpRequest {
        let method = if signup.is_some() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        };
        let req = self
            .request(method, "login_with_google")
            .param("email", email)
            .param("oauth2_token", oauth2_token);
        match signup {
            Some((full_name, details)) => req
                .param("auto_signup", "1")
                .param("full_name", full_name)
                .opt_param("lang", details.lang.as_deref())
                .opt_param("timezone", details.timezone.as_deref()),
            None => req,
        }
    }

    pub fn build_register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
        details: &SignupDetails,
    ) -> HttpRequest {
        self.request(HttpMethod::Post, "register")
            .param("email", email)
            .param("full_name", full_name)
            .param("password", password)
            .opt_param("lang", details.lang.as_deref())
            .opt_param("timezone", details.timezone.as_deref())
    }

    pub fn build_delete_user(&self, token: &str, password: &str, reason: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Post, "delete_user")
            .param("token", token)
            .param("current_password", password)
            .opt_param("reason_for_delete", reason)
            .param("in_background", "0")
    }

    /// Read the given resource types (`"projects"`, `"items"`, `"all"`, ...)
    /// with a full sync.
    pub fn build_sync_read(&self, token: &str, resource_types: &[&str]) -> Result<HttpRequest> {
        let resource_types = to_json(&resource_types)?;
        Ok(self
            .request(HttpMethod::Get, "sync")
            .param("token", token)
            .param("sync_token", FULL_SYNC)
            .param("resource_types", resource_types))
    }

    pub fn build_sync_commands(&self, token: &str, commands: &[Command]) -> Result<HttpRequest> {
        let commands = to_json(&commands)?;
        Ok(self
            .request(HttpMethod::Post, "sync")
            .param("token", token)
            .param("commands", commands))
    }

    pub fn build_query(&self, token: &str, queries: &[String]) -> Result<HttpRequest> {
        let queries = to_json(&queries)?;
        Ok(self
            .request(HttpMethod::Get, "query")
            .param("token", token)
            .param("queries", queries))
    }

    pub fn build_add_item(
        &self,
        token: &str,
        content: &str,
        project_id: Option<ObjectId>,
        date_string: Option<&str>,
        priority: Option<Priority>,
    ) -> HttpRequest {
        self.request(HttpMethod::Post, "add_item")
            .param("token", token)
            .param("content", content)
            .opt_param("project_id", project_id.map(|id| id.to_string()))
            .opt_param("date_string", date_string)
            .opt_param("priority", priority.map(|p| p.to_string()))
    }

    /// Add a task using the quick-add syntax: `#Project`, `@label`, `+assignee`.
    pub fn build_quick_add(
        &self,
        token: &str,
        text: &str,
        note: Option<&str>,
        reminder: Option<&str>,
    ) -> HttpRequest {
        self.request(HttpMethod::Post, "quick/add")
            .param("token", token)
            .param("text", text)
            .opt_param("note", note)
            .opt_param("reminder", reminder)
    }

    pub fn build_get_all_completed_items(
        &self,
        token: &str,
        project_id: Option<ObjectId>,
        limit: u32,
        offset: u32,
    ) -> HttpRequest {
        self.request(HttpMethod::Get, "get_all_completed_items")
            .param("token", token)
            .opt_param("project_id", project_id.map(|id| id.to_string()))
            .param("limit", limit.to_string())
            .param("offset", offset.to_string())
    }

    pub fn build_get_productivity_stats(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "get_productivity_stats")
            .param("token", token)
    }

    pub fn build_update_notification_setting(
        &self,
        token: &str,
        event: Event,
        service: NotificationService,
        dont_notify: bool,
    ) -> HttpRequest {
        self.request(HttpMethod::Post, "update_notification_setting")
            .param("token", token)
            .param("notification_type", event.as_str())
            .param("service", service.as_str())
            .param("dont_notify", if dont_notify { "1" } else { "0" })
    }

    pub fn build_get_redirect_link(&self, token: &str, path: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "get_redirect_link")
            .param("token", token)
            .opt_param("path", path)
    }

    /// Upload a file for use as a note attachment. `file_name` travels both
    /// as a parameter and as the name of the multipart part.
    pub fn build_upload_file(&self, token: &str, file_name: &str, content: Vec<u8>) -> HttpRequest {
        self.request(HttpMethod::Post, "upload_file")
            .param("token", token)
            .param("file_name", file_name)
            .file(file_name, content)
    }

    pub fn parse_user(&self, response: HttpResponse) -> Result<UserData> {
        parse_json(response)
    }

    pub fn parse_sync(&self, response: HttpResponse) -> Result<SyncResponse> {
        parse_json(response)
    }

    /// Parse a command batch response and fail if `command` was rejected.
    pub fn parse_command_result(&self, response: HttpResponse, command: &Command) -> Result<SyncResponse> {
        let sync: SyncResponse = parse_json(response)?;
        match sync.sync_status.get(&command.uuid.to_string()) {
            Some(CommandStatus::Ok) => Ok(sync),
            Some(CommandStatus::Failed(err)) => {
                warn!(command = ?command.kind, code = ?err.error_code, "command rejected: {}", err.error);
                Err(Error::from_command(err.http_code, err.error.clone()))
            }
            None => Err(Error::Deserialization(format!(
                "no sync_status for command {}",
                command.uuid
            ))),
        }
    }

    pub fn parse_item(&self, response: HttpResponse) -> Result<ItemData> {
        parse_json(response)
    }

    pub fn parse_completed_items(&self, response: HttpResponse) -> Result<CompletedItemsPage> {
        parse_json(response)
    }

    pub fn parse_query(&self, response: HttpResponse) -> Result<Vec<QueryResult>> {
        parse_json(response)
    }

    pub fn parse_productivity_stats(&self, response: HttpResponse) -> Result<ProductivityStats> {
        parse_json(response)
    }

    pub fn parse_upload_file(&self, response: HttpResponse) -> Result<FileAttachment> {
        parse_json(response)
    }

    pub fn parse_redirect_link(&self, response: HttpResponse) -> Result<String> {
        parse_json::<RedirectLink>(response).map(|link| link.link)
    }

    /// Accept any 2xx response and ignore its body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialization(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| Error::Deserialization(e.to_string()))
}

/// Map non-success status codes to the appropriate `Error` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "request failed");
    Err(Error::from_status(response.status, &response.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandType;

    fn client() -> TodoistClient {
        TodoistClient::new("http://localhost:3000")
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_login_produces_get_with_credentials() {
        let req = client().build_login("john@example.com", "secret");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/login");
        assert_eq!(req.param_value("email"), Some("john@example.com"));
        assert_eq!(req.param_value("password"), Some("secret"));
    }

    #[test]
    fn google_login_switches_to_post_on_signup() {
        let details = SignupDetails {
            lang: Some("en".to_string()),
            timezone: None,
        };
        let login = client().build_login_with_google("a@b.c", "oauth", None);
        assert_eq!(login.method, HttpMethod::Get);
        assert!(login.param_value("auto_signup").is_none());

        let signup = client().build_login_with_google("a@b.c", "oauth", Some(("A B", &details)));
        assert_eq!(signup.method, HttpMethod::Post);
        assert_eq!(signup.param_value("auto_signup"), Some("1"));
        assert_eq!(signup.param_value("full_name"), Some("A B"));
        assert_eq!(signup.param_value("lang"), Some("en"));
        assert!(signup.param_value("timezone").is_none());
    }

    #[test]
    fn build_register_skips_missing_details() {
        let req = client().build_register("a@b.c", "A", "pw", &SignupDetails::default());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/register");
        assert_eq!(req.params.len(), 3);
    }

    #[test]
    fn build_sync_read_encodes_resource_types_as_json() {
        let req = client().build_sync_read("tok", &["projects", "items"]).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.param_value("token"), Some("tok"));
        assert_eq!(req.param_value("sync_token"), Some("*"));
        assert_eq!(req.param_value("resource_types"), Some(r#"["projects","items"]"#));
    }

    #[test]
    fn build_sync_commands_encodes_the_batch() {
        let cmd = Command::new(CommandType::ItemDelete, serde_json::json!({"id": 3})).unwrap();
        let req = client().build_sync_commands("tok", std::slice::from_ref(&cmd)).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        let commands: serde_json::Value =
            serde_json::from_str(req.param_value("commands").unwrap()).unwrap();
        assert_eq!(commands[0]["type"], "item_delete");
        assert_eq!(commands[0]["uuid"], cmd.uuid.to_string());
    }

    #[test]
    fn build_add_item_includes_optional_fields() {
        let req = client().build_add_item("tok", "Buy milk", Some(12), Some("tomorrow"), Some(Priority::High));
        assert_eq!(req.url, "http://localhost:3000/add_item");
        assert_eq!(req.param_value("project_id"), Some("12"));
        assert_eq!(req.param_value("date_string"), Some("tomorrow"));
        assert_eq!(req.param_value("priority"), Some("3"));

        let bare = client().build_add_item("tok", "Buy milk", None, None, None);
        assert_eq!(bare.params.len(), 2);
    }

    #[test]
    fn quick_add_uses_nested_endpoint() {
        let req = client().build_quick_add("tok", "Call mom #Family", None, Some("tomorrow at 9"));
        assert_eq!(req.url, "http://localhost:3000/quick/add");
        assert_eq!(req.param_value("reminder"), Some("tomorrow at 9"));
        assert!(req.param_value("note").is_none());
    }

    #[test]
    fn notification_setting_encodes_flag() {
        let req = client().build_update_notification_setting(
            "tok",
            Event::ItemCompleted,
            NotificationService::Push,
            true,
        );
        assert_eq!(req.param_value("notification_type"), Some("item_completed"));
        assert_eq!(req.param_value("service"), Some("push"));
        assert_eq!(req.param_value("dont_notify"), Some("1"));
    }

    #[test]
    fn completed_items_paging_params() {
        let req = client().build_get_all_completed_items("tok", Some(5), 50, 100);
        assert_eq!(req.param_value("limit"), Some("50"));
        assert_eq!(req.param_value("offset"), Some("100"));
        assert_eq!(req.param_value("project_id"), Some("5"));
    }

    #[test]
    fn parse_user_success() {
        let user = client()
            .parse_user(ok(r#"{"id":1,"email":"a@b.c","full_name":"A","token":"abc","inbox_project":7}"#))
            .unwrap();
        assert_eq!(user.token, "abc");
        assert_eq!(user.inbox_project, Some(7));
    }

    #[test]
    fn parse_user_bad_credentials() {
        let response = HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: r#"{"error":"Login failed","error_tag":"LOGIN_ERROR"}"#.to_string(),
        };
        let err = client().parse_user(response).unwrap_err();
        assert!(matches!(err, Error::Authentication { status: Some(401), .. }));
    }

    #[test]
    fn parse_item_bad_json() {
        let err = client().parse_item(ok("not json")).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn parse_command_result_surfaces_rejections() {
        let cmd = Command::new(CommandType::ItemComplete, serde_json::json!({"id": 1})).unwrap();
        let body = format!(
            r#"{{"sync_status":{{"{}":{{"error":"Item not found","error_code":22,"http_code":404}}}}}}"#,
            cmd.uuid
        );
        let err = client().parse_command_result(ok(&body), &cmd).unwrap_err();
        assert!(matches!(err, Error::NotFound { status: Some(404), .. }));

        let body = format!(r#"{{"sync_status":{{"{}":"ok"}}}}"#, cmd.uuid);
        assert!(client().parse_command_result(ok(&body), &cmd).is_ok());

        let err = client().parse_command_result(ok(r#"{"sync_status":{}}"#), &cmd).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));

        let body = format!(r#"{{"sync_status":{{"{}":"queued"}}}}"#, cmd.uuid);
        let err = client().parse_command_result(ok(&body), &cmd).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)), "{err:?}");
    }

    #[test]
    fn build_upload_file_attaches_the_file() {
        let req = client().build_upload_file("tok", "plan.pdf", vec![1, 2, 3]);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/upload_file");
        assert_eq!(req.param_value("token"), Some("tok"));
        assert_eq!(req.param_value("file_name"), Some("plan.pdf"));
        let upload = req.upload.unwrap();
        assert_eq!(upload.file_name, "plan.pdf");
        assert_eq!(upload.content, vec![1, 2, 3]);
        assert!(client().build_login("a", "b").upload.is_none());
    }

    #[test]
    fn parse_upload_file_reads_the_attachment() {
        let attachment = client()
            .parse_upload_file(ok(
                r#"{"file_name":"plan.pdf","file_size":3,"file_type":"application/pdf","file_url":"https://files.example/plan.pdf","upload_state":"completed"}"#,
            ))
            .unwrap();
        assert_eq!(attachment.file_name, "plan.pdf");
        assert_eq!(attachment.file_size, Some(3));
        assert_eq!(attachment.file_url, "https://files.example/plan.pdf");
    }

    #[test]
    fn parse_redirect_link_extracts_link() {
        let link = client()
            .parse_redirect_link(ok(r#"{"link":"https://todoist.com/secureRedirect?path=%2Fapp"}"#))
            .unwrap();
        assert!(link.starts_with("https://todoist.com/"));
    }

    #[test]
    fn parse_empty_maps_server_errors() {
        let response = HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "internal error".to_string(),
        };
        let err = client().parse_empty(response).unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, .. }));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TodoistClient::new("https://api.todoist.com/API/v8/");
        let req = client.build_get_productivity_stats("tok");
        assert_eq!(req.url, "https://api.todoist.com/API/v8/get_productivity_stats");
    }
}
