//! In-memory imitation of the Todoist v8 HTTP API.
//!
//! Parameters are read from the query string for every method, matching how
//! the service accepts them. Errors are JSON objects with `error`,
//! `error_tag` and `http_code`, sent with the matching status code.

pub mod commands;
pub mod store;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

use crate::commands::{CommandError, CommandIn};
use crate::store::{Account, Due, Item, Store};

pub type Db = Arc<RwLock<Store>>;

type Params = Query<HashMap<String, String>>;

/// Page size cap of `get_all_completed_items`.
pub const MAX_COMPLETED_LIMIT: usize = 50;
const DEFAULT_COMPLETED_LIMIT: usize = 30;

const ALL_RESOURCES: [&str; 8] = [
    "user",
    "projects",
    "items",
    "notes",
    "project_notes",
    "labels",
    "filters",
    "reminders",
];

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    tag: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, tag: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            tag,
            message: message.into(),
        }
    }

    fn unauthorized(tag: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, tag, message)
    }

    fn bad_request(tag: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, tag, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        let status = StatusCode::from_u16(err.http_code).unwrap_or(StatusCode::BAD_REQUEST);
        Self::new(status, "INVALID_ARGUMENT_VALUE", err.error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
            "error_tag": self.tag,
            "http_code": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/login", get(login))
        .route("/login_with_google", get(login_with_google).post(login_with_google))
        .route("/register", post(register))
        .route("/delete_user", post(delete_user))
        .route("/sync", get(sync_read).post(sync_write))
        .route("/query", get(query))
        .route("/add_item", post(add_item))
        .route("/quick/add", post(quick_add))
        .route("/get_all_completed_items", get(get_all_completed_items))
        .route("/get_productivity_stats", get(get_productivity_stats))
        .route("/update_notification_setting", post(update_notification_setting))
        .route("/get_redirect_link", get(get_redirect_link))
        .route("/upload_file", post(upload_file))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ApiError> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("ARGUMENT_MISSING", format!("Argument missing: {key}")))
}

fn json_param<T: serde::de::DeserializeOwned>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<T, ApiError> {
    serde_json::from_str(param(params, key)?)
        .map_err(|e| ApiError::bad_request("INVALID_ARGUMENT_VALUE", format!("{key}: {e}")))
}

fn authorize<'a>(store: &'a Store, params: &HashMap<String, String>) -> Result<&'a Account, ApiError> {
    let token = params.get("token").map(String::as_str).unwrap_or_default();
    store
        .account_by_token(token)
        .ok_or_else(|| ApiError::unauthorized("AUTH_INVALID_TOKEN", "Invalid token"))
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

async fn login(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let email = param(&params, "email")?;
    let password = param(&params, "password")?;
    let store = db.read().await;
    match store.account_by_email(email) {
        Some(account) if account.password == password => {
            info!(user_id = account.user.id, "login");
            Ok(Json(to_value(&account.user)))
        }
        _ => Err(ApiError::unauthorized("LOGIN_ERROR", "Login failed")),
    }
}

async fn login_with_google(
    State(db): State<Db>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    let email = param(&params, "email")?;
    if params.get("oauth2_token").map_or(true, |t| t.trim().is_empty()) {
        return Err(ApiError::unauthorized("AUTH_INVALID_TOKEN", "Invalid OAuth2 token"));
    }
    let mut store = db.write().await;
    if let Some(account) = store.account_by_email(email) {
        return Ok(Json(to_value(&account.user)));
    }
    if params.get("auto_signup").map(String::as_str) != Some("1") {
        return Err(ApiError::unauthorized("LOGIN_ERROR", "No account linked to this email"));
    }
    let full_name = param(&params, "full_name")?;
    let user = store.create_account(
        email,
        full_name,
        "",
        params.get("lang").map(String::as_str),
        params.get("timezone").map(String::as_str),
    );
    info!(user_id = user.id, "registered through google");
    Ok(Json(to_value(&user)))
}

async fn register(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let email = param(&params, "email")?;
    let full_name = param(&params, "full_name")?;
    let password = param(&params, "password")?;
    if password.len() < 5 {
        return Err(ApiError::bad_request("PASSWORD_TOO_SHORT", "Password is too short"));
    }
    let mut store = db.write().await;
    if store.account_by_email(email).is_some() {
        return Err(ApiError::bad_request("ALREADY_REGISTRED", "Email is already registered"));
    }
    let user = store.create_account(
        email,
        full_name,
        password,
        params.get("lang").map(String::as_str),
        params.get("timezone").map(String::as_str),
    );
    info!(user_id = user.id, "registered");
    Ok(Json(to_value(&user)))
}

async fn delete_user(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let account = authorize(&store, &params)?;
    if params.get("current_password").map(String::as_str) != Some(account.password.as_str()) {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "PASSWORD_MISMATCH", "Wrong password"));
    }
    let user_id = account.user.id;
    store.delete_account(user_id);
    info!(user_id, "account deleted");
    Ok(Json(json!("ok")))
}

async fn sync_read(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let owner = authorize(&store, &params)?.user.id;
    let requested: Vec<String> = match params.get("resource_types") {
        Some(_) => json_param(&params, "resource_types")?,
        None => vec!["all".to_string()],
    };
    let all = requested.iter().any(|r| r == "all");
    let mut body = Map::new();
    body.insert("sync_token".into(), json!(uuid::Uuid::new_v4().simple().to_string()));
    body.insert("full_sync".into(), json!(true));
    for resource in ALL_RESOURCES {
        if !all && !requested.iter().any(|r| r == resource) {
            continue;
        }
        let value = match resource {
            "user" => to_value(&store.accounts[&owner].user),
            "projects" => to_value(store.owned(&store.projects, owner)),
            "items" => to_value(store.owned(&store.items, owner)),
            "notes" => to_value(
                store
                    .owned(&store.notes, owner)
                    .into_iter()
                    .filter(|n| n.item_id.is_some())
                    .collect::<Vec<_>>(),
            ),
            "project_notes" => to_value(
                store
                    .owned(&store.notes, owner)
                    .into_iter()
                    .filter(|n| n.item_id.is_none())
                    .collect::<Vec<_>>(),
            ),
            "labels" => to_value(store.owned(&store.labels, owner)),
            "filters" => to_value(store.owned(&store.filters, owner)),
            "reminders" => to_value(store.owned(&store.reminders, owner)),
            _ => continue,
        };
        body.insert(resource.to_string(), value);
    }
    Ok(Json(Value::Object(body)))
}

async fn sync_write(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let owner = authorize(&store, &params)?.user.id;
    let commands: Vec<CommandIn> = json_param(&params, "commands")?;
    let mut sync_status = Map::new();
    let mut temp_id_mapping = Map::new();
    for command in commands {
        debug!(kind = %command.kind, uuid = %command.uuid, "applying command");
        match commands::apply(&mut store, owner, &command.kind, &command.args) {
            Ok(created) => {
                sync_status.insert(command.uuid, json!("ok"));
                if let (Some(temp_id), Some(id)) = (command.temp_id, created) {
                    temp_id_mapping.insert(temp_id, json!(id));
                }
            }
            Err(err) => {
                debug!(kind = %command.kind, error = %err.error, "command rejected");
                sync_status.insert(command.uuid, to_value(&err));
            }
        }
    }
    Ok(Json(json!({
        "sync_token": uuid::Uuid::new_v4().simple().to_string(),
        "full_sync": false,
        "sync_status": sync_status,
        "temp_id_mapping": temp_id_mapping,
    })))
}

fn run_query(store: &Store, owner: u64, query: &str) -> Value {
    let open: Vec<&Item> = store
        .owned(&store.items, owner)
        .into_iter()
        .filter(|i| i.checked == 0)
        .collect();
    let normalized = query.trim().to_lowercase();
    if normalized == "viewall" {
        let groups: Vec<Value> = store
            .owned(&store.projects, owner)
            .into_iter()
            .filter(|p| p.is_archived == 0)
            .map(|p| {
                let uncompleted: Vec<&&Item> = open.iter().filter(|i| i.project_id == p.id).collect();
                json!({"project_id": p.id, "uncompleted": uncompleted, "completed": []})
            })
            .collect();
        return json!({"type": "viewall", "query": query, "data": groups});
    }
    if let Some(level) = normalized
        .strip_prefix('p')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=4).contains(n))
    {
        let data: Vec<&&Item> = open.iter().filter(|i| i.priority == 5 - level).collect();
        return json!({"type": "priority", "query": query, "data": data});
    }
    let data: Vec<&&Item> = if normalized == "no due date" {
        open.iter().filter(|i| i.due.is_none()).collect()
    } else {
        open.iter()
            .filter(|i| {
                i.due.as_ref().is_some_and(|due| {
                    due.string.as_deref().map(str::to_lowercase).as_deref() == Some(normalized.as_str())
                        || due.date.as_deref() == Some(normalized.as_str())
                })
            })
            .collect()
    };
    json!({"type": "date", "query": query, "data": data})
}

async fn query(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let owner = authorize(&store, &params)?.user.id;
    let queries: Vec<String> = json_param(&params, "queries")?;
    let results: Vec<Value> = queries.iter().map(|q| run_query(&store, owner, q)).collect();
    Ok(Json(Value::Array(results)))
}

fn due_from(date_string: Option<&String>) -> Option<Due> {
    date_string.filter(|s| !s.is_empty()).map(|s| Due {
        date: None,
        string: Some(s.clone()),
        is_recurring: s.starts_with("every"),
    })
}

async fn add_item(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let account = authorize(&store, &params)?;
    let owner = account.user.id;
    let inbox = account.user.inbox_project;
    let content = param(&params, "content")?;
    let project_id = match params.get("project_id") {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request("INVALID_ARGUMENT_VALUE", "project_id"))?,
        None => inbox,
    };
    if store.project_of(owner, project_id).is_none() {
        return Err(ApiError::not_found("Project not found"));
    }
    let priority = match params.get("priority") {
        Some(raw) => commands::priority(
            raw.parse()
                .map_err(|_| ApiError::bad_request("INVALID_ARGUMENT_VALUE", "priority"))?,
        )?,
        None => 1,
    };
    let item = store.add_item(owner, project_id, content, priority, due_from(params.get("date_string")));
    debug!(item_id = item.id, "item added");
    Ok(Json(to_value(&item)))
}

/// `text` may carry `#Project` to file the task; unknown project names stay
/// part of the content.
async fn quick_add(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let account = authorize(&store, &params)?;
    let owner = account.user.id;
    let mut project_id = account.user.inbox_project;
    let text = param(&params, "text")?;
    let mut words = Vec::new();
    for word in text.split_whitespace() {
        let target = word.strip_prefix('#').and_then(|name| {
            store
                .owned(&store.projects, owner)
                .into_iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .map(|p| p.id)
        });
        match target {
            Some(id) => project_id = id,
            None => words.push(word),
        }
    }
    if words.is_empty() {
        return Err(ApiError::bad_request("INVALID_ARGUMENT_VALUE", "Task content is empty"));
    }
    let content = words.join(" ");
    let item = store.add_item(owner, project_id, &content, 1, None);
    if let Some(note) = params.get("note").filter(|n| !n.is_empty()) {
        commands::apply(
            &mut store,
            owner,
            "note_add",
            &json!({"item_id": item.id, "content": note}),
        )?;
    }
    if let Some(reminder) = params.get("reminder").filter(|r| !r.is_empty()) {
        commands::apply(
            &mut store,
            owner,
            "reminder_add",
            &json!({"item_id": item.id, "type": "absolute", "due": {"string": reminder}}),
        )?;
    }
    Ok(Json(to_value(&item)))
}

async fn get_all_completed_items(
    State(db): State<Db>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let owner = authorize(&store, &params)?.user.id;
    let number = |key: &str| -> Result<Option<usize>, ApiError> {
        params
            .get(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| ApiError::bad_request("INVALID_ARGUMENT_VALUE", key.to_string()))
            })
            .transpose()
    };
    let limit = number("limit")?
        .unwrap_or(DEFAULT_COMPLETED_LIMIT)
        .min(MAX_COMPLETED_LIMIT);
    let offset = number("offset")?.unwrap_or(0);
    let project_id: Option<u64> = match params.get("project_id") {
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| ApiError::bad_request("INVALID_ARGUMENT_VALUE", "project_id"))?,
        ),
        None => None,
    };
    let items: Vec<Value> = store
        .owned(&store.items, owner)
        .into_iter()
        .filter(|i| i.checked == 1)
        .filter(|i| project_id.map_or(true, |p| i.project_id == p))
        .skip(offset)
        .take(limit)
        .map(|i| {
            json!({
                "id": i.id * 1000,
                "task_id": i.id,
                "project_id": i.project_id,
                "content": i.content,
                "completed_date": null,
            })
        })
        .collect();
    Ok(Json(json!({"items": items, "projects": {}})))
}

async fn get_productivity_stats(
    State(db): State<Db>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    let account = authorize(&store, &params)?;
    let completed = store
        .owned(&store.items, account.user.id)
        .into_iter()
        .filter(|i| i.checked == 1)
        .count();
    Ok(Json(json!({
        "karma": account.user.karma,
        "karma_trend": "up",
        "completed_count": completed,
        "days_items": [],
        "week_items": [],
        "goals": account.goals,
    })))
}

async fn update_notification_setting(
    State(db): State<Db>,
    Query(params): Params,
) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let owner = authorize(&store, &params)?.user.id;
    let event = param(&params, "notification_type")?.to_string();
    let service = param(&params, "service")?.to_string();
    if service != "email" && service != "push" {
        return Err(ApiError::bad_request("INVALID_ARGUMENT_VALUE", "Unknown service"));
    }
    let mute = param(&params, "dont_notify")? == "1";
    if let Some(account) = store.accounts.get_mut(&owner) {
        let key = (event, service);
        account.muted.retain(|muted| *muted != key);
        if mute {
            account.muted.push(key);
        }
    }
    Ok(Json(json!({})))
}

async fn get_redirect_link(State(db): State<Db>, Query(params): Params) -> Result<Json<Value>, ApiError> {
    let store = db.read().await;
    authorize(&store, &params)?;
    let path = params.get("path").map(String::as_str).unwrap_or("/app");
    Ok(Json(json!({"link": format!("https://todoist.com/secureRedirect?path={path}")})))
}

fn bad_upload(err: MultipartError) -> ApiError {
    ApiError::bad_request("INVALID_ARGUMENT_VALUE", format!("file: {err}"))
}

/// Accepts the `file` part of a multipart body. The content is measured and
/// dropped; only the returned attachment description is meaningful.
async fn upload_file(
    State(db): State<Db>,
    Query(params): Params,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let owner = authorize(&*db.read().await, &params)?.user.id;
    let file_name = param(&params, "file_name")?.to_string();

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let size = field.bytes().await.map_err(bad_upload)?.len();
        upload = Some((file_type, size));
    }
    let (file_type, file_size) =
        upload.ok_or_else(|| ApiError::bad_request("ARGUMENT_MISSING", "Argument missing: file"))?;

    debug!(owner, %file_name, file_size, "file uploaded");
    let key = uuid::Uuid::new_v4().simple();
    Ok(Json(json!({
        "file_name": file_name,
        "file_size": file_size,
        "file_type": file_type,
        "file_url": format!("https://files.todoist.test/{owner}/{key}/{file_name}"),
        "upload_state": "completed",
    })))
}
