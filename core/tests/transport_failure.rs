//! Failure paths driven through a scripted `Transport`.
//!
//! Every test queues the responses the service would give, either fixed
//! bodies or an acknowledgement of whatever command was sent. Once the queue
//! runs dry the transport fails the way a dropped connection would.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use todoist_core::{
    Color, Error, HttpRequest, HttpResponse, ObjectId, Priority, ProjectOptions, ProjectUpdate,
    ReminderService, Session, TaskUpdate, Transport, User,
};

enum Reply {
    Fixed(HttpResponse),
    /// Acknowledge the single command in the request and map its temp id.
    Ack(ObjectId),
}

#[derive(Clone, Default)]
struct Scripted {
    responses: Arc<Mutex<VecDeque<Reply>>>,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

impl Scripted {
    fn push(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Reply::Fixed(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
        self
    }

    fn ack(&self, new_id: ObjectId) -> &Self {
        self.responses.lock().unwrap().push_back(Reply::Ack(new_id));
        self
    }

    fn sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_endpoint(&self) -> String {
        self.sent.lock().unwrap().last().unwrap().url.clone()
    }
}

fn acknowledge(request: &HttpRequest, new_id: ObjectId) -> HttpResponse {
    let commands: Value = serde_json::from_str(request.param_value("commands").unwrap()).unwrap();
    let uuid = commands[0]["uuid"].as_str().unwrap();
    let temp_id = commands[0]["temp_id"].as_str().unwrap();
    HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: json!({"sync_status": {uuid: "ok"}, "temp_id_mapping": {temp_id: new_id}}).to_string(),
    }
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest) -> todoist_core::Result<HttpResponse> {
        self.sent.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Reply::Fixed(response)) => Ok(response),
            Some(Reply::Ack(new_id)) => Ok(acknowledge(request, new_id)),
            None => Err(Error::Transport("connection reset by peer".to_string())),
        }
    }
}

const USER: &str = r#"{"id": 1, "email": "john@example.com", "full_name": "John", "token": "tok", "inbox_project": 10}"#;

const PROJECTS: &str = r#"{"sync_token": "a", "full_sync": true, "projects": [
    {"id": 10, "name": "Inbox", "inbox_project": true, "is_archived": 0, "is_deleted": 0},
    {"id": 11, "name": "Work", "is_archived": 0, "is_deleted": 0}
]}"#;

const ITEMS: &str = r#"{"sync_token": "b", "full_sync": true, "items": [
    {"id": 100, "project_id": 10, "content": "Write report", "priority": 2, "checked": 0}
]}"#;

fn logged_in() -> (Scripted, User) {
    let transport = Scripted::default();
    transport.push(200, USER);
    let session = Session::with_transport("https://api.example.com/API/v8", transport.clone());
    let user = session.login("john@example.com", "secret").unwrap();
    (transport, user)
}

#[test]
fn failed_move_leaves_task_in_place() {
    let (transport, user) = logged_in();
    transport.push(200, PROJECTS).push(200, ITEMS);
    let work = user.get_project("Work").unwrap().unwrap();
    let mut task = user.get_tasks().unwrap().remove(0);

    let err = task.move_to(&work).unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert_eq!(task.project_id(), 10);
    assert!(transport.last_endpoint().ends_with("/sync"));
}

#[test]
fn failed_update_leaves_fields_untouched() {
    let (transport, user) = logged_in();
    transport.push(200, ITEMS);
    let mut task = user.get_tasks().unwrap().remove(0);

    let err = task
        .update(&TaskUpdate {
            content: Some("Something else".to_string()),
            priority: Some(Priority::VeryHigh),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(task.content(), "Write report");
    assert_eq!(task.priority(), Some(Priority::Normal));
}

#[test]
fn unacknowledged_command_is_not_applied() {
    let (transport, user) = logged_in();
    transport.push(200, PROJECTS);
    let mut work = user.get_project("Work").unwrap().unwrap();

    let before = transport.sent();
    transport.push(200, r#"{"sync_status": {}, "temp_id_mapping": {}}"#);
    let err = work.archive().unwrap_err();
    assert!(matches!(err, Error::Deserialization(_)), "{err:?}");
    assert_eq!(transport.sent(), before + 1);
    assert!(!work.is_archived());
}

#[test]
fn add_project_sends_one_request_and_uses_the_mapped_id() {
    let (transport, user) = logged_in();
    let before = transport.sent();
    transport.ack(42);

    let project = user
        .add_project(
            "Work",
            &ProjectOptions {
                color: Some(Color::Red),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(transport.sent(), before + 1);
    assert_eq!(project.id(), 42);
    assert_eq!(project.name(), "Work");
    assert_eq!(project.color(), Some(Color::Red as u8));
    assert!(!project.is_archived());
}

#[test]
fn creates_never_follow_up_with_a_read() {
    let (transport, user) = logged_in();
    transport.push(200, ITEMS);
    let task = user.get_tasks().unwrap().remove(0);
    let before = transport.sent();

    transport.ack(7).ack(8).ack(9).ack(10);
    let label = user.add_label("errands", None).unwrap();
    let filter = user.add_filter("Urgent", "p1", None, None).unwrap();
    let note = task.add_note("see attachment").unwrap();
    let reminder = task
        .add_date_reminder(ReminderService::Push, "2030-01-01T09:00")
        .unwrap();

    assert_eq!(transport.sent(), before + 4);
    assert_eq!((label.id(), label.name()), (7, "errands"));
    assert_eq!((filter.id(), filter.query()), (8, "p1"));
    assert_eq!((note.id(), note.item_id()), (9, Some(100)));
    assert_eq!((reminder.id(), reminder.kind()), (10, Some("absolute")));
    assert_eq!(reminder.due().and_then(|d| d.date.as_deref()), Some("2030-01-01T09:00"));
}

#[test]
fn server_error_maps_to_http() {
    let (transport, user) = logged_in();
    transport.push(503, "Service Unavailable");
    let err = user.get_projects().unwrap_err();
    assert!(matches!(err, Error::Http { status: 503, .. }), "{err:?}");
    assert_eq!(err.status(), Some(503));
}

#[test]
fn unknown_task_refresh_is_not_found() {
    let (transport, user) = logged_in();
    transport.push(200, ITEMS);
    let mut task = user.get_tasks().unwrap().remove(0);
    transport.push(200, r#"{"sync_token": "c", "items": []}"#);
    let err = task.refresh().unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
    assert_eq!(task.content(), "Write report");
}

#[test]
fn moving_into_another_users_project_is_rejected_locally() {
    let (transport, user) = logged_in();
    transport.push(200, ITEMS);
    let mut task = user.get_tasks().unwrap().remove(0);

    let (other_transport, other) = logged_in();
    other_transport.push(200, PROJECTS);
    let foreign = other.get_project("Work").unwrap().unwrap();

    let before = transport.sent();
    let err = task.move_to(&foreign).unwrap_err();
    assert!(matches!(err, Error::Validation { status: None, .. }), "{err:?}");
    assert_eq!(transport.sent(), before);
    assert_eq!(task.project_id(), 10);
}

#[test]
fn logged_out_objects_never_reach_the_network() {
    let (transport, user) = logged_in();
    transport.push(200, PROJECTS);
    let mut inbox = user.get_project("Inbox").unwrap().unwrap();

    user.logout();
    let before = transport.sent();
    let err = inbox
        .update(&ProjectUpdate {
            name: Some("Renamed".to_string()),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, Error::Authentication { status: None, .. }), "{err:?}");
    assert_eq!(inbox.name(), "Inbox");
    assert!(user.get_tasks().is_err());
    assert_eq!(transport.sent(), before);
}

#[test]
fn empty_token_from_service_is_refused() {
    let transport = Scripted::default();
    transport.push(200, r#"{"id": 1, "email": "a@b.c", "full_name": "A", "token": ""}"#);
    let session = Session::with_transport("https://api.example.com/API/v8", transport);
    let err = session.login("a@b.c", "secret").unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "{err:?}");
}

#[test]
fn domain_objects_can_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
    assert_send_sync::<User>();
    assert_send_sync::<todoist_core::Project>();
    assert_send_sync::<todoist_core::Task>();
}
