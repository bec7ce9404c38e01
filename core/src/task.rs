//! Tasks, their notes and reminders, and the two ways of listing them.
//!
//! # Design
//! Active tasks come from the `items` sync resource. Completed tasks come
//! from `get_all_completed_items`, which is paged: pages of `PAGE_LIMIT` are
//! requested until one comes back empty. History entries are thinner than
//! sync items; see [`Task::priority`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::command::{CommandType, WithId};
use crate::error::{Error, Result};
use crate::note::{self, Note};
use crate::options::{LocationReminder, ReminderService, TaskUpdate};
use crate::project::Project;
use crate::reminder::{self, Reminder};
use crate::session::AuthContext;
use crate::types::{Due, FileAttachment, ItemData, ObjectId, Priority};

/// Page size for the completion history; the service caps it at 50.
const PAGE_LIMIT: u32 = 50;

/// A task in one of the user's projects.
///
/// Mutations are remote-authoritative: `complete` and `uncomplete` leave the
/// local copy as it was, `refresh` picks up the new state.
#[derive(Debug, Clone)]
pub struct Task {
    auth: Arc<AuthContext>,
    data: ItemData,
}

impl Task {
    pub(crate) fn new(auth: Arc<AuthContext>, data: ItemData) -> Self {
        Self { auth, data }
    }

    pub fn id(&self) -> ObjectId {
        self.data.id
    }

    pub fn content(&self) -> &str {
        &self.data.content
    }

    /// `None` for tasks read from the completion history, which does not
    /// report priorities.
    pub fn priority(&self) -> Option<Priority> {
        self.data.priority
    }

    pub fn project_id(&self) -> ObjectId {
        self.data.project_id
    }

    pub fn is_completed(&self) -> bool {
        self.data.checked
    }

    pub fn due(&self) -> Option<&Due> {
        self.data.due.as_ref()
    }

    pub fn labels(&self) -> &[ObjectId] {
        &self.data.labels
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    pub fn update(&mut self, changes: &TaskUpdate) -> Result<()> {
        if matches!(&changes.content, Some(content) if content.trim().is_empty()) {
            return Err(Error::invalid("task content must not be empty"));
        }
        let args = WithId {
            id: self.data.id,
            changes,
        };
        self.auth.execute(CommandType::ItemUpdate, &args)?;
        changes.apply(&mut self.data);
        Ok(())
    }

    pub fn complete(&self) -> Result<()> {
        self.auth
            .execute(CommandType::ItemComplete, json!({"id": self.data.id}))
    }

    pub fn uncomplete(&self) -> Result<()> {
        self.auth
            .execute(CommandType::ItemUncomplete, json!({"id": self.data.id}))
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.data = auth_items(&self.auth)?
            .into_iter()
            .find(|item| item.id == self.data.id)
            .ok_or_else(|| Error::NotFound {
                status: None,
                message: format!("task {} not found", self.data.id),
            })?;
        Ok(())
    }

    /// The project this task currently lives in, freshly fetched.
    pub fn project(&self) -> Result<Project> {
        Project::fetch(&self.auth, self.data.project_id)
    }

    pub fn add_note(&self, content: &str) -> Result<Note> {
        note::add_note(&self.auth, json!({"item_id": self.data.id, "content": content}), content)
    }

    /// Add a note carrying a file from [`User::upload_file`](crate::User::upload_file).
    pub fn add_note_with_file(&self, content: &str, attachment: &FileAttachment) -> Result<Note> {
        note::add_note(
            &self.auth,
            json!({"item_id": self.data.id, "content": content, "file_attachment": attachment}),
            content,
        )
    }

    pub fn get_notes(&self) -> Result<Vec<Note>> {
        Ok(note::all_notes(&self.auth)?
            .into_iter()
            .filter(|n| n.item_id() == Some(self.data.id))
            .collect())
    }

    /// Move the task into `project`, which must belong to the same user.
    pub fn move_to(&mut self, project: &Project) -> Result<()> {
        if !project.belongs_with(&self.auth) {
            return Err(Error::invalid("cannot move a task into another user's project"));
        }
        self.auth.execute(
            CommandType::ItemMove,
            json!({"id": self.data.id, "project_id": project.id()}),
        )?;
        self.data.project_id = project.id();
        Ok(())
    }

    /// Remind at a fixed time, given as `YYYY-MM-DDTHH:MM`.
    pub fn add_date_reminder(&self, service: ReminderService, due_date: &str) -> Result<Reminder> {
        let service = json!({"service": service});
        let args = ReminderArgs {
            item_id: self.data.id,
            kind: "absolute",
            due: Some(json!({"date": due_date})),
            rest: &service,
        };
        reminder::add_reminder(&self.auth, &args)
    }

    pub fn add_location_reminder(&self, location: &LocationReminder) -> Result<Reminder> {
        let args = ReminderArgs {
            item_id: self.data.id,
            kind: "location",
            due: None,
            rest: location,
        };
        reminder::add_reminder(&self.auth, &args)
    }

    pub fn get_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(reminder::all_reminders(&self.auth)?
            .into_iter()
            .filter(|r| r.item_id() == self.data.id)
            .collect())
    }

    pub fn delete(self) -> Result<()> {
        self.auth
            .execute(CommandType::ItemDelete, json!({"id": self.data.id}))
    }
}

#[derive(Serialize)]
struct ReminderArgs<'a, T: Serialize> {
    item_id: ObjectId,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    due: Option<serde_json::Value>,
    #[serde(flatten)]
    rest: &'a T,
}

fn auth_items(auth: &AuthContext) -> Result<Vec<ItemData>> {
    Ok(auth
        .sync(&["items"])?
        .items
        .into_iter()
        .filter(|item| !item.is_deleted)
        .collect())
}

/// Tasks reported by a full sync, optionally limited to one project.
pub(crate) fn active_tasks(auth: &Arc<AuthContext>, project_id: Option<ObjectId>) -> Result<Vec<Task>> {
    Ok(auth_items(auth)?
        .into_iter()
        .filter(|item| project_id.map_or(true, |id| item.project_id == id))
        .map(|item| Task::new(auth.clone(), item))
        .collect())
}

/// Walk the completion history until the service returns an empty page.
pub(crate) fn completed_tasks(auth: &Arc<AuthContext>, project_id: Option<ObjectId>) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    let mut offset = 0;
    loop {
        let page = auth.call(
            |client, token| {
                Ok(client.build_get_all_completed_items(token, project_id, PAGE_LIMIT, offset))
            },
            |client, response| client.parse_completed_items(response),
        )?;
        if page.items.is_empty() {
            break;
        }
        tasks.extend(
            page.items
                .into_iter()
                .map(|item| Task::new(auth.clone(), ItemData::from(item))),
        );
        offset += PAGE_LIMIT;
    }
    Ok(tasks)
}
