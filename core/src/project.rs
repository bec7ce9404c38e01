//! Projects and the tasks and notes they hold.
//!
//! Project reads go through the `projects` sync resource; writes are sync
//! commands. Adding a task uses the `add_item` endpoint, which answers with
//! the complete task.

use std::sync::Arc;

use serde_json::json;

use crate::command::{CommandType, WithId};
use crate::error::{Error, Result};
use crate::note::{self, Note};
use crate::options::ProjectUpdate;
use crate::session::AuthContext;
use crate::task::{self, Task};
use crate::types::{FileAttachment, ObjectId, Priority, ProjectData};

/// A project owned by a logged-in user.
///
/// Holds the state from the call that produced it; `refresh` re-reads it.
#[derive(Debug, Clone)]
pub struct Project {
    auth: Arc<AuthContext>,
    data: ProjectData,
}

impl Project {
    pub(crate) fn new(auth: Arc<AuthContext>, data: ProjectData) -> Self {
        Self { auth, data }
    }

    pub(crate) fn fetch(auth: &Arc<AuthContext>, id: ObjectId) -> Result<Self> {
        let data = find_project(auth, id)?;
        Ok(Self::new(auth.clone(), data))
    }

    pub fn id(&self) -> ObjectId {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn color(&self) -> Option<u8> {
        self.data.color
    }

    pub fn is_archived(&self) -> bool {
        self.data.is_archived
    }

    pub fn is_collapsed(&self) -> bool {
        self.data.collapsed
    }

    pub fn is_inbox(&self) -> bool {
        self.data.inbox_project
    }

    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    pub(crate) fn belongs_with(&self, auth: &Arc<AuthContext>) -> bool {
        Arc::ptr_eq(&self.auth, auth)
    }

    pub fn update(&mut self, changes: &ProjectUpdate) -> Result<()> {
        let args = WithId {
            id: self.data.id,
            changes,
        };
        self.auth.execute(CommandType::ProjectUpdate, &args)?;
        changes.apply(&mut self.data);
        Ok(())
    }

    pub fn collapse(&mut self) -> Result<()> {
        self.update(&ProjectUpdate {
            collapsed: Some(true),
            ..Default::default()
        })
    }

    pub fn archive(&mut self) -> Result<()> {
        self.auth
            .execute(CommandType::ProjectArchive, json!({"id": self.data.id}))?;
        self.data.is_archived = true;
        Ok(())
    }

    pub fn unarchive(&mut self) -> Result<()> {
        self.auth
            .execute(CommandType::ProjectUnarchive, json!({"id": self.data.id}))?;
        self.data.is_archived = false;
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.data = find_project(&self.auth, self.data.id)?;
        Ok(())
    }

    /// Add a task. `date` is free-form, e.g. `"tomorrow"` or `"every monday"`.
    pub fn add_task(&self, content: &str, date: Option<&str>, priority: Option<Priority>) -> Result<Task> {
        if content.trim().is_empty() {
            return Err(Error::invalid("task content must not be empty"));
        }
        let item = self.auth.call(
            |client, token| Ok(client.build_add_item(token, content, Some(self.data.id), date, priority)),
            |client, response| client.parse_item(response),
        )?;
        Ok(Task::new(self.auth.clone(), item))
    }

    pub fn get_tasks(&self) -> Result<Vec<Task>> {
        task::active_tasks(&self.auth, Some(self.data.id))
    }

    pub fn get_uncompleted_tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .get_tasks()?
            .into_iter()
            .filter(|t| !t.is_completed())
            .collect())
    }

    /// Completed tasks, read page by page from the completion history.
    pub fn get_completed_tasks(&self) -> Result<Vec<Task>> {
        task::completed_tasks(&self.auth, Some(self.data.id))
    }

    pub fn add_note(&self, content: &str) -> Result<Note> {
        note::add_note(&self.auth, json!({"project_id": self.data.id, "content": content}), content)
    }

    pub fn add_note_with_file(&self, content: &str, attachment: &FileAttachment) -> Result<Note> {
        note::add_note(
            &self.auth,
            json!({"project_id": self.data.id, "content": content, "file_attachment": attachment}),
            content,
        )
    }

    pub fn get_notes(&self) -> Result<Vec<Note>> {
        Ok(note::all_notes(&self.auth)?
            .into_iter()
            .filter(|n| n.project_id() == Some(self.data.id))
            .collect())
    }

    /// Invite another user by email.
    pub fn share(&self, email: &str, message: Option<&str>) -> Result<()> {
        self.auth.execute(
            CommandType::ShareProject,
            json!({"project_id": self.data.id, "email": email, "message": message}),
        )
    }

    pub fn delete_collaborator(&self, email: &str) -> Result<()> {
        self.auth.execute(
            CommandType::DeleteCollaborator,
            json!({"project_id": self.data.id, "email": email}),
        )
    }

    pub fn take_ownership(&self) -> Result<()> {
        self.auth
            .execute(CommandType::TakeOwnership, json!({"project_id": self.data.id}))
    }

    pub fn delete(self) -> Result<()> {
        self.auth
            .execute(CommandType::ProjectDelete, json!({"id": self.data.id}))
    }
}

fn find_project(auth: &AuthContext, id: ObjectId) -> Result<ProjectData> {
    auth.sync(&["projects"])?
        .projects
        .into_iter()
        .find(|p| p.id == id && !p.is_deleted)
        .ok_or_else(|| Error::NotFound {
            status: None,
            message: format!("project {id} not found"),
        })
}
