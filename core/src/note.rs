//! Notes on tasks and projects.

use std::sync::Arc;

use serde_json::json;

use crate::command::CommandType;
use crate::error::{Error, Result};
use crate::session::AuthContext;
use crate::types::{FileAttachment, NoteData, ObjectId};

/// A comment attached to a task or a project.
#[derive(Debug, Clone)]
pub struct Note {
    auth: Arc<AuthContext>,
    data: NoteData,
}

impl Note {
    pub fn id(&self) -> ObjectId {
        self.data.id
    }

    pub fn content(&self) -> &str {
        &self.data.content
    }

    /// Task the note is attached to, for task notes.
    pub fn item_id(&self) -> Option<ObjectId> {
        self.data.item_id
    }

    /// Project the note is attached to, for project notes.
    pub fn project_id(&self) -> Option<ObjectId> {
        self.data.project_id
    }

    pub fn file_attachment(&self) -> Option<&FileAttachment> {
        self.data.file_attachment.as_ref()
    }

    pub fn posted(&self) -> Option<&str> {
        self.data.posted.as_deref()
    }

    pub fn update(&mut self, content: &str) -> Result<()> {
        require_content(content)?;
        self.auth.execute(
            CommandType::NoteUpdate,
            json!({"id": self.data.id, "content": content}),
        )?;
        self.data.content = content.to_string();
        Ok(())
    }

    pub fn delete(self) -> Result<()> {
        self.auth
            .execute(CommandType::NoteDelete, json!({"id": self.data.id}))
    }
}

fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::invalid("note content must not be empty"));
    }
    Ok(())
}

pub(crate) fn add_note(auth: &Arc<AuthContext>, args: serde_json::Value, content: &str) -> Result<Note> {
    require_content(content)?;
    let data = auth.create(CommandType::NoteAdd, args)?;
    Ok(Note {
        auth: auth.clone(),
        data,
    })
}

pub(crate) fn all_notes(auth: &Arc<AuthContext>) -> Result<Vec<Note>> {
    let sync = auth.sync(&["notes", "project_notes"])?;
    Ok(sync
        .notes
        .into_iter()
        .chain(sync.project_notes)
        .filter(|n| !n.is_deleted)
        .map(|data| Note {
            auth: auth.clone(),
            data,
        })
        .collect())
}
