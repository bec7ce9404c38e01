//! Reminders on tasks: at a date (`absolute`) or at a place (`location`).

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::command::CommandType;
use crate::error::Result;
use crate::session::AuthContext;
use crate::types::{Due, ObjectId, ReminderData};

#[derive(Debug, Clone)]
pub struct Reminder {
    auth: Arc<AuthContext>,
    data: ReminderData,
}

impl Reminder {
    pub fn id(&self) -> ObjectId {
        self.data.id
    }

    pub fn item_id(&self) -> ObjectId {
        self.data.item_id
    }

    pub fn service(&self) -> Option<&str> {
        self.data.service.as_deref()
    }

    /// `absolute`, `relative` or `location`.
    pub fn kind(&self) -> Option<&str> {
        self.data.kind.as_deref()
    }

    pub fn due(&self) -> Option<&Due> {
        self.data.due.as_ref()
    }

    pub fn data(&self) -> &ReminderData {
        &self.data
    }

    pub fn delete(self) -> Result<()> {
        self.auth
            .execute(CommandType::ReminderDelete, json!({"id": self.data.id}))
    }
}

pub(crate) fn add_reminder(auth: &Arc<AuthContext>, args: &impl Serialize) -> Result<Reminder> {
    let data = auth.create(CommandType::ReminderAdd, args)?;
    Ok(Reminder {
        auth: auth.clone(),
        data,
    })
}

pub(crate) fn all_reminders(auth: &Arc<AuthContext>) -> Result<Vec<Reminder>> {
    Ok(auth
        .sync(&["reminders"])?
        .reminders
        .into_iter()
        .filter(|r| !r.is_deleted)
        .map(|data| Reminder {
            auth: auth.clone(),
            data,
        })
        .collect())
}
