//! Labels.

use std::sync::Arc;

use serde_json::json;

use crate::command::{CommandType, WithId};
use crate::error::Result;
use crate::options::LabelUpdate;
use crate::session::AuthContext;
use crate::types::{LabelData, ObjectId};

#[derive(Debug, Clone)]
pub struct Label {
    auth: Arc<AuthContext>,
    data: LabelData,
}

impl Label {
    pub(crate) fn new(auth: Arc<AuthContext>, data: LabelData) -> Self {
        Self { auth, data }
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

    pub fn update(&mut self, changes: &LabelUpdate) -> Result<()> {
        let args = WithId {
            id: self.data.id,
            changes,
        };
        self.auth.execute(CommandType::LabelUpdate, &args)?;
        changes.apply(&mut self.data);
        Ok(())
    }

    pub fn delete(self) -> Result<()> {
        self.auth
            .execute(CommandType::LabelDelete, json!({"id": self.data.id}))
    }
}
