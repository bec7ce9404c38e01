//! Saved filters.

use std::sync::Arc;

use serde_json::json;

use crate::command::{CommandType, WithId};
use crate::error::Result;
use crate::options::FilterUpdate;
use crate::session::AuthContext;
use crate::types::{FilterData, ObjectId};

/// A saved search.
#[derive(Debug, Clone)]
pub struct Filter {
    auth: Arc<AuthContext>,
    data: FilterData,
}

impl Filter {
    pub(crate) fn new(auth: Arc<AuthContext>, data: FilterData) -> Self {
        Self { auth, data }
    }

    pub fn id(&self) -> ObjectId {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn query(&self) -> &str {
        &self.data.query
    }

    pub fn update(&mut self, changes: &FilterUpdate) -> Result<()> {
        let args = WithId {
            id: self.data.id,
            changes,
        };
        self.auth.execute(CommandType::FilterUpdate, &args)?;
        changes.apply(&mut self.data);
        Ok(())
    }

    pub fn delete(self) -> Result<()> {
        self.auth
            .execute(CommandType::FilterDelete, json!({"id": self.data.id}))
    }
}
