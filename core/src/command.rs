//! Write operations sent through the `sync` endpoint.
//!
//! Every write is a command `{type, args, uuid, temp_id}`. The service answers
//! with a `sync_status` entry keyed by the command's `uuid`, and objects
//! created by the command are reported in `temp_id_mapping` under its
//! `temp_id`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ObjectId, SyncResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    UserUpdate,
    UpdateGoals,
    ClearLocations,
    ProjectAdd,
    ProjectUpdate,
    ProjectArchive,
    ProjectUnarchive,
    ProjectDelete,
    ShareProject,
    DeleteCollaborator,
    TakeOwnership,
    ItemUpdate,
    ItemComplete,
    ItemUncomplete,
    ItemMove,
    ItemDelete,
    NoteAdd,
    NoteUpdate,
    NoteDelete,
    LabelAdd,
    LabelUpdate,
    LabelDelete,
    FilterAdd,
    FilterUpdate,
    FilterDelete,
    ReminderAdd,
    ReminderDelete,
}

#[derive(Debug, Clone, Serialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: CommandType,
    pub args: serde_json::Value,
    pub uuid: Uuid,
    pub temp_id: Uuid,
}

impl Command {
    pub fn new(kind: CommandType, args: impl Serialize) -> Result<Self> {
        let args = serde_json::to_value(args).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            kind,
            args,
            uuid: Uuid::new_v4(),
            temp_id: Uuid::new_v4(),
        })
    }

    /// Id the service assigned to the object this command created.
    pub fn created_id(&self, response: &SyncResponse) -> Result<ObjectId> {
        response
            .temp_id_mapping
            .get(&self.temp_id.to_string())
            .copied()
            .ok_or_else(|| {
                Error::Deserialization(format!("no id mapped for temp_id {}", self.temp_id))
            })
    }

    /// The object this command created: its own arguments plus the id the
    /// service assigned.
    pub fn created<T: DeserializeOwned>(&self, response: &SyncResponse) -> Result<T> {
        let id = self.created_id(response)?;
        let mut object = self.args.clone();
        let Some(fields) = object.as_object_mut() else {
            return Err(Error::Serialization(format!(
                "{:?} arguments are not an object",
                self.kind
            )));
        };
        fields.insert("id".to_string(), id.into());
        serde_json::from_value(object).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Command arguments of the form `{"id": ..., <changes>}`.
#[derive(Serialize)]
pub(crate) struct WithId<'a, T: Serialize> {
    pub id: ObjectId,
    #[serde(flatten)]
    pub changes: &'a T,
}
