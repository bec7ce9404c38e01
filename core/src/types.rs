//! Wire schema for the Todoist v8 responses.
//!
//! # Design
//! Each resource gets an explicit struct instead of a loose JSON map, so a
//! change in the remote contract shows up as a deserialization error in the
//! tests rather than as a missing key at some later call site. Fields the
//! service may omit are `Option` or `#[serde(default)]`. The service encodes
//! booleans either as `true`/`false` or as `0`/`1` depending on the resource;
//! `flag` accepts both.

use std::collections::HashMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub type ObjectId = u64;

/// Task priority. The wire form is the integer 1 (lowest) to 4 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Low = 1,
    Normal = 2,
    High = 3,
    VeryHigh = 4,
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Normal),
            3 => Ok(Priority::High),
            4 => Ok(Priority::VeryHigh),
            other => Err(format!("priority must be between 1 and 4, got {other}")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

mod flag {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Bool(b)) => b,
            Some(Raw::Int(i)) => i != 0,
            None => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TzInfo {
    pub timezone: String,
    pub gmt_string: Option<String>,
}

/// The authenticated user, as returned by `login`, `register` and the `user`
/// sync resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: ObjectId,
    pub email: String,
    pub full_name: String,
    #[serde(alias = "api_token")]
    pub token: String,
    pub inbox_project: Option<ObjectId>,
    pub team_inbox: Option<ObjectId>,
    pub tz_info: Option<TzInfo>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_premium: bool,
    pub premium_until: Option<String>,
    pub join_date: Option<String>,
    pub lang: Option<String>,
    pub start_page: Option<String>,
    pub start_day: Option<u8>,
    pub next_week: Option<u8>,
    pub time_format: Option<u8>,
    pub date_format: Option<u8>,
    pub sort_order: Option<u8>,
    pub default_reminder: Option<String>,
    pub mobile_number: Option<String>,
    pub karma: Option<f64>,
    pub karma_trend: Option<String>,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    pub id: ObjectId,
    pub name: String,
    pub color: Option<u8>,
    pub parent_id: Option<ObjectId>,
    #[serde(alias = "child_order")]
    pub item_order: Option<i64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub collapsed: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub shared: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_archived: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub inbox_project: bool,
}

/// Due date of a task or reminder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Due {
    pub date: Option<String>,
    pub string: Option<String>,
    pub timezone: Option<String>,
    pub lang: Option<String>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_recurring: bool,
}

/// A task; the service calls them items.
///
/// Entries from the completion history only carry an id, project, content
/// and completion date, so `priority` is `None` for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    pub id: ObjectId,
    pub project_id: ObjectId,
    pub content: String,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub checked: bool,
    pub due: Option<Due>,
    pub parent_id: Option<ObjectId>,
    #[serde(alias = "child_order")]
    pub item_order: Option<i64>,
    #[serde(default)]
    pub labels: Vec<ObjectId>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub collapsed: bool,
    pub date_added: Option<String>,
    pub date_completed: Option<String>,
    pub responsible_uid: Option<ObjectId>,
    pub assigned_by_uid: Option<ObjectId>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub in_history: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
}

/// A file stored by `upload_file`, ready to be attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub file_name: String,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub file_url: String,
    pub upload_state: Option<String>,
}

/// A note attached to either a task (`item_id`) or a project (`project_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData {
    pub id: ObjectId,
    pub item_id: Option<ObjectId>,
    pub project_id: Option<ObjectId>,
    pub content: String,
    pub file_attachment: Option<FileAttachment>,
    pub posted: Option<String>,
    pub posted_uid: Option<ObjectId>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelData {
    pub id: ObjectId,
    pub name: String,
    pub color: Option<u8>,
    pub item_order: Option<i64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterData {
    pub id: ObjectId,
    pub name: String,
    pub query: String,
    pub color: Option<u8>,
    pub item_order: Option<i64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderData {
    pub id: ObjectId,
    pub item_id: ObjectId,
    pub service: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub due: Option<Due>,
    pub name: Option<String>,
    pub loc_lat: Option<String>,
    pub loc_long: Option<String>,
    pub loc_trigger: Option<String>,
    pub radius: Option<u32>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_deleted: bool,
}

/// Per-command outcome inside a sync response: the string `"ok"` or an
/// error object. Any other string is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Failed(CommandError),
}

impl<'de> Deserialize<'de> for CommandStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Failed(CommandError),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) if text == "ok" => Ok(CommandStatus::Ok),
            Raw::Text(other) => Err(D::Error::custom(format!("unexpected command status {other:?}"))),
            Raw::Failed(err) => Ok(CommandStatus::Failed(err)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandError {
    pub error: String,
    pub error_code: Option<i64>,
    pub error_tag: Option<String>,
    pub http_code: Option<u16>,
}

/// Body of the `sync` endpoint, for reads and for command batches alike.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncResponse {
    pub sync_token: Option<String>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub full_sync: bool,
    pub user: Option<UserData>,
    #[serde(default)]
    pub projects: Vec<ProjectData>,
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub notes: Vec<NoteData>,
    #[serde(default)]
    pub project_notes: Vec<NoteData>,
    #[serde(default)]
    pub labels: Vec<LabelData>,
    #[serde(default)]
    pub filters: Vec<FilterData>,
    #[serde(default)]
    pub reminders: Vec<ReminderData>,
    #[serde(default)]
    pub sync_status: HashMap<String, CommandStatus>,
    #[serde(default)]
    pub temp_id_mapping: HashMap<String, ObjectId>,
}

/// One entry of `get_all_completed_items`. `id` identifies the completion
/// record, `task_id` the task itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletedItem {
    pub id: ObjectId,
    pub task_id: ObjectId,
    pub project_id: ObjectId,
    pub content: String,
    pub completed_date: Option<String>,
}

impl From<CompletedItem> for ItemData {
    fn from(item: CompletedItem) -> Self {
        ItemData {
            id: item.task_id,
            project_id: item.project_id,
            content: item.content,
            priority: None,
            checked: true,
            due: None,
            parent_id: None,
            item_order: None,
            labels: Vec::new(),
            collapsed: false,
            date_added: None,
            date_completed: item.completed_date,
            responsible_uid: None,
            assigned_by_uid: None,
            in_history: true,
            is_deleted: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletedItemsPage {
    #[serde(default)]
    pub items: Vec<CompletedItem>,
}

/// One result of the `query` endpoint. `viewall` queries group their tasks
/// by project, every other query returns a flat task list.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub query: String,
    #[serde(default)]
    pub data: Vec<QueryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryEntry {
    Item(ItemData),
    Project(ProjectTasks),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectTasks {
    pub project_id: Option<ObjectId>,
    pub uncompleted: Vec<ItemData>,
    #[serde(default)]
    pub completed: Vec<ItemData>,
}

impl QueryResult {
    /// All tasks in this result, regardless of grouping.
    pub fn into_items(self) -> Vec<ItemData> {
        self.data
            .into_iter()
            .flat_map(|entry| match entry {
                QueryEntry::Item(item) => vec![item],
                QueryEntry::Project(group) => {
                    group.uncompleted.into_iter().chain(group.completed).collect()
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DayItems {
    pub date: String,
    pub total_completed: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeekItems {
    pub from: String,
    pub to: String,
    pub total_completed: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Goals {
    pub daily_goal: Option<u32>,
    pub weekly_goal: Option<u32>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub karma_disabled: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub vacation_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductivityStats {
    #[serde(default)]
    pub karma: f64,
    pub karma_trend: Option<String>,
    pub karma_last_update: Option<f64>,
    pub completed_count: Option<u64>,
    #[serde(default)]
    pub days_items: Vec<DayItems>,
    #[serde(default)]
    pub week_items: Vec<WeekItems>,
    pub goals: Option<Goals>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectLink {
    pub link: String,
}
