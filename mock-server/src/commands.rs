//! Applies `sync` write commands to the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Due, Filter, Label, Note, Owned, Project, Reminder, Store, DEFAULT_COLOR};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandIn {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: Value,
    pub uuid: String,
    pub temp_id: Option<String>,
}

/// Per-command rejection, reported inside `sync_status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandError {
    pub error: String,
    pub error_code: u32,
    pub error_tag: String,
    pub http_code: u16,
}

impl CommandError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            error_code: 20,
            error_tag: "INVALID_ARGUMENT_VALUE".to_string(),
            http_code: 400,
        }
    }

    fn missing(key: &str) -> Self {
        Self {
            error: format!("Argument missing: {key}"),
            error_code: 19,
            error_tag: "ARGUMENT_MISSING".to_string(),
            http_code: 400,
        }
    }

    fn not_found(what: &str) -> Self {
        Self {
            error: format!("{what} not found"),
            error_code: 22,
            error_tag: format!("{}_NOT_FOUND", what.to_uppercase()),
            http_code: 404,
        }
    }
}

type Outcome = Result<Option<u64>, CommandError>;

fn id_arg(args: &Value, key: &str) -> Result<u64, CommandError> {
    match &args[key] {
        Value::Number(n) => n.as_u64().ok_or_else(|| CommandError::invalid(key)),
        Value::String(s) => s.parse().map_err(|_| CommandError::invalid(key)),
        Value::Null => Err(CommandError::missing(key)),
        _ => Err(CommandError::invalid(key)),
    }
}

fn opt_id(args: &Value, key: &str) -> Result<Option<u64>, CommandError> {
    if args[key].is_null() {
        return Ok(None);
    }
    id_arg(args, key).map(Some)
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, CommandError> {
    match args[key].as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(CommandError::invalid(format!("{key} must not be empty"))),
        None => Err(CommandError::missing(key)),
    }
}

fn opt_str(args: &Value, key: &str) -> Option<String> {
    args[key].as_str().map(str::to_string)
}

fn opt_i64(args: &Value, key: &str) -> Option<i64> {
    args[key].as_i64()
}

/// Accepts `true`/`false` as well as `0`/`1`.
fn opt_flag(args: &Value, key: &str) -> Option<u8> {
    match &args[key] {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => n.as_u64().map(|n| u8::from(n != 0)),
        _ => None,
    }
}

fn opt_color(args: &Value) -> Result<Option<u8>, CommandError> {
    match args["color"].as_u64() {
        None => Ok(None),
        Some(c) if c <= 11 => Ok(Some(c as u8)),
        Some(_) => Err(CommandError::invalid("color")),
    }
}

pub fn priority(value: u64) -> Result<u8, CommandError> {
    match value {
        1..=4 => Ok(value as u8),
        _ => Err(CommandError::invalid("priority must be between 1 and 4")),
    }
}

/// Apply one command on behalf of `owner`. Returns the id of a created
/// object, if any.
pub fn apply(store: &mut Store, owner: u64, kind: &str, args: &Value) -> Outcome {
    match kind {
        "user_update" => user_update(store, owner, args),
        "update_goals" => update_goals(store, owner, args),
        "clear_locations" => Ok(None),
        "project_add" => project_add(store, owner, args),
        "project_update" => project_update(store, owner, args),
        "project_archive" => set_archived(store, owner, args, 1),
        "project_unarchive" => set_archived(store, owner, args, 0),
        "project_delete" => project_delete(store, owner, args),
        "share_project" => {
            str_arg(args, "email")?;
            project_mut(store, owner, id_arg(args, "project_id")?)?.shared = true;
            Ok(None)
        }
        "delete_collaborator" => {
            str_arg(args, "email")?;
            project_mut(store, owner, id_arg(args, "project_id")?)?;
            Ok(None)
        }
        "take_ownership" => {
            project_mut(store, owner, id_arg(args, "project_id")?)?;
            Ok(None)
        }
        "item_update" => item_update(store, owner, args),
        "item_complete" => set_checked(store, owner, args, 1),
        "item_uncomplete" => set_checked(store, owner, args, 0),
        "item_move" => item_move(store, owner, args),
        "item_delete" => item_delete(store, owner, args),
        "note_add" => note_add(store, owner, args),
        "note_update" => {
            let content = str_arg(args, "content")?.to_string();
            let note = store
                .notes
                .get_mut(&id_arg(args, "id")?)
                .filter(|n| n.owner == owner)
                .ok_or_else(|| CommandError::not_found("Note"))?;
            note.content = content;
            Ok(None)
        }
        "note_delete" => remove(&mut store.notes, owner, args, "Note"),
        "label_add" => label_add(store, owner, args),
        "label_update" => label_update(store, owner, args),
        "label_delete" => remove(&mut store.labels, owner, args, "Label"),
        "filter_add" => filter_add(store, owner, args),
        "filter_update" => filter_update(store, owner, args),
        "filter_delete" => remove(&mut store.filters, owner, args, "Filter"),
        "reminder_add" => reminder_add(store, owner, args),
        "reminder_delete" => remove(&mut store.reminders, owner, args, "Reminder"),
        other => Err(CommandError {
            error: format!("Unknown command: {other}"),
            error_code: 18,
            error_tag: "INVALID_COMMAND".to_string(),
            http_code: 400,
        }),
    }
}

fn remove<T: Owned>(map: &mut BTreeMap<u64, T>, owner: u64, args: &Value, what: &str) -> Outcome {
    let id = id_arg(args, "id")?;
    match map.get(&id) {
        Some(v) if v.owner() == owner => {
            map.remove(&id);
            Ok(None)
        }
        _ => Err(CommandError::not_found(what)),
    }
}

fn user_update(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let email = opt_str(args, "email");
    if let Some(email) = &email {
        if store
            .account_by_email(email)
            .is_some_and(|a| a.user.id != owner)
        {
            return Err(CommandError::invalid("email already in use"));
        }
    }
    let account = store
        .accounts
        .get_mut(&owner)
        .ok_or_else(|| CommandError::not_found("User"))?;
    let user = &mut account.user;
    if let Some(full_name) = opt_str(args, "full_name") {
        user.full_name = full_name;
    }
    if let Some(email) = email {
        user.email = email;
    }
    if let Some(start_page) = opt_str(args, "start_page") {
        user.start_page = Some(start_page);
    }
    if let Some(default_reminder) = opt_str(args, "default_reminder") {
        user.default_reminder = Some(default_reminder);
    }
    Ok(None)
}

fn update_goals(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let goals = &mut store
        .accounts
        .get_mut(&owner)
        .ok_or_else(|| CommandError::not_found("User"))?
        .goals;
    if let Some(daily) = args["daily_goal"].as_u64() {
        goals.daily_goal = daily as u32;
    }
    if let Some(weekly) = args["weekly_goal"].as_u64() {
        goals.weekly_goal = weekly as u32;
    }
    if let Some(flag) = opt_flag(args, "karma_disabled") {
        goals.karma_disabled = flag;
    }
    if let Some(flag) = opt_flag(args, "vacation_mode") {
        goals.vacation_mode = flag;
    }
    Ok(None)
}

fn project_mut<'a>(store: &'a mut Store, owner: u64, id: u64) -> Result<&'a mut Project, CommandError> {
    store
        .projects
        .get_mut(&id)
        .filter(|p| p.owner == owner)
        .ok_or_else(|| CommandError::not_found("Project"))
}

fn project_add(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let name = str_arg(args, "name")?.to_string();
    let color = opt_color(args)?.unwrap_or(DEFAULT_COLOR);
    let parent_id = opt_id(args, "parent_id")?;
    if let Some(parent) = parent_id {
        project_mut(store, owner, parent)?;
    }
    let id = store.next_id();
    let item_order = opt_i64(args, "item_order")
        .unwrap_or_else(|| store.owned(&store.projects, owner).len() as i64);
    store.projects.insert(
        id,
        Project {
            id,
            name,
            color,
            parent_id,
            item_order,
            collapsed: 0,
            shared: false,
            is_archived: 0,
            is_deleted: 0,
            inbox_project: false,
            owner,
        },
    );
    Ok(Some(id))
}

fn project_update(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let color = opt_color(args)?;
    let project = project_mut(store, owner, id_arg(args, "id")?)?;
    if let Some(name) = opt_str(args, "name") {
        if name.trim().is_empty() {
            return Err(CommandError::invalid("name must not be empty"));
        }
        project.name = name;
    }
    if let Some(color) = color {
        project.color = color;
    }
    if let Some(collapsed) = opt_flag(args, "collapsed") {
        project.collapsed = collapsed;
    }
    if let Some(order) = opt_i64(args, "item_order") {
        project.item_order = order;
    }
    Ok(None)
}

fn set_archived(store: &mut Store, owner: u64, args: &Value, flag: u8) -> Outcome {
    let project = project_mut(store, owner, id_arg(args, "id")?)?;
    if project.inbox_project {
        return Err(CommandError::invalid("the Inbox cannot be archived"));
    }
    project.is_archived = flag;
    Ok(None)
}

fn project_delete(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let id = id_arg(args, "id")?;
    if project_mut(store, owner, id)?.inbox_project {
        return Err(CommandError::invalid("the Inbox cannot be deleted"));
    }
    store.projects.remove(&id);
    let orphaned: Vec<u64> = store
        .items
        .values()
        .filter(|i| i.project_id == id)
        .map(|i| i.id)
        .collect();
    store.items.retain(|_, i| i.project_id != id);
    store.notes.retain(|_, n| {
        n.project_id != Some(id) && n.item_id.map_or(true, |item| !orphaned.contains(&item))
    });
    store.reminders.retain(|_, r| !orphaned.contains(&r.item_id));
    Ok(None)
}

fn item_update(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let priority = args["priority"].as_u64().map(priority).transpose()?;
    let content = opt_str(args, "content");
    if content.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(CommandError::invalid("content must not be empty"));
    }
    let labels: Option<Vec<u64>> = args["labels"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_u64).collect());
    let responsible = opt_id(args, "responsible_uid")?;
    let item = store
        .items
        .get_mut(&id_arg(args, "id")?)
        .filter(|i| i.owner == owner)
        .ok_or_else(|| CommandError::not_found("Item"))?;
    if let Some(content) = content {
        item.content = content;
    }
    if let Some(priority) = priority {
        item.priority = priority;
    }
    if let Some(date_string) = opt_str(args, "date_string") {
        item.due = Some(Due {
            string: Some(date_string),
            ..item.due.take().unwrap_or_default()
        });
    }
    if let Some(labels) = labels {
        item.labels = labels;
    }
    if let Some(order) = opt_i64(args, "item_order") {
        item.item_order = order;
    }
    if let Some(collapsed) = opt_flag(args, "collapsed") {
        item.collapsed = collapsed;
    }
    if responsible.is_some() {
        item.responsible_uid = responsible;
    }
    Ok(None)
}

fn set_checked(store: &mut Store, owner: u64, args: &Value, flag: u8) -> Outcome {
    let item = store
        .items
        .get_mut(&id_arg(args, "id")?)
        .filter(|i| i.owner == owner)
        .ok_or_else(|| CommandError::not_found("Item"))?;
    item.checked = flag;
    item.in_history = flag;
    Ok(None)
}

fn item_move(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let project_id = id_arg(args, "project_id")?;
    project_mut(store, owner, project_id)?;
    let item = store
        .items
        .get_mut(&id_arg(args, "id")?)
        .filter(|i| i.owner == owner)
        .ok_or_else(|| CommandError::not_found("Item"))?;
    item.project_id = project_id;
    Ok(None)
}

fn item_delete(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let id = id_arg(args, "id")?;
    if store.item_of(owner, id).is_none() {
        return Err(CommandError::not_found("Item"));
    }
    store.items.remove(&id);
    store.notes.retain(|_, n| n.item_id != Some(id));
    store.reminders.retain(|_, r| r.item_id != id);
    Ok(None)
}

fn note_add(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let content = str_arg(args, "content")?.to_string();
    let item_id = opt_id(args, "item_id")?;
    let project_id = opt_id(args, "project_id")?;
    match (item_id, project_id) {
        (Some(item), _) if store.item_of(owner, item).is_none() => {
            return Err(CommandError::not_found("Item"))
        }
        (None, Some(project)) if store.project_of(owner, project).is_none() => {
            return Err(CommandError::not_found("Project"))
        }
        (None, None) => return Err(CommandError::missing("item_id")),
        _ => {}
    }
    let file_attachment = match &args["file_attachment"] {
        Value::Null => None,
        Value::Object(file) if file.get("file_url").is_some_and(Value::is_string) => {
            Some(args["file_attachment"].clone())
        }
        _ => return Err(CommandError::invalid("file_attachment needs a file_url")),
    };
    let id = store.next_id();
    store.notes.insert(
        id,
        Note {
            id,
            item_id,
            project_id: if item_id.is_some() { None } else { project_id },
            content,
            file_attachment,
            posted_uid: owner,
            is_deleted: 0,
            owner,
        },
    );
    Ok(Some(id))
}

fn label_add(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let name = str_arg(args, "name")?.to_string();
    if store
        .owned(&store.labels, owner)
        .iter()
        .any(|l| l.name == name)
    {
        return Err(CommandError::invalid("label already exists"));
    }
    let color = opt_color(args)?.unwrap_or(DEFAULT_COLOR);
    let id = store.next_id();
    let item_order = store.owned(&store.labels, owner).len() as i64 + 1;
    store.labels.insert(
        id,
        Label {
            id,
            name,
            color,
            item_order,
            is_deleted: 0,
            owner,
        },
    );
    Ok(Some(id))
}

fn label_update(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let color = opt_color(args)?;
    let label = store
        .labels
        .get_mut(&id_arg(args, "id")?)
        .filter(|l| l.owner == owner)
        .ok_or_else(|| CommandError::not_found("Label"))?;
    if let Some(name) = opt_str(args, "name") {
        label.name = name;
    }
    if let Some(color) = color {
        label.color = color;
    }
    if let Some(order) = opt_i64(args, "item_order") {
        label.item_order = order;
    }
    Ok(None)
}

fn filter_add(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let name = str_arg(args, "name")?.to_string();
    let query = str_arg(args, "query")?.to_string();
    let color = opt_color(args)?.unwrap_or(DEFAULT_COLOR);
    let id = store.next_id();
    let item_order = opt_i64(args, "item_order")
        .unwrap_or_else(|| store.owned(&store.filters, owner).len() as i64 + 1);
    store.filters.insert(
        id,
        Filter {
            id,
            name,
            query,
            color,
            item_order,
            is_deleted: 0,
            owner,
        },
    );
    Ok(Some(id))
}

fn filter_update(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let color = opt_color(args)?;
    let filter = store
        .filters
        .get_mut(&id_arg(args, "id")?)
        .filter(|f| f.owner == owner)
        .ok_or_else(|| CommandError::not_found("Filter"))?;
    if let Some(name) = opt_str(args, "name") {
        filter.name = name;
    }
    if let Some(query) = opt_str(args, "query") {
        filter.query = query;
    }
    if let Some(color) = color {
        filter.color = color;
    }
    if let Some(order) = opt_i64(args, "item_order") {
        filter.item_order = order;
    }
    Ok(None)
}

fn reminder_add(store: &mut Store, owner: u64, args: &Value) -> Outcome {
    let item_id = id_arg(args, "item_id")?;
    if store.item_of(owner, item_id).is_none() {
        return Err(CommandError::not_found("Item"));
    }
    let kind = opt_str(args, "type").unwrap_or_else(|| "relative".to_string());
    let due: Option<Due> = if args["due"].is_null() {
        None
    } else {
        Some(serde_json::from_value(args["due"].clone()).map_err(|_| CommandError::invalid("due"))?)
    };
    if kind == "absolute" && due.is_none() {
        return Err(CommandError::missing("due"));
    }
    if kind == "location" && args["loc_lat"].is_null() {
        return Err(CommandError::missing("loc_lat"));
    }
    let id = store.next_id();
    store.reminders.insert(
        id,
        Reminder {
            id,
            item_id,
            service: opt_str(args, "service").unwrap_or_else(|| "push".to_string()),
            kind,
            due,
            name: opt_str(args, "name"),
            loc_lat: opt_str(args, "loc_lat"),
            loc_long: opt_str(args, "loc_long"),
            loc_trigger: opt_str(args, "loc_trigger"),
            radius: args["radius"].as_u64().map(|r| r as u32),
            is_deleted: 0,
            owner,
        },
    );
    Ok(Some(id))
}
