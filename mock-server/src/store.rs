//! In-memory account state behind the mock endpoints.
//!
//! Every resource remembers its owner so one server can host several
//! accounts side by side. Flags are stored as `0`/`1` integers where the
//! real service does so, to keep clients honest about the wire format.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TzInfo {
    pub timezone: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub token: String,
    pub inbox_project: u64,
    pub is_premium: bool,
    pub tz_info: TzInfo,
    pub lang: String,
    pub start_page: Option<String>,
    pub default_reminder: Option<String>,
    pub karma: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Goals {
    pub daily_goal: u32,
    pub weekly_goal: u32,
    pub karma_disabled: u8,
    pub vacation_mode: u8,
}

#[derive(Clone, Debug)]
pub struct Account {
    pub user: User,
    pub password: String,
    pub goals: Goals,
    /// `(event, service)` pairs the user opted out of.
    pub muted: Vec<(String, String)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub color: u8,
    pub parent_id: Option<u64>,
    pub item_order: i64,
    pub collapsed: u8,
    pub shared: bool,
    pub is_archived: u8,
    pub is_deleted: u8,
    pub inbox_project: bool,
    #[serde(skip)]
    pub owner: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Due {
    pub date: Option<String>,
    pub string: Option<String>,
    pub is_recurring: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub project_id: u64,
    pub content: String,
    pub priority: u8,
    pub checked: u8,
    pub due: Option<Due>,
    pub item_order: i64,
    pub labels: Vec<u64>,
    pub collapsed: u8,
    pub responsible_uid: Option<u64>,
    pub in_history: u8,
    pub is_deleted: u8,
    #[serde(skip)]
    pub owner: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub item_id: Option<u64>,
    pub project_id: Option<u64>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_attachment: Option<serde_json::Value>,
    pub posted_uid: u64,
    pub is_deleted: u8,
    #[serde(skip)]
    pub owner: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
    pub color: u8,
    pub item_order: i64,
    pub is_deleted: u8,
    #[serde(skip)]
    pub owner: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Filter {
    pub id: u64,
    pub name: String,
    pub query: String,
    pub color: u8,
    pub item_order: i64,
    pub is_deleted: u8,
    #[serde(skip)]
    pub owner: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reminder {
    pub id: u64,
    pub item_id: u64,
    pub service: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub due: Option<Due>,
    pub name: Option<String>,
    pub loc_lat: Option<String>,
    pub loc_long: Option<String>,
    pub loc_trigger: Option<String>,
    pub radius: Option<u32>,
    pub is_deleted: u8,
    #[serde(skip)]
    pub owner: u64,
}

/// Default color of new projects and labels.
pub const DEFAULT_COLOR: u8 = 7;

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    pub accounts: HashMap<u64, Account>,
    pub projects: BTreeMap<u64, Project>,
    pub items: BTreeMap<u64, Item>,
    pub notes: BTreeMap<u64, Note>,
    pub labels: BTreeMap<u64, Label>,
    pub filters: BTreeMap<u64, Filter>,
    pub reminders: BTreeMap<u64, Reminder>,
}

impl Store {
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn account_by_token(&self, token: &str) -> Option<&Account> {
        if token.is_empty() {
            return None;
        }
        self.accounts.values().find(|a| a.user.token == token)
    }

    pub fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.user.email == email)
    }

    /// Create an account together with its Inbox project.
    pub fn create_account(
        &mut self,
        email: &str,
        full_name: &str,
        password: &str,
        lang: Option<&str>,
        timezone: Option<&str>,
    ) -> User {
        let user_id = self.next_id();
        let inbox_id = self.next_id();
        self.projects.insert(
            inbox_id,
            Project {
                id: inbox_id,
                name: "Inbox".to_string(),
                color: DEFAULT_COLOR,
                parent_id: None,
                item_order: 0,
                collapsed: 0,
                shared: false,
                is_archived: 0,
                is_deleted: 0,
                inbox_project: true,
                owner: user_id,
            },
        );
        let user = User {
            id: user_id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            token: Uuid::new_v4().simple().to_string(),
            inbox_project: inbox_id,
            is_premium: true,
            tz_info: TzInfo {
                timezone: timezone.unwrap_or("UTC").to_string(),
            },
            lang: lang.unwrap_or("en").to_string(),
            start_page: None,
            default_reminder: None,
            karma: 0.0,
        };
        self.accounts.insert(
            user_id,
            Account {
                user: user.clone(),
                password: password.to_string(),
                goals: Goals {
                    daily_goal: 5,
                    weekly_goal: 25,
                    ..Default::default()
                },
                muted: Vec::new(),
            },
        );
        user
    }

    /// Remove an account and everything it owns.
    pub fn delete_account(&mut self, user_id: u64) {
        self.accounts.remove(&user_id);
        self.projects.retain(|_, p| p.owner != user_id);
        self.items.retain(|_, i| i.owner != user_id);
        self.notes.retain(|_, n| n.owner != user_id);
        self.labels.retain(|_, l| l.owner != user_id);
        self.filters.retain(|_, f| f.owner != user_id);
        self.reminders.retain(|_, r| r.owner != user_id);
    }

    pub fn project_of(&self, owner: u64, id: u64) -> Option<&Project> {
        self.projects.get(&id).filter(|p| p.owner == owner)
    }

    pub fn item_of(&self, owner: u64, id: u64) -> Option<&Item> {
        self.items.get(&id).filter(|i| i.owner == owner)
    }

    pub fn owned<'a, T: Owned>(&self, map: &'a BTreeMap<u64, T>, owner: u64) -> Vec<&'a T> {
        map.values().filter(|v| v.owner() == owner).collect()
    }

    pub fn add_item(
        &mut self,
        owner: u64,
        project_id: u64,
        content: &str,
        priority: u8,
        due: Option<Due>,
    ) -> Item {
        let id = self.next_id();
        let item_order = self
            .items
            .values()
            .filter(|i| i.project_id == project_id)
            .count() as i64
            + 1;
        let item = Item {
            id,
            project_id,
            content: content.to_string(),
            priority,
            checked: 0,
            due,
            item_order,
            labels: Vec::new(),
            collapsed: 0,
            responsible_uid: None,
            in_history: 0,
            is_deleted: 0,
            owner,
        };
        self.items.insert(id, item.clone());
        item
    }
}

pub trait Owned {
    fn owner(&self) -> u64;
}

macro_rules! owned {
    ($($ty:ty),*) => {$(
        impl Owned for $ty {
            fn owner(&self) -> u64 {
                self.owner
            }
        }
    )*};
}

owned!(Project, Item, Note, Label, Filter, Reminder);
