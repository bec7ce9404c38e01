//! Argument types for write operations.
//!
//! Change sets (`*Update`) follow one rule: only the fields that are `Some`
//! are serialized and sent, everything else stays unchanged on the server.
//! After the service accepted a change set, the same fields are applied to
//! the local copy.

use serde::Serialize;

use crate::types::{Due, FilterData, ItemData, LabelData, ObjectId, Priority, ProjectData, UserData};

/// Project and label colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Color {
    Green = 0,
    Pink = 1,
    LightOrange = 2,
    Yellow = 3,
    DarkBlue = 4,
    Brown = 5,
    Purple = 6,
    Gray = 7,
    Red = 8,
    DarkOrange = 9,
    Cyan = 10,
    LightBlue = 11,
}

impl From<Color> for u8 {
    fn from(color: Color) -> u8 {
        color as u8
    }
}

/// Events a user can be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    UserLeftProject,
    UserRemovedFromProject,
    ItemCompleted,
    ItemUncompleted,
    ItemAssigned,
    ShareInvitationRejected,
    ShareNotificationAccepted,
    NoteAdded,
    BizTrialWillEnd,
    BizTrialEnterCc,
    BizAccountDisabled,
    BizInvitationRejected,
    BizInvitationAccepted,
    BizPaymentFailed,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Event::UserLeftProject => "user_left_project",
            Event::UserRemovedFromProject => "user_removed_from_project",
            Event::ItemCompleted => "item_completed",
            Event::ItemUncompleted => "item_uncompleted",
            Event::ItemAssigned => "item_assigned",
            Event::ShareInvitationRejected => "share_invitation_rejected",
            Event::ShareNotificationAccepted => "share_notification_accepted",
            Event::NoteAdded => "note_added",
            Event::BizTrialWillEnd => "biz_trial_will_end",
            Event::BizTrialEnterCc => "biz_trial_enter_cc",
            Event::BizAccountDisabled => "biz_account_disabled",
            Event::BizInvitationRejected => "biz_invitation_rejected",
            Event::BizInvitationAccepted => "biz_invitation_accepted",
            Event::BizPaymentFailed => "biz_payment_failed",
        }
    }
}

/// Channel for account notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationService {
    Email,
    Push,
}

impl NotificationService {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationService::Email => "email",
            NotificationService::Push => "push",
        }
    }
}

/// Channel a reminder is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderService {
    Email,
    Sms,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationTrigger {
    OnEnter,
    OnLeave,
}

/// Predefined search keywords understood by the `query` endpoint. Any other
/// string (e.g. `"18 Sep"`) can be passed to `User::search_tasks` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    All,
    Today,
    Tomorrow,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    NoDueDate,
    Overdue,
    Priority1,
    Priority2,
    Priority3,
}

impl Query {
    pub fn as_str(self) -> &'static str {
        match self {
            Query::All => "viewall",
            Query::Today => "today",
            Query::Tomorrow => "tomorrow",
            Query::Monday => "mon",
            Query::Tuesday => "tue",
            Query::Wednesday => "wed",
            Query::Thursday => "thu",
            Query::Friday => "fri",
            Query::Saturday => "sat",
            Query::Sunday => "sun",
            Query::NoDueDate => "no due date",
            Query::Overdue => "overdue",
            Query::Priority1 => "p1",
            Query::Priority2 => "p2",
            Query::Priority3 => "p3",
        }
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_day: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_format: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_reminder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

impl UserUpdate {
    pub(crate) fn apply(&self, user: &mut UserData) {
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if self.start_page.is_some() {
            user.start_page = self.start_page.clone();
        }
        if self.start_day.is_some() {
            user.start_day = self.start_day;
        }
        if self.next_week.is_some() {
            user.next_week = self.next_week;
        }
        if self.time_format.is_some() {
            user.time_format = self.time_format;
        }
        if self.date_format.is_some() {
            user.date_format = self.date_format;
        }
        if self.sort_order.is_some() {
            user.sort_order = self.sort_order;
        }
        if self.default_reminder.is_some() {
            user.default_reminder = self.default_reminder.clone();
        }
        if self.mobile_number.is_some() {
            user.mobile_number = self.mobile_number.clone();
        }
    }
}

/// Optional profile settings sent when an account is created.
#[derive(Debug, Clone, Default)]
pub struct SignupDetails {
    pub lang: Option<String>,
    pub timezone: Option<String>,
}

/// Optional settings for a new project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_order: Option<i64>,
}

impl ProjectUpdate {
    pub(crate) fn apply(&self, project: &mut ProjectData) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(color) = self.color {
            project.color = Some(color.into());
        }
        if let Some(collapsed) = self.collapsed {
            project.collapsed = collapsed;
        }
        if self.item_order.is_some() {
            project.item_order = self.item_order;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Free-form due date such as `"tomorrow"` or `"every day @ 10"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<ObjectId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible_uid: Option<ObjectId>,
}

impl TaskUpdate {
    pub(crate) fn apply(&self, item: &mut ItemData) {
        if let Some(content) = &self.content {
            item.content = content.clone();
        }
        if let Some(priority) = self.priority {
            item.priority = Some(priority);
        }
        if let Some(date_string) = &self.date_string {
            let due = item.due.get_or_insert_with(Due::default);
            due.string = Some(date_string.clone());
        }
        if let Some(labels) = &self.labels {
            item.labels = labels.clone();
        }
        if self.item_order.is_some() {
            item.item_order = self.item_order;
        }
        if let Some(collapsed) = self.collapsed {
            item.collapsed = collapsed;
        }
        if self.responsible_uid.is_some() {
            item.responsible_uid = self.responsible_uid;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_order: Option<i64>,
}

impl LabelUpdate {
    pub(crate) fn apply(&self, label: &mut LabelData) {
        if let Some(name) = &self.name {
            label.name = name.clone();
        }
        if let Some(color) = self.color {
            label.color = Some(color.into());
        }
        if self.item_order.is_some() {
            label.item_order = self.item_order;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_order: Option<i64>,
}

impl FilterUpdate {
    pub(crate) fn apply(&self, filter: &mut FilterData) {
        if let Some(name) = &self.name {
            filter.name = name.clone();
        }
        if let Some(query) = &self.query {
            filter.query = query.clone();
        }
        if let Some(color) = self.color {
            filter.color = Some(color.into());
        }
        if self.item_order.is_some() {
            filter.item_order = self.item_order;
        }
    }
}

/// A reminder that fires when the device enters or leaves an area.
#[derive(Debug, Clone, Serialize)]
pub struct LocationReminder {
    pub service: ReminderService,
    pub name: String,
    #[serde(rename = "loc_lat")]
    pub latitude: String,
    #[serde(rename = "loc_long")]
    pub longitude: String,
    #[serde(rename = "loc_trigger")]
    pub trigger: LocationTrigger,
    /// Radius in meters.
    pub radius: u32,
}
