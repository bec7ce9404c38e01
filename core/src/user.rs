//! The authenticated user and everything reachable from the account.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::command::CommandType;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::label::Label;
use crate::note::Note;
use crate::options::{Color, Event, NotificationService, ProjectOptions, UserUpdate};
use crate::project::Project;
use crate::reminder::Reminder;
use crate::session::AuthContext;
use crate::task::{self, Task};
use crate::types::{FileAttachment, ObjectId, ProductivityStats, SyncResponse, UserData};

/// A logged-in Todoist user. Obtained from [`Session`](crate::Session).
///
/// Clones share the same session: logging out through one clone logs out
/// all of them, along with every project and task they produced.
#[derive(Debug, Clone)]
pub struct User {
    auth: Arc<AuthContext>,
    data: UserData,
}

impl User {
    pub(crate) fn new(auth: Arc<AuthContext>, data: UserData) -> Self {
        Self { auth, data }
    }

    pub fn id(&self) -> ObjectId {
        self.data.id
    }

    pub fn email(&self) -> &str {
        &self.data.email
    }

    pub fn full_name(&self) -> &str {
        &self.data.full_name
    }

    pub fn api_token(&self) -> &str {
        &self.data.token
    }

    pub fn inbox_project_id(&self) -> Option<ObjectId> {
        self.data.inbox_project
    }

    /// Profile as last fetched.
    pub fn info(&self) -> &UserData {
        &self.data
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.is_active() && !self.data.token.is_empty()
    }

    /// Forget the session locally. Every object derived from this user stops
    /// issuing requests and fails with `Error::Authentication` instead.
    pub fn logout(&self) {
        info!(user_id = self.data.id, "logged out");
        self.auth.deactivate();
    }

    pub fn update(&mut self, changes: &UserUpdate) -> Result<()> {
        self.auth.execute(CommandType::UserUpdate, changes)?;
        changes.apply(&mut self.data);
        Ok(())
    }

    /// Re-read the profile from the service.
    pub fn refresh(&mut self) -> Result<()> {
        let sync = self.auth.sync(&["user"])?;
        let mut data = sync
            .user
            .ok_or_else(|| Error::Deserialization("sync response did not include the user".to_string()))?;
        if data.token.is_empty() {
            data.token = self.data.token.clone();
        }
        self.data = data;
        Ok(())
    }

    /// Raw read of the given resource types (`"all"` for everything).
    pub fn sync(&self, resource_types: &[&str]) -> Result<SyncResponse> {
        self.auth.sync(resource_types)
    }

    pub fn add_project(&self, name: &str, options: &ProjectOptions) -> Result<Project> {
        if name.trim().is_empty() {
            return Err(Error::invalid("project name must not be empty"));
        }
        let args = Named { name, rest: options };
        let data = self.auth.create(CommandType::ProjectAdd, &args)?;
        Ok(Project::new(self.auth.clone(), data))
    }

    /// First project named `name`, if any.
    pub fn get_project(&self, name: &str) -> Result<Option<Project>> {
        Ok(self.get_projects()?.into_iter().find(|p| p.name() == name))
    }

    pub fn get_projects(&self) -> Result<Vec<Project>> {
        let sync = self.auth.sync(&["projects"])?;
        Ok(sync
            .projects
            .into_iter()
            .filter(|p| !p.is_deleted)
            .map(|p| Project::new(self.auth.clone(), p))
            .collect())
    }

    pub fn get_archived_projects(&self) -> Result<Vec<Project>> {
        Ok(self
            .get_projects()?
            .into_iter()
            .filter(|p| p.is_archived())
            .collect())
    }

    /// Every task across all projects, completed ones included when the
    /// service still reports them.
    pub fn get_tasks(&self) -> Result<Vec<Task>> {
        task::active_tasks(&self.auth, None)
    }

    pub fn get_uncompleted_tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .get_tasks()?
            .into_iter()
            .filter(|t| !t.is_completed())
            .collect())
    }

    pub fn get_completed_tasks(&self) -> Result<Vec<Task>> {
        task::completed_tasks(&self.auth, None)
    }

    /// Tasks matching at least one of `queries`, e.g. [`Query::Overdue`](crate::Query)
    /// or a date such as `"18 Sep"`.
    pub fn search_tasks<I, S>(&self, queries: I) -> Result<Vec<Task>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries: Vec<String> = queries.into_iter().map(|q| q.as_ref().to_string()).collect();
        let results = self.auth.call(
            |client, token| client.build_query(token, &queries),
            |client, response| client.parse_query(response),
        )?;
        Ok(results
            .into_iter()
            .flat_map(|result| result.into_items())
            .map(|item| Task::new(self.auth.clone(), item))
            .collect())
    }

    /// Add a task with the quick-add syntax, e.g. `"Call mom #Family"`.
    pub fn quick_add(&self, text: &str, note: Option<&str>, reminder: Option<&str>) -> Result<Task> {
        if text.trim().is_empty() {
            return Err(Error::invalid("task text must not be empty"));
        }
        let item = self.auth.call(
            |client, token| Ok(client.build_quick_add(token, text, note, reminder)),
            |client, response| client.parse_item(response),
        )?;
        Ok(Task::new(self.auth.clone(), item))
    }

    pub fn add_label(&self, name: &str, color: Option<Color>) -> Result<Label> {
        if name.trim().is_empty() {
            return Err(Error::invalid("label name must not be empty"));
        }
        let data = self
            .auth
            .create(CommandType::LabelAdd, json!({"name": name, "color": color}))?;
        Ok(Label::new(self.auth.clone(), data))
    }

    pub fn get_label(&self, name: &str) -> Result<Option<Label>> {
        Ok(self.get_labels()?.into_iter().find(|l| l.name() == name))
    }

    pub fn get_labels(&self) -> Result<Vec<Label>> {
        let sync = self.auth.sync(&["labels"])?;
        Ok(sync
            .labels
            .into_iter()
            .filter(|l| !l.is_deleted)
            .map(|l| Label::new(self.auth.clone(), l))
            .collect())
    }

    /// Notes on tasks and on projects.
    pub fn get_notes(&self) -> Result<Vec<Note>> {
        crate::note::all_notes(&self.auth)
    }

    pub fn add_filter(
        &self,
        name: &str,
        query: &str,
        color: Option<Color>,
        item_order: Option<i64>,
    ) -> Result<Filter> {
        if name.trim().is_empty() || query.trim().is_empty() {
            return Err(Error::invalid("filter name and query must not be empty"));
        }
        let data = self.auth.create(
            CommandType::FilterAdd,
            json!({"name": name, "query": query, "color": color, "item_order": item_order}),
        )?;
        Ok(Filter::new(self.auth.clone(), data))
    }

    pub fn get_filter(&self, name: &str) -> Result<Option<Filter>> {
        Ok(self.get_filters()?.into_iter().find(|f| f.name() == name))
    }

    pub fn get_filters(&self) -> Result<Vec<Filter>> {
        let sync = self.auth.sync(&["filters"])?;
        Ok(sync
            .filters
            .into_iter()
            .filter(|f| !f.is_deleted)
            .map(|f| Filter::new(self.auth.clone(), f))
            .collect())
    }

    /// Upload a file so it can be attached to a note with
    /// [`Task::add_note_with_file`] or [`Project::add_note_with_file`].
    pub fn upload_file(&self, path: impl AsRef<Path>) -> Result<FileAttachment> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::invalid(format!("{} has no usable file name", path.display())))?;
        let content = fs::read(path).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.upload_bytes(file_name, content)
    }

    pub fn upload_bytes(&self, file_name: &str, content: Vec<u8>) -> Result<FileAttachment> {
        if file_name.trim().is_empty() {
            return Err(Error::invalid("file name must not be empty"));
        }
        let attachment = self.auth.call(
            |client, token| Ok(client.build_upload_file(token, file_name, content)),
            |client, response| client.parse_upload_file(response),
        )?;
        debug!(file_name, size = ?attachment.file_size, "file uploaded");
        Ok(attachment)
    }

    pub fn get_reminders(&self) -> Result<Vec<Reminder>> {
        crate::reminder::all_reminders(&self.auth)
    }

    pub fn clear_reminder_locations(&self) -> Result<()> {
        self.auth.execute(CommandType::ClearLocations, json!({}))
    }

    fn update_notification_settings(
        &self,
        event: Event,
        service: NotificationService,
        dont_notify: bool,
    ) -> Result<()> {
        self.auth.call(
            |client, token| {
                Ok(client.build_update_notification_setting(token, event, service, dont_notify))
            },
            |client, response| client.parse_empty(response),
        )
    }

    pub fn enable_push_notifications(&self, event: Event) -> Result<()> {
        self.update_notification_settings(event, NotificationService::Push, false)
    }

    pub fn disable_push_notifications(&self, event: Event) -> Result<()> {
        self.update_notification_settings(event, NotificationService::Push, true)
    }

    pub fn enable_email_notifications(&self, event: Event) -> Result<()> {
        self.update_notification_settings(event, NotificationService::Email, false)
    }

    pub fn disable_email_notifications(&self, event: Event) -> Result<()> {
        self.update_notification_settings(event, NotificationService::Email, true)
    }

    pub fn get_productivity_stats(&self) -> Result<ProductivityStats> {
        self.auth.call(
            |client, token| Ok(client.build_get_productivity_stats(token)),
            |client, response| client.parse_productivity_stats(response),
        )
    }

    pub fn enable_karma(&self) -> Result<()> {
        self.auth.execute(CommandType::UpdateGoals, json!({"karma_disabled": 0}))
    }

    pub fn disable_karma(&self) -> Result<()> {
        self.auth.execute(CommandType::UpdateGoals, json!({"karma_disabled": 1}))
    }

    pub fn enable_vacation(&self) -> Result<()> {
        self.auth.execute(CommandType::UpdateGoals, json!({"vacation_mode": 1}))
    }

    pub fn disable_vacation(&self) -> Result<()> {
        self.auth.execute(CommandType::UpdateGoals, json!({"vacation_mode": 0}))
    }

    pub fn update_daily_karma_goal(&self, goal: u32) -> Result<()> {
        self.auth.execute(CommandType::UpdateGoals, json!({"daily_goal": goal}))
    }

    pub fn update_weekly_karma_goal(&self, goal: u32) -> Result<()> {
        self.auth.execute(CommandType::UpdateGoals, json!({"weekly_goal": goal}))
    }

    /// A link that logs the user into the web app on first use.
    pub fn get_redirect_link(&self) -> Result<String> {
        self.auth.call(
            |client, token| Ok(client.build_get_redirect_link(token, None)),
            |client, response| client.parse_redirect_link(response),
        )
    }

    /// Permanently delete the account. The session ends on success.
    pub fn delete(self, password: &str, reason: Option<&str>) -> Result<()> {
        self.auth.call(
            |client, token| Ok(client.build_delete_user(token, password, reason)),
            |client, response| client.parse_empty(response),
        )?;
        info!(user_id = self.data.id, "account deleted");
        self.auth.deactivate();
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct Named<'a, T: serde::Serialize> {
    name: &'a str,
    #[serde(flatten)]
    rest: &'a T,
}
