//! Synchronous client for the Todoist v8 API.
//!
//! # Overview
//! Two layers:
//!
//! - `TodoistClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values for every endpoint without touching the network. A `Transport`
//!   (by default the blocking `UreqTransport`) runs the round-trip.
//! - Domain objects (`User`, `Project`, `Task`, `Note`, `Label`, `Filter`,
//!   `Reminder`) wrap the fetched data together with the owning user's
//!   session and expose the operations that make sense on them.
//!
//! ```no_run
//! use todoist_core::{ClientConfig, Priority, Session};
//!
//! # fn main() -> todoist_core::Result<()> {
//! let session = Session::new(&ClientConfig::default());
//! let user = session.login("john.doe@example.com", "password")?;
//! if let Some(inbox) = user.get_project("Inbox")? {
//!     let task = inbox.add_task("Install todoist-core", None, Some(Priority::High))?;
//!     task.complete()?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - One method call produces one request and nothing is retried. Creates
//!   rebuild the new object from the arguments sent and the id the service
//!   assigned.
//! - Domain objects compare and hash by remote id.
//! - After `User::logout` every object derived from that user fails with
//!   `Error::Authentication` before touching the network.

macro_rules! remote_identity {
    ($($ty:ty),* $(,)?) => {$(
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id() == other.id()
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.id().hash(state);
            }
        }
    )*};
}

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod label;
pub mod note;
pub mod options;
pub mod project;
pub mod reminder;
pub mod session;
pub mod task;
pub mod transport;
pub mod types;
pub mod user;

pub use client::TodoistClient;
pub use command::{Command, CommandType};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use filter::Filter;
pub use http::{FileUpload, HttpMethod, HttpRequest, HttpResponse};
pub use label::Label;
pub use note::Note;
pub use options::{
    Color, Event, FilterUpdate, LabelUpdate, LocationReminder, LocationTrigger, NotificationService,
    ProjectOptions, ProjectUpdate, Query, ReminderService, SignupDetails, TaskUpdate, UserUpdate,
};
pub use project::Project;
pub use reminder::Reminder;
pub use session::Session;
pub use task::Task;
pub use transport::{Transport, UreqTransport};
pub use types::{FileAttachment, ObjectId, Priority};
pub use user::User;

remote_identity!(User, Project, Task, Note, Label, Filter, Reminder);
