//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives the domain
//! layer over real HTTP through the default `UreqTransport`, so request
//! building, transport and response parsing are exercised together.

use std::time::{Duration, Instant};

use todoist_core::{
    ClientConfig, Color, Error, Event, FilterUpdate, LabelUpdate, LocationReminder, LocationTrigger,
    Priority, ProjectOptions, ProjectUpdate, Query, ReminderService, Session, SignupDetails,
    TaskUpdate, User, UserUpdate,
};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn session() -> Session {
    Session::new(&ClientConfig::default().with_base_url(&start_server()))
}

fn signup(session: &Session) -> User {
    session
        .register("John Doe", "john.doe@example.com", "password", &SignupDetails::default())
        .unwrap()
}

#[test]
fn register_login_and_logout() {
    let session = session();
    let registered = signup(&session);
    assert_eq!(registered.full_name(), "John Doe");
    assert!(registered.is_logged_in());

    let user = session.login("john.doe@example.com", "password").unwrap();
    assert_eq!(user, registered);
    assert_eq!(user.api_token(), registered.api_token());

    let by_token = session.login_with_api_token(user.api_token()).unwrap();
    assert_eq!(by_token.email(), "john.doe@example.com");

    user.logout();
    assert!(!user.is_logged_in());
    assert!(registered.is_logged_in());
}

#[test]
fn bad_credentials_are_authentication_errors() {
    let session = session();
    signup(&session);

    let err = session.login("john.doe@example.com", "wrong").unwrap_err();
    assert!(matches!(err, Error::Authentication { status: Some(401), .. }), "{err:?}");

    let err = session.login_with_api_token("not-a-token").unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "{err:?}");
}

#[test]
fn duplicate_registration_is_a_validation_error() {
    let session = session();
    signup(&session);
    let err = session
        .register("Someone", "john.doe@example.com", "password", &SignupDetails::default())
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }), "{err:?}");
}

#[test]
fn google_signup_then_login() {
    let session = session();
    let details = SignupDetails {
        lang: Some("en".to_string()),
        timezone: Some("Europe/London".to_string()),
    };
    let user = session
        .register_with_google("Jane", "jane@example.com", "oauth", &details)
        .unwrap();
    assert_eq!(
        user.info().tz_info.as_ref().map(|tz| tz.timezone.as_str()),
        Some("Europe/London")
    );

    let again = session.login_with_google("jane@example.com", "oauth").unwrap();
    assert_eq!(again, user);
}

#[test]
fn task_lifecycle() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    assert!(inbox.is_inbox());

    let task = inbox
        .add_task("Install todoist-core", Some("tomorrow"), Some(Priority::High))
        .unwrap();
    assert_eq!(task.priority(), Some(Priority::High));
    assert_eq!(task.project_id(), inbox.id());

    let open = user.get_uncompleted_tasks().unwrap();
    assert_eq!(open.iter().filter(|t| **t == task).count(), 1);

    task.complete().unwrap();
    assert!(!user.get_uncompleted_tasks().unwrap().contains(&task));
    let done = inbox.get_completed_tasks().unwrap();
    assert!(done.contains(&task));
    assert!(done.iter().all(|t| t.is_completed()));

    task.uncomplete().unwrap();
    assert!(inbox.get_uncompleted_tasks().unwrap().contains(&task));

    let mut task = task;
    task.update(&TaskUpdate {
        content: Some("Install it properly".to_string()),
        priority: Some(Priority::VeryHigh),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(task.content(), "Install it properly");
    task.refresh().unwrap();
    assert_eq!(task.content(), "Install it properly");
    assert_eq!(task.priority(), Some(Priority::VeryHigh));

    let id = task.id();
    task.delete().unwrap();
    assert!(user.get_tasks().unwrap().iter().all(|t| t.id() != id));
}

#[test]
fn empty_task_content_is_rejected_locally() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let err = inbox.add_task("   ", None, None).unwrap_err();
    assert!(matches!(err, Error::Validation { status: None, .. }), "{err:?}");
    assert!(inbox.get_tasks().unwrap().is_empty());
}

#[test]
fn completed_history_does_not_claim_a_priority() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let task = inbox.add_task("Ship it", None, Some(Priority::VeryHigh)).unwrap();
    task.complete().unwrap();

    let done = user.get_completed_tasks().unwrap();
    let from_history = done.iter().find(|t| **t == task).unwrap();
    assert_eq!(from_history.priority(), None);
    assert_eq!(from_history.content(), "Ship it");

    let mut refreshed = from_history.clone();
    refreshed.refresh().unwrap();
    assert_eq!(refreshed.priority(), Some(Priority::VeryHigh));
}

#[test]
fn projects_can_be_updated_archived_and_deleted() {
    let session = session();
    let user = signup(&session);
    let mut project = user
        .add_project(
            "Work",
            &ProjectOptions {
                color: Some(Color::Red),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(project.name(), "Work");
    assert_eq!(user.get_projects().unwrap().len(), 2);

    project
        .update(&ProjectUpdate {
            name: Some("Office".to_string()),
            ..Default::default()
        })
        .unwrap();
    project.collapse().unwrap();
    project.refresh().unwrap();
    assert_eq!(project.name(), "Office");
    assert!(project.is_collapsed());

    project.archive().unwrap();
    assert!(project.is_archived());
    assert_eq!(user.get_archived_projects().unwrap(), vec![project.clone()]);
    project.unarchive().unwrap();
    assert!(user.get_archived_projects().unwrap().is_empty());

    project.share("friend@example.com", Some("join me")).unwrap();
    project.delete_collaborator("friend@example.com").unwrap();
    project.take_ownership().unwrap();

    project.delete().unwrap();
    assert!(user.get_project("Office").unwrap().is_none());
}

#[test]
fn inbox_cannot_be_deleted() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let err = inbox.delete().unwrap_err();
    assert!(matches!(err, Error::Validation { status: Some(400), .. }), "{err:?}");
    assert!(user.get_project("Inbox").unwrap().is_some());
}

#[test]
fn moving_a_task_between_projects() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let work = user.add_project("Work", &ProjectOptions::default()).unwrap();
    let mut task = inbox.add_task("Report", None, None).unwrap();

    task.move_to(&work).unwrap();
    assert_eq!(task.project_id(), work.id());
    assert!(work.get_tasks().unwrap().contains(&task));
    assert!(!inbox.get_tasks().unwrap().contains(&task));
    assert_eq!(task.project().unwrap(), work);
}

#[test]
fn notes_on_tasks_and_projects() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let task = inbox.add_task("Read", None, None).unwrap();

    let mut note = task.add_note("chapter 3").unwrap();
    assert_eq!(note.item_id(), Some(task.id()));
    let project_note = inbox.add_note("weekly review").unwrap();
    assert_eq!(project_note.project_id(), Some(inbox.id()));

    assert_eq!(task.get_notes().unwrap(), vec![note.clone()]);
    assert_eq!(inbox.get_notes().unwrap(), vec![project_note.clone()]);
    assert_eq!(user.get_notes().unwrap().len(), 2);

    note.update("chapter 4").unwrap();
    assert_eq!(task.get_notes().unwrap()[0].content(), "chapter 4");

    note.delete().unwrap();
    assert!(task.get_notes().unwrap().is_empty());
}

#[test]
fn uploaded_files_can_be_attached_to_notes() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let task = inbox.add_task("Review contract", None, None).unwrap();

    let path = std::env::temp_dir().join(format!("todoist-core-{}.txt", std::process::id()));
    std::fs::write(&path, b"signed on page 4").unwrap();
    let attachment = user.upload_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(attachment.file_size, Some(16));
    assert_eq!(Some(attachment.file_name.as_str()), path.file_name().and_then(|n| n.to_str()));

    let note = task.add_note_with_file("see attached", &attachment).unwrap();
    assert_eq!(note.file_attachment(), Some(&attachment));
    let stored = task.get_notes().unwrap().remove(0);
    assert_eq!(stored.file_attachment().map(|f| f.file_url.as_str()), Some(attachment.file_url.as_str()));

    let err = user.upload_file(path).unwrap_err();
    assert!(matches!(err, Error::File { .. }), "{err:?}");
    let err = user.upload_bytes(" ", b"x".to_vec()).unwrap_err();
    assert!(matches!(err, Error::Validation { status: None, .. }), "{err:?}");
}

#[test]
fn labels_and_filters() {
    let session = session();
    let user = signup(&session);

    let mut label = user.add_label("errands", Some(Color::LightBlue)).unwrap();
    assert_eq!(label.color(), Some(Color::LightBlue as u8));
    label
        .update(&LabelUpdate {
            name: Some("chores".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(user.get_label("chores").unwrap().is_some());
    assert!(user.get_label("errands").unwrap().is_none());

    let mut filter = user
        .add_filter("Urgent", "p1 & today", None, None)
        .unwrap();
    filter
        .update(&FilterUpdate {
            query: Some("p1".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(user.get_filter("Urgent").unwrap().unwrap().query(), "p1");

    label.delete().unwrap();
    filter.delete().unwrap();
    assert!(user.get_labels().unwrap().is_empty());
    assert!(user.get_filters().unwrap().is_empty());
}

#[test]
fn reminders_on_a_task() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let task = inbox.add_task("Dentist", None, None).unwrap();

    let at = task
        .add_date_reminder(ReminderService::Push, "2030-01-01T09:00")
        .unwrap();
    assert_eq!(at.kind(), Some("absolute"));
    assert_eq!(at.item_id(), task.id());

    let near = task
        .add_location_reminder(&LocationReminder {
            service: ReminderService::Email,
            name: "Office".to_string(),
            latitude: "51.5".to_string(),
            longitude: "-0.12".to_string(),
            trigger: LocationTrigger::OnEnter,
            radius: 100,
        })
        .unwrap();
    assert_eq!(near.kind(), Some("location"));

    assert_eq!(task.get_reminders().unwrap().len(), 2);
    assert_eq!(user.get_reminders().unwrap().len(), 2);
    user.clear_reminder_locations().unwrap();

    at.delete().unwrap();
    assert_eq!(task.get_reminders().unwrap(), vec![near]);
}

#[test]
fn quick_add_and_search() {
    let session = session();
    let user = signup(&session);
    let work = user.add_project("Work", &ProjectOptions::default()).unwrap();

    let task = user.quick_add("Send invoice #Work", Some("by friday"), None).unwrap();
    assert_eq!(task.content(), "Send invoice");
    assert_eq!(task.project_id(), work.id());
    assert_eq!(task.get_notes().unwrap()[0].content(), "by friday");

    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let urgent = inbox.add_task("Fix prod", None, Some(Priority::VeryHigh)).unwrap();

    let found = user.search_tasks([Query::Priority1]).unwrap();
    assert_eq!(found, vec![urgent]);
    let all = user.search_tasks([Query::All]).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn account_settings() {
    let session = session();
    let mut user = signup(&session);

    user.update(&UserUpdate {
        full_name: Some("Johnny".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(user.full_name(), "Johnny");
    user.refresh().unwrap();
    assert_eq!(user.full_name(), "Johnny");

    user.disable_push_notifications(Event::ItemCompleted).unwrap();
    user.enable_email_notifications(Event::NoteAdded).unwrap();

    user.update_daily_karma_goal(8).unwrap();
    user.enable_vacation().unwrap();
    user.disable_karma().unwrap();
    let stats = user.get_productivity_stats().unwrap();
    let goals = stats.goals.unwrap();
    assert_eq!(goals.daily_goal, Some(8));
    assert!(goals.vacation_mode);
    assert!(goals.karma_disabled);

    assert!(user.get_redirect_link().unwrap().starts_with("https://"));
}

#[test]
fn logout_disables_every_derived_object() {
    let session = session();
    let user = signup(&session);
    let inbox = user.get_project("Inbox").unwrap().unwrap();
    let task = inbox.add_task("Stale", None, None).unwrap();

    user.logout();
    for err in [
        user.get_projects().map(|_| ()).unwrap_err(),
        inbox.get_tasks().map(|_| ()).unwrap_err(),
        task.complete().unwrap_err(),
    ] {
        assert!(matches!(err, Error::Authentication { status: None, .. }), "{err:?}");
    }

    let again = session.login("john.doe@example.com", "password").unwrap();
    assert_eq!(again.get_uncompleted_tasks().unwrap(), vec![task]);
}

#[test]
fn deleting_the_account() {
    let session = session();
    let user = signup(&session);
    let token = user.api_token().to_string();

    let err = user.clone().delete("wrong", None).unwrap_err();
    assert!(matches!(err, Error::Authentication { status: Some(403), .. }), "{err:?}");

    let kept = user.clone();
    user.delete("password", Some("testing")).unwrap();
    assert!(!kept.is_logged_in());
    assert!(session.login_with_api_token(&token).is_err());
    assert!(matches!(
        session.login("john.doe@example.com", "password"),
        Err(Error::Authentication { .. })
    ));
}

#[test]
fn unreachable_service_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = Session::new(&ClientConfig::default().with_base_url(&format!("http://{addr}")));
    let err = session.login("a@b.c", "secret").unwrap_err();
    assert!(err.is_transport(), "{err:?}");
}

#[test]
fn silent_service_times_out_as_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    let config = ClientConfig::default()
        .with_base_url(&format!("http://{addr}"))
        .with_timeout(Duration::from_millis(300));
    let session = Session::new(&config);
    let started = Instant::now();
    let err = session.login("a@b.c", "secret").unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}
