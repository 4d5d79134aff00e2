mod common;

use std::sync::Arc;
use chrono::NaiveDate;
use common::{alice, app_with, config_for, signed_in_store, task_json};
use serde_json::json;
use taskflow::{
    config::StorageMode,
    errors::ClientError,
    models::{Priority, TaskFields, TaskStatus},
    services::{storage::set_json, FileStore, KeyValueStore},
    App,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn title_only_task_gets_defaults_and_is_listed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/"))
        .and(body_json(json!({
            "title": "Buy milk",
            "description": "",
            "priority": "medium",
            "status": "todo",
            "due_date": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json(7, "Buy milk", 1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(7, "Buy milk", 1)])))
        .mount(&server)
        .await;

    let app = app_with(&server, signed_in_store(Some("T1"), Some("R1")));
    let mut dashboard = app.dashboard();
    let created = dashboard.create_task(TaskFields::titled("Buy milk")).await.unwrap();
    assert_eq!(created.priority, Priority::Medium);
    assert_eq!(created.status, TaskStatus::Todo);

    let listed = dashboard.load().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 7);
}

#[tokio::test]
async fn blank_title_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json(1, "x", 1)))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_with(&server, signed_in_store(Some("T1"), Some("R1")));
    match app.tasks.create(TaskFields::titled("   ")).await {
        Err(ClientError::Validation { fields, .. }) => assert!(fields.contains_key("title")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn update_sends_the_full_replacement() {
    let server = MockServer::start().await;
    let mut updated = task_json(3, "Ship release", 1);
    updated["status"] = json!("in-progress");
    updated["priority"] = json!("high");
    updated["due_date"] = json!("2024-07-01T00:00:00Z");

    Mock::given(method("PUT"))
        .and(path("/api/tasks/3/"))
        .and(body_json(json!({
            "title": "Ship release",
            "description": "Tag and publish",
            "priority": "high",
            "status": "in-progress",
            "due_date": "2024-07-01"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with(&server, signed_in_store(Some("T1"), Some("R1")));
    let fields = TaskFields {
        title: "Ship release".into(),
        description: "Tag and publish".into(),
        priority: Priority::High,
        status: TaskStatus::InProgress,
        due_date: NaiveDate::from_ymd_opt(2024, 7, 1),
    };
    let task = app.tasks.update(3, fields).await.unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 7, 1));
}

#[tokio::test]
async fn delete_distinguishes_missing_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/4/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "No Task matches the given query." })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with(&server, signed_in_store(Some("T1"), Some("R1")));
    app.tasks.remove(4).await.unwrap();
    match app.tasks.remove(99).await {
        Err(ClientError::NotFound(message)) => assert_eq!(message, "No Task matches the given query."),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn server_field_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "due_date": ["Date has wrong format."]
        })))
        .mount(&server)
        .await;

    let app = app_with(&server, signed_in_store(Some("T1"), Some("R1")));
    match app.tasks.create(TaskFields::titled("Plan")).await {
        Err(ClientError::Validation { message, fields }) => {
            assert_eq!(message, "due_date: Date has wrong format.");
            assert_eq!(fields["due_date"], vec!["Date has wrong format.".to_string()]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn server_failure_keeps_dashboard_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(1, "Keep", 1)])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/1/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = app_with(&server, signed_in_store(Some("T1"), Some("R1")));
    let mut dashboard = app.dashboard();
    dashboard.load().await.unwrap();

    match dashboard.delete_task(1).await {
        Err(ClientError::Server { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected server error, got {:?}", other),
    }
    assert_eq!(dashboard.tasks().len(), 1);
    assert!(app.session.is_authenticated());
}

#[tokio::test]
async fn local_mode_persists_tasks_across_restarts() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let store = FileStore::open(&path).unwrap();
        set_json(&store, "taskManager_user", &alice()).unwrap();
        store.set("access_token", "T1").unwrap();
        store.set("refresh_token", "R1").unwrap();
    }

    let mut config = config_for(&server);
    config.storage.mode = StorageMode::Local;
    config.storage.path = path.clone();

    let first = App::open(&config).unwrap();
    let created = first
        .dashboard()
        .create_task(TaskFields { priority: Priority::High, ..TaskFields::titled("Offline") })
        .await
        .unwrap();
    drop(first);

    let reopened = App::open(&config).unwrap();
    let mut dashboard = reopened.dashboard();
    let tasks = dashboard.load().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);
    assert_eq!(tasks[0].priority, Priority::High);
    assert_eq!(tasks[0].user_id, Some(1));

    // Nothing went over the network
    assert!(server.received_requests().await.unwrap().is_empty());

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
    assert!(store.get("taskManager_tasks").unwrap().is_some());
}
