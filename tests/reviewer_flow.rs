use std::io::Write;
use std::sync::Arc;

use mockito::Matcher;
use repo_reviewer::commands::{self, AppState};
use repo_reviewer::models::{
    MessageStatus, NotificationVariant, ProjectUploadForm, SelectedFile, Sender, SessionPhase,
};
use repo_reviewer::services::api_client::ReviewApiClient;
use repo_reviewer::services::file_service::FsStore;
use repo_reviewer::services::store_service::MemoryStore;
use repo_reviewer::Config;
use serde_json::json;

const REPO: &str = "https://github.com/octo/hello";

fn app(server: &mockito::Server, store: Arc<MemoryStore>) -> AppState {
    let config = Config {
        api_base_url: server.url(),
        ..Config::default()
    };
    let api = Arc::new(ReviewApiClient::from_config(&config).unwrap());
    AppState::new(config, api, store.clone(), store)
}

#[tokio::test]
async fn analyze_then_chat() {
    let mut server = mockito::Server::new_async().await;
    let analyze = server
        .mock("POST", "/api/analyze")
        .match_body(Matcher::Json(json!({"repoUrl": REPO})))
        .with_status(200)
        .with_body(r#"{"response":"This is a **Flask** app."}"#)
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::Json(json!({"repoUrl": REPO, "message": "Where is main?"})))
        .with_status(200)
        .with_body(r#"{"response":"See `app.py`."}"#)
        .create_async()
        .await;
    let mut state = app(&server, Arc::new(MemoryStore::new()));

    let notice = commands::analyze_repository(&mut state, REPO).await.unwrap();
    assert_eq!(notice.title, "Repository Analyzed");

    commands::set_chat_input(&mut state, "Where is main?");
    commands::send_chat_input(&mut state).await.unwrap();

    let session = commands::get_session(&state);
    assert_eq!(session.phase, SessionPhase::Analyzed);
    assert!(session.pending_input.is_empty());
    assert!(!session.is_typing);
    let senders: Vec<Sender> = session.messages.iter().map(|m| m.sender).collect();
    assert_eq!(senders, [Sender::Bot, Sender::User, Sender::Bot]);
    assert_eq!(session.messages[1].status, MessageStatus::Delivered);

    let html = commands::render_message(&state, &session.messages[2].text).to_html();
    assert_eq!(html, r#"<p>See <code class="inline-code">app.py</code>.</p>"#);

    analyze.assert_async().await;
    chat.assert_async().await;
}

#[tokio::test]
async fn invalid_url_never_reaches_the_backend() {
    let mut server = mockito::Server::new_async().await;
    let analyze = server
        .mock("POST", "/api/analyze")
        .expect(0)
        .create_async()
        .await;
    let mut state = app(&server, Arc::new(MemoryStore::new()));

    let notice = commands::analyze_repository(&mut state, "https://github.com/octo")
        .await
        .unwrap_err();

    assert_eq!(notice.title, "Invalid GitHub URL");
    assert_eq!(notice.variant, NotificationVariant::Destructive);
    assert_eq!(commands::get_session(&state).phase, SessionPhase::Idle);
    analyze.assert_async().await;
}

#[tokio::test]
async fn backend_failure_is_surfaced_and_retryable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/analyze")
        .with_status(503)
        .with_body("warming up")
        .create_async()
        .await;
    let mut state = app(&server, Arc::new(MemoryStore::new()));

    let notice = commands::analyze_repository(&mut state, REPO).await.unwrap_err();

    assert_eq!(notice.title, "Analysis Failed");
    assert!(notice.description.contains("503"));
    assert_eq!(commands::get_session(&state).phase, SessionPhase::Idle);
}

#[tokio::test]
async fn upload_clears_selection_on_success() {
    let server = mockito::Server::new_async().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = app(&server, store.clone());

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"def main(): pass").unwrap();
    commands::add_file_paths(&mut state, &[tmp.path().to_path_buf()]).unwrap();
    commands::add_files(
        &mut state,
        vec![SelectedFile::from_bytes("notes.txt", None, b"todo".to_vec())],
    )
    .unwrap();
    assert_eq!(state.selected_files().len(), 2);

    let form = ProjectUploadForm {
        project_id: "proj-7".into(),
        project_description_id: "desc-7".into(),
        grade: "100".into(),
    };
    let notice = commands::submit_project_upload(&mut state, &form).await.unwrap();

    assert_eq!(notice.variant, NotificationVariant::Default);
    assert!(state.selected_files().is_empty());
    assert_eq!(store.object_keys("student-project-files").len(), 2);
    let record = store.record("projects_db", "proj-7").unwrap();
    assert_eq!(record["grade"], 100);
    assert_eq!(record["files"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn oversized_drop_keeps_selection() {
    let server = mockito::Server::new_async().await;
    let mut state = app(&server, Arc::new(MemoryStore::new()));
    commands::add_files(&mut state, vec![SelectedFile::from_bytes("a.txt", None, vec![1])]).unwrap();

    let notice = commands::add_files(
        &mut state,
        vec![SelectedFile::from_bytes("big.bin", None, vec![0; 11 * 1024 * 1024])],
    )
    .unwrap_err();

    assert_eq!(notice.title, "File Too Large");
    assert_eq!(state.selected_files().len(), 1);
}

#[tokio::test]
async fn upload_without_files_is_refused() {
    let server = mockito::Server::new_async().await;
    let store = Arc::new(MemoryStore::new());
    let mut state = app(&server, store.clone());

    let form = ProjectUploadForm {
        project_id: "proj-7".into(),
        project_description_id: "desc-7".into(),
        grade: "50".into(),
    };
    let notice = commands::submit_project_upload(&mut state, &form).await.unwrap_err();

    assert_eq!(notice.title, "No Files Selected");
    assert_eq!(store.record_count("projects_db"), 0);
}

#[tokio::test]
async fn on_disk_store_receives_uploads() {
    let server = mockito::Server::new_async().await;
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        api_base_url: server.url(),
        data_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let mut state = AppState::from_config(config).unwrap();

    commands::add_files(
        &mut state,
        vec![SelectedFile::from_bytes("lib.rs", Some("text/plain"), b"pub fn f() {}".to_vec())],
    )
    .unwrap();
    let form = ProjectUploadForm {
        project_id: "p1".into(),
        project_description_id: "d1".into(),
        grade: "75".into(),
    };
    commands::submit_project_upload(&mut state, &form).await.unwrap();

    let store = FsStore::new(dir.path());
    let record = store.load_record("projects_db", "p1").await.unwrap();
    let key = record["files"][0]["storageKey"].as_str().unwrap();
    assert!(key.starts_with("p1/") && key.ends_with(".rs"));
    assert_eq!(
        store.load_object("student-project-files", key).await.unwrap(),
        b"pub fn f() {}"
    );
}
