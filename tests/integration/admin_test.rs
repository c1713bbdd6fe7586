//! Admin endpoints: `/api` and `/{action}/{id}`.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_api_lists_scanned_plugins_as_unloaded() {
    let app = TestApp::new().await;

    let response = app.get("/api").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let records = body.as_array().unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec!["goodbye", "hello", "only-endpoint", "same-domain-as-blueprint"]
    );
    assert!(records.iter().all(|r| r["status"] == "Unloaded"));
}

#[tokio::test]
async fn test_api_after_load() {
    let app = TestApp::new().await;
    app.load_all().await;

    let body = app.get("/api").await.json();

    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 4);
    for record in records {
        for key in ["id", "name", "status", "domain", "info"] {
            assert!(record.get(key).is_some(), "missing '{key}' in {record}");
        }
        assert_eq!(record["status"], "Loaded");
    }
    let hello = records.iter().find(|r| r["id"] == "hello").unwrap();
    assert_eq!(hello["info"]["author"], "HotRoute Team");
    assert_eq!(hello["info"]["version"], "0.1.0");
}

#[tokio::test]
async fn test_lifecycle_over_http() {
    let app = TestApp::new().await;

    let response = app.get("/load/hello").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "success");
    assert_eq!(app.get("/plugins/hello/admin").await.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get("/start/hello").await.text, "success");
    assert_eq!(app.get("/plugins/hello/admin").await.text, "HELLO admin!");

    assert_eq!(app.get("/stop/hello").await.text, "success");
    assert_eq!(app.get("/plugins/hello/admin").await.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get("/start/hello").await.text, "success");
    assert_eq!(app.get("/plugins/hello/admin").await.text, "HELLO admin!");

    assert_eq!(app.get("/stop/hello").await.text, "success");
    assert_eq!(app.get("/unload/hello").await.text, "success");

    let body = app.get("/api").await.json();
    let hello = body
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == "hello")
        .cloned()
        .unwrap();
    assert_eq!(hello["status"], "Unloaded");
}

#[tokio::test]
async fn test_lifecycle_unknown_plugin() {
    let app = TestApp::new().await;

    for action in ["load", "start", "stop", "unload"] {
        let response = app.get(&format!("/{action}/missing")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "action {action}");
    }
}

#[tokio::test]
async fn test_lifecycle_illegal_transitions() {
    let app = TestApp::new().await;

    // Scanned but not tracked.
    assert_eq!(app.get("/start/hello").await.status, StatusCode::CONFLICT);

    app.get("/load/hello").await;
    assert_eq!(app.get("/load/hello").await.status, StatusCode::CONFLICT);
    assert_eq!(app.get("/stop/hello").await.status, StatusCode::CONFLICT);

    app.get("/start/hello").await;
    assert_eq!(app.get("/unload/hello").await.status, StatusCode::CONFLICT);

    let body = app.get("/stop/hello").await;
    assert_eq!(body.text, "success");
}

#[tokio::test]
async fn test_unrecognized_action_is_forwarded() {
    let app = TestApp::new().await;
    app.start_all().await;

    // `plugins` is not an admin action, so the host answers.
    assert_eq!(app.get("/plugins/hello").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/plugins/oe").await.status, StatusCode::NOT_FOUND);

    // Admin actions only answer GET.
    assert_eq!(app.request("POST", "/stop/hello").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/plugins/hello/admin").await.text, "HELLO admin!");
}
