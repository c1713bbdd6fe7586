//! Plugin routes served through the host while plugins come and go.

use http::StatusCode;
use http::header::{CONTENT_TYPE, LOCATION};

use crate::helpers::TestApp;

async fn running() -> TestApp {
    let app = TestApp::new().await;
    app.start_all().await;
    app
}

#[tokio::test]
async fn test_loaded_plugins_serve_nothing() {
    let app = TestApp::new().await;
    app.load_all().await;

    assert_eq!(app.get("/plugins").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/plugins/hello").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/plugins/hello/admin").await.status, StatusCode::NOT_FOUND);
    assert!(app.host.read().await.url_map().is_empty());
}

#[tokio::test]
async fn test_templated_index() {
    let app = running().await;

    let hello = app.get("/plugins/hello/admin").await;
    assert_eq!(hello.status, StatusCode::OK);
    assert_eq!(hello.text, "HELLO admin!");
    assert!(
        hello.headers[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );

    assert_eq!(app.get("/plugins/goodbye/admin").await.text, "GOODBYE admin!");
}

#[tokio::test]
async fn test_template_output_is_escaped() {
    let app = running().await;

    let response = app.get("/plugins/hello/%3Cb%3E").await;

    assert_eq!(response.text, "HELLO &lt;b&gt;!");
}

#[tokio::test]
async fn test_redirect_uses_relative_endpoint() {
    let app = running().await;

    let response = app.get("/plugins/hello/doge").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.headers[LOCATION], "/plugins/hello/Doge");

    let response = app.get("/plugins/goodbye/doge").await;
    assert_eq!(response.headers[LOCATION], "/plugins/goodbye/Doge");
}

#[tokio::test]
async fn test_static_files() {
    let app = running().await;

    assert_eq!(app.get("/plugins/hello/staticfile").await.text, "HELLO!");
    assert_eq!(app.get("/plugins/goodbye/staticfile").await.text, "GOODBYE!");

    let response = app.get("/plugins/hello/static/file.txt").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text, "HELLO!");
    assert!(
        response.headers[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    assert_eq!(
        app.get("/plugins/hello/static/missing.txt").await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get("/plugins/hello/static/..%2Fplugin.json").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_scoped_error_handlers() {
    let app = running().await;

    let hello = app.get("/plugins/hello/403").await;
    assert_eq!(hello.status, StatusCode::FORBIDDEN);
    assert_eq!(hello.text, "Hello Forbidden!");

    let goodbye = app.get("/plugins/goodbye/403").await;
    assert_eq!(goodbye.status, StatusCode::FORBIDDEN);
    assert_eq!(goodbye.text, "Goodbye Forbidden!");
}

#[tokio::test]
async fn test_endpoint_bound_separately() {
    let app = running().await;

    assert_eq!(
        app.get("/plugins/hello/endpoints/raise").await.status,
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(app.get("/plugins/oe/").await.text, "index");
}

#[tokio::test]
async fn test_after_request_hook_is_scoped() {
    let app = running().await;

    let hello = app.get("/plugins/hello/admin").await;
    assert_eq!(hello.headers["x-hotroute-plugin"], "hello");

    let goodbye = app.get("/plugins/goodbye/admin").await;
    assert!(goodbye.headers.get("x-hotroute-plugin").is_none());
}

#[tokio::test]
async fn test_method_not_allowed() {
    let app = running().await;

    let response = app.request("DELETE", "/plugins/hello/admin").await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_domain_equal_to_blueprint() {
    let app = running().await;

    assert_eq!(app.get("/plugins/plugins/admin").await.text, "SAME admin!");

    let mut manager = app.manager.lock().await;
    manager.stop("same-domain-as-blueprint").await.unwrap();
    manager.unload("same-domain-as-blueprint").await.unwrap();
    drop(manager);

    assert_eq!(
        app.get("/plugins/plugins/admin").await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.get("/plugins/hello/admin").await.text, "HELLO admin!");
}

#[tokio::test]
async fn test_stop_one_plugin_keeps_others() {
    let app = running().await;

    app.manager.lock().await.stop("hello").await.unwrap();

    for path in [
        "/plugins/hello/admin",
        "/plugins/hello/doge",
        "/plugins/hello/staticfile",
        "/plugins/hello/endpoints/raise",
    ] {
        assert_eq!(app.get(path).await.status, StatusCode::NOT_FOUND, "{path}");
    }
    assert_eq!(app.get("/plugins/goodbye/admin").await.text, "GOODBYE admin!");

    // Rules survive a stop.
    let host = app.host.read().await;
    assert!(host.url_map().contains_endpoint("plugins.hello.index"));
    assert!(host.view_function("plugins.hello.raise").is_some());
}

#[tokio::test]
async fn test_unload_cleans_host() {
    let app = running().await;

    {
        let mut manager = app.manager.lock().await;
        manager.stop("hello").await.unwrap();
        manager.unload("hello").await.unwrap();
    }

    let host = app.host.read().await;
    assert!(
        host.url_map()
            .iter_rules()
            .all(|rule| !rule.endpoint().starts_with("plugins.hello."))
    );
    assert!(host.view_function("plugins.hello.raise").is_none());
    assert!(host.resources("plugins.hello").is_none());
    assert_eq!(host.error_handler_count(Some("plugins.hello")), 0);
    assert!(host.url_map().contains_endpoint("plugins.goodbye.index"));
}

#[tokio::test]
async fn test_reload_and_restart() {
    let app = running().await;

    {
        let mut manager = app.manager.lock().await;
        manager.stop("hello").await.unwrap();
        manager.unload("hello").await.unwrap();
    }
    assert_eq!(app.get("/plugins/hello/admin").await.status, StatusCode::NOT_FOUND);

    {
        let mut manager = app.manager.lock().await;
        manager.load_id("hello").unwrap();
        manager.start("hello").await.unwrap();
    }

    let hello = app.get("/plugins/hello/admin").await;
    assert_eq!(hello.text, "HELLO admin!");
    assert_eq!(hello.headers["x-hotroute-plugin"], "hello");
    assert_eq!(app.get("/plugins/hello/403").await.text, "Hello Forbidden!");
}
