//! Discovery and lifecycle through the plugin manager.

use http::StatusCode;

use hotroute_core::PluginEventKind;
use hotroute_plugin::manager::{DIRECTORY_KEY, PROPAGATE_KEY};
use hotroute_plugin::{FindQuery, Plugin, PluginError, PluginStatus};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_scan_skips_unimportable_directories() {
    let app = TestApp::new().await;
    let manager = app.manager.lock().await;

    let basedirs: Vec<String> = manager
        .scan()
        .unwrap()
        .map(|item| item.unwrap().basedir().unwrap().to_string())
        .collect();

    assert_eq!(
        basedirs,
        vec!["goodbye", "hello", "only-endpoint", "same-domain-as-blueprint"]
    );
}

#[tokio::test]
async fn test_load_all_empties_scan() {
    let app = TestApp::new().await;
    app.load_all().await;

    let manager = app.manager.lock().await;
    assert_eq!(manager.scan().unwrap().count(), 0);
    assert_eq!(manager.tracked().count(), 4);
    assert!(manager.tracked().all(|p| p.status() == PluginStatus::Loaded));
}

#[tokio::test]
async fn test_find_plugins() {
    let app = TestApp::new().await;
    app.load_all().await;
    let manager = app.manager.lock().await;

    let by_domain = manager.find(FindQuery::by_domain("hello")).unwrap().unwrap();
    let by_name = manager.find(FindQuery::by_name("hello")).unwrap().unwrap();
    assert!(by_domain.is_tracked());
    assert_eq!(by_domain.id(), by_name.id());

    let oe = manager.find(FindQuery::by_domain("oe")).unwrap().unwrap();
    assert_eq!(oe.id(), "only-endpoint");

    assert!(manager.find(FindQuery::default()).unwrap().is_none());
    assert!(manager.find(FindQuery::by_id("non-exists")).unwrap().is_none());
}

#[tokio::test]
async fn test_full_cycle_for_every_plugin() {
    let app = TestApp::new().await;
    app.start_all().await;

    let mut manager = app.manager.lock().await;
    let ids: Vec<String> = manager.tracked().map(|p| p.id().to_string()).collect();
    for id in &ids {
        manager.stop(id).await.unwrap();
    }
    for id in &ids {
        let plugin: Plugin = manager.unload(id).await.unwrap();
        assert_eq!(plugin.status(), PluginStatus::Unloaded);
        assert!(plugin.endpoints().is_empty());
    }

    assert_eq!(manager.tracked().count(), 0);
    assert!(manager.host().read().await.url_map().is_empty());
    assert_eq!(manager.scan().unwrap().count(), 4);
}

#[tokio::test]
async fn test_lifecycle_events() {
    let app = TestApp::new().await;
    let mut events = app.manager.lock().await.subscribe();

    {
        let mut manager = app.manager.lock().await;
        manager.load_id("goodbye").unwrap();
        manager.start("goodbye").await.unwrap();
        manager.stop("goodbye").await.unwrap();
        manager.unload("goodbye").await.unwrap();
    }

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.plugin_id, "goodbye");
        assert_eq!(event.domain, "goodbye");
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![
            PluginEventKind::Loaded,
            PluginEventKind::Started,
            PluginEventKind::Stopped,
            PluginEventKind::Unloaded,
        ]
    );
}

#[tokio::test]
async fn test_unimportable_directory_propagates() {
    let app = TestApp::with_config("app", |config| {
        config.set(PROPAGATE_KEY, true);
    })
    .await;

    {
        let manager = app.manager.lock().await;
        let result: Result<Vec<_>, _> = manager.scan().unwrap().collect();
        assert!(matches!(result, Err(PluginError::Discovery { .. })));
        assert!(manager.status().is_err());
    }

    assert_eq!(app.get("/api").await.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_missing_directory() {
    let app = TestApp::with_config("app", |config| {
        config.set(DIRECTORY_KEY, "does-not-exist");
    })
    .await;

    {
        let manager = app.manager.lock().await;
        assert!(matches!(
            manager.scan(),
            Err(PluginError::ScanDirectory { .. })
        ));
    }

    assert_eq!(app.get("/api").await.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_duplicate_ids_fail_on_load() {
    let app = TestApp::with_config("duplicate", |_| {}).await;
    let mut manager = app.manager.lock().await;

    let scanned: Vec<Plugin> = manager.scan().unwrap().map(Result::unwrap).collect();
    assert_eq!(scanned.len(), 2);

    let mut results = Vec::new();
    for plugin in scanned {
        results.push(manager.load(plugin));
    }

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(PluginError::DuplicateId { ref id }) if id == "hello"));
    assert_eq!(manager.tracked().count(), 1);
}
