use super::item_model;
use datastore::config::ProxyConfig;
use datastore::proxy::{DataProxy, HttpProxy, MemoryProxy};
use datastore::{DataStore, ProxyError, StoreError, Value, ViewOptions};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve `body` with `status` to a single request, returning the base url
async fn serve_once(status: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await.unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{}/rows.json", addr)
}

#[tokio::test]
async fn load_file_then_reload_after_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.json");
    std::fs::write(&path, json!([{"id": 2, "name": "b"}, {"id": 1, "name": "a"}]).to_string())
        .unwrap();

    let store = DataStore::new(&item_model());
    let view = store.create_view(ViewOptions::new().order(["-name"]));
    let url = path.display().to_string();

    assert_eq!(store.load(&url).await.unwrap(), 2);
    assert_eq!(store.source().as_deref(), Some(url.as_str()));
    assert_eq!(view.get_by_index(0).unwrap().id(), &Value::Int(2));

    std::fs::write(&path, json!({"data": [{"id": 5, "name": "e"}]}).to_string()).unwrap();
    assert_eq!(store.reload().await.unwrap(), 1);
    assert_eq!(store.max_id(), Some(Value::Int(5)));
    assert_eq!(view.count(), 1);
}

#[tokio::test]
async fn load_file_url_with_rows_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.json");
    std::fs::write(
        &path,
        json!({"data": [], "items": [{"id": 3}, {"id": 4}]}).to_string(),
    )
    .unwrap();

    let config = ProxyConfig {
        rows_key: Some("items".to_string()),
        ..ProxyConfig::default()
    };
    let store = DataStore::new(&item_model()).with_proxy_config(config);
    let url = format!("file://{}", path.display());
    assert_eq!(store.load(&url).await.unwrap(), 2);
}

#[tokio::test]
async fn failed_load_leaves_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, json!([{"id": 1}, {"name": "no id"}]).to_string()).unwrap();

    let meta = item_model();
    let store = DataStore::with_data(&meta, vec![super::row(json!({"id": 9}))]).unwrap();
    let err = store.load(&path.display().to_string()).await.unwrap_err();
    assert!(matches!(err, StoreError::Model(_)));
    assert_eq!(store.count(), 1);

    std::fs::write(&path, "not json").unwrap();
    let err = store.reload().await.unwrap_err();
    assert!(matches!(err, StoreError::Proxy(ProxyError::Parse(_))));
    assert_eq!(store.max_id(), Some(Value::Int(9)));
}

#[tokio::test]
async fn load_from_custom_proxy() {
    let store = DataStore::auto("Row", None);
    let proxy = MemoryProxy::new(vec![
        super::row(json!({"id": "b", "n": 1})),
        super::row(json!({"id": "a", "n": 2})),
    ]);
    assert_eq!(store.load_from(&proxy).await.unwrap(), 2);
    assert_eq!(store.get_by_index(0).unwrap().id(), &Value::from("a"));
    assert_eq!(store.source(), None);
}

#[tokio::test]
async fn http_proxy_loads_rows() {
    let url = serve_once("200 OK", json!({"rows": [{"id": 1}, {"id": 2}]}).to_string()).await;
    let store = DataStore::new(&item_model());
    assert_eq!(store.load(&url).await.unwrap(), 2);
}

#[tokio::test]
async fn http_proxy_reports_status() {
    let url = serve_once("404 Not Found", "{}".to_string()).await;
    let proxy = HttpProxy::new(url.clone(), &ProxyConfig::default()).unwrap();
    match proxy.load().await.unwrap_err() {
        ProxyError::Status { url: failed, status } => {
            assert_eq!(status, 404);
            assert_eq!(failed, url);
        }
        other => panic!("expected status error, got {:?}", other),
    }
}
