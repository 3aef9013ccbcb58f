use pretty_assertions::assert_eq;
use rag_client_core::{
    ClientError, ConversationStore, DocumentStore, Envelope, ProgressCallback, RequestGateway,
    UploadFile, UploadProgress,
};
use rag_client_lib::adapters::{ChannelNotifier, HttpGateway};
use rag_client_lib::config::Config;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{
    matchers::{body_json, body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn test_config(server: &MockServer) -> Config {
    Config {
        api_base_url: format!("{}/api", server.uri()),
        api_token: Some("test-token".to_string()),
        ..Config::default()
    }
}

fn ok_envelope(data: serde_json::Value) -> serde_json::Value {
    json!({ "code": 200, "message": "success", "data": data, "timestamp": 1700000000000i64 })
}

fn document_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "fileName": name,
        "fileSize": 12,
        "fileType": "txt",
        "status": "COMPLETED",
        "uploadTime": "2024-05-01T10:00:00",
        "chunkCount": 1
    })
}

#[tokio::test]
async fn get_sends_bearer_token_and_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .and(header("Authorization", "Bearer test-token"))
        .and(query_param("page", "2"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
            "total": 0, "page": 2, "size": 10, "records": []
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let envelope = gateway
        .get("/documents", &[("page", "2".to_string()), ("size", "10".to_string())])
        .await
        .unwrap();

    assert!(envelope.is_ok());
    assert_eq!(envelope.data["page"], json!(2));
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_json(json!({ "query": "What is X?", "topK": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
            "query": "What is X?", "answer": "X is...", "references": [], "responseTimeMs": 12
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let envelope = gateway
        .post("/query", json!({ "query": "What is X?", "topK": 5 }))
        .await
        .unwrap();

    assert_eq!(envelope.data["answer"], json!("X is..."));
}

#[tokio::test]
async fn delete_targets_the_document_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/documents/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!(null))))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let envelope = gateway.delete("/documents/7").await.unwrap();

    assert!(envelope.is_ok());
    assert!(envelope.data.is_null());
}

#[tokio::test]
async fn upload_sends_multipart_file_and_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"notes.txt\""))
        .and(body_string_contains("hello upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope(document_json(3, "notes.txt"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::<UploadProgress>::new()));
    let sink = seen.clone();
    let progress: ProgressCallback = Arc::new(move |p: UploadProgress| sink.lock().unwrap().push(p));

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let file = UploadFile::new("notes.txt", &b"hello upload"[..]);
    let envelope = gateway
        .upload("/documents", file, Some(progress))
        .await
        .unwrap();

    assert_eq!(envelope.data["fileName"], json!("notes.txt"));
    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.last().copied(),
        Some(UploadProgress { loaded: 12, total: 12 })
    );
}

#[tokio::test]
async fn business_error_envelope_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 404, "message": "文档不存在", "data": null
        })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let envelope = gateway.get("/documents/99", &[]).await.unwrap();

    assert_eq!(envelope, Envelope::error(404, "文档不存在"));
}

#[tokio::test]
async fn error_status_keeps_status_and_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 500, "message": "服务器内部错误", "data": null
        })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let failure = gateway.post("/query", json!({})).await.unwrap_err();

    assert_eq!(failure.status, Some(500));
    assert_eq!(
        failure.envelope.and_then(|e| e.message).as_deref(),
        Some("服务器内部错误")
    );
    assert!(!failure.timed_out);
}

#[tokio::test]
async fn error_status_without_envelope_has_no_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query/history"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let failure = gateway.get("/query/history", &[]).await.unwrap_err();

    assert_eq!(failure.status, Some(502));
    assert_eq!(failure.envelope, None);
}

#[tokio::test]
async fn success_status_with_foreign_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(&test_config(&server)).unwrap();
    let failure = gateway.get("/documents", &[]).await.unwrap_err();

    assert_eq!(failure.status, Some(200));
    assert_eq!(failure.envelope, None);
    assert!(!failure.timed_out);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_envelope(json!(null)))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = Config {
        request_timeout: Duration::from_millis(100),
        ..test_config(&server)
    };
    let gateway = HttpGateway::new(&config).unwrap();
    let failure = gateway.post("/query", json!({})).await.unwrap_err();

    assert!(failure.timed_out);
    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn token_is_read_from_the_token_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .and(header("Authorization", "Bearer from-file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
            "total": 0, "page": 1, "size": 10, "records": []
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let token_path = std::env::temp_dir().join(format!("rag-token-{}", std::process::id()));
    tokio::fs::write(&token_path, "from-file\n").await.unwrap();

    let config = Config {
        api_token: None,
        token_path: Some(token_path.clone()),
        ..test_config(&server)
    };
    let gateway = HttpGateway::new(&config).unwrap();
    let result = gateway.get("/documents", &[]).await;
    tokio::fs::remove_file(&token_path).await.unwrap();

    assert!(result.is_ok());
}

#[tokio::test]
async fn failed_query_rolls_back_and_notifies_through_the_stack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 500, "message": "服务器内部错误", "data": null
        })))
        .mount(&server)
        .await;

    let gateway = Arc::new(HttpGateway::new(&test_config(&server)).unwrap());
    let (notifier, mut notifications) = ChannelNotifier::new();
    let store = ConversationStore::new(gateway, Arc::new(notifier));

    let err = store.submit_query("hello").await.unwrap_err();

    assert_eq!(
        err,
        ClientError::Transport {
            status: Some(500),
            message: "服务器内部错误".to_string()
        }
    );
    assert_eq!(notifications.recv().await.as_deref(), Some("服务器内部错误"));
    assert!(store.messages().is_empty());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn uploaded_document_lands_at_the_front_of_the_inventory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
            "total": 1, "page": 1, "size": 10, "records": [document_json(1, "old.pdf")]
        }))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/documents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok_envelope(document_json(2, "new.txt"))),
        )
        .mount(&server)
        .await;

    let gateway = Arc::new(HttpGateway::new(&test_config(&server)).unwrap());
    let (notifier, _notifications) = ChannelNotifier::new();
    let store = DocumentStore::new(gateway, Arc::new(notifier));

    store.fetch_page(1, 10).await.unwrap();
    store
        .upload(UploadFile::new("new.txt", &b"new content"[..]))
        .await
        .unwrap();

    let names: Vec<String> = store.documents().into_iter().map(|d| d.file_name).collect();
    assert_eq!(names, vec!["new.txt".to_string(), "old.pdf".to_string()]);
    assert_eq!(store.total(), 2);
}
