//! End-to-end API behaviour over TCP and Unix sockets.

use axum::Router;
use serde_json::{json, Value};
use velarium::http::routes::{ChatReply, SessionCreated};
use velarium::StartupSequencer;

mod common;

async fn prepared_app(debug: bool) -> (tempfile::TempDir, Router) {
    let (dir, sessions) = common::migrated_sessions().await;
    let mut config = common::loopback_config();
    config.debug = debug;
    let router = StartupSequencer::new(config, common::echo_agent, sessions)
        .prepare()
        .await
        .unwrap()
        .router;
    (dir, router)
}

#[tokio::test]
async fn conversation_is_recorded_in_session() {
    let (_dir, app) = prepared_app(false).await;
    let server = common::TestServer::start(app).await;
    let client = common::client();

    let created: SessionCreated = client
        .post(server.url("/api/sessions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(created.url.starts_with("http://"));

    for message in ["hello", "again"] {
        let response = client
            .post(server.url("/api/chat"))
            .json(&json!({ "message": message, "session_id": created.id }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let reply: ChatReply = response.json().await.unwrap();
        assert_eq!(reply.session_id, Some(created.id));
        if message == "again" {
            assert_eq!(reply.reply, "again (message 2 in this session)");
        }
    }

    let session: Value = client
        .get(server.url(&format!("/api/sessions/{}", created.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let turns = session["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[1]["role"], "agent");

    server.stop().await;
}

#[tokio::test]
async fn unknown_session_is_404_and_empty_message_is_400() {
    let (_dir, app) = prepared_app(false).await;
    let server = common::TestServer::start(app).await;
    let client = common::client();

    let missing = client
        .get(server.url(&format!("/api/sessions/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let empty = client
        .post(server.url("/api/chat"))
        .json(&json!({ "message": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    server.stop().await;
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (_dir, app) = prepared_app(false).await;
    let server = common::TestServer::start(app).await;

    let response = common::client()
        .get(server.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    server.stop().await;
}

#[tokio::test]
async fn docs_are_exposed_only_in_debug() {
    let client = common::client();

    let (_dir, app) = prepared_app(true).await;
    let server = common::TestServer::start(app).await;
    let document: Value = client
        .get(server.url("/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(document["paths"]["/api/chat"]["post"].is_object());
    let redirect = client.get(server.url("/docs")).send().await.unwrap();
    assert!(redirect.status().is_redirection());
    let page = client.get(server.url("/docs/")).send().await.unwrap();
    assert_eq!(page.status(), 200);
    assert!(page.text().await.unwrap().to_lowercase().contains("swagger"));
    server.stop().await;

    let (_dir, app) = prepared_app(false).await;
    let server = common::TestServer::start(app).await;
    for path in ["/openapi.json", "/docs", "/docs/"] {
        let response = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 404, "{}", path);
    }
    server.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn serves_on_unix_socket_and_removes_it() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use velarium::lifecycle::Shutdown;
    use velarium::net::BindTarget;
    use velarium::ServerRunner;

    let socket_dir = tempfile::tempdir().unwrap();
    let path = socket_dir.path().join("velarium.sock");
    let (_dir, app) = prepared_app(false).await;

    let bound = ServerRunner::new(BindTarget::Unix(path.clone()))
        .bind()
        .await
        .unwrap();
    assert!(bound.local_addr().is_none());
    assert!(path.exists());

    let shutdown = Shutdown::new();
    let server = tokio::spawn(bound.serve(app, shutdown.signalled()));

    let mut stream = tokio::net::UnixStream::connect(&path).await.unwrap();
    stream
        .write_all(
            b"POST /api/sessions HTTP/1.1\r\n\
              Host: chat.example.com\r\n\
              X-Forwarded-Proto: https\r\n\
              Content-Length: 0\r\n\
              Connection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 201"), "{}", response);
    assert!(
        response
            .to_ascii_lowercase()
            .contains("location: https://chat.example.com/api/sessions/"),
        "{}",
        response
    );

    shutdown.trigger();
    server.await.unwrap().unwrap();
    assert!(!path.exists());
}
