use bytes::Bytes;
use rask_log_client::app::{App, Config, Strategy};
use rask_log_client::{
    AsyncBulkLogger, ClientConfig, HttpTransport, LogError, Message, SyncLogger, Transport,
    TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        host: server.address().to_string(),
        timeout: Some(Duration::from_secs(5)),
        ..ClientConfig::new(vec!["web".to_string(), "prod".to_string()], "tok", false)
    }
}

#[tokio::test]
async fn test_single_event_posts_to_inputs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inputs/tok/tag/web,prod/"))
        .and(header("content-type", "text/plain"))
        .and(body_string(r#"{"a":1}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"response":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(client_config(&server)).unwrap();
    let response = transport.send(Bytes::from_static(br#"{"a":1}"#)).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.body, r#"{"response":"ok"}"#);

    let stats = transport.stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.successful_requests, 1);
}

#[tokio::test]
async fn test_bulk_posts_joined_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk/tok/tag/web,prod/"))
        .and(body_string("{\"n\":1}\n{\"n\":2}"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = Arc::new(HttpTransport::new(client_config(&server)).unwrap());
    let logger = AsyncBulkLogger::with_transport(transport, 4096, 0).unwrap();

    logger.log(&Message::new().with("n", 1)).await.unwrap();
    logger.log(&Message::new().with("n", 2)).await.unwrap();
    logger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("NG"))
        .mount(&server)
        .await;

    let logger = SyncLogger::new(client_config(&server)).unwrap();
    assert_eq!(
        logger.log(&Message::new().with("a", 1)).await,
        Err(LogError::Status {
            status: 500,
            body: "NG".to_string()
        })
    );
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ClientConfig {
        timeout: Some(Duration::from_millis(100)),
        ..client_config(&server)
    };
    let transport = HttpTransport::new(config).unwrap();

    let err = transport.send(Bytes::from_static(b"{}")).await.unwrap_err();
    assert!(matches!(err, TransportError::Request(_)));
    assert_eq!(transport.stats().failed_requests, 1);
}

#[tokio::test]
async fn test_app_forwards_stdin_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bulk/tok/tag/web,prod/"))
        .and(body_string(
            "{\"level\":\"info\",\"msg\":\"started\"}\n{\"message\":\"plain line\"}",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        token: "tok".to_string(),
        tags: vec!["web".to_string(), "prod".to_string()],
        host: server.address().to_string(),
        use_https: false,
        strategy: Strategy::SyncBulk,
        flush_interval_ms: 0,
        add_timestamp: false,
        ..Config::default()
    };
    config.validate().unwrap();

    let input: &[u8] = b"{\"msg\":\"started\",\"level\":\"info\"}\n\nplain line\n";
    let summary = App::from_config(config).unwrap().run(input).await.unwrap();

    assert_eq!(summary.received, 2);
    assert_eq!(summary.undelivered, 0);
}

#[tokio::test]
async fn test_app_counts_undelivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let config = Config {
        token: "tok".to_string(),
        host: server.address().to_string(),
        use_https: false,
        strategy: Strategy::Pool,
        workers: 2,
        queue_size: 4,
        ..Config::default()
    };

    let input: &[u8] = b"one\ntwo\nthree\n";
    let summary = App::from_config(config).unwrap().run(input).await.unwrap();

    assert_eq!(summary.received, 3);
    assert_eq!(summary.undelivered, 3);
}
