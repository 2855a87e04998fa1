mod common;

use common::{RecordingTransport, john_message, wait_until};
use rask_log_client::{AsyncBulkLogger, ConfigurationError, LifecycleState, LogError, Message};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_rejects_invalid_threshold() {
    let transport = Arc::new(RecordingTransport::ok());
    assert!(matches!(
        AsyncBulkLogger::with_transport(transport.clone(), 0, 0),
        Err(ConfigurationError::Threshold(_))
    ));
    assert!(matches!(
        AsyncBulkLogger::with_transport(transport, 5 * 1024 * 1024 + 1, 0),
        Err(ConfigurationError::Threshold(_))
    ));
}

#[tokio::test]
async fn test_logs_accumulate_below_threshold() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 215, 0).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    assert_ok!(logger.log(&john_message(2)).await);

    assert_eq!(logger.pending_len(), 2);
    assert_eq!(logger.pending_bytes(), 144);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_threshold_failure_reaches_triggering_handle() {
    let transport = Arc::new(RecordingTransport::status(500, "NG"));
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 215, 0).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    assert_ok!(logger.log(&john_message(2)).await);

    let err = assert_err!(logger.log(&john_message(3)).await);
    assert_eq!(
        err.error,
        LogError::Status {
            status: 500,
            body: "NG".to_string()
        }
    );
    assert_eq!(
        err.failed_messages,
        vec![
            john_message(1).to_line().unwrap(),
            john_message(2).to_line().unwrap()
        ]
    );
    assert_eq!(logger.snapshot(), vec![john_message(3).to_line().unwrap()]);
}

#[tokio::test]
async fn test_explicit_flush() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 0).unwrap();

    assert_ok!(logger.log(&Message::new().with("k", "v")).await);
    assert_ok!(logger.flush().await);

    assert_eq!(transport.bulk_lines(), vec![r#"{"k":"v"}"#.to_string()]);
    assert_eq!(logger.pending_len(), 0);
}

#[tokio::test]
async fn test_serialization_failure_is_foreground() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 0).unwrap();

    let mut unsupported = HashMap::new();
    unsupported.insert((1, 2), "tuple keys are not JSON");

    let result = logger.log(&unsupported);
    assert!(matches!(
        result.foreground_error(),
        Some(LogError::Serialization(_))
    ));
    let err = assert_err!(result.await);
    assert!(err.failed_messages.is_empty());
    assert_eq!(logger.pending_len(), 0);
}

#[tokio::test]
async fn test_shutdown_flushes_and_refuses() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 60_000).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    assert_ok!(logger.log(&john_message(2)).await);
    assert_ok!(logger.shutdown().await);

    assert_eq!(logger.state(), LifecycleState::Stopped);
    assert!(!logger.is_active());
    assert_eq!(logger.pending_len(), 0);
    assert_eq!(logger.pending_bytes(), 0);
    assert_eq!(transport.bulk_payloads().len(), 1);

    let result = logger.log(&john_message(3));
    assert_eq!(result.foreground_error(), Some(&LogError::ShuttingDown));
    let err = assert_err!(result.await);
    assert_eq!(err.error, LogError::ShuttingDown);
    assert_eq!(transport.calls(), 1);

    // A second shutdown finds nothing left to send.
    assert_ok!(logger.shutdown().await);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_shutdown_reports_final_flush_failure() {
    let transport = Arc::new(RecordingTransport::unreachable());
    let logger = AsyncBulkLogger::with_transport(transport, 1024, 0).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    let err = assert_err!(logger.shutdown().await);

    assert!(matches!(err.error, LogError::Transport(_)));
    assert_eq!(err.failed_messages, vec![john_message(1).to_line().unwrap()]);
}

#[tokio::test]
async fn test_periodic_flush_empties_buffer() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 100).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    assert_eq!(logger.pending_len(), 1);

    assert!(wait_until(|| logger.pending_len() == 0).await);
    assert!(wait_until(|| transport.calls() == 1).await);
    assert_eq!(
        transport.bulk_lines(),
        vec![String::from_utf8(john_message(1).to_line().unwrap().to_vec()).unwrap()]
    );

    assert_ok!(logger.shutdown().await);
}

#[tokio::test]
async fn test_disabled_ticker_never_flushes() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 0).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(logger.pending_len(), 1);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_periodic_flush_failure_drops_lines() {
    let transport = Arc::new(RecordingTransport::status(503, "busy"));
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 50).unwrap();

    assert_ok!(logger.log(&john_message(1)).await);
    assert!(wait_until(|| transport.calls() >= 1).await);
    assert!(wait_until(|| logger.pending_len() == 0).await);

    // Nothing is left for the final flush.
    assert_ok!(logger.shutdown().await);
}

#[tokio::test]
async fn test_log_after_shutdown_call_is_refused() {
    let transport = Arc::new(RecordingTransport::ok());
    let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 0).unwrap();

    let shutdown = logger.shutdown();
    assert!(!logger.is_active());

    let late = logger.log(&john_message(1));
    assert_eq!(late.foreground_error(), Some(&LogError::ShuttingDown));

    assert_ok!(shutdown.await);
    assert_err!(late.await);
    assert_eq!(logger.pending_len(), 0);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admitted_log_lands_in_final_flush() {
    for _ in 0..200 {
        let transport = Arc::new(RecordingTransport::ok());
        let logger = AsyncBulkLogger::with_transport(transport.clone(), 1024, 0).unwrap();

        let logged = logger.log(&john_message(1));
        let shutdown = logger.shutdown();

        assert_ok!(logged.await);
        assert_ok!(shutdown.await);
        assert_eq!(logger.pending_len(), 0);
        assert_eq!(transport.bulk_lines().len(), 1);
    }
}
