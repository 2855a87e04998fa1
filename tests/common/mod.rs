#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rask_log_client::{Message, Transport, TransportError, TransportResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    Status(u16),
    Unreachable,
}

/// In-memory transport recording every payload it is handed.
///
/// Replies with a fixed status (or a connection error), optionally after a
/// delay or once a gate permit is released, and tracks how many sends were
/// in flight at once.
pub struct RecordingTransport {
    reply: Reply,
    body: String,
    delay: Option<Duration>,
    gate: Option<Semaphore>,
    single: Mutex<Vec<Bytes>>,
    bulk: Mutex<Vec<Bytes>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransport {
    fn with_reply(reply: Reply, body: &str) -> Self {
        Self {
            reply,
            body: body.to_string(),
            delay: None,
            gate: None,
            single: Mutex::new(Vec::new()),
            bulk: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Always answers 200 "OK".
    pub fn ok() -> Self {
        Self::with_reply(Reply::Status(200), "OK")
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::with_reply(Reply::Status(status), body)
    }

    /// Every send fails before a response is received.
    pub fn unreachable() -> Self {
        Self::with_reply(Reply::Unreachable, "")
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every send waits for a permit from [`release`](Self::release).
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self, sends: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(sends);
        }
    }

    pub fn single_payloads(&self) -> Vec<Bytes> {
        self.single.lock().clone()
    }

    pub fn bulk_payloads(&self) -> Vec<Bytes> {
        self.bulk.lock().clone()
    }

    /// Every line of every bulk payload, in send order.
    pub fn bulk_lines(&self) -> Vec<String> {
        self.bulk
            .lock()
            .iter()
            .flat_map(|payload| {
                String::from_utf8_lossy(payload)
                    .split('\n')
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.single.lock().len() + self.bulk.lock().len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<TransportResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.reply {
            Reply::Status(status) => Ok(TransportResponse::new(status, self.body.clone())),
            Reply::Unreachable => Err(TransportError::Unavailable(
                "connection refused".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, payload: Bytes) -> Result<TransportResponse, TransportError> {
        self.single.lock().push(payload);
        self.respond().await
    }

    async fn send_bulk(&self, payload: Bytes) -> Result<TransportResponse, TransportError> {
        self.bulk.lock().push(payload);
        self.respond().await
    }
}

/// `{"From":"john","Message":"msg1","timestamp":"2018-01-05T17:11:25.494Z"}`,
/// 71 bytes once serialized.
pub fn john_message(n: usize) -> Message {
    Message::new()
        .with("From", "john")
        .with("Message", format!("msg{n}"))
        .with("timestamp", "2018-01-05T17:11:25.494Z")
}

pub const JOHN_LINE_LEN: usize = 71;

/// Polls `condition` every few milliseconds for up to two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
