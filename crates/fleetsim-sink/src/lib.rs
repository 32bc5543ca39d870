//! ---
//! fsim_section: "02-delivery"
//! fsim_subsection: "module"
//! fsim_type: "source"
//! fsim_scope: "code"
//! fsim_description: "Record sink trait and in-process implementations."
//! fsim_version: "v0.1.0"
//! fsim_owner: "tbd"
//! ---
//! Delivery-channel abstraction for FleetSim.
//!
//! The engine only needs a `publish(topic, key, payload)` plus a `flush()`
//! barrier; the real message-bus client (transport, retry, compression) lives
//! outside this workspace. The implementations here cover tests and demo
//! wiring: an in-memory buffer and a newline-delimited JSON writer.

#![warn(missing_docs)]

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors surfaced at the delivery boundary. Everything upstream of the sink
/// is infallible for valid inputs.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Wrapper for IO errors encountered while writing records.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The sink rejected a single record; the caller logs and continues.
    #[error("publish rejected: {0}")]
    Rejected(String),
}

/// Sink abstraction every delivery discipline drives.
///
/// Implementations must be safe to call from multiple fan-out producers;
/// `flush` forms a synchronization barrier over everything published before it.
pub trait RecordSink: Send + Sync {
    /// Publish one keyed record onto a topic.
    fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()>;
    /// Barrier: drain any producer-side buffering.
    fn flush(&self) -> Result<()>;
    /// Human-readable sink name for logging.
    fn name(&self) -> &'static str;
}

/// One record captured by [`InMemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    /// Topic the record was published to.
    pub topic: String,
    /// Partition key (the asset identifier).
    pub key: String,
    /// Serialized record payload.
    pub payload: Vec<u8>,
}

/// In-memory sink backed by a mutex protected queue, for tests and
/// single-process integration.
#[derive(Clone, Default)]
pub struct InMemorySink {
    queue: Arc<Mutex<VecDeque<PublishedRecord>>>,
    flushes: Arc<AtomicUsize>,
}

impl InMemorySink {
    /// Create a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record published so far, in publish order.
    pub fn published(&self) -> Vec<PublishedRecord> {
        let guard = self.queue.lock().expect("queue poisoned");
        guard.iter().cloned().collect()
    }

    /// Number of records published so far.
    pub fn len(&self) -> usize {
        self.queue.lock().expect("queue poisoned").len()
    }

    /// True when nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of flush barriers issued so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl RecordSink for InMemorySink {
    fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.push_back(PublishedRecord {
            topic: topic.to_owned(),
            key: key.to_owned(),
            payload: payload.to_vec(),
        });
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

/// Newline-delimited JSON sink over any writer. Used as the demo channel when
/// no real bus client is wired in (stdout playback).
pub struct NdjsonSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> NdjsonSink<W> {
    /// Wrap a writer. Each published payload becomes one output line.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().expect("writer poisoned")
    }
}

impl<W: Write + Send> RecordSink for NdjsonSink<W> {
    fn publish(&self, _topic: &str, _key: &str, payload: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock().expect("writer poisoned");
        guard.write_all(payload)?;
        guard.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().expect("writer poisoned").flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ndjson"
    }
}
