//! In-memory stand-ins for the resolver, the byte source and the chat relay.
//!
//! Each one records what the pipeline asked of it so tests can assert on
//! call counts and bytes read without touching the network.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use teracore::download::error::{DeliveryError, ResolveError, TransferError};
use teracore::download::source::{ProbeInfo, SourceBody};
use teracore::download::transfer::{PayloadContent, TransferPayload};
use teracore::download::{ByteSource, ResolvedLocation};
use teracore::{ConsumerId, RelaySink, Resolver};
use url::Url;

/// Resolves `…/s/<id>` to `https://cdn.test/<id>.mp4`, failing or never
/// answering for scripted references.
#[derive(Default)]
pub struct ScriptedResolver {
    failing: HashSet<String>,
    hanging: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, reference: &str) -> Self {
        self.failing.insert(reference.to_string());
        self
    }

    pub fn hanging_on(mut self, reference: &str) -> Self {
        self.hanging.insert(reference.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn resolve(&self, reference: &str) -> Result<ResolvedLocation, ResolveError> {
        self.calls.lock().unwrap().push(reference.to_string());
        if self.failing.contains(reference) {
            return Err(ResolveError::MissingElement);
        }
        if self.hanging.contains(reference) {
            std::future::pending::<()>().await;
        }
        let id = reference.rsplit('/').next().unwrap_or("video");
        let url = Url::parse(&format!("https://cdn.test/{}.mp4", id)).unwrap();
        Ok(ResolvedLocation::new(url))
    }
}

/// Serves the same body for every URL, in `chunk`-sized pieces.
pub struct MemorySource {
    body: Bytes,
    chunk: usize,
    /// Length announced by HEAD and GET; `None` hides it
    pub declared: Option<u64>,
    /// Never finish the body after the last chunk
    pub stall: bool,
    pub probes: AtomicUsize,
    pub opens: AtomicUsize,
    pub bytes_read: Arc<AtomicU64>,
}

impl MemorySource {
    pub fn new(body: Vec<u8>) -> Self {
        let len = body.len() as u64;
        Self {
            body: Bytes::from(body),
            chunk: 16,
            declared: Some(len),
            stall: false,
            probes: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            bytes_read: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn of_len(len: usize) -> Self {
        Self::new((0..len).map(|i| (i % 251) as u8).collect())
    }

    pub fn hide_length(mut self) -> Self {
        self.declared = None;
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn probe(&self, _url: &Url) -> Result<ProbeInfo, TransferError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(ProbeInfo {
            content_length: self.declared,
        })
    }

    async fn open(&self, url: &Url) -> Result<SourceBody, TransferError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let counter = Arc::clone(&self.bytes_read);
        let pieces = self
            .body
            .chunks(self.chunk)
            .map(|piece| Bytes::copy_from_slice(piece))
            .collect::<Vec<_>>();
        let body = stream::iter(pieces).map(move |piece| {
            counter.fetch_add(piece.len() as u64, Ordering::SeqCst);
            Ok::<_, std::io::Error>(piece)
        });
        let stream = if self.stall {
            body.chain(stream::pending()).boxed()
        } else {
            body.boxed()
        };

        Ok(SourceBody {
            stream,
            content_length: self.declared,
            file_name: url.path_segments().and_then(|mut s| s.next_back()).map(str::to_string),
        })
    }
}

/// One recorded upload.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub consumer: ConsumerId,
    pub reference: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Transient path the upload read from (file sink only)
    pub path: Option<PathBuf>,
}

/// Records notices and uploads instead of talking to a chat.
#[derive(Default)]
pub struct RecordingRelay {
    pub fail_delivery: bool,
    notices: Mutex<Vec<(ConsumerId, String)>>,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_delivery: true,
            ..Self::default()
        }
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
    }

    /// Failure notices (the ones starting with ❌).
    pub fn failures(&self) -> Vec<String> {
        self.notices().into_iter().filter(|text| text.starts_with("❌")).collect()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelaySink for RecordingRelay {
    async fn deliver(
        &self,
        consumer: ConsumerId,
        payload: &TransferPayload,
        reference: &str,
    ) -> Result<(), DeliveryError> {
        let (bytes, path) = match &payload.content {
            PayloadContent::Memory(bytes) => (bytes.to_vec(), None),
            PayloadContent::File(file) => (
                std::fs::read(file.path()).map_err(|e| DeliveryError::Upload(e.to_string()))?,
                Some(file.path().to_path_buf()),
            ),
        };

        self.deliveries.lock().unwrap().push(Delivery {
            consumer,
            reference: reference.to_string(),
            file_name: payload.file_name.clone(),
            bytes,
            path,
        });

        if self.fail_delivery {
            return Err(DeliveryError::Upload("Request Entity Too Large".to_string()));
        }
        Ok(())
    }

    async fn notify(&self, consumer: ConsumerId, text: &str) -> Result<(), DeliveryError> {
        self.notices.lock().unwrap().push((consumer, text.to_string()));
        Ok(())
    }
}
