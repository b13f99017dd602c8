//! Asynchronous file-to-data-URL decoding.
//!
//! # Responsibility
//! - Turn dropped/pasted image blobs into `data:` URLs off the event thread.
//! - Deliver each result back as a [`DecodeCompletion`] over a channel.
//!
//! # Invariants
//! - A started decode always runs to completion; there is no cancellation.
//! - Completions carry the original drop/paste target and the caller's epoch;
//!   validating both against the current document is the receiver's job.
//! - Every spawned decode reports exactly one completion, even when the
//!   decoder panics.

use crate::dispatch::FileBlob;
use crate::model::selection::Selection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

const DECODE_WORKER_THREADS: usize = 2;

pub type DecodeFuture = Pin<Box<dyn Future<Output = Result<String, DecodeError>> + Send>>;

/// Decode failure for one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Blob has no bytes.
    EmptyFile { name: String },
    /// Decoder task died before reporting.
    Aborted(String),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFile { name } => write!(f, "file `{name}` is empty"),
            Self::Aborted(message) => write!(f, "decode task aborted: {message}"),
        }
    }
}

impl Error for DecodeError {}

/// Async `blob -> data URL` conversion.
pub trait FileDecoder: Send + Sync {
    fn decode(&self, blob: FileBlob) -> DecodeFuture;
}

/// Standard base64 `data:` URL encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlDecoder;

impl FileDecoder for DataUrlDecoder {
    fn decode(&self, blob: FileBlob) -> DecodeFuture {
        Box::pin(async move {
            if blob.bytes.is_empty() {
                return Err(DecodeError::EmptyFile { name: blob.name });
            }
            let bytes = blob.bytes;
            let encoded = tokio::task::spawn_blocking(move || base64_encode(&bytes))
                .await
                .map_err(|err| DecodeError::Aborted(err.to_string()))?;
            Ok(format!("data:{};base64,{encoded}", blob.mime))
        })
    }
}

/// Result of one decode, tagged with the target it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeCompletion {
    pub file_name: String,
    pub target: Selection,
    /// Caller epoch the decode was started in.
    pub epoch: u64,
    pub result: Result<String, DecodeError>,
}

/// Owns the tokio runtime that runs decodes and the completion channel.
pub struct DecodeRuntime {
    runtime: tokio::runtime::Runtime,
    decoder: Arc<dyn FileDecoder>,
    tx: Sender<DecodeCompletion>,
    rx: Receiver<DecodeCompletion>,
    in_flight: usize,
}

impl DecodeRuntime {
    pub fn new(decoder: Arc<dyn FileDecoder>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(DECODE_WORKER_THREADS)
            .thread_name("richnote-decode")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime,
            decoder,
            tx,
            rx,
            in_flight: 0,
        })
    }

    /// Runtime with [`DataUrlDecoder`].
    pub fn data_url() -> io::Result<Self> {
        Self::new(Arc::new(DataUrlDecoder))
    }

    /// Starts decoding `blob`; its completion arrives via [`Self::try_next`].
    pub fn spawn(&mut self, blob: FileBlob, target: Selection, epoch: u64) {
        let tx = self.tx.clone();
        let decoder = Arc::clone(&self.decoder);
        let file_name = blob.name.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let result = match tokio::spawn(decoder.decode(blob)).await {
                Ok(result) => result,
                Err(err) => Err(DecodeError::Aborted(err.to_string())),
            };
            let _ = tx.send(DecodeCompletion {
                file_name,
                target,
                epoch,
                result,
            });
        });
    }

    /// Decodes started but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Next finished decode, without blocking.
    pub fn try_next(&mut self) -> Option<DecodeCompletion> {
        let completion = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Next finished decode, waiting up to `timeout`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<DecodeCompletion> {
        if self.in_flight == 0 {
            return None;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl std::fmt::Debug for DecodeRuntime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeRuntime")
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    const TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        out.push(TABLE[(b0 >> 2) as usize] as char);
        out.push(TABLE[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        if chunk.len() > 1 {
            out.push(TABLE[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(TABLE[(b2 & 0x3f) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}
