//! Stream relay: one session per client connection, bound to one upstream
//! body.
//!
//! ```text
//! Open --upstream end-----> UpstreamEnded   --+
//!      --upstream error---> UpstreamErrored --+--> Closed
//!      --client gone------> ClientClosed    --+
//! ```
//!
//! On `Closed` the upstream body is dropped (closing its connection) and the
//! client channel sender is dropped (finishing the client response).

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use relaygate_protocol::SseReframer;
use relaygate_provider_core::{
    ByteStream, ChunkLog, Headers, RelayMode, UpstreamFailure, header_get,
};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::redact::truncate_for_log;

const CLIENT_CHANNEL_CAPACITY: usize = 16;
const LOG_CHUNK_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Open,
    UpstreamEnded,
    UpstreamErrored,
    ClientClosed,
    Closed,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayState::Open => "open",
            RelayState::UpstreamEnded => "upstream_ended",
            RelayState::UpstreamErrored => "upstream_errored",
            RelayState::ClientClosed => "client_closed",
            RelayState::Closed => "closed",
        }
    }
}

/// Response handed to the HTTP layer.
#[derive(Debug)]
pub struct DownstreamResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: DownstreamBody,
    pub request_id: String,
}

impl DownstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        header_get(&self.headers, "content-type")
    }
}

#[derive(Debug)]
pub enum DownstreamBody {
    Bytes(Bytes),
    Stream(ClientStream),
}

/// Client side of a relay session.
///
/// Dropping it (the HTTP layer does so when the client disconnects) cancels
/// the session, which tears the upstream connection down.
#[derive(Debug)]
pub struct ClientStream {
    rx: mpsc::Receiver<Bytes>,
    _cancel_on_drop: DropGuard,
}

impl Stream for ClientStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|chunk| chunk.map(Ok))
    }
}

/// Producer side of a relay session.
#[derive(Debug)]
pub struct RelaySink {
    tx: mpsc::Sender<Bytes>,
    token: CancellationToken,
}

impl RelaySink {
    /// Sends one piece, giving up as soon as the client is gone.
    async fn send(&self, piece: Bytes) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            sent = self.tx.send(piece) => sent.is_ok(),
        }
    }
}

pub fn client_channel() -> (RelaySink, ClientStream) {
    let (tx, rx) = mpsc::channel(CLIENT_CHANNEL_CAPACITY);
    let token = CancellationToken::new();
    let stream = ClientStream {
        rx,
        _cancel_on_drop: token.clone().drop_guard(),
    };
    (RelaySink { tx, token }, stream)
}

#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub trace_id: String,
    pub provider: String,
    pub mode: RelayMode,
    pub chunk_log: ChunkLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySummary {
    /// The transition that left `Open`.
    pub trigger: RelayState,
    pub bytes_forwarded: u64,
}

/// Drives one session from `Open` to `Closed`.
///
/// Bytes (or reframed frames) are forwarded in upstream order. A partial
/// frame still buffered when the upstream errors is discarded.
pub async fn run_session(upstream: ByteStream, sink: RelaySink, opts: &RelayOptions) -> RelaySummary {
    let started = Instant::now();
    let mut upstream = upstream;
    let mut reframer = match opts.mode {
        RelayMode::Reframe(patch) => Some(SseReframer::new(patch)),
        RelayMode::Passthrough | RelayMode::BufferedJson => None,
    };
    let mut state = RelayState::Open;
    let mut bytes_forwarded = 0u64;
    let mut logged = 0usize;

    while state == RelayState::Open {
        let next = tokio::select! {
            biased;
            _ = sink.token.cancelled() => {
                state = RelayState::ClientClosed;
                continue;
            }
            next = upstream.next() => next,
        };

        let pieces = match next {
            Some(Ok(chunk)) => match reframer.as_mut() {
                Some(reframer) => reframer.push_bytes(&chunk),
                None => vec![chunk],
            },
            Some(Err(err)) => {
                warn!(
                    event = "upstream_stream_error",
                    trace_id = %opts.trace_id,
                    provider = %opts.provider,
                    kind = err.kind.as_str(),
                    error = %err.message
                );
                state = RelayState::UpstreamErrored;
                continue;
            }
            None => {
                state = RelayState::UpstreamEnded;
                reframer
                    .as_mut()
                    .and_then(SseReframer::finish)
                    .into_iter()
                    .collect()
            }
        };

        for piece in pieces {
            if opts.chunk_log.wants(logged) {
                logged += 1;
                debug!(
                    event = "upstream_chunk",
                    trace_id = %opts.trace_id,
                    provider = %opts.provider,
                    chunk = %truncate_for_log(&String::from_utf8_lossy(&piece), LOG_CHUNK_CHARS)
                );
            }
            let len = piece.len() as u64;
            if !sink.send(piece).await {
                state = RelayState::ClientClosed;
                break;
            }
            bytes_forwarded += len;
        }
    }

    let trigger = state;
    drop(upstream);
    drop(sink);

    info!(
        event = "relay_closed",
        trace_id = %opts.trace_id,
        provider = %opts.provider,
        trigger = trigger.as_str(),
        bytes_forwarded,
        elapsed_ms = started.elapsed().as_millis() as u64
    );

    RelaySummary {
        trigger,
        bytes_forwarded,
    }
}

/// Reads a whole body; on a read failure returns what arrived so far plus
/// the failure.
pub async fn collect_body(mut body: ByteStream) -> (Bytes, Option<UpstreamFailure>) {
    let mut buf = BytesMut::new();
    while let Some(item) = body.next().await {
        match item {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(err) => return (buf.freeze(), Some(err)),
        }
    }
    (buf.freeze(), None)
}
