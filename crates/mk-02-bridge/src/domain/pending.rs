//! Pending Request Store.
//!
//! Maps request ids to callers waiting for a host response.
//!
//! Flow:
//! 1. The engine picks a `RequestId` and calls `register()` for a oneshot receiver
//! 2. The envelope goes out over the native channel
//! 3. The response listener calls `complete()` when the host answers
//! 4. The engine awaits the receiver or times out and calls `expire()`
//!
//! Removal from the map is the settlement point: whichever of `complete`,
//! `expire` or `cancel` removes the entry first wins, and every later call for
//! that id is a no-op.

use super::errors::BridgeError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use shared_types::{Command, RequestId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::debug;

/// Outcome delivered to a waiting caller.
pub type Settlement = Result<Value, BridgeError>;

/// A pending request waiting for response
struct PendingRequest {
    /// Channel to send response
    sender: oneshot::Sender<Settlement>,
    /// When request was created
    created_at: Instant,
    /// Command kind (for logging)
    command: Command,
}

/// Statistics for pending request store
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests settled by a host response
    pub total_completed: AtomicU64,
    /// Total requests timed out
    pub total_timeouts: AtomicU64,
    /// Total requests cancelled (send failure or dropped caller)
    pub total_cancelled: AtomicU64,
    /// Responses for ids that were unknown or already settled
    pub total_dropped: AtomicU64,
}

/// Pending request table owned by one bridge instance.
#[derive(Default)]
pub struct PendingRequestStore {
    pending: DashMap<RequestId, PendingRequest>,
    stats: PendingStats,
}

impl PendingRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending request and get a receiver for the response.
    ///
    /// An id that is already pending is a caller bug and fails with
    /// `MalformedRequest`; the existing entry is left untouched.
    pub fn register(
        &self,
        request_id: RequestId,
        command: Command,
    ) -> Result<oneshot::Receiver<Settlement>, BridgeError> {
        let (tx, rx) = oneshot::channel();

        match self.pending.entry(request_id) {
            Entry::Occupied(entry) => {
                return Err(BridgeError::MalformedRequest(format!(
                    "requestId '{}' is already pending",
                    entry.key()
                )));
            }
            Entry::Vacant(entry) => {
                debug!(
                    request_id = %entry.key(),
                    command = %command,
                    "Registered pending request"
                );
                entry.insert(PendingRequest {
                    sender: tx,
                    created_at: Instant::now(),
                    command,
                });
            }
        }

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        Ok(rx)
    }

    /// Settle a pending request with the host's answer.
    ///
    /// Returns true if the request was found and its caller received the
    /// result, false if it was unknown, already settled, or the caller is gone.
    pub fn complete(&self, request_id: &RequestId, result: Settlement) -> bool {
        let Some((_, pending)) = self.pending.remove(request_id) else {
            self.stats.total_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(
                request_id = %request_id,
                "Response for unknown or already settled request dropped"
            );
            return false;
        };

        let response_time = pending.created_at.elapsed();
        let is_ok = result.is_ok();
        match pending.sender.send(result) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    command = %pending.command,
                    success = is_ok,
                    response_time_ms = response_time.as_millis() as u64,
                    "Completed pending request"
                );
                true
            }
            Err(_) => {
                // Receiver was dropped (caller went away)
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    request_id = %request_id,
                    command = %pending.command,
                    "Pending request receiver dropped"
                );
                false
            }
        }
    }

    /// Remove a request whose budget elapsed.
    pub fn expire(&self, request_id: &RequestId) -> bool {
        if self.pending.remove(request_id).is_some() {
            self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Cancel a pending request
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        if self.pending.remove(request_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Get number of currently pending requests
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if a request id is pending
    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}
