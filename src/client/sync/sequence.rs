//! Per-record request sequencing.
//!
//! Every flag mutation takes a number from a single monotonic counter and
//! records it as the latest for its `(flag, image id)` key. When the response
//! comes back, only the holder of the latest number may act on it; older
//! responses are stale and dropped, so the final state follows the most
//! recently issued intent rather than whichever response lands last.
//!
//! Alongside the latest number each key keeps the last membership the backend
//! is known to hold. It is captured from the local mirror when the first
//! request for the key is issued, and moved forward by every accepted
//! response, stale or not. A failed latest request rolls back to it, never to
//! a value observed while an earlier optimistic change was still unconfirmed.

use crate::client::state::Flag;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// What a settled response may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Still the latest request for its key. `confirmed` is the membership
    /// the backend holds after this response.
    Latest { confirmed: bool },
    /// A newer request was issued since
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    latest: u64,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct Inner {
    next: u64,
    pending: HashMap<(Flag, String), Pending>,
}

#[derive(Debug, Default)]
pub struct SequenceTracker {
    inner: Mutex<Inner>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next number for `(flag, id)`, superseding any in flight.
    ///
    /// `present` is the local membership before the optimistic change. It
    /// becomes the confirmed baseline only when nothing is in flight for the
    /// key.
    pub async fn issue(&self, flag: Flag, id: &str, present: bool) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.next += 1;
        let seq = inner.next;
        inner
            .pending
            .entry((flag, id.to_string()))
            .and_modify(|pending| pending.latest = seq)
            .or_insert(Pending {
                latest: seq,
                confirmed: present,
            });
        seq
    }

    /// Settle the response for `seq`.
    ///
    /// `accepted` is the membership the backend now holds if it accepted the
    /// request, `None` if it failed. The latest request forgets its key.
    pub async fn settle(&self, flag: Flag, id: &str, seq: u64, accepted: Option<bool>) -> Settlement {
        let mut inner = self.inner.lock().await;
        let key = (flag, id.to_string());
        let Some(pending) = inner.pending.get_mut(&key) else {
            return Settlement::Stale;
        };

        if pending.latest == seq {
            let confirmed = accepted.unwrap_or(pending.confirmed);
            inner.pending.remove(&key);
            return Settlement::Latest { confirmed };
        }

        if let Some(value) = accepted {
            pending.confirmed = value;
        }
        Settlement::Stale
    }

    /// Number of keys with a request in flight
    pub async fn in_flight(&self) -> usize {
        self.inner.lock().await.pending.len()
    }
}
