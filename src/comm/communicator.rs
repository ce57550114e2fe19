//! Thin façade over message passing between sub-domain owners.
//!
//! Messages are contiguous byte slices. Handles are waitable; the halo
//! exchange and the cross-domain reduction call `.wait()` before they trust
//! a buffer.
//!
//! Real inter-process transport is supplied by the embedding application
//! through [`Communicator`]; this module ships a serial no-op backend and an
//! in-process mailbox backend for threaded runs and tests.

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

/// Message tag; distinct concurrent exchanges must use distinct tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommTag(u16);

impl CommTag {
    #[inline]
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag `delta` steps further, wrapping.
    #[inline]
    pub const fn offset(self, delta: u16) -> Self {
        Self(self.0.wrapping_add(delta))
    }
}

/// Non-blocking point-to-point transport.
pub trait Communicator: Send + Sync + 'static {
    type SendHandle: Wait;
    type RecvHandle: Wait;

    /// Post `buf` to `peer`; the data is copied before this returns.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of `buf.len()` bytes from `peer`. Backends deliver
    /// the message as sent; a size mismatch is left to the decoder.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Block until completion; receives yield their payload, `None` if
    /// nothing arrived.
    fn wait(self) -> Option<Vec<u8>>;
}

/// Serial backend: sends vanish, receives yield nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}
}

// (src, dst, tag)
type Key = (usize, usize, u16);

/// Process-wide message store shared by every [`LocalComm`].
struct Mailbox {
    slots: DashMap<Key, Bytes>,
    posted: Mutex<u64>,
    arrival: Condvar,
}

impl Mailbox {
    fn post(&self, key: Key, payload: Bytes) {
        self.slots.insert(key, payload);
        *self.posted.lock() += 1;
        self.arrival.notify_all();
    }

    fn take(&self, key: &Key, timeout: Duration) -> Option<Bytes> {
        let deadline = Instant::now() + timeout;
        let mut posted = self.posted.lock();
        loop {
            // checked under the lock so a concurrent post cannot be missed
            if let Some((_, payload)) = self.slots.remove(key) {
                return Some(payload);
            }
            if self.arrival.wait_until(&mut posted, deadline).timed_out() {
                return self.slots.remove(key).map(|(_, payload)| payload);
            }
        }
    }
}

static MAILBOX: Lazy<Mailbox> = Lazy::new(|| Mailbox {
    slots: DashMap::new(),
    posted: Mutex::new(0),
    arrival: Condvar::new(),
});

/// Pending receive on the in-process mailbox.
///
/// Completes with the whole message as sent, even when it differs from the
/// posted receive size; callers decode with an exact-length check.
#[derive(Debug)]
pub struct LocalRecv {
    key: Key,
    timeout: Duration,
}

impl Wait for LocalRecv {
    fn wait(self) -> Option<Vec<u8>> {
        MAILBOX.take(&self.key, self.timeout).map(|payload| payload.to_vec())
    }
}

/// One rank of an in-process world; ranks talk through a shared mailbox.
///
/// A receive that sees no matching send within the timeout completes with
/// `None`, which the exchange layers report as a communication error.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    timeout: Duration,
}

impl LocalComm {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalRecv;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        MAILBOX.post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> LocalRecv {
        LocalRecv {
            key: (peer, self.rank, tag),
            timeout: self.timeout,
        }
    }
}
