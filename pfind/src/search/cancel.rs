use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

/// Why a search was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every worker went idle at once; nothing is left to scan.
    Completed,
    /// An operator interrupt (Ctrl-C) or an embedding caller asked to stop.
    Interrupted,
    /// The pool could not be started, or its matches could no longer be
    /// written, and is being torn down.
    Aborted,
}

impl StopReason {
    fn to_raw(self) -> u8 {
        match self {
            StopReason::Completed => 1,
            StopReason::Interrupted => 2,
            StopReason::Aborted => 3,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(StopReason::Completed),
            2 => Some(StopReason::Interrupted),
            3 => Some(StopReason::Aborted),
            _ => None,
        }
    }
}

/// Something blocked on a condition that must be woken when a stop is
/// requested. Implementations take their lock before notifying so that a
/// worker between its stop check and its wait cannot miss the signal.
pub(crate) trait Waker: Send + Sync {
    fn wake_all(&self);
}

struct Inner {
    reason: AtomicU8,
    wakers: Mutex<Vec<Weak<dyn Waker>>>,
}

/// Cooperative stop request shared by the pool and whoever drives it.
///
/// Cloning is cheap; all clones observe the same request. Only the first
/// request sticks, so an interrupt that arrives after the pool already
/// finished does not turn a completed search into an interrupted one.
///
/// Workers look at the flag at their checkpoints (top of the loop, after
/// every wake, before each directory entry). A worker that is writing a
/// match holds the shared lock and does not look at the flag until the
/// write is done.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<Inner>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                reason: AtomicU8::new(0),
                wakers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Asks every worker to stop. Returns `false` if a stop was already
    /// requested for any reason.
    pub fn interrupt(&self) -> bool {
        self.request(StopReason::Interrupted)
    }

    pub(crate) fn complete(&self) -> bool {
        self.request(StopReason::Completed)
    }

    pub(crate) fn abort(&self) -> bool {
        self.request(StopReason::Aborted)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.load(Ordering::Acquire) != 0
    }

    pub fn reason(&self) -> Option<StopReason> {
        StopReason::from_raw(self.inner.reason.load(Ordering::Acquire))
    }

    pub(crate) fn register(&self, waker: Weak<dyn Waker>) {
        let mut wakers = self
            .inner
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        wakers.retain(|w| w.strong_count() > 0);
        wakers.push(waker);
    }

    /// Removes `waker`. Once this returns, no stop request is still holding
    /// an upgraded reference to it.
    pub(crate) fn unregister(&self, waker: &Weak<dyn Waker>) {
        self.inner
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|w| !Weak::ptr_eq(w, waker));
    }

    fn request(&self, reason: StopReason) -> bool {
        let won = self
            .inner
            .reason
            .compare_exchange(0, reason.to_raw(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !won {
            return false;
        }

        debug!(?reason, "Stop requested");
        // Registry lock is held while waking so that unregister can wait us out.
        let wakers = self
            .inner
            .wakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for waker in wakers.iter().filter_map(Weak::upgrade) {
            waker.wake_all();
        }
        true
    }
}
