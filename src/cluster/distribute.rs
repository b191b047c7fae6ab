//! Handing dataset indices to workers.
//!
//! Every point must be seeked exactly once. Three interchangeable disciplines
//! implement [`WorkSource`]:
//!
//! | Strategy | Coordination | Load balance |
//! |----------|--------------|--------------|
//! | [`StaticShards`] | None after setup | Skewed if seek cost varies |
//! | [`SharedCursor`] | One atomic counter | Dynamic |
//! | [`BoundedQueue`] | Producer thread + bounded channel | Dynamic |
//!
//! Workers only see `claim(worker) -> Option<usize>`; the mode seeker and the
//! aggregator never learn which strategy is running.
//!
//! # Cancellation
//!
//! All sources consult a [`CancelToken`]. Once it is tripped, `claim` returns
//! `None` for everyone. Work already claimed finishes normally.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread::Scope;

/// Source of dataset indices shared by all workers.
pub trait WorkSource: Sync {
    /// Claim the next index for `worker`, or `None` when exhausted or cancelled.
    fn claim(&self, worker: usize) -> Option<usize>;
}

/// Lazy per-worker sequence of claimed indices.
pub struct Claims<'a, S: WorkSource + ?Sized> {
    source: &'a S,
    worker: usize,
}

impl<'a, S: WorkSource + ?Sized> Claims<'a, S> {
    /// Iterate the claims of `worker` against `source`.
    pub fn new(source: &'a S, worker: usize) -> Self {
        Self { source, worker }
    }
}

impl<S: WorkSource + ?Sized> Iterator for Claims<'_, S> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.source.claim(self.worker)
    }
}

/// Shared stop flag honoured by every [`WorkSource`].
///
/// Clones share one flag. A [`child`](Self::child) token has its own flag and
/// also reports cancelled once its parent is; cancelling the child leaves the
/// parent untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    /// Fresh, untripped token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh token that is also cancelled whenever `self` is.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Stop handing out work.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether this token or any ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

/// Which discipline to use for handing out indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distribution {
    /// Contiguous ranges fixed up front.
    StaticShard,
    /// One atomic "next index" counter.
    #[default]
    SharedCursor,
    /// Producer thread feeding a bounded channel.
    BoundedQueue {
        /// Channel capacity (at least 1).
        capacity: usize,
    },
}

/// Advance `cursor` by one if it is still below `end`, returning the old value.
#[inline]
fn bump(cursor: &AtomicUsize, end: usize) -> Option<usize> {
    cursor
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| {
            (i < end).then_some(i + 1)
        })
        .ok()
}

/// Contiguous per-worker ranges.
///
/// Worker `w` of `W` owns `[w·N/W, (w+1)·N/W)`. Range sizes differ by at most one.
#[derive(Debug)]
pub struct StaticShards {
    shards: Vec<(AtomicUsize, usize)>,
    cancel: CancelToken,
}

impl StaticShards {
    /// Split `0..n` across `workers` ranges.
    pub fn new(n: usize, workers: usize, cancel: CancelToken) -> Self {
        let workers = workers.max(1);
        let shards = (0..workers)
            .map(|w| (AtomicUsize::new(w * n / workers), (w + 1) * n / workers))
            .collect();
        Self { shards, cancel }
    }

    /// Half-open index range owned by `worker`.
    pub fn range(&self, worker: usize) -> Option<std::ops::Range<usize>> {
        let workers = self.shards.len();
        let (_, end) = self.shards.get(worker)?;
        let n = self.shards.last().map_or(0, |(_, e)| *e);
        Some(worker * n / workers..*end)
    }
}

impl WorkSource for StaticShards {
    fn claim(&self, worker: usize) -> Option<usize> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let (cursor, end) = self.shards.get(worker)?;
        bump(cursor, *end)
    }
}

/// Single shared "next index" counter.
#[derive(Debug)]
pub struct SharedCursor {
    next: AtomicUsize,
    len: usize,
    cancel: CancelToken,
}

impl SharedCursor {
    /// Cursor over `0..n`.
    pub fn new(n: usize, cancel: CancelToken) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len: n,
            cancel,
        }
    }
}

impl WorkSource for SharedCursor {
    fn claim(&self, _worker: usize) -> Option<usize> {
        if self.cancel.is_cancelled() {
            return None;
        }
        bump(&self.next, self.len)
    }
}

/// Producer/consumer channel of indices.
///
/// A producer thread enqueues `0..n` into a bounded channel, blocking while it
/// is full. Workers take turns receiving; the channel closes when the producer
/// finishes or observes cancellation. Dropping the queue disconnects the
/// receiver, which also releases a producer blocked on a full channel.
pub struct BoundedQueue {
    rx: Mutex<Receiver<usize>>,
    cancel: CancelToken,
}

impl BoundedQueue {
    /// Start the producer on `scope` and return the consumer side.
    pub fn spawn<'scope>(
        scope: &'scope Scope<'scope, '_>,
        n: usize,
        capacity: usize,
        cancel: CancelToken,
    ) -> Self {
        let (tx, rx) = sync_channel(capacity);
        let token = cancel.clone();
        let _producer = scope.spawn(move || {
            for i in 0..n {
                if token.is_cancelled() || tx.send(i).is_err() {
                    break;
                }
            }
        });
        Self {
            rx: Mutex::new(rx),
            cancel,
        }
    }
}

impl WorkSource for BoundedQueue {
    fn claim(&self, _worker: usize) -> Option<usize> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.rx.lock().recv().ok()
    }
}

/// Build the source for `strategy` over `0..n` and hand it to `f`.
///
/// The queue's producer thread lives exactly as long as `f` runs.
pub fn distribute<R>(
    strategy: Distribution,
    n: usize,
    workers: usize,
    cancel: CancelToken,
    f: impl FnOnce(&dyn WorkSource) -> R,
) -> R {
    match strategy {
        Distribution::StaticShard => f(&StaticShards::new(n, workers, cancel)),
        Distribution::SharedCursor => f(&SharedCursor::new(n, cancel)),
        Distribution::BoundedQueue { capacity } => std::thread::scope(|scope| {
            let queue = BoundedQueue::spawn(scope, n, capacity, cancel);
            f(&queue)
        }),
    }
}
