//! Replaying multicast of action states
//!
//! [`ReplaySubject`] buffers every value so late subscribers see the whole
//! history. [`SharedStream`] hands out [`StateStream`]s over a subject and
//! runs a teardown once the last of them is dropped.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;

#[derive(Debug)]
enum Terminal<F> {
    Complete,
    Error(F),
}

#[derive(Debug)]
struct ReplayInner<T, F> {
    buffer: Vec<T>,
    terminal: Option<Terminal<F>>,
    listeners: Vec<UnboundedSender<Result<T, F>>>,
}

/// Multicast point replaying its full history to every subscriber
///
/// Values pushed after `complete` or `error` are ignored.
#[derive(Debug)]
pub struct ReplaySubject<T, F> {
    inner: Arc<Mutex<ReplayInner<T, F>>>,
}

impl<T, F> Clone for ReplaySubject<T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone, F: Clone> Default for ReplaySubject<T, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, F: Clone> ReplaySubject<T, F> {
    /// Create an empty subject
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReplayInner {
                buffer: Vec::new(),
                terminal: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Record a value and forward it to the current subscribers
    pub fn next(&self, value: T) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.terminal.is_some() {
            return;
        }
        inner
            .listeners
            .retain(|listener| listener.unbounded_send(Ok(value.clone())).is_ok());
        inner.buffer.push(value);
    }

    /// End the sequence normally
    pub fn complete(&self) {
        let mut inner = self.inner.lock();
        if inner.terminal.is_some() {
            return;
        }
        inner.terminal = Some(Terminal::Complete);
        // dropping the senders ends every subscriber stream
        inner.listeners.clear();
    }

    /// End the sequence with an error item
    pub fn error(&self, error: F) {
        let mut inner = self.inner.lock();
        if inner.terminal.is_some() {
            return;
        }
        for listener in inner.listeners.drain(..) {
            let _ = listener.unbounded_send(Err(error.clone()));
        }
        inner.terminal = Some(Terminal::Error(error));
    }

    /// Whether `complete` or `error` was called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().terminal.is_some()
    }

    /// Subscribe, receiving the buffered history first
    pub fn subscribe(&self) -> UnboundedReceiver<Result<T, F>> {
        let (sender, receiver) = unbounded();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        for value in &inner.buffer {
            let _ = sender.unbounded_send(Ok(value.clone()));
        }
        match &inner.terminal {
            None => inner.listeners.push(sender),
            Some(Terminal::Error(error)) => {
                let _ = sender.unbounded_send(Err(error.clone()));
            }
            Some(Terminal::Complete) => {}
        }
        receiver
    }
}

type Teardown = Box<dyn FnOnce() + Send>;

struct RefCount {
    subscribers: usize,
    teardown: Option<Teardown>,
}

impl fmt::Debug for RefCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCount")
            .field("subscribers", &self.subscribers)
            .field("torn_down", &self.teardown.is_none())
            .finish()
    }
}

/// Reference counted share of a [`ReplaySubject`]
///
/// The teardown runs once, when the subscriber count first drops back to
/// zero. Subscribing afterwards still replays the recorded history.
#[derive(Debug)]
pub struct SharedStream<T, F> {
    subject: ReplaySubject<T, F>,
    refs: Arc<Mutex<RefCount>>,
}

impl<T, F> Clone for SharedStream<T, F> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            refs: Arc::clone(&self.refs),
        }
    }
}

impl<T: Clone, F: Clone> SharedStream<T, F> {
    /// Share `subject`, running `teardown` when the last subscriber leaves
    pub fn new(subject: ReplaySubject<T, F>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            subject,
            refs: Arc::new(Mutex::new(RefCount {
                subscribers: 0,
                teardown: Some(Box::new(teardown)),
            })),
        }
    }

    /// Open a new stream over the shared sequence
    pub fn subscribe(&self) -> StateStream<T, F> {
        self.refs.lock().subscribers += 1;
        StateStream {
            receiver: self.subject.subscribe(),
            _guard: SubscriberGuard {
                refs: Arc::clone(&self.refs),
            },
        }
    }

    /// Number of live [`StateStream`]s
    pub fn subscriber_count(&self) -> usize {
        self.refs.lock().subscribers
    }
}

#[derive(Debug)]
struct SubscriberGuard {
    refs: Arc<Mutex<RefCount>>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        let teardown = {
            let mut refs = self.refs.lock();
            refs.subscribers = refs.subscribers.saturating_sub(1);
            if refs.subscribers == 0 {
                refs.teardown.take()
            } else {
                None
            }
        };
        // outside the lock, the teardown may publish into the subject
        if let Some(teardown) = teardown {
            teardown();
        }
    }
}

/// One subscription to a [`SharedStream`]
///
/// Yields `Ok` values in order, then ends, or ends after a single `Err` item.
#[derive(Debug)]
pub struct StateStream<T, F> {
    receiver: UnboundedReceiver<Result<T, F>>,
    _guard: SubscriberGuard,
}

impl<T, F> Stream for StateStream<T, F> {
    type Item = Result<T, F>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}
