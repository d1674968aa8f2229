//! Single-resolution signal used to short-circuit a render.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::channel::oneshot;

/// Create a linked resolver/promise pair.
///
/// The promise settles exactly once, with the first value passed to any
/// clone of the resolver. There is no rejection path.
pub fn defer<T>() -> (Resolver<T>, Promise<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Resolver {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        Promise { receiver: Some(rx) },
    )
}

/// Resolving half of a deferred signal.
///
/// Cloning shares the same underlying slot: only the first `resolve`
/// across all clones has an effect.
#[derive(Debug)]
pub struct Resolver<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> Resolver<T> {
    /// Resolve the promise with `value`.
    ///
    /// Returns `true` for the call that settled the promise and `false`
    /// for every later call, which are no-ops.
    pub fn resolve(&self, value: T) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            // A dropped promise is not an error: nobody is waiting anymore.
            Some(tx) => {
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    /// Check whether the promise has already been resolved.
    pub fn is_resolved(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Awaitable half of a deferred signal.
///
/// If every resolver is dropped without resolving, the promise never
/// settles.
#[derive(Debug)]
pub struct Promise<T> {
    receiver: Option<oneshot::Receiver<T>>,
}

impl<T> Future for Promise<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        let Some(receiver) = this.receiver.as_mut() else {
            return Poll::Pending;
        };

        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(value)) => {
                this.receiver = None;
                Poll::Ready(value)
            }
            Poll::Ready(Err(oneshot::Canceled)) => {
                this.receiver = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
