//! Completion Handles
//!
//! Every cache operation returns a `Completion`: a single-value future that is
//! either resolved on the spot or settled later through its `Resolver`.
//! Handles can be awaited, or inspected without a runtime via `take_ready`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{CacheError, Result, WriteError};

// == Completion ==
/// Handle to a value that is available now or once an outside event occurs.
#[must_use = "a completion handle does nothing unless awaited or inspected"]
#[derive(Debug)]
pub struct Completion<T> {
    state: State<T>,
}

#[derive(Debug)]
enum State<T> {
    Ready(Option<Result<T>>),
    Pending(oneshot::Receiver<Result<T>>),
}

impl<T> Completion<T> {
    /// Creates a handle already resolved with `value`.
    pub fn resolved(value: T) -> Self {
        Self {
            state: State::Ready(Some(Ok(value))),
        }
    }

    /// Creates a handle already rejected with `error`.
    pub fn rejected(error: impl Into<CacheError>) -> Self {
        Self {
            state: State::Ready(Some(Err(error.into()))),
        }
    }

    /// Creates an unsettled handle together with the capability to settle it.
    pub fn pending() -> (Resolver<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            Resolver { tx },
            Self {
                state: State::Pending(rx),
            },
        )
    }

    /// Returns true while the outcome is not yet known.
    pub fn is_pending(&mut self) -> bool {
        self.settle();
        matches!(self.state, State::Pending(_))
    }

    /// Takes the outcome if it is available, without waiting.
    ///
    /// Returns `None` while pending, and after the outcome was taken once.
    pub fn take_ready(&mut self) -> Option<Result<T>> {
        self.settle();
        match &mut self.state {
            State::Ready(slot) => slot.take(),
            State::Pending(_) => None,
        }
    }

    fn settle(&mut self) {
        if let State::Pending(rx) = &mut self.state {
            match rx.try_recv() {
                Ok(outcome) => self.state = State::Ready(Some(outcome)),
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.state = State::Ready(Some(Err(WriteError::Abandoned.into())))
                }
            }
        }
    }

    /// Transforms the resolved value, leaving rejections untouched.
    pub async fn map<U, F>(self, f: F) -> Result<U>
    where
        F: FnOnce(T) -> U,
    {
        self.await.map(f)
    }
}

// Never pinned structurally: the receiver is polled through `Pin::new`.
impl<T> Unpin for Completion<T> {}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Ready(slot) => {
                Poll::Ready(slot.take().expect("`Completion` polled after completion"))
            }
            State::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(received) => {
                    this.state = State::Ready(None);
                    Poll::Ready(received.unwrap_or(Err(WriteError::Abandoned.into())))
                }
            },
        }
    }
}

// == Resolver ==
/// Settles a pending `Completion` exactly once.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        // The caller may have dropped its handle; nobody is left to notify.
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, error: impl Into<CacheError>) {
        let _ = self.tx.send(Err(error.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_resolved_handle() {
        let value = Completion::resolved(7).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_rejected_handle() {
        let err = Completion::<()>::rejected(ReadError::NotOpen).await.unwrap_err();
        assert_eq!(err, CacheError::Read(ReadError::NotOpen));
    }

    #[test]
    fn test_pending_until_resolved() {
        let (resolver, completion) = Completion::pending();
        let mut fut = task::spawn(completion);

        assert_pending!(fut.poll());
        resolver.resolve("done");
        assert!(fut.is_woken());
        assert_eq!(assert_ready!(fut.poll()).unwrap(), "done");
    }

    #[test]
    fn test_take_ready_without_runtime() {
        let (resolver, mut completion) = Completion::<u8>::pending();
        assert!(completion.is_pending());
        assert!(completion.take_ready().is_none());

        resolver.reject(WriteError::NotOpen);
        assert!(!completion.is_pending());
        assert_eq!(
            completion.take_ready(),
            Some(Err(CacheError::Write(WriteError::NotOpen)))
        );
        assert!(completion.take_ready().is_none());
    }

    #[test]
    fn test_dropped_resolver_abandons_handle() {
        let (resolver, mut completion) = Completion::<u8>::pending();
        drop(resolver);

        assert_eq!(
            completion.take_ready(),
            Some(Err(CacheError::Write(WriteError::Abandoned)))
        );
    }

    #[tokio::test]
    async fn test_map() {
        let doubled = Completion::resolved(21).map(|v| v * 2).await.unwrap();
        assert_eq!(doubled, 42);
    }
}
