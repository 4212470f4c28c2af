//! Awaiting a promise from async code.

use crate::promise::Shared;
use crate::{Error, Promise};
use std::{
    future::{Future, IntoFuture},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

/// A future that completes once its promise settles. A promise can have any
/// number of waiters, and waiters may be cloned. Waiting never blocks a
/// thread by itself; pair it with whatever executor you already use.
/// Dropping a waiter unregisters it.
///
/// # Examples
///
/// ```
/// use promise_chain::Promise;
/// use futures::executor::block_on;
/// use std::thread;
/// let (resolver, promise) = Promise::<String, String>::pending();
/// let waiter = promise.waiter();
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received {:?}", waiter.await);
/// }));
/// resolver.fulfill("Hi".into());
/// task1.join().expect("The task1 thread has panicked.");
/// ```
pub struct Waiter<V, E> {
    shared: Arc<Shared<V, E>>,
    id: usize,
}

impl<V, E> Waiter<V, E> {
    fn new(shared: Arc<Shared<V, E>>) -> Self {
        let id = {
            let mut promise = shared.lock();
            promise.next_waiter += 1;
            promise.next_waiter
        };
        Self { shared, id }
    }
}

impl<V, E> Clone for Waiter<V, E> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<V, E> Drop for Waiter<V, E> {
    fn drop(&mut self) {
        let id = self.id;
        self.shared.lock().wakers.retain(|(waiter, _)| *waiter != id);
    }
}

impl<V, E> std::fmt::Debug for Waiter<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter").finish_non_exhaustive()
    }
}

impl<V: Clone, E: Clone> Future for Waiter<V, E> {
    /// The outer `Err` means the promise can never settle.
    type Output = Result<Result<V, E>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut promise = self.shared.lock();
        if let Some(result) = promise.state.clone().into_result() {
            return Poll::Ready(Ok(result));
        }
        if promise.abandoned {
            return Poll::Ready(Err(Error::Abandoned));
        }
        let id = self.id;
        match promise.wakers.iter_mut().find(|(waiter, _)| *waiter == id) {
            Some((_, waker)) if waker.will_wake(cx.waker()) => {}
            Some((_, waker)) => *waker = cx.waker().clone(),
            None => promise.wakers.push((id, cx.waker().clone())),
        }
        Poll::Pending
    }
}

impl<V, E> Promise<V, E> {
    pub fn waiter(&self) -> Waiter<V, E> {
        Waiter::new(self.shared.clone())
    }
}

impl<V: Clone, E: Clone> IntoFuture for Promise<V, E> {
    type Output = Result<Result<V, E>, Error>;
    type IntoFuture = Waiter<V, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.waiter()
    }
}
