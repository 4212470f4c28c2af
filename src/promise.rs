use std::fmt::{self, Debug};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::Waker;

use tracing::{debug, trace};

use crate::dispatch::{self, Job};
use crate::Settlement;

type Handler<T> = Box<dyn FnOnce(T) + Send>;

/// A registered pair of handlers. Consuming `fire` guarantees at most one of
/// them ever runs.
struct Continuation<V, E> {
    on_fulfilled: Handler<V>,
    on_rejected: Handler<E>,
}

impl<V: Clone, E: Clone> Continuation<V, E> {
    fn fire(self, state: &Settlement<V, E>) {
        match state {
            Settlement::Fulfilled(value) => (self.on_fulfilled)(value.clone()),
            Settlement::Rejected(error) => (self.on_rejected)(error.clone()),
            Settlement::Pending => {}
        }
    }
}

pub(crate) struct Inner<V, E> {
    pub(crate) state: Settlement<V, E>,
    continuations: Vec<Continuation<V, E>>,
    /// Parked waiters, keyed by waiter id.
    pub(crate) wakers: Vec<(usize, Waker)>,
    pub(crate) next_waiter: usize,
    pub(crate) abandoned: bool,
}

/// The state every handle onto one container points at.
pub(crate) struct Shared<V, E> {
    inner: Mutex<Inner<V, E>>,
    resolvers: AtomicUsize,
}

impl<V, E> Shared<V, E> {
    fn new(state: Settlement<V, E>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                continuations: vec![],
                wakers: vec![],
                next_waiter: 0,
                abandoned: false,
            }),
            resolvers: AtomicUsize::new(0),
        }
    }

    /// User code never runs under this lock, so a poisoned guard still holds
    /// consistent data.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner<V, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn wake_all(wakers: Vec<(usize, Waker)>) {
    for (_, waker) in wakers {
        waker.wake()
    }
}

impl<V, E> Shared<V, E>
where
    V: Clone + 'static,
    E: Clone + 'static,
{
    /// Marks a pending container as unable to settle and drops everything
    /// that was waiting on it.
    fn abandon(&self) {
        let (continuations, wakers) = {
            let mut inner = self.lock();
            if !inner.state.is_pending() {
                return;
            }
            inner.abandoned = true;
            (
                mem::take(&mut inner.continuations),
                mem::take(&mut inner.wakers),
            )
        };
        debug!(
            continuations = continuations.len(),
            "every resolver dropped before the promise settled"
        );
        wake_all(wakers);
        // Dropping the continuations releases downstream resolvers, which
        // abandons the rest of a pending chain one queued job at a time.
        dispatch::run([Box::new(move || drop(continuations)) as Job]);
    }

    fn settle(&self, state: Settlement<V, E>) -> bool {
        if state.is_pending() {
            return false;
        }
        let (continuations, wakers) = {
            let mut inner = self.lock();
            if !inner.state.is_pending() {
                debug!("ignoring settlement of an already settled promise");
                return false;
            }
            inner.state = state.clone();
            (
                mem::take(&mut inner.continuations),
                mem::take(&mut inner.wakers),
            )
        };
        trace!(
            fulfilled = state.is_fulfilled(),
            continuations = continuations.len(),
            "promise settled"
        );
        wake_all(wakers);
        let state = Arc::new(state);
        dispatch::run(continuations.into_iter().map(|continuation| {
            let state = state.clone();
            Box::new(move || continuation.fire(&state)) as Job
        }));
        true
    }

    fn attach(&self, continuation: Continuation<V, E>) {
        let state = {
            let mut inner = self.lock();
            if inner.abandoned {
                drop(inner);
                drop(continuation);
                return;
            }
            if inner.state.is_pending() {
                inner.continuations.push(continuation);
                return;
            }
            inner.state.clone()
        };
        continuation.fire(&state);
    }
}

/// The settling side of a pending [`Promise`].
///
/// Resolvers are cheap to clone and may be sent to other threads. Only the
/// first `fulfill`, `reject` or `settle` across all clones has any effect.
/// Once every resolver of a pending promise is dropped the promise is
/// abandoned: it stays pending forever and its [`Waiter`](crate::Waiter)s
/// finish with [`Error::Abandoned`](crate::Error::Abandoned).
///
/// # Examples
///
/// ```
/// use promise_chain::Promise;
/// use std::thread;
/// let (resolver, promise) = Promise::<String, String>::pending();
/// let task = thread::spawn(move || resolver.fulfill("🍓".into()));
/// task.join().expect("The task thread has panicked");
/// assert_eq!(promise.value().as_deref(), Some("🍓"));
/// ```
pub struct Resolver<V, E> {
    shared: Arc<Shared<V, E>>,
    // Captured where `V: 'static` holds so `Drop` can queue the abandonment.
    abandon: fn(&Shared<V, E>),
}

impl<V, E> Resolver<V, E> {
    pub fn is_settled(&self) -> bool {
        !self.shared.lock().state.is_pending()
    }

    /// Splits into the two independent completion callbacks.
    pub fn split(self) -> (Fulfill<V, E>, Reject<V, E>) {
        (Fulfill(self.clone()), Reject(self))
    }
}

impl<V: Clone + 'static, E: Clone + 'static> Resolver<V, E> {
    fn new(shared: Arc<Shared<V, E>>) -> Self {
        shared.resolvers.fetch_add(1, Ordering::AcqRel);
        Self {
            shared,
            abandon: Shared::abandon,
        }
    }

    pub fn fulfill(&self, value: V) {
        self.shared.settle(Settlement::Fulfilled(value));
    }

    pub fn reject(&self, error: E) {
        self.shared.settle(Settlement::Rejected(error));
    }

    /// Returns whether this call settled the promise. Settling with
    /// `Pending` never does.
    pub fn settle(&self, state: Settlement<V, E>) -> bool {
        self.shared.settle(state)
    }
}

impl<V, E> Clone for Resolver<V, E> {
    fn clone(&self) -> Self {
        self.shared.resolvers.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: self.shared.clone(),
            abandon: self.abandon,
        }
    }
}

impl<V, E> Drop for Resolver<V, E> {
    fn drop(&mut self) {
        if self.shared.resolvers.fetch_sub(1, Ordering::AcqRel) == 1 {
            (self.abandon)(&self.shared);
        }
    }
}

impl<V, E> Debug for Resolver<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Completion callback that fulfills its promise.
#[derive(Debug, Clone)]
pub struct Fulfill<V, E>(Resolver<V, E>);

impl<V: Clone + 'static, E: Clone + 'static> Fulfill<V, E> {
    pub fn fulfill(&self, value: V) {
        self.0.fulfill(value)
    }
}

/// Completion callback that rejects its promise.
#[derive(Debug, Clone)]
pub struct Reject<V, E>(Resolver<V, E>);

impl<V: Clone + 'static, E: Clone + 'static> Reject<V, E> {
    pub fn reject(&self, error: E) {
        self.0.reject(error)
    }
}

/// A value that settles exactly once, successfully or with an error, and
/// hands that outcome to every continuation attached before or after.
///
/// Cloning a `Promise` clones the handle, not the container.
///
/// # Examples
///
/// ```
/// use promise_chain::Promise;
/// let promise = Promise::<i32, String>::from_value(1)
///     .then(|n| Ok(Promise::from_value(n * 2)))
///     .map(|n| Ok(n + 1));
/// assert_eq!(promise.value(), Some(3));
/// ```
pub struct Promise<V, E> {
    pub(crate) shared: Arc<Shared<V, E>>,
}

impl<V, E> Promise<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub fn from_value(value: V) -> Self {
        Self::settled(Settlement::Fulfilled(value))
    }

    pub fn from_error(error: E) -> Self {
        Self::settled(Settlement::Rejected(error))
    }

    pub fn from_result(result: Result<V, E>) -> Self {
        Self::settled(result.into())
    }

    fn settled(state: Settlement<V, E>) -> Self {
        Self {
            shared: Arc::new(Shared::new(state)),
        }
    }

    /// A pending promise together with the resolver that settles it.
    pub fn pending() -> (Resolver<V, E>, Self) {
        let shared = Arc::new(Shared::new(Settlement::Pending));
        (Resolver::new(shared.clone()), Self { shared })
    }

    /// Creates a pending promise and runs `resolver` right away with its two
    /// completion callbacks. The callbacks may be called synchronously or
    /// kept and called later from anywhere. If `resolver` returns an error
    /// the promise is rejected with it, unless it was already settled.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::Promise;
    /// let failed = Promise::<u32, String>::new(|_fulfill, _reject| Err("no disk".into()));
    /// assert_eq!(failed.error().as_deref(), Some("no disk"));
    /// ```
    pub fn new<F>(resolver: F) -> Self
    where
        F: FnOnce(Fulfill<V, E>, Reject<V, E>) -> Result<(), E>,
    {
        let (handle, promise) = Self::pending();
        let (fulfill, reject) = handle.split();
        let fallback = reject.clone();
        if let Err(error) = resolver(fulfill, reject) {
            debug!("resolver failed, rejecting its promise");
            fallback.reject(error);
        }
        promise
    }

    /// Registers a pair of handlers. Exactly one of them runs, once: right
    /// now on this thread if the promise has already settled, otherwise on
    /// whichever thread settles it.
    ///
    /// Handlers attached to an abandoned promise are dropped without running.
    ///
    /// When a promise settles inside another handler, its handlers are queued
    /// behind the current one rather than run on top of it, so chains of any
    /// length settle in constant stack. A panicking handler does not stop the
    /// others; the first panic is resumed on the settling thread once every
    /// queued handler has run.
    pub fn attach<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(V) + Send + 'static,
        R: FnOnce(E) + Send + 'static,
    {
        self.shared.attach(Continuation {
            on_fulfilled: Box::new(on_fulfilled),
            on_rejected: Box::new(on_rejected),
        })
    }

    /// Settles `fulfill`/`reject`'s promise with whatever this one settles with.
    pub(crate) fn forward(&self, fulfill: Fulfill<V, E>, reject: Reject<V, E>) {
        self.attach(
            move |value| fulfill.fulfill(value),
            move |error| reject.reject(error),
        )
    }

    pub fn settlement(&self) -> Settlement<V, E> {
        self.shared.lock().state.clone()
    }

    pub fn value(&self) -> Option<V> {
        self.shared.lock().state.value().cloned()
    }

    pub fn error(&self) -> Option<E> {
        self.shared.lock().state.error().cloned()
    }
}

impl<V, E> Promise<V, E> {
    pub fn is_pending(&self) -> bool {
        self.shared.lock().state.is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.shared.lock().state.is_fulfilled()
    }

    pub fn is_rejected(&self) -> bool {
        self.shared.lock().state.is_rejected()
    }

    /// True once every resolver of a still pending promise has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.shared.lock().abandoned
    }
}

impl<V, E> Clone for Promise<V, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<V: Debug, E: Debug> Debug for Promise<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Promise")
            .field(&self.shared.lock().state)
            .finish()
    }
}

impl<V, E> From<Result<V, E>> for Promise<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn from(result: Result<V, E>) -> Self {
        Self::from_result(result)
    }
}
