//! Chaining on top of [`Promise::attach`].
//!
//! Every combinator returns a new promise and never lets a handler's error
//! escape into the caller: an `Err` from a handler becomes a rejection of the
//! returned promise, and an upstream rejection flows through untouched until
//! something observes it.

use crate::Promise;

impl<V, E> Promise<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Flat-map. Runs `on_fulfilled` with this promise's value and settles the
    /// returned promise with the outcome of the promise it produces.
    ///
    /// If this promise rejects, `on_fulfilled` never runs and the error is
    /// passed along.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::Promise;
    /// let rejected = Promise::<i32, &str>::from_error("E")
    ///     .then(|n| Ok(Promise::from_value(n * 2)));
    /// assert_eq!(rejected.error(), Some("E"));
    /// ```
    pub fn then<V2, F>(&self, on_fulfilled: F) -> Promise<V2, E>
    where
        V2: Clone + Send + 'static,
        F: FnOnce(V) -> Result<Promise<V2, E>, E> + Send + 'static,
    {
        Promise::<V2, E>::new(|fulfill, reject| {
            let upstream = reject.clone();
            self.attach(
                move |value| match on_fulfilled(value) {
                    Ok(inner) => inner.forward(fulfill, reject),
                    Err(error) => reject.reject(error),
                },
                move |error| upstream.reject(error),
            );
            Ok(())
        })
    }

    /// Map. Same error handling as [`then`](Self::then), for handlers that
    /// produce a plain value.
    pub fn map<V2, F>(&self, on_fulfilled: F) -> Promise<V2, E>
    where
        V2: Clone + Send + 'static,
        F: FnOnce(V) -> Result<V2, E> + Send + 'static,
    {
        self.then(move |value| Ok(Promise::from_result(on_fulfilled(value))))
    }

    /// Observes the outcome without changing it. The returned promise is
    /// settled first, then the matching handler runs.
    pub fn inspect_with<F, R>(&self, on_fulfilled: F, on_rejected: R) -> Promise<V, E>
    where
        F: FnOnce(V) + Send + 'static,
        R: FnOnce(E) + Send + 'static,
    {
        Promise::<V, E>::new(|fulfill, reject| {
            self.attach(
                move |value| {
                    fulfill.fulfill(value.clone());
                    on_fulfilled(value)
                },
                move |error| {
                    reject.reject(error.clone());
                    on_rejected(error)
                },
            );
            Ok(())
        })
    }

    pub fn inspect<F>(&self, on_fulfilled: F) -> Promise<V, E>
    where
        F: FnOnce(V) + Send + 'static,
    {
        self.inspect_with(on_fulfilled, |_| {})
    }

    /// Offers a rejection to `on_rejected`. This does not recover: the
    /// returned promise is still rejected with the same error. Use
    /// [`recover`](Self::recover) to turn an error back into a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_chain::Promise;
    /// use std::sync::mpsc::channel;
    /// let (tx, rx) = channel();
    /// let caught = Promise::<i32, String>::from_value(1)
    ///     .map(|_| Err::<i32, _>("E".to_string()))
    ///     .catch(move |e| tx.send(e).unwrap());
    /// assert_eq!(rx.recv().unwrap(), "E");
    /// assert_eq!(caught.error().as_deref(), Some("E"));
    /// ```
    pub fn catch<R>(&self, on_rejected: R) -> Promise<V, E>
    where
        R: FnOnce(E) + Send + 'static,
    {
        self.inspect_with(|_| {}, on_rejected)
    }

    /// Flat-map on the error path. A fulfilled value passes through;
    /// a rejection is handed to `on_rejected`, whose promise decides the
    /// outcome.
    pub fn recover<F>(&self, on_rejected: F) -> Promise<V, E>
    where
        F: FnOnce(E) -> Result<Promise<V, E>, E> + Send + 'static,
    {
        Promise::<V, E>::new(|fulfill, reject| {
            let upstream = fulfill.clone();
            self.attach(
                move |value| upstream.fulfill(value),
                move |error| match on_rejected(error) {
                    Ok(inner) => inner.forward(fulfill, reject),
                    Err(error) => reject.reject(error),
                },
            );
            Ok(())
        })
    }

    /// Converts the error type, leaving fulfillment untouched.
    pub fn map_err<E2, F>(&self, on_rejected: F) -> Promise<V, E2>
    where
        E2: Clone + Send + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        Promise::<V, E2>::new(|fulfill, reject| {
            self.attach(
                move |value| fulfill.fulfill(value),
                move |error| reject.reject(on_rejected(error)),
            );
            Ok(())
        })
    }
}
