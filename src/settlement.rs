//! The tri-state value a [`Promise`](crate::Promise) holds.
//!
//! A settlement only ever moves from `Pending` to one of the two terminal
//! variants. This type does not enforce that on its own; the promise engine
//! does.

/// Where a promise currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Settlement<V, E> {
    #[default]
    Pending,
    Fulfilled(V),
    Rejected(E),
}

impl<V, E> Settlement<V, E> {
    pub fn pending() -> Self {
        Settlement::Pending
    }

    pub fn fulfilled(value: V) -> Self {
        Settlement::Fulfilled(value)
    }

    pub fn rejected(error: E) -> Self {
        Settlement::Rejected(error)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Settlement::Pending)
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }

    /// The fulfillment value, if there is one.
    pub fn value(&self) -> Option<&V> {
        match self {
            Settlement::Fulfilled(value) => Some(value),
            _ => None,
        }
    }

    /// The rejection error, if there is one.
    pub fn error(&self) -> Option<&E> {
        match self {
            Settlement::Rejected(error) => Some(error),
            _ => None,
        }
    }

    /// `None` while pending, otherwise the outcome as a `Result`.
    ///
    /// ```
    /// use promise_chain::Settlement;
    /// let done: Settlement<u8, ()> = Settlement::fulfilled(7);
    /// assert_eq!(done.into_result(), Some(Ok(7)));
    /// assert_eq!(Settlement::<u8, ()>::pending().into_result(), None);
    /// ```
    pub fn into_result(self) -> Option<Result<V, E>> {
        match self {
            Settlement::Pending => None,
            Settlement::Fulfilled(value) => Some(Ok(value)),
            Settlement::Rejected(error) => Some(Err(error)),
        }
    }
}

impl<V, E> From<Result<V, E>> for Settlement<V, E> {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(value) => Settlement::Fulfilled(value),
            Err(error) => Settlement::Rejected(error),
        }
    }
}
