//! Resolve-once promises with chained continuations.
//!
//! A [`Promise`] starts pending or already settled, settles at most once, and
//! hands its outcome to every continuation attached to it, whether that
//! continuation arrived before or after the settlement. Settling and
//! attaching are safe from any thread; handlers run on the thread that
//! settles the promise, or right away on the attaching thread if it already
//! has.
//!
//! # Examples
//!
//! ```
//! use promise_chain::Promise;
//! use std::thread;
//! let promise = Promise::<u32, String>::new(|fulfill, _reject| {
//!     thread::spawn(move || fulfill.fulfill(20));
//!     Ok(())
//! });
//! let answer = promise
//!     .then(|n| Ok(Promise::from_value(n * 2)))
//!     .map(|n| Ok(n + 2))
//!     .catch(|e| eprintln!("failed: {e}"));
//! assert_eq!(futures::executor::block_on(answer.waiter()), Ok(Ok(42)));
//! ```

mod combinators;
mod dispatch;
mod promise;
mod settlement;
mod waiter;

pub use promise::{Fulfill, Promise, Reject, Resolver};
pub use settlement::Settlement;
pub use waiter::Waiter;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Every resolver was dropped while the promise was still pending.
    #[error("promise was abandoned before it settled")]
    Abandoned,
}
