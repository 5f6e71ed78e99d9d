#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Eager promises over tokio whose continuation registration can be intercepted.
//!
//! A [`Runtime`] creates promises that start working as soon as they exist. Continuations are
//! attached to a promise with `then`, `catch` and `spread`, each of which goes through a named
//! method slot on the [`Prototype`] shared by every promise of the runtime. Those slots are
//! [`interpose::Method`]s, so instrumentation can replace how continuations are registered
//! for all promises at once without any change at the call sites.
//!
//! Every continuation carries a label. The label is how an observer of the slots tells
//! continuations apart; the empty label marks a continuation as anonymous.
//!
//! The typed [`Promise<T>`] is what most code works with. Underneath it is a [`RawPromise`]
//! whose values are type-erased [`Value`]s, which is the form the prototype slots see.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use thenable::{Rejection, Runtime};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runtime = Runtime::new(tokio::runtime::Handle::current());
//!
//! let total = runtime
//!     .delay(Duration::from_millis(10), 21)
//!     .then("double", |n: i32| n * 2)
//!     .try_then("validate", |n: i32| {
//!         if n > 40 {
//!             Ok(n)
//!         } else {
//!             Err(Rejection::msg("too small"))
//!         }
//!     })
//!     .catch("fallback", |_| 0);
//!
//! assert_eq!(total.await.unwrap(), 42);
//!
//! let combined = runtime
//!     .resolve((3, 4))
//!     .spread("combine", |a: i32, b: i32| format!("{a}-{b}"));
//!
//! assert_eq!(combined.await.unwrap(), "3-4");
//! # }
//! ```

mod continuation;
mod promise;
mod prototype;
mod raw;
mod rejection;
mod runtime;
mod value;

pub use continuation::{Continuation, OnFulfilled, OnRejected, OnSpread};
pub use promise::Promise;
pub use prototype::{CATCH, Prototype, RegistrationSlot, SPREAD, THEN};
pub use raw::RawPromise;
pub use rejection::{Rejection, ValueError};
pub use runtime::{Join, Runtime};
pub use value::{Settled, Settlement, Value, Values};
