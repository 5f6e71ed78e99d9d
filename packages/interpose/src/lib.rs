#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reversible interception of replaceable method slots.
//!
//! An object that wants to be interceptable exposes its methods as [`Method`] slots. Each slot
//! has a stable identity ([`MethodKey`]) made of the owning object's [`TargetId`] and the
//! method name. An [`Interceptor`] swaps the body of a slot for a wrapper that counts and
//! records every call before forwarding to a replacement function, and hands back an
//! [`Interception`] handle that restores the original body when asked to (or when dropped).
//!
//! At most one interception is active per slot at any time, no matter how many interceptors
//! try. The [`Registry`] shared by all clones of an [`Interceptor`] lists the slots they hold.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use interpose::{Interceptor, Method, TargetId};
//!
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! let target = TargetId::next();
//! let greet = Arc::new(Method::new(target, "greet", |greeter: &Greeter, name: String| {
//!     format!("{}, {name}", greeter.greeting)
//! }));
//!
//! let greeter = Greeter { greeting: "Hello" };
//! let interceptor = Interceptor::new();
//!
//! let mut interception = interceptor
//!     .intercept(&greet, |greeter: &Greeter, call| {
//!         format!("{} #{}, {}", greeter.greeting, call.ordinal(), call.args())
//!     })
//!     .unwrap();
//!
//! assert_eq!(greet.call(&greeter, "Alice".to_string()), "Hello #0, Alice");
//! assert_eq!(interception.call_count(), 1);
//! assert_eq!(interception.calling_args(), vec!["Alice".to_string()]);
//!
//! interception.restore();
//! assert_eq!(greet.call(&greeter, "Bob".to_string()), "Hello, Bob");
//! ```

mod error;
mod interception;
mod interceptor;
mod method;
mod registry;

pub use error::Error;
pub(crate) use error::Result;
pub use interception::Interception;
pub(crate) use interception::CallLog;
pub use interceptor::{Call, Interceptor};
pub use method::{Method, MethodKey, TargetId};
pub(crate) use method::Body;
pub use registry::Registry;

pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock - continued execution is not safe because we can no longer ensure that we uphold security and privacy guarantees";
