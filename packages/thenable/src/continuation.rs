//! Labelled callbacks registered on promises.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use crate::{Rejection, Settlement, Value, Values};

type Body<I> = Arc<dyn Fn(I) -> BoxFuture<'static, Settlement> + Send + Sync>;

/// A callback that runs when a promise settles, together with its label.
///
/// The label identifies the continuation to whoever observes registrations through the
/// prototype slots. The empty label marks a continuation as anonymous.
///
/// The input `I` is what the continuation is handed when it runs: the fulfilled [`Value`] for
/// [`OnFulfilled`], the [`Rejection`] for [`OnRejected`] and the settled members, in order, for
/// [`OnSpread`]. Whatever the continuation returns (or the future it returns resolves to)
/// settles the promise that registering it created.
pub struct Continuation<I> {
    label: Arc<str>,
    body: Body<I>,
}

/// Continuation registered through the `then` slot.
pub type OnFulfilled = Continuation<Value>;

/// Continuation registered through the `catch` slot.
pub type OnRejected = Continuation<Rejection>;

/// Continuation registered through the `spread` slot.
pub type OnSpread = Continuation<Vec<Value>>;

impl<I: 'static> Continuation<I> {
    /// Creates a continuation whose result settles asynchronously.
    pub fn new<F, Fut>(label: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Settlement> + Send + 'static,
    {
        Self {
            label: label.into(),
            body: Arc::new(move |input: I| body(input).boxed()),
        }
    }

    /// Creates a continuation whose result is available as soon as it returns.
    pub fn from_fn<F>(label: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(I) -> Settlement + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            body: Arc::new(move |input: I| future::ready(body(input)).boxed()),
        }
    }

    /// The label given to the continuation when it was created.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the continuation has an empty label.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.label.is_empty()
    }

    /// Runs the continuation with `input`, returning the future of its outcome.
    pub fn invoke(&self, input: I) -> BoxFuture<'static, Settlement> {
        (self.body)(input)
    }
}

impl OnSpread {
    /// Adapts the continuation to receive the multi-value aggregate as one [`Value`].
    ///
    /// A [`Values`] aggregate is taken apart into its members. Any other value is passed on as
    /// the only member.
    #[must_use]
    pub fn spread_over(self) -> OnFulfilled {
        let Self { label, body } = self;

        Continuation {
            label,
            body: Arc::new(move |value: Value| {
                let members = value
                    .downcast_ref::<Values>()
                    .map(Values::to_vec)
                    .unwrap_or_else(|| vec![Arc::clone(&value)]);

                body(members)
            }),
        }
    }
}

impl<I> Clone for Continuation<I> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            body: Arc::clone(&self.body),
        }
    }
}

impl<I> fmt::Debug for Continuation<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
