use std::any::type_name;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared, try_join_all};
use tracing::trace;

use crate::{OnFulfilled, OnRejected, OnSpread, Prototype, Runtime, Settled, Settlement, Values};

/// A promise whose value type has been erased.
///
/// This is the receiver of the [`Prototype`] slots. The work behind the promise is spawned
/// on the tokio runtime of its [`Runtime`] as soon as the promise is created, so continuations
/// registered on it run whether or not anyone awaits the promise.
///
/// Cloning a `RawPromise` yields another handle to the same settlement.
#[derive(Clone)]
pub struct RawPromise {
    runtime: Runtime,
    settlement: Shared<BoxFuture<'static, Settlement>>,
}

impl RawPromise {
    pub(crate) fn spawn<F>(runtime: Runtime, work: F) -> Self
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        let settlement = work.boxed().shared();

        // The task drives the settlement even if every handle is dropped. Its join handle is
        // not needed because the outcome is observed through the shared future.
        drop(runtime.handle().spawn(settlement.clone()));

        Self {
            runtime,
            settlement,
        }
    }

    /// The prototype shared by all promises of the same runtime.
    #[must_use]
    pub fn prototype(&self) -> &Arc<Prototype> {
        self.runtime.prototype()
    }

    /// The runtime that created the promise.
    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Registers `on_fulfilled` through the `then` slot of the prototype.
    ///
    /// With the default slot body, the returned promise settles with the outcome of
    /// `on_fulfilled` if this promise is fulfilled, or with the same rejection otherwise.
    pub fn then(&self, on_fulfilled: OnFulfilled) -> Self {
        self.prototype().then_method().call(self, on_fulfilled)
    }

    /// Registers `on_rejected` through the `catch` slot of the prototype.
    ///
    /// With the default slot body, the returned promise settles with the outcome of
    /// `on_rejected` if this promise is rejected, or with the same value otherwise.
    pub fn catch(&self, on_rejected: OnRejected) -> Self {
        self.prototype().catch_method().call(self, on_rejected)
    }

    /// Registers `on_spread` through the `spread` slot of the prototype.
    ///
    /// With the default slot body, the members of the settled value are first settled
    /// themselves (see [`all()`][Self::all]) and then handed to `on_spread` in order.
    pub fn spread(&self, on_spread: OnSpread) -> Self {
        self.prototype().spread_method().call(self, on_spread)
    }

    /// Settles a new promise by running whichever continuation matches the settlement of
    /// this one.
    ///
    /// A missing continuation passes the settlement through unchanged. This does not go
    /// through the prototype slots, so it is safe to call from within a slot body.
    #[must_use]
    pub fn chain(
        &self,
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    ) -> Self {
        trace!(
            prototype = %self.prototype().id(),
            on_fulfilled = on_fulfilled.as_ref().map(OnFulfilled::label),
            on_rejected = on_rejected.as_ref().map(OnRejected::label),
            "chaining continuations"
        );

        let upstream = self.settlement.clone();

        Self::spawn(self.runtime.clone(), async move {
            match upstream.await {
                Ok(value) => match on_fulfilled {
                    Some(continuation) => continuation.invoke(value).await,
                    None => Ok(value),
                },
                Err(rejection) => match on_rejected {
                    Some(continuation) => continuation.invoke(rejection).await,
                    None => Err(rejection),
                },
            }
        })
    }

    /// Settles a new promise with the members of this one, each member settled in turn.
    ///
    /// If this promise settles with a [`Values`] aggregate, members that are themselves
    /// `RawPromise`s are replaced by their fulfilled values and the new promise is rejected as
    /// soon as any of them is rejected. Any other value becomes the only member. Like
    /// [`chain()`][Self::chain], this does not go through the prototype slots.
    #[must_use]
    pub fn all(&self) -> Self {
        let upstream = self.settlement.clone();

        Self::spawn(self.runtime.clone(), async move {
            let value = upstream.await?;

            let Some(values) = value.downcast_ref::<Values>() else {
                return Ok(Values::new(vec![value]).into_value());
            };

            let members = values.as_slice().iter().map(|member| {
                match member.downcast_ref::<RawPromise>() {
                    Some(promise) => promise.settled(),
                    None => future::ready(Ok(Arc::clone(member))).boxed(),
                }
            });

            let settled = try_join_all(members).await?;

            Ok(Values::new(settled).into_value())
        })
    }

    /// A future that resolves to the settlement of the promise.
    #[must_use]
    pub fn settled(&self) -> BoxFuture<'static, Settlement> {
        self.settlement.clone().boxed()
    }

    /// Whether the promise has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settlement.peek().is_some()
    }

    /// The settlement, if the promise has settled.
    #[must_use]
    pub fn peek(&self) -> Option<Settlement> {
        self.settlement.peek().cloned()
    }
}

impl Settled for RawPromise {}

impl IntoFuture for RawPromise {
    type Output = Settlement;
    type IntoFuture = Shared<BoxFuture<'static, Settlement>>;

    fn into_future(self) -> Self::IntoFuture {
        self.settlement
    }
}

impl fmt::Debug for RawPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("prototype", &self.prototype().id())
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}
