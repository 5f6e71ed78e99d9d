use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use interpose::{Interceptor, Method, TargetId};

use crate::{OnFulfilled, OnRejected, OnSpread, RawPromise};

/// Name of the slot that registers a continuation for the fulfilled value.
pub const THEN: &str = "then";

/// Name of the slot that registers a continuation for the rejection.
pub const CATCH: &str = "catch";

/// Name of the slot that registers a continuation for the members of a multi-value settlement.
pub const SPREAD: &str = "spread";

/// Method slot through which a continuation of type `I` is registered on a promise.
pub type RegistrationSlot<I> = Method<RawPromise, I, RawPromise>;

/// The behaviour shared by every promise of one [`Runtime`][crate::Runtime].
///
/// Registering a continuation on any promise of the runtime goes through one of the three
/// slots here, so replacing the body of a slot changes how every promise registers that kind
/// of continuation. The [`Interceptor`] handed out by [`interceptor()`][Self::interceptor] is
/// the one that guards the slots against being intercepted twice.
///
/// The default slot bodies chain the continuation with
/// [`RawPromise::chain()`][RawPromise::chain], which never goes through the slots again.
pub struct Prototype {
    id: TargetId,
    then: Arc<RegistrationSlot<OnFulfilled>>,
    catch: Arc<RegistrationSlot<OnRejected>>,
    spread: Arc<RegistrationSlot<OnSpread>>,
    interceptor: Interceptor,
}

impl Prototype {
    pub(crate) fn new(interceptor: Interceptor) -> Self {
        let id = TargetId::next();

        Self {
            id,
            then: Arc::new(Method::new(
                id,
                THEN,
                |promise: &RawPromise, on_fulfilled: OnFulfilled| {
                    promise.chain(Some(on_fulfilled), None)
                },
            )),
            catch: Arc::new(Method::new(
                id,
                CATCH,
                |promise: &RawPromise, on_rejected: OnRejected| {
                    promise.chain(None, Some(on_rejected))
                },
            )),
            spread: Arc::new(Method::new(
                id,
                SPREAD,
                |promise: &RawPromise, on_spread: OnSpread| {
                    promise.all().chain(Some(on_spread.spread_over()), None)
                },
            )),
            interceptor,
        }
    }

    /// The identity of the prototype, shared by the keys of its slots.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The slot behind [`RawPromise::then()`][RawPromise::then].
    #[must_use]
    pub fn then_method(&self) -> &Arc<RegistrationSlot<OnFulfilled>> {
        &self.then
    }

    /// The slot behind [`RawPromise::catch()`][RawPromise::catch].
    #[must_use]
    pub fn catch_method(&self) -> &Arc<RegistrationSlot<OnRejected>> {
        &self.catch
    }

    /// The slot behind [`RawPromise::spread()`][RawPromise::spread].
    #[must_use]
    pub fn spread_method(&self) -> &Arc<RegistrationSlot<OnSpread>> {
        &self.spread
    }

    /// The interceptor that code wanting to replace the slots is expected to use.
    #[must_use]
    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
