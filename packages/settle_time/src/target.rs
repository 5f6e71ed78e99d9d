//! The promise libraries that can be profiled.

use std::sync::Arc;

use thenable::{Prototype, RawPromise, Runtime, Settled};

use crate::{Error, Result};

/// A promise library whose continuation registration can be profiled.
///
/// The library exposes the [`Prototype`] that all of its promises share and a way to create
/// one of its promises, which is used to check that the prototype really is the one its
/// promises register continuations through.
///
/// Implemented for [`thenable::Runtime`] and for `Option` of any implementation, so that a
/// library that may be missing can be passed as is.
pub trait PromiseType {
    /// The prototype shared by the promises of the library, if the library is available.
    fn prototype(&self) -> Option<Arc<Prototype>>;

    /// A promise created by the library's resolve operation, if the library can create one.
    fn resolve_probe(&self) -> Option<RawPromise>;
}

impl PromiseType for Runtime {
    fn prototype(&self) -> Option<Arc<Prototype>> {
        Some(Arc::clone(Self::prototype(self)))
    }

    fn resolve_probe(&self) -> Option<RawPromise> {
        Some(self.resolve_raw(().into_value()))
    }
}

impl<T: PromiseType> PromiseType for Option<T> {
    fn prototype(&self) -> Option<Arc<Prototype>> {
        self.as_ref().and_then(T::prototype)
    }

    fn resolve_probe(&self) -> Option<RawPromise> {
        self.as_ref().and_then(T::resolve_probe)
    }
}

/// Checks that `target` is a promise library whose promises share its prototype.
pub(crate) fn validate<T>(target: &T) -> Result<Arc<Prototype>>
where
    T: PromiseType + ?Sized,
{
    let prototype = target.prototype().ok_or(Error::LibraryNotFound)?;
    let probe = target.resolve_probe().ok_or(Error::TypeMismatch)?;

    if !Arc::ptr_eq(probe.prototype(), &prototype) {
        return Err(Error::TypeMismatch);
    }

    Ok(prototype)
}
