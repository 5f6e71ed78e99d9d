use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use thenable::Continuation;
use tracing::trace;

use crate::pal::{Platform, PlatformFacade};
use crate::{Attribution, ResultSink};

/// Wraps continuations so that running them records their elapsed time in a [`ResultSink`].
#[derive(Clone, Debug)]
pub(crate) struct Timer {
    attribution: Attribution,
    platform: PlatformFacade,
    sink: ResultSink,
}

impl Timer {
    pub(crate) fn new(
        attribution: Attribution,
        platform: PlatformFacade,
        sink: ResultSink,
    ) -> Self {
        Self {
            attribution,
            platform,
            sink,
        }
    }

    pub(crate) fn sink(&self) -> &ResultSink {
        &self.sink
    }

    pub(crate) fn attribution(&self) -> Attribution {
        self.attribution
    }

    /// Returns a continuation with the same label that times `continuation`.
    ///
    /// The clock starts now, when the continuation is registered. Anonymous continuations are
    /// returned unchanged because they are never recorded.
    pub(crate) fn wrap<I: 'static>(&self, continuation: Continuation<I>) -> Continuation<I> {
        if continuation.is_anonymous() {
            trace!("anonymous continuation is not timed");
            return continuation;
        }

        let registered = self.platform.now();
        let label: Arc<str> = Arc::from(continuation.label());
        let timer = self.clone();

        Continuation::new(Arc::clone(&label), move |input: I| {
            let settled = timer.platform.now();

            if timer.attribution == Attribution::Settlement {
                timer.record(&label, registered, settled);
            }

            let timer = timer.clone();
            let label = Arc::clone(&label);

            continuation.invoke(input).map(move |outcome| {
                match timer.attribution {
                    Attribution::Completion => {
                        timer.record(&label, registered, timer.platform.now());
                    }
                    Attribution::Execution => timer.record(&label, settled, timer.platform.now()),
                    Attribution::Settlement => {}
                }

                outcome
            })
        })
    }

    fn record(&self, label: &str, start: Instant, end: Instant) {
        self.sink.record(label, end.saturating_duration_since(start));
    }
}
