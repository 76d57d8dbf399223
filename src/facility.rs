//! The seam to the underlying resolution facility.

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::query::{Query, QueryResult};

/// A resolution facility accepts a query and either knows the outcome at
/// submission time or delivers it later from a task of its own.
///
/// A pending facility must fire its channel exactly once; a dropped sender
/// is reported to the caller as a network error.
pub trait Facility: Send + Sync + 'static {
    fn submit(&self, query: Query) -> Submission;
}

/// Outcome of submitting a query.
pub enum Submission {
    /// The outcome is already known; the dispatcher completes inline.
    Done(QueryResult),
    /// The facility took the query; completion arrives on the channel.
    Pending(PendingQuery),
}

/// A submitted query whose completion is still outstanding.
pub struct PendingQuery {
    pub rx: oneshot::Receiver<QueryResult>,
    pub cancel: CancelHandle,
}

impl PendingQuery {
    pub fn new(rx: oneshot::Receiver<QueryResult>, cancel: CancelHandle) -> PendingQuery {
        PendingQuery { rx, cancel }
    }
}

/// Handle to abandon the facility's in-flight work. Valid only while the
/// request is pending; not part of the caller-facing API.
#[derive(Debug)]
pub struct CancelHandle(Option<AbortHandle>);

impl CancelHandle {
    pub fn new(handle: AbortHandle) -> CancelHandle {
        CancelHandle(Some(handle))
    }

    /// A handle for facilities with nothing to abort.
    pub fn detached() -> CancelHandle {
        CancelHandle(None)
    }

    pub(crate) fn cancel(&self) {
        if let Some(handle) = &self.0 {
            handle.abort();
        }
    }
}
