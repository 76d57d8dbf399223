//! Per-request state and the completion routine.

use crate::facility::CancelHandle;
use crate::parse::format_address;
use crate::query::{QueryResult, RecordType, Status};

/// Caller-supplied completion capability, invoked exactly once per request.
///
/// The receiver is consumed, so a context cannot fire its handler twice.
/// Implemented for any `FnOnce(Status, &str, u32)` closure.
pub trait Handler: Send + 'static {
    /// `address` is empty unless `status` is [`Status::Ok`]; `ttl` is the
    /// record's time to live in seconds, 0 on failure.
    fn on_complete(self: Box<Self>, status: Status, address: &str, ttl: u32);
}

impl<F> Handler for F
where
    F: FnOnce(Status, &str, u32) + Send + 'static,
{
    fn on_complete(self: Box<Self>, status: Status, address: &str, ttl: u32) {
        (*self)(status, address, ttl)
    }
}

/// State of one in-flight request, created at dispatch and consumed by
/// [`QueryContext::complete`]. Owning it by value keeps allocation and
/// release in strict 1:1 correspondence no matter which path finishes the
/// request.
pub(crate) struct QueryContext {
    rtype: RecordType,
    handler: Box<dyn Handler>,
    cancel: Option<CancelHandle>,
}

impl QueryContext {
    pub(crate) fn new(rtype: RecordType, handler: Box<dyn Handler>) -> QueryContext {
        QueryContext {
            rtype,
            handler,
            cancel: None,
        }
    }

    pub(crate) fn set_cancel(&mut self, cancel: CancelHandle) {
        self.cancel = Some(cancel);
    }

    /// Abandon the facility's in-flight work for this request.
    pub(crate) fn cancel_pending(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }

    /// The single completion routine. Runs on the dispatching task for
    /// inline completions and on the continuation task otherwise; either
    /// way it fires the handler once and the context and record list are
    /// dropped on every exit path.
    pub(crate) fn complete(self, result: QueryResult) {
        let QueryResult { status, records } = result;
        if !status.is_ok() {
            return self.handler.on_complete(status, "", 0);
        }

        for record in &records {
            if !record.is_address() {
                continue;
            }
            // Only the first address record is surfaced.
            return match format_address(record.rtype, &record.rdata) {
                Some(text) => self.handler.on_complete(Status::Ok, &text, record.ttl),
                None => {
                    error!(
                        "address record (type {}) carries {} bytes of rdata",
                        record.rtype,
                        record.rdata.len()
                    );
                    self.handler.on_complete(Status::BadAddress, "", 0)
                }
            };
        }

        debug!("no address record in answer to {:?} query", self.rtype);
        self.handler.on_complete(Status::NoRecord, "", 0)
    }
}
