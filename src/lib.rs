//! Asynchronous DNS name resolution with single-fire completion handlers.
//!
//! Submit a request with [`resolve`] (or [`Resolver::resolve`]); the
//! supplied handler is invoked exactly once with the outcome, whether the
//! facility settles the query at submission time or later from a task of
//! its own. [`lookup`] wraps the same machinery in a future.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

use std::io;

mod conf;
mod context;
mod facility;
mod hosts;
mod parse;
mod query;
mod resolver;
mod udp;

pub use crate::conf::{ResolvConf, ResolvOptions, ServerConf, Transport};
pub use crate::context::Handler;
pub use crate::facility::{CancelHandle, Facility, PendingQuery, Submission};
pub use crate::query::{AnswerRecord, Query, QueryResult, RecordType, Status};
pub use crate::resolver::{Resolved, Resolver};
pub use crate::udp::UdpFacility;

lazy_static! {
    static ref DEFAULT_RESOLVER: Resolver = Resolver::new();
}

/// Resolves `name` with the process-wide resolver. See [`Resolver::resolve`].
pub fn resolve<H: Handler>(name: &str, rtype: RecordType, handler: H) {
    DEFAULT_RESOLVER.resolve(name, rtype, handler)
}

/// Looks up `name` with the process-wide resolver. See [`Resolver::lookup`].
pub async fn lookup(name: &str, rtype: RecordType) -> io::Result<Resolved> {
    DEFAULT_RESOLVER.lookup(name, rtype).await
}
