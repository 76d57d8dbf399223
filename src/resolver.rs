//! Request dispatch and the caller-facing resolver.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;

use crate::conf::ResolvConf;
use crate::context::{Handler, QueryContext};
use crate::facility::{Facility, Submission};
use crate::query::{Query, QueryResult, RecordType, Status};
use crate::udp::UdpFacility;

/// A successful lookup: the rendered address and its time to live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub address: String,
    pub ttl: u32,
}

/// Dispatches resolution requests to a facility and guarantees the
/// completion contract: one handler invocation per request, on whichever
/// path finishes first.
pub struct Resolver {
    facility: Arc<dyn Facility>,
    timeout: Duration,
}

impl Resolver {
    /// Resolver over the system configuration.
    pub fn new() -> Resolver {
        Resolver::from_conf(ResolvConf::system())
    }

    pub fn from_conf(conf: ResolvConf) -> Resolver {
        let timeout = conf.options.timeout;
        Resolver {
            facility: Arc::new(UdpFacility::new(conf.servers)),
            timeout,
        }
    }

    /// Resolver over a caller-provided facility.
    pub fn with_facility(facility: Arc<dyn Facility>, timeout: Duration) -> Resolver {
        Resolver { facility, timeout }
    }

    /// Overrides the request deadline.
    pub fn timeout(mut self, timeout: Duration) -> Resolver {
        self.timeout = timeout;
        self
    }

    /// Submits a resolution request. `handler` is invoked exactly once
    /// with the outcome; nothing is reported through the return path,
    /// submission failures included.
    ///
    /// A request the facility settles at submission time completes on the
    /// calling task before `resolve` returns; every other request
    /// completes from a continuation task, so this must be called within
    /// a tokio runtime.
    pub fn resolve<H: Handler>(&self, name: &str, rtype: RecordType, handler: H) {
        debug!("resolving {} ({:?})", name, rtype);
        let mut ctx = QueryContext::new(rtype, Box::new(handler));
        match self.facility.submit(Query::new(name, rtype)) {
            Submission::Done(result) => ctx.complete(result),
            Submission::Pending(pending) => {
                ctx.set_cancel(pending.cancel);
                let deadline = self.timeout;
                let rx = pending.rx;
                tokio::spawn(async move {
                    let result = match time::timeout(deadline, rx).await {
                        Ok(Ok(result)) => result,
                        // Worker died without firing its channel.
                        Ok(Err(_)) => QueryResult::failed(Status::NetworkError),
                        Err(_) => {
                            ctx.cancel_pending();
                            QueryResult::failed(Status::TimedOut)
                        }
                    };
                    ctx.complete(result);
                });
            }
        }
    }

    /// Future form of [`Resolver::resolve`], completing with the first
    /// address record.
    pub async fn lookup(&self, name: &str, rtype: RecordType) -> io::Result<Resolved> {
        let (tx, rx) = oneshot::channel();
        self.resolve(name, rtype, move |status: Status, address: &str, ttl: u32| {
            let _ = tx.send((status, address.to_string(), ttl));
        });
        match rx.await {
            Ok((Status::Ok, address, ttl)) => Ok(Resolved { address, ttl }),
            Ok((status, _, _)) => Err(error_for(status)),
            Err(_) => Err(other("resolution completed without a status")),
        }
    }
}

impl Default for Resolver {
    fn default() -> Resolver {
        Resolver::new()
    }
}

fn error_for(status: Status) -> io::Error {
    let kind = match status {
        Status::NameError | Status::NoRecord => io::ErrorKind::NotFound,
        Status::TimedOut => io::ErrorKind::TimedOut,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, format!("{} (status {})", status, status.code()))
}

fn other(desc: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::{CancelHandle, PendingQuery};
    use crate::query::{AnswerRecord, TYPE_A};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Completes every query at submission time with a canned result.
    struct InlineFacility {
        status: Status,
        records: Vec<AnswerRecord>,
        submitted: AtomicUsize,
    }

    impl InlineFacility {
        fn new(status: Status, records: Vec<AnswerRecord>) -> InlineFacility {
            InlineFacility {
                status,
                records,
                submitted: AtomicUsize::new(0),
            }
        }
    }

    impl Facility for InlineFacility {
        fn submit(&self, _query: Query) -> Submission {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            let result = if self.status.is_ok() {
                QueryResult::answered(self.records.clone())
            } else {
                QueryResult::failed(self.status)
            };
            Submission::Done(result)
        }
    }

    /// Parks every query and exposes the senders for the test to fire.
    struct ParkedFacility {
        senders: Mutex<Vec<oneshot::Sender<QueryResult>>>,
    }

    impl ParkedFacility {
        fn new() -> ParkedFacility {
            ParkedFacility {
                senders: Mutex::new(Vec::new()),
            }
        }
    }

    impl Facility for ParkedFacility {
        fn submit(&self, _query: Query) -> Submission {
            let (tx, rx) = oneshot::channel();
            self.senders.lock().unwrap().push(tx);
            Submission::Pending(PendingQuery::new(rx, CancelHandle::detached()))
        }
    }

    #[test]
    fn inline_completion_runs_before_resolve_returns() {
        let facility = Arc::new(InlineFacility::new(
            Status::Ok,
            vec![AnswerRecord::new(TYPE_A, &[93, 184, 216, 34], 300)],
        ));
        let resolver = Resolver::with_facility(facility.clone(), Duration::from_secs(5));
        let (tx, rx) = std::sync::mpsc::channel();
        resolver.resolve(
            "example.test",
            RecordType::A,
            move |status: Status, address: &str, ttl: u32| {
                tx.send((status, address.to_string(), ttl)).unwrap();
            },
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            (Status::Ok, "93.184.216.34".to_string(), 300)
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(facility.submitted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn submission_failure_reaches_the_handler() {
        let facility = Arc::new(InlineFacility::new(Status::NameError, Vec::new()));
        let resolver = Resolver::with_facility(facility, Duration::from_secs(5));
        let (tx, rx) = std::sync::mpsc::channel();
        resolver.resolve(
            "nxdomain.test",
            RecordType::A,
            move |status: Status, address: &str, ttl: u32| {
                tx.send((status.code(), address.to_string(), ttl)).unwrap();
            },
        );
        assert_eq!(rx.try_recv().unwrap(), (9003, String::new(), 0));
    }

    #[tokio::test]
    async fn pending_completion_fires_once() {
        let facility = Arc::new(ParkedFacility::new());
        let resolver = Resolver::with_facility(facility.clone(), Duration::from_secs(5));
        let (tx, mut rx) = mpsc::unbounded_channel();
        resolver.resolve(
            "example.test",
            RecordType::A,
            move |status: Status, address: &str, ttl: u32| {
                tx.send((status, address.to_string(), ttl)).unwrap();
            },
        );
        let sender = facility.senders.lock().unwrap().pop().unwrap();
        sender
            .send(QueryResult::answered(vec![AnswerRecord::new(
                TYPE_A,
                &[10, 0, 0, 1],
                60,
            )]))
            .unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            (Status::Ok, "10.0.0.1".to_string(), 60)
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_completes_exactly_once() {
        let facility = Arc::new(ParkedFacility::new());
        let resolver = Resolver::with_facility(facility.clone(), Duration::from_secs(5))
            .timeout(Duration::from_millis(50));
        let (tx, mut rx) = mpsc::unbounded_channel();
        resolver.resolve(
            "hung.test",
            RecordType::A,
            move |status: Status, address: &str, ttl: u32| {
                tx.send((status, address.to_string(), ttl)).unwrap();
            },
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            (Status::TimedOut, String::new(), 0)
        );
        // The parked sender is still alive but its receiver is gone; the
        // handler must not fire a second time.
        let sender = facility.senders.lock().unwrap().pop().unwrap();
        assert!(sender.send(QueryResult::failed(Status::NetworkError)).is_err());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_worker_reports_network_error() {
        struct DroppingFacility;

        impl Facility for DroppingFacility {
            fn submit(&self, _query: Query) -> Submission {
                let (_tx, rx) = oneshot::channel();
                drop(_tx);
                Submission::Pending(PendingQuery::new(rx, CancelHandle::detached()))
            }
        }

        let resolver =
            Resolver::with_facility(Arc::new(DroppingFacility), Duration::from_secs(5));
        let (tx, mut rx) = mpsc::unbounded_channel();
        resolver.resolve(
            "example.test",
            RecordType::A,
            move |status: Status, address: &str, ttl: u32| {
                tx.send((status, address.to_string(), ttl)).unwrap();
            },
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            (Status::NetworkError, String::new(), 0)
        );
    }

    #[tokio::test]
    async fn concurrent_requests_pair_contexts_one_to_one() {
        let facility = Arc::new(ParkedFacility::new());
        let resolver = Resolver::with_facility(facility.clone(), Duration::from_secs(5));
        let guard = Arc::new(());
        let (tx, mut rx) = mpsc::unbounded_channel();
        for i in 0..8 {
            let tx = tx.clone();
            let guard = guard.clone();
            resolver.resolve(
                &format!("host{}.test", i),
                RecordType::A,
                move |status: Status, _address: &str, _ttl: u32| {
                    drop(guard);
                    tx.send(status).unwrap();
                },
            );
        }
        drop(tx);

        let senders: Vec<_> = facility.senders.lock().unwrap().drain(..).collect();
        assert_eq!(senders.len(), 8);
        for sender in senders {
            sender
                .send(QueryResult::answered(vec![AnswerRecord::new(
                    TYPE_A,
                    &[10, 0, 0, 1],
                    30,
                )]))
                .unwrap();
        }

        let mut fired = 0;
        while let Some(status) = rx.recv().await {
            assert_eq!(status, Status::Ok);
            fired += 1;
        }
        assert_eq!(fired, 8);
        // Every context, and the handler guard it owned, has been released.
        assert_eq!(Arc::strong_count(&guard), 1);
    }

    #[tokio::test]
    async fn lookup_resolves_through_the_same_path() {
        let facility = Arc::new(InlineFacility::new(
            Status::Ok,
            vec![AnswerRecord::new(TYPE_A, &[93, 184, 216, 34], 300)],
        ));
        let resolver = Resolver::with_facility(facility, Duration::from_secs(5));
        let resolved = resolver.lookup("example.test", RecordType::A).await.unwrap();
        assert_eq!(
            resolved,
            Resolved {
                address: "93.184.216.34".to_string(),
                ttl: 300
            }
        );
    }

    #[tokio::test]
    async fn lookup_surfaces_failure_statuses() {
        let facility = Arc::new(InlineFacility::new(Status::NameError, Vec::new()));
        let resolver = Resolver::with_facility(facility, Duration::from_secs(5));
        let err = resolver
            .lookup("nxdomain.test", RecordType::A)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
