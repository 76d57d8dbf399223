//! UDP resolution facility built on the `domain` wire format.

use std::io;
use std::net::{IpAddr, SocketAddr};

use domain::base::iana::{Class, Rcode};
use domain::base::name::Dname;
use domain::base::{Message, MessageBuilder, Rtype};
use domain::rdata::{A, Aaaa};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

use crate::conf::ServerConf;
use crate::facility::{CancelHandle, Facility, PendingQuery, Submission};
use crate::hosts::lookup_static_host;
use crate::parse::parse_literal_ip;
use crate::query::{AnswerRecord, Query, QueryResult, RecordType, Status, TYPE_A, TYPE_AAAA};

/// Resolution facility performing one UDP exchange per query.
///
/// Literal addresses, hosts-file entries and rejected names complete at
/// submission time; everything else is answered from a worker task that
/// fires the pending channel exactly once.
pub struct UdpFacility {
    servers: Vec<ServerConf>,
}

impl UdpFacility {
    pub fn new(servers: Vec<ServerConf>) -> UdpFacility {
        UdpFacility { servers }
    }
}

impl Facility for UdpFacility {
    fn submit(&self, query: Query) -> Submission {
        if query.name.is_empty() {
            return Submission::Done(QueryResult::failed(Status::InvalidName));
        }
        if let Some(addr) = parse_literal_ip(&query.name) {
            return Submission::Done(QueryResult::answered(vec![record_for(addr)]));
        }
        if let Some(addr) = lookup_static_host(&query.name, query.rtype) {
            return Submission::Done(QueryResult::answered(vec![record_for(addr)]));
        }

        let name: Dname<Vec<u8>> = match query.name.parse() {
            Ok(name) => name,
            Err(_) => return Submission::Done(QueryResult::failed(Status::InvalidName)),
        };
        let server = match self.servers.iter().find(|s| s.transport.is_preferred()) {
            Some(server) => server.clone(),
            None => return Submission::Done(QueryResult::failed(Status::NetworkError)),
        };

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let result = exchange(&server, &name, query.rtype).await.unwrap_or_else(|e| {
                debug!("udp exchange with {} failed: {}", server.addr, e);
                QueryResult::failed(Status::NetworkError)
            });
            // The dispatcher may already have timed out and gone away.
            let _ = tx.send(result);
        });

        Submission::Pending(PendingQuery::new(
            rx,
            CancelHandle::new(handle.abort_handle()),
        ))
    }
}

fn record_for(addr: IpAddr) -> AnswerRecord {
    match addr {
        IpAddr::V4(v4) => AnswerRecord::new(TYPE_A, &v4.octets(), 0),
        IpAddr::V6(v6) => AnswerRecord::new(TYPE_AAAA, &v6.octets(), 0),
    }
}

fn rtype_for(rtype: RecordType) -> Rtype {
    match rtype {
        RecordType::A => Rtype::A,
        RecordType::Aaaa => Rtype::Aaaa,
    }
}

async fn exchange(
    server: &ServerConf,
    name: &Dname<Vec<u8>>,
    rtype: RecordType,
) -> io::Result<QueryResult> {
    let id = fastrand::u16(..);
    let msg = build_query(id, name, rtype)?;

    let bind: SocketAddr = if server.addr.is_ipv4() {
        "0.0.0.0:0".parse().unwrap()
    } else {
        "[::]:0".parse().unwrap()
    };
    let socket = UdpSocket::bind(bind).await?;
    socket.connect(server.addr).await?;
    socket.send(&msg).await?;

    let mut buf = vec![0u8; server.recv_size];
    loop {
        let n = socket.recv(&mut buf).await?;
        let response = match Message::from_octets(&buf[..n]) {
            Ok(response) => response,
            // Not a DNS message; keep waiting for the real answer.
            Err(_) => continue,
        };
        if response.header().id() != id || !response.header().qr() {
            continue;
        }
        return Ok(parse_response(&response));
    }
}

fn build_query(id: u16, name: &Dname<Vec<u8>>, rtype: RecordType) -> io::Result<Vec<u8>> {
    let mut builder = MessageBuilder::new_vec();
    builder.header_mut().set_id(id);
    builder.header_mut().set_rd(true);
    let mut question = builder.question();
    question
        .push((name, rtype_for(rtype)))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("building query: {}", e)))?;
    Ok(question.finish())
}

fn parse_response(response: &Message<&[u8]>) -> QueryResult {
    match response.header().rcode() {
        Rcode::NoError => {}
        // Name error keeps its own status so it never collides with the
        // rcode passthrough form.
        Rcode::NXDomain => return QueryResult::failed(Status::NameError),
        rcode => return QueryResult::failed(Status::ServerFailure(rcode.to_int())),
    }

    let answer = match response.answer() {
        Ok(answer) => answer,
        Err(_) => return QueryResult::failed(Status::NetworkError),
    };

    let mut records = Vec::new();
    for record in answer {
        let record = match record {
            Ok(record) => record,
            Err(_) => return QueryResult::failed(Status::NetworkError),
        };
        if record.class() != Class::In {
            continue;
        }
        match record.rtype() {
            Rtype::A => {
                if let Ok(Some(rec)) = record.to_record::<A>() {
                    records.push(AnswerRecord::new(
                        TYPE_A,
                        &rec.data().addr().octets(),
                        rec.ttl().as_secs(),
                    ));
                }
            }
            Rtype::Aaaa => {
                if let Ok(Some(rec)) = record.to_record::<Aaaa>() {
                    records.push(AnswerRecord::new(
                        TYPE_AAAA,
                        &rec.data().addr().octets(),
                        rec.ttl().as_secs(),
                    ));
                }
            }
            // Kept so the completion routine sees the answer in wire
            // order; only address rdata is ever rendered.
            rtype => records.push(AnswerRecord::new(rtype.to_int(), &[], record.ttl().as_secs())),
        }
    }

    QueryResult::answered(records)
}
