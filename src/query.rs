//! Data model shared by the dispatcher, the facility and the completion
//! routine.

use std::fmt;

use smallvec::SmallVec;

/// Record type number of an IPv4 address record.
pub const TYPE_A: u16 = 1;
/// Record type number of an IPv6 address record.
pub const TYPE_AAAA: u16 = 28;

/// Address family selector for a resolution request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    pub fn to_int(self) -> u16 {
        match self {
            RecordType::A => TYPE_A,
            RecordType::Aaaa => TYPE_AAAA,
        }
    }
}

/// Completion status delivered to the caller's handler.
///
/// Every request completes with exactly one status. Numeric codes are
/// distinct across all variants: server rcodes map to 9000 + rcode,
/// locally generated statuses start at 9501.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// An address record was found and rendered.
    Ok,
    /// The server answered that the name does not exist.
    NameError,
    /// The server answered with a non-success rcode other than name error.
    ServerFailure(u8),
    /// The response carried no address record.
    NoRecord,
    /// No completion arrived within the request deadline.
    TimedOut,
    /// The submission or the exchange with the server failed.
    NetworkError,
    /// The name was rejected at submission time.
    InvalidName,
    /// Address data in the answer could not be rendered as text.
    BadAddress,
}

impl Status {
    /// Numeric form of the status, the stable surface of the completion
    /// contract.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 0,
            Status::NameError => 9003,
            Status::ServerFailure(rcode) => 9000 + u16::from(rcode),
            Status::NoRecord => 9501,
            Status::TimedOut => 9502,
            Status::NetworkError => 9503,
            Status::InvalidName => 9504,
            Status::BadAddress => 9505,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("ok"),
            Status::NameError => f.write_str("name does not exist"),
            Status::ServerFailure(rcode) => write!(f, "server failure (rcode {})", rcode),
            Status::NoRecord => f.write_str("no address record in response"),
            Status::TimedOut => f.write_str("request timed out"),
            Status::NetworkError => f.write_str("network error"),
            Status::InvalidName => f.write_str("invalid name"),
            Status::BadAddress => f.write_str("malformed address record"),
        }
    }
}

/// One resource record from the facility's answer, in returned order.
#[derive(Clone, Debug)]
pub struct AnswerRecord {
    pub rtype: u16,                // record type number from the wire
    pub rdata: SmallVec<[u8; 16]>, // raw rdata; 4 or 16 bytes for address records
    pub ttl: u32,                  // time to live in seconds
}

impl AnswerRecord {
    pub fn new(rtype: u16, rdata: &[u8], ttl: u32) -> AnswerRecord {
        AnswerRecord {
            rtype,
            rdata: SmallVec::from_slice(rdata),
            ttl,
        }
    }

    /// Whether this record is one the completion routine surfaces.
    pub fn is_address(&self) -> bool {
        self.rtype == TYPE_A || self.rtype == TYPE_AAAA
    }
}

/// A resolution request as handed to the facility.
#[derive(Clone, Debug)]
pub struct Query {
    pub name: String,
    pub rtype: RecordType,
}

impl Query {
    pub fn new(name: &str, rtype: RecordType) -> Query {
        Query {
            name: name.to_string(),
            rtype,
        }
    }
}

/// What the facility completed with: a status and the answer records.
#[derive(Debug)]
pub struct QueryResult {
    pub status: Status,
    pub records: Vec<AnswerRecord>,
}

impl QueryResult {
    pub fn answered(records: Vec<AnswerRecord>) -> QueryResult {
        QueryResult {
            status: Status::Ok,
            records,
        }
    }

    pub fn failed(status: Status) -> QueryResult {
        QueryResult {
            status,
            records: Vec::new(),
        }
    }
}
