//! Lookup of names pinned in the system hosts file.

use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::ops::Add;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::query::RecordType;

lazy_static! {
    static ref HOSTS: Mutex<Hosts> = Mutex::new(Hosts::new());
    static ref CACHE_MAX_AGE: Duration = Duration::new(5, 0);
}

#[derive(Debug)]
struct Hosts {
    by_name: HashMap<String, Vec<IpAddr>>,
    expire: SystemTime,
    path: String,
    mtime: SystemTime,
    size: u64,
}

impl Hosts {
    fn new() -> Hosts {
        let mut hosts = Hosts {
            by_name: HashMap::new(),
            expire: SystemTime::UNIX_EPOCH,
            path: get_path(),
            mtime: SystemTime::UNIX_EPOCH,
            size: 0,
        };
        hosts.update();
        hosts
    }

    fn update(&mut self) {
        let now = SystemTime::now();
        if now < self.expire && !self.by_name.is_empty() {
            return;
        }

        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(_) => return,
        };

        let mtime = meta.modified().unwrap_or_else(|_| SystemTime::now());
        if mtime == self.mtime && meta.len() == self.size && !self.by_name.is_empty() {
            self.expire = now.add(*CACHE_MAX_AGE);
            return;
        }

        if let Ok(data) = fs::read_to_string(&self.path) {
            self.by_name = parse_hosts(&data);
            self.mtime = mtime;
            self.size = meta.len();
            self.expire = now.add(*CACHE_MAX_AGE);
        }
    }

    fn lookup(&self, name: &str) -> Option<&Vec<IpAddr>> {
        self.by_name.get(&name.to_lowercase())
    }
}

fn parse_hosts(data: &str) -> HashMap<String, Vec<IpAddr>> {
    let mut by_name: HashMap<String, Vec<IpAddr>> = HashMap::new();
    for line in data.lines() {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let addr = match fields.next().and_then(|f| f.parse::<IpAddr>().ok()) {
            Some(addr) => addr,
            None => continue,
        };
        for name in fields {
            by_name
                .entry(name.to_lowercase())
                .or_insert_with(Vec::new)
                .push(addr);
        }
    }
    by_name
}

fn get_path() -> String {
    "/etc/hosts".to_string()
}

/// First hosts-file address for `name` matching the requested family.
pub fn lookup_static_host(name: &str, rtype: RecordType) -> Option<IpAddr> {
    let mut hosts = HOSTS.lock().unwrap();
    hosts.update();
    hosts.lookup(name).and_then(|addrs| {
        addrs.iter().copied().find(|addr| match rtype {
            RecordType::A => addr.is_ipv4(),
            RecordType::Aaaa => addr.is_ipv6(),
        })
    })
}
