//! Resolver configuration, read from /etc/resolv.conf.

use std::fs::File;
use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Options applied to every request made with a configuration.
#[derive(Clone, Debug)]
pub struct ResolvOptions {
    /// Wait before giving up on a query. Once elapsed the request
    /// completes with a timeout status.
    pub timeout: Duration,
}

impl Default for ResolvOptions {
    fn default() -> Self {
        ResolvOptions {
            timeout: Duration::new(5, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Transport {
    Udp,
    Tcp,
}

impl Transport {
    pub fn is_preferred(self) -> bool {
        match self {
            Transport::Udp => true,
            Transport::Tcp => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConf {
    pub addr: SocketAddr,
    pub transport: Transport,
    pub recv_size: usize,
}

impl ServerConf {
    pub fn new(addr: SocketAddr, transport: Transport) -> Self {
        ServerConf {
            addr,
            transport,
            recv_size: 1232,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvConf {
    pub servers: Vec<ServerConf>,
    pub options: ResolvOptions,
}

impl ResolvConf {
    pub fn new() -> Self {
        ResolvConf {
            servers: Vec::new(),
            options: ResolvOptions::default(),
        }
    }

    /// Configuration from the system resolver file, falling back to
    /// loopback servers when it cannot be read.
    pub fn system() -> Self {
        let mut res = ResolvConf::new();
        let _ = res.parse_file("/etc/resolv.conf");
        res.finalize();
        res
    }

    /// Installs loopback defaults when no server is configured.
    pub fn finalize(&mut self) {
        if self.servers.is_empty() {
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 53);
            self.servers.push(ServerConf::new(addr, Transport::Udp));
            self.servers.push(ServerConf::new(addr, Transport::Tcp));
        }
    }

    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let mut data = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut data)?;
        let parsed = resolv_conf::Config::parse(&data).map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("error parsing resolv.conf: {:?}", e),
            )
        })?;
        self.fill(parsed);
        Ok(())
    }

    fn fill(&mut self, parsed: resolv_conf::Config) {
        for ip in parsed.get_nameservers_or_local() {
            let ip: IpAddr = ip.into();
            self.servers
                .push(ServerConf::new(SocketAddr::from((ip, 53)), Transport::Udp));
            self.servers
                .push(ServerConf::new(SocketAddr::from((ip, 53)), Transport::Tcp));
        }
        self.options.timeout = Duration::from_secs(parsed.timeout as u64);
    }
}

impl Default for ResolvConf {
    fn default() -> Self {
        Self::new()
    }
}
