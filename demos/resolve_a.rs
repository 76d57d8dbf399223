use std::io;

use dns_resolve::{RecordType, Resolver, Status};
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> io::Result<()> {
    let resolver = Resolver::new();
    let (tx, rx) = oneshot::channel();
    resolver.resolve(
        "www.bing.com",
        RecordType::A,
        move |status: Status, address: &str, ttl: u32| {
            println!("status: {} | address: {} | ttl: {}", status.code(), address, ttl);
            let _ = tx.send(());
        },
    );
    rx.await
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "no completion"))
}
