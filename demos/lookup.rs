use std::io;

use dns_resolve::{lookup, RecordType};

#[tokio::main]
async fn main() -> io::Result<()> {
    let resolved = lookup("www.bing.com", RecordType::A).await?;
    println!("address: {} (ttl {})", resolved.address, resolved.ttl);
    Ok(())
}
