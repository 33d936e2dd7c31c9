//! staticmem demo
//!
//! Writes three lines to an in-memory buffer through the generic stream
//! interface, reads them back line by line, dumps the buffer table, then
//! shows that the address is gone once the file is closed.

use std::io::{BufRead, BufReader, Seek, Write};
use std::sync::Arc;

use staticmem::{MemStore, ProtocolRegistry, StoreConfig, StreamAdapter, StreamContext};
use staticmem_io::{error_kind_to_str, error_to_error_kind, MemFile};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = StoreConfig::from_env()?;
    let store = Arc::new(MemStore::with_config(&config)?);
    info!(policy = ?store.policy(), "store created");

    let registry = ProtocolRegistry::new();
    let adapter = StreamAdapter::new(Arc::clone(&store));
    adapter.register(&registry)?;

    let context = StreamContext::new().with("custom", "foo");
    let handle = store.allocate()?;
    let url = adapter.address_for(handle)?;
    info!(url = %url, "opening");

    let mut file = MemFile::open(&registry, &url, &context)?;
    file.write_all(b"line1\n")?;
    file.write_all(b"line2\n")?;
    file.write_all(b"line3\n")?;
    file.rewind()?;

    {
        let mut reader = BufReader::new(&mut file);
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            print!("{line}");
            line.clear();
        }
    }

    println!("{:?}", String::from_utf8_lossy(&store.get(handle)?));
    println!("{}", serde_json::to_string_pretty(&store.snapshot())?);

    file.close()?;
    if let Err(e) = MemFile::open(&registry, &url, &context) {
        info!(url = %url, kind = error_kind_to_str(error_to_error_kind(&e)), "reopen after close rejected");
    }
    info!(live = store.len(), "done");
    Ok(())
}
