//! # CLI - interactive shell for the storage engine
//!
//! A REPL reading commands from stdin, executing them against an [`Engine`],
//! and printing results to stdout. Works equally well interactively or
//! piped (scripted testing).
//!
//! ## Commands
//!
//! ```text
//! SET key value   Insert or update a key-value pair
//! GET key         Look up a key (prints value or "(nil)")
//! DEL key         Delete a key (writes a tombstone)
//! STATS           Print engine diagnostics
//! EXIT / QUIT     Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables (see
//! [`config::EngineConfig::from_env`]):
//!
//! ```text
//! KVSTORE_ROOT_DIR            root data directory      (default: "./data")
//! KVSTORE_MEMTABLE_THRESHOLD  flush threshold in bytes  (default: 4 MiB)
//! KVSTORE_BLOCK_SIZE          SSTable block size        (default: 4 KiB)
//! KVSTORE_SPARSE_BUFFER       sparse-index channel size (default: 1024)
//! KVSTORE_BLOOM_BITS          Bloom filter bit count    (default: 8 Mbit)
//! KVSTORE_BLOOM_HASHES        Bloom filter hash count   (default: 7)
//! ```

use std::io::{self, BufRead, Write};

use anyhow::Result;
use config::EngineConfig;
use engine::Engine;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::from_env();
    let root_dir = config.root_data_dir.display().to_string();
    let engine = Engine::open(config)?;

    println!("storage engine started (root={root_dir})");
    println!("Commands: SET key value | GET key | DEL key | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: SET key value");
                        } else {
                            match engine.set(k.as_bytes().to_vec(), v.as_bytes().to_vec()) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR set failed: {e}"),
                            }
                        }
                    } else {
                        println!("ERR usage: SET key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match engine.get(k.as_bytes()) {
                            Ok(Some(v)) => println!("{}", String::from_utf8_lossy(&v)),
                            Ok(None) => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {e}"),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(k) = parts.next() {
                        match engine.delete(k.as_bytes().to_vec()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR del failed: {e}"),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "STATS" => {
                    println!(
                        "active_memtable_bytes={} sstables={} root={}",
                        engine.active_memtable_size(),
                        engine.sstable_count(),
                        engine.root_dir().display()
                    );
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {other}");
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    engine.close()?;
    Ok(())
}
