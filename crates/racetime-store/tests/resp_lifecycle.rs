//! Connection lifecycle tests for [`RedisLiveStore`] against a minimal
//! in-process RESP2 responder.
//!
//! The responder understands just enough of the protocol for the store:
//! `PING`, `SET`, `GET` and `QUIT`, plus the handshake commands a client
//! may send on connect (`SELECT`, `CLIENT ...`). Every accepted connection
//! is counted so tests can observe reconnects.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use racetime_store::{LiveStore, RedisLiveStore, StoreSettings};
use racetime_types::Snapshot;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

type SharedValue = Arc<Mutex<Option<Vec<u8>>>>;

/// Read one RESP array-of-bulk-strings command. `None` on EOF or garbage.
async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<Vec<u8>>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(buf);
    }
    Some(args)
}

fn bulk(value: Option<&[u8]>) -> Vec<u8> {
    match value {
        Some(v) => {
            let mut out = format!("${}\r\n", v.len()).into_bytes();
            out.extend_from_slice(v);
            out.extend_from_slice(b"\r\n");
            out
        }
        None => b"$-1\r\n".to_vec(),
    }
}

fn upper(arg: Option<&Vec<u8>>) -> String {
    arg.map(|a| String::from_utf8_lossy(a).to_uppercase())
        .unwrap_or_default()
}

async fn serve_connection(socket: TcpStream, value: SharedValue) {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);

    while let Some(args) = read_command(&mut reader).await {
        let reply = match upper(args.first()).as_str() {
            "PING" => b"+PONG\r\n".to_vec(),
            "SET" => {
                *value.lock().unwrap() = args.get(2).cloned();
                b"+OK\r\n".to_vec()
            }
            "GET" => {
                let current = value.lock().unwrap().clone();
                bulk(current.as_deref())
            }
            "CLIENT" if upper(args.get(1)) == "ID" => b":1\r\n".to_vec(),
            "QUIT" => {
                write.write_all(b"+OK\r\n").await.ok();
                return;
            }
            _ => b"+OK\r\n".to_vec(),
        };
        if write.write_all(&reply).await.is_err() {
            return;
        }
    }
}

/// Start the responder. Returns its address and the accepted-connection count.
async fn spawn_responder() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let value = SharedValue::default();

    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve_connection(socket, value.clone()));
        }
    });

    (addr, accepted)
}

fn store_for(addr: SocketAddr) -> RedisLiveStore {
    let settings = StoreSettings::new(&format!("redis://{addr}"))
        .with_connect_timeout(Duration::from_secs(1))
        .with_command_timeout(Duration::from_secs(1));
    RedisLiveStore::new(&settings).expect("valid URL")
}

fn snapshot(timestamp: &str) -> Snapshot {
    Snapshot {
        timestamp: timestamp.to_owned(),
        positions: Vec::new(),
        leaderboard: Vec::new(),
        session: None,
    }
}

#[tokio::test]
async fn get_before_any_set_is_absent() {
    let (addr, _) = spawn_responder().await;
    let store = store_for(addr);

    assert!(store.get().await.unwrap().is_none());
    store.close().await;
}

#[tokio::test]
async fn set_then_get_round_trips_through_the_wire() {
    let (addr, accepted) = spawn_responder().await;
    let store = store_for(addr);

    assert!(store.ping().await);
    store.set(&snapshot("2024-01-01T12:00:00Z")).await.unwrap();
    store.set(&snapshot("2024-01-01T12:00:01Z")).await.unwrap();

    let live = store.get().await.unwrap();
    assert_eq!(live, Some(snapshot("2024-01-01T12:00:01Z")));
    assert_eq!(accepted.load(Ordering::SeqCst), 1, "one shared connection");
    store.close().await;
}

#[tokio::test]
async fn close_then_use_reopens_transparently() {
    let (addr, accepted) = spawn_responder().await;
    let store = store_for(addr);

    assert!(!store.is_open().await);
    store.set(&snapshot("before-close")).await.unwrap();
    assert!(store.is_open().await);
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    store.close().await;
    store.close().await;
    assert!(!store.is_open().await);

    let live = store.get().await.unwrap();
    assert_eq!(live.map(|s| s.timestamp).as_deref(), Some("before-close"));
    assert!(store.is_open().await);
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    store.close().await;
}
