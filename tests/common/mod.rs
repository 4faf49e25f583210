//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::time::Instant;

use ambassador::config::AmbassadorConfig;

/// Default config over `(name, address)` pairs with short retry delays.
pub fn config(endpoints: &[(&str, &str)]) -> AmbassadorConfig {
    let mut config = AmbassadorConfig::with_endpoints(endpoints.iter().copied());
    config.retry.base_delay_ms = 10;
    config.retry.max_delay_ms = 100;
    config
}

/// Records every address an operation was invoked with, and when.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, address: &str) {
        self.calls.lock().unwrap().push((address.to_string(), Instant::now()));
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(a, _)| a.clone()).collect()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

/// Start a TCP listener that accepts and drops every connection.
pub async fn start_tcp_endpoint() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
