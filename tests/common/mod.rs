//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proxy_event_adapter::{AdapterConfig, HttpServer, ProxyAdapter, ProxyRequest, Shutdown};
use tokio::net::TcpListener;

/// Start an [`HttpServer`] for `adapter` on an ephemeral loopback port.
pub async fn start_server(config: AdapterConfig, adapter: ProxyAdapter) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, adapter);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}

/// Serve the bare adapter router, without the server middleware stack.
pub async fn start_bare(adapter: ProxyAdapter) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, adapter.into_router()).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Client that never reuses connections, so each test request is isolated.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Slot a handler writes the event it saw into.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Option<ProxyRequest>>>);

impl Captured {
    pub fn store(&self, request: &ProxyRequest) {
        *self.0.lock().unwrap() = Some(request.clone());
    }

    pub fn take(&self) -> ProxyRequest {
        self.0.lock().unwrap().take().expect("handler was not called")
    }
}
