//! Raw HTTP listener.
//!
//! Binds one TCP port, accepts connections concurrently (one task per
//! connection) and hands every request to a [`RequestHandler`]. Unbinding
//! closes the listening socket on the spot and stops the accept loop; open
//! connections finish their in-flight request and are then closed.

use super::request::NormalizedRequest;
use super::response::StubResponse;
use crate::error::StubError;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::future::poll_fn;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::Poll;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Callback invoked once per accepted request.
///
/// Runs synchronously from the point of view of the request: the returned
/// response is written back before the exchange completes.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, port: u16, request: &NormalizedRequest) -> StubResponse;
}

/// Listening socket shared with the accept loop, so that unbinding can close
/// it without waiting for the loop to be polled.
type SocketSlot = Arc<Mutex<Option<TcpListener>>>;

/// A bound listener. Dropping it releases the port.
pub struct Listener {
    local_addr: SocketAddr,
    socket: SocketSlot,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Listener {
    /// Bind `host:port` and start serving requests with `handler`.
    ///
    /// Port 0 binds an ephemeral port; see [`Listener::local_addr`].
    pub async fn bind(
        host: &str,
        port: u16,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<Self, StubError> {
        let listener =
            TcpListener::bind((host, port))
                .await
                .map_err(|e| StubError::PortUnavailable {
                    port,
                    reason: e.to_string(),
                })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| StubError::PortUnavailable {
                port,
                reason: e.to_string(),
            })?;

        info!("Listener bound to {}", local_addr);

        let socket: SocketSlot = Arc::new(Mutex::new(Some(listener)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(
            Arc::clone(&socket),
            local_addr.port(),
            handler,
            shutdown_rx,
        ));

        Ok(Self {
            local_addr,
            socket,
            shutdown_tx,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Close the listening socket and signal the accept loop to stop.
    ///
    /// The port is free once this returns. Idempotent and callable from any
    /// thread, including from outside a runtime.
    pub fn unbind(&self) {
        let socket = self.socket.lock().take();
        drop(socket);
        self.shutdown_tx.send_replace(true);
    }

    /// Wait for the accept loop to exit. Does not close the socket by itself.
    pub async fn join(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Accept loop on {} ended abnormally: {}", self.local_addr, e);
            }
        }
    }

    /// Stop accepting and wait until the listening socket has been released.
    pub async fn shutdown(&self) {
        self.unbind();
        self.join().await;
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.unbind();
    }
}

async fn accept_loop(
    socket: SocketSlot,
    port: u16,
    handler: Arc<dyn RequestHandler>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        // The slot lock is only held for a single poll
        let accept = poll_fn(|cx| match socket.lock().as_ref() {
            Some(listener) => listener.poll_accept(cx).map(Some),
            None => Poll::Ready(None),
        });

        tokio::select! {
            result = accept => {
                match result {
                    None => {
                        info!("Listener on port {} closed", port);
                        break;
                    }
                    Some(Ok((stream, addr))) => {
                        debug!("Accepted connection from {} on port {}", addr, port);
                        let handler = Arc::clone(&handler);
                        let shutdown_rx = shutdown_rx.clone();
                        tokio::spawn(serve_connection(stream, port, handler, shutdown_rx));
                    }
                    Some(Err(e)) => {
                        error!("Accept error on port {}: {}", port, e);
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("Listener on port {} shutting down", port);
                break;
            }
        }
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    port: u16,
    handler: Arc<dyn RequestHandler>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let handler = Arc::clone(&handler);
        async move {
            let request = NormalizedRequest::from_hyper(req).await;
            Ok::<_, Infallible>(handler.handle(port, &request).into_hyper())
        }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    // Already stopped before this connection got going
    if *shutdown_rx.borrow_and_update() {
        conn.as_mut().graceful_shutdown();
    }

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!("Connection error on port {}: {}", port, e);
            }
            return;
        }
        _ = shutdown_rx.changed() => {
            conn.as_mut().graceful_shutdown();
        }
    }

    if let Err(e) = conn.await {
        debug!("Connection error on port {} during shutdown: {}", port, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl RequestHandler for Fixed {
        fn handle(&self, _port: u16, request: &NormalizedRequest) -> StubResponse {
            StubResponse::new(200, format!("{} {}", request.method, request.path))
        }
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port_and_shutdown() {
        let listener = Listener::bind("127.0.0.1", 0, Arc::new(Fixed)).await.unwrap();
        let port = listener.port();
        assert_ne!(port, 0);

        listener.shutdown().await;
        // Released: the same port can be bound again right away
        let again = TcpListener::bind(("127.0.0.1", port)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_port_unavailable() {
        let first = Listener::bind("127.0.0.1", 0, Arc::new(Fixed)).await.unwrap();
        let err = Listener::bind("127.0.0.1", first.port(), Arc::new(Fixed))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StubError::PortUnavailable { port, .. } if port == first.port()));
    }

    #[tokio::test]
    async fn test_unbind_frees_port_immediately() {
        let listener = Listener::bind("127.0.0.1", 0, Arc::new(Fixed)).await.unwrap();
        let port = listener.port();

        // No await between closing and rebinding: the accept loop never runs
        listener.unbind();
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());

        listener.join().await;
    }

    #[test]
    fn test_drop_outside_runtime_frees_port() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let listener = runtime
            .block_on(Listener::bind("127.0.0.1", 0, Arc::new(Fixed)))
            .unwrap();
        let port = listener.port();

        drop(listener);
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let listener = Listener::bind("127.0.0.1", 0, Arc::new(Fixed)).await.unwrap();
        listener.unbind();
        listener.shutdown().await;
        listener.shutdown().await;
        listener.unbind();
    }
}
