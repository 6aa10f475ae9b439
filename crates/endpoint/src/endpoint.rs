//! The running endpoint: listener, connection tasks and queue.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::EndpointConfig;
use crate::decode::Decode;
use crate::dispatch::{self, Reader};
use crate::error::EndpointError;
use crate::listener::{self, Accept};
use crate::shutdown::Shutdown;

/// A running event endpoint.
///
/// Owns the listening socket (through the accept task) and the dispatch
/// queue for its whole life. Dropping it without calling [`stop`] still
/// fires the shutdown signal so no task outlives it.
///
/// [`stop`]: Endpoint::stop
pub struct Endpoint<E> {
    local_addr: Option<SocketAddr>,
    reader: Reader<E>,
    shutdown: Shutdown,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl<E: Send + 'static> Endpoint<E> {
    /// Binds `addr` (e.g. `"0.0.0.0:8040"`) and starts accepting producers
    /// with the default configuration.
    ///
    /// Returns as soon as the socket is bound. Bind failures are returned
    /// immediately and never retried.
    pub async fn launch<A, D>(addr: A, decoder: D) -> Result<Self, EndpointError>
    where
        A: ToSocketAddrs + fmt::Display,
        D: Decode<Event = E>,
    {
        Self::launch_with_config(addr, decoder, EndpointConfig::default()).await
    }

    /// Like [`launch`](Self::launch) with explicit configuration.
    pub async fn launch_with_config<A, D>(
        addr: A,
        decoder: D,
        config: EndpointConfig,
    ) -> Result<Self, EndpointError>
    where
        A: ToSocketAddrs + fmt::Display,
        D: Decode<Event = E>,
    {
        let address = addr.to_string();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| EndpointError::Bind { address, source })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "event endpoint listening");

        let mut endpoint = Self::serve(listener, decoder, config);
        endpoint.local_addr = Some(local_addr);
        Ok(endpoint)
    }

    /// Starts the accept loop over an already-bound acceptor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn serve<A, D>(acceptor: A, decoder: D, config: EndpointConfig) -> Self
    where
        A: Accept,
        D: Decode<Event = E>,
    {
        let shutdown = Shutdown::new();
        let (dispatcher, reader) = dispatch::channel(config.queue_capacity, shutdown.queue_closed());

        let accept_task = tokio::spawn(listener::accept_loop(
            acceptor,
            Arc::new(decoder),
            dispatcher,
            shutdown.clone(),
            config.accept_retry_delay(),
            shutdown.listener_closed().drop_guard(),
        ));

        Self {
            local_addr: None,
            reader,
            shutdown,
            accept_task: Mutex::new(Some(accept_task)),
        }
    }
}

impl<E> Endpoint<E> {
    /// The bound address, when started through [`launch`](Self::launch).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Handle to the dispatch queue. Every call returns a handle to the
    /// same queue; it reports end-of-stream once the endpoint stops.
    pub fn reader(&self) -> Reader<E> {
        self.reader.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Stops the endpoint: signals every connection task, closes the queue
    /// and closes the listening socket.
    ///
    /// Safe to call any number of times from any number of tasks; only the
    /// first call does the work and only it can fail, if the accept task
    /// holding the socket did not finish cleanly. Every call returns only
    /// after the listening socket is closed; later calls return `Ok`.
    pub async fn stop(&self) -> Result<(), EndpointError> {
        if !self.shutdown.trigger() {
            self.shutdown.listener_closed().cancelled().await;
            return Ok(());
        }
        info!("stopping event endpoint");

        let task = self.accept_task.lock().await.take();
        if let Some(task) = task {
            task.await
                .map_err(|e| EndpointError::Shutdown(e.to_string()))?;
        }

        info!("event endpoint stopped");
        Ok(())
    }
}

impl<E> Drop for Endpoint<E> {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
