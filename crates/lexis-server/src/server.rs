use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lexis_store::{default_vocabulary, load_snapshot, save_snapshot, InMemoryWordStore, WordStore};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::ConnectionHandler;
use crate::hooks::{NoOpObserver, ServerObserver};

/// Extra time allowed for the accept task to exit after the handler grace
/// period has run out.
const ACCEPT_JOIN_MARGIN: Duration = Duration::from_secs(1);

/// Pause after a failed `accept` so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct Running {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

struct Lifecycle {
    state: ServerState,
    running: Option<Running>,
}

/// Dictionary server: owns the shared store and the accept loop.
///
/// Lifecycle is `Stopped -> Starting -> Running -> Stopping -> Stopped`.
/// Each accepted connection gets its own task; at most `max_connections`
/// of them serve requests at once, the rest wait for a free slot.
pub struct DictionaryServer {
    config: ServerConfig,
    store: Arc<dyn WordStore>,
    observer: Arc<dyn ServerObserver>,
    connected: Arc<AtomicUsize>,
    lifecycle: Mutex<Lifecycle>,
}

impl DictionaryServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryWordStore::new()))
    }

    pub fn with_store(config: ServerConfig, store: Arc<dyn WordStore>) -> Self {
        Self {
            config,
            store,
            observer: Arc::new(NoOpObserver),
            connected: Arc::new(AtomicUsize::new(0)),
            lifecycle: Mutex::new(Lifecycle {
                state: ServerState::Stopped,
                running: None,
            }),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ServerObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn WordStore> {
        &self.store
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.lock().expect("lock poisoned").state
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    /// Address the listener is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        let lifecycle = self.lifecycle.lock().expect("lock poisoned");
        lifecycle.running.as_ref().map(|r| r.local_addr)
    }

    /// Number of currently connected clients, including those waiting for a
    /// worker slot.
    pub fn connected_clients(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }

    /// Load initial data, bind the listener, and start accepting.
    ///
    /// Fails with [`ServerError::AlreadyRunning`] unless the server is
    /// stopped. A bind failure leaves the server stopped.
    pub async fn start(&self) -> ServerResult<SocketAddr> {
        self.config.validate()?;
        {
            let mut lifecycle = self.lifecycle.lock().expect("lock poisoned");
            if lifecycle.state != ServerState::Stopped {
                return Err(ServerError::AlreadyRunning);
            }
            lifecycle.state = ServerState::Starting;
        }

        match self.bind_and_spawn().await {
            Ok(running) => {
                let addr = running.local_addr;
                {
                    let mut lifecycle = self.lifecycle.lock().expect("lock poisoned");
                    lifecycle.state = ServerState::Running;
                    lifecycle.running = Some(running);
                }
                info!(%addr, words = self.store.len(), "dictionary server started");
                self.observer.on_started(addr);
                Ok(addr)
            }
            Err(e) => {
                self.set_state(ServerState::Stopped);
                error!(error = %e, "server failed to start");
                Err(e)
            }
        }
    }

    async fn bind_and_spawn(&self) -> ServerResult<Running> {
        self.load_initial_data().await?;

        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let acceptor = Acceptor {
            store: Arc::clone(&self.store),
            observer: Arc::clone(&self.observer),
            connected: Arc::clone(&self.connected),
            workers: Arc::new(Semaphore::new(self.config.max_connections)),
            grace: self.config.shutdown_grace(),
        };
        let accept_task = tokio::spawn(acceptor.run(listener, shutdown_rx));

        Ok(Running {
            local_addr,
            shutdown,
            accept_task,
        })
    }

    /// Load the configured snapshot, or fall back to the built-in vocabulary
    /// when there is none or it cannot be read.
    async fn load_initial_data(&self) -> ServerResult<()> {
        if let Some(path) = self.config.snapshot_path.clone() {
            let store = Arc::clone(&self.store);
            let result = tokio::task::spawn_blocking({
                let path = path.clone();
                move || load_snapshot(store.as_ref(), &path)
            })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

            match result {
                Ok(_) => return Ok(()),
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "could not load snapshot, using default vocabulary"
                ),
            }
        }

        let added = default_vocabulary()
            .into_iter()
            .filter(|entry| self.store.add(entry.word(), entry.meanings()))
            .count();
        info!(added, "default vocabulary loaded");
        Ok(())
    }

    /// Stop accepting, let in-flight handlers finish within the grace
    /// period, then abort whatever is left. No-op unless running.
    pub async fn stop(&self) -> ServerResult<()> {
        let running = {
            let mut lifecycle = self.lifecycle.lock().expect("lock poisoned");
            if lifecycle.state != ServerState::Running {
                return Ok(());
            }
            lifecycle.state = ServerState::Stopping;
            lifecycle.running.take()
        };

        if let Some(mut running) = running {
            // Receivers may all be gone if the accept task already exited.
            let _ = running.shutdown.send(true);
            let wait = self.config.shutdown_grace() + ACCEPT_JOIN_MARGIN;
            match tokio::time::timeout(wait, &mut running.accept_task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "accept task ended abnormally"),
                Err(_) => {
                    warn!("accept task did not stop in time, aborting");
                    running.accept_task.abort();
                }
            }
        }

        let saved = self.save_on_stop().await;

        self.set_state(ServerState::Stopped);
        info!("dictionary server stopped");
        self.observer.on_stopped();
        saved
    }

    async fn save_on_stop(&self) -> ServerResult<()> {
        let Some(path) = self.snapshot_to_save() else {
            return Ok(());
        };
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || save_snapshot(store.as_ref(), &path))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;
        Ok(())
    }

    fn snapshot_to_save(&self) -> Option<PathBuf> {
        if self.config.save_on_stop {
            self.config.snapshot_path.clone()
        } else {
            None
        }
    }

    /// Start, run until `shutdown` resolves, then stop.
    pub async fn run_until<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }

    fn set_state(&self, state: ServerState) {
        self.lifecycle.lock().expect("lock poisoned").state = state;
    }
}

impl std::fmt::Debug for DictionaryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryServer")
            .field("bind_addr", &self.config.bind_addr)
            .field("state", &self.state())
            .field("connected", &self.connected_clients())
            .finish()
    }
}

/// State moved into the accept task.
struct Acceptor {
    store: Arc<dyn WordStore>,
    observer: Arc<dyn ServerObserver>,
    connected: Arc<AtomicUsize>,
    workers: Arc<Semaphore>,
    grace: Duration,
}

impl Acceptor {
    async fn run(self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) {
        let mut handlers = JoinSet::new();

        loop {
            tokio::select! {
                _ = async { shutdown.wait_for(|stop| *stop).await.map(|_| ()) } => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_handler(&mut handlers, stream, peer, &shutdown),
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(finished) = handlers.join_next(), if !handlers.is_empty() => {
                    log_handler_exit(finished);
                }
            }
        }

        drop(listener);
        debug!(active = handlers.len(), "listener closed, draining handlers");

        if tokio::time::timeout(self.grace, drain(&mut handlers)).await.is_err() {
            warn!(remaining = handlers.len(), "grace period elapsed, aborting connections");
            handlers.shutdown().await;
        }
    }

    fn spawn_handler(
        &self,
        handlers: &mut JoinSet<()>,
        stream: TcpStream,
        peer: SocketAddr,
        shutdown: &watch::Receiver<bool>,
    ) {
        let count = self.connected.fetch_add(1, Ordering::SeqCst) + 1;
        info!(%peer, clients = count, "client connected");
        self.observer.on_connection_count(count);

        let handler = ConnectionHandler::new(Arc::clone(&self.store))
            .with_peer(peer)
            .on_disconnect({
                let connected = Arc::clone(&self.connected);
                let observer = Arc::clone(&self.observer);
                move || {
                    let count = connected.fetch_sub(1, Ordering::SeqCst) - 1;
                    info!(%peer, clients = count, "client disconnected");
                    observer.on_connection_count(count);
                }
            });

        let workers = Arc::clone(&self.workers);
        let mut shutdown = shutdown.clone();
        handlers.spawn(async move {
            let _permit = tokio::select! {
                permit = workers.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
                _ = shutdown.wait_for(|stop| *stop) => return,
            };
            if let Err(e) = handler.serve(stream, shutdown).await {
                warn!(%peer, error = %e, "connection closed with error");
            }
        });
    }
}

async fn drain(handlers: &mut JoinSet<()>) {
    while let Some(finished) = handlers.join_next().await {
        log_handler_exit(finished);
    }
}

fn log_handler_exit(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "connection handler panicked");
        }
    }
}
