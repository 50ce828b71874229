use std::net::SocketAddr;
use std::sync::Arc;

use lexis_protocol::{
    read_message, write_message, Message, Operation, ProtocolResult, Request, Status,
};
use lexis_store::WordStore;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Runs a callback exactly once when dropped.
struct DisconnectGuard(Option<Box<dyn FnOnce() + Send + Sync>>);

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if let Some(notify) = self.0.take() {
            notify();
        }
    }
}

/// Per-connection request loop.
///
/// Reads one message, applies it to the shared store, writes one response,
/// and repeats until the peer hangs up, the socket fails, or shutdown is
/// signalled. Malformed or invalid requests are answered with an `ERROR`
/// response and the loop carries on.
///
/// The disconnect callback fires when the handler is dropped, whether it ran
/// to completion, failed, or was aborted before it started.
pub struct ConnectionHandler {
    store: Arc<dyn WordStore>,
    peer: Option<SocketAddr>,
    disconnect: DisconnectGuard,
}

impl ConnectionHandler {
    pub fn new(store: Arc<dyn WordStore>) -> Self {
        Self {
            store,
            peer: None,
            disconnect: DisconnectGuard(None),
        }
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn on_disconnect<F>(mut self, notify: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.disconnect = DisconnectGuard(Some(Box::new(notify)));
        self
    }

    /// Serve a TCP connection until it closes.
    pub async fn serve(self, stream: TcpStream, shutdown: watch::Receiver<bool>) -> ProtocolResult<()> {
        let (reader, writer) = stream.into_split();
        self.run(BufReader::new(reader), writer, shutdown).await
    }

    /// Drive the read-dispatch-write loop over any buffered reader and writer.
    pub async fn run<R, W>(
        self,
        mut reader: R,
        mut writer: W,
        mut shutdown: watch::Receiver<bool>,
    ) -> ProtocolResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => {
                    debug!(peer = ?self.peer, "closing connection for shutdown");
                    return Ok(());
                }
                next = read_message(&mut reader) => next,
            };

            let response = match next {
                Ok(Some(msg)) => self.respond(msg),
                Ok(None) => {
                    debug!(peer = ?self.peer, "peer closed connection");
                    return Ok(());
                }
                Err(e) if e.is_recoverable() => {
                    debug!(peer = ?self.peer, error = %e, "rejecting malformed line");
                    Message::error(e.to_string())
                }
                Err(e) => return Err(e),
            };

            if let Err(e) = write_message(&mut writer, &response).await {
                warn!(peer = ?self.peer, error = %e, "failed to write response");
                return Err(e);
            }
        }
    }

    fn respond(&self, msg: Message) -> Message {
        match Request::try_from(msg) {
            Ok(request) => {
                let op = request.operation();
                let word = request.word().to_string();
                let response = dispatch(self.store.as_ref(), request);
                debug!(
                    peer = ?self.peer,
                    operation = %op,
                    %word,
                    status = ?response.status,
                    "request handled"
                );
                response
            }
            Err(e) => {
                debug!(peer = ?self.peer, error = %e, "invalid request");
                Message::error(e.to_string())
            }
        }
    }
}

/// Apply one request to the store and build the response.
///
/// A failed `add_meaning` or `update_meaning` is classified by looking the
/// word up again: a missing word reports `NOT_FOUND`, otherwise the meaning
/// was the problem.
pub fn dispatch(store: &dyn WordStore, request: Request) -> Message {
    match request {
        Request::Search { word } => match store.search(&word) {
            Some(entry) => Message::response(Operation::Search, Status::Success)
                .with_word(entry.word())
                .with_meanings(entry.into_meanings()),
            None => Message::response(Operation::Search, Status::NotFound).with_word(word),
        },
        Request::Add { word, meanings } => {
            let status = if store.add(&word, &meanings) {
                Status::Success
            } else {
                Status::Duplicate
            };
            Message::response(Operation::Add, status).with_word(word)
        }
        Request::Remove { word } => {
            let status = if store.remove(&word) {
                Status::Success
            } else {
                Status::NotFound
            };
            Message::response(Operation::Remove, status).with_word(word)
        }
        Request::AddMeaning { word, meaning } => {
            let status = if store.add_meaning(&word, &meaning) {
                Status::Success
            } else if store.search(&word).is_none() {
                Status::NotFound
            } else {
                Status::Duplicate
            };
            Message::response(Operation::AddMeaning, status).with_word(word)
        }
        Request::UpdateMeaning {
            word,
            old_meaning,
            new_meaning,
        } => {
            let status = if store.update_meaning(&word, &old_meaning, &new_meaning) {
                Status::Success
            } else if store.search(&word).is_none() {
                Status::NotFound
            } else {
                Status::MeaningNotFound
            };
            Message::response(Operation::UpdateMeaning, status).with_word(word)
        }
    }
}
