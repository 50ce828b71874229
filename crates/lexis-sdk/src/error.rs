use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("protocol error: {0}")]
    Protocol(#[from] lexis_protocol::ProtocolError),
}

pub type SdkResult<T> = Result<T, SdkError>;
