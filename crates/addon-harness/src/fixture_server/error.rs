use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureServerError {
    #[error("Invalid listen address: {message}")]
    InvalidListen { message: String },
    #[error("Fixture server I/O error ({operation}): {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Fixture server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
