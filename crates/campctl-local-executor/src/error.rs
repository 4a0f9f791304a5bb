use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalExecutorError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", exit_code_label(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Clone of {url} failed: {reason}")]
    CloneFailed { url: String, reason: String },

    #[error("Overlay source missing: {0}")]
    OverlaySourceMissing(PathBuf),

    #[error("Failed to copy overlay {from} to {to}: {source}")]
    OverlayCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stack {stack} not ready after {attempts} attempt(s)")]
    NotReady { stack: String, attempts: u32 },

    #[error("Unknown compose stack: {0}")]
    UnknownStack(String),

    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    #[error("Unhealthy services: {0}")]
    Unhealthy(String),

    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, LocalExecutorError>;
