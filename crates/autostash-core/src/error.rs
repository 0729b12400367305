use thiserror::Error;

#[derive(Debug, Error)]
pub enum StashError {
    #[error("git executable not found on PATH")]
    GitNotInstalled,

    #[error("failed to run `{command}`: {message}")]
    GitSpawn { command: String, message: String },

    #[error("`{command}` failed with code {code:?}: {stderr}")]
    GitCommand {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("stash object {stash_id} was created but could not be stored: {reason}")]
    StoreFailed { stash_id: String, reason: String },

    #[error("unexpected git output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown output format '{0}': expected 'line' or 'pretty'")]
    UnknownFormat(String),

    #[error("cannot write {}: {source}", path.display())]
    Persist {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, StashError>;
