use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrewError {
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` exited with {status}")]
    ExitStatus { command: String, status: String },

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),
}
