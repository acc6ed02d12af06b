use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Missing notifier credential: {0}")]
    MissingCredential(String),

    #[error("Notifier transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notifier rejected the message with status {0}")]
    Rejected(u16),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render")]
    Empty,

    #[error("Render failed: {0}")]
    Failed(String),
}
