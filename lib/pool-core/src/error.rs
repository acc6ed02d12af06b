use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Duplicate endpoint id: {0}")]
    DuplicateEndpoint(String),

    #[error("Pool registry is empty")]
    EmptyRegistry,

    #[error("Invalid configuration for {endpoint}: {reason}")]
    InvalidConfiguration { endpoint: String, reason: String },

    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}
