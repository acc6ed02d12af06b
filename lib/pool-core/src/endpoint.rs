//! Endpoint configuration
use std::fmt;
use std::time::Duration;

/// Backend software family, which decides the status API shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendType {
    Mpos,
    Nomp,
    /// Anything else named in the configuration
    Unknown(String),
}

impl BackendType {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mpos" => BackendType::Mpos,
            "nomp" => BackendType::Nomp,
            _ => BackendType::Unknown(name.to_string()),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BackendType::Unknown(_))
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::Mpos => write!(f, "mpos"),
            BackendType::Nomp => write!(f, "nomp"),
            BackendType::Unknown(name) => write!(f, "unknown({})", name),
        }
    }
}

/// Fully resolved check parameters for one pool
#[derive(Clone, Debug)]
pub struct EndpointConfig {
    pub id: String,
    pub name: String,
    pub shortname: Option<String>,
    pub base_url: String,
    pub backend: BackendType,
    /// Status API path, already resolved from the per-type defaults
    pub api_path: String,
    /// Algorithm key read from NOMP `algos`
    pub nomp_algo: String,
    pub stratum_host: String,
    pub stratum_port: u16,
    pub api_timeout: Duration,
    pub stratum_timeout: Duration,
    pub alert_enabled: bool,
    pub retry_limit: u32,
}

impl EndpointConfig {
    /// Status API URL probed by the API check
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.api_path)
    }

    /// `host:port` of the stratum service
    pub fn stratum_addr(&self) -> String {
        format!("{}:{}", self.stratum_host, self.stratum_port)
    }

    /// Short label used in digests
    pub fn display_name(&self) -> &str {
        self.shortname.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> EndpointConfig {
        EndpointConfig {
            id: "a".to_string(),
            name: "Pool A".to_string(),
            shortname: None,
            base_url: "https://a.example/".to_string(),
            backend: BackendType::Mpos,
            api_path: "/index.php?page=api&action=public".to_string(),
            nomp_algo: "yescrypt".to_string(),
            stratum_host: "stratum.a.example".to_string(),
            stratum_port: 3333,
            api_timeout: Duration::from_secs(30),
            stratum_timeout: Duration::from_secs(10),
            alert_enabled: true,
            retry_limit: 3,
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(BackendType::parse("mpos"), BackendType::Mpos);
        assert_eq!(BackendType::parse("NOMP"), BackendType::Nomp);
        assert_eq!(
            BackendType::parse("yiimp"),
            BackendType::Unknown("yiimp".to_string())
        );
        assert!(!BackendType::parse("yiimp").is_known());
    }

    #[test]
    fn test_api_url_joins_without_double_slash() {
        assert_eq!(
            endpoint().api_url(),
            "https://a.example/index.php?page=api&action=public"
        );
    }

    #[test]
    fn test_display_name_prefers_shortname() {
        let mut ep = endpoint();
        assert_eq!(ep.display_name(), "Pool A");
        ep.shortname = Some("A".to_string());
        assert_eq!(ep.display_name(), "A");
        assert_eq!(ep.stratum_addr(), "stratum.a.example:3333");
    }
}
