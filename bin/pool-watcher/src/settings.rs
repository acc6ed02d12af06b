//! Process settings read from the environment

use pool_notify::{Notifier, NotifierError};
use tracing::info;

/// Path of the YAML configuration file
pub const CONFIG_PATH_VAR: &str = "POOL_WATCH_CONFIG";
/// `1`/`true` runs cycles without posting
pub const DRY_RUN_VAR: &str = "POOL_WATCH_DRY_RUN";
/// `1`/`true` attaches an SVG of the healthy list to digests
pub const RENDER_VAR: &str = "POOL_WATCH_RENDER";

const DEFAULT_CONFIG_PATH: &str = "config/pools.yaml";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub config_path: String,
    pub dry_run: bool,
    pub render: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            config_path: lookup(CONFIG_PATH_VAR)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            dry_run: is_enabled(lookup(DRY_RUN_VAR).as_deref()),
            render: is_enabled(lookup(RENDER_VAR).as_deref()),
        }
    }
}

fn is_enabled(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true")
    )
}

/// Notifier used in dry-run when no webhook is configured
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "LogNotifier"
    }

    async fn post(&self, text: &str, image: Option<&[u8]>) -> Result<(), NotifierError> {
        info!(
            "Message ({} image bytes):\n{}",
            image.map_or(0, |bytes| bytes.len()),
            text
        );
        Ok(())
    }
}
