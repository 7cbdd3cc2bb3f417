// ABOUTME: Post-promotion health check configuration.
// ABOUTME: Lists paths under the deployment root that must exist after a release goes live.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::deploy::DEFAULT_HEALTH_PATH;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthCheckConfig {
    /// Paths relative to the root. Empty means `index.html`.
    #[serde(default)]
    pub paths: Vec<String>,
}

impl HealthCheckConfig {
    /// The configured paths, or the default when none are listed.
    pub fn paths(&self) -> NonEmpty<String> {
        let paths = self
            .paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        NonEmpty::from_vec(paths).unwrap_or_else(|| NonEmpty::new(DEFAULT_HEALTH_PATH.to_string()))
    }
}
