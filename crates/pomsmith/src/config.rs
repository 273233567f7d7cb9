use std::fs;
use std::path::Path;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::CatalogDefaults;
use crate::error::PomsmithError;
use crate::version::DEFAULT_MAX_LOOKUPS;

pub const DEFAULT_REPOSITORY_URL: &str = "https://repo1.maven.org/maven2/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings shared by every generation run of a process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratorConfig {
    pub repository_url: String,
    pub timeout_secs: u64,
    pub max_concurrent_lookups: usize,
    /// Probe that the artifact file of a candidate version exists before
    /// accepting it.
    pub verify_artifacts: bool,
    pub catalog: CatalogDefaults,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent_lookups: DEFAULT_MAX_LOOKUPS,
            verify_artifacts: true,
            catalog: CatalogDefaults::default(),
        }
    }
}

impl GeneratorConfig {
    /// Reads a YAML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, PomsmithError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PomsmithError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&raw).map_err(|err| err.context(path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self, PomsmithError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: GeneratorConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PomsmithError> {
        let url = self.repository()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PomsmithError::Config(format!(
                "repository_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(PomsmithError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(PomsmithError::Config(
                "max_concurrent_lookups must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Repository base URL, always ending with a slash.
    pub fn repository(&self) -> Result<Url, PomsmithError> {
        let mut raw = self.repository_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|err| {
            PomsmithError::Config(format!(
                "invalid repository_url '{}': {err}",
                self.repository_url
            ))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
