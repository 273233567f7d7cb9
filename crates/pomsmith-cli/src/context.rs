use std::path::PathBuf;
use std::sync::Arc;

use pomsmith::{
    GeneratorConfig, MavenCentralLookup, OfflineLookup, ProjectGenerator, VersionLookup,
    VersionResolver,
};

use crate::error::CliError;
use crate::util::Verbosity;

/// Global flags that shape the session before any command runs.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub config_path: Option<PathBuf>,
    pub repository: Option<String>,
    pub max_lookups: Option<usize>,
    pub offline: bool,
}

pub struct CliSession {
    pub config: GeneratorConfig,
    pub lookup: Arc<dyn VersionLookup>,
    pub offline: bool,
    pub verbosity: Verbosity,
}

impl CliSession {
    pub fn bootstrap(options: SessionOptions, verbosity: Verbosity) -> Result<Self, CliError> {
        let mut config = match &options.config_path {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };
        if let Some(repository) = options.repository {
            config.repository_url = repository;
        }
        if let Some(max_lookups) = options.max_lookups {
            config.max_concurrent_lookups = max_lookups;
        }
        config.validate()?;

        let lookup: Arc<dyn VersionLookup> = if options.offline {
            Arc::new(OfflineLookup)
        } else {
            Arc::new(MavenCentralLookup::from_config(&config)?)
        };

        Ok(Self {
            config,
            lookup,
            offline: options.offline,
            verbosity,
        })
    }

    pub fn generator(&self) -> Result<ProjectGenerator<Arc<dyn VersionLookup>>, CliError> {
        Ok(ProjectGenerator::new(self.lookup.clone(), &self.config)?)
    }

    pub fn resolver(&self) -> Result<VersionResolver<Arc<dyn VersionLookup>>, CliError> {
        Ok(VersionResolver::new(
            self.lookup.clone(),
            self.config.max_concurrent_lookups,
        )?)
    }
}
