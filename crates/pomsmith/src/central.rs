//! Version lookups against a Maven-layout HTTP repository.

use std::cmp::Ordering;
use std::sync::OnceLock;
use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use semver::Version;
use tracing::debug;
use url::Url;

use crate::config::GeneratorConfig;
use crate::coordinate::{Coordinate, PackageKind};
use crate::error::PomsmithError;
use crate::version::{LookupError, VersionLookup};

const METADATA_FILE: &str = "maven-metadata.xml";
const MAX_VERIFIED_CANDIDATES: usize = 3;

/// Looks up the newest stable release listed in `maven-metadata.xml`.
#[derive(Clone, Debug)]
pub struct MavenCentralLookup {
    agent: ureq::Agent,
    repository: Url,
    verify_artifacts: bool,
}

impl MavenCentralLookup {
    pub fn new(repository: Url, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            repository,
            verify_artifacts: true,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, PomsmithError> {
        Ok(Self::new(config.repository()?, config.timeout())
            .with_verification(config.verify_artifacts))
    }

    /// When enabled, a candidate is only accepted once its artifact file answers a HEAD request.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_artifacts = verify;
        self
    }

    fn artifact_url(&self, coordinate: &Coordinate, tail: &[&str]) -> Result<Url, LookupError> {
        let mut url = self.repository.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| LookupError::Transient {
                coordinate: coordinate.to_string(),
                message: format!("repository URL {} cannot hold a path", self.repository),
            })?;
            segments
                .pop_if_empty()
                .extend(coordinate.group_id().split('.'))
                .push(coordinate.artifact_id())
                .extend(tail);
        }
        Ok(url)
    }

    fn fetch_metadata(&self, coordinate: &Coordinate) -> Result<String, LookupError> {
        let url = self.artifact_url(coordinate, &[METADATA_FILE])?;
        debug!(%url, "fetching repository metadata");
        match self.agent.get(url.as_str()).call() {
            Ok(response) => response
                .into_string()
                .map_err(|err| transient(coordinate, format!("failed reading {url}: {err}"))),
            Err(ureq::Error::Status(404, _)) => Err(LookupError::NotFound(coordinate.to_string())),
            Err(ureq::Error::Status(status, _)) => {
                Err(transient(coordinate, format!("{url} answered status {status}")))
            }
            Err(err) => Err(transient(coordinate, err.to_string())),
        }
    }

    fn artifact_exists(
        &self,
        coordinate: &Coordinate,
        version: &str,
        kind: PackageKind,
    ) -> Result<bool, LookupError> {
        let file = format!("{}-{version}.{}", coordinate.artifact_id(), kind.extension());
        let url = self.artifact_url(coordinate, &[version, &file])?;
        debug!(%url, packaging = kind.packaging(), "probing artifact");
        match self.agent.head(url.as_str()).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(ureq::Error::Status(status, _)) => {
                Err(transient(coordinate, format!("{url} answered status {status}")))
            }
            Err(err) => Err(transient(coordinate, err.to_string())),
        }
    }
}

impl VersionLookup for MavenCentralLookup {
    fn newest_version(
        &self,
        coordinate: &Coordinate,
        kind: PackageKind,
    ) -> Result<String, LookupError> {
        let metadata = self.fetch_metadata(coordinate)?;
        let versions = metadata_versions(&metadata)
            .map_err(|message| transient(coordinate, format!("unreadable metadata: {message}")))?;
        let candidates = stable_versions_newest_first(versions);
        if candidates.is_empty() {
            return Err(LookupError::NotFound(coordinate.to_string()));
        }
        if !self.verify_artifacts {
            return Ok(candidates[0].clone());
        }

        for candidate in candidates.into_iter().take(MAX_VERIFIED_CANDIDATES) {
            if self.artifact_exists(coordinate, &candidate, kind)? {
                return Ok(candidate);
            }
            debug!(%coordinate, version = %candidate, "artifact missing for listed version");
        }
        Err(LookupError::NotFound(coordinate.to_string()))
    }
}

/// Answers every lookup with `NotFound`; used when the network must not be touched.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineLookup;

impl VersionLookup for OfflineLookup {
    fn newest_version(
        &self,
        coordinate: &Coordinate,
        _kind: PackageKind,
    ) -> Result<String, LookupError> {
        Err(LookupError::NotFound(format!("{coordinate} (offline)")))
    }
}

fn transient(coordinate: &Coordinate, message: impl Into<String>) -> LookupError {
    LookupError::Transient {
        coordinate: coordinate.to_string(),
        message: message.into(),
    }
}

/// Every `<versions><version>` entry of a metadata document, in listed order.
pub fn metadata_versions(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut versions = Vec::new();

    loop {
        match reader.read_event().map_err(|err| err.to_string())? {
            Event::Start(start) => {
                path.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let in_versions = path.len() >= 2
                    && path[path.len() - 1] == "version"
                    && path[path.len() - 2] == "versions";
                if in_versions {
                    let value = text.unescape().map_err(|err| err.to_string())?;
                    let value = value.trim();
                    if !value.is_empty() {
                        versions.push(value.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(versions)
}

/// Rejects snapshots and preview qualifiers such as `alpha`, `beta`, `rc`,
/// `cr`, `ea` and `M` milestones.
pub fn is_stable(version: &str) -> bool {
    static PREVIEW: OnceLock<Regex> = OnceLock::new();
    let preview = PREVIEW.get_or_init(|| {
        Regex::new(r"^(alpha|beta|preview|milestone|rc|cr|ea|a|b|m|snapshot)$")
            .expect("Invalid regex")
    });
    let lowered = version.to_ascii_lowercase();
    if lowered.contains("snapshot") {
        return false;
    }
    !tokens(&lowered).iter().any(|token| preview.is_match(token))
}

/// Splits on separators and on letter/digit boundaries: `1.0.0-RC2` becomes
/// `1`, `0`, `0`, `rc`, `2`.
fn tokens(version: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for part in version.split(['.', '-', '_', '+']) {
        let mut start = 0;
        let mut previous: Option<bool> = None;
        for (idx, ch) in part.char_indices() {
            let digit = ch.is_ascii_digit();
            if previous.is_some_and(|was_digit| was_digit != digit) {
                out.push(&part[start..idx]);
                start = idx;
            }
            previous = Some(digit);
        }
        if start < part.len() {
            out.push(&part[start..]);
        }
    }
    out
}

/// Lenient ordering key: the first three numeric components form a semver
/// version, further numeric components break ties. Qualifiers are ignored.
fn version_key(version: &str) -> (Version, Vec<u64>) {
    let numbers: Vec<u64> = version
        .split(['.', '-', '_', '+'])
        .map_while(|part| part.parse::<u64>().ok())
        .collect();
    let component = |idx: usize| numbers.get(idx).copied().unwrap_or(0);
    let core = Version::new(component(0), component(1), component(2));
    let rest = numbers.iter().skip(3).copied().collect();
    (core, rest)
}

/// Stable versions ordered newest first. Equal keys keep the entry listed
/// later in front.
pub fn stable_versions_newest_first(versions: Vec<String>) -> Vec<String> {
    let mut keyed: Vec<(usize, (Version, Vec<u64>), String)> = versions
        .into_iter()
        .filter(|version| is_stable(version))
        .enumerate()
        .map(|(idx, version)| (idx, version_key(&version), version))
        .collect();
    keyed.sort_by(|a, b| match b.1.cmp(&a.1) {
        Ordering::Equal => b.0.cmp(&a.0),
        other => other,
    });
    keyed.into_iter().map(|(_, _, version)| version).collect()
}
