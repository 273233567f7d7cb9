use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coordinate::{Coordinate, PackageKind, ResolvableCoordinate};
use crate::error::PomsmithError;

/// Written in place of a version that could not be resolved.
pub const FALLBACK_VERSION: &str = "TODO";

/// Upper bound of concurrent lookups when nothing else is configured.
pub const DEFAULT_MAX_LOOKUPS: usize = 4;

/// Why a single lookup produced no version.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no stable version of {0} found")]
    NotFound(String),
    #[error("transient failure looking up {coordinate}: {message}")]
    Transient { coordinate: String, message: String },
}

/// Capability that answers "what is the newest acceptable version of this
/// coordinate". Implementations must be safe to call from several threads.
pub trait VersionLookup: Send + Sync {
    fn newest_version(
        &self,
        coordinate: &Coordinate,
        kind: PackageKind,
    ) -> Result<String, LookupError>;
}

impl<T> VersionLookup for Arc<T>
where
    T: VersionLookup + ?Sized,
{
    fn newest_version(
        &self,
        coordinate: &Coordinate,
        kind: PackageKind,
    ) -> Result<String, LookupError> {
        (**self).newest_version(coordinate, kind)
    }
}

/// Outcome of one resolution. `fallback` is set when `value` is the caller's
/// fallback rather than an answer from the lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub value: String,
    pub fallback: bool,
}

impl ResolvedVersion {
    pub fn resolved(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fallback: false,
        }
    }

    pub fn fallback(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fallback: true,
        }
    }
}

/// Versions resolved during one generation run, keyed by coordinate and kind.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResolvedVersions {
    entries: BTreeMap<ResolvableCoordinate, ResolvedVersion>,
}

impl ResolvedVersions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: ResolvableCoordinate, version: ResolvedVersion) {
        self.entries.insert(target, version);
    }

    pub fn get(&self, target: &ResolvableCoordinate) -> Option<&ResolvedVersion> {
        self.entries.get(target)
    }

    /// Version string for `target`, or the sentinel when it was never resolved.
    pub fn value_of(&self, target: &ResolvableCoordinate) -> &str {
        self.entries
            .get(target)
            .map(|version| version.value.as_str())
            .unwrap_or(FALLBACK_VERSION)
    }

    /// True when any resolution of the run fell back.
    pub fn used_fallback(&self) -> bool {
        self.entries.values().any(|version| version.fallback)
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &ResolvableCoordinate> {
        self.entries
            .iter()
            .filter(|(_, version)| version.fallback)
            .map(|(target, _)| target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResolvableCoordinate, &ResolvedVersion)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves versions through an injected [`VersionLookup`], degrading to a
/// fallback value instead of failing.
pub struct VersionResolver<L: VersionLookup> {
    lookup: L,
    pool: ThreadPool,
    max_workers: usize,
}

impl<L: VersionLookup> VersionResolver<L> {
    pub fn new(lookup: L, max_workers: usize) -> Result<Self, PomsmithError> {
        let max_workers = max_workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|idx| format!("pomsmith-lookup-{idx}"))
            .build()
            .map_err(|err| {
                PomsmithError::Config(format!("failed to start lookup workers: {err}"))
            })?;
        Ok(Self {
            lookup,
            pool,
            max_workers,
        })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Returns the newest stable version or `fallback` if the lookup fails.
    pub fn resolve_version(
        &self,
        coordinate: &Coordinate,
        kind: PackageKind,
        fallback: &str,
    ) -> ResolvedVersion {
        match self.lookup.newest_version(coordinate, kind) {
            Ok(version) if !version.trim().is_empty() => {
                debug!(%coordinate, %kind, version = %version, "resolved latest version");
                ResolvedVersion::resolved(version)
            }
            Ok(_) => {
                warn!(%coordinate, %kind, fallback, "lookup returned an empty version; using fallback");
                ResolvedVersion::fallback(fallback)
            }
            Err(err) => {
                warn!(%coordinate, %kind, fallback, error = %err, "failed to resolve latest version; using fallback");
                ResolvedVersion::fallback(fallback)
            }
        }
    }

    /// Resolves every target concurrently, bounded by the worker limit. Results
    /// do not depend on completion order.
    pub fn resolve_all(&self, targets: &[ResolvableCoordinate]) -> ResolvedVersions {
        let results: Vec<(ResolvableCoordinate, ResolvedVersion)> = self.pool.install(|| {
            targets
                .par_iter()
                .map(|target| {
                    let version =
                        self.resolve_version(&target.coordinate, target.kind, FALLBACK_VERSION);
                    (target.clone(), version)
                })
                .collect()
        });

        let mut resolved = ResolvedVersions::new();
        for (target, version) in results {
            resolved.insert(target, version);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLookup {
        version: &'static str,
        missing: HashSet<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedLookup {
        fn new(version: &'static str, missing: &[&'static str]) -> Self {
            Self {
                version,
                missing: missing.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl VersionLookup for FixedLookup {
        fn newest_version(
            &self,
            coordinate: &Coordinate,
            _kind: PackageKind,
        ) -> Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.missing.contains(coordinate.artifact_id()) {
                return Err(LookupError::NotFound(coordinate.to_string()));
            }
            Ok(self.version.to_string())
        }
    }

    struct KindEcho;

    impl VersionLookup for KindEcho {
        fn newest_version(
            &self,
            _coordinate: &Coordinate,
            kind: PackageKind,
        ) -> Result<String, LookupError> {
            Ok(format!("1.0-{}", kind.extension()))
        }
    }

    #[test]
    fn failed_lookup_returns_caller_fallback() {
        let resolver = VersionResolver::new(FixedLookup::new("1.2.3", &["a"]), 2).unwrap();
        let resolved = resolver.resolve_version(&Coordinate::new("g", "a"), PackageKind::Bom, "5.6.7");
        assert_eq!(resolved, ResolvedVersion::fallback("5.6.7"));

        let resolved = resolver.resolve_version(&Coordinate::new("g", "b"), PackageKind::Normal, "5.6.7");
        assert_eq!(resolved, ResolvedVersion::resolved("1.2.3"));
    }

    #[test]
    fn kind_is_passed_through_to_the_lookup() {
        let resolver = VersionResolver::new(KindEcho, 1).unwrap();
        let bom = resolver.resolve_version(&Coordinate::new("g", "a"), PackageKind::Bom, "x");
        let plugin = resolver.resolve_version(&Coordinate::new("g", "a"), PackageKind::Plugin, "x");
        assert_eq!(bom.value, "1.0-pom");
        assert_eq!(plugin.value, "1.0-jar");
    }

    #[test]
    fn resolve_all_aggregates_fallback_flag() {
        let lookup = Arc::new(FixedLookup::new("9.9.9", &["jacoco-maven-plugin"]));
        let resolver = VersionResolver::new(lookup.clone(), 3).unwrap();
        let targets = vec![
            ResolvableCoordinate::bom("org.junit", "junit-bom"),
            ResolvableCoordinate::plugin("org.jacoco", "jacoco-maven-plugin"),
            ResolvableCoordinate::plugin("org.apache.maven.plugins", "maven-jar-plugin"),
        ];

        let resolved = resolver.resolve_all(&targets);

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
        assert_eq!(resolved.len(), 3);
        assert!(resolved.used_fallback());
        assert_eq!(resolved.value_of(&targets[0]), "9.9.9");
        assert_eq!(resolved.value_of(&targets[1]), FALLBACK_VERSION);
        let fallbacks: Vec<_> = resolved.fallbacks().collect();
        assert_eq!(fallbacks, vec![&targets[1]]);
    }

    #[test]
    fn no_fallback_when_every_lookup_succeeds() {
        let resolver = VersionResolver::new(FixedLookup::new("1.0.0", &[]), 0).unwrap();
        assert_eq!(resolver.max_workers(), 1);
        let resolved = resolver.resolve_all(&[ResolvableCoordinate::normal("g", "a")]);
        assert!(!resolved.used_fallback());
        assert_eq!(
            resolved.value_of(&ResolvableCoordinate::normal("g", "unknown")),
            FALLBACK_VERSION
        );
    }
}
