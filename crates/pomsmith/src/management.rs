use std::collections::BTreeSet;

use crate::coordinate::{Coordinate, PackageKind};
use crate::version::{FALLBACK_VERSION, ResolvedVersion};

/// BOM group that also manages every `org.junit.*` group.
const JUNIT_GROUP: &str = "org.junit";

/// The BOMs imported by a descriptor, used to decide which dependencies may
/// omit their explicit version.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagementSet {
    boms: BTreeSet<Coordinate>,
}

impl ManagementSet {
    pub fn new<I>(boms: I) -> Self
    where
        I: IntoIterator<Item = Coordinate>,
    {
        Self {
            boms: boms.into_iter().collect(),
        }
    }

    pub fn boms(&self) -> impl Iterator<Item = &Coordinate> {
        self.boms.iter()
    }

    /// True when at least one imported BOM manages `dependency`.
    pub fn covers(&self, dependency: &Coordinate) -> bool {
        self.boms.iter().any(|bom| bom_covers(bom, dependency))
    }

    /// Whether the descriptor should spell out a version for this coordinate.
    pub fn should_include_version(&self, dependency: &Coordinate, kind: PackageKind) -> bool {
        match kind {
            PackageKind::Normal => !self.covers(dependency),
            PackageKind::Bom => false,
            PackageKind::Plugin => true,
        }
    }

    /// The version to write for a regular dependency, or `None` when the
    /// element must be left out.
    pub fn version_to_include<'a>(
        &self,
        dependency: &Coordinate,
        resolved: &'a ResolvedVersion,
    ) -> Option<&'a str> {
        if !self.should_include_version(dependency, PackageKind::Normal) {
            return None;
        }
        let value = resolved.value.trim();
        if resolved.fallback || value.is_empty() || value == FALLBACK_VERSION {
            return None;
        }
        Some(value)
    }
}

/// Equal groupIds always match. The JUnit BOM additionally covers every
/// groupId that starts with `org.junit`.
pub fn bom_covers(bom: &Coordinate, dependency: &Coordinate) -> bool {
    if bom.group_id() == dependency.group_id() {
        return true;
    }
    bom.group_id() == JUNIT_GROUP && dependency.group_id().starts_with(JUNIT_GROUP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junit_only() -> ManagementSet {
        ManagementSet::new([Coordinate::new("org.junit", "junit-bom")])
    }

    #[test]
    fn junit_bom_covers_nested_groups() {
        let set = junit_only();
        assert!(set.covers(&Coordinate::new("org.junit.jupiter", "junit-jupiter")));
        assert!(set.covers(&Coordinate::new("org.junit", "anything")));
        assert!(!set.covers(&Coordinate::new("org.other", "thing")));
    }

    #[test]
    fn prefix_rule_only_applies_to_the_junit_group() {
        let bom = Coordinate::new("org.assertj", "assertj-bom");
        assert!(bom_covers(&bom, &Coordinate::new("org.assertj", "assertj-core")));
        assert!(!bom_covers(&bom, &Coordinate::new("org.assertj.extra", "x")));
    }

    #[test]
    fn versions_follow_kind_and_coverage() {
        let set = junit_only();
        let jupiter = Coordinate::new("org.junit.jupiter", "junit-jupiter");
        let hamcrest = Coordinate::new("org.hamcrest", "hamcrest");

        assert!(!set.should_include_version(&jupiter, PackageKind::Normal));
        assert!(set.should_include_version(&hamcrest, PackageKind::Normal));
        assert!(!set.should_include_version(&hamcrest, PackageKind::Bom));
        assert!(set.should_include_version(&jupiter, PackageKind::Plugin));
    }

    #[test]
    fn fallback_or_empty_versions_are_never_written_for_dependencies() {
        let set = junit_only();
        let hamcrest = Coordinate::new("org.hamcrest", "hamcrest");

        assert_eq!(
            set.version_to_include(&hamcrest, &ResolvedVersion::resolved("3.0")),
            Some("3.0")
        );
        assert_eq!(
            set.version_to_include(&hamcrest, &ResolvedVersion::fallback("3.0")),
            None
        );
        assert_eq!(
            set.version_to_include(&hamcrest, &ResolvedVersion::resolved(" ")),
            None
        );
        assert_eq!(
            set.version_to_include(&hamcrest, &ResolvedVersion::resolved(FALLBACK_VERSION)),
            None
        );
    }
}
