use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A `(groupId, artifactId)` pair. Versions are never part of the identity.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Coordinate {
    group_id: String,
    artifact_id: String,
}

impl Coordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for Coordinate {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        match trimmed.split_once(':') {
            Some((group, artifact))
                if !group.is_empty() && !artifact.is_empty() && !artifact.contains(':') =>
            {
                Ok(Coordinate::new(group, artifact))
            }
            _ => Err(format!(
                "coordinate '{trimmed}' must have the form groupId:artifactId"
            )),
        }
    }
}

/// What a coordinate is used for; decides how the remote repository is queried.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    Normal,
    Bom,
    Plugin,
}

impl PackageKind {
    /// File extension of the primary artifact in the repository layout.
    pub fn extension(self) -> &'static str {
        match self {
            PackageKind::Normal | PackageKind::Plugin => "jar",
            PackageKind::Bom => "pom",
        }
    }

    /// Packaging declared by artifacts of this kind.
    pub fn packaging(self) -> &'static str {
        match self {
            PackageKind::Normal => "jar",
            PackageKind::Bom => "pom",
            PackageKind::Plugin => "maven-plugin",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PackageKind::Normal => "normal",
            PackageKind::Bom => "bom",
            PackageKind::Plugin => "plugin",
        };
        write!(f, "{label}")
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" | "library" | "jar" => Ok(PackageKind::Normal),
            "bom" | "pom" => Ok(PackageKind::Bom),
            "plugin" | "maven-plugin" => Ok(PackageKind::Plugin),
            other => Err(format!("unknown package kind '{other}'")),
        }
    }
}

/// A coordinate tagged with the kind used to resolve its version.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResolvableCoordinate {
    pub coordinate: Coordinate,
    pub kind: PackageKind,
}

impl ResolvableCoordinate {
    pub fn new(coordinate: Coordinate, kind: PackageKind) -> Self {
        Self { coordinate, kind }
    }

    pub fn normal(group_id: &str, artifact_id: &str) -> Self {
        Self::new(Coordinate::new(group_id, artifact_id), PackageKind::Normal)
    }

    pub fn bom(group_id: &str, artifact_id: &str) -> Self {
        Self::new(Coordinate::new(group_id, artifact_id), PackageKind::Bom)
    }

    pub fn plugin(group_id: &str, artifact_id: &str) -> Self {
        Self::new(Coordinate::new(group_id, artifact_id), PackageKind::Plugin)
    }
}

impl fmt::Display for ResolvableCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinate, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_kind_and_version() {
        let a = Coordinate::new("org.junit", "junit-bom");
        let b: Coordinate = "org.junit:junit-bom".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "org.junit:junit-bom");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!("org.junit".parse::<Coordinate>().is_err());
        assert!(":junit".parse::<Coordinate>().is_err());
        assert!("a:b:c".parse::<Coordinate>().is_err());
    }

    #[test]
    fn kinds_query_different_extensions() {
        assert_eq!(PackageKind::Bom.extension(), "pom");
        assert_eq!(PackageKind::Normal.extension(), "jar");
        assert_eq!(PackageKind::Plugin.packaging(), "maven-plugin");
        assert_eq!("maven-plugin".parse::<PackageKind>(), Ok(PackageKind::Plugin));
    }
}
