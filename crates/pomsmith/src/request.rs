use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{FieldViolation, PomsmithError};

pub const DEFAULT_PROJECT_VERSION: &str = "1.0.0-SNAPSHOT";
pub const DEFAULT_JAVA_VERSION: &str = "25";

/// Assertion library added next to JUnit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssertionLibrary {
    #[default]
    None,
    Assertj,
    Hamcrest,
}

impl fmt::Display for AssertionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssertionLibrary::None => "none",
            AssertionLibrary::Assertj => "assertj",
            AssertionLibrary::Hamcrest => "hamcrest",
        };
        write!(f, "{label}")
    }
}

impl FromStr for AssertionLibrary {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(AssertionLibrary::None),
            "assertj" => Ok(AssertionLibrary::Assertj),
            "hamcrest" => Ok(AssertionLibrary::Hamcrest),
            other => Err(format!(
                "unknown assertion library '{other}' (expected none, assertj or hamcrest)"
            )),
        }
    }
}

/// Parameters of one project generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_java_version")]
    pub java_version: String,
    #[serde(default)]
    pub assertion_library: AssertionLibrary,
    #[serde(default)]
    pub include_spotless: bool,
    #[serde(default)]
    pub include_checkstyle: bool,
    #[serde(default)]
    pub include_wrapper: bool,
}

fn default_version() -> String {
    DEFAULT_PROJECT_VERSION.to_string()
}

fn default_java_version() -> String {
    DEFAULT_JAVA_VERSION.to_string()
}

impl GenerationRequest {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: default_version(),
            name: None,
            description: None,
            java_version: default_java_version(),
            assertion_library: AssertionLibrary::None,
            include_spotless: false,
            include_checkstyle: false,
            include_wrapper: false,
        }
    }

    /// Trims identifiers, applies NFC to free text and drops blank optionals.
    pub fn normalized(mut self) -> Self {
        self.group_id = self.group_id.trim().to_string();
        self.artifact_id = self.artifact_id.trim().to_string();
        self.version = self.version.trim().to_string();
        self.java_version = self.java_version.trim().to_string();
        self.name = normalize_text(self.name);
        self.description = normalize_text(self.description);
        self
    }

    /// Checks every field and reports all violations at once.
    pub fn validate(&self) -> Result<(), PomsmithError> {
        let mut violations = Vec::new();

        if self.group_id.trim().is_empty() {
            violations.push(FieldViolation::new("group_id", "groupId is mandatory"));
        } else if !group_id_pattern().is_match(&self.group_id) {
            violations.push(FieldViolation::new(
                "group_id",
                format!(
                    "'{}' must be dot-separated Java identifiers",
                    self.group_id
                ),
            ));
        }

        if self.artifact_id.trim().is_empty() {
            violations.push(FieldViolation::new("artifact_id", "artifactId is mandatory"));
        } else if !artifact_id_pattern().is_match(&self.artifact_id) {
            violations.push(FieldViolation::new(
                "artifact_id",
                format!(
                    "'{}' must start with a lowercase letter, contain only lowercase letters, digits and hyphens, and not end with a hyphen",
                    self.artifact_id
                ),
            ));
        }

        if self.version.trim().is_empty() {
            violations.push(FieldViolation::new("version", "version is mandatory"));
        } else if self.version.chars().any(char::is_whitespace) {
            violations.push(FieldViolation::new(
                "version",
                "version must not contain whitespace",
            ));
        }

        if self.java_version.is_empty() || !self.java_version.chars().all(|c| c.is_ascii_digit())
        {
            violations.push(FieldViolation::new(
                "java_version",
                format!("'{}' is not a Java release number", self.java_version),
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PomsmithError::InvalidRequest(violations))
        }
    }

    /// Normalizes then validates, returning the request to build from.
    pub fn prepare(self) -> Result<Self, PomsmithError> {
        let request = self.normalized();
        request.validate()?;
        Ok(request)
    }

    /// Display name of the project; falls back to the artifactId.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.artifact_id)
    }

    /// Java package of the generated sources.
    pub fn package_name(&self) -> &str {
        &self.group_id
    }

    pub fn uses_formatting_plugins(&self) -> bool {
        self.include_spotless || self.include_checkstyle
    }

    /// JSON schema describing the accepted request document.
    pub fn json_schema() -> Result<serde_json::Value, PomsmithError> {
        Ok(serde_json::to_value(schemars::schema_for!(GenerationRequest))?)
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().nfc().collect::<String>())
        .filter(|text| !text.is_empty())
}

fn group_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("Invalid regex")
    })
}

fn artifact_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*[a-z0-9]$").expect("Invalid regex"))
}
