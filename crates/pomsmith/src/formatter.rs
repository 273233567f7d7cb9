//! Canonical text layout for build descriptors.
//!
//! Formatting always re-parses its input, so layout left behind by an earlier
//! pass (blank lines, indentation) has no influence on the result and
//! `format(format(x)) == format(x)` holds for every well-formed input.

use std::sync::OnceLock;

use regex::Regex;

use crate::document::ManifestDocument;
use crate::error::PomsmithError;

/// One named text rewrite applied after serialization.
#[derive(Clone, Copy)]
pub struct FormatRule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for FormatRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRule").field("name", &self.name).finish()
    }
}

/// Rules in application order.
pub const FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        name: "root-on-own-line",
        apply: root_on_own_line,
    },
    FormatRule {
        name: "blank-after-sections",
        apply: blank_after_sections,
    },
    FormatRule {
        name: "collapse-before-dependency-management",
        apply: collapse_before_dependency_management,
    },
    FormatRule {
        name: "blank-after-dependency-management",
        apply: blank_after_dependency_management,
    },
    FormatRule {
        name: "single-trailing-newline",
        apply: single_trailing_newline,
    },
];

#[derive(Clone, Copy, Debug, Default)]
pub struct ManifestFormatter;

impl ManifestFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, raw: &str) -> Result<String, PomsmithError> {
        if raw.trim().is_empty() {
            return Err(PomsmithError::EmptyManifest);
        }
        let document = ManifestDocument::parse(raw)?;
        self.format_document(&document)
    }

    /// Serializes an already built document and applies every rule.
    pub fn format_document(&self, document: &ManifestDocument) -> Result<String, PomsmithError> {
        let serialized = document.to_xml()?;
        Ok(FORMAT_RULES
            .iter()
            .fold(serialized, |text, rule| (rule.apply)(&text)))
    }

    /// True when `raw` is already in canonical form.
    pub fn is_canonical(&self, raw: &str) -> Result<bool, PomsmithError> {
        Ok(self.format(raw)? == raw)
    }
}

fn root_on_own_line(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(\?>|-->)[ \t]*(<[A-Za-z_])").expect("Invalid regex")
    });
    re.replace_all(text, "$1\n$2").into_owned()
}

fn blank_after_sections(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(</modelVersion>|</description>|</properties>|</dependencies>)[ \t]*\n(?:[ \t]*\n)*",
        )
        .expect("Invalid regex")
    });
    re.replace_all(text, "$1\n\n").into_owned()
}

fn collapse_before_dependency_management(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"\n(?:[ \t]*\n)+([ \t]*</dependencyManagement>)").expect("Invalid regex")
    });
    re.replace_all(text, "\n$1").into_owned()
}

fn blank_after_dependency_management(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(</dependencyManagement>)[ \t]*\n(?:[ \t]*\n)*").expect("Invalid regex")
    });
    re.replace_all(text, "$1\n\n").into_owned()
}

fn single_trailing_newline(text: &str) -> String {
    let mut out = text.trim_end().to_string();
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPACT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"><modelVersion>4.0.0</modelVersion>
<groupId>dev.example</groupId><artifactId>simple</artifactId><version>1.0.0-SNAPSHOT</version>
<packaging>jar</packaging><name>Example</name><description>test</description>
<properties><maven.compiler.release>17</maven.compiler.release></properties>
<dependencyManagement><dependencies>
  <dependency><groupId>org.junit</groupId><artifactId>junit-bom</artifactId><version>6.0.0</version><type>pom</type><scope>import</scope></dependency>
</dependencies></dependencyManagement>
<dependencies>
  <dependency><groupId>org.junit.jupiter</groupId><artifactId>junit-jupiter</artifactId><scope>test</scope></dependency>
</dependencies>
<build><plugins>
  <plugin><groupId>org.apache.maven.plugins</groupId><artifactId>maven-jar-plugin</artifactId><version>3.4.2</version></plugin>
</plugins></build></project>
"#;

    const CANONICAL_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>

    <groupId>dev.example</groupId>
    <artifactId>simple</artifactId>
    <version>1.0.0-SNAPSHOT</version>
    <packaging>jar</packaging>
    <name>Example</name>
    <description>test</description>

    <properties>
        <maven.compiler.release>17</maven.compiler.release>
    </properties>

    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.junit</groupId>
                <artifactId>junit-bom</artifactId>
                <version>6.0.0</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
        </dependencies>
    </dependencyManagement>

    <dependencies>
        <dependency>
            <groupId>org.junit.jupiter</groupId>
            <artifactId>junit-jupiter</artifactId>
            <scope>test</scope>
        </dependency>
    </dependencies>

    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-jar-plugin</artifactId>
                <version>3.4.2</version>
            </plugin>
        </plugins>
    </build>
</project>
"#;

    #[test]
    fn formats_compact_pom_into_canonical_layout() {
        let formatted = ManifestFormatter::new().format(COMPACT_POM).unwrap();
        assert_eq!(formatted, CANONICAL_POM);
    }

    #[test]
    fn formatting_is_idempotent() {
        let formatter = ManifestFormatter::new();
        let once = formatter.format(COMPACT_POM).unwrap();
        let twice = formatter.format(&once).unwrap();
        assert_eq!(once, twice);
        assert!(formatter.is_canonical(&once).unwrap());
        assert!(!formatter.is_canonical(COMPACT_POM).unwrap());
    }

    #[test]
    fn formatting_is_idempotent_and_keeps_all_content() {
        let cases: &[(&str, &str, &[&str])] = &[
            (
                "comments around and inside the root",
                "<!-- head --><project><!-- top --><name>n</name><build><!-- nested --><plugins/></build></project><!-- tail -->",
                &["<!-- head -->", "<!-- top -->", "<!-- nested -->", "<!-- tail -->", "<name>n</name>"],
            ),
            (
                "processing instructions and doctype",
                "<?xml version=\"1.0\"?><!DOCTYPE project><?xml-stylesheet href=\"pom.xsl\"?><project><build><plugins><plugin><?m2e execute onConfiguration?><artifactId>x</artifactId></plugin></plugins></build></project><?m2e ignore?>",
                &[
                    "<!DOCTYPE project>",
                    "<?xml-stylesheet href=\"pom.xsl\"?>",
                    "<?m2e execute onConfiguration?>",
                    "<artifactId>x</artifactId>",
                    "</project>\n<?m2e ignore?>\n",
                ],
            ),
            (
                "plugin level dependencies",
                "<project><build><plugins><plugin><artifactId>p</artifactId><dependencies><dependency><artifactId>d</artifactId></dependency></dependencies><configuration><x>1</x></configuration></plugin></plugins></build></project>",
                &["<artifactId>d</artifactId>", "</dependencies>\n\n", "<x>1</x>"],
            ),
            (
                "empty and self-closing sections",
                "<project><properties></properties><dependencies/><build>  </build><description></description></project>",
                &["<properties/>", "<dependencies/>", "<build/>", "<description/>"],
            ),
            (
                "leaf text with blank lines",
                "<project><description>first\n\n\nsecond</description><name>  padded  </name><url>a &amp; b</url></project>",
                &["<description>first\n\n\nsecond</description>", "<name>  padded  </name>", "a &amp; b"],
            ),
        ];

        let formatter = ManifestFormatter::new();
        for (label, input, fragments) in cases {
            let once = formatter.format(input).unwrap();
            let twice = formatter.format(&once).unwrap();
            assert_eq!(once, twice, "{label}");
            assert_eq!(
                ManifestDocument::parse(&once).unwrap(),
                ManifestDocument::parse(input).unwrap(),
                "{label}"
            );
            for fragment in fragments.iter() {
                assert!(once.contains(fragment), "{label}: {fragment:?} missing from\n{once}");
            }
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        for raw in ["", "   \n\t"] {
            let err = ManifestFormatter::new().format(raw).unwrap_err();
            assert!(matches!(err, PomsmithError::EmptyManifest));
        }
    }

    #[test]
    fn truncated_input_is_malformed() {
        let err = ManifestFormatter::new()
            .format("<project><modelVersion>4.0.0</modelVersion><groupId>test</groupId></project")
            .unwrap_err();
        assert!(matches!(err, PomsmithError::MalformedManifest(_)));
    }

    #[test]
    fn rules_are_ordered_and_individually_usable() {
        let names: Vec<_> = FORMAT_RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            [
                "root-on-own-line",
                "blank-after-sections",
                "collapse-before-dependency-management",
                "blank-after-dependency-management",
                "single-trailing-newline",
            ]
        );

        assert_eq!(
            root_on_own_line("<?xml version=\"1.0\"?><project/>"),
            "<?xml version=\"1.0\"?>\n<project/>"
        );
        assert_eq!(
            blank_after_sections("  </properties>\n\n\n  <build/>\n"),
            "  </properties>\n\n  <build/>\n"
        );
        assert_eq!(
            collapse_before_dependency_management("</dependencies>\n\n    </dependencyManagement>"),
            "</dependencies>\n    </dependencyManagement>"
        );
        assert_eq!(
            blank_after_dependency_management("</dependencyManagement>\n<dependencies>"),
            "</dependencyManagement>\n\n<dependencies>"
        );
        assert_eq!(single_trailing_newline("</project>\n\n\n"), "</project>\n");
    }
}
