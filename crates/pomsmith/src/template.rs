use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::PomsmithError;
use crate::request::GenerationRequest;

const EMBEDDED_README: &str = include_str!("../templates/README.md.hbs");
const EMBEDDED_MAIN: &str = include_str!("../templates/Main.java.hbs");
const EMBEDDED_TEST: &str = include_str!("../templates/MainTest.java.hbs");
const EMBEDDED_GITIGNORE: &str = include_str!("../templates/gitignore.hbs");

/// Files rendered into every generated project.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectTemplate {
    Readme,
    MainClass,
    TestClass,
    Gitignore,
}

impl ProjectTemplate {
    pub const ALL: [ProjectTemplate; 4] = [
        ProjectTemplate::Readme,
        ProjectTemplate::MainClass,
        ProjectTemplate::TestClass,
        ProjectTemplate::Gitignore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProjectTemplate::Readme => "readme",
            ProjectTemplate::MainClass => "main-class",
            ProjectTemplate::TestClass => "test-class",
            ProjectTemplate::Gitignore => "gitignore",
        }
    }

    fn source(self) -> &'static str {
        match self {
            ProjectTemplate::Readme => EMBEDDED_README,
            ProjectTemplate::MainClass => EMBEDDED_MAIN,
            ProjectTemplate::TestClass => EMBEDDED_TEST,
            ProjectTemplate::Gitignore => EMBEDDED_GITIGNORE,
        }
    }
}

/// Values available to every project template.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectContext {
    pub project_name: String,
    pub description: Option<String>,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub java_version: String,
    pub package: String,
    pub class_name: String,
    pub include_wrapper: bool,
    pub include_spotless: bool,
    pub include_checkstyle: bool,
    pub formatting_plugins: bool,
}

impl ProjectContext {
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            project_name: request.display_name().to_string(),
            description: request.description.clone(),
            group_id: request.group_id.clone(),
            artifact_id: request.artifact_id.clone(),
            version: request.version.clone(),
            java_version: request.java_version.clone(),
            package: request.package_name().to_string(),
            class_name: java_class_name(&request.artifact_id),
            include_wrapper: request.include_wrapper,
            include_spotless: request.include_spotless,
            include_checkstyle: request.include_checkstyle,
            formatting_plugins: request.uses_formatting_plugins(),
        }
    }
}

/// Builds a class name from an artifactId: `my-cool-app` becomes `MyCoolApp`.
/// Names that would not start with a letter get a `Project` prefix.
pub fn java_class_name(artifact_id: &str) -> String {
    let mut name = String::with_capacity(artifact_id.len() + 7);
    for part in artifact_id.split('-').filter(|part| !part.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    if !name.chars().next().is_some_and(char::is_alphabetic) {
        name.insert_str(0, "Project");
    }
    name
}

/// Renders project files from templates.
pub trait TemplateEngine: Send + Sync {
    fn render(
        &self,
        template: ProjectTemplate,
        context: &ProjectContext,
    ) -> Result<String, PomsmithError>;
}

/// Handlebars engine over the templates embedded in the binary.
pub struct HandlebarsTemplateEngine {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplateEngine {
    pub fn new() -> Result<Self, PomsmithError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        for template in ProjectTemplate::ALL {
            registry
                .register_template_string(template.name(), template.source())
                .map_err(|err| PomsmithError::Template(err.to_string()).context(template.name()))?;
        }
        Ok(Self { registry })
    }
}

impl TemplateEngine for HandlebarsTemplateEngine {
    fn render(
        &self,
        template: ProjectTemplate,
        context: &ProjectContext,
    ) -> Result<String, PomsmithError> {
        let body = self
            .registry
            .render(template.name(), context)
            .map_err(|err| PomsmithError::Template(err.to_string()).context(template.name()))?;

        if template == ProjectTemplate::Readme {
            markdown::to_mdast(&body, &markdown::ParseOptions::default())
                .map_err(|err| PomsmithError::Template(format!("README is not valid markdown: {err}")))?;
        }
        Ok(body)
    }
}

impl<T> TemplateEngine for Arc<T>
where
    T: TemplateEngine + ?Sized,
{
    fn render(
        &self,
        template: ProjectTemplate,
        context: &ProjectContext,
    ) -> Result<String, PomsmithError> {
        (**self).render(template, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(configure: impl FnOnce(&mut GenerationRequest)) -> ProjectContext {
        let mut request = GenerationRequest::new("com.example.tools", "demo-app");
        configure(&mut request);
        ProjectContext::from_request(&request)
    }

    #[test]
    fn class_names_from_artifact_ids() {
        assert_eq!(java_class_name("demo"), "Demo");
        assert_eq!(java_class_name("my-cool-app"), "MyCoolApp");
        assert_eq!(java_class_name("a--b"), "AB");
        assert_eq!(java_class_name("9lives"), "Project9lives");
        assert_eq!(java_class_name(""), "Project");
    }

    #[test]
    fn renders_java_sources_into_the_group_package() {
        let engine = HandlebarsTemplateEngine::new().unwrap();
        let ctx = context(|_| {});

        let main = engine.render(ProjectTemplate::MainClass, &ctx).unwrap();
        assert!(main.starts_with("package com.example.tools;"));
        assert!(main.contains("public class DemoApp {"));

        let test = engine.render(ProjectTemplate::TestClass, &ctx).unwrap();
        assert!(test.contains("class DemoAppTest {"));
        assert!(test.contains("import org.junit.jupiter.api.Test;"));
    }

    #[test]
    fn readme_switches_on_wrapper_and_formatting_plugins() {
        let engine = HandlebarsTemplateEngine::new().unwrap();

        let plain = engine
            .render(ProjectTemplate::Readme, &context(|_| {}))
            .unwrap();
        assert!(plain.starts_with("# demo-app\n"));
        assert!(plain.contains("mvn verify"));
        assert!(!plain.contains("./mvnw verify"));
        assert!(!plain.contains("Code Formatting Plugins"));

        let wrapped = engine
            .render(
                ProjectTemplate::Readme,
                &context(|request| {
                    request.include_wrapper = true;
                    request.include_checkstyle = true;
                    request.name = Some("Demo <App>".into());
                }),
            )
            .unwrap();
        assert!(wrapped.starts_with("# Demo <App>\n"));
        assert!(wrapped.contains("./mvnw verify"));
        assert!(wrapped.contains(r".\mvnw.cmd verify"));
        assert!(wrapped.contains("## Code Formatting Plugins"));
        assert!(wrapped.contains("### Maven Checkstyle Plugin"));
        assert!(!wrapped.contains("### Spotless Maven Plugin"));
    }
}
