//! On-disk project layout.
//!
//! Everything is written into a staging directory that sits next to the final
//! location; [`publish`] moves it into place with a single rename.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PomsmithError;
use crate::request::GenerationRequest;
use crate::template::{ProjectContext, ProjectTemplate, TemplateEngine};

pub const MANIFEST_FILE: &str = "pom.xml";
pub const WRAPPER_PLUGIN_GOAL: &str =
    "org.apache.maven.plugins:maven-wrapper-plugin:3.3.4:wrapper";

/// Adds wrapper scripts to a project directory that already holds its manifest.
pub trait WrapperInstaller: Send + Sync {
    fn install(&self, project_dir: &Path) -> Result<(), PomsmithError>;
}

impl<T> WrapperInstaller for Arc<T>
where
    T: WrapperInstaller + ?Sized,
{
    fn install(&self, project_dir: &Path) -> Result<(), PomsmithError> {
        (**self).install(project_dir)
    }
}

/// Runs `mvn -N <wrapper goal>` inside the project directory.
#[derive(Clone, Debug)]
pub struct MavenWrapperCommand {
    program: OsString,
}

impl Default for MavenWrapperCommand {
    fn default() -> Self {
        Self::new("mvn")
    }
}

impl MavenWrapperCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl WrapperInstaller for MavenWrapperCommand {
    fn install(&self, project_dir: &Path) -> Result<(), PomsmithError> {
        info!(dir = %project_dir.display(), "adding maven wrapper");
        let output = Command::new(&self.program)
            .arg("-N")
            .arg(WRAPPER_PLUGIN_GOAL)
            .current_dir(project_dir)
            .output()
            .map_err(|err| {
                PomsmithError::Generation(format!(
                    "failed to run {}: {err}",
                    self.program.to_string_lossy()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!(target: "pomsmith::wrapper", "{line}");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PomsmithError::Generation(format!(
                "wrapper generation failed ({}): {}{}",
                output.status,
                stdout.trim(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Writes the non-manifest files of a project from templates.
pub struct ProjectScaffolder<E: TemplateEngine> {
    engine: E,
}

impl<E: TemplateEngine> ProjectScaffolder<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Creates the source tree, `.gitignore`, sample classes and README under
    /// `root`. Returns the written paths relative to `root`.
    pub fn scaffold(
        &self,
        root: &Path,
        request: &GenerationRequest,
    ) -> Result<Vec<PathBuf>, PomsmithError> {
        let context = ProjectContext::from_request(request);
        let package_path: PathBuf = context.package.split('.').collect();
        let main_dir = Path::new("src/main/java").join(&package_path);
        let test_dir = Path::new("src/test/java").join(&package_path);
        for dir in [&main_dir, &test_dir] {
            let absolute = root.join(dir);
            fs::create_dir_all(&absolute).map_err(|err| PomsmithError::write(&absolute, err))?;
        }

        let files = [
            (PathBuf::from(".gitignore"), ProjectTemplate::Gitignore),
            (
                main_dir.join(format!("{}.java", context.class_name)),
                ProjectTemplate::MainClass,
            ),
            (
                test_dir.join(format!("{}Test.java", context.class_name)),
                ProjectTemplate::TestClass,
            ),
            (PathBuf::from("README.md"), ProjectTemplate::Readme),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (relative, template) in files {
            let body = self.engine.render(template, &context)?;
            write_file(&root.join(&relative), body.as_bytes())?;
            debug!(file = %relative.display(), "scaffolded file");
            written.push(relative);
        }
        Ok(written)
    }
}

/// Writes `contents`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), PomsmithError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| PomsmithError::write(parent, err))?;
    }
    fs::write(path, contents).map_err(|err| PomsmithError::write(path, err))
}

/// Random lowercase hex used to keep generated directory names unique.
pub fn random_suffix() -> Result<String, PomsmithError> {
    let mut bytes = [0u8; 6];
    getrandom::getrandom(&mut bytes).map_err(|err| {
        PomsmithError::Generation(format!("failed to gather randomness: {err}"))
    })?;
    Ok(hex::encode(bytes))
}

/// `<temp>/project-<artifactId>-<random>`, the location used when the caller
/// names no output directory.
pub fn default_project_dir(artifact_id: &str) -> Result<PathBuf, PomsmithError> {
    Ok(std::env::temp_dir().join(format!("project-{artifact_id}-{}", random_suffix()?)))
}

/// Creates an empty staging directory beside `target`.
pub fn create_staging_dir(target: &Path) -> Result<PathBuf, PomsmithError> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    fs::create_dir_all(parent).map_err(|err| PomsmithError::write(parent, err))?;

    let staging = parent.join(format!(".{name}.staging-{}", random_suffix()?));
    fs::create_dir(&staging).map_err(|err| PomsmithError::write(&staging, err))?;
    Ok(staging)
}

/// Moves a finished staging directory to `target`, which must not exist yet.
pub fn publish(staging: &Path, target: &Path) -> Result<(), PomsmithError> {
    if target.exists() {
        return Err(PomsmithError::Generation(format!(
            "target directory {} already exists",
            target.display()
        )));
    }
    fs::rename(staging, target).map_err(|err| PomsmithError::write(target, err))
}

/// Best-effort removal of a staging directory after a failed run.
pub fn discard_staging(staging: &Path) {
    if let Err(err) = fs::remove_dir_all(staging) {
        warn!(dir = %staging.display(), error = %err, "failed to remove staging directory");
    }
}
