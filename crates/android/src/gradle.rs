//! Gradle build system integration
//!
//! Drives the project's Gradle wrapper. Every build first runs the
//! evaluation pass, so a strict signing failure stops before Gradle starts.

use crate::project::AndroidProject;
use crate::signing::SigningPolicy;
use crate::variants::BuildType;
use napfinder_core::error::{Error, ErrorCode, Result};
use napfinder_core::process::{run_command_in_dir, CommandResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Packaging format produced by a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `assemble*` tasks
    Apk,
    /// `bundle*` tasks (AAB)
    Bundle,
}

impl ArtifactKind {
    fn task_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "assemble",
            ArtifactKind::Bundle => "bundle",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Apk => f.write_str("APK"),
            ArtifactKind::Bundle => f.write_str("bundle"),
        }
    }
}

/// Gradle task producing `kind` for `build_type`, e.g. `bundleRelease`
pub fn task_name(build_type: BuildType, kind: ArtifactKind) -> String {
    format!("{}{}", kind.task_prefix(), build_type.task_suffix())
}

/// Location of the Gradle wrapper script
pub fn wrapper_path(android_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        android_dir.join("gradlew.bat")
    } else {
        android_dir.join("gradlew")
    }
}

/// Run a Gradle task
pub fn run_task(android_dir: &Path, task: &str) -> Result<CommandResult> {
    let wrapper = wrapper_path(android_dir);
    if !wrapper.exists() {
        return Err(Error::file_not_found(&wrapper)
            .with_suggestion("Run `flutter build apk` once to generate the Gradle wrapper"));
    }

    info!(task, "Running Gradle task");
    run_command_in_dir(&wrapper.to_string_lossy(), &[task], android_dir)
}

/// Clean build artifacts
pub fn clean(android_dir: &Path) -> Result<CommandResult> {
    run_task(android_dir, "clean")
}

/// Outcome of a gated build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Gradle task that ran
    pub task: String,
    /// Whether the evaluated release variant carried a signing identity
    pub signed: bool,
    /// Captured Gradle output
    pub result: CommandResult,
}

/// Evaluate the build configuration, then run the matching Gradle task.
///
/// Strict signing failures are returned without invoking Gradle. A lenient
/// release with no identity, or with an incomplete one, is logged and built.
pub fn build(
    project: &AndroidProject,
    build_type: BuildType,
    kind: ArtifactKind,
    policy: SigningPolicy,
) -> Result<BuildOutcome> {
    let configuration = project.evaluate(policy)?;
    let variant = configuration.variants.get(build_type);

    if build_type == BuildType::Release {
        match &variant.signing {
            None => warn!("Release {} will be unsigned", kind),
            Some(identity) if !identity.missing_fields().is_empty() => warn!(
                missing = ?identity.missing_fields(),
                "Release signing config is incomplete; Gradle will fail when it signs"
            ),
            Some(_) => {}
        }
    }

    let task = task_name(build_type, kind);
    let result = run_task(&project.android_dir(), &task)?;
    if !result.success {
        warn!(task = %task, exit_code = result.exit_code, "Gradle task failed");
    }

    Ok(BuildOutcome {
        task,
        signed: variant.is_signed(),
        result,
    })
}

/// Turn a failed Gradle run into an error carrying its stderr
pub fn ensure_success(outcome: &BuildOutcome) -> Result<()> {
    if outcome.result.success {
        Ok(())
    } else {
        Err(Error::new(
            ErrorCode::GradleError,
            format!("Gradle task {} failed with exit code {}", outcome.task, outcome.result.exit_code),
        )
        .with_context(outcome.result.stderr.trim().to_string()))
    }
}
