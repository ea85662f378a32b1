//! Build and run the custom lint executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::error::ForgeError;
use crate::Result;

/// How many trailing stderr lines of a failed quiet build end up in the error.
const STDERR_TAIL_LINES: usize = 20;

/// Result of running the custom executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Exit code; termination by signal is reported as 1.
    pub exit_code: i32,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Nonzero exits become `ExecutionFailed`.
    pub fn into_result(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ForgeError::ExecutionFailed(format!(
                "exited with status {}",
                self.exit_code
            )))
        }
    }
}

/// Arguments passed to the custom executable.
///
/// `-c <config>` comes first. Without user arguments the default action is
/// `run`, plus `-v` when verbose; user arguments replace it verbatim.
pub fn execution_args(config: &Path, verbose: bool, extra_args: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-c".into(), config.as_os_str().to_owned()];
    if extra_args.is_empty() {
        args.push("run".into());
        if verbose {
            args.push("-v".into());
        }
    } else {
        args.extend(extra_args.iter().map(OsString::from));
    }
    args
}

/// Drives the engine's build step and the resulting executable.
pub struct BuildOrchestrator {
    config: BuildConfig,
}

impl BuildOrchestrator {
    pub fn new(config: BuildConfig) -> Self {
        BuildOrchestrator { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn executable_name(&self) -> &str {
        &self.config.executable_name
    }

    /// Where the build step is expected to leave the executable.
    pub fn executable_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.config.executable_name)
    }

    /// Path of the manifest file inside `work_dir`.
    pub fn manifest_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.config.manifest_file)
    }

    /// Run `<engine> custom --manifest <manifest>` inside `work_dir`.
    ///
    /// Verbose builds share the terminal. Quiet builds capture output, and
    /// the tail of stderr is put into the error when the build fails.
    pub async fn build_executable(
        &self,
        work_dir: &Path,
        manifest: &Path,
        verbose: bool,
    ) -> Result<PathBuf> {
        let (program, leading) = self
            .config
            .engine_command
            .split_first()
            .ok_or_else(|| ForgeError::BuildFailed("engine command is empty".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(leading)
            .arg("custom")
            .arg("--manifest")
            .arg(manifest)
            .current_dir(work_dir);
        if verbose {
            command.arg("-v");
        }

        info!(engine = %program, manifest = %manifest.display(), "Building custom executable");
        let start = Instant::now();

        let spawn_failed =
            |e: std::io::Error| ForgeError::BuildFailed(format!("could not start {program}: {e}"));
        let (status, stderr) = if verbose {
            let status = command
                .stdin(Stdio::null())
                .status()
                .await
                .map_err(spawn_failed)?;
            (status, String::new())
        } else {
            let output = command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(spawn_failed)?;
            debug!(
                stdout = %String::from_utf8_lossy(&output.stdout),
                "Build step output"
            );
            (
                output.status,
                String::from_utf8_lossy(&output.stderr).to_string(),
            )
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        if !status.success() {
            let mut reason = format!("{program} exited with {status}");
            let tail = stderr_tail(&stderr);
            if !tail.is_empty() {
                reason.push('\n');
                reason.push_str(&tail);
            }
            warn!(duration_ms, %status, "Build step failed");
            return Err(ForgeError::BuildFailed(reason));
        }

        let executable = self.executable_path(work_dir);
        if !executable.is_file() {
            return Err(ForgeError::BuildFailed(format!(
                "build step succeeded but {} was not produced",
                executable.display()
            )));
        }

        info!(duration_ms, executable = %executable.display(), "Built custom executable");
        Ok(executable)
    }

    /// Run the built executable with the policy file. Stdio is inherited.
    pub async fn execute(
        &self,
        executable: &Path,
        config: &Path,
        verbose: bool,
        extra_args: &[String],
    ) -> Result<ExecutionOutcome> {
        let args = execution_args(config, verbose, extra_args);
        debug!(executable = %executable.display(), ?args, "Running custom executable");

        let start = Instant::now();
        let status = Command::new(executable)
            .args(&args)
            .status()
            .await
            .map_err(|e| {
                ForgeError::ExecutionFailed(format!("could not start {}: {e}", executable.display()))
            })?;

        let outcome = ExecutionOutcome {
            // killed by a signal
            exit_code: status.code().unwrap_or(1),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            exit_code = outcome.exit_code,
            duration_ms = outcome.duration_ms,
            "Custom executable finished"
        );
        Ok(outcome)
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
