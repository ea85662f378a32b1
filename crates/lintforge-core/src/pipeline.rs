//! The end-to-end run: resolve, fetch, render, build, execute.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde::Serialize;
use tracing::{debug, info};

use crate::artifact::ArtifactFetcher;
use crate::config::{BuildConfig, RegistryConfig};
use crate::manifest::{BuildManifest, PluginSource};
use crate::orchestrator::BuildOrchestrator;
use crate::registry::{HttpRegistry, RegistryClient, VersionResolver};
use crate::version::{DependencyRef, ResolvedVersion};
use crate::workspace::WorkArea;

/// Pipeline stage, attached as context to any error it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Fetch,
    Render,
    Build,
    Execute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Fetch => "fetch",
            Stage::Render => "render",
            Stage::Build => "build",
            Stage::Execute => "execute",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Module that carries both the policy file and the plugin
    pub dependency: DependencyRef,
    /// Path of the policy file inside the module archive
    pub config_file: String,
    /// Engine version written into the manifest as given
    pub engine_version: String,
    /// Build the plugin from this checkout instead of the resolved version
    pub plugin_path: Option<PathBuf>,
    pub verbose: bool,
    /// Passed to the custom executable; empty means the default action
    pub args: Vec<String>,
}

impl RunRequest {
    pub fn new(dependency: DependencyRef, config_file: &str, engine_version: &str) -> Self {
        RunRequest {
            dependency,
            config_file: config_file.to_string(),
            engine_version: engine_version.to_string(),
            plugin_path: None,
            verbose: false,
            args: Vec::new(),
        }
    }

    pub fn with_plugin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.plugin_path = Some(path.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub resolved: ResolvedVersion,
    /// Exit code of the custom executable
    pub exit_code: i32,
}

pub struct Pipeline {
    registry: Arc<dyn RegistryClient>,
    orchestrator: BuildOrchestrator,
}

impl Pipeline {
    pub fn new(registry: Arc<dyn RegistryClient>, orchestrator: BuildOrchestrator) -> Self {
        Pipeline {
            registry,
            orchestrator,
        }
    }

    /// Pipeline talking HTTP to the configured registry.
    pub fn from_config(registry: RegistryConfig, build: BuildConfig) -> crate::Result<Self> {
        let client = HttpRegistry::new(registry)?;
        Ok(Self::new(Arc::new(client), BuildOrchestrator::new(build)))
    }

    /// Run every stage once, in order.
    ///
    /// The work area lives only for the duration of this call. Any failure
    /// aborts the run with the failing [`Stage`] as context.
    pub async fn run(&self, request: &RunRequest) -> anyhow::Result<RunOutcome> {
        let dependency = &request.dependency;
        info!(%dependency, stage = %Stage::Resolve, "Starting run");

        let resolved = VersionResolver::new(self.registry.clone())
            .resolve(dependency)
            .await
            .context(Stage::Resolve)?;

        let work = WorkArea::create().context(Stage::Fetch)?;
        let config_name = policy_file_name(&request.config_file).context(Stage::Fetch)?;
        let config_path = work.join(config_name);
        ArtifactFetcher::new(self.registry.clone())
            .download_file(
                &dependency.name,
                &resolved.version,
                &request.config_file,
                &config_path,
            )
            .await
            .context(Stage::Fetch)?;

        let plugin = match &request.plugin_path {
            Some(path) => {
                let path = std::fs::canonicalize(path)
                    .with_context(|| format!("plugin path {}", path.display()))
                    .context(Stage::Render)?;
                PluginSource::LocalPath(path)
            }
            None => PluginSource::Version(resolved.version.clone()),
        };
        let manifest = BuildManifest::new(&request.engine_version, &dependency.name, plugin)
            .with_name(self.orchestrator.executable_name());
        let manifest_path = self.orchestrator.manifest_path(work.path());
        manifest.write_to(&manifest_path).context(Stage::Render)?;
        debug!(stage = %Stage::Render, manifest = %manifest_path.display(), "Manifest ready");

        let executable = self
            .orchestrator
            .build_executable(work.path(), &manifest_path, request.verbose)
            .await
            .context(Stage::Build)?;

        let outcome = self
            .orchestrator
            .execute(&executable, &config_path, request.verbose, &request.args)
            .await
            .context(Stage::Execute)?;

        info!(
            %dependency,
            version = %resolved.version,
            exit_code = outcome.exit_code,
            "Run finished"
        );
        Ok(RunOutcome {
            resolved,
            exit_code: outcome.exit_code,
        })
    }
}

/// The policy file keeps its base name inside the work area.
fn policy_file_name(config_file: &str) -> anyhow::Result<&std::ffi::OsStr> {
    Path::new(config_file)
        .file_name()
        .ok_or_else(|| anyhow!("config file {config_file:?} has no file name"))
}
