//! lintforge - build a custom lint executable and run it
//!
//! Resolves the policy module, fetches its policy file, renders a build
//! manifest for the lint engine plus the module's analyzer plugin, builds the
//! custom executable and runs it. The process exits with the executable's
//! exit code.
//!
//! ```text
//! lintforge --module example.org/lint/policy --config-version v1.2.0 -- run ./...
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, Level};

use lintforge_core::config::{DEFAULT_ENGINE, DEFAULT_PROXY_URL};
use lintforge_core::version::LATEST;
use lintforge_core::{
    init_tracing, BuildConfig, DependencyRef, LogFormat, Pipeline, RegistryConfig, RunRequest,
    Stage,
};

#[derive(Parser, Debug)]
#[command(name = "lintforge")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build a custom lint executable and run it with a pinned policy", long_about = None)]
struct Cli {
    /// Version of the policy module ("latest" or vX.Y.Z)
    #[arg(long, env = "LINTFORGE_CONFIG_VERSION", default_value = "latest")]
    config_version: String,

    /// Registry path of the module carrying the policy and the plugin
    #[arg(long, env = "LINTFORGE_MODULE")]
    module: String,

    /// Version of the base lint engine ("latest", a tag or a branch)
    #[arg(long, env = "LINTFORGE_ENGINE_VERSION", default_value = "latest")]
    engine_version: String,

    /// Build the plugin from a local checkout instead of the registry
    #[arg(long)]
    plugin_path: Option<PathBuf>,

    /// Path of the policy file inside the module
    #[arg(long, default_value = "policy.yml")]
    config_file: String,

    /// Module proxy base URL
    #[arg(long, env = "LINTFORGE_PROXY", default_value = DEFAULT_PROXY_URL)]
    proxy: String,

    /// Engine command that performs the build step
    #[arg(long, env = "LINTFORGE_ENGINE", default_value = DEFAULT_ENGINE)]
    engine: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Arguments for the custom executable (default: run)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn request(&self) -> Result<RunRequest> {
        let dependency = DependencyRef::new(&self.module, &self.config_version)
            .context("invalid --config-version")
            .context(Stage::Resolve)?;
        let mut request = RunRequest::new(dependency, &self.config_file, &self.engine_version())
            .with_verbose(self.verbose)
            .with_args(self.args.clone());
        if let Some(path) = &self.plugin_path {
            request = request.with_plugin_path(path);
        }
        Ok(request)
    }

    /// The engine version goes to the engine untouched; it decides what it
    /// accepts. Empty means latest.
    fn engine_version(&self) -> String {
        match self.engine_version.trim() {
            "" => LATEST.to_string(),
            version => version.to_string(),
        }
    }

    fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default().with_proxy(&self.proxy)
    }

    fn build_config(&self) -> BuildConfig {
        BuildConfig::default().with_engine(&self.engine)
    }
}

/// Report panics with a marker that cannot be mistaken for an ordinary error.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {info}");
        error!(panic = %info, "Internal fault");
    }));
}

async fn run(cli: &Cli) -> Result<i32> {
    let request = cli.request()?;
    let pipeline = Pipeline::from_config(cli.registry_config(), cli.build_config())
        .context("failed to create registry client")?;
    let outcome = pipeline.run(&request).await?;
    Ok(outcome.exit_code)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, level);
    install_panic_hook();

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
