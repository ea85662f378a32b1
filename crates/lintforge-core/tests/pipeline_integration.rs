//! End-to-end pipeline runs against an in-memory registry and a shell
//! stand-in for the lint engine.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lintforge_core::fakes::{zip_archive, MemoryRegistry};
use lintforge_core::{
    BuildConfig, BuildOrchestrator, DependencyRef, ForgeError, Pipeline, RunRequest, Stage,
};
use tempfile::TempDir;

const MODULE: &str = "example.org/lint/policy";
const POLICY: &[u8] = b"rules: []\n";

/// Test fixture: output directory for the fake tools plus a registry that
/// has `v1.0.0` and `v1.1.0` (latest) of [`MODULE`].
struct Fixture {
    out: TempDir,
    registry: Arc<MemoryRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let out = tempfile::tempdir().unwrap();
        let lint = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{out}/args.txt'\ncp \"$2\" '{out}/policy.copy'\nexit 7\n",
            out = out.path().display()
        );
        std::fs::write(out.path().join("fake-lint.sh"), lint).unwrap();

        let registry = Arc::new(MemoryRegistry::new());
        for version in ["v1.0.0", "v1.1.0"] {
            let policy = format!("{MODULE}@{version}/configs/policy.yml");
            let module_file = format!("{MODULE}@{version}/go.mod");
            let archive = zip_archive(&[
                (policy.as_str(), POLICY),
                (module_file.as_str(), b"module x\n".as_slice()),
            ])
            .unwrap();
            registry.publish(MODULE, version, "2024-01-01T00:00:00Z", archive);
        }
        Fixture { out, registry }
    }

    fn out(&self) -> &Path {
        self.out.path()
    }

    /// Engine that installs the fake lint script and keeps a copy of the manifest.
    fn engine(&self) -> Vec<String> {
        let script = format!(
            "cp '{out}/fake-lint.sh' custom-lint && chmod +x custom-lint && cp \"$2\" '{out}/manifest.toml'",
            out = self.out().display()
        );
        vec!["sh".to_string(), "-c".to_string(), script]
    }

    fn pipeline_with(&self, engine: Vec<String>) -> Pipeline {
        let config = BuildConfig::default().with_engine_command(engine);
        Pipeline::new(self.registry.clone(), BuildOrchestrator::new(config))
    }

    fn pipeline(&self) -> Pipeline {
        self.pipeline_with(self.engine())
    }

    fn request(&self, version: &str) -> RunRequest {
        RunRequest::new(
            DependencyRef::new(MODULE, version).unwrap(),
            "configs/policy.yml",
            "v2.1.0",
        )
    }

    fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.out().join("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn manifest(&self) -> toml::Table {
        std::fs::read_to_string(self.out().join("manifest.toml"))
            .unwrap()
            .parse()
            .unwrap()
    }
}

fn plugin_entry(manifest: &toml::Table) -> toml::Table {
    let plugins = manifest["plugins"].as_array().unwrap();
    assert_eq!(plugins.len(), 1);
    plugins[0].as_table().unwrap().clone()
}

#[tokio::test]
async fn test_full_run_propagates_exit_code() {
    let fixture = Fixture::new();
    let outcome = fixture.pipeline().run(&fixture.request("latest")).await.unwrap();

    assert_eq!(outcome.exit_code, 7);
    assert_eq!(outcome.resolved.version, "v1.1.0");

    let args = fixture.recorded_args();
    assert_eq!(args.len(), 3);
    assert_eq!(args[0], "-c");
    assert!(args[1].ends_with("/policy.yml"), "{}", args[1]);
    assert_eq!(args[2], "run");

    // the policy reached the executable byte for byte
    assert_eq!(std::fs::read(fixture.out().join("policy.copy")).unwrap(), POLICY);

    // the work area is gone
    let work = PathBuf::from(&args[1]).parent().unwrap().to_path_buf();
    assert!(!work.exists(), "{} still exists", work.display());
}

#[tokio::test]
async fn test_manifest_uses_resolved_version() {
    let fixture = Fixture::new();
    fixture.pipeline().run(&fixture.request("v1.0.0")).await.unwrap();

    let manifest = fixture.manifest();
    assert_eq!(manifest["version"].as_str(), Some("v2.1.0"));
    assert_eq!(manifest["name"].as_str(), Some("custom-lint"));

    let plugin = plugin_entry(&manifest);
    assert_eq!(plugin["module"].as_str(), Some(MODULE));
    assert_eq!(plugin["version"].as_str(), Some("v1.0.0"));
    assert!(!plugin.contains_key("path"));
}

#[tokio::test]
async fn test_local_plugin_path() {
    let fixture = Fixture::new();
    let checkout = fixture.out().join("checkout");
    std::fs::create_dir(&checkout).unwrap();

    let request = fixture.request("latest").with_plugin_path(&checkout);
    fixture.pipeline().run(&request).await.unwrap();

    let plugin = plugin_entry(&fixture.manifest());
    let expected = std::fs::canonicalize(&checkout).unwrap();
    assert_eq!(plugin["path"].as_str(), Some(expected.to_str().unwrap()));
    assert!(!plugin.contains_key("version"));
}

#[tokio::test]
async fn test_user_args_pass_through_verbatim() {
    let fixture = Fixture::new();
    let request = fixture
        .request("latest")
        .with_args(vec!["run".into(), "./...".into(), "--fix".into(), "-v".into()]);
    fixture.pipeline().run(&request).await.unwrap();

    let args = fixture.recorded_args();
    assert_eq!(&args[2..], ["run", "./...", "--fix", "-v"]);
}

#[tokio::test]
async fn test_missing_policy_stops_before_build() {
    let fixture = Fixture::new();
    let mut request = fixture.request("v1.0.0");
    request.config_file = "configs/absent.yml".to_string();

    let err = fixture.pipeline().run(&request).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::Fetch));
    match err.downcast_ref::<ForgeError>() {
        Some(ForgeError::FileNotFound { entry }) => {
            assert_eq!(entry, &format!("{MODULE}@v1.0.0/configs/absent.yml"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!fixture.out().join("manifest.toml").exists());
    assert_eq!(
        fixture.registry.requests(),
        vec![
            format!("info {MODULE}@v1.0.0"),
            format!("archive {MODULE}@v1.0.0"),
        ]
    );
}

#[test]
fn test_invalid_version_rejected_before_io() {
    let fixture = Fixture::new();
    assert!(matches!(
        DependencyRef::new(MODULE, "1.0"),
        Err(ForgeError::InvalidVersion(_))
    ));
    assert!(fixture.registry.requests().is_empty());
}

#[tokio::test]
async fn test_build_failure_removes_work_area() {
    let fixture = Fixture::new();
    let engine = vec![
        "sh".to_string(),
        "-c".to_string(),
        format!("pwd > '{}/work.txt'; echo broken >&2; exit 3", fixture.out().display()),
    ];

    let err = fixture
        .pipeline_with(engine)
        .run(&fixture.request("latest"))
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<Stage>(), Some(&Stage::Build));
    assert!(format!("{err:#}").contains("broken"));

    let work = std::fs::read_to_string(fixture.out().join("work.txt")).unwrap();
    assert!(!Path::new(work.trim()).exists());
}
