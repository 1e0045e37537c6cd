//! Common test utilities for CLI integration tests.
//!
//! Every test gets an isolated working directory and data directory, and
//! the stackplan environment variables of the calling shell are cleared so
//! registry discovery and input fallback behave the same everywhere.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables the CLI reads that must not leak in from the test runner.
const STACKPLAN_VARS: [&str; 7] = [
    "STACKPLAN_DATA_DIR",
    "STACKPLAN_REGISTRY",
    "STACKPLAN_ENVIRONMENT",
    "STACKPLAN_LOCATION",
    "STACKPLAN_BUSY_TIMEOUT",
    "STACKPLAN_OUTPUT_FORMAT",
    "STACKPLAN_LOG_MODE",
];

/// Test environment with isolated working and data directories.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory, also the working directory
    pub temp_path: PathBuf,
    /// Path to the stackplan data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// The data directory is not created; the CLI creates it on first write.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let data_dir = temp_path.join("stackplan-data");

        Self {
            temp_dir,
            temp_path,
            data_dir,
        }
    }

    /// A command with a clean environment but no pre-configured flags.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("stackplan").expect("Failed to find stackplan binary");
        cmd.current_dir(&self.temp_path);
        for var in STACKPLAN_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// A command with `--data-dir` pointing at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the temporary directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Record a stable address for `streaming-ingest` in a beta deployment.
    pub fn bind(&self, location: &str, address: &str, allocation_id: &str) {
        self.command()
            .args(["bind-address", "-e", "beta", "-l", location])
            .args(["--allocation-id", allocation_id, address])
            .assert()
            .success();
    }

    /// Run `list-bindings` as CSV and return stdout.
    pub fn bindings_csv(&self, extra: &[&str]) -> String {
        let output = self
            .command()
            .args(["list-bindings", "--format", "csv"])
            .args(extra)
            .output()
            .expect("Failed to run list-bindings");
        assert!(output.status.success());
        String::from_utf8(output.stdout).expect("Invalid UTF-8")
    }
}

/// A single-environment registry for `--registry` tests.
#[allow(dead_code)]
pub const MINIMAL_REGISTRY: &str = r"
app:
  name: relay
  version: 2.0.0
  owner: relay-team

environments:
  dev:
    description: Development
    is_production: false
    deletion_protected: false
    backups_enabled: false
    size_class: micro
    multi_zone: false
    monitoring:
      detailed: false
      alarms_enabled: false

locations:
  eu-north-1:
    display_name: stockholm
    is_primary: true
    zone_count: 3

networking:
  private_cidr: 10.20.0.0/16
  nat_gateway: true

database:
  engine: postgres
  port: 5432

cache:
  engine: redis
  port: 6379
";
