use anyhow::Result;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use workforce_planner::catalog::WorkerDescriptor;
use workforce_planner::config::Config;
use workforce_planner::WorkflowPlanner;

pub const AUTH_TASK: &str =
    "implement secure user authentication with JWT tokens, password hashing, and rate limiting";

/// Test utilities for integration tests
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment with its own config file location
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.child("config.toml").path().to_path_buf();
        Ok(Self {
            temp_dir,
            config_path,
        })
    }

    /// Run the planner binary against this environment's config file
    pub async fn run_planner(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new(env!("CARGO_BIN_EXE_workforce-planner"))
            .arg("--config")
            .arg(&self.config_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("RUST_LOG", "off")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run workforce-planner: {}", e))
    }

    /// Write a file into the environment and return its path
    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let child = self.temp_dir.child(name);
        child.write_str(content)?;
        Ok(child.path().to_path_buf())
    }
}

/// Planner over the built-in tables with warm-up off
pub fn test_planner() -> WorkflowPlanner {
    let mut config = Config::default();
    config.planner.warmup_enabled = false;
    WorkflowPlanner::new(&config).expect("built-in tables load")
}

/// Assert that a string contains the given text (case-insensitive)
pub fn assert_contains(text: &str, needle: &str) {
    assert!(
        text.to_lowercase().contains(&needle.to_lowercase()),
        "Expected '{}' to contain '{}'",
        text,
        needle
    );
}

/// Assert that a command output is successful
pub fn assert_success(output: &std::process::Output) {
    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "Command failed with exit code {}\nStdout: {}\nStderr: {}",
            output.status.code().unwrap_or(-1),
            stdout,
            stderr
        );
    }
}

/// Convert process output to a string
pub fn output_to_string(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Convert process stderr to a string
pub fn stderr_to_string(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Whether any capability tag of `worker` contains `needle`
pub fn has_tag_containing(worker: &WorkerDescriptor, needle: &str) -> bool {
    worker.tags.iter().any(|t| t.contains(needle))
}
