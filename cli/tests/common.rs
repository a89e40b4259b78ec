use mockito::Server;
use serde_json::{json, Value};
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
};
use tempfile::TempDir;

/// Runs the built `mldeploy` binary with every service pointed at a mock server.
pub struct TestCli {
    config_dir: TempDir,
}

impl TestCli {
    pub fn new(server: &Server) -> Self {
        Self::with_config(server, json!({}))
    }

    /// Like `new`, with `overrides` merged into the top level of the configuration file.
    pub fn with_config(server: &Server, overrides: Value) -> Self {
        let mut config = json!({
            "project_id": "test-project",
            "location": "us-central1",
            "token": "test-token",
            "endpoints": {
                "storage": server.url(),
                "aiplatform": server.url(),
                "functions": server.url(),
            }
        });
        if let (Some(config), Some(overrides)) = (config.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                config.insert(key.clone(), value.clone());
            }
        }

        let config_dir = TempDir::new().unwrap();
        fs::write(
            config_dir.path().join("config.json"),
            serde_json::to_vec_pretty(&config).unwrap(),
        )
        .unwrap();
        TestCli { config_dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.json")
    }

    /// Scratch directory which lives as long as this `TestCli`.
    pub fn scratch_dir(&self) -> &Path {
        self.config_dir.path()
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_mldeploy"));
        command
            .arg("--config-file")
            .arg(self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("GOOGLE_OAUTH_ACCESS_TOKEN")
            .env_remove("NGROK_AUTHTOKEN");
        command
    }

    pub fn run(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> String {
        self.output(self.command().args(args))
    }

    /// Run a command expected to succeed, returning `(stdout, stderr)`.
    pub fn run_with_logs(
        &self,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> (String, String) {
        let output = self.checked_output(self.command().args(args));
        (
            String::from_utf8(output.stdout).unwrap(),
            String::from_utf8(output.stderr).unwrap(),
        )
    }

    /// Start a long running command, with stdout and stderr piped back to the test.
    pub fn spawn(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Child {
        self.command()
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap()
    }

    pub fn run_and_error(&self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> String {
        self.output_error(self.command().args(args))
    }

    pub fn output(&self, command: &mut Command) -> String {
        String::from_utf8(self.checked_output(command).stdout).unwrap()
    }

    pub fn output_error(&self, command: &mut Command) -> String {
        let output = command.output().unwrap();

        if output.status.success() {
            panic!(
                "succeeded running command (expected failure):\n{}",
                String::from_utf8_lossy(&output.stdout)
            );
        }

        String::from_utf8(output.stderr).unwrap()
    }

    fn checked_output(&self, command: &mut Command) -> Output {
        let output = command.output().unwrap();

        if !output.status.success() {
            panic!(
                "failed to run command:\n{}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        output
    }
}
