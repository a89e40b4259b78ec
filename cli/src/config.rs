use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use url::Url;

/// Settings for a deployment, read from the configuration file.
///
/// Every field has a default, so a partial (or missing) file is valid. Command
/// line flags take precedence over anything set here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    pub project_id: String,
    pub location: String,
    /// Bucket to deploy into; a random name is generated when unset.
    pub bucket_name: Option<String>,
    pub local_model_path: PathBuf,
    /// Prefix in the bucket under which the model artifact is stored.
    pub bucket_model_path: String,
    pub model_display_name: String,
    pub function_name: String,
    pub function_source_path: PathBuf,
    pub function_entry_point: String,
    pub function_runtime: String,
    /// Bucket whose new objects trigger the function, the deployment bucket if unset.
    pub trigger_bucket: Option<String>,
    pub receiver_port: u16,
    pub token: Option<String>,
    pub ngrok_token: Option<String>,
    pub accept_invalid_certificates: bool,
    pub proxy: Option<Url>,
    pub endpoints: ServiceEndpoints,
}

/// Overrides for service base URLs, for emulators and tests.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceEndpoints {
    pub storage: Option<Url>,
    pub aiplatform: Option<Url>,
    pub functions: Option<Url>,
    pub ngrok_api: Option<Url>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project_id: "cloudcomputing-411615".to_owned(),
            location: "us-central1".to_owned(),
            bucket_name: None,
            local_model_path: PathBuf::from("Model/"),
            bucket_model_path: "model".to_owned(),
            model_display_name: "cloud_project_prediction_model".to_owned(),
            function_name: "Preprocess_function".to_owned(),
            function_source_path: PathBuf::from("Google_Cloud_Function/"),
            function_entry_point: "handle_request".to_owned(),
            function_runtime: "python39".to_owned(),
            trigger_bucket: None,
            receiver_port: 5000,
            token: None,
            ngrok_token: None,
            accept_invalid_certificates: false,
            proxy: None,
            endpoints: ServiceEndpoints::default(),
        }
    }
}

pub fn read_deploy_config(path: impl AsRef<Path>) -> Result<DeployConfig> {
    debug!("Reading config file at `{}`", path.as_ref().display());
    if path.as_ref().exists() {
        let file = File::open(&path)
            .with_context(|| format!("Could not open config file `{}`", path.as_ref().display()))?;
        let config_reader = BufReader::new(file);
        serde_json::from_reader(config_reader)
            .with_context(|| format!("Could not parse config file `{}`", path.as_ref().display()))
    } else {
        Ok(Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_deploy_config(dir.path().join("config.json")).unwrap();
        assert_eq!(config.project_id, "cloudcomputing-411615");
        assert_eq!(config.receiver_port, 5000);
        assert!(config.bucket_name.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"project_id": "my-project", "endpoints": {{"storage": "http://localhost:4443"}}}}"#
        )
        .unwrap();

        let config = read_deploy_config(file.path()).unwrap();
        assert_eq!(config.project_id, "my-project");
        assert_eq!(config.location, "us-central1");
        assert_eq!(
            config.endpoints.storage.unwrap().as_str(),
            "http://localhost:4443/"
        );
        assert!(config.endpoints.functions.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(read_deploy_config(file.path()).is_err());
    }
}
