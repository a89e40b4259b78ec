use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Resource name of a registered model, `projects/{p}/locations/{l}/models/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Display for Name {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModel<'request> {
    pub display_name: &'request str,
    pub artifact_uri: &'request str,
    pub container_spec: ContainerSpec<'request>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec<'request> {
    pub image_uri: &'request str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploadRequest<'request> {
    pub model: NewModel<'request>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadModelResponse {
    pub model: Name,
    #[serde(default)]
    pub model_version_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_request_format() {
        let request = UploadRequest {
            model: NewModel {
                display_name: "cloud_project_prediction_model",
                artifact_uri: "gs://model_bucket/model",
                container_spec: ContainerSpec {
                    image_uri: "gcr.io/cloud-aiplatform/prediction/tf2-cpu.2-8:latest",
                },
            },
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "model": {
                    "displayName": "cloud_project_prediction_model",
                    "artifactUri": "gs://model_bucket/model",
                    "containerSpec": {
                        "imageUri": "gcr.io/cloud-aiplatform/prediction/tf2-cpu.2-8:latest"
                    }
                }
            })
        );
    }
}
