use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

use crate::resources::bucket::Name as BucketName;

/// Event fired by the storage service once an object is fully written.
pub const OBJECT_FINALIZE_EVENT: &str = "google.storage.object.finalize";

/// A function as submitted to, and returned by, the functions service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFunction {
    pub name: Name,
    pub entry_point: String,
    pub runtime: String,
    pub source_archive_url: String,
    pub event_trigger: EventTrigger,
    /// Duration in seconds with an `s` suffix, e.g. `540s`.
    pub timeout: String,
    pub available_memory_mb: u32,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,

    // Output only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    pub event_type: String,
    pub resource: String,
}

impl EventTrigger {
    /// Fire on every object finalized in `bucket_name`.
    pub fn object_finalize(bucket_name: &BucketName) -> Self {
        Self {
            event_type: OBJECT_FINALIZE_EVENT.to_owned(),
            resource: format!("projects/_/buckets/{}", bucket_name.0),
        }
    }
}

/// Fully qualified function name, `projects/{p}/locations/{l}/functions/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    pub fn new(project: &str, location: &str, function: &str) -> Self {
        Name(format!(
            "projects/{project}/locations/{location}/functions/{function}"
        ))
    }
}

impl Display for Name {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_request_omits_output_fields() {
        let function = CloudFunction {
            name: Name::new("cloudcomputing-411615", "us-central1", "Preprocess_function"),
            entry_point: "handle_request".to_owned(),
            runtime: "python39".to_owned(),
            source_archive_url: "gs://model_bucket/cloud_function.zip".to_owned(),
            event_trigger: EventTrigger::object_finalize(&BucketName("model_bucket".to_owned())),
            timeout: "540s".to_owned(),
            available_memory_mb: 256,
            environment_variables: BTreeMap::from([(
                "ENDPOINT_ID".to_owned(),
                "1234".to_owned(),
            )]),
            status: None,
            version_id: None,
            update_time: None,
        };

        assert_eq!(
            serde_json::to_value(&function).unwrap(),
            json!({
                "name": "projects/cloudcomputing-411615/locations/us-central1/functions/Preprocess_function",
                "entryPoint": "handle_request",
                "runtime": "python39",
                "sourceArchiveUrl": "gs://model_bucket/cloud_function.zip",
                "eventTrigger": {
                    "eventType": "google.storage.object.finalize",
                    "resource": "projects/_/buckets/model_bucket"
                },
                "timeout": "540s",
                "availableMemoryMb": 256,
                "environmentVariables": {"ENDPOINT_ID": "1234"}
            })
        );
    }
}
