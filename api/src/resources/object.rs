use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resources::bucket::Name as BucketName;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    pub name: String,
    pub bucket: String,
    /// Size in bytes, the storage API encodes it as a decimal string.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ObjectsPage {
    pub objects: Vec<Object>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery<'request> {
    pub prefix: &'request str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'request str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse {
    // Omitted entirely when nothing matches the prefix.
    #[serde(default)]
    pub items: Vec<Object>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl From<ListResponse> for ObjectsPage {
    fn from(response: ListResponse) -> Self {
        Self {
            objects: response.items,
            next_page_token: response.next_page_token,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploadQuery<'request> {
    #[serde(rename = "uploadType")]
    pub upload_type: &'static str,
    pub name: &'request str,
}

/// The `gs://` URI of an object or prefix in a bucket.
pub fn gs_uri(bucket_name: &BucketName, path: &str) -> String {
    format!("gs://{}/{}", bucket_name.0, path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gs_uri() {
        let bucket = BucketName("model_bucket".to_owned());
        assert_eq!(gs_uri(&bucket, "model"), "gs://model_bucket/model");
        assert_eq!(
            gs_uri(&bucket, "/cloud_function.zip"),
            "gs://model_bucket/cloud_function.zip"
        );
    }

    #[test]
    fn test_list_response_without_items() {
        let response: ListResponse =
            serde_json::from_str(r#"{"kind": "storage#objects"}"#).unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }
}
