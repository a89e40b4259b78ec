use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A long-running operation, as handed out by the prediction and functions services.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<Status>,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// Turn a finished operation carrying an error into [`Error::Operation`].
    pub fn into_checked(self) -> Result<Self> {
        match self.error {
            Some(status) => Err(Error::Operation {
                name: self.name,
                code: status.code,
                message: status.message,
            }),
            None => Ok(self),
        }
    }

    /// Deserialize the response of a finished operation.
    pub fn into_response<ResponseT: DeserializeOwned>(self) -> Result<ResponseT> {
        let operation = self.into_checked()?;
        let response = operation
            .response
            .ok_or_else(|| Error::BadOperationResponse {
                name: operation.name.clone(),
                message: "response is missing".to_owned(),
            })?;
        serde_json::from_value(response).map_err(|error| Error::BadOperationResponse {
            name: operation.name,
            message: error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::endpoint::Endpoint;

    #[test]
    fn test_pending_operation_defaults() {
        let operation: Operation =
            serde_json::from_str(r#"{"name": "operations/abc"}"#).unwrap();
        assert!(!operation.done);
        assert!(operation.error.is_none());
    }

    #[test]
    fn test_into_response_reads_typed_payload() {
        let operation: Operation = serde_json::from_str(
            r#"{
                "name": "projects/p/locations/l/endpoints/1/operations/2",
                "done": true,
                "response": {
                    "@type": "type.googleapis.com/google.cloud.aiplatform.v1.Endpoint",
                    "name": "projects/p/locations/l/endpoints/1",
                    "displayName": "model-endpoint"
                }
            }"#,
        )
        .unwrap();

        let endpoint: Endpoint = operation.into_response().unwrap();
        assert_eq!(endpoint.name.0, "projects/p/locations/l/endpoints/1");
        assert_eq!(endpoint.display_name, "model-endpoint");
    }

    #[test]
    fn test_into_response_without_response() {
        let operation: Operation =
            serde_json::from_str(r#"{"name": "operations/abc", "done": true}"#).unwrap();
        assert!(matches!(
            operation.into_response::<Endpoint>(),
            Err(Error::BadOperationResponse { .. })
        ));
    }

    #[test]
    fn test_error_wins_over_response() {
        let operation: Operation = serde_json::from_str(
            r#"{"name": "operations/abc", "done": true,
                "error": {"code": 7, "message": "Permission denied"},
                "response": {}}"#,
        )
        .unwrap();
        assert!(matches!(
            operation.into_response::<serde_json::Value>(),
            Err(Error::Operation { code: 7, .. })
        ));
    }
}
