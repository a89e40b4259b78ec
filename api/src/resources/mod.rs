pub mod bucket;
pub mod endpoint;
pub mod function;
pub mod model;
pub mod object;
pub mod operation;

use crate::error::{Error, Result};
use reqwest::{blocking::Response as HttpResponse, StatusCode};
use serde::Deserialize;

/// Error envelope shared by the Google REST APIs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ApiError {
    fn into_error(self, status_code: StatusCode) -> Error {
        Error::Api {
            status_code,
            status: self.status,
            message: self.message.unwrap_or_default(),
        }
    }
}

pub(crate) fn into_result<SuccessT>(http_response: HttpResponse) -> Result<SuccessT>
where
    for<'de> SuccessT: Deserialize<'de>,
{
    let status_code = http_response.status();
    if status_code.is_success() {
        return http_response
            .json::<SuccessT>()
            .map_err(Error::BadJsonResponse);
    }

    // Errors raised before the request reaches the service (load balancers,
    // proxies) do not use the JSON envelope, keep their body as the message.
    let body = http_response.text().unwrap_or_default();
    Err(match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(response) => response.error.into_error(status_code),
        Err(_) => Error::Api {
            status_code,
            status: None,
            message: body,
        },
    })
}

/// The last segment of a resource name `.../{collection}/{id}`.
pub(crate) fn trailing_id<'a>(name: &'a str, collection: &str) -> Result<&'a str> {
    match name.rsplit_once('/') {
        Some((parent, id))
            if !id.is_empty() && parent.rsplit('/').next() == Some(collection) =>
        {
            Ok(id)
        }
        _ => Err(Error::BadResourceName {
            collection: collection.to_owned(),
            name: name.to_owned(),
        }),
    }
}
