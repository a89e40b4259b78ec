use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API request failed with {}: {}", status_code, message)]
    Api {
        status_code: StatusCode,
        status: Option<String>,
        message: String,
    },

    #[error("Invalid endpoint `{}`", endpoint)]
    BadEndpoint { endpoint: url::Url },

    #[error("Invalid endpoint URL `{}`", url)]
    BadEndpointUrl { url: String },

    #[error("Bad token: {}", token)]
    BadToken { token: String },

    #[error("Invalid bucket name `{}`: expected 3-63 lowercase letters, digits, `-`, `_` or `.`", name)]
    BadBucketName { name: String },

    #[error("Expected a resource name of the form `.../{}/<id>`, got: {}", collection, name)]
    BadResourceName { collection: String, name: String },

    #[error("Could not parse JSON response.")]
    BadJsonResponse(#[source] reqwest::Error),

    #[error("Operation `{}` finished without a usable response: {}", name, message)]
    BadOperationResponse { name: String, message: String },

    #[error("Operation `{}` failed with code {}: {}", name, code, message)]
    Operation {
        name: String,
        code: i32,
        message: String,
    },

    #[error("Failed to initialise the HTTP client")]
    BuildHttpClient(#[source] reqwest::Error),

    #[error("HTTP request error: {}", message)]
    ReqwestError {
        message: String,
        source: reqwest::Error,
    },

    #[error("Could not read `{}`", path.display())]
    ReadFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// True if the service refused a create because the resource exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Error::Api {
                status_code: StatusCode::CONFLICT,
                ..
            }
        )
    }
}
