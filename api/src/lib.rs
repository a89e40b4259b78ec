#![deny(clippy::all)]
mod error;
pub mod resources;

use log::debug;
use once_cell::sync::Lazy;
use reqwest::{
    blocking::{Client as HttpClient, Response as HttpResponse},
    header::{self, HeaderMap, HeaderValue},
    IntoUrl, Method, Proxy,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    fs,
    path::Path,
    thread::sleep,
    time::Duration,
};
use url::Url;

use crate::resources::{
    bucket::CreateRequest as CreateBucketRequest,
    endpoint::{DeployRequest as DeployModelRequest, DEFAULT_TRAFFIC_SPLIT},
    model::UploadRequest as UploadModelRequest,
    object::{ListQuery as ListObjectsQuery, ListResponse as ListObjectsResponse, UploadQuery},
};

pub use crate::{
    error::{Error, Result},
    resources::{
        bucket::{Bucket, Name as BucketName, NewBucket},
        endpoint::{
            DedicatedResources, DeployModelResponse, DeployedModel, Endpoint, Id as EndpointId,
            MachineSpec, Name as EndpointName, NewEndpoint,
        },
        function::{CloudFunction, EventTrigger, Name as FunctionName},
        model::{ContainerSpec, Name as ModelName, NewModel, UploadModelResponse},
        object::{gs_uri, Object, ObjectsPage},
        operation::{Operation, Status as OperationStatus},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(pub String);

/// The services which hand out long-running operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Service {
    AiPlatform,
    Functions,
}

pub struct Config {
    pub project: String,
    pub location: String,
    pub token: Token,
    pub storage_endpoint: Url,
    /// Defaults to the regional endpoint for `location`.
    pub aiplatform_endpoint: Option<Url>,
    pub functions_endpoint: Url,
    pub accept_invalid_certificates: bool,
    pub proxy: Option<Url>,
    /// Time to wait between two polls of a long-running operation.
    pub operation_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project: String::new(),
            location: String::new(),
            token: Token("".to_owned()),
            storage_endpoint: DEFAULT_STORAGE_ENDPOINT.clone(),
            aiplatform_endpoint: None,
            functions_endpoint: DEFAULT_FUNCTIONS_ENDPOINT.clone(),
            accept_invalid_certificates: false,
            proxy: None,
            operation_poll_interval: Duration::from_secs(DEFAULT_OPERATION_POLL_SECONDS),
        }
    }
}

#[derive(Debug)]
pub struct Client {
    endpoints: Endpoints,
    http_client: HttpClient,
    headers: HeaderMap,
    operation_poll_interval: Duration,
}

impl Client {
    /// Create a new API client.
    pub fn new(config: Config) -> Result<Client> {
        let http_client = build_http_client(&config)?;
        let headers = build_headers(&config)?;
        let aiplatform = match config.aiplatform_endpoint {
            Some(endpoint) => endpoint,
            None => regional_aiplatform_endpoint(&config.location)?,
        };
        let endpoints = Endpoints {
            storage: config.storage_endpoint,
            aiplatform,
            functions: config.functions_endpoint,
            project: config.project,
            location: config.location,
        };
        Ok(Client {
            endpoints,
            http_client,
            headers,
            operation_poll_interval: config.operation_poll_interval,
        })
    }

    pub fn project(&self) -> &str {
        &self.endpoints.project
    }

    pub fn location(&self) -> &str {
        &self.endpoints.location
    }

    /// Create a bucket in the configured project.
    ///
    /// A bucket which already exists is reported as an [`Error::Api`] for which
    /// [`Error::is_already_exists`] holds.
    pub fn create_bucket(&self, bucket: NewBucket<'_>) -> Result<Bucket> {
        self.request(
            &Method::POST,
            &self.endpoints.buckets()?,
            &Some(CreateBucketRequest::from(bucket)),
            &Some(vec![("project", self.project())]),
        )
    }

    /// Get a page of objects whose names start with `prefix`.
    pub fn get_objects_page(
        &self,
        bucket_name: &BucketName,
        prefix: &str,
        page_token: Option<&str>,
        max_results: Option<usize>,
    ) -> Result<ObjectsPage> {
        let response: ListObjectsResponse = self.request(
            &Method::GET,
            &self.endpoints.objects(bucket_name)?,
            &None::<()>,
            &Some(ListObjectsQuery {
                prefix,
                page_token,
                max_results,
            }),
        )?;
        Ok(response.into())
    }

    /// Whether at least one object exists under `prefix`.
    pub fn has_objects_with_prefix(&self, bucket_name: &BucketName, prefix: &str) -> Result<bool> {
        Ok(!self
            .get_objects_page(bucket_name, prefix, None, Some(1))?
            .objects
            .is_empty())
    }

    /// Upload raw bytes as a single object.
    pub fn upload_object(
        &self,
        bucket_name: &BucketName,
        object_name: &str,
        content: Vec<u8>,
        timeout: Option<Duration>,
    ) -> Result<Object> {
        let url = self.endpoints.upload_objects(bucket_name)?;
        debug!("Attempting POST `{}` for object `{}`", url, object_name);

        let mut request = self
            .http_client
            .post(url)
            .headers(self.headers.clone())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .query(&UploadQuery {
                upload_type: "media",
                name: object_name,
            })
            .body(content);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let http_response = request.send().map_err(|source| Error::ReqwestError {
            source,
            message: format!("Upload of object `{object_name}` failed."),
        })?;
        resources::into_result(http_response)
    }

    /// Upload the contents of a local file as a single object.
    pub fn upload_file(
        &self,
        bucket_name: &BucketName,
        object_name: &str,
        path: impl AsRef<Path>,
        timeout: Option<Duration>,
    ) -> Result<Object> {
        let content = fs::read(path.as_ref()).map_err(|source| Error::ReadFile {
            path: path.as_ref().to_owned(),
            source,
        })?;
        self.upload_object(bucket_name, object_name, content, timeout)
    }

    /// Register a model with the prediction service.
    ///
    /// The returned operation resolves to an [`UploadModelResponse`].
    pub fn upload_model(&self, model: NewModel<'_>) -> Result<Operation> {
        self.post(
            self.endpoints.upload_model()?,
            UploadModelRequest { model },
        )
    }

    /// Create a new endpoint. The returned operation resolves to an [`Endpoint`].
    pub fn create_endpoint(&self, endpoint: NewEndpoint<'_>) -> Result<Operation> {
        self.post(self.endpoints.endpoints()?, endpoint)
    }

    /// Deploy a model onto an endpoint, sending all traffic to it.
    ///
    /// The returned operation resolves to a [`DeployModelResponse`].
    pub fn deploy_model(
        &self,
        endpoint_name: &EndpointName,
        deployed_model: DeployedModel<'_>,
    ) -> Result<Operation> {
        self.post(
            self.endpoints.deploy_model(endpoint_name)?,
            DeployModelRequest {
                deployed_model,
                traffic_split: DEFAULT_TRAFFIC_SPLIT.clone(),
            },
        )
    }

    /// Create a new function. The returned operation resolves to a [`CloudFunction`].
    pub fn create_function(&self, function: &CloudFunction) -> Result<Operation> {
        self.post(self.endpoints.functions()?, function)
    }

    pub fn get_operation(&self, service: Service, operation_name: &str) -> Result<Operation> {
        self.get(self.endpoints.operation(service, operation_name)?)
    }

    /// Poll an operation until it is done.
    ///
    /// An operation which finished with an error is returned as [`Error::Operation`].
    pub fn wait_for_operation(&self, service: Service, operation: Operation) -> Result<Operation> {
        let mut operation = operation;
        while !operation.done {
            debug!(
                "Operation `{}` still running, polling again in {:?}",
                operation.name, self.operation_poll_interval
            );
            sleep(self.operation_poll_interval);
            operation = self.get_operation(service, &operation.name)?;
        }
        operation.into_checked()
    }

    fn get<LocationT, SuccessT>(&self, url: LocationT) -> Result<SuccessT>
    where
        LocationT: IntoUrl + Display + Clone,
        for<'de> SuccessT: Deserialize<'de>,
    {
        self.request(&Method::GET, &url, &None::<()>, &None::<()>)
    }

    fn post<LocationT, RequestT, SuccessT>(&self, url: LocationT, request: RequestT) -> Result<SuccessT>
    where
        LocationT: IntoUrl + Display + Clone,
        RequestT: Serialize,
        for<'de> SuccessT: Deserialize<'de>,
    {
        self.request(&Method::POST, &url, &Some(request), &None::<()>)
    }

    fn raw_request<LocationT, RequestT, QueryT>(
        &self,
        method: &Method,
        url: &LocationT,
        body: &Option<RequestT>,
        query: &Option<QueryT>,
    ) -> Result<HttpResponse>
    where
        LocationT: IntoUrl + Display + Clone,
        RequestT: Serialize,
        QueryT: Serialize,
    {
        let request = self
            .http_client
            .request(method.clone(), url.clone())
            .headers(self.headers.clone());
        let request = match &query {
            Some(query) => request.query(query),
            None => request,
        };
        let request = match &body {
            Some(body) => request.json(body),
            None => request,
        };

        request.send().map_err(|source| Error::ReqwestError {
            source,
            message: format!("{method} operation failed."),
        })
    }

    fn request<LocationT, RequestT, SuccessT, QueryT>(
        &self,
        method: &Method,
        url: &LocationT,
        body: &Option<RequestT>,
        query: &Option<QueryT>,
    ) -> Result<SuccessT>
    where
        LocationT: IntoUrl + Display + Clone,
        RequestT: Serialize,
        QueryT: Serialize,
        for<'de> SuccessT: Deserialize<'de>,
    {
        debug!("Attempting {} `{}`", method, url);
        let http_response = self.raw_request(method, url, body, query)?;
        resources::into_result(http_response)
    }
}

#[derive(Debug)]
struct Endpoints {
    storage: Url,
    aiplatform: Url,
    functions: Url,
    project: String,
    location: String,
}

fn construct_endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut endpoint = base.clone();

    let mut endpoint_segments = endpoint
        .path_segments_mut()
        .map_err(|_| Error::BadEndpoint {
            endpoint: base.clone(),
        })?;

    for segment in segments {
        endpoint_segments.push(segment);
    }

    drop(endpoint_segments);

    Ok(endpoint)
}

impl Endpoints {
    fn buckets(&self) -> Result<Url> {
        construct_endpoint(&self.storage, &["storage", "v1", "b"])
    }

    fn objects(&self, bucket_name: &BucketName) -> Result<Url> {
        construct_endpoint(&self.storage, &["storage", "v1", "b", &bucket_name.0, "o"])
    }

    fn upload_objects(&self, bucket_name: &BucketName) -> Result<Url> {
        construct_endpoint(
            &self.storage,
            &["upload", "storage", "v1", "b", &bucket_name.0, "o"],
        )
    }

    fn upload_model(&self) -> Result<Url> {
        construct_endpoint(
            &self.aiplatform,
            &[
                "v1",
                "projects",
                &self.project,
                "locations",
                &self.location,
                "models:upload",
            ],
        )
    }

    fn endpoints(&self) -> Result<Url> {
        construct_endpoint(
            &self.aiplatform,
            &[
                "v1",
                "projects",
                &self.project,
                "locations",
                &self.location,
                "endpoints",
            ],
        )
    }

    fn deploy_model(&self, endpoint_name: &EndpointName) -> Result<Url> {
        let verb = format!("{}:deployModel", endpoint_name.0);
        let mut segments = vec!["v1"];
        segments.extend(verb.split('/'));
        construct_endpoint(&self.aiplatform, &segments)
    }

    fn functions(&self) -> Result<Url> {
        construct_endpoint(
            &self.functions,
            &[
                "v1",
                "projects",
                &self.project,
                "locations",
                &self.location,
                "functions",
            ],
        )
    }

    fn operation(&self, service: Service, operation_name: &str) -> Result<Url> {
        let base = match service {
            Service::AiPlatform => &self.aiplatform,
            Service::Functions => &self.functions,
        };
        let mut segments = vec!["v1"];
        segments.extend(operation_name.split('/'));
        construct_endpoint(base, &segments)
    }
}

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 120;
const DEFAULT_OPERATION_POLL_SECONDS: u64 = 5;

fn build_http_client(config: &Config) -> Result<HttpClient> {
    let mut builder = HttpClient::builder()
        .gzip(true)
        .danger_accept_invalid_certs(config.accept_invalid_certificates)
        .timeout(Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS)));

    if let Some(proxy) = config.proxy.clone() {
        builder = builder.proxy(Proxy::all(proxy).map_err(Error::BuildHttpClient)?);
    }
    builder.build().map_err(Error::BuildHttpClient)
}

fn build_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", &config.token.0)).map_err(|_| {
            Error::BadToken {
                token: config.token.0.clone(),
            }
        })?,
    );
    Ok(headers)
}

/// The Vertex AI endpoint serving `location`, e.g. `https://us-central1-aiplatform.googleapis.com`.
pub fn regional_aiplatform_endpoint(location: &str) -> Result<Url> {
    let raw = format!("https://{location}-aiplatform.googleapis.com");
    Url::parse(&raw).map_err(|_| Error::BadEndpointUrl { url: raw })
}

pub static DEFAULT_STORAGE_ENDPOINT: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://storage.googleapis.com").expect("Default URL is well-formed")
});

pub static DEFAULT_FUNCTIONS_ENDPOINT: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://cloudfunctions.googleapis.com").expect("Default URL is well-formed")
});
