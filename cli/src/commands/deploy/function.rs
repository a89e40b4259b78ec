use anyhow::{Context, Result};
use log::info;
use mldeploy_client::{
    gs_uri, BucketName, Client, CloudFunction, EndpointId, EventTrigger, FunctionName, Service,
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use structopt::StructOpt;

use crate::{
    archive::zip_directory,
    commands::{create::bucket::require_bucket_name, upload::model::UPLOAD_TIMEOUT},
    config::DeployConfig,
    printer::Printer,
};

/// Object name of the uploaded source archive.
pub const ARCHIVE_OBJECT_NAME: &str = "cloud_function.zip";
pub const FUNCTION_TIMEOUT: &str = "540s";
pub const FUNCTION_MEMORY_MB: u32 = 256;

#[derive(Debug, StructOpt)]
pub struct DeployFunctionArgs {
    #[structopt(long = "endpoint-id")]
    /// Id of the prediction endpoint the function should call.
    endpoint_id: String,

    #[structopt(long = "callback-url")]
    /// Public URL the function posts prediction results to.
    callback_url: String,

    #[structopt(long = "bucket")]
    /// Bucket to upload the source archive into. Defaults to the configured bucket.
    bucket: Option<BucketName>,

    #[structopt(long = "trigger-bucket")]
    /// Bucket whose new objects trigger the function. Defaults to `--bucket`.
    trigger_bucket: Option<BucketName>,

    #[structopt(long = "name")]
    /// Short name of the function.
    name: Option<String>,

    #[structopt(long = "source-path", parse(from_os_str))]
    /// Local directory with the function sources.
    source_path: Option<PathBuf>,

    #[structopt(long = "entry-point")]
    /// Name of the handler invoked by the runtime.
    entry_point: Option<String>,

    #[structopt(long = "runtime")]
    /// Runtime to run the function on, e.g. `python39`.
    runtime: Option<String>,
}

/// What to deploy, independent of where it is deployed to.
#[derive(Debug, Clone)]
pub struct FunctionSpec<'a> {
    pub name: &'a str,
    pub source_path: &'a Path,
    pub entry_point: &'a str,
    pub runtime: &'a str,
    pub trigger_bucket: &'a BucketName,
}

impl<'a> FunctionSpec<'a> {
    /// The function described by the configuration, triggered by `trigger_bucket`.
    pub fn from_config(config: &'a DeployConfig, trigger_bucket: &'a BucketName) -> Self {
        Self {
            name: &config.function_name,
            source_path: &config.function_source_path,
            entry_point: &config.function_entry_point,
            runtime: &config.function_runtime,
            trigger_bucket,
        }
    }
}

pub fn deploy(
    client: &Client,
    args: &DeployFunctionArgs,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    let DeployFunctionArgs {
        endpoint_id,
        callback_url,
        bucket,
        trigger_bucket,
        name,
        source_path,
        entry_point,
        runtime,
    } = args;

    let bucket = require_bucket_name(bucket.as_ref(), config)?;
    let trigger_bucket = resolve_trigger_bucket(trigger_bucket.as_ref(), config, &bucket)?;
    let spec = FunctionSpec {
        name: name.as_deref().unwrap_or(&config.function_name),
        source_path: source_path.as_ref().unwrap_or(&config.function_source_path),
        entry_point: entry_point.as_deref().unwrap_or(&config.function_entry_point),
        runtime: runtime.as_deref().unwrap_or(&config.function_runtime),
        trigger_bucket: &trigger_bucket,
    };

    let function = deploy_function(
        client,
        &bucket,
        &spec,
        &EndpointId(endpoint_id.clone()),
        callback_url,
    )?;
    printer.print_resources(&[function])?;
    Ok(())
}

/// The trigger bucket from the command line, else the configured one, else `bucket`.
pub fn resolve_trigger_bucket(
    trigger_bucket: Option<&BucketName>,
    config: &DeployConfig,
    bucket: &BucketName,
) -> Result<BucketName> {
    match (trigger_bucket, &config.trigger_bucket) {
        (Some(trigger_bucket), _) => Ok(trigger_bucket.clone()),
        (None, Some(configured)) => configured
            .parse()
            .with_context(|| format!("Invalid trigger bucket `{configured}` in configuration")),
        (None, None) => Ok(bucket.clone()),
    }
}

/// Zip and upload the function sources, then create the function and wait for it.
pub fn deploy_function(
    client: &Client,
    bucket_name: &BucketName,
    spec: &FunctionSpec,
    endpoint_id: &EndpointId,
    callback_url: &str,
) -> Result<CloudFunction> {
    let archive = zip_directory(spec.source_path).with_context(|| {
        format!(
            "Could not package function sources in `{}`",
            spec.source_path.display()
        )
    })?;
    info!(
        "Uploading {} byte source archive to `{}`",
        archive.len(),
        gs_uri(bucket_name, ARCHIVE_OBJECT_NAME)
    );
    client
        .upload_object(
            bucket_name,
            ARCHIVE_OBJECT_NAME,
            archive,
            Some(UPLOAD_TIMEOUT),
        )
        .context("Could not upload function source archive")?;

    let request = function_request(
        client.project(),
        client.location(),
        bucket_name,
        spec,
        endpoint_id,
        callback_url,
    );
    info!(
        "Creating function `{}` triggered by `{}`",
        request.name, request.event_trigger.resource
    );
    let operation = client
        .create_function(&request)
        .with_context(|| format!("Operation to create function `{}` has failed", spec.name))?;
    let function = client
        .wait_for_operation(Service::Functions, operation)?
        .into_response::<CloudFunction>()
        .with_context(|| format!("Creation of function `{}` did not finish", spec.name))?;
    info!("Function `{}` deployed", function.name);
    Ok(function)
}

pub fn function_request(
    project: &str,
    location: &str,
    bucket_name: &BucketName,
    spec: &FunctionSpec,
    endpoint_id: &EndpointId,
    callback_url: &str,
) -> CloudFunction {
    let environment_variables = BTreeMap::from([
        ("PROJECT".to_owned(), project.to_owned()),
        ("ENDPOINT_ID".to_owned(), endpoint_id.0.clone()),
        ("ngrok_url".to_owned(), callback_url.to_owned()),
    ]);

    CloudFunction {
        name: FunctionName::new(project, location, spec.name),
        entry_point: spec.entry_point.to_owned(),
        runtime: spec.runtime.to_owned(),
        source_archive_url: gs_uri(bucket_name, ARCHIVE_OBJECT_NAME),
        event_trigger: EventTrigger::object_finalize(spec.trigger_bucket),
        timeout: FUNCTION_TIMEOUT.to_owned(),
        available_memory_mb: FUNCTION_MEMORY_MB,
        environment_variables,
        status: None,
        version_id: None,
        update_time: None,
    }
}
