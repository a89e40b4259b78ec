use anyhow::{Context, Result};
use log::info;
use mldeploy_client::{
    gs_uri, BucketName, Client, ContainerSpec, DedicatedResources, DeployModelResponse,
    DeployedModel, Endpoint, EndpointId, EndpointName, MachineSpec, ModelName, NewEndpoint,
    NewModel, Service, UploadModelResponse,
};
use serde::Serialize;
use structopt::StructOpt;

use crate::{commands::create::bucket::require_bucket_name, config::DeployConfig, printer::Printer};

pub const SERVING_IMAGE_URI: &str = "gcr.io/cloud-aiplatform/prediction/tf2-cpu.2-8:latest";
pub const MACHINE_TYPE: &str = "n1-standard-4";
pub const MIN_REPLICA_COUNT: u32 = 1;
pub const MAX_REPLICA_COUNT: u32 = 2;

#[derive(Debug, StructOpt)]
pub struct DeployModelArgs {
    #[structopt(long = "bucket")]
    /// Bucket holding the model artifact. Defaults to the configured bucket.
    bucket: Option<BucketName>,

    #[structopt(long = "display-name")]
    /// Display name of the model. The endpoint is named after it.
    display_name: Option<String>,

    #[structopt(long = "prefix")]
    /// Object name prefix the artifact was uploaded under.
    prefix: Option<String>,
}

/// Resources created by a model deployment.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDeployment {
    pub model: ModelName,
    pub endpoint: EndpointName,
    pub endpoint_id: EndpointId,
    pub deployed_model_id: String,
}

pub fn deploy(
    client: &Client,
    args: &DeployModelArgs,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    let DeployModelArgs {
        bucket,
        display_name,
        prefix,
    } = args;

    let bucket = require_bucket_name(bucket.as_ref(), config)?;
    let display_name = display_name.as_deref().unwrap_or(&config.model_display_name);
    let prefix = prefix.as_deref().unwrap_or(&config.bucket_model_path);

    let deployment = deploy_model(client, &bucket, display_name, prefix)?;
    printer.print_resources(&[deployment])?;
    Ok(())
}

/// Register the artifact under `prefix` as a model, then serve it from a new endpoint.
///
/// Every call creates a new model and a new endpoint, even if resources with
/// the same display names exist.
pub fn deploy_model(
    client: &Client,
    bucket_name: &BucketName,
    display_name: &str,
    prefix: &str,
) -> Result<ModelDeployment> {
    let artifact_uri = artifact_uri(bucket_name, prefix);

    info!("Registering model `{}` from `{}`", display_name, artifact_uri);
    let operation = client
        .upload_model(NewModel {
            display_name,
            artifact_uri: &artifact_uri,
            container_spec: ContainerSpec {
                image_uri: SERVING_IMAGE_URI,
            },
        })
        .context("Operation to upload a model has failed")?;
    let model = client
        .wait_for_operation(Service::AiPlatform, operation)?
        .into_response::<UploadModelResponse>()
        .context("Model upload did not finish successfully")?
        .model;
    info!("Registered model `{}`", model);

    let endpoint_display_name = format!("{display_name}-endpoint");
    info!("Creating endpoint `{}`", endpoint_display_name);
    let operation = client
        .create_endpoint(NewEndpoint {
            display_name: &endpoint_display_name,
        })
        .context("Operation to create an endpoint has failed")?;
    let endpoint = client
        .wait_for_operation(Service::AiPlatform, operation)?
        .into_response::<Endpoint>()
        .context("Endpoint creation did not finish successfully")?
        .name;
    let endpoint_id = endpoint.id()?;
    info!("Created endpoint `{}`", endpoint);

    info!(
        "Deploying model onto endpoint {} with {}, {}-{} replicas",
        endpoint_id, MACHINE_TYPE, MIN_REPLICA_COUNT, MAX_REPLICA_COUNT
    );
    let operation = client
        .deploy_model(
            &endpoint,
            DeployedModel {
                model: &model,
                display_name,
                dedicated_resources: DedicatedResources {
                    machine_spec: MachineSpec {
                        machine_type: MACHINE_TYPE,
                    },
                    min_replica_count: MIN_REPLICA_COUNT,
                    max_replica_count: MAX_REPLICA_COUNT,
                },
            },
        )
        .context("Operation to deploy a model has failed")?;
    let deployed_model_id = client
        .wait_for_operation(Service::AiPlatform, operation)?
        .into_response::<DeployModelResponse>()
        .context("Model deployment did not finish successfully")?
        .deployed_model
        .id;
    info!(
        "Model `{}` deployed to endpoint {} [deployed model id: {}]",
        display_name, endpoint_id, deployed_model_id
    );

    Ok(ModelDeployment {
        model,
        endpoint,
        endpoint_id,
        deployed_model_id,
    })
}

/// The artifact is addressed by the first segment of the prefix only.
fn artifact_uri(bucket_name: &BucketName, prefix: &str) -> String {
    let directory = prefix
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    gs_uri(bucket_name, directory)
}
