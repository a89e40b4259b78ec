use anyhow::Result;
use log::info;
use mldeploy_client::{BucketName, Client};
use std::slice;
use structopt::StructOpt;

use crate::{
    commands::{
        create::bucket::{provision_bucket, resolve_bucket_name},
        deploy::{
            function::{deploy_function, resolve_trigger_bucket, FunctionSpec},
            model::deploy_model,
        },
        serve::{print_payload, TunnelArgs},
        upload::model::upload_artifact,
    },
    config::DeployConfig,
    printer::Printer,
    receiver::Receiver,
};

#[derive(Debug, StructOpt)]
pub struct RunArgs {
    #[structopt(long = "bucket")]
    /// Bucket to deploy into. A random name is generated if neither this nor
    /// the configuration file set one.
    bucket: Option<BucketName>,

    #[structopt(flatten)]
    tunnel: TunnelArgs,
}

/// Deploy everything, then handle callbacks until killed.
///
/// Steps run strictly in order and the first failure stops the run. Nothing
/// created by earlier steps is cleaned up.
pub fn run(args: &RunArgs, client: &Client, config: &DeployConfig, printer: &Printer) -> Result<()> {
    let RunArgs { bucket, tunnel } = args;

    let port = tunnel.port(config);
    let tunnel = tunnel.open(config)?;

    let bucket = resolve_bucket_name(bucket.as_ref(), config)?;
    provision_bucket(client, &bucket, &config.location)?;

    upload_artifact(
        client,
        &bucket,
        &config.local_model_path,
        &config.bucket_model_path,
    )?;

    let deployment = deploy_model(
        client,
        &bucket,
        &config.model_display_name,
        &config.bucket_model_path,
    )?;
    printer.print_resources(slice::from_ref(&deployment))?;

    let trigger_bucket = resolve_trigger_bucket(None, config, &bucket)?;
    let function = deploy_function(
        client,
        &bucket,
        &FunctionSpec::from_config(config, &trigger_bucket),
        &deployment.endpoint_id,
        tunnel.public_url(),
    )?;
    printer.print_resources(&[function])?;

    info!(
        "Deployment finished, callbacks arrive through {}",
        tunnel.public_url()
    );
    Receiver::bind(port)?.serve(print_payload)
}
