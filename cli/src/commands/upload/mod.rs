pub mod model;

use anyhow::Result;
use mldeploy_client::Client;
use structopt::StructOpt;

use self::model::UploadModelArgs;
use crate::{config::DeployConfig, printer::Printer};

#[derive(Debug, StructOpt)]
pub enum UploadArgs {
    #[structopt(name = "model")]
    /// Copy a local model directory into a bucket, unless already there
    Model(UploadModelArgs),
}

pub fn run(
    upload_args: &UploadArgs,
    client: &Client,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    match upload_args {
        UploadArgs::Model(model_args) => model::upload(client, model_args, config, printer),
    }
}
