pub mod function;
pub mod model;

use anyhow::Result;
use mldeploy_client::Client;
use structopt::StructOpt;

use self::{function::DeployFunctionArgs, model::DeployModelArgs};
use crate::{config::DeployConfig, printer::Printer};

#[derive(Debug, StructOpt)]
pub enum DeployArgs {
    #[structopt(name = "model")]
    /// Register an uploaded model and deploy it onto a new endpoint
    Model(DeployModelArgs),

    #[structopt(name = "function")]
    /// Package a source directory and create a storage-triggered function
    Function(DeployFunctionArgs),
}

pub fn run(
    deploy_args: &DeployArgs,
    client: &Client,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    match deploy_args {
        DeployArgs::Model(model_args) => model::deploy(client, model_args, config, printer),
        DeployArgs::Function(function_args) => {
            function::deploy(client, function_args, config, printer)
        }
    }
}
