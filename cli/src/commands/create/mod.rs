pub mod bucket;

use anyhow::Result;
use mldeploy_client::Client;
use structopt::StructOpt;

use self::bucket::CreateBucketArgs;
use crate::{config::DeployConfig, printer::Printer};

#[derive(Debug, StructOpt)]
pub enum CreateArgs {
    #[structopt(name = "bucket")]
    /// Create a bucket, succeeding if it already exists
    Bucket(CreateBucketArgs),
}

pub fn run(
    create_args: &CreateArgs,
    client: &Client,
    config: &DeployConfig,
    printer: &Printer,
) -> Result<()> {
    match create_args {
        CreateArgs::Bucket(bucket_args) => bucket::create(client, bucket_args, config, printer),
    }
}
