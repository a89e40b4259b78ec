use crate::{
    commands::{
        create::CreateArgs, deploy::DeployArgs, run::RunArgs, serve::ServeArgs, upload::UploadArgs,
    },
    printer::OutputFormat,
};
use anyhow::{anyhow, Error, Result};
use reqwest::Url;
use std::{path::PathBuf, str::FromStr};
use structopt::StructOpt;

/// mldeploy deploys a model, its trigger function and a callback receiver to Google Cloud.
#[derive(Debug, StructOpt)]
#[structopt(
    global_settings = &[
        structopt::clap::AppSettings::ColoredHelp,
        structopt::clap::AppSettings::InferSubcommands,
    ]
)]
pub struct Args {
    #[structopt(long = "config-file", parse(from_os_str))]
    /// Path to the configuration file. Typically defaults to
    /// ~/.config/mldeploy/config.json on Linux.
    pub config: Option<PathBuf>,

    #[structopt(short = "v", long = "verbose")]
    /// Enable more verbose logging.
    pub verbose: bool,

    #[structopt(long = "project")]
    /// Google Cloud project to deploy into. Overrides the configuration file.
    pub project: Option<String>,

    #[structopt(long = "location")]
    /// Region to deploy into. Overrides the configuration file.
    pub location: Option<String>,

    #[structopt(long = "token")]
    /// OAuth access token, e.g. from `gcloud auth print-access-token`.
    /// Overrides the configuration file and GOOGLE_OAUTH_ACCESS_TOKEN.
    pub token: Option<String>,

    #[structopt(long = "storage-endpoint", parse(try_from_str))]
    /// Base URL of the storage service.
    pub storage_endpoint: Option<Url>,

    #[structopt(long = "aiplatform-endpoint", parse(try_from_str))]
    /// Base URL of the prediction service. Defaults to the regional endpoint.
    pub aiplatform_endpoint: Option<Url>,

    #[structopt(long = "functions-endpoint", parse(try_from_str))]
    /// Base URL of the functions service.
    pub functions_endpoint: Option<Url>,

    #[structopt(long = "ngrok-api-endpoint", parse(try_from_str))]
    /// Base URL of the local ngrok agent API.
    pub ngrok_api_endpoint: Option<Url>,

    #[structopt(short = "k", long = "accept-invalid-certificates", parse(try_from_str))]
    pub accept_invalid_certificates: Option<bool>,

    #[structopt(long = "proxy", parse(try_from_str))]
    /// URL of an HTTP proxy to send all requests through.
    pub proxy: Option<Url>,

    #[structopt(short = "o", long = "output", default_value = "table")]
    /// Output format for created resources, `table` or `json`.
    pub output: OutputFormat,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(name = "completion")]
    /// Output shell completion code for the specified shell (bash or zsh)
    Completion { shell: Shell },

    #[structopt(name = "run")]
    /// Run the whole deployment, then wait for prediction results
    Run {
        #[structopt(flatten)]
        run_args: RunArgs,
    },

    #[structopt(name = "create")]
    /// Create new resources
    Create {
        #[structopt(subcommand)]
        create_args: CreateArgs,
    },

    #[structopt(name = "upload")]
    /// Upload local artifacts
    Upload {
        #[structopt(subcommand)]
        upload_args: UploadArgs,
    },

    #[structopt(name = "deploy")]
    /// Deploy models and functions
    Deploy {
        #[structopt(subcommand)]
        deploy_args: DeployArgs,
    },

    #[structopt(name = "serve")]
    /// Open a tunnel and wait for prediction results
    Serve {
        #[structopt(flatten)]
        serve_args: ServeArgs,
    },
}

#[derive(Debug)]
pub enum Shell {
    Bash,
    Zsh,
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            _ => Err(anyhow!("unknown shell: '{}'", string)),
        }
    }
}
