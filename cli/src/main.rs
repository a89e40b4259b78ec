#![deny(clippy::all)]
mod archive;
mod args;
mod commands;
mod config;
mod printer;
mod progress;
mod receiver;
mod tunnel;
mod utils;

use anyhow::{Context, Result};
use log::{debug, error, warn};
use mldeploy_client::{
    Client, Config as ClientConfig, Token, DEFAULT_FUNCTIONS_ENDPOINT, DEFAULT_STORAGE_ENDPOINT,
};
use std::{env, io, path::PathBuf, process};
use structopt::{clap::Shell as ClapShell, StructOpt};

use crate::{
    args::{Args, Command, Shell},
    commands::{create, deploy, run as run_command, serve, upload},
    config::DeployConfig,
    printer::Printer,
    utils::{init_env_logger, read_token_from_stdin},
};

/// Environment variable consulted for an access token when none is configured.
const TOKEN_ENV_VARIABLE_NAME: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

fn run(args: Args) -> Result<()> {
    let config_path = find_configuration(&args)?;
    let config = apply_args(&args, config::read_deploy_config(&config_path)?);
    let printer = Printer::new(args.output);

    match &args.command {
        Command::Completion { shell } => {
            let mut app = Args::clap();
            let clap_shell = match shell {
                Shell::Zsh => ClapShell::Zsh,
                Shell::Bash => ClapShell::Bash,
            };
            app.gen_completions_to("mldeploy", clap_shell, &mut io::stdout());
            Ok(())
        }
        Command::Run { run_args } => {
            run_command::run(run_args, &client_from_config(&config)?, &config, &printer)
        }
        Command::Create { create_args } => {
            create::run(create_args, &client_from_config(&config)?, &config, &printer)
        }
        Command::Upload { upload_args } => {
            upload::run(upload_args, &client_from_config(&config)?, &config, &printer)
        }
        Command::Deploy { deploy_args } => {
            deploy::run(deploy_args, &client_from_config(&config)?, &config, &printer)
        }
        Command::Serve { serve_args } => serve::run(serve_args, &config),
    }
}

/// Command line flags take precedence over the configuration file.
fn apply_args(args: &Args, mut config: DeployConfig) -> DeployConfig {
    if let Some(project) = &args.project {
        config.project_id = project.clone();
    }
    if let Some(location) = &args.location {
        config.location = location.clone();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    if let Some(accept_invalid_certificates) = args.accept_invalid_certificates {
        config.accept_invalid_certificates = accept_invalid_certificates;
    }
    if let Some(proxy) = &args.proxy {
        config.proxy = Some(proxy.clone());
    }

    let endpoints = &mut config.endpoints;
    if let Some(storage) = &args.storage_endpoint {
        endpoints.storage = Some(storage.clone());
    }
    if let Some(aiplatform) = &args.aiplatform_endpoint {
        endpoints.aiplatform = Some(aiplatform.clone());
    }
    if let Some(functions) = &args.functions_endpoint {
        endpoints.functions = Some(functions.clone());
    }
    if let Some(ngrok_api) = &args.ngrok_api_endpoint {
        endpoints.ngrok_api = Some(ngrok_api.clone());
    }
    config
}

fn client_from_config(config: &DeployConfig) -> Result<Client> {
    let token = Token(match config.token.clone() {
        Some(token) => token,
        None => match env::var(TOKEN_ENV_VARIABLE_NAME) {
            Ok(token) => {
                debug!("Using access token from {}", TOKEN_ENV_VARIABLE_NAME);
                token
            }
            Err(_) => read_token_from_stdin()?.unwrap_or_default(),
        },
    });

    if config.accept_invalid_certificates {
        warn!(concat!(
            "TLS certificate verification is disabled. ",
            "Do NOT use this over an insecure network."
        ));
    }

    let endpoints = &config.endpoints;
    let client_config = ClientConfig {
        project: config.project_id.clone(),
        location: config.location.clone(),
        token,
        storage_endpoint: endpoints
            .storage
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.clone()),
        aiplatform_endpoint: endpoints.aiplatform.clone(),
        functions_endpoint: endpoints
            .functions
            .clone()
            .unwrap_or_else(|| DEFAULT_FUNCTIONS_ENDPOINT.clone()),
        accept_invalid_certificates: config.accept_invalid_certificates,
        proxy: config.proxy.clone(),
        ..Default::default()
    };
    Client::new(client_config).context("Failed to initialise the HTTP client.")
}

fn find_configuration(args: &Args) -> Result<PathBuf> {
    let config_path = if let Some(config_path) = args.config.clone() {
        if !config_path.exists() {
            warn!(
                "Configuration file `{}` doesn't exist.",
                config_path.display()
            );
        }
        config_path
    } else {
        let mut config_path =
            dirs::config_dir().context("Could not get path to the user's config directory")?;
        config_path.push("mldeploy");
        config_path.push("config.json");
        config_path
    };
    Ok(config_path)
}

fn main() {
    let args = Args::from_args();
    init_env_logger(args.verbose);

    if let Err(error) = run(args) {
        error!("An error occurred:");
        for cause in error.chain() {
            error!(" |- {cause}");
        }

        #[cfg(feature = "backtrace")]
        {
            error!("{}", error.backtrace());
        }

        process::exit(1);
    }
}
