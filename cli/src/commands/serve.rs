use anyhow::{anyhow, Result};
use log::info;
use std::{env, ops::Deref};
use structopt::StructOpt;

use crate::{
    config::DeployConfig,
    receiver::Receiver,
    tunnel::{Tunnel, DEFAULT_AGENT_API},
};

/// Environment variable holding the ngrok auth token.
pub const NGROK_TOKEN_ENV: &str = "NGROK_AUTHTOKEN";

#[derive(Debug, StructOpt)]
pub struct TunnelArgs {
    #[structopt(long = "port")]
    /// Local port the receiver listens on and the tunnel forwards to.
    port: Option<u16>,

    #[structopt(long = "ngrok-token")]
    /// Auth token for the ngrok agent. Falls back to the configuration file,
    /// then to the NGROK_AUTHTOKEN environment variable.
    ngrok_token: Option<String>,

    #[structopt(long = "tunnel-url")]
    /// Public URL of a tunnel which is already running. No agent is started
    /// when this is set.
    tunnel_url: Option<String>,
}

impl TunnelArgs {
    pub fn port(&self, config: &DeployConfig) -> u16 {
        self.port.unwrap_or(config.receiver_port)
    }

    pub fn open(&self, config: &DeployConfig) -> Result<Tunnel> {
        if let Some(tunnel_url) = &self.tunnel_url {
            return Ok(Tunnel::existing(tunnel_url.as_str()));
        }

        let auth_token = self
            .ngrok_token
            .clone()
            .or_else(|| config.ngrok_token.clone())
            .or_else(|| env::var(NGROK_TOKEN_ENV).ok())
            .ok_or_else(|| {
                anyhow!(
                    "No ngrok auth token, pass `--ngrok-token`, set `ngrok_token` in the \
                     configuration file or set {}",
                    NGROK_TOKEN_ENV
                )
            })?;
        let agent_api = config
            .endpoints
            .ngrok_api
            .as_ref()
            .unwrap_or(DEFAULT_AGENT_API.deref());
        Tunnel::open(self.port(config), &auth_token, agent_api)
    }
}

#[derive(Debug, StructOpt)]
pub struct ServeArgs {
    #[structopt(flatten)]
    tunnel: TunnelArgs,
}

/// Expose the receiver through a tunnel and handle callbacks until killed.
pub fn run(args: &ServeArgs, config: &DeployConfig) -> Result<()> {
    let receiver = Receiver::bind(args.tunnel.port(config))?;
    let tunnel = args.tunnel.open(config)?;
    info!("Callbacks are accepted at {}", tunnel.public_url());
    receiver.serve(print_payload)
}

/// Echo accepted payloads to stdout, one JSON document per line.
pub fn print_payload(payload: &serde_json::Value) {
    println!("{payload}");
}
