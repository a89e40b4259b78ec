use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use reqwest::{blocking::Client as HttpClient, Url};
use serde::Deserialize;
use std::{
    process::{Child, Command, Stdio},
    thread::sleep,
    time::{Duration, Instant},
};

pub const NGROK_BINARY: &str = "ngrok";

/// Local API the ngrok agent serves its tunnel list on.
pub static DEFAULT_AGENT_API: Lazy<Url> = Lazy::new(|| {
    Url::parse("http://127.0.0.1:4040").expect("Default URL is well-formed")
});

/// How long the agent may take to report a tunnel after starting.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A public URL forwarding to a local port.
///
/// When the tunnel was opened by spawning the agent, dropping the handle stops
/// the agent and the URL goes away with it.
#[derive(Debug)]
pub struct Tunnel {
    public_url: String,
    agent: Option<Child>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelList {
    #[serde(default)]
    pub tunnels: Vec<TunnelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelInfo {
    pub public_url: String,
    #[serde(default)]
    pub proto: String,
    pub config: TunnelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TunnelConfig {
    /// Local address the tunnel forwards to, e.g. `http://localhost:5000`.
    pub addr: String,
}

impl Tunnel {
    /// Spawn the ngrok agent for `port` and wait until it reports a public URL.
    pub fn open(port: u16, auth_token: &str, agent_api: &Url) -> Result<Self> {
        info!("Starting ngrok agent for local port {}", port);
        let local_port = port.to_string();
        let agent = Command::new(NGROK_BINARY)
            .args(["http", local_port.as_str(), "--authtoken", auth_token])
            .args(["--log", "stdout"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| format!("Could not start `{NGROK_BINARY}`, is it installed?"))?;

        let mut tunnel = Tunnel {
            public_url: String::new(),
            agent: Some(agent),
        };
        let public_url =
            wait_for_public_url(agent_api, port, STARTUP_TIMEOUT, || tunnel.agent_exited())?;
        info!("Tunnel open: {} -> localhost:{}", public_url, port);
        tunnel.public_url = public_url;
        Ok(tunnel)
    }

    /// A tunnel managed outside this process.
    pub fn existing(public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        info!("Using existing tunnel {}", public_url);
        Tunnel {
            public_url,
            agent: None,
        }
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    fn agent_exited(&mut self) -> Result<bool> {
        match &mut self.agent {
            Some(agent) => Ok(agent
                .try_wait()
                .context("Could not check on the ngrok agent")?
                .is_some()),
            None => Ok(false),
        }
    }
}

impl Drop for Tunnel {
    fn drop(&mut self) {
        if let Some(mut agent) = self.agent.take() {
            debug!("Stopping ngrok agent [pid: {}]", agent.id());
            if let Err(error) = agent.kill().and_then(|_| agent.wait()) {
                warn!("Could not stop the ngrok agent: {}", error);
            }
        }
    }
}

/// Poll the agent API until a tunnel to `port` shows up.
///
/// Gives up after `timeout`, or as soon as `agent_exited` reports the agent is gone.
pub fn wait_for_public_url(
    agent_api: &Url,
    port: u16,
    timeout: Duration,
    mut agent_exited: impl FnMut() -> Result<bool>,
) -> Result<String> {
    let tunnels_url = agent_api
        .join("api/tunnels")
        .with_context(|| format!("Invalid ngrok agent API URL `{agent_api}`"))?;
    let http_client = HttpClient::builder()
        .timeout(STARTUP_POLL_INTERVAL * 4)
        .build()
        .context("Could not build HTTP client for the ngrok agent API")?;

    let started = Instant::now();
    loop {
        if agent_exited()? {
            return Err(anyhow!(
                "The ngrok agent exited before opening a tunnel, check the auth token"
            ));
        }

        match get_tunnels(&http_client, &tunnels_url) {
            Ok(tunnels) => {
                if let Some(public_url) = select_public_url(&tunnels.tunnels, port) {
                    return Ok(public_url);
                }
                debug!("No tunnel to port {} listed yet", port);
            }
            Err(error) => debug!("ngrok agent API not ready: {:#}", error),
        }

        if started.elapsed() >= timeout {
            return Err(anyhow!(
                "No tunnel to port {} was reported by `{}` within {:?}",
                port,
                tunnels_url,
                timeout
            ));
        }
        sleep(STARTUP_POLL_INTERVAL);
    }
}

fn get_tunnels(http_client: &HttpClient, tunnels_url: &Url) -> Result<TunnelList> {
    http_client
        .get(tunnels_url.clone())
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json::<TunnelList>())
        .with_context(|| format!("Could not list tunnels from `{tunnels_url}`"))
}

/// The public URL of a tunnel forwarding to `port`, https preferred.
pub fn select_public_url(tunnels: &[TunnelInfo], port: u16) -> Option<String> {
    let port_suffix = format!(":{port}");
    let mut candidates = tunnels
        .iter()
        .filter(|tunnel| tunnel.config.addr.ends_with(&port_suffix));

    let first = candidates.next()?;
    if first.proto == "https" {
        return Some(first.public_url.clone());
    }
    Some(
        candidates
            .find(|tunnel| tunnel.proto == "https")
            .unwrap_or(first)
            .public_url
            .clone(),
    )
}
