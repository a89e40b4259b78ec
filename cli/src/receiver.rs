use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::{io::Cursor, net::SocketAddr};
use tiny_http::{Method, Request, Response, Server};

/// HTTP server accepting prediction results POSTed as JSON to `/`.
pub struct Receiver {
    server: Server,
}

impl Receiver {
    /// Listen on `127.0.0.1:{port}`, port 0 picks a free one.
    pub fn bind(port: u16) -> Result<Self> {
        let address = format!("127.0.0.1:{port}");
        let server = Server::http(&address)
            .map_err(|error| anyhow!("Could not listen on `{}`: {}", address, error))?;
        Ok(Self { server })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.server
            .server_addr()
            .to_ip()
            .context("Receiver is not listening on an IP address")
    }

    /// Handle requests forever, passing every accepted payload to `hook`.
    pub fn serve(&self, mut hook: impl FnMut(&Value)) -> Result<()> {
        info!("Waiting for prediction results on {}", self.local_addr()?);
        loop {
            self.handle_next(&mut hook)?;
        }
    }

    /// Block until one request arrives and answer it.
    pub fn handle_next(&self, hook: &mut impl FnMut(&Value)) -> Result<()> {
        let mut request = self
            .server
            .recv()
            .context("Failed to receive request")?;
        debug!("{} {}", request.method(), request.url());

        let response = route(&mut request, hook);
        if let Err(error) = request.respond(response) {
            warn!("Could not send response: {}", error);
        }
        Ok(())
    }
}

fn route(request: &mut Request, hook: &mut impl FnMut(&Value)) -> Response<Cursor<Vec<u8>>> {
    let path = request.url().split('?').next().unwrap_or_default();
    if path != "/" {
        return Response::from_string("Not Found").with_status_code(404);
    }
    if *request.method() != Method::Post {
        return Response::from_string("Method Not Allowed").with_status_code(405);
    }

    let mut body = Vec::new();
    if let Err(error) = request.as_reader().read_to_end(&mut body) {
        warn!("Could not read request body: {}", error);
        return Response::from_string("Bad Request").with_status_code(400);
    }
    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            info!("Received prediction result: {}", payload);
            hook(&payload);
            Response::from_string("OK").with_status_code(200)
        }
        Err(error) => {
            warn!("Rejected request with invalid JSON body: {}", error);
            Response::from_string("Bad Request").with_status_code(400)
        }
    }
}
