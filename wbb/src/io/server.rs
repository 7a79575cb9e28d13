//! Game-server client abstraction.
//!
//! The [`GameServer`] trait decouples bot actions from the transport. The
//! production implementation issues HTTP GETs with `reqwest`; tests use
//! scripted servers that return canned XML without touching the network.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use tracing::{debug, instrument};

/// Where and as whom a bot talks to the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub client_key: String,
    pub game_id: String,
}

/// Actions the game server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMethod {
    Fire,
    Drive,
    Scan,
}

impl ServerMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerMethod::Fire => "fire",
            ServerMethod::Drive => "drive",
            ServerMethod::Scan => "scan",
        }
    }
}

impl fmt::Display for ServerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full query for a call: identity parameters first, then the method's own.
pub fn call_params(
    endpoint: &Endpoint,
    method: ServerMethod,
    params: &[(&'static str, String)],
) -> Vec<(&'static str, String)> {
    let mut query = Vec::with_capacity(params.len() + 3);
    query.push(("method", method.as_str().to_string()));
    query.push(("clientKey", endpoint.client_key.clone()));
    query.push(("gameID", endpoint.game_id.clone()));
    query.extend(params.iter().cloned());
    query
}

/// Abstraction over game-server transports.
pub trait GameServer {
    /// Invoke `method` and return the raw response body.
    fn call(
        &self,
        endpoint: &Endpoint,
        method: ServerMethod,
        params: &[(&'static str, String)],
    ) -> Result<String>;
}

/// Game server reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGameServer {
    client: Client,
}

impl HttpGameServer {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wbb/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

impl GameServer for HttpGameServer {
    #[instrument(skip_all, fields(method = %method, game_id = %endpoint.game_id))]
    fn call(
        &self,
        endpoint: &Endpoint,
        method: ServerMethod,
        params: &[(&'static str, String)],
    ) -> Result<String> {
        let query = call_params(endpoint, method, params);
        debug!(url = %endpoint.url, "calling game server");
        let response = self
            .client
            .get(&endpoint.url)
            .query(&query)
            .send()
            .with_context(|| format!("{method} request to {}", endpoint.url))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("read {method} response body"))?;
        if !status.is_success() {
            return Err(anyhow!("game server answered {method} with {status}: {body}"));
        }
        debug!(status = %status, bytes = body.len(), "game server responded");
        Ok(body)
    }
}
