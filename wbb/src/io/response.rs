//! XML bodies returned by the game server.
//!
//! Every action answers with
//! `<response><responseValues>...</responseValues></response>`; only the
//! values block is inspected and the root element name is not checked.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "responseValues")]
    response_values: T,
}

#[derive(Debug, Default, Deserialize)]
struct FireValues {
    #[serde(rename = "botsHit", default)]
    bots_hit: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ScanValues {
    #[serde(default)]
    hits: u32,
    #[serde(default)]
    coords: Coords,
}

#[derive(Debug, Default, Deserialize)]
struct Coords {
    #[serde(rename = "bot", default)]
    bots: Vec<Sighting>,
}

/// One enemy as reported by a scan, relative to the scanning bot.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Sighting {
    pub angle: f64,
    pub distance: f64,
    pub condition: i64,
}

fn decode<T: DeserializeOwned>(xml: &str, what: &str) -> Result<T> {
    let envelope: Envelope<T> = quick_xml::de::from_str(xml.trim())
        .with_context(|| format!("parse {what} response"))?;
    Ok(envelope.response_values)
}

/// Number of bots hit by a `fire` call.
pub fn parse_fire(xml: &str) -> Result<u32> {
    let values: FireValues = decode(xml, "fire")?;
    Ok(values.bots_hit)
}

/// Bots seen by a `scan` call. Empty when the scan reported no hits.
pub fn parse_scan(xml: &str) -> Result<Vec<Sighting>> {
    let values: ScanValues = decode(xml, "scan")?;
    if values.hits == 0 {
        return Ok(Vec::new());
    }
    Ok(values.coords.bots)
}
