use crate::bridge::request::AddDeviceRequest;
use crate::bridge::core::DEFAULT_EXTERNAL_WRITE_SIZE;
use crate::error::Result;
use crate::matter::ids::EndpointId;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory for bridge configuration files
const CONFIG_DIR: &str = ".config/dynamic-matter-bridge";
const DEVICES_FILE: &str = "devices.json";

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Splits `.env` content into key/value pairs, skipping blanks and comments.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            pairs.push((key, value));
        }
    }
    pairs
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Static aggregator endpoint that parents bridged devices
    pub aggregator_endpoint: EndpointId,
    /// Endpoints the device model defines statically
    pub fixed_endpoints: Vec<EndpointId>,
    /// Max bytes forwarded to the external delegate per write
    pub external_write_size: usize,
    /// Adds EndpointUniqueID to injected Descriptor clusters
    pub endpoint_unique_id: bool,
    /// JSON array of device definitions registered at startup
    pub devices_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aggregator_endpoint: 1,
            fixed_endpoints: vec![0, 1],
            external_write_size: DEFAULT_EXTERNAL_WRITE_SIZE,
            endpoint_unique_id: false,
            devices_file: default_devices_path(),
        }
    }
}

/// Get the default device definitions path
fn default_devices_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(DEVICES_FILE)
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `BRIDGE_*` overrides from `lookup`. Unparsable values are
    /// ignored with a warning.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup("BRIDGE_AGGREGATOR_ENDPOINT") {
            match value.parse() {
                Ok(ep) => self.aggregator_endpoint = ep,
                Err(_) => warn!("[Bridge] Ignoring BRIDGE_AGGREGATOR_ENDPOINT={}", value),
            }
        }
        if let Some(value) = lookup("BRIDGE_FIXED_ENDPOINTS") {
            match value
                .split(',')
                .map(|s| s.trim().parse::<EndpointId>())
                .collect::<std::result::Result<Vec<_>, _>>()
            {
                Ok(eps) if !eps.is_empty() => self.fixed_endpoints = eps,
                _ => warn!("[Bridge] Ignoring BRIDGE_FIXED_ENDPOINTS={}", value),
            }
        }
        if let Some(value) = lookup("BRIDGE_EXTERNAL_WRITE_SIZE") {
            match value.parse() {
                Ok(size) if size > 0 => self.external_write_size = size,
                _ => warn!("[Bridge] Ignoring BRIDGE_EXTERNAL_WRITE_SIZE={}", value),
            }
        }
        if let Some(value) = lookup("BRIDGE_ENDPOINT_UNIQUE_ID") {
            self.endpoint_unique_id = matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(path) = lookup("BRIDGE_DEVICES_FILE") {
            self.devices_file = PathBuf::from(path);
        }
        self
    }
}

/// Loads device definitions. A missing file means no devices.
pub fn load_devices(path: &Path) -> Result<Vec<AddDeviceRequest>> {
    if !path.exists() {
        info!("[Bridge] No device definitions at {}", path.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let devices: Vec<AddDeviceRequest> = serde_json::from_str(&content)?;
    info!("[Bridge] Loaded {} device definitions from {}", devices.len(), path.display());
    Ok(devices)
}
