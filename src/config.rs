use std::path::{Path, PathBuf};

use config::{Config, ConfigError};
use gb_gopro::GoProConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    /// Url of the camera, e.g. `gopro://172.25.190.51`.
    pub address: String,

    /// Where `stream` writes the transport stream. `-` means stdout.
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub gopro: GoProConfig,
}

impl BridgeConfig {
    /// Reads the config file at `path` if there is one, then environment
    /// variables prefixed with `GOPRO_BRIDGE`, then `address` if given.
    pub fn read(path: Option<&Path>, address: Option<String>) -> Result<Self, ConfigError> {
        let mut c = Config::new();

        if let Some(path) = path {
            c.merge(config::File::from(path))?;
        }

        c.merge(config::Environment::with_prefix("GOPRO_BRIDGE").separator("__"))?;

        if let Some(address) = address {
            c.set("address", address)?;
        }

        c.try_into()
    }
}
