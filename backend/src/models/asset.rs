use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Crypto assets the service knows how to price.
///
/// Callers address assets by their lowercase name (`bitcoin`, `ethereum`);
/// the exchange trading pair each one maps to comes from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Bitcoin,
    Ethereum,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Bitcoin, Asset::Ethereum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "bitcoin",
            Asset::Ethereum => "ethereum",
        }
    }

    /// Trading pair used when no override is configured.
    pub fn default_symbol(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "BTCUSDT",
            Asset::Ethereum => "ETHUSDT",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Asset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bitcoin" => Ok(Asset::Bitcoin),
            "ethereum" => Ok(Asset::Ethereum),
            other => Err(AppError::UnsupportedAsset(other.to_string())),
        }
    }
}
