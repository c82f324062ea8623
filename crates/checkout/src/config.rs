//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAMTALK_ALGOD_URL` - Base URL of the algod REST endpoint
//! - `PAMTALK_ALGOD_TOKEN` - API token sent as `X-Algo-API-Token`
//! - `PAMTALK_ORDER_SERVICE_URL` - Base URL of the order service
//! - `PAMTALK_DC_ASSET_ID` - Ledger asset ID of the DC reward token
//!
//! ## Optional
//! - `PAMTALK_DC_RATE` - Currency units per DC token (default: 100)
//! - `PAMTALK_CONFIRM_ROUNDS` - Ledger confirmation wait, in rounds (default: 4)

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use pamtalk_core::{AssetId, DcRate};

/// Default currency-to-token conversion: 100 KRW per DC.
const DEFAULT_DC_RATE: &str = "100";

/// Default number of rounds to wait for ledger confirmation.
const DEFAULT_CONFIRM_ROUNDS: &str = "4";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout configuration.
///
/// Implements `Debug` manually to redact the algod token.
#[derive(Clone)]
pub struct CheckoutConfig {
    /// Base URL of the algod REST endpoint
    pub algod_url: Url,
    /// API token for algod requests
    pub algod_token: SecretString,
    /// Base URL of the order service
    pub order_service_url: Url,
    /// Ledger asset ID of the DC reward token
    pub dc_asset_id: AssetId,
    /// Currency units per DC token
    pub dc_rate: DcRate,
    /// Number of rounds to wait for ledger confirmation
    pub confirm_rounds: u32,
}

impl std::fmt::Debug for CheckoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutConfig")
            .field("algod_url", &self.algod_url.as_str())
            .field("algod_token", &"[REDACTED]")
            .field("order_service_url", &self.order_service_url.as_str())
            .field("dc_asset_id", &self.dc_asset_id)
            .field("dc_rate", &self.dc_rate)
            .field("confirm_rounds", &self.confirm_rounds)
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let algod_url = get_url("PAMTALK_ALGOD_URL")?;
        let algod_token = get_required_secret("PAMTALK_ALGOD_TOKEN")?;
        let order_service_url = get_url("PAMTALK_ORDER_SERVICE_URL")?;

        let dc_asset_id = get_required_env("PAMTALK_DC_ASSET_ID")?
            .parse::<u64>()
            .map(AssetId::new)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PAMTALK_DC_ASSET_ID".to_string(), e.to_string())
            })?;

        let dc_rate = get_env_or_default("PAMTALK_DC_RATE", DEFAULT_DC_RATE)
            .parse::<Decimal>()
            .map_err(|e| ConfigError::InvalidEnvVar("PAMTALK_DC_RATE".to_string(), e.to_string()))
            .and_then(|raw| {
                DcRate::new(raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("PAMTALK_DC_RATE".to_string(), e.to_string())
                })
            })?;

        let confirm_rounds = get_env_or_default("PAMTALK_CONFIRM_ROUNDS", DEFAULT_CONFIRM_ROUNDS)
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PAMTALK_CONFIRM_ROUNDS".to_string(), e.to_string())
            })?;

        Ok(Self {
            algod_url,
            algod_token,
            order_service_url,
            dc_asset_id,
            dc_rate,
            confirm_rounds,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get a required environment variable parsed as a URL.
fn get_url(key: &str) -> Result<Url, ConfigError> {
    get_required_env(key)?
        .parse::<Url>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> CheckoutConfig {
        CheckoutConfig {
            algod_url: "http://localhost:4001".parse().unwrap(),
            algod_token: SecretString::from("a".repeat(64)),
            order_service_url: "http://localhost:8080".parse().unwrap(),
            dc_asset_id: AssetId::new(31_566_704),
            dc_rate: DcRate::new(Decimal::from(100)).unwrap(),
            confirm_rounds: 4,
        }
    }

    #[test]
    fn test_debug_redacts_algod_token() {
        let config = test_config();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("http://localhost:4001"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(&"a".repeat(64)));
    }

    #[test]
    fn test_default_rate_parses() {
        let rate = DEFAULT_DC_RATE.parse::<Decimal>().unwrap();
        assert_eq!(rate, Decimal::from(100));
    }

    #[test]
    fn test_default_confirm_rounds_parses() {
        assert_eq!(DEFAULT_CONFIRM_ROUNDS.parse::<u32>().unwrap(), 4);
    }
}
