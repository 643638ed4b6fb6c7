//! Export configuration.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::types::*;
use crate::utils::validate_api_key;

/// Configuration read from the environment.
#[derive(Clone, Deserialize)]
pub struct ExportConfig {
    /// Secret (`sk_`) or restricted (`rk_`) API key.
    pub stripe_api_key: String,
    /// Directory reports and PDFs are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Maximum concurrent PDF downloads.
    #[serde(default = "default_download_workers")]
    pub download_workers: usize,
    /// Payout status used when listing a date range; `all` disables the filter.
    #[serde(default = "default_payout_status")]
    pub payout_status: String,
    /// Whether invoice and credit-note PDFs are downloaded.
    #[serde(default = "default_download_invoices")]
    pub download_invoices: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_download_workers() -> usize {
    5
}

fn default_payout_status() -> String {
    "paid".to_string()
}

fn default_download_invoices() -> bool {
    true
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("stripe_api_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("download_workers", &self.download_workers)
            .field("payout_status", &self.payout_status)
            .field("download_invoices", &self.download_invoices)
            .finish()
    }
}

impl ExportConfig {
    /// Loads configuration from `.env.local`, `.env` and the environment.
    ///
    /// Variables already set in the environment take precedence over both files.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable has the wrong type or the API key is
    /// missing or malformed.
    pub fn load() -> ReconcileResult<Self> {
        if let Ok(path) = dotenvy::from_filename(".env.local") {
            debug!(path = %path.display(), "loaded env file");
        }
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded env file");
        }

        let config = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        Self::from_config(config)
    }

    /// Deserializes and validates an already-built configuration.
    pub fn from_config(config: config::Config) -> ReconcileResult<Self> {
        let export: Self = config.try_deserialize()?;
        validate_api_key(&export.stripe_api_key)?;
        if export.download_workers == 0 {
            return Err(ReconcileError::Validation(
                "DOWNLOAD_WORKERS must be at least 1".to_string(),
            ));
        }
        Ok(export)
    }

    /// Status filter for listing payouts, `None` meaning every status
    pub fn payout_status_filter(&self) -> Option<&str> {
        let status = self.payout_status.trim();
        (!status.is_empty() && !status.eq_ignore_ascii_case("all")).then_some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(overrides: &[(&str, &str)]) -> config::Config {
        overrides
            .iter()
            .fold(config::Config::builder(), |builder, (key, value)| {
                builder.set_override(*key, *value).unwrap()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_apply() {
        let config = ExportConfig::from_config(build(&[("stripe_api_key", "sk_test_123")])).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("./output"));
        assert_eq!(config.download_workers, 5);
        assert_eq!(config.payout_status_filter(), Some("paid"));
        assert!(config.download_invoices);
    }

    #[test]
    fn test_overrides_and_status_all() {
        let config = ExportConfig::from_config(build(&[
            ("stripe_api_key", "rk_live_abc"),
            ("output_dir", "/tmp/exports"),
            ("download_workers", "2"),
            ("payout_status", "all"),
            ("download_invoices", "false"),
        ]))
        .unwrap();
        assert_eq!(config.download_workers, 2);
        assert_eq!(config.payout_status_filter(), None);
        assert!(!config.download_invoices);
    }

    #[test]
    fn test_missing_or_invalid_key_is_rejected() {
        assert!(matches!(
            ExportConfig::from_config(build(&[])),
            Err(ReconcileError::Config(_))
        ));
        assert!(matches!(
            ExportConfig::from_config(build(&[("stripe_api_key", "pk_test_123")])),
            Err(ReconcileError::Validation(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ExportConfig::from_config(build(&[("stripe_api_key", "sk_test_secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("sk_test_secret"));
    }
}
