//! Validation utilities

use chrono::{DateTime, Utc};

use crate::types::*;

/// Validate that a payout ID looks like a payout identifier
pub fn validate_payout_id(payout_id: &str) -> ReconcileResult<()> {
    if payout_id.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Payout ID cannot be empty".to_string(),
        ));
    }

    if ObjectKind::from_id(payout_id) != Some(ObjectKind::Payout) {
        return Err(ReconcileError::Validation(format!(
            "'{}' is not a payout ID (expected po_...)",
            payout_id
        )));
    }

    if !payout_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ReconcileError::Validation(
            "Payout ID can only contain alphanumeric characters and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate a creation-date range for batch reconciliation
pub fn validate_date_range(from: DateTime<Utc>, to: DateTime<Utc>) -> ReconcileResult<()> {
    if from > to {
        return Err(ReconcileError::Validation(format!(
            "Start date {} is after end date {}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        )));
    }
    Ok(())
}

/// Validate that an API key is a secret or restricted key
pub fn validate_api_key(api_key: &str) -> ReconcileResult<()> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ReconcileError::Validation(
            "API key is required (set STRIPE_API_KEY in .env.local or the environment)"
                .to_string(),
        ));
    }

    if !(key.starts_with("sk_") || key.starts_with("rk_")) {
        return Err(ReconcileError::Validation(
            "API key must be a secret (sk_) or restricted (rk_) key".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payout_id_validation() {
        assert!(validate_payout_id("po_1OaBcD").is_ok());
        assert!(validate_payout_id("").is_err());
        assert!(validate_payout_id("ch_1OaBcD").is_err());
        assert!(validate_payout_id("po_1/../x").is_err());
    }

    #[test]
    fn test_date_range_validation() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let dec = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        assert!(validate_date_range(jan, dec).is_ok());
        assert!(validate_date_range(jan, jan).is_ok());
        assert!(validate_date_range(dec, jan).is_err());
    }

    #[test]
    fn test_api_key_validation() {
        assert!(validate_api_key("sk_test_123").is_ok());
        assert!(validate_api_key("rk_live_123").is_ok());
        assert!(validate_api_key("pk_test_123").is_err());
        assert!(validate_api_key("  ").is_err());
    }
}
