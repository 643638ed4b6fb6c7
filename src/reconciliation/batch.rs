//! Date-range reconciliation
//!
//! Payouts are reconciled one at a time. A payout that fails is recorded with
//! its reason and the run moves on to the next one.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::export::ExportBundle;
use crate::reconciliation::ReconciliationEngine;
use crate::traits::*;
use crate::types::*;
use crate::utils::validate_date_range;

/// Result of reconciling a single payout within a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PayoutOutcome {
    Reconciled(Box<ExportBundle>),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutReport {
    pub payout_id: String,
    pub outcome: PayoutOutcome,
}

/// Per-payout outcomes of one batch run, in payout creation order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub payouts: Vec<PayoutReport>,
}

impl BatchReport {
    /// Bundles of the payouts that reconciled
    pub fn bundles(&self) -> impl Iterator<Item = &ExportBundle> {
        self.payouts.iter().filter_map(|p| match &p.outcome {
            PayoutOutcome::Reconciled(bundle) => Some(bundle.as_ref()),
            PayoutOutcome::Failed { .. } => None,
        })
    }

    pub fn success_count(&self) -> usize {
        self.bundles().count()
    }

    pub fn failure_count(&self) -> usize {
        self.payouts.len() - self.success_count()
    }

    /// One line per payout, e.g. `po_123: OK (12 transactions)`
    pub fn summary_lines(&self) -> Vec<String> {
        self.payouts
            .iter()
            .map(|p| match &p.outcome {
                PayoutOutcome::Reconciled(bundle) => format!(
                    "{}: OK ({} transactions)",
                    p.payout_id, bundle.summary.transaction_count
                ),
                PayoutOutcome::Failed { reason } => format!("{}: FAILED - {}", p.payout_id, reason),
            })
            .collect()
    }
}

/// Start of `from` to the last second of `to`, both in UTC
fn day_bounds(from: NaiveDate, to: NaiveDate) -> ReconcileResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = to
        .and_time(NaiveTime::MIN)
        .and_utc()
        .checked_add_signed(TimeDelta::days(1))
        .and_then(|next_day| next_day.checked_sub_signed(TimeDelta::seconds(1)))
        .ok_or_else(|| ReconcileError::Validation(format!("End date {} is out of range", to)))?;
    Ok((start, end))
}

impl<A: PaymentsApi> ReconciliationEngine<A> {
    /// Reconcile every payout created between two dates, inclusive.
    ///
    /// Failing to list payouts fails the run. A failure on one payout is
    /// logged and recorded, and the next payout is processed.
    pub async fn reconcile_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<&str>,
    ) -> ReconcileResult<BatchReport> {
        let (start, end) = day_bounds(from, to)?;
        validate_date_range(start, end)?;

        let run_id = Uuid::new_v4();
        let filter = PayoutFilter {
            created_from: Some(start),
            created_to: Some(end),
            status: status.map(str::to_string),
        };
        let payouts = self.api().list_payouts(&filter).await?;
        info!(%run_id, %from, %to, payouts = payouts.len(), "batch reconciliation started");

        let mut report = BatchReport {
            run_id,
            started_at: Utc::now(),
            from,
            to,
            payouts: Vec::with_capacity(payouts.len()),
        };

        for payout in payouts {
            let outcome = match self.reconcile_payout(&payout.id).await {
                Ok(bundle) => PayoutOutcome::Reconciled(Box::new(bundle)),
                Err(err) => {
                    error!(%run_id, payout_id = %payout.id, error = %err, "payout skipped");
                    PayoutOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            report.payouts.push(PayoutReport {
                payout_id: payout.id,
                outcome,
            });
        }

        info!(
            %run_id,
            succeeded = report.success_count(),
            failed = report.failure_count(),
            "batch reconciliation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::*;
    use crate::utils::MemoryApi;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payout(id: &str, created: DateTime<Utc>, status: &str) -> ApiPayout {
        ApiPayout {
            id: id.to_string(),
            currency: "eur".to_string(),
            created: created.timestamp(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_day_bounds_cover_whole_days() {
        let (start, end) = day_bounds(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-31T23:59:59+00:00");
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_filtered_by_status() {
        let api = MemoryApi::new();
        let (start, end) = day_bounds(date(2024, 3, 1), date(2024, 3, 2)).unwrap();
        api.insert_payout(payout("po_first", start, "paid"), vec![]);
        api.insert_payout(payout("po_last", end, "paid"), vec![]);
        api.insert_payout(payout("po_pending", start, "pending"), vec![]);
        api.insert_payout(payout("po_after", end + TimeDelta::seconds(1), "paid"), vec![]);

        let engine = ReconciliationEngine::new(api);
        let report = engine
            .reconcile_range(date(2024, 3, 1), date(2024, 3, 2), Some("paid"))
            .await
            .unwrap();

        let ids: Vec<&str> = report.payouts.iter().map(|p| p.payout_id.as_str()).collect();
        assert_eq!(ids, vec!["po_first", "po_last"]);
        assert_eq!(report.success_count(), 2);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let engine = ReconciliationEngine::new(MemoryApi::new());
        let err = engine
            .reconcile_range(date(2024, 3, 2), date(2024, 3, 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
    }

    #[tokio::test]
    async fn test_end_date_at_calendar_limit_is_rejected() {
        let api = MemoryApi::new();
        let engine = ReconciliationEngine::new(api.clone());
        let result = engine
            .reconcile_range(date(2024, 3, 1), NaiveDate::MAX, None)
            .await;
        assert!(matches!(result, Err(ReconcileError::Validation(_))));
        assert_eq!(api.call_count("list_payouts"), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let api = MemoryApi::new();
        api.fail("list_payouts", ApiError::Auth("expired key".to_string()));

        let engine = ReconciliationEngine::new(api);
        let result = engine
            .reconcile_range(date(2024, 3, 1), date(2024, 3, 1), None)
            .await;
        assert!(matches!(result, Err(ReconcileError::Api(ApiError::Auth(_)))));
    }
}
