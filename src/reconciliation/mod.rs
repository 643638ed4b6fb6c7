//! Payout reconciliation engine
//!
//! [`ReconciliationEngine::collect`] walks a payout's ledger entries in order,
//! resolving each entry's source and accumulating category totals in the
//! same pass. [`ReconciliationEngine::reconcile_payout`] then hands the result
//! to the export record builder.

pub mod aggregator;
pub mod batch;
pub mod cache;
pub mod resolver;

pub use aggregator::*;
pub use batch::*;
pub use cache::*;
pub use resolver::*;

use tracing::{debug, info};

use crate::export::{ExportBundle, ExportRecordBuilder};
use crate::traits::*;
use crate::types::*;
use crate::utils::validate_payout_id;

/// Fee line together with the ledger entry it was charged on
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFee {
    pub transaction_id: String,
    pub line: FeeLine,
}

/// Everything gathered for one payout, before export formatting
#[derive(Debug, Clone)]
pub struct ReconciledPayout {
    pub payout: Payout,
    /// Non-payout ledger entries in ledger order
    pub entries: Vec<LedgerEntry>,
    pub fee_lines: Vec<EntryFee>,
    pub entities: ResolvedEntitySet,
    pub totals: CategoryTotals,
    /// Used only for dashboard links
    pub account_id: Option<String>,
}

/// Reconciles payouts against the entities that explain them
pub struct ReconciliationEngine<A: PaymentsApi> {
    api: A,
}

impl<A: PaymentsApi> ReconciliationEngine<A> {
    /// Engine over any upstream implementation
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Upstream the engine reads from
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Reconcile one payout into an export bundle.
    ///
    /// Any error other than a missing entity aborts the whole payout; no
    /// partial bundle is returned.
    pub async fn reconcile_payout(&self, payout_id: &str) -> ReconcileResult<ExportBundle> {
        let reconciled = self.collect(payout_id).await?;
        Ok(ExportRecordBuilder::build(&reconciled))
    }

    /// Fetch the payout and resolve every ledger entry, in ledger order
    pub async fn collect(&self, payout_id: &str) -> ReconcileResult<ReconciledPayout> {
        validate_payout_id(payout_id)?;

        let payout = Payout::from(self.api.get_payout(payout_id).await?);
        let raw_entries = self.api.list_balance_transactions(payout_id).await?;
        let account_id = self.api.account_id().await.optional()?;
        debug!(payout_id, entries = raw_entries.len(), "ledger entries fetched");

        let resolver = EntityResolver::new(&self.api);
        let mut entities = ResolvedEntitySet::new();
        let mut totals = CategoryTotals::new();
        let mut entries = Vec::new();
        let mut fee_lines = Vec::new();

        for entry in raw_entries.into_iter().map(LedgerEntry::from) {
            if entry.entry_type.is_payout() {
                debug!(payout_id, transaction_id = %entry.id, "payout entry skipped");
                continue;
            }

            fee_lines.extend(entry.fee_lines.iter().map(|line| EntryFee {
                transaction_id: entry.id.clone(),
                line: line.clone(),
            }));

            if let Some(source) = &entry.source {
                resolver.resolve_source(source, &mut entities).await?;
            }

            totals.record(&entry);
            entries.push(entry);
        }

        info!(
            payout_id,
            transactions = entries.len(),
            charges = entities.charges().len(),
            invoices = entities.invoices().len(),
            refunds = entities.refunds().len(),
            credit_notes = entities.credit_notes().len(),
            "payout reconciled"
        );

        Ok(ReconciledPayout {
            payout,
            entries,
            fee_lines,
            entities,
            totals,
            account_id,
        })
    }
}
