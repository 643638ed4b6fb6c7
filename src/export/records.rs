//! Flat, currency-aware export rows
//!
//! Amounts are major units with two decimals. Optional text that downstream
//! renderers print is an empty string when absent.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::reconciliation::CategoryCounts;
use crate::utils::dashboard_url;

/// Payout-level totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub payout_id: String,
    pub created: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: String,
    pub status_label: String,
    pub method: String,
    pub destination: String,

    pub total_payments: BigDecimal,
    pub total_refunds: BigDecimal,
    pub total_fees: BigDecimal,
    pub total_disputes: BigDecimal,
    pub total_payment_failures: BigDecimal,
    pub total_other: BigDecimal,

    /// Ledger entries per category
    pub counts: CategoryCounts,
    pub transaction_count: usize,
    pub invoice_count: usize,
    pub refund_count: usize,
    pub dispute_count: usize,
    pub credit_note_count: usize,
}

/// One ledger entry of the payout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub created: DateTime<Utc>,
    pub entry_type: String,
    pub type_label: String,
    pub gross: BigDecimal,
    pub fee: BigDecimal,
    pub net: BigDecimal,
    pub currency: String,
    pub description: String,
    pub source: String,
    pub charge_id: String,
    pub invoice_id: String,
    pub invoice_number: String,
    pub client: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRow {
    pub id: String,
    pub number: String,
    pub created: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub customer_id: String,
    pub client: String,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub currency: String,
    pub status_label: String,
    pub charge_id: String,
    pub pdf_url: Option<String>,
}

/// Processor fee detail, attributed to its ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeRow {
    pub transaction_id: String,
    pub fee_type: String,
    pub type_label: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRow {
    pub id: String,
    pub created: DateTime<Utc>,
    pub amount: BigDecimal,
    pub currency: String,
    pub status_label: String,
    pub reason_label: String,
    pub charge_id: String,
    pub invoice_number: String,
    pub client: String,
    pub credit_note_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditNoteRow {
    pub id: String,
    pub number: String,
    pub created: DateTime<Utc>,
    pub invoice_id: String,
    pub invoice_number: String,
    pub client: String,
    pub total: BigDecimal,
    pub currency: String,
    pub status_label: String,
    pub reason: String,
    pub refund_id: String,
    pub pdf_url: Option<String>,
}

/// Complete, immutable result of reconciling one payout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportBundle {
    pub summary: FinancialSummary,
    pub transactions: Vec<TransactionRow>,
    pub invoices: Vec<InvoiceRow>,
    pub fees: Vec<FeeRow>,
    pub refunds: Vec<RefundRow>,
    pub credit_notes: Vec<CreditNoteRow>,
    pub account_id: Option<String>,
}

impl ExportBundle {
    /// Dashboard link for any identifier appearing in the bundle
    pub fn dashboard_url(&self, object_id: &str) -> Option<String> {
        dashboard_url(object_id, self.account_id.as_deref())
    }

    pub fn payout_id(&self) -> &str {
        &self.summary.payout_id
    }
}
