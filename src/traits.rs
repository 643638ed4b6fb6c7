//! Traits for the external collaborators of the reconciliation engine

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::*;
use crate::types::*;

/// Filter for listing payouts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayoutFilter {
    /// Created at or after (inclusive)
    pub created_from: Option<DateTime<Utc>>,
    /// Created at or before (inclusive)
    pub created_to: Option<DateTime<Utc>>,
    /// Payout status, e.g. `paid`; `None` lists every status
    pub status: Option<String>,
}

/// Payments processor API consumed by the reconciliation engine
///
/// Implementations handle transport, retries and pagination; list operations
/// return the complete, ordered sequence. A missing object must be reported as
/// [`ApiError::NotFound`] so the engine can treat it as absence.
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// Get a payout by ID
    async fn get_payout(&self, payout_id: &str) -> ApiResult<ApiPayout>;

    /// List payouts matching the filter, oldest first
    async fn list_payouts(&self, filter: &PayoutFilter) -> ApiResult<Vec<ApiPayout>>;

    /// List every balance transaction settled by a payout, in upstream order
    async fn list_balance_transactions(
        &self,
        payout_id: &str,
    ) -> ApiResult<Vec<ApiBalanceTransaction>>;

    /// Get a charge with its customer expanded
    async fn get_charge(&self, charge_id: &str) -> ApiResult<ApiCharge>;

    /// Get a refund
    async fn get_refund(&self, refund_id: &str) -> ApiResult<ApiRefund>;

    /// Get an invoice with its customer expanded
    async fn get_invoice(&self, invoice_id: &str) -> ApiResult<ApiInvoice>;

    /// Get a dispute
    async fn get_dispute(&self, dispute_id: &str) -> ApiResult<ApiDispute>;

    /// Get a Connect transfer
    async fn get_transfer(&self, transfer_id: &str) -> ApiResult<ApiTransfer>;

    /// Get a payment intent with its charges expanded
    async fn get_payment_intent(&self, payment_intent_id: &str) -> ApiResult<ApiPaymentIntent>;

    /// Get a credit note
    async fn get_credit_note(&self, credit_note_id: &str) -> ApiResult<ApiCreditNote>;

    /// Search invoices paid through a payment intent
    async fn search_invoices_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> ApiResult<Vec<ApiInvoice>>;

    /// List all invoices of a customer
    async fn list_customer_invoices(&self, customer_id: &str) -> ApiResult<Vec<ApiInvoice>>;

    /// List all credit notes issued against an invoice
    async fn list_credit_notes(&self, invoice_id: &str) -> ApiResult<Vec<ApiCreditNote>>;

    /// Identifier of the account the API key belongs to
    async fn account_id(&self) -> ApiResult<String>;
}

/// Fetches the bytes of a hosted PDF artifact (invoice or credit note)
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> ApiResult<Vec<u8>>;
}
