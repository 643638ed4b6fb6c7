//! In-memory payments API for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::*;
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct MemoryState {
    account_id: Option<String>,
    payouts: Vec<ApiPayout>,
    balance_transactions: HashMap<String, Vec<ApiBalanceTransaction>>,
    charges: HashMap<String, ApiCharge>,
    refunds: HashMap<String, ApiRefund>,
    invoices: Vec<ApiInvoice>,
    disputes: HashMap<String, ApiDispute>,
    transfers: HashMap<String, ApiTransfer>,
    payment_intents: HashMap<String, ApiPaymentIntent>,
    credit_notes: Vec<ApiCreditNote>,
    failures: HashMap<String, ApiError>,
    calls: Vec<String>,
}

/// In-memory payments API.
///
/// Every call is recorded as `operation:argument` so tests can assert what
/// was fetched. Failures can be injected per operation (`get_charge`) or per
/// call (`get_charge:ch_123`).
#[derive(Debug, Clone, Default)]
pub struct MemoryApi {
    state: Arc<Mutex<MemoryState>>,
}

fn upsert<T: HasId>(items: &mut Vec<T>, item: T) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl MemoryApi {
    /// Create an empty API
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the account identifier returned by `account_id`
    pub fn with_account(self, account_id: &str) -> Self {
        self.state().account_id = Some(account_id.to_string());
        self
    }

    /// Add a payout together with the balance transactions it settles
    pub fn insert_payout(&self, payout: ApiPayout, transactions: Vec<ApiBalanceTransaction>) {
        let mut state = self.state();
        state
            .balance_transactions
            .insert(payout.id.clone(), transactions);
        upsert(&mut state.payouts, payout);
    }

    pub fn insert_charge(&self, charge: ApiCharge) {
        self.state().charges.insert(charge.id.clone(), charge);
    }

    pub fn insert_refund(&self, refund: ApiRefund) {
        self.state().refunds.insert(refund.id.clone(), refund);
    }

    pub fn insert_invoice(&self, invoice: ApiInvoice) {
        upsert(&mut self.state().invoices, invoice);
    }

    pub fn insert_dispute(&self, dispute: ApiDispute) {
        self.state().disputes.insert(dispute.id.clone(), dispute);
    }

    pub fn insert_transfer(&self, transfer: ApiTransfer) {
        self.state().transfers.insert(transfer.id.clone(), transfer);
    }

    pub fn insert_payment_intent(&self, intent: ApiPaymentIntent) {
        self.state()
            .payment_intents
            .insert(intent.id.clone(), intent);
    }

    pub fn insert_credit_note(&self, note: ApiCreditNote) {
        upsert(&mut self.state().credit_notes, note);
    }

    /// Make an operation, or a single `operation:argument` call, fail
    pub fn fail(&self, key: &str, error: ApiError) {
        self.state().failures.insert(key.to_string(), error);
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of recorded calls starting with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.state() = MemoryState::default();
    }

    fn record(&self, operation: &str, argument: &str) -> ApiResult<()> {
        let mut state = self.state();
        let call = format!("{}:{}", operation, argument);
        state.calls.push(call.clone());
        match state
            .failures
            .get(&call)
            .or_else(|| state.failures.get(operation))
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn found<T: Clone>(item: Option<&T>, kind: ObjectKind, id: &str) -> ApiResult<T> {
    item.cloned().ok_or_else(|| ApiError::not_found(kind, id))
}

#[async_trait]
impl PaymentsApi for MemoryApi {
    async fn get_payout(&self, payout_id: &str) -> ApiResult<ApiPayout> {
        self.record("get_payout", payout_id)?;
        let state = self.state();
        found(
            state.payouts.iter().find(|p| p.id == payout_id),
            ObjectKind::Payout,
            payout_id,
        )
    }

    async fn list_payouts(&self, filter: &PayoutFilter) -> ApiResult<Vec<ApiPayout>> {
        self.record("list_payouts", filter.status.as_deref().unwrap_or("*"))?;
        let from = filter.created_from.map(|d| d.timestamp());
        let to = filter.created_to.map(|d| d.timestamp());
        let mut payouts: Vec<ApiPayout> = self
            .state()
            .payouts
            .iter()
            .filter(|p| from.is_none_or(|f| p.created >= f))
            .filter(|p| to.is_none_or(|t| p.created <= t))
            .filter(|p| filter.status.as_ref().is_none_or(|s| &p.status == s))
            .cloned()
            .collect();
        payouts.sort_by_key(|p| p.created);
        Ok(payouts)
    }

    async fn list_balance_transactions(
        &self,
        payout_id: &str,
    ) -> ApiResult<Vec<ApiBalanceTransaction>> {
        self.record("list_balance_transactions", payout_id)?;
        found(
            self.state().balance_transactions.get(payout_id),
            ObjectKind::Payout,
            payout_id,
        )
    }

    async fn get_charge(&self, charge_id: &str) -> ApiResult<ApiCharge> {
        self.record("get_charge", charge_id)?;
        found(self.state().charges.get(charge_id), ObjectKind::Charge, charge_id)
    }

    async fn get_refund(&self, refund_id: &str) -> ApiResult<ApiRefund> {
        self.record("get_refund", refund_id)?;
        found(self.state().refunds.get(refund_id), ObjectKind::Refund, refund_id)
    }

    async fn get_invoice(&self, invoice_id: &str) -> ApiResult<ApiInvoice> {
        self.record("get_invoice", invoice_id)?;
        let state = self.state();
        found(
            state.invoices.iter().find(|i| i.id == invoice_id),
            ObjectKind::Invoice,
            invoice_id,
        )
    }

    async fn get_dispute(&self, dispute_id: &str) -> ApiResult<ApiDispute> {
        self.record("get_dispute", dispute_id)?;
        found(
            self.state().disputes.get(dispute_id),
            ObjectKind::Dispute,
            dispute_id,
        )
    }

    async fn get_transfer(&self, transfer_id: &str) -> ApiResult<ApiTransfer> {
        self.record("get_transfer", transfer_id)?;
        found(
            self.state().transfers.get(transfer_id),
            ObjectKind::Transfer,
            transfer_id,
        )
    }

    async fn get_payment_intent(&self, payment_intent_id: &str) -> ApiResult<ApiPaymentIntent> {
        self.record("get_payment_intent", payment_intent_id)?;
        found(
            self.state().payment_intents.get(payment_intent_id),
            ObjectKind::PaymentIntent,
            payment_intent_id,
        )
    }

    async fn get_credit_note(&self, credit_note_id: &str) -> ApiResult<ApiCreditNote> {
        self.record("get_credit_note", credit_note_id)?;
        let state = self.state();
        found(
            state.credit_notes.iter().find(|n| n.id == credit_note_id),
            ObjectKind::CreditNote,
            credit_note_id,
        )
    }

    async fn search_invoices_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> ApiResult<Vec<ApiInvoice>> {
        self.record("search_invoices", payment_intent_id)?;
        Ok(self
            .state()
            .invoices
            .iter()
            .filter(|i| {
                i.payment_intent
                    .as_ref()
                    .is_some_and(|pi| pi.id() == payment_intent_id)
            })
            .cloned()
            .collect())
    }

    async fn list_customer_invoices(&self, customer_id: &str) -> ApiResult<Vec<ApiInvoice>> {
        self.record("list_customer_invoices", customer_id)?;
        Ok(self
            .state()
            .invoices
            .iter()
            .filter(|i| i.customer.as_ref().is_some_and(|c| c.id() == customer_id))
            .cloned()
            .collect())
    }

    async fn list_credit_notes(&self, invoice_id: &str) -> ApiResult<Vec<ApiCreditNote>> {
        self.record("list_credit_notes", invoice_id)?;
        Ok(self
            .state()
            .credit_notes
            .iter()
            .filter(|n| n.invoice.as_ref().is_some_and(|i| i.id() == invoice_id))
            .cloned()
            .collect())
    }

    async fn account_id(&self) -> ApiResult<String> {
        self.record("account_id", "")?;
        self.state()
            .account_id
            .clone()
            .ok_or_else(|| ApiError::not_found(ObjectKind::Account, "current"))
    }
}

/// In-memory artifact source keyed by URL
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifacts {
    files: Arc<Mutex<HashMap<String, ApiResult<Vec<u8>>>>>,
}

impl MemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &str, bytes: Vec<u8>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), Ok(bytes));
    }

    pub fn fail(&self, url: &str, error: ApiError) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), Err(error));
    }
}

#[async_trait]
impl ArtifactFetcher for MemoryArtifacts {
    async fn fetch(&self, url: &str) -> ApiResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Transport(format!("404 for {}", url))))
    }
}
