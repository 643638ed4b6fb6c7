//! Entity resolution for ledger entry sources
//!
//! A source identifier is dispatched on its prefix and the referenced entity
//! is fetched, normalized and recorded in the [`ResolvedEntitySet`]. Charges
//! additionally go through an ordered chain of [`InvoiceStrategy`]s to find
//! the invoice they pay.
//!
//! Upstream "not found" means absence: the link is skipped and resolution
//! moves on. Any other upstream error is returned to the caller.

use async_trait::async_trait;
use tracing::debug;

use crate::reconciliation::cache::{EntityKind, ResolvedEntitySet};
use crate::traits::*;
use crate::types::*;

/// Outcome of an invoice lookup strategy
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceHit {
    /// Only the identifier is known; it still has to be fetched
    Id(String),
    /// The lookup already returned the invoice
    Found(Box<Invoice>),
}

/// What a ledger source led to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLink {
    pub charge_id: Option<String>,
    /// Set even when no charge was reached, e.g. a payment intent without charges
    pub invoice_id: Option<String>,
}

impl SourceLink {
    fn charge(charge_id: Option<String>) -> Self {
        Self {
            charge_id,
            invoice_id: None,
        }
    }
}

/// Invoice reached through a charge, else the one reached directly
fn linked_invoice(link: &SourceLink, set: &ResolvedEntitySet) -> Option<String> {
    link.charge_id
        .as_deref()
        .and_then(|id| set.invoice_id_for_charge(id))
        .map(str::to_string)
        .or_else(|| link.invoice_id.clone())
}

/// One way of finding the invoice a charge pays
#[async_trait]
pub trait InvoiceStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Look for the invoice of `charge`; `Ok(None)` when this path has nothing
    async fn locate(
        &self,
        api: &dyn PaymentsApi,
        charge: &Charge,
    ) -> ApiResult<Option<InvoiceHit>>;
}

/// Invoice referenced directly on the charge
pub struct DirectInvoice;

#[async_trait]
impl InvoiceStrategy for DirectInvoice {
    fn name(&self) -> &'static str {
        "charge.invoice"
    }

    async fn locate(
        &self,
        _api: &dyn PaymentsApi,
        charge: &Charge,
    ) -> ApiResult<Option<InvoiceHit>> {
        Ok(charge.invoice_id.clone().map(InvoiceHit::Id))
    }
}

/// Invoice referenced on the charge's payment intent
pub struct PaymentIntentInvoice;

#[async_trait]
impl InvoiceStrategy for PaymentIntentInvoice {
    fn name(&self) -> &'static str {
        "payment_intent.invoice"
    }

    async fn locate(
        &self,
        api: &dyn PaymentsApi,
        charge: &Charge,
    ) -> ApiResult<Option<InvoiceHit>> {
        if let Some(invoice_id) = &charge.payment_intent_invoice_id {
            return Ok(Some(InvoiceHit::Id(invoice_id.clone())));
        }
        let Some(intent_id) = &charge.payment_intent_id else {
            return Ok(None);
        };
        let intent = api.get_payment_intent(intent_id).await.optional()?;
        Ok(intent
            .map(PaymentIntent::from)
            .and_then(|pi| pi.invoice_id)
            .map(InvoiceHit::Id))
    }
}

/// Invoice search by payment intent identifier
pub struct InvoiceSearchByPaymentIntent;

#[async_trait]
impl InvoiceStrategy for InvoiceSearchByPaymentIntent {
    fn name(&self) -> &'static str {
        "invoice_search"
    }

    async fn locate(
        &self,
        api: &dyn PaymentsApi,
        charge: &Charge,
    ) -> ApiResult<Option<InvoiceHit>> {
        let Some(intent_id) = &charge.payment_intent_id else {
            return Ok(None);
        };
        let invoices = api
            .search_invoices_by_payment_intent(intent_id)
            .await
            .optional()?
            .unwrap_or_default();
        Ok(invoices
            .into_iter()
            .next()
            .map(|invoice| InvoiceHit::Found(Box::new(Invoice::from(invoice)))))
    }
}

/// Scan of the customer's invoices for one whose charge is this charge.
///
/// Bank-debit rails only record the link on the invoice side. This is a full
/// scan of the customer's invoice history, so it runs last.
pub struct CustomerInvoiceScan;

#[async_trait]
impl InvoiceStrategy for CustomerInvoiceScan {
    fn name(&self) -> &'static str {
        "customer_invoice_scan"
    }

    async fn locate(
        &self,
        api: &dyn PaymentsApi,
        charge: &Charge,
    ) -> ApiResult<Option<InvoiceHit>> {
        let Some(customer) = &charge.customer else {
            return Ok(None);
        };
        let invoices = api
            .list_customer_invoices(&customer.id)
            .await
            .optional()?
            .unwrap_or_default();
        Ok(invoices
            .into_iter()
            .map(Invoice::from)
            .find(|invoice| invoice.charge_id.as_deref() == Some(charge.id.as_str()))
            .map(|invoice| InvoiceHit::Found(Box::new(invoice))))
    }
}

/// Direct reference, payment intent, search, then customer scan
pub fn default_invoice_strategies() -> Vec<Box<dyn InvoiceStrategy>> {
    vec![
        Box::new(DirectInvoice),
        Box::new(PaymentIntentInvoice),
        Box::new(InvoiceSearchByPaymentIntent),
        Box::new(CustomerInvoiceScan),
    ]
}

/// Resolves ledger sources into entities, recording them in a [`ResolvedEntitySet`]
pub struct EntityResolver<'a> {
    api: &'a dyn PaymentsApi,
    strategies: Vec<Box<dyn InvoiceStrategy>>,
}

impl<'a> EntityResolver<'a> {
    /// Create a resolver with the default invoice strategy chain
    pub fn new(api: &'a dyn PaymentsApi) -> Self {
        Self::with_strategies(api, default_invoice_strategies())
    }

    /// Create a resolver with a custom invoice strategy chain, tried in order
    pub fn with_strategies(
        api: &'a dyn PaymentsApi,
        strategies: Vec<Box<dyn InvoiceStrategy>>,
    ) -> Self {
        Self { api, strategies }
    }

    /// Resolve the entity behind a ledger entry source
    pub async fn resolve_source(
        &self,
        source: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<()> {
        let link = match ObjectKind::from_id(source) {
            Some(ObjectKind::Charge) => SourceLink::charge(self.resolve_charge(source, set).await?),
            Some(ObjectKind::PaymentIntent) => self.resolve_payment_intent(source, set).await?,
            Some(ObjectKind::Refund) => self.resolve_refund(source, set).await?,
            Some(ObjectKind::Dispute) => {
                SourceLink::charge(self.resolve_dispute(source, set).await?)
            }
            Some(ObjectKind::Transfer) => {
                self.resolve_transfer(source, set).await?;
                SourceLink::default()
            }
            _ => {
                debug!(source, "no resolver for source prefix");
                SourceLink::default()
            }
        };

        if let Some(charge_id) = &link.charge_id {
            set.link_source(source, charge_id);
        }
        if let Some(invoice_id) = &link.invoice_id {
            set.link_source_invoice(source, invoice_id);
        }
        Ok(())
    }

    /// Resolve a charge by identifier, returning its id when it exists
    pub async fn resolve_charge(
        &self,
        charge_id: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<Option<String>> {
        if set.is_seen(EntityKind::Charge, charge_id) {
            return Ok(Some(charge_id.to_string()));
        }
        match self.api.get_charge(charge_id).await.optional()? {
            Some(charge) => self.register_charge(Charge::from(charge), set).await,
            None => {
                debug!(charge_id, "charge not found");
                Ok(None)
            }
        }
    }

    async fn register_charge(
        &self,
        charge: Charge,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<Option<String>> {
        let charge_id = charge.id.clone();
        if !set.add_charge(charge.clone()) {
            return Ok(Some(charge_id));
        }
        if let Some(invoice_id) = self.discover_invoice(&charge, set).await? {
            set.link_charge_invoice(&charge_id, &invoice_id);
        }
        Ok(Some(charge_id))
    }

    /// Run the strategy chain for a charge, stopping at the first invoice that resolves
    pub async fn discover_invoice(
        &self,
        charge: &Charge,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<Option<String>> {
        for strategy in &self.strategies {
            let Some(hit) = strategy.locate(self.api, charge).await? else {
                continue;
            };
            if let Some(invoice_id) = self.accept_invoice(hit, set).await? {
                debug!(
                    charge_id = %charge.id,
                    invoice_id = %invoice_id,
                    strategy = strategy.name(),
                    "invoice resolved"
                );
                return Ok(Some(invoice_id));
            }
        }
        debug!(charge_id = %charge.id, "no invoice for charge");
        Ok(None)
    }

    async fn accept_invoice(
        &self,
        hit: InvoiceHit,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<Option<String>> {
        let invoice = match hit {
            InvoiceHit::Id(id) if set.is_seen(EntityKind::Invoice, &id) => return Ok(Some(id)),
            InvoiceHit::Id(id) => match self.api.get_invoice(&id).await.optional()? {
                Some(invoice) => Invoice::from(invoice),
                None => return Ok(None),
            },
            InvoiceHit::Found(invoice) => *invoice,
        };
        let invoice_id = invoice.id.clone();
        set.add_invoice(invoice);
        Ok(Some(invoice_id))
    }

    /// Resolve a payment intent's charges.
    ///
    /// Returns the first charge and its invoice. An intent without charges
    /// still yields the invoice it references.
    pub async fn resolve_payment_intent(
        &self,
        intent_id: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<SourceLink> {
        let Some(intent) = self.api.get_payment_intent(intent_id).await.optional()? else {
            debug!(intent_id, "payment intent not found");
            return Ok(SourceLink::default());
        };
        let intent = PaymentIntent::from(intent);

        let mut first_charge = None;
        for charge_ref in intent.charges {
            let resolved = match charge_ref {
                ChargeRef::Id(id) => self.resolve_charge(&id, set).await?,
                ChargeRef::Embedded(charge) => self.register_charge(*charge, set).await?,
            };
            if first_charge.is_none() {
                first_charge = resolved;
            }
        }

        let invoice_id = match &first_charge {
            Some(charge_id) => set.invoice_id_for_charge(charge_id).map(str::to_string),
            None => match intent.invoice_id {
                Some(invoice_id) => self.accept_invoice(InvoiceHit::Id(invoice_id), set).await?,
                None => None,
            },
        };
        Ok(SourceLink {
            charge_id: first_charge,
            invoice_id,
        })
    }

    /// Resolve a refund, its charge and invoice, and the invoice's credit notes
    pub async fn resolve_refund(
        &self,
        refund_id: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<SourceLink> {
        if set.is_seen(EntityKind::Refund, refund_id) {
            return Ok(SourceLink {
                charge_id: set.charge_for_source(refund_id).map(|c| c.id.clone()),
                invoice_id: set.invoice_for_source(refund_id).map(|i| i.id.clone()),
            });
        }
        let Some(refund) = self.api.get_refund(refund_id).await.optional()? else {
            debug!(refund_id, "refund not found");
            return Ok(SourceLink::default());
        };
        let refund = Refund::from(refund);
        let charge_id = refund.charge_id.clone();
        let intent_id = refund.payment_intent_id.clone();
        set.add_refund(refund);

        let link = match (charge_id, intent_id) {
            (Some(charge_id), _) => SourceLink::charge(self.resolve_charge(&charge_id, set).await?),
            (None, Some(intent_id)) => self.resolve_payment_intent(&intent_id, set).await?,
            (None, None) => SourceLink::default(),
        };

        let invoice_id = linked_invoice(&link, set);
        if let Some(invoice_id) = &invoice_id {
            self.attach_credit_notes(invoice_id, set).await?;
        }
        Ok(SourceLink {
            charge_id: link.charge_id,
            invoice_id,
        })
    }

    /// Fetch every credit note of an invoice, keeping only unseen ones
    pub async fn attach_credit_notes(
        &self,
        invoice_id: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<usize> {
        let notes = self
            .api
            .list_credit_notes(invoice_id)
            .await
            .optional()?
            .unwrap_or_default();
        let added = notes
            .into_iter()
            .map(CreditNote::from)
            .filter(|note| set.add_credit_note(note.clone()))
            .count();
        debug!(invoice_id, added, "credit notes attached");
        Ok(added)
    }

    /// Resolve a dispute and the disputed charge
    pub async fn resolve_dispute(
        &self,
        dispute_id: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<Option<String>> {
        if set.is_seen(EntityKind::Dispute, dispute_id) {
            return Ok(set.charge_for_source(dispute_id).map(|c| c.id.clone()));
        }
        let Some(dispute) = self.api.get_dispute(dispute_id).await.optional()? else {
            debug!(dispute_id, "dispute not found");
            return Ok(None);
        };
        let dispute = Dispute::from(dispute);
        let charge_id = dispute.charge_id.clone();
        set.add_dispute(dispute);

        match charge_id {
            Some(charge_id) => self.resolve_charge(&charge_id, set).await,
            None => Ok(None),
        }
    }

    /// Fetch a transfer; not found leaves the set unchanged
    pub async fn resolve_transfer(
        &self,
        transfer_id: &str,
        set: &mut ResolvedEntitySet,
    ) -> ApiResult<()> {
        if set.is_seen(EntityKind::Transfer, transfer_id) {
            return Ok(());
        }
        match self.api.get_transfer(transfer_id).await.optional()? {
            Some(transfer) => {
                set.add_transfer(Transfer::from(transfer));
            }
            None => debug!(transfer_id, "transfer not found"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::*;
    use crate::utils::MemoryApi;
    use proptest::prelude::*;

    fn customer(id: &str) -> Option<Expandable<ApiCustomer>> {
        Some(Expandable::Id(id.to_string()))
    }

    fn charge(id: &str) -> ApiCharge {
        ApiCharge {
            id: id.to_string(),
            amount: 5000,
            currency: "eur".to_string(),
            ..Default::default()
        }
    }

    fn invoice(id: &str) -> ApiInvoice {
        ApiInvoice {
            id: id.to_string(),
            number: Some(format!("F-{}", id)),
            currency: "eur".to_string(),
            total: Some(5000),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_direct_invoice_reference_wins() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            invoice: Some(Expandable::Id("in_1".to_string())),
            payment_intent: Some(Expandable::Id("pi_1".to_string())),
            ..charge("ch_1")
        });
        api.insert_invoice(invoice("in_1"));

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(set.invoice_id_for_charge("ch_1"), Some("in_1"));
        assert_eq!(api.call_count("get_payment_intent"), 0);
        assert_eq!(api.call_count("search_invoices"), 0);
    }

    #[tokio::test]
    async fn test_legacy_charge_prefix_resolves_like_a_charge() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            invoice: Some(Expandable::Id("in_1".to_string())),
            ..charge("py_1")
        });
        api.insert_invoice(invoice("in_1"));

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("py_1", &mut set).await.unwrap();

        assert_eq!(set.charges().len(), 1);
        assert_eq!(set.charge_for_source("py_1").unwrap().id, "py_1");
        assert_eq!(set.invoices().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_intent_invoice_is_fetched_when_only_id_is_held() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            payment_intent: Some(Expandable::Id("pi_1".to_string())),
            ..charge("ch_1")
        });
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            invoice: Some(Expandable::Id("in_1".to_string())),
            ..Default::default()
        });
        api.insert_invoice(ApiInvoice {
            payment_intent: Some(Expandable::Id("pi_1".to_string())),
            ..invoice("in_1")
        });

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(set.invoices().len(), 1);
        assert_eq!(set.invoice_id_for_charge("ch_1"), Some("in_1"));
        // resolvable by search too, but the chain stopped at the payment intent
        assert_eq!(api.call_count("search_invoices"), 0);
        assert_eq!(api.call_count("get_invoice:in_1"), 1);
    }

    #[tokio::test]
    async fn test_search_by_payment_intent_when_intent_has_no_invoice() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            payment_intent: Some(Expandable::Id("pi_1".to_string())),
            ..charge("ch_1")
        });
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            ..Default::default()
        });
        api.insert_invoice(ApiInvoice {
            payment_intent: Some(Expandable::Id("pi_1".to_string())),
            ..invoice("in_1")
        });

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(set.invoice_id_for_charge("ch_1"), Some("in_1"));
        assert_eq!(api.call_count("list_customer_invoices"), 0);
        // the search already returned the invoice
        assert_eq!(api.call_count("get_invoice"), 0);
    }

    #[tokio::test]
    async fn test_customer_scan_finds_invoice_side_link() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            customer: customer("cus_1"),
            ..charge("py_sepa")
        });
        api.insert_invoice(ApiInvoice {
            customer: customer("cus_1"),
            charge: Some(Expandable::Id("py_other".to_string())),
            ..invoice("in_0")
        });
        api.insert_invoice(ApiInvoice {
            customer: customer("cus_1"),
            charge: Some(Expandable::Id("py_sepa".to_string())),
            ..invoice("in_1")
        });

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("py_sepa", &mut set).await.unwrap();

        assert_eq!(set.invoice_id_for_charge("py_sepa"), Some("in_1"));
        assert_eq!(set.invoices().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_invoice_falls_through_to_next_strategy() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            invoice: Some(Expandable::Id("in_deleted".to_string())),
            customer: customer("cus_1"),
            ..charge("ch_1")
        });
        api.insert_invoice(ApiInvoice {
            customer: customer("cus_1"),
            charge: Some(Expandable::Id("ch_1".to_string())),
            ..invoice("in_1")
        });

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(set.invoice_id_for_charge("ch_1"), Some("in_1"));
    }

    #[tokio::test]
    async fn test_charge_without_any_invoice_is_a_valid_terminal_state() {
        let api = MemoryApi::new();
        api.insert_charge(charge("ch_1"));

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(set.charges().len(), 1);
        assert!(set.invoices().is_empty());
        assert_eq!(set.invoice_id_for_charge("ch_1"), None);
    }

    #[tokio::test]
    async fn test_seen_charge_is_not_refetched() {
        let api = MemoryApi::new();
        api.insert_charge(charge("ch_1"));

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(api.call_count("get_charge"), 1);
        assert_eq!(set.charges().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_intent_charge_in_both_fields_is_processed_once() {
        let api = MemoryApi::new();
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            charges: Some(ApiList {
                data: vec![charge("ch_1")],
                has_more: false,
            }),
            latest_charge: Some(Expandable::Id("ch_1".to_string())),
            ..Default::default()
        });

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("pi_1", &mut set).await.unwrap();

        assert_eq!(set.charges().len(), 1);
        assert_eq!(api.call_count("get_charge"), 0);
        assert_eq!(set.charge_for_source("pi_1").unwrap().id, "ch_1");
    }

    #[tokio::test]
    async fn test_payment_intent_with_latest_charge_id_only() {
        let api = MemoryApi::new();
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            latest_charge: Some(Expandable::Id("ch_1".to_string())),
            ..Default::default()
        });
        api.insert_charge(charge("ch_1"));

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("pi_1", &mut set).await.unwrap();

        assert_eq!(api.call_count("get_charge:ch_1"), 1);
        assert_eq!(set.charges().len(), 1);
    }

    #[tokio::test]
    async fn test_refund_attaches_all_credit_notes_of_invoice() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            invoice: Some(Expandable::Id("in_1".to_string())),
            ..charge("ch_1")
        });
        api.insert_invoice(invoice("in_1"));
        api.insert_refund(ApiRefund {
            id: "re_1".to_string(),
            amount: 1000,
            charge: Some(Expandable::Id("ch_1".to_string())),
            ..Default::default()
        });
        for id in ["cn_1", "cn_2"] {
            api.insert_credit_note(ApiCreditNote {
                id: id.to_string(),
                invoice: Some(Expandable::Id("in_1".to_string())),
                ..Default::default()
            });
        }

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("re_1", &mut set).await.unwrap();

        assert_eq!(set.refunds().len(), 1);
        assert_eq!(set.charges().len(), 1);
        assert_eq!(set.credit_notes().len(), 2);
        assert_eq!(set.charge_for_source("re_1").unwrap().id, "ch_1");
    }

    #[tokio::test]
    async fn test_refund_through_payment_intent_without_charges_attaches_credit_notes() {
        let api = MemoryApi::new();
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            invoice: Some(Expandable::Id("in_1".to_string())),
            ..Default::default()
        });
        api.insert_invoice(invoice("in_1"));
        api.insert_refund(ApiRefund {
            id: "re_1".to_string(),
            amount: 1000,
            payment_intent: Some(Expandable::Id("pi_1".to_string())),
            ..Default::default()
        });
        api.insert_credit_note(ApiCreditNote {
            id: "cn_1".to_string(),
            invoice: Some(Expandable::Id("in_1".to_string())),
            ..Default::default()
        });

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("re_1", &mut set).await.unwrap();

        assert!(set.charges().is_empty());
        assert_eq!(set.credit_notes().len(), 1);
        assert_eq!(api.call_count("list_credit_notes:in_1"), 1);
        assert!(set.charge_for_source("re_1").is_none());
        assert_eq!(set.invoice_for_source("re_1").unwrap().id, "in_1");
    }

    #[tokio::test]
    async fn test_payment_intent_without_charges_links_its_invoice() {
        let api = MemoryApi::new();
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            invoice: Some(Expandable::Id("in_1".to_string())),
            ..Default::default()
        });
        api.insert_invoice(invoice("in_1"));

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("pi_1", &mut set).await.unwrap();
        resolver.resolve_source("pi_1", &mut set).await.unwrap();

        assert_eq!(set.invoices().len(), 1);
        assert_eq!(api.call_count("get_invoice:in_1"), 1);
        assert_eq!(set.invoice_for_source("pi_1").unwrap().id, "in_1");
    }

    #[tokio::test]
    async fn test_not_found_sources_are_skipped() {
        let api = MemoryApi::new();
        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();

        for source in ["ch_gone", "re_gone", "dp_gone", "tr_gone", "pi_gone", "src_1"] {
            resolver.resolve_source(source, &mut set).await.unwrap();
        }
        assert!(set.charges().is_empty());
        assert!(set.refunds().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            customer: customer("cus_1"),
            ..charge("ch_1")
        });
        api.fail(
            "list_customer_invoices",
            ApiError::Transport("connection reset".to_string()),
        );

        let resolver = EntityResolver::new(&api);
        let mut set = ResolvedEntitySet::new();
        let err = resolver.resolve_source("ch_1", &mut set).await.unwrap_err();
        assert_eq!(err, ApiError::Transport("connection reset".to_string()));
    }

    #[tokio::test]
    async fn test_custom_strategy_chain_is_respected() {
        let api = MemoryApi::new();
        api.insert_charge(ApiCharge {
            invoice: Some(Expandable::Id("in_1".to_string())),
            customer: customer("cus_1"),
            ..charge("ch_1")
        });
        api.insert_invoice(invoice("in_1"));

        let resolver = EntityResolver::with_strategies(&api, vec![Box::new(CustomerInvoiceScan)]);
        let mut set = ResolvedEntitySet::new();
        resolver.resolve_source("ch_1", &mut set).await.unwrap();

        assert_eq!(set.invoice_id_for_charge("ch_1"), None);
        assert_eq!(api.call_count("get_invoice"), 0);
    }

    const SOURCES: &[&str] = &[
        "ch_1", "ch_2", "py_1", "pi_1", "pi_2", "re_1", "re_2", "re_3", "dp_1", "tr_1",
        "ch_gone", "txr_1",
    ];

    fn shared_fixture() -> MemoryApi {
        let api = MemoryApi::new();
        for id in ["ch_1", "ch_2"] {
            api.insert_charge(ApiCharge {
                invoice: Some(Expandable::Id("in_1".to_string())),
                payment_intent: Some(Expandable::Id("pi_1".to_string())),
                ..charge(id)
            });
        }
        api.insert_charge(ApiCharge {
            customer: customer("cus_1"),
            ..charge("py_1")
        });
        api.insert_invoice(invoice("in_1"));
        api.insert_invoice(ApiInvoice {
            customer: customer("cus_1"),
            charge: Some(Expandable::Id("py_1".to_string())),
            ..invoice("in_2")
        });
        api.insert_invoice(invoice("in_3"));
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_1".to_string(),
            invoice: Some(Expandable::Id("in_1".to_string())),
            charges: Some(ApiList {
                data: vec![ApiCharge {
                    invoice: Some(Expandable::Id("in_1".to_string())),
                    ..charge("ch_1")
                }],
                has_more: false,
            }),
            latest_charge: Some(Expandable::Id("ch_2".to_string())),
            ..Default::default()
        });
        api.insert_payment_intent(ApiPaymentIntent {
            id: "pi_2".to_string(),
            invoice: Some(Expandable::Id("in_3".to_string())),
            ..Default::default()
        });
        for (id, charge_id, intent_id) in [
            ("re_1", Some("ch_1"), None),
            ("re_2", None, Some("pi_2")),
            ("re_3", Some("ch_2"), None),
        ] {
            api.insert_refund(ApiRefund {
                id: id.to_string(),
                amount: 500,
                charge: charge_id.map(|c| Expandable::Id(c.to_string())),
                payment_intent: intent_id.map(|i| Expandable::Id(i.to_string())),
                ..Default::default()
            });
        }
        api.insert_dispute(ApiDispute {
            id: "dp_1".to_string(),
            charge: Some(Expandable::Id("ch_1".to_string())),
            ..Default::default()
        });
        api.insert_transfer(ApiTransfer {
            id: "tr_1".to_string(),
            ..Default::default()
        });
        for (id, invoice_id) in [("cn_1", "in_1"), ("cn_2", "in_1"), ("cn_3", "in_3")] {
            api.insert_credit_note(ApiCreditNote {
                id: id.to_string(),
                invoice: Some(Expandable::Id(invoice_id.to_string())),
                ..Default::default()
            });
        }
        api
    }

    fn all_unique<'a>(ids: impl Iterator<Item = &'a str>) -> bool {
        let mut seen = std::collections::HashSet::new();
        ids.into_iter().all(|id| seen.insert(id))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_repeated_sources_never_duplicate_entities(
            sources in prop::collection::vec(prop::sample::select(SOURCES), 1..24)
        ) {
            let api = shared_fixture();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let set = runtime.block_on(async {
                let resolver = EntityResolver::new(&api);
                let mut set = ResolvedEntitySet::new();
                for source in &sources {
                    resolver.resolve_source(source, &mut set).await.unwrap();
                }
                set
            });

            prop_assert!(all_unique(set.charges().iter().map(|e| e.id.as_str())));
            prop_assert!(all_unique(set.invoices().iter().map(|e| e.id.as_str())));
            prop_assert!(all_unique(set.refunds().iter().map(|e| e.id.as_str())));
            prop_assert!(all_unique(set.disputes().iter().map(|e| e.id.as_str())));
            prop_assert!(all_unique(set.transfers().iter().map(|e| e.id.as_str())));
            prop_assert!(all_unique(set.credit_notes().iter().map(|e| e.id.as_str())));
            prop_assert!(api.call_count("get_charge:ch_1") <= 1);
            prop_assert!(api.call_count("get_invoice:in_1") <= 1);
        }
    }
}
