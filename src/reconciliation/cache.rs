//! Per-payout set of resolved entities
//!
//! Each entity kind has a set of seen identifiers and an append-only list in
//! discovery order. The first ledger entry that surfaces an entity fixes its
//! position; later sightings are no-ops.

use std::collections::{HashMap, HashSet};

use crate::types::*;

/// Entity kinds tracked for deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Charge,
    Invoice,
    CreditNote,
    Refund,
    Dispute,
    Transfer,
}

/// Everything resolved for one payout. Rebuilt empty for every payout.
#[derive(Debug, Clone, Default)]
pub struct ResolvedEntitySet {
    seen: HashMap<EntityKind, HashSet<String>>,
    charges: Vec<Charge>,
    invoices: Vec<Invoice>,
    refunds: Vec<Refund>,
    disputes: Vec<Dispute>,
    transfers: Vec<Transfer>,
    credit_notes: Vec<CreditNote>,
    charge_invoices: HashMap<String, String>,
    source_charges: HashMap<String, String>,
    source_invoices: HashMap<String, String>,
}

impl ResolvedEntitySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an identifier was already resolved for this kind
    pub fn is_seen(&self, kind: EntityKind, id: &str) -> bool {
        self.seen.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    /// Mark an identifier as seen; returns false if it already was
    fn mark_seen(&mut self, kind: EntityKind, id: &str) -> bool {
        self.seen.entry(kind).or_default().insert(id.to_string())
    }

    /// Append a charge unless already present; returns whether it was added
    pub fn add_charge(&mut self, charge: Charge) -> bool {
        let added = self.mark_seen(EntityKind::Charge, &charge.id);
        if added {
            self.charges.push(charge);
        }
        added
    }

    /// Append an invoice unless already present; returns whether it was added
    pub fn add_invoice(&mut self, invoice: Invoice) -> bool {
        let added = self.mark_seen(EntityKind::Invoice, &invoice.id);
        if added {
            self.invoices.push(invoice);
        }
        added
    }

    /// Append a refund unless already present; returns whether it was added
    pub fn add_refund(&mut self, refund: Refund) -> bool {
        let added = self.mark_seen(EntityKind::Refund, &refund.id);
        if added {
            self.refunds.push(refund);
        }
        added
    }

    /// Append a dispute unless already present; returns whether it was added
    pub fn add_dispute(&mut self, dispute: Dispute) -> bool {
        let added = self.mark_seen(EntityKind::Dispute, &dispute.id);
        if added {
            self.disputes.push(dispute);
        }
        added
    }

    /// Append a transfer unless already present; returns whether it was added
    pub fn add_transfer(&mut self, transfer: Transfer) -> bool {
        let added = self.mark_seen(EntityKind::Transfer, &transfer.id);
        if added {
            self.transfers.push(transfer);
        }
        added
    }

    /// Append a credit note unless already present; returns whether it was added
    pub fn add_credit_note(&mut self, note: CreditNote) -> bool {
        let added = self.mark_seen(EntityKind::CreditNote, &note.id);
        if added {
            self.credit_notes.push(note);
        }
        added
    }

    /// Record the invoice a charge satisfies. The first link wins.
    pub fn link_charge_invoice(&mut self, charge_id: &str, invoice_id: &str) {
        self.charge_invoices
            .entry(charge_id.to_string())
            .or_insert_with(|| invoice_id.to_string());
    }

    /// Record the charge behind a ledger source (charge, payment intent, refund, dispute)
    pub fn link_source(&mut self, source_id: &str, charge_id: &str) {
        self.source_charges
            .entry(source_id.to_string())
            .or_insert_with(|| charge_id.to_string());
    }

    /// Record an invoice reached from a ledger source without going through a charge
    pub fn link_source_invoice(&mut self, source_id: &str, invoice_id: &str) {
        self.source_invoices
            .entry(source_id.to_string())
            .or_insert_with(|| invoice_id.to_string());
    }

    /// Charges in discovery order
    pub fn charges(&self) -> &[Charge] {
        &self.charges
    }

    /// Invoices in discovery order
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Refunds in discovery order
    pub fn refunds(&self) -> &[Refund] {
        &self.refunds
    }

    /// Disputes in discovery order
    pub fn disputes(&self) -> &[Dispute] {
        &self.disputes
    }

    /// Transfers in discovery order
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Credit notes in discovery order
    pub fn credit_notes(&self) -> &[CreditNote] {
        &self.credit_notes
    }

    /// Look up a resolved charge by id
    pub fn charge(&self, charge_id: &str) -> Option<&Charge> {
        self.charges.iter().find(|c| c.id == charge_id)
    }

    /// Look up a resolved invoice by id
    pub fn invoice(&self, invoice_id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == invoice_id)
    }

    /// Identifier of the invoice a charge pays, if one was found
    pub fn invoice_id_for_charge(&self, charge_id: &str) -> Option<&str> {
        self.charge_invoices.get(charge_id).map(String::as_str)
    }

    /// Invoice a charge pays, if one was found
    pub fn invoice_for_charge(&self, charge_id: &str) -> Option<&Invoice> {
        self.invoice_id_for_charge(charge_id)
            .and_then(|id| self.invoice(id))
    }

    /// Charge behind a ledger source
    pub fn charge_for_source(&self, source_id: &str) -> Option<&Charge> {
        self.source_charges
            .get(source_id)
            .and_then(|id| self.charge(id))
    }

    /// Invoice behind a ledger source: through its charge, else linked directly
    pub fn invoice_for_source(&self, source_id: &str) -> Option<&Invoice> {
        self.charge_for_source(source_id)
            .and_then(|charge| self.invoice_for_charge(&charge.id))
            .or_else(|| {
                self.source_invoices
                    .get(source_id)
                    .and_then(|id| self.invoice(id))
            })
    }

    /// Credit notes issued against an invoice, in discovery order
    pub fn credit_notes_for_invoice<'a>(
        &'a self,
        invoice_id: &'a str,
    ) -> impl Iterator<Item = &'a CreditNote> + 'a {
        self.credit_notes
            .iter()
            .filter(move |n| n.invoice_id.as_deref() == Some(invoice_id))
    }
}
