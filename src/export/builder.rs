//! Turns a reconciled payout into export rows
//!
//! Pure and deterministic: the same [`ReconciledPayout`] always yields the
//! same bundle, with rows in discovery order. Nothing is fetched here.

use crate::export::records::*;
use crate::reconciliation::{ReconciledPayout, ResolvedEntitySet};
use crate::types::*;
use crate::utils::*;

/// Builds [`ExportBundle`]s
pub struct ExportRecordBuilder;

impl ExportRecordBuilder {
    /// Turn a reconciled payout into its summary and rows; no I/O
    pub fn build(reconciled: &ReconciledPayout) -> ExportBundle {
        let entities = &reconciled.entities;

        let transactions: Vec<TransactionRow> = reconciled
            .entries
            .iter()
            .map(|entry| transaction_row(entry, entities))
            .collect();

        let fees = reconciled
            .fee_lines
            .iter()
            .map(|fee| FeeRow {
                transaction_id: fee.transaction_id.clone(),
                fee_type: fee.line.fee_type.clone(),
                type_label: translate_fee_type(&fee.line.fee_type),
                amount: cents_to_decimal(fee.line.amount),
                currency: fee.line.currency.to_uppercase(),
                description: fee.line.description.clone().unwrap_or_default(),
            })
            .collect();

        ExportBundle {
            summary: summary(reconciled, transactions.len()),
            transactions,
            invoices: entities.invoices().iter().map(invoice_row).collect(),
            fees,
            refunds: entities
                .refunds()
                .iter()
                .map(|refund| refund_row(refund, entities))
                .collect(),
            credit_notes: entities
                .credit_notes()
                .iter()
                .map(|note| credit_note_row(note, entities))
                .collect(),
            account_id: reconciled.account_id.clone(),
        }
    }
}

fn summary(reconciled: &ReconciledPayout, transaction_count: usize) -> FinancialSummary {
    let payout = &reconciled.payout;
    let totals = &reconciled.totals;
    let entities = &reconciled.entities;

    FinancialSummary {
        payout_id: payout.id.clone(),
        created: payout.created,
        arrival_date: payout.arrival_date,
        amount: cents_to_decimal(payout.amount),
        currency: payout.currency.to_uppercase(),
        status: payout.status.clone(),
        status_label: translate_payout_status(&payout.status),
        method: payout
            .method
            .clone()
            .unwrap_or_else(|| "standard".to_string()),
        destination: payout
            .destination
            .as_ref()
            .map(BankAccount::display)
            .unwrap_or_default(),
        total_payments: cents_to_decimal(totals.payments),
        total_refunds: cents_to_decimal(totals.refunds),
        total_fees: cents_to_decimal(totals.fees()),
        total_disputes: cents_to_decimal(totals.disputes),
        total_payment_failures: cents_to_decimal(totals.payment_failures),
        total_other: cents_to_decimal(totals.other),
        counts: totals.counts,
        transaction_count,
        invoice_count: entities.invoices().len(),
        refund_count: entities.refunds().len(),
        dispute_count: entities.disputes().len(),
        credit_note_count: entities.credit_notes().len(),
    }
}

/// Client shown for a charge: the charge's customer, else its invoice's
fn client_for(charge: Option<&Charge>, invoice: Option<&Invoice>) -> String {
    let customer = charge
        .and_then(|c| c.customer.as_ref())
        .or_else(|| invoice.and_then(|i| i.customer.as_ref()));
    customer_display_name(customer)
}

fn invoice_number(invoice: Option<&Invoice>) -> String {
    invoice.and_then(|i| i.number.clone()).unwrap_or_default()
}

fn transaction_row(entry: &LedgerEntry, entities: &ResolvedEntitySet) -> TransactionRow {
    let charge = entry
        .source
        .as_deref()
        .and_then(|source| entities.charge_for_source(source));
    let invoice = entry
        .source
        .as_deref()
        .and_then(|source| entities.invoice_for_source(source));

    TransactionRow {
        id: entry.id.clone(),
        created: entry.created,
        entry_type: entry.entry_type.as_str().to_string(),
        type_label: translate_transaction_type(entry.entry_type.as_str()),
        gross: cents_to_decimal(entry.gross),
        fee: cents_to_decimal(entry.fee),
        net: cents_to_decimal(entry.net),
        currency: entry.currency.to_uppercase(),
        description: entry.description.clone().unwrap_or_default(),
        source: entry.source.clone().unwrap_or_default(),
        charge_id: charge.map(|c| c.id.clone()).unwrap_or_default(),
        invoice_id: invoice.map(|i| i.id.clone()).unwrap_or_default(),
        invoice_number: invoice_number(invoice),
        client: client_for(charge, invoice),
    }
}

fn invoice_row(invoice: &Invoice) -> InvoiceRow {
    InvoiceRow {
        id: invoice.id.clone(),
        number: invoice.number.clone().unwrap_or_default(),
        created: invoice.created,
        due_date: invoice.due_date,
        customer_id: invoice
            .customer
            .as_ref()
            .map(|c| c.id.clone())
            .unwrap_or_default(),
        client: customer_display_name(invoice.customer.as_ref()),
        subtotal: cents_to_decimal(invoice.subtotal),
        tax: cents_to_decimal(invoice.tax),
        total: cents_to_decimal(invoice.total),
        currency: invoice.currency.to_uppercase(),
        status_label: invoice
            .status
            .as_deref()
            .map(translate_invoice_status)
            .unwrap_or_default(),
        charge_id: invoice.charge_id.clone().unwrap_or_default(),
        pdf_url: invoice.invoice_pdf.clone(),
    }
}

fn refund_row(refund: &Refund, entities: &ResolvedEntitySet) -> RefundRow {
    let charge = refund
        .charge_id
        .as_deref()
        .and_then(|id| entities.charge(id))
        .or_else(|| entities.charge_for_source(&refund.id));
    let invoice = charge
        .and_then(|c| entities.invoice_for_charge(&c.id))
        .or_else(|| entities.invoice_for_source(&refund.id));

    let credit_note = entities
        .credit_notes()
        .iter()
        .find(|n| n.refund_id.as_deref() == Some(refund.id.as_str()))
        .or_else(|| invoice.and_then(|i| entities.credit_notes_for_invoice(&i.id).next()));

    RefundRow {
        id: refund.id.clone(),
        created: refund.created,
        amount: cents_to_decimal(refund.amount),
        currency: refund.currency.to_uppercase(),
        status_label: refund
            .status
            .as_deref()
            .map(translate_refund_status)
            .unwrap_or_default(),
        reason_label: translate_refund_reason(refund.reason.as_deref()),
        charge_id: charge
            .map(|c| c.id.clone())
            .or_else(|| refund.charge_id.clone())
            .unwrap_or_default(),
        invoice_number: invoice_number(invoice),
        client: client_for(charge, invoice),
        credit_note_number: credit_note
            .map(|n| n.number.clone().unwrap_or_else(|| n.id.clone()))
            .unwrap_or_default(),
    }
}

fn credit_note_row(note: &CreditNote, entities: &ResolvedEntitySet) -> CreditNoteRow {
    let invoice = note.invoice_id.as_deref().and_then(|id| entities.invoice(id));
    let customer = note
        .customer
        .as_ref()
        .or_else(|| invoice.and_then(|i| i.customer.as_ref()));

    CreditNoteRow {
        id: note.id.clone(),
        number: note.number.clone().unwrap_or_default(),
        created: note.created,
        invoice_id: note.invoice_id.clone().unwrap_or_default(),
        invoice_number: invoice_number(invoice),
        client: customer_display_name(customer),
        total: cents_to_decimal(note.total),
        currency: note.currency.to_uppercase(),
        status_label: note
            .status
            .as_deref()
            .map(translate_credit_note_status)
            .unwrap_or_default(),
        reason: note.reason.clone().unwrap_or_default(),
        refund_id: note.refund_id.clone().unwrap_or_default(),
        pdf_url: note.pdf.clone(),
    }
}
