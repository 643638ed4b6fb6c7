//! Conversion of upstream shapes into the crate's internal entities
//!
//! Every fetched object goes through these conversions before anything else
//! looks at it, so the rest of the crate never branches on "expanded or id".

use chrono::{DateTime, Utc};

use crate::api::objects::*;
use crate::types::*;

/// Unix seconds to UTC; out-of-range values fall back to the epoch
pub fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

fn link_id<T: HasId>(link: &Option<Expandable<T>>) -> Option<String> {
    link.as_ref().map(|l| l.id().to_string())
}

impl From<&Expandable<ApiCustomer>> for Customer {
    fn from(link: &Expandable<ApiCustomer>) -> Self {
        match link {
            Expandable::Id(id) => Customer::from_id(id.clone()),
            Expandable::Object(customer) => Customer {
                id: customer.id.clone(),
                name: customer.name.clone(),
                email: customer.email.clone(),
            },
        }
    }
}

impl From<ApiPayout> for Payout {
    fn from(payout: ApiPayout) -> Self {
        let destination = payout
            .destination
            .as_ref()
            .and_then(|d| d.as_object())
            .map(|bank| BankAccount {
                country: bank.country.clone(),
                last4: bank.last4.clone(),
                bank_name: bank.bank_name.clone(),
            });

        Payout {
            id: payout.id,
            amount: payout.amount,
            currency: payout.currency,
            created: timestamp_to_datetime(payout.created),
            arrival_date: timestamp_to_datetime(payout.arrival_date),
            status: payout.status,
            method: payout.method,
            destination,
        }
    }
}

impl From<ApiBalanceTransaction> for LedgerEntry {
    fn from(txn: ApiBalanceTransaction) -> Self {
        LedgerEntry {
            entry_type: LedgerEntryType::parse(&txn.kind),
            created: timestamp_to_datetime(txn.created),
            fee_lines: txn
                .fee_details
                .into_iter()
                .map(|fee| FeeLine {
                    fee_type: fee.fee_type,
                    amount: fee.amount,
                    currency: fee.currency,
                    description: fee.description,
                })
                .collect(),
            id: txn.id,
            gross: txn.amount,
            fee: txn.fee,
            net: txn.net,
            currency: txn.currency,
            source: txn.source.filter(|s| !s.is_empty()),
            description: txn.description,
        }
    }
}

impl From<ApiCharge> for Charge {
    fn from(charge: ApiCharge) -> Self {
        let payment_intent_invoice_id = charge
            .payment_intent
            .as_ref()
            .and_then(|pi| pi.as_object())
            .and_then(|pi| link_id(&pi.invoice));

        Charge {
            customer: charge.customer.as_ref().map(Customer::from),
            invoice_id: link_id(&charge.invoice),
            payment_intent_id: link_id(&charge.payment_intent),
            payment_intent_invoice_id,
            id: charge.id,
            amount: charge.amount,
            currency: charge.currency,
            created: timestamp_to_datetime(charge.created),
            status: charge.status,
            description: charge.description,
        }
    }
}

impl From<ApiInvoice> for Invoice {
    fn from(invoice: ApiInvoice) -> Self {
        Invoice {
            customer: invoice.customer.as_ref().map(Customer::from),
            charge_id: link_id(&invoice.charge),
            payment_intent_id: link_id(&invoice.payment_intent),
            id: invoice.id,
            number: invoice.number.filter(|n| !n.is_empty()),
            created: timestamp_to_datetime(invoice.created),
            due_date: invoice.due_date.map(timestamp_to_datetime),
            subtotal: invoice.subtotal.unwrap_or(0),
            tax: invoice.tax.unwrap_or(0),
            total: invoice.total.unwrap_or(0),
            currency: invoice.currency,
            status: invoice.status,
            invoice_pdf: invoice.invoice_pdf,
        }
    }
}

impl From<ApiPaymentIntent> for PaymentIntent {
    fn from(intent: ApiPaymentIntent) -> Self {
        let invoice_id = link_id(&intent.invoice);
        let mut charges: Vec<ChargeRef> = Vec::new();

        let listed = intent
            .charges
            .map(|list| list.data)
            .unwrap_or_default()
            .into_iter()
            .map(|c| Expandable::Object(Box::new(c)));

        for link in listed.chain(intent.latest_charge) {
            if charges.iter().any(|existing| existing.id() == link.id()) {
                continue;
            }
            let charge_ref = match link {
                Expandable::Id(id) => ChargeRef::Id(id),
                Expandable::Object(api_charge) => {
                    let mut charge = Charge::from(*api_charge);
                    charge
                        .payment_intent_id
                        .get_or_insert_with(|| intent.id.clone());
                    if charge.payment_intent_invoice_id.is_none() {
                        charge.payment_intent_invoice_id = invoice_id.clone();
                    }
                    ChargeRef::Embedded(Box::new(charge))
                }
            };
            charges.push(charge_ref);
        }

        PaymentIntent {
            customer: intent.customer.as_ref().map(Customer::from),
            id: intent.id,
            invoice_id,
            charges,
        }
    }
}

impl From<ApiRefund> for Refund {
    fn from(refund: ApiRefund) -> Self {
        Refund {
            charge_id: link_id(&refund.charge),
            payment_intent_id: link_id(&refund.payment_intent),
            id: refund.id,
            amount: refund.amount,
            currency: refund.currency,
            created: timestamp_to_datetime(refund.created),
            status: refund.status,
            reason: refund.reason,
        }
    }
}

impl From<ApiDispute> for Dispute {
    fn from(dispute: ApiDispute) -> Self {
        Dispute {
            charge_id: link_id(&dispute.charge),
            id: dispute.id,
            amount: dispute.amount,
            currency: dispute.currency,
            created: timestamp_to_datetime(dispute.created),
            status: dispute.status,
            reason: dispute.reason,
        }
    }
}

impl From<ApiTransfer> for Transfer {
    fn from(transfer: ApiTransfer) -> Self {
        Transfer {
            id: transfer.id,
            amount: transfer.amount,
            currency: transfer.currency,
            created: timestamp_to_datetime(transfer.created),
            destination: transfer.destination,
            description: transfer.description,
        }
    }
}

impl From<ApiCreditNote> for CreditNote {
    fn from(note: ApiCreditNote) -> Self {
        CreditNote {
            invoice_id: link_id(&note.invoice),
            customer: note.customer.as_ref().map(Customer::from),
            refund_id: link_id(&note.refund),
            id: note.id,
            number: note.number.filter(|n| !n.is_empty()),
            created: timestamp_to_datetime(note.created),
            total: note.total,
            currency: note.currency,
            status: note.status,
            reason: note.reason,
            pdf: note.pdf,
        }
    }
}
