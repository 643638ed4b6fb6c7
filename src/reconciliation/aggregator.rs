//! Ledger classification and category totals
//!
//! Every non-payout ledger entry lands in exactly one [`Category`]. Fees are
//! tracked across categories: fee-type entries contribute their gross
//! magnitude, every other entry contributes the magnitude of its fee field.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Mutually exclusive summary buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Payments,
    Refunds,
    Fees,
    Disputes,
    PaymentFailures,
    Other,
}

impl Category {
    /// Category of a ledger entry type; payouts have none
    pub fn classify(entry_type: &LedgerEntryType) -> Option<Self> {
        match entry_type {
            LedgerEntryType::Charge | LedgerEntryType::Payment => Some(Self::Payments),
            LedgerEntryType::Refund | LedgerEntryType::PaymentRefund => Some(Self::Refunds),
            LedgerEntryType::PaymentFailure | LedgerEntryType::PaymentFailureRefund => {
                Some(Self::PaymentFailures)
            }
            LedgerEntryType::StripeFee | LedgerEntryType::ApplicationFee => Some(Self::Fees),
            LedgerEntryType::Dispute | LedgerEntryType::DisputeWon | LedgerEntryType::DisputeLost => {
                Some(Self::Disputes)
            }
            LedgerEntryType::Payout | LedgerEntryType::PayoutFailure => None,
            LedgerEntryType::Other(_) => Some(Self::Other),
        }
    }
}

/// Number of entries per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub payments: usize,
    pub refunds: usize,
    pub fees: usize,
    pub disputes: usize,
    pub payment_failures: usize,
    pub other: usize,
}

impl CategoryCounts {
    pub fn total(&self) -> usize {
        self.payments + self.refunds + self.fees + self.disputes + self.payment_failures + self.other
    }
}

/// Running totals in minor units.
///
/// `payments` and `other` keep the sign of gross; the remaining buckets are
/// magnitudes. `fee_entries` holds fee-type entries and `attached_fees` the
/// fee fields of everything else; [`CategoryTotals::fees`] is their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    pub payments: i64,
    pub refunds: i64,
    pub fee_entries: i64,
    pub disputes: i64,
    pub payment_failures: i64,
    pub other: i64,
    pub attached_fees: i64,
    pub counts: CategoryCounts,
}

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and accumulate one entry; payout entries are ignored
    pub fn record(&mut self, entry: &LedgerEntry) -> Option<Category> {
        let category = Category::classify(&entry.entry_type)?;
        let gross = entry.gross;

        match category {
            Category::Payments => {
                self.payments += gross;
                self.counts.payments += 1;
            }
            Category::Refunds => {
                self.refunds += gross.abs();
                self.counts.refunds += 1;
            }
            Category::Fees => {
                // magnitude comes from gross, the fee field is not added
                self.fee_entries += gross.abs();
                self.counts.fees += 1;
            }
            Category::Disputes => {
                self.disputes += gross.abs();
                self.counts.disputes += 1;
            }
            Category::PaymentFailures => {
                self.payment_failures += gross.abs();
                self.counts.payment_failures += 1;
            }
            Category::Other => {
                self.other += gross;
                self.counts.other += 1;
            }
        }

        if category != Category::Fees {
            self.attached_fees += entry.fee.abs();
        }
        Some(category)
    }

    /// Total processor fees across all categories
    pub fn fees(&self) -> i64 {
        self.fee_entries + self.attached_fees
    }
}
