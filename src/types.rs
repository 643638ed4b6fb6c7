//! Core types: normalized payment entities, ledger entries and errors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of upstream object, derived from its identifier prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Charge,
    Refund,
    Dispute,
    Transfer,
    PaymentIntent,
    Payout,
    Invoice,
    Customer,
    Subscription,
    CreditNote,
    BalanceTransaction,
    Account,
}

/// Identifier prefixes shared by source dispatch and dashboard links.
///
/// `py_` is the legacy/bank-rail charge prefix and resolves exactly like `ch_`.
const PREFIX_TABLE: &[(&str, ObjectKind)] = &[
    ("ch_", ObjectKind::Charge),
    ("py_", ObjectKind::Charge),
    ("pyr_", ObjectKind::Refund),
    ("re_", ObjectKind::Refund),
    ("dp_", ObjectKind::Dispute),
    ("du_", ObjectKind::Dispute),
    ("tr_", ObjectKind::Transfer),
    ("pi_", ObjectKind::PaymentIntent),
    ("po_", ObjectKind::Payout),
    ("in_", ObjectKind::Invoice),
    ("cus_", ObjectKind::Customer),
    ("sub_", ObjectKind::Subscription),
    ("cn_", ObjectKind::CreditNote),
    ("txn_", ObjectKind::BalanceTransaction),
    ("acct_", ObjectKind::Account),
];

impl ObjectKind {
    /// Look up the kind of an identifier from its prefix
    pub fn from_id(id: &str) -> Option<Self> {
        PREFIX_TABLE
            .iter()
            .find(|(prefix, _)| id.starts_with(prefix))
            .map(|(_, kind)| *kind)
    }

    /// Dashboard section for this kind, if the dashboard has a page for it
    pub fn dashboard_path(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Charge | ObjectKind::PaymentIntent => Some("payments"),
            ObjectKind::Refund => Some("refunds"),
            ObjectKind::Payout => Some("payouts"),
            ObjectKind::Dispute => Some("disputes"),
            ObjectKind::Invoice => Some("invoices"),
            ObjectKind::Customer => Some("customers"),
            ObjectKind::Subscription => Some("subscriptions"),
            ObjectKind::Transfer => Some("connect/transfers"),
            ObjectKind::CreditNote | ObjectKind::BalanceTransaction | ObjectKind::Account => {
                None
            }
        }
    }
}

/// Customer as referenced from charges, invoices and credit notes.
///
/// When the upstream only returned a bare identifier, `name` and `email` are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Customer {
    /// Bare customer known only by identifier
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }

    /// Name, then email, then raw identifier
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.email.as_deref().filter(|e| !e.is_empty()))
            .unwrap_or(&self.id)
    }
}

/// Bank account a payout was sent to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankAccount {
    pub country: Option<String>,
    pub last4: Option<String>,
    pub bank_name: Option<String>,
}

impl BankAccount {
    /// Display string like `FR **** 1234 (BNP Paribas)`
    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
            parts.push(country.to_string());
        }
        if let Some(last4) = self.last4.as_deref().filter(|l| !l.is_empty()) {
            parts.push(format!("**** {}", last4));
        }
        if let Some(bank) = self.bank_name.as_deref().filter(|b| !b.is_empty()) {
            parts.push(format!("({})", bank));
        }
        parts.join(" ")
    }
}

/// The payout being reconciled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub status: String,
    pub method: Option<String>,
    pub destination: Option<BankAccount>,
}

/// Raw ledger entry type as reported upstream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEntryType {
    Charge,
    Payment,
    Refund,
    PaymentRefund,
    PaymentFailure,
    PaymentFailureRefund,
    StripeFee,
    ApplicationFee,
    Dispute,
    DisputeWon,
    DisputeLost,
    Payout,
    PayoutFailure,
    Other(String),
}

impl LedgerEntryType {
    /// Parse the upstream type tag
    pub fn parse(raw: &str) -> Self {
        match raw {
            "charge" => Self::Charge,
            "payment" => Self::Payment,
            "refund" => Self::Refund,
            "payment_refund" => Self::PaymentRefund,
            "payment_failure" => Self::PaymentFailure,
            "payment_failure_refund" => Self::PaymentFailureRefund,
            "stripe_fee" => Self::StripeFee,
            "application_fee" => Self::ApplicationFee,
            "dispute" => Self::Dispute,
            "dispute_won" => Self::DisputeWon,
            "dispute_lost" => Self::DisputeLost,
            "payout" => Self::Payout,
            "payout_failure" => Self::PayoutFailure,
            other => Self::Other(other.to_string()),
        }
    }

    /// The upstream type tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::Charge => "charge",
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::PaymentRefund => "payment_refund",
            Self::PaymentFailure => "payment_failure",
            Self::PaymentFailureRefund => "payment_failure_refund",
            Self::StripeFee => "stripe_fee",
            Self::ApplicationFee => "application_fee",
            Self::Dispute => "dispute",
            Self::DisputeWon => "dispute_won",
            Self::DisputeLost => "dispute_lost",
            Self::Payout => "payout",
            Self::PayoutFailure => "payout_failure",
            Self::Other(raw) => raw,
        }
    }

    /// Payout movements are the subject of the report, never a line in it
    pub fn is_payout(&self) -> bool {
        matches!(self, Self::Payout | Self::PayoutFailure)
    }
}

/// Processor fee line attached to a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub fee_type: String,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
}

/// One atomic balance movement of a payout period. Amounts are minor units.
///
/// `net` is carried as reported; it is never recomputed from `gross - fee`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub created: DateTime<Utc>,
    pub entry_type: LedgerEntryType,
    pub gross: i64,
    pub fee: i64,
    pub net: i64,
    pub currency: String,
    pub source: Option<String>,
    pub description: Option<String>,
    pub fee_lines: Vec<FeeLine>,
}

/// A single customer payment attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub customer: Option<Customer>,
    pub invoice_id: Option<String>,
    pub payment_intent_id: Option<String>,
    /// Invoice held by an expanded payment intent, when the upstream embedded one
    pub payment_intent_invoice_id: Option<String>,
}

/// Charge reachable from a payment intent, embedded or by identifier only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChargeRef {
    Id(String),
    Embedded(Box<Charge>),
}

impl ChargeRef {
    pub fn id(&self) -> &str {
        match self {
            ChargeRef::Id(id) => id,
            ChargeRef::Embedded(charge) => &charge.id,
        }
    }
}

/// Payment intent with its charges flattened into one list.
///
/// Older API versions expose a `charges` collection, newer ones a single
/// `latest_charge`; both end up in `charges`, each identifier once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub customer: Option<Customer>,
    pub invoice_id: Option<String>,
    pub charges: Vec<ChargeRef>,
}

/// Billing document a charge may satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub number: Option<String>,
    pub created: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub customer: Option<Customer>,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub currency: String,
    pub status: Option<String>,
    pub invoice_pdf: Option<String>,
    /// Charge recorded on the invoice side; some bank-debit rails only link here
    pub charge_id: Option<String>,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub charge_id: Option<String>,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub charge_id: Option<String>,
}

/// Connect transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: DateTime<Utc>,
    pub destination: Option<String>,
    pub description: Option<String>,
}

/// Document reversing part or all of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: String,
    pub number: Option<String>,
    pub created: DateTime<Utc>,
    pub invoice_id: Option<String>,
    pub customer: Option<Customer>,
    pub total: i64,
    pub currency: String,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub refund_id: Option<String>,
    pub pdf: Option<String>,
}

/// Errors reported by the upstream payments API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("{kind:?} not found: {id}")]
    NotFound { kind: ObjectKind, id: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn not_found(kind: ObjectKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Only "not found" is recoverable; everything else aborts the payout
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for upstream calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Treat an upstream "not found" as absence
pub trait NotFoundExt<T> {
    fn optional(self) -> ApiResult<Option<T>>;
}

impl<T> NotFoundExt<T> for ApiResult<T> {
    fn optional(self) -> ApiResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Errors that can occur while reconciling or exporting
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Upstream error: {0}")]
    Api(#[from] ApiError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
