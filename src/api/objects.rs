//! Upstream object shapes as the payments API returns them
//!
//! Field names follow the API's JSON. Links between objects are
//! [`Expandable`]: a bare identifier unless the request asked for expansion.

use serde::{Deserialize, Serialize};

/// Objects that carry an upstream identifier
pub trait HasId {
    fn id(&self) -> &str;
}

/// A link that is either a bare identifier or the expanded object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T: HasId> Expandable<T> {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(object) => object.id(),
        }
    }

    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(object) => Some(object),
        }
    }
}

/// Paginated list envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Default for ApiList<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiCustomer {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiBankAccount {
    pub id: String,
    pub country: Option<String>,
    pub last4: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiPayout {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: i64,
    pub arrival_date: i64,
    pub status: String,
    pub method: Option<String>,
    pub destination: Option<Expandable<ApiBankAccount>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiFeeDetail {
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub fee_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiBalanceTransaction {
    pub id: String,
    pub amount: i64,
    pub fee: i64,
    pub net: i64,
    pub currency: String,
    pub created: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub fee_details: Vec<ApiFeeDetail>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiCharge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: i64,
    pub status: Option<String>,
    pub description: Option<String>,
    pub customer: Option<Expandable<ApiCustomer>>,
    pub invoice: Option<Expandable<ApiInvoice>>,
    pub payment_intent: Option<Expandable<ApiPaymentIntent>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiInvoice {
    pub id: String,
    pub number: Option<String>,
    pub created: i64,
    pub due_date: Option<i64>,
    pub customer: Option<Expandable<ApiCustomer>>,
    pub subtotal: Option<i64>,
    pub tax: Option<i64>,
    pub total: Option<i64>,
    pub currency: String,
    pub status: Option<String>,
    pub invoice_pdf: Option<String>,
    pub charge: Option<Expandable<ApiCharge>>,
    pub payment_intent: Option<Expandable<ApiPaymentIntent>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiPaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub customer: Option<Expandable<ApiCustomer>>,
    pub invoice: Option<Expandable<ApiInvoice>>,
    /// Present on older API versions only
    pub charges: Option<ApiList<ApiCharge>>,
    pub latest_charge: Option<Expandable<ApiCharge>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiRefund {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: i64,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub charge: Option<Expandable<ApiCharge>>,
    pub payment_intent: Option<Expandable<ApiPaymentIntent>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiDispute {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: i64,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub charge: Option<Expandable<ApiCharge>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiTransfer {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub created: i64,
    pub destination: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiCreditNote {
    pub id: String,
    pub number: Option<String>,
    pub created: i64,
    pub invoice: Option<Expandable<ApiInvoice>>,
    pub customer: Option<Expandable<ApiCustomer>>,
    pub total: i64,
    pub currency: String,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub refund: Option<Expandable<ApiRefund>>,
    pub pdf: Option<String>,
}

macro_rules! impl_has_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasId for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_has_id!(
    ApiCustomer,
    ApiBankAccount,
    ApiPayout,
    ApiBalanceTransaction,
    ApiCharge,
    ApiInvoice,
    ApiPaymentIntent,
    ApiRefund,
    ApiDispute,
    ApiTransfer,
    ApiCreditNote,
);
