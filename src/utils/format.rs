//! French labels, money conversion and display helpers
//!
//! Lookup tables are plain static slices. Unknown keys fall back to the raw
//! value with underscores replaced by spaces and each word capitalised.

use bigdecimal::BigDecimal;

use crate::types::*;

/// Dashboard host used for deep links
pub const DASHBOARD_BASE_URL: &str = "https://dashboard.stripe.com";

const TRANSACTION_TYPES: &[(&str, &str)] = &[
    ("charge", "Paiement"),
    ("payment", "Paiement"),
    ("refund", "Remboursement"),
    ("payment_refund", "Remboursement"),
    ("payment_failure", "Échec Paiement"),
    ("payment_failure_refund", "Remb. Échec Paiement"),
    ("adjustment", "Ajustement"),
    ("application_fee", "Commission Application"),
    ("application_fee_refund", "Remb. Commission"),
    ("transfer", "Transfert"),
    ("payout", "Virement"),
    ("payout_failure", "Échec Virement"),
    ("stripe_fee", "Frais Stripe"),
    ("network_cost", "Coûts Réseau"),
    ("dispute", "Litige"),
    ("dispute_won", "Litige Gagné"),
    ("dispute_lost", "Litige Perdu"),
    ("issuing_authorization_hold", "Autorisation"),
    ("issuing_authorization_release", "Libération Autorisation"),
    ("issuing_dispute", "Litige Issuing"),
    ("issuing_transaction", "Transaction Issuing"),
];

const INVOICE_STATUS: &[(&str, &str)] = &[
    ("draft", "Brouillon"),
    ("open", "Ouverte"),
    ("paid", "Payée"),
    ("uncollectible", "Irrécouvrable"),
    ("void", "Annulée"),
];

const PAYOUT_STATUS: &[(&str, &str)] = &[
    ("paid", "Payé"),
    ("pending", "En attente"),
    ("in_transit", "En transit"),
    ("canceled", "Annulé"),
    ("failed", "Échoué"),
];

const FEE_TYPES: &[(&str, &str)] = &[
    ("stripe_fee", "Frais Stripe"),
    ("application_fee", "Commission Application"),
    ("network_cost", "Coûts Réseau"),
    ("tax", "Taxe"),
];

const REFUND_REASONS: &[(&str, &str)] = &[
    ("duplicate", "Doublon"),
    ("fraudulent", "Fraude"),
    ("requested_by_customer", "Demande client"),
    ("expired_uncaptured_charge", "Charge expirée"),
];

const REFUND_STATUS: &[(&str, &str)] = &[
    ("pending", "En attente"),
    ("succeeded", "Effectué"),
    ("failed", "Échoué"),
    ("canceled", "Annulé"),
    ("requires_action", "Action requise"),
];

const CREDIT_NOTE_STATUS: &[(&str, &str)] = &[("issued", "Émis"), ("void", "Annulé")];

fn lookup(table: &[(&str, &str)], key: &str) -> String {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| title_case(key))
}

/// `requires_payment_method` -> `Requires Payment Method`
pub fn title_case(raw: &str) -> String {
    raw.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn translate_transaction_type(kind: &str) -> String {
    lookup(TRANSACTION_TYPES, kind)
}

pub fn translate_invoice_status(status: &str) -> String {
    lookup(INVOICE_STATUS, status)
}

pub fn translate_payout_status(status: &str) -> String {
    lookup(PAYOUT_STATUS, status)
}

pub fn translate_fee_type(fee_type: &str) -> String {
    lookup(FEE_TYPES, fee_type)
}

/// Empty when no reason was given
pub fn translate_refund_reason(reason: Option<&str>) -> String {
    reason
        .filter(|r| !r.is_empty())
        .map(|r| lookup(REFUND_REASONS, r))
        .unwrap_or_default()
}

pub fn translate_refund_status(status: &str) -> String {
    lookup(REFUND_STATUS, status)
}

pub fn translate_credit_note_status(status: &str) -> String {
    lookup(CREDIT_NOTE_STATUS, status)
}

/// Minor units (cents) to a two-decimal major-unit amount
pub fn cents_to_decimal(amount_cents: i64) -> BigDecimal {
    BigDecimal::new(amount_cents.into(), 2)
}

/// Customer display name, or an empty string when there is no customer
pub fn customer_display_name(customer: Option<&Customer>) -> String {
    customer
        .map(|c| c.display_name().to_string())
        .unwrap_or_default()
}

/// Dashboard deep link for an identifier, using the same prefix table as
/// source dispatch. Identifiers without a dashboard page yield `None`.
pub fn dashboard_url(object_id: &str, account_id: Option<&str>) -> Option<String> {
    let path = ObjectKind::from_id(object_id)?.dashboard_path()?;
    Some(match account_id.filter(|a| !a.is_empty()) {
        Some(account) => format!("{}/{}/{}/{}", DASHBOARD_BASE_URL, account, path, object_id),
        None => format!("{}/{}/{}", DASHBOARD_BASE_URL, path, object_id),
    })
}

/// Make a string safe to use as a file name
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    replaced
        .trim_matches(|c| c == ' ' || c == '.')
        .chars()
        .take(200)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_labels() {
        assert_eq!(translate_transaction_type("stripe_fee"), "Frais Stripe");
        assert_eq!(translate_transaction_type("reserve_transaction"), "Reserve Transaction");
        assert_eq!(translate_invoice_status("paid"), "Payée");
        assert_eq!(translate_payout_status("in_transit"), "En transit");
        assert_eq!(translate_refund_reason(None), "");
        assert_eq!(translate_refund_reason(Some("duplicate")), "Doublon");
        assert_eq!(translate_credit_note_status("void"), "Annulé");
    }

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(12345), "123.45".parse::<BigDecimal>().unwrap());
        assert_eq!(cents_to_decimal(-50), "-0.50".parse::<BigDecimal>().unwrap());
    }

    #[test]
    fn test_dashboard_url() {
        assert_eq!(
            dashboard_url("ch_1", Some("acct_9")).as_deref(),
            Some("https://dashboard.stripe.com/acct_9/payments/ch_1")
        );
        assert_eq!(
            dashboard_url("py_1", Some("acct_9")).as_deref(),
            Some("https://dashboard.stripe.com/acct_9/payments/py_1")
        );
        assert_eq!(
            dashboard_url("tr_1", None).as_deref(),
            Some("https://dashboard.stripe.com/connect/transfers/tr_1")
        );
        assert_eq!(dashboard_url("txn_1", Some("acct_9")), None);
        assert_eq!(dashboard_url("unknown", Some("acct_9")), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(" F/2024:001.pdf "), "F_2024_001.pdf");
        assert_eq!(sanitize_filename("..avoir.."), "avoir");
    }

    #[test]
    fn test_customer_display_name_without_customer() {
        assert_eq!(customer_display_name(None), "");
    }
}
