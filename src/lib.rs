//! # Payout Reconcile
//!
//! Reconciles a payment processor payout with the charges, invoices, refunds,
//! disputes, credit notes and fees that explain its amount, and builds
//! French-accounting-ready export records.
//!
//! ## Features
//!
//! - **Entity resolution**: prefix-dispatched lookups with a four-step invoice discovery chain
//! - **Deduplication**: each entity is fetched and listed once per payout, in discovery order
//! - **Classification**: ledger entries aggregated into payments, refunds, fees, disputes, payment failures and other
//! - **Export records**: deterministic summary and rows with French labels and dashboard links
//! - **Batch runs**: date-range reconciliation that skips failing payouts
//! - **Artifact download**: bounded concurrent download of invoice and credit-note PDFs
//! - **Storage abstraction**: the upstream API is a trait, with an in-memory implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use payout_reconcile::{utils::MemoryApi, ReconciliationEngine};
//!
//! # async fn run() -> payout_reconcile::ReconcileResult<()> {
//! // Any PaymentsApi implementation works; MemoryApi is handy for tests
//! let engine = ReconciliationEngine::new(MemoryApi::new());
//! // let bundle = engine.reconcile_payout("po_123").await?;
//! # let _ = engine;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod download;
pub mod export;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use crate::config::ExportConfig;
pub use download::*;
pub use export::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
