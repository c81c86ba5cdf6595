//! # Reconciliation Core
//!
//! A bank reconciliation engine that matches an internal accounting book
//! against an external bank statement across successive accounting periods.
//!
//! ## Features
//!
//! - **Amount normalization**: locale-ambiguous numeric text and
//!   debit/credit column pairs collapse into single signed net values
//! - **Automatic matching**: one-to-one pairing by exact amount within a
//!   configurable date tolerance
//! - **Manual matching**: caller-directed many-to-many grouping validated
//!   by equal sums
//! - **Balance tracking**: integrity discrepancies, adjusted balances, and
//!   the final difference that gates period closing
//! - **Period lifecycle**: one open period at a time, sequential closing,
//!   carry-forward of unresolved entries and balances
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   per-tenant storage
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{MemoryStorage, Reconciler};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # async fn example() -> reconciliation_core::ReconcileResult<()> {
//! let storage = MemoryStorage::new();
//! let mut reconciler = Reconciler::new(storage, "acme");
//! reconciler
//!     .bootstrap(
//!         BigDecimal::from(1000),
//!         BigDecimal::from(1000),
//!         NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod matching;
pub mod normalize;
pub mod period;
pub mod summary;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use classify::{CategoryRule, CategoryRules};
pub use matching::*;
pub use normalize::{FieldMapping, ImportOutcome, RawRow, RawValue};
pub use period::*;
pub use summary::{CategoryTotal, ReconciliationSummary, WorkingPaperLine};
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;
