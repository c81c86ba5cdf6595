//! Core types and data structures for the reconciliation system

use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which ledger a transaction line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Internal accounting book (the general ledger / "mayor")
    Book,
    /// External bank statement
    Bank,
}

impl Side {
    /// Returns the opposite ledger side
    pub fn other(&self) -> Side {
        match self {
            Side::Book => Side::Bank,
            Side::Bank => Side::Book,
        }
    }
}

/// Matching status of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Not yet part of any match group
    Pending,
    /// Paired one-to-one by the automatic matcher
    MatchedAuto,
    /// Grouped by a caller-directed manual match
    MatchedManual,
}

/// Caller-set annotation that resolves an entry without deleting it
///
/// Flagged entries are excluded from the "still outstanding" totals and do
/// not survive the carry-forward into the next period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserFlag {
    /// Book entry recorded in error and voided
    VoidInError,
    /// Bank entry to be adjusted into the books
    AdjustInBooks,
}

impl UserFlag {
    /// The ledger side this flag applies to
    pub fn applies_to(&self) -> Side {
        match self {
            UserFlag::VoidInError => Side::Book,
            UserFlag::AdjustInBooks => Side::Bank,
        }
    }
}

/// One transaction line from either ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for the entry
    pub id: Uuid,
    /// Position in the original input sequence, used for deterministic
    /// tie-breaking during automatic matching
    pub row_order: usize,
    /// Calendar date of the movement (time of day is irrelevant)
    pub date: NaiveDate,
    /// Free-text description from the source document
    pub description: String,
    /// Signed net value; positive increases the balance
    pub net_amount: BigDecimal,
    /// Which ledger the entry came from
    pub side: Side,
    /// Current matching status
    pub status: EntryStatus,
    /// The match group this entry belongs to, if any
    pub match_group_id: Option<Uuid>,
    /// True when the classifier assigned a known category; disqualified
    /// entries never participate in automatic matching
    pub disqualified: bool,
    /// Category assigned at import time, if any
    pub category: Option<String>,
    /// Caller-set resolution flag, if any
    pub user_flag: Option<UserFlag>,
}

impl LedgerEntry {
    /// Create a new pending entry
    pub fn new(
        side: Side,
        row_order: usize,
        date: NaiveDate,
        description: String,
        net_amount: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            row_order,
            date,
            description,
            net_amount,
            side,
            status: EntryStatus::Pending,
            match_group_id: None,
            disqualified: false,
            category: None,
            user_flag: None,
        }
    }

    /// Whether the entry is still awaiting a match
    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    /// Whether the entry still counts toward the outstanding totals
    ///
    /// Pending and unflagged; flagged entries are considered resolved.
    pub fn is_outstanding(&self) -> bool {
        self.is_pending() && self.user_flag.is_none()
    }
}

/// How a match group was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// One-to-one pairing by exact amount within the date tolerance
    Auto,
    /// Caller-directed many-to-many grouping with equal sums
    Manual,
    /// Adjustment absorbed into the other ledger's balance
    BookAdjustment,
}

/// Records that one or more book entries correspond to one or more bank
/// entries
///
/// Membership is immutable once the group is created; an entry belongs to at
/// most one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    /// Unique identifier for the group
    pub id: Uuid,
    /// Member entries on the book side
    pub book_entry_ids: Vec<Uuid>,
    /// Member entries on the bank side
    pub bank_entry_ids: Vec<Uuid>,
    /// Sum of the book members' net amounts at creation time
    pub sum_book: BigDecimal,
    /// Sum of the bank members' net amounts at creation time
    pub sum_bank: BigDecimal,
    /// How the group was produced
    pub kind: MatchKind,
}

impl MatchGroup {
    /// Create a one-to-one automatic group
    pub fn auto(book_id: Uuid, bank_id: Uuid, amount: BigDecimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_entry_ids: vec![book_id],
            bank_entry_ids: vec![bank_id],
            sum_book: amount.clone(),
            sum_bank: amount,
            kind: MatchKind::Auto,
        }
    }

    /// Create a manual group from validated selections
    pub fn manual(
        book_entry_ids: Vec<Uuid>,
        bank_entry_ids: Vec<Uuid>,
        sum_book: BigDecimal,
        sum_bank: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_entry_ids,
            bank_entry_ids,
            sum_book,
            sum_bank,
            kind: MatchKind::Manual,
        }
    }

    /// Short reference for audit annotations
    pub fn reference(&self) -> String {
        let hex = self.id.simple().to_string();
        format!("G-{}", &hex[..8])
    }
}

/// Human-auditable record of one matched correspondence
///
/// Auto matches emit one pair per group; manual matches emit a synthetic
/// pair per book member, annotated with the group reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Group this pair belongs to
    pub group_id: Uuid,
    /// Date of the book entry
    pub book_date: NaiveDate,
    /// Description of the book entry
    pub book_description: String,
    /// Matched amount
    pub amount: BigDecimal,
    /// Date of the bank counterpart; absent for synthetic manual records
    pub bank_date: Option<NaiveDate>,
    /// Description of the bank counterpart or the group annotation
    pub bank_description: String,
}

/// Calendar period identifier (month within a year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    /// Create a period key; months outside 1..=12 are rejected
    pub fn new(year: i32, month: u32) -> ReconcileResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ReconcileError::Validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The period a calendar date falls into
    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The immediately following calendar period
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Lifecycle state of a period ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodState {
    /// Accepting imports, matches, and flags
    Open,
    /// Reconciled to a zero final difference; terminal
    Closed,
}

/// The unit of reconciliation work for one calendar period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodLedger {
    /// Which calendar period this ledger covers
    pub period_key: PeriodKey,
    /// Lifecycle state
    pub state: PeriodState,
    /// Book balance carried from the prior close (or bootstrap)
    pub opening_book: BigDecimal,
    /// Bank balance carried from the prior close (or bootstrap)
    pub opening_bank: BigDecimal,
    /// Caller-supplied closing book balance from the source document
    pub reported_closing_book: BigDecimal,
    /// Caller-supplied closing bank balance from the source document
    pub reported_closing_bank: BigDecimal,
    /// True when the period operates without a book ledger: zero book
    /// opening, no inherited book pendings, book imports rejected
    pub without_book: bool,
    /// All book entries of the period, inherited and imported alike
    pub book_entries: Vec<LedgerEntry>,
    /// All bank entries of the period, inherited and imported alike
    pub bank_entries: Vec<LedgerEntry>,
    /// Match groups created during the period
    pub matched: Vec<MatchGroup>,
    /// Audit trail of matched correspondences
    pub matched_pairs: Vec<MatchedPair>,
}

impl PeriodLedger {
    /// All entries on one side, in row order
    pub fn entries(&self, side: Side) -> &[LedgerEntry] {
        match side {
            Side::Book => &self.book_entries,
            Side::Bank => &self.bank_entries,
        }
    }

    pub(crate) fn entries_mut(&mut self, side: Side) -> &mut Vec<LedgerEntry> {
        match side {
            Side::Book => &mut self.book_entries,
            Side::Bank => &mut self.bank_entries,
        }
    }

    /// Still-pending entries on one side, in row order
    pub fn pending(&self, side: Side) -> impl Iterator<Item = &LedgerEntry> {
        self.entries(side).iter().filter(|e| e.is_pending())
    }

    /// Append an entry to its side, assigning the next row order
    pub(crate) fn push_entry(&mut self, mut entry: LedgerEntry) {
        let entries = self.entries_mut(entry.side);
        entry.row_order = entries.len();
        entries.push(entry);
    }

    /// Look up an entry by id on either side
    pub fn entry(&self, id: Uuid) -> Option<&LedgerEntry> {
        self.book_entries
            .iter()
            .chain(self.bank_entries.iter())
            .find(|e| e.id == id)
    }

    pub(crate) fn entry_mut(&mut self, id: Uuid) -> Option<&mut LedgerEntry> {
        self.book_entries
            .iter_mut()
            .chain(self.bank_entries.iter_mut())
            .find(|e| e.id == id)
    }
}

/// Round a currency value to two decimal places, half away from zero
pub fn round2(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Comparison epsilon for manual-match sum agreement (0.01 currency unit)
pub fn matching_epsilon() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Errors that can occur in the reconciliation system
///
/// A rejected operation returns one of these and leaves state unchanged;
/// normalization failures are data (zero amounts, skipped rows), not errors.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Tenant has not been bootstrapped")]
    NotBootstrapped,
    #[error("Tenant has already been bootstrapped")]
    AlreadyBootstrapped,
    #[error("No period is currently open")]
    NoOpenPeriod,
    #[error("Period {0} is already open")]
    PeriodAlreadyOpen(PeriodKey),
    #[error("Period {requested} is out of sequence; expected {expected}")]
    PeriodOutOfSequence {
        requested: PeriodKey,
        expected: PeriodKey,
    },
    #[error("Period {requested} predates the bootstrap period {bootstrap}")]
    PeriodBeforeBootstrap {
        requested: PeriodKey,
        bootstrap: PeriodKey,
    },
    #[error("Rows are missing the mapped field '{0}'")]
    MissingField(String),
    #[error("Import contains no rows")]
    EmptyImport,
    #[error("Book imports are disabled for this period")]
    BookImportDisabled,
    #[error("Manual match requires at least one selected entry")]
    EmptySelection,
    #[error("Entry {0} does not exist in the open period")]
    UnknownEntry(Uuid),
    #[error("Entry {0} is not pending")]
    EntryNotPending(Uuid),
    #[error("Entry {0} is flagged and cannot be matched")]
    EntryFlagged(Uuid),
    #[error("Selected sums disagree: book {sum_book}, bank {sum_bank}, difference {difference}")]
    UnbalancedSelection {
        sum_book: BigDecimal,
        sum_bank: BigDecimal,
        difference: BigDecimal,
    },
    #[error("Cannot close: final difference is {final_difference}, not zero")]
    ClosingBlocked { final_difference: BigDecimal },
    #[error("Flag {flag:?} does not apply to {side:?} entries")]
    FlagSideMismatch { flag: UserFlag, side: Side },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
