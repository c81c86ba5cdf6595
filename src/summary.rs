//! Running-balance and discrepancy arithmetic for a period ledger
//!
//! [`compute`] is a pure function of the period's current fields; it never
//! mutates anything. All figures are rounded to two decimal places for
//! display and comparison.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Suggested adjustment total for one classified category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: BigDecimal,
}

/// One display-ready line of the reconciliation working paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingPaperLine {
    pub concept: String,
    pub amount: BigDecimal,
}

/// Full reconciliation picture of a period, suitable for tabular rendering,
/// export, and the closing decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub period_key: PeriodKey,
    pub opening_book: BigDecimal,
    pub opening_bank: BigDecimal,
    /// Net movement over all original entries per side, matched and pending
    /// alike
    pub movements_book: BigDecimal,
    pub movements_bank: BigDecimal,
    /// Opening plus movements
    pub theoretical_closing_book: BigDecimal,
    pub theoretical_closing_bank: BigDecimal,
    /// Reported closing minus theoretical closing; a nonzero value signals
    /// an incomplete import or a data-entry error, independent of matching
    pub integrity_discrepancy_book: BigDecimal,
    pub integrity_discrepancy_bank: BigDecimal,
    pub reported_closing_book: BigDecimal,
    pub reported_closing_bank: BigDecimal,
    /// Reported closing book corrected by the caller-set flags
    pub book_adjusted: BigDecimal,
    /// Adjusted book balance net of the still-outstanding entries
    pub book_theoretical: BigDecimal,
    /// Book-vs-bank gap after all adjustments; must be zero to close
    pub final_difference: BigDecimal,
    /// Still-pending entries per side, in row order
    pub pending_book: Vec<LedgerEntry>,
    pub pending_bank: Vec<LedgerEntry>,
    pub matched: Vec<MatchGroup>,
    pub matched_pairs: Vec<MatchedPair>,
    /// Classified, still-pending bank entries grouped by category
    pub suggested_adjustments: Vec<CategoryTotal>,
}

impl ReconciliationSummary {
    /// Whether the period may close
    pub fn can_close(&self) -> bool {
        self.final_difference == BigDecimal::from(0)
    }

    /// The working-paper lines in presentation order
    pub fn working_paper(&self) -> Vec<WorkingPaperLine> {
        let line = |concept: &str, amount: &BigDecimal| WorkingPaperLine {
            concept: concept.to_string(),
            amount: round2(amount),
        };
        vec![
            line("Opening bank balance", &self.opening_bank),
            line("(+) Statement movements", &self.movements_bank),
            line("Bank integrity discrepancy", &self.integrity_discrepancy_bank),
            line("Reported closing bank balance", &self.reported_closing_bank),
            line("Opening book balance", &self.opening_book),
            line("(+) Book movements", &self.movements_book),
            line("Book integrity discrepancy", &self.integrity_discrepancy_book),
            line("Reported closing book balance", &self.reported_closing_book),
            line("Adjusted book balance", &self.book_adjusted),
            line("Theoretical book balance", &self.book_theoretical),
            line("Final reconciliation difference", &self.final_difference),
        ]
    }
}

fn sum<'a, I: Iterator<Item = &'a LedgerEntry>>(entries: I) -> BigDecimal {
    entries.fold(BigDecimal::from(0), |acc, e| acc + &e.net_amount)
}

/// Compute the reconciliation summary for a period's current state
pub fn compute(period: &PeriodLedger) -> ReconciliationSummary {
    let movements_book = sum(period.book_entries.iter());
    let movements_bank = sum(period.bank_entries.iter());

    let theoretical_closing_book = &period.opening_book + &movements_book;
    let theoretical_closing_bank = &period.opening_bank + &movements_bank;

    let integrity_discrepancy_book =
        round2(&(&period.reported_closing_book - &theoretical_closing_book));
    let integrity_discrepancy_bank =
        round2(&(&period.reported_closing_bank - &theoretical_closing_bank));

    let voided_book = sum(
        period
            .book_entries
            .iter()
            .filter(|e| e.user_flag == Some(UserFlag::VoidInError)),
    );
    let adjust_bank = sum(
        period
            .bank_entries
            .iter()
            .filter(|e| e.user_flag == Some(UserFlag::AdjustInBooks)),
    );
    let book_adjusted = &period.reported_closing_book - voided_book + adjust_bank;

    let outstanding_book = sum(period.book_entries.iter().filter(|e| e.is_outstanding()));
    let outstanding_bank = sum(period.bank_entries.iter().filter(|e| e.is_outstanding()));
    let book_theoretical = &book_adjusted - outstanding_book + outstanding_bank;

    let final_difference = round2(&(&book_theoretical - &period.reported_closing_bank));

    let mut suggested_adjustments: Vec<CategoryTotal> = Vec::new();
    for entry in period.pending(Side::Bank) {
        if let Some(ref category) = entry.category {
            match suggested_adjustments
                .iter_mut()
                .find(|t| &t.category == category)
            {
                Some(total) => total.total += &entry.net_amount,
                None => suggested_adjustments.push(CategoryTotal {
                    category: category.clone(),
                    total: entry.net_amount.clone(),
                }),
            }
        }
    }

    ReconciliationSummary {
        period_key: period.period_key,
        opening_book: period.opening_book.clone(),
        opening_bank: period.opening_bank.clone(),
        movements_book,
        movements_bank,
        theoretical_closing_book,
        theoretical_closing_bank,
        integrity_discrepancy_book,
        integrity_discrepancy_bank,
        reported_closing_book: period.reported_closing_book.clone(),
        reported_closing_bank: period.reported_closing_bank.clone(),
        book_adjusted,
        book_theoretical,
        final_difference,
        pending_book: period.pending(Side::Book).cloned().collect(),
        pending_bank: period.pending(Side::Bank).cloned().collect(),
        matched: period.matched.clone(),
        matched_pairs: period.matched_pairs.clone(),
        suggested_adjustments,
    }
}
