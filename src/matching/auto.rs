//! Automatic one-to-one matching by exact amount within a date tolerance

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bigdecimal::BigDecimal;

use crate::types::*;

/// Result of one automatic matching pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoMatchReport {
    /// Pairs created during this pass
    pub matched: usize,
    /// Book entries still pending after the pass
    pub remaining_book: usize,
    /// Bank entries still pending after the pass
    pub remaining_bank: usize,
}

/// Pair unmatched book entries with unmatched, unclassified bank entries of
/// equal amount within the date tolerance, one-to-one
///
/// Book entries are visited in input order; zero-amount entries are skipped
/// since they can never uniquely identify a counterpart. Among qualifying
/// bank candidates the one with the smallest absolute date difference wins,
/// ties broken by earliest original row order. A bank entry is consumed by
/// at most one book entry per pass.
pub fn auto_match(period: &mut PeriodLedger, tolerance_days: u32) -> AutoMatchReport {
    let tolerance = i64::from(tolerance_days);
    let zero = BigDecimal::from(0);
    let mut matched = 0usize;

    for book_index in 0..period.book_entries.len() {
        let (amount, book_date) = {
            let entry = &period.book_entries[book_index];
            if !entry.is_outstanding() || entry.net_amount == zero {
                continue;
            }
            (entry.net_amount.clone(), entry.date)
        };

        let mut best: Option<(usize, i64, usize)> = None;
        for (bank_index, bank) in period.bank_entries.iter().enumerate() {
            if !bank.is_outstanding() || bank.disqualified {
                continue;
            }
            if bank.net_amount != amount {
                continue;
            }
            let date_diff = (bank.date - book_date).num_days().abs();
            if date_diff > tolerance {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_diff, best_order)) => {
                    (date_diff, bank.row_order) < (best_diff, best_order)
                }
            };
            if better {
                best = Some((bank_index, date_diff, bank.row_order));
            }
        }

        if let Some((bank_index, date_diff, _)) = best {
            let group = MatchGroup::auto(
                period.book_entries[book_index].id,
                period.bank_entries[bank_index].id,
                amount.clone(),
            );
            debug!(
                group = %group.reference(),
                amount = %amount,
                date_diff,
                "auto match"
            );

            let pair = {
                let book = &mut period.book_entries[book_index];
                book.status = EntryStatus::MatchedAuto;
                book.match_group_id = Some(group.id);
                MatchedPair {
                    group_id: group.id,
                    book_date: book.date,
                    book_description: book.description.clone(),
                    amount,
                    bank_date: None,
                    bank_description: String::new(),
                }
            };
            let pair = {
                let bank = &mut period.bank_entries[bank_index];
                bank.status = EntryStatus::MatchedAuto;
                bank.match_group_id = Some(group.id);
                MatchedPair {
                    bank_date: Some(bank.date),
                    bank_description: bank.description.clone(),
                    ..pair
                }
            };

            period.matched.push(group);
            period.matched_pairs.push(pair);
            matched += 1;
        }
    }

    let report = AutoMatchReport {
        matched,
        remaining_book: period.pending(Side::Book).count(),
        remaining_bank: period.pending(Side::Bank).count(),
    };
    info!(
        period = %period.period_key,
        matched = report.matched,
        remaining_book = report.remaining_book,
        remaining_bank = report.remaining_bank,
        "automatic matching pass completed"
    );
    report
}
