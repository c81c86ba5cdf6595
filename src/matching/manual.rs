//! Caller-directed many-to-many matching of remaining pending entries

use bigdecimal::BigDecimal;
use tracing::info;
use uuid::Uuid;

use crate::types::*;

/// Group arbitrary pending entries from both sides into a match when their
/// sums agree within epsilon
///
/// Every selected id must refer to a pending, unflagged entry on its side.
/// A selection drawn entirely from one side is permitted when its sum nets
/// to zero; it is recorded as a manual group with an empty counterpart side,
/// distinct from a genuine cross-ledger match.
///
/// On rejection nothing changes; the error carries the computed sums and
/// difference for display.
pub fn manual_match(
    period: &mut PeriodLedger,
    book_ids: &[Uuid],
    bank_ids: &[Uuid],
) -> ReconcileResult<MatchGroup> {
    if book_ids.is_empty() && bank_ids.is_empty() {
        return Err(ReconcileError::EmptySelection);
    }

    let sum_book = validate_selection(period, Side::Book, book_ids)?;
    let sum_bank = validate_selection(period, Side::Bank, bank_ids)?;

    let difference = &sum_book - &sum_bank;
    if difference.abs() >= matching_epsilon() {
        return Err(ReconcileError::UnbalancedSelection {
            sum_book,
            sum_bank,
            difference,
        });
    }

    let group = MatchGroup::manual(
        book_ids.to_vec(),
        bank_ids.to_vec(),
        sum_book,
        sum_bank,
    );
    let annotation = group.reference();

    for id in bank_ids {
        if let Some(entry) = period.entry_mut(*id) {
            entry.status = EntryStatus::MatchedManual;
            entry.match_group_id = Some(group.id);
        }
    }
    for id in book_ids {
        let pair = match period.entry_mut(*id) {
            Some(entry) => {
                entry.status = EntryStatus::MatchedManual;
                entry.match_group_id = Some(group.id);
                MatchedPair {
                    group_id: group.id,
                    book_date: entry.date,
                    book_description: format!("{} [{}]", entry.description, annotation),
                    amount: entry.net_amount.clone(),
                    bank_date: None,
                    bank_description: format!(
                        "Manual group {} ({} bank entries)",
                        annotation,
                        bank_ids.len()
                    ),
                }
            }
            None => continue,
        };
        period.matched_pairs.push(pair);
    }

    info!(
        period = %period.period_key,
        group = %annotation,
        book = book_ids.len(),
        bank = bank_ids.len(),
        "manual match created"
    );
    period.matched.push(group.clone());
    Ok(group)
}

/// Validate one side's selection and return its sum; state is untouched
fn validate_selection(
    period: &PeriodLedger,
    side: Side,
    ids: &[Uuid],
) -> ReconcileResult<BigDecimal> {
    let mut seen = std::collections::HashSet::new();
    let mut sum = BigDecimal::from(0);
    for id in ids {
        if !seen.insert(*id) {
            return Err(ReconcileError::Validation(format!(
                "entry {} selected more than once",
                id
            )));
        }
        let entry = period
            .entries(side)
            .iter()
            .find(|e| e.id == *id)
            .ok_or(ReconcileError::UnknownEntry(*id))?;
        if !entry.is_pending() {
            return Err(ReconcileError::EntryNotPending(*id));
        }
        if entry.user_flag.is_some() {
            return Err(ReconcileError::EntryFlagged(*id));
        }
        sum += &entry.net_amount;
    }
    Ok(sum)
}
