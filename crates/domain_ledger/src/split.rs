//! Split Strategy Resolver
//!
//! Given a total, a participant list, and a split method, computes each
//! participant's share. The five strategies all funnel through integer
//! minor-unit math, so the returned shares sum to the total exactly, with
//! rounding remainders handed out one minor unit at a time to the leading
//! participants in input order.
//!
//! `SplitMethod` is a tagged enum with per-method parameters resolved in one
//! exhaustive match, which keeps the remainder logic in a single place
//! instead of duplicated per strategy.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use core_kernel::{Money, PersonId};

use crate::error::LedgerError;

/// Tolerance for the percentage-sum check (±0.01 of 100)
const PERCENTAGE_TOLERANCE: Decimal = dec!(0.01);

/// One participant's computed share of an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Who owes this share
    pub person_id: PersonId,
    /// How much of the total they owe
    pub amount: Money,
}

/// How a bill is divided among its participants
///
/// Per-participant parameter lists run parallel to the participant list
/// passed to [`resolve_shares`], in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SplitMethod {
    /// Everyone pays the same share
    Equally,
    /// Caller supplies a fixed amount per participant; must sum to the total
    ExactAmounts(Vec<Money>),
    /// Caller supplies a percentage per participant; must sum to 100 (±0.01)
    Percentages(Vec<Decimal>),
    /// Ratio-based: integer weight per participant
    Shares(Vec<u32>),
    /// Equal split plus signed per-participant deltas that sum to zero
    Adjustments(Vec<Money>),
}

/// The parameter-free tag of a split method, stored on recorded expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitKind {
    Equally,
    ExactAmounts,
    Percentages,
    Shares,
    Adjustments,
}

impl SplitMethod {
    /// Returns the tag for this method
    pub fn kind(&self) -> SplitKind {
        match self {
            SplitMethod::Equally => SplitKind::Equally,
            SplitMethod::ExactAmounts(_) => SplitKind::ExactAmounts,
            SplitMethod::Percentages(_) => SplitKind::Percentages,
            SplitMethod::Shares(_) => SplitKind::Shares,
            SplitMethod::Adjustments(_) => SplitKind::Adjustments,
        }
    }
}

/// Computes each participant's share of `total` under the given method.
///
/// The returned shares are in participant order and always sum to `total`
/// exactly. A single participant receives the full total under every method.
///
/// # Errors
///
/// - [`LedgerError::InvalidParticipantSet`]: empty or duplicated
///   participants, parameter list of the wrong length, or zero total weight
/// - [`LedgerError::InvalidExpenseAmount`]: non-positive total
/// - [`LedgerError::ShareMismatch`]: exact amounts that don't sum to the total
/// - [`LedgerError::PercentageMismatch`]: percentages that don't sum to 100
/// - [`LedgerError::AdjustmentImbalance`]: adjustment deltas that don't
///   sum to zero
pub fn resolve_shares(
    total: Money,
    participants: &[PersonId],
    method: &SplitMethod,
) -> Result<Vec<Share>, LedgerError> {
    if participants.is_empty() {
        return Err(LedgerError::InvalidParticipantSet(
            "at least one participant is required".to_string(),
        ));
    }

    let unique: HashSet<_> = participants.iter().collect();
    if unique.len() != participants.len() {
        return Err(LedgerError::InvalidParticipantSet(
            "participants must be unique".to_string(),
        ));
    }

    if !total.is_positive() {
        return Err(LedgerError::InvalidExpenseAmount(format!(
            "expense total must be positive, got {}",
            total.amount()
        )));
    }

    let amounts = match method {
        SplitMethod::Equally => equal_split(total, participants.len())?,
        SplitMethod::ExactAmounts(amounts) => exact_amounts(total, participants, amounts)?,
        SplitMethod::Percentages(percentages) => {
            percentage_split(total, participants, percentages)?
        }
        SplitMethod::Shares(weights) => weighted_split(total, participants, weights)?,
        SplitMethod::Adjustments(deltas) => adjusted_split(total, participants, deltas)?,
    };

    debug_assert_eq!(
        amounts.iter().fold(Decimal::ZERO, |acc, m| acc + m.amount()),
        total.amount()
    );

    Ok(participants
        .iter()
        .zip(amounts)
        .map(|(person_id, amount)| Share {
            person_id: *person_id,
            amount,
        })
        .collect())
}

fn equal_split(total: Money, count: usize) -> Result<Vec<Money>, LedgerError> {
    Ok(total.split_even(count as u32)?)
}

fn exact_amounts(
    total: Money,
    participants: &[PersonId],
    amounts: &[Money],
) -> Result<Vec<Money>, LedgerError> {
    check_parallel(participants, amounts.len(), "exact amounts")?;

    let mut sum = Money::zero(total.currency());
    for amount in amounts {
        sum = sum.checked_add(amount)?;
    }

    if sum.minor_units() != total.minor_units() {
        return Err(LedgerError::ShareMismatch {
            expected: total.amount(),
            actual: sum.amount(),
        });
    }

    Ok(amounts.to_vec())
}

fn percentage_split(
    total: Money,
    participants: &[PersonId],
    percentages: &[Decimal],
) -> Result<Vec<Money>, LedgerError> {
    check_parallel(participants, percentages.len(), "percentages")?;

    let pct_sum: Decimal = percentages.iter().sum();
    if (pct_sum - dec!(100)).abs() > PERCENTAGE_TOLERANCE {
        return Err(LedgerError::PercentageMismatch { total: pct_sum });
    }

    let total_minor = total.minor_units();
    let total_dec = Decimal::from_i128_with_scale(total_minor, 0);

    // Floor each raw share, then hand the leftover minor units to the
    // leading participants, same as the equal split does.
    let mut bases: Vec<i128> = Vec::with_capacity(percentages.len());
    for pct in percentages {
        let raw = total_dec * pct / dec!(100);
        let base = raw.floor().to_i128().ok_or_else(|| {
            LedgerError::InvalidExpenseAmount(format!("share overflow for {}%", pct))
        })?;
        bases.push(base);
    }

    distribute_remainder(&mut bases, total_minor);

    Ok(bases
        .into_iter()
        .map(|minor| Money::from_minor(minor, total.currency()))
        .collect())
}

fn weighted_split(
    total: Money,
    participants: &[PersonId],
    weights: &[u32],
) -> Result<Vec<Money>, LedgerError> {
    check_parallel(participants, weights.len(), "share weights")?;

    let weight_sum: i128 = weights.iter().map(|w| *w as i128).sum();
    if weight_sum == 0 {
        return Err(LedgerError::InvalidParticipantSet(
            "share weights must not all be zero".to_string(),
        ));
    }

    let total_minor = total.minor_units();
    let mut bases: Vec<i128> = weights
        .iter()
        .map(|w| total_minor * *w as i128 / weight_sum)
        .collect();

    distribute_remainder(&mut bases, total_minor);

    Ok(bases
        .into_iter()
        .map(|minor| Money::from_minor(minor, total.currency()))
        .collect())
}

fn adjusted_split(
    total: Money,
    participants: &[PersonId],
    deltas: &[Money],
) -> Result<Vec<Money>, LedgerError> {
    check_parallel(participants, deltas.len(), "adjustments")?;

    let mut net = Money::zero(total.currency());
    for delta in deltas {
        net = net.checked_add(delta)?;
    }

    if net.minor_units() != 0 {
        return Err(LedgerError::AdjustmentImbalance {
            net: net.amount(),
        });
    }

    let base = total.split_even(participants.len() as u32)?;
    base.iter()
        .zip(deltas)
        .map(|(share, delta)| Ok(share.checked_add(delta)?))
        .collect()
}

/// Spreads `total - sum(bases)` over the entries one minor unit at a time.
///
/// A surplus goes to the leading entries in order, wrapping around when the
/// percentage tolerance leaves more leftover minor units than participants.
/// A deficit (percentage sums just above 100) is clawed back from the
/// largest share each time, so no allocation is ever pushed negative.
fn distribute_remainder(bases: &mut [i128], total_minor: i128) {
    let allocated: i128 = bases.iter().sum();
    let mut remainder = total_minor - allocated;

    let mut i = 0;
    while remainder > 0 {
        bases[i] += 1;
        remainder -= 1;
        i = (i + 1) % bases.len();
    }

    while remainder < 0 {
        let largest = bases
            .iter()
            .enumerate()
            .max_by_key(|(_, base)| **base)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        bases[largest] -= 1;
        remainder += 1;
    }
}

fn check_parallel(
    participants: &[PersonId],
    supplied: usize,
    what: &str,
) -> Result<(), LedgerError> {
    if supplied != participants.len() {
        return Err(LedgerError::InvalidParticipantSet(format!(
            "{} participants but {} {}",
            participants.len(),
            supplied,
            what
        )));
    }
    Ok(())
}
