//! Billing cycles and renewal-date arithmetic

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

/// Sentinel renewal date for subscriptions that never bill again
pub const NEVER_BILLS: NaiveDate = NaiveDate::MAX;

/// How often a subscription bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingCycle {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    SemiAnnually,
    Yearly,
    /// One-off purchase; never renews
    Lifetime,
}

impl BillingCycle {
    /// Conversion factor from one payment at this cycle to a per-month cost
    pub fn monthly_factor(&self) -> Decimal {
        match self {
            BillingCycle::Daily => dec!(30),
            BillingCycle::Weekly => dec!(4.33),
            BillingCycle::Biweekly => dec!(2.17),
            BillingCycle::Monthly => dec!(1),
            BillingCycle::Quarterly => dec!(1) / dec!(3),
            BillingCycle::SemiAnnually => dec!(1) / dec!(6),
            BillingCycle::Yearly => dec!(1) / dec!(12),
            BillingCycle::Lifetime => dec!(0),
        }
    }

    /// Normalizes one payment at this cycle to a per-month cost, rounded to
    /// the currency's decimal places. `Lifetime` normalizes to zero.
    pub fn monthly_equivalent(&self, price: Money) -> Money {
        price.multiply(self.monthly_factor()).round_to_currency()
    }

    /// The next billing date after `from`.
    ///
    /// Month- and year-based cycles clamp to the last day of the target
    /// month when the source day does not exist there: Jan 31 + monthly is
    /// Feb 29 in a leap year (Feb 28 otherwise), and Feb 29 + yearly is
    /// Feb 28. Clamping is sticky across repeated advances: a subscription
    /// billed on the 31st renews on month-end from then on. `Lifetime`
    /// returns [`NEVER_BILLS`] instead of advancing.
    pub fn next_billing_date(&self, from: NaiveDate) -> NaiveDate {
        match self {
            BillingCycle::Daily => from + Duration::days(1),
            BillingCycle::Weekly => from + Duration::days(7),
            BillingCycle::Biweekly => from + Duration::days(14),
            BillingCycle::Monthly => add_months_clamped(from, 1),
            BillingCycle::Quarterly => add_months_clamped(from, 3),
            BillingCycle::SemiAnnually => add_months_clamped(from, 6),
            BillingCycle::Yearly => add_months_clamped(from, 12),
            BillingCycle::Lifetime => NEVER_BILLS,
        }
    }
}

/// Adds calendar months, clamping the day to the end of the target month
fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.month0() + months;
    let year = date.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;

    NaiveDate::from_ymd_opt(year, month, date.day())
        .or_else(|| last_day_of_month(year, month))
        // Only reachable at the extreme edge of the calendar range
        .unwrap_or(date)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_factor_table() {
        assert_eq!(BillingCycle::Daily.monthly_factor(), dec!(30));
        assert_eq!(BillingCycle::Weekly.monthly_factor(), dec!(4.33));
        assert_eq!(BillingCycle::Biweekly.monthly_factor(), dec!(2.17));
        assert_eq!(BillingCycle::Monthly.monthly_factor(), dec!(1));
        assert_eq!(BillingCycle::Lifetime.monthly_factor(), dec!(0));
    }

    #[test]
    fn monthly_equivalents_round_to_currency() {
        let price = Money::new(dec!(120.00), Currency::USD);

        assert_eq!(
            BillingCycle::Yearly.monthly_equivalent(price).amount(),
            dec!(10.00)
        );
        assert_eq!(
            BillingCycle::Quarterly.monthly_equivalent(price).amount(),
            dec!(40.00)
        );
        assert_eq!(
            BillingCycle::Weekly.monthly_equivalent(price).amount(),
            dec!(519.60)
        );
        assert!(BillingCycle::Lifetime.monthly_equivalent(price).is_zero());
    }

    #[test]
    fn non_terminating_division_rounds() {
        let price = Money::new(dec!(10.00), Currency::USD);
        assert_eq!(
            BillingCycle::Yearly.monthly_equivalent(price).amount(),
            dec!(0.83)
        );
    }

    #[test]
    fn day_based_cycles_advance_by_fixed_offsets() {
        let from = date(2024, 3, 10);
        assert_eq!(
            BillingCycle::Daily.next_billing_date(from),
            date(2024, 3, 11)
        );
        assert_eq!(
            BillingCycle::Weekly.next_billing_date(from),
            date(2024, 3, 17)
        );
        assert_eq!(
            BillingCycle::Biweekly.next_billing_date(from),
            date(2024, 3, 24)
        );
    }

    #[test]
    fn monthly_clamps_to_leap_february() {
        assert_eq!(
            BillingCycle::Monthly.next_billing_date(date(2024, 1, 31)),
            date(2024, 2, 29)
        );
        assert_eq!(
            BillingCycle::Monthly.next_billing_date(date(2023, 1, 31)),
            date(2023, 2, 28)
        );
    }

    #[test]
    fn monthly_crosses_year_boundary() {
        assert_eq!(
            BillingCycle::Monthly.next_billing_date(date(2024, 12, 31)),
            date(2025, 1, 31)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            BillingCycle::Yearly.next_billing_date(date(2024, 2, 29)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn quarterly_and_semiannual_advance_whole_months() {
        assert_eq!(
            BillingCycle::Quarterly.next_billing_date(date(2024, 11, 30)),
            date(2025, 2, 28)
        );
        assert_eq!(
            BillingCycle::SemiAnnually.next_billing_date(date(2024, 8, 31)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn lifetime_never_bills() {
        assert_eq!(
            BillingCycle::Lifetime.next_billing_date(date(2024, 1, 1)),
            NEVER_BILLS
        );
    }

    #[test]
    fn clamping_is_sticky_across_advances() {
        let mut next = date(2024, 1, 31);
        next = BillingCycle::Monthly.next_billing_date(next); // Feb 29
        next = BillingCycle::Monthly.next_billing_date(next); // Mar 29
        assert_eq!(next, date(2024, 3, 29));
    }
}
