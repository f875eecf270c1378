//! Subscription records and aggregate costs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, SubscriptionId};

use crate::billing_cycle::BillingCycle;
use crate::error::SubscriptionError;

/// A free-trial window preceding the first charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialPeriod {
    /// First day of the trial
    pub started_on: NaiveDate,
    /// First day after the trial (the first billable day)
    pub ends_on: NaiveDate,
}

impl TrialPeriod {
    /// Creates a trial window; the end must not precede the start
    pub fn new(started_on: NaiveDate, ends_on: NaiveDate) -> Result<Self, SubscriptionError> {
        if ends_on < started_on {
            return Err(SubscriptionError::InvalidTrialWindow {
                started_on,
                ends_on,
            });
        }
        Ok(Self {
            started_on,
            ends_on,
        })
    }

    /// True if the given day falls inside the trial
    pub fn contains(&self, on: NaiveDate) -> bool {
        self.started_on <= on && on < self.ends_on
    }
}

/// A recurring subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Stable identifier
    pub id: SubscriptionId,
    /// Display name ("Music streaming")
    pub name: String,
    /// Price per billing-cycle payment
    pub price: Money,
    /// How often it bills
    pub cycle: BillingCycle,
    /// The next renewal date ([`crate::NEVER_BILLS`] for lifetime purchases)
    pub next_billing_date: NaiveDate,
    /// Optional free-trial window
    pub trial: Option<TrialPeriod>,
}

impl Subscription {
    /// Creates a subscription whose first bill lands on the cycle after
    /// `starts_on`
    pub fn new(
        name: impl Into<String>,
        price: Money,
        cycle: BillingCycle,
        starts_on: NaiveDate,
    ) -> Self {
        Self {
            id: SubscriptionId::new_v7(),
            name: name.into(),
            price,
            cycle,
            next_billing_date: cycle.next_billing_date(starts_on),
            trial: None,
        }
    }

    /// Attaches a trial; billing starts when the trial ends
    pub fn with_trial(mut self, trial: TrialPeriod) -> Self {
        self.next_billing_date = trial.ends_on;
        self.trial = Some(trial);
        self
    }

    /// This subscription's cost normalized to a per-month figure
    pub fn monthly_equivalent(&self) -> Money {
        self.cycle.monthly_equivalent(self.price)
    }

    /// True if the given day is inside the trial window
    pub fn is_in_trial(&self, on: NaiveDate) -> bool {
        self.trial.map(|t| t.contains(on)).unwrap_or(false)
    }

    /// True if a renewal is due on or before the given day
    pub fn is_due(&self, on: NaiveDate) -> bool {
        self.cycle != BillingCycle::Lifetime && self.next_billing_date <= on
    }

    /// Rolls the renewal date forward one cycle (the renewal workflow)
    pub fn advance(&mut self) {
        self.next_billing_date = self.cycle.next_billing_date(self.next_billing_date);
    }
}

/// Total monthly-equivalent cost across subscriptions.
///
/// This is the aggregate the widget/export collaborator reads. Lifetime
/// purchases contribute nothing.
///
/// # Errors
///
/// Fails if any subscription is priced in a different currency.
pub fn total_monthly_cost(
    subscriptions: &[Subscription],
    currency: Currency,
) -> Result<Money, SubscriptionError> {
    let mut total = Money::zero(currency);
    for subscription in subscriptions {
        total = total.checked_add(&subscription.monthly_equivalent())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[test]
    fn first_bill_is_one_cycle_after_start() {
        let sub = Subscription::new("News", usd(dec!(8.00)), BillingCycle::Monthly, date(2024, 1, 15));
        assert_eq!(sub.next_billing_date, date(2024, 2, 15));
    }

    #[test]
    fn trial_defers_first_bill() {
        let trial = TrialPeriod::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let sub = Subscription::new("Video", usd(dec!(12.00)), BillingCycle::Monthly, date(2024, 1, 1))
            .with_trial(trial);

        assert_eq!(sub.next_billing_date, date(2024, 1, 31));
        assert!(sub.is_in_trial(date(2024, 1, 15)));
        assert!(!sub.is_in_trial(date(2024, 1, 31)));
    }

    #[test]
    fn invalid_trial_window_rejected() {
        assert!(matches!(
            TrialPeriod::new(date(2024, 2, 1), date(2024, 1, 1)),
            Err(SubscriptionError::InvalidTrialWindow { .. })
        ));
    }

    #[test]
    fn due_and_advance() {
        let mut sub =
            Subscription::new("Cloud", usd(dec!(2.00)), BillingCycle::Monthly, date(2024, 1, 31));
        assert_eq!(sub.next_billing_date, date(2024, 2, 29));
        assert!(sub.is_due(date(2024, 2, 29)));
        assert!(!sub.is_due(date(2024, 2, 28)));

        sub.advance();
        assert_eq!(sub.next_billing_date, date(2024, 3, 29));
    }

    #[test]
    fn lifetime_is_never_due() {
        let sub = Subscription::new(
            "One-off app",
            usd(dec!(30.00)),
            BillingCycle::Lifetime,
            date(2024, 1, 1),
        );
        assert!(!sub.is_due(date(2099, 1, 1)));
    }

    #[test]
    fn total_monthly_cost_mixes_cycles() {
        let start = date(2024, 1, 1);
        let subs = vec![
            Subscription::new("Music", usd(dec!(9.99)), BillingCycle::Monthly, start),
            Subscription::new("Backup", usd(dec!(120.00)), BillingCycle::Yearly, start),
            Subscription::new("App", usd(dec!(49.00)), BillingCycle::Lifetime, start),
        ];

        let total = total_monthly_cost(&subs, Currency::USD).unwrap();
        assert_eq!(total.amount(), dec!(19.99));
    }

    #[test]
    fn total_monthly_cost_rejects_mixed_currencies() {
        let start = date(2024, 1, 1);
        let subs = vec![
            Subscription::new("Music", usd(dec!(9.99)), BillingCycle::Monthly, start),
            Subscription::new(
                "News",
                Money::new(dec!(5.00), Currency::EUR),
                BillingCycle::Monthly,
                start,
            ),
        ];

        assert!(total_monthly_cost(&subs, Currency::USD).is_err());
    }
}
