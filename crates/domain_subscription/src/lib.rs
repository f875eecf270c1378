//! Subscription Domain - recurring billing math
//!
//! Billing cycles, next-renewal dates, and monthly-equivalent costs for the
//! subscription tracker. Pure date and money arithmetic; no shared state.

pub mod billing_cycle;
pub mod error;
pub mod subscription;

pub use billing_cycle::{BillingCycle, NEVER_BILLS};
pub use error::SubscriptionError;
pub use subscription::{total_monthly_cost, Subscription, TrialPeriod};
