//! tally-insights: derived analysis over the canonical ledger,
//! covering subscription detection and month-over-baseline anomalies.

pub mod anomalies;
pub mod subscriptions;

pub use anomalies::{Indicator, Insight, InsightKind, compute_insights};
pub use subscriptions::{Cadence, SubscriptionCandidate, detect_subscriptions};
