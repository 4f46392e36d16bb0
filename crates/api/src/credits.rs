//! Artistic Time: credit costs per premium feature and the wallet that pays
//! for them.

use chrono::{Months, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ServiceError;
use crate::tier::{self, Tier};

/// Premium features paid for with credits instead of a daily quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CreditFeature {
    AiImages,
    VoiceJournaling,
    RelationshipProfiles,
    Meditations,
    MiniStudio,
}

impl CreditFeature {
    pub const ALL: [CreditFeature; 5] = [
        CreditFeature::AiImages,
        CreditFeature::VoiceJournaling,
        CreditFeature::RelationshipProfiles,
        CreditFeature::Meditations,
        CreditFeature::MiniStudio,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::AiImages => "ai_images",
            Self::VoiceJournaling => "voice_journaling",
            Self::RelationshipProfiles => "relationship_profiles",
            Self::Meditations => "meditations",
            Self::MiniStudio => "mini_studio",
        }
    }

    pub fn cost(&self) -> i64 {
        match self {
            Self::AiImages => 5,
            Self::VoiceJournaling => 10,
            Self::RelationshipProfiles => 15,
            Self::Meditations => 8,
            Self::MiniStudio => 20,
        }
    }

    /// Lowest access tier allowed to spend credits on this feature.
    pub fn min_tier(&self) -> Tier {
        match self {
            Self::MiniStudio => Tier::Gold,
            _ => Tier::Silver,
        }
    }

    pub fn allowed_for(&self, access_tier: Tier) -> bool {
        access_tier >= self.min_tier()
    }
}

impl FromStr for CreditFeature {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ServiceError::BadRequest(format!("unknown credit feature: {s}")))
    }
}

impl std::fmt::Display for CreditFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger reasons. Stored as text in `credit_ledger.reason`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReason {
    Spend,
    MonthlyRefresh,
    TrialGrant,
    TrialExpired,
    AdminGrant,
    ReferralBonus,
    PlanChange,
}

impl LedgerReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Spend => "spend",
            Self::MonthlyRefresh => "monthly_refresh",
            Self::TrialGrant => "trial_grant",
            Self::TrialExpired => "trial_expired",
            Self::AdminGrant => "admin_grant",
            Self::ReferralBonus => "referral_bonus",
            Self::PlanChange => "plan_change",
        }
    }
}

impl std::fmt::Display for LedgerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three credit pools a user holds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    pub trial: i64,
    pub monthly: i64,
    pub purchased: i64,
}

/// How a spend was split across the pools.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Spend {
    pub trial: i64,
    pub monthly: i64,
    pub purchased: i64,
}

impl Spend {
    pub fn total(&self) -> i64 {
        self.trial + self.monthly + self.purchased
    }
}

impl Wallet {
    /// Sum of all pools, saturating at `i64::MAX`.
    pub fn total(&self) -> i64 {
        self.trial
            .saturating_add(self.monthly)
            .saturating_add(self.purchased)
    }

    /// Add purchased credits. Fails when the balance would no longer fit in an `i64`.
    pub fn add_purchased(&mut self, amount: i64) -> Result<(), ServiceError> {
        let too_large = || ServiceError::BadRequest("credit balance would overflow".into());
        let purchased = self.purchased.checked_add(amount).ok_or_else(too_large)?;
        self.trial
            .checked_add(self.monthly)
            .and_then(|sum| sum.checked_add(purchased))
            .ok_or_else(too_large)?;
        self.purchased = purchased;
        Ok(())
    }

    /// Spend `cost` credits: trial pool first (it expires soonest), then the
    /// monthly allowance, then purchased credits. Leaves the wallet untouched
    /// on failure.
    pub fn spend(&mut self, cost: i64) -> Result<Spend, ServiceError> {
        if cost < 0 {
            return Err(ServiceError::BadRequest("cost must not be negative".into()));
        }
        if self.total() < cost {
            return Err(ServiceError::PaymentRequired(format!(
                "insufficient credits: need {cost}, have {}",
                self.total()
            )));
        }

        let mut left = cost;
        let mut take = |pool: &mut i64| {
            let n = left.min((*pool).max(0));
            *pool -= n;
            left -= n;
            n
        };
        let spend = Spend {
            trial: take(&mut self.trial),
            monthly: take(&mut self.monthly),
            purchased: take(&mut self.purchased),
        };
        Ok(spend)
    }
}

/// Returns the next reset instant if a monthly refresh is due at `now`.
///
/// Bronze has no allowance and never refreshes. A missing reset date on a
/// paid plan means the allowance was never granted, so it is due now.
pub fn monthly_refresh_due(
    plan: Tier,
    reset_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    if tier::monthly_credits(plan) == 0 {
        return None;
    }
    match reset_at {
        Some(at) if now < at => None,
        Some(at) => Some(advance_past(at, now)),
        None => now.checked_add_months(Months::new(1)),
    }
}

/// Step `at` forward by whole months until it lies strictly after `now`.
fn advance_past(mut at: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    while at <= now {
        match at.checked_add_months(Months::new(1)) {
            Some(next) => at = next,
            None => break,
        }
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_spend_order_trial_monthly_purchased() {
        let mut w = Wallet { trial: 3, monthly: 4, purchased: 10 };
        let spend = w.spend(10).unwrap();
        assert_eq!(spend, Spend { trial: 3, monthly: 4, purchased: 3 });
        assert_eq!(w, Wallet { trial: 0, monthly: 0, purchased: 7 });
        assert_eq!(spend.total(), 10);
    }

    #[test]
    fn test_insufficient_credits_leaves_wallet_untouched() {
        let mut w = Wallet { trial: 0, monthly: 4, purchased: 0 };
        let err = w.spend(5).unwrap_err();
        assert_eq!(err.status_code(), 402);
        assert_eq!(w.total(), 4);
    }

    #[test]
    fn test_exact_balance_reaches_zero() {
        let mut w = Wallet { trial: 0, monthly: 20, purchased: 0 };
        w.spend(CreditFeature::MiniStudio.cost()).unwrap();
        assert_eq!(w.total(), 0);
        assert!(w.spend(1).is_err());
    }

    #[test]
    fn test_add_purchased_rejects_overflowing_balance() {
        let mut w = Wallet { trial: 0, monthly: 200, purchased: 0 };
        let err = w.add_purchased(i64::MAX - 10).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(w, Wallet { trial: 0, monthly: 200, purchased: 0 });

        w.add_purchased(i64::MAX - 200).unwrap();
        assert_eq!(w.total(), i64::MAX);
        assert!(w.add_purchased(1).is_err());
    }

    #[test]
    fn test_total_saturates() {
        let w = Wallet { trial: i64::MAX, monthly: 1, purchased: 1 };
        assert_eq!(w.total(), i64::MAX);
    }

    #[test]
    fn test_feature_access_by_tier() {
        assert!(!CreditFeature::AiImages.allowed_for(Tier::Bronze));
        assert!(CreditFeature::AiImages.allowed_for(Tier::Silver));
        assert!(!CreditFeature::MiniStudio.allowed_for(Tier::Silver));
        assert!(CreditFeature::MiniStudio.allowed_for(Tier::Gold));
    }

    #[test]
    fn test_monthly_refresh_due() {
        let now = at(2026, 3, 15);
        assert_eq!(monthly_refresh_due(Tier::Bronze, None, now), None);
        assert_eq!(monthly_refresh_due(Tier::Silver, None, now), Some(at(2026, 4, 15)));
        assert_eq!(monthly_refresh_due(Tier::Gold, Some(at(2026, 3, 20)), now), None);
        // Several missed months collapse into one refresh.
        assert_eq!(
            monthly_refresh_due(Tier::Gold, Some(at(2025, 12, 1)), now),
            Some(at(2026, 4, 1))
        );
    }

    #[test]
    fn test_parse_credit_feature() {
        assert_eq!("mini_studio".parse::<CreditFeature>().unwrap(), CreditFeature::MiniStudio);
        assert!("horoscope".parse::<CreditFeature>().is_err());
    }
}
