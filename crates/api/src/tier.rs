//! Subscription tiers and the flat limit tables hanging off them.
//!
//! Daily quotas are always derived from the user's *plan*. A trial only
//! raises the *access* tier (see [`effective_access_tier`]).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ServiceError;

/// Subscription plan. Ordered so `tier >= Tier::Silver` reads naturally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Bronze, Tier::Silver, Tier::Gold];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    /// Lenient plan parsing for values coming out of the database or legacy
    /// plan names. Unknown plans fall back to Bronze.
    pub fn from_plan(plan: &str) -> Self {
        match plan.trim().to_ascii_lowercase().as_str() {
            "silver" | "growth" | "premium" => Self::Silver,
            "gold" | "max" | "enterprise" => Self::Gold,
            _ => Self::Bronze,
        }
    }
}

impl FromStr for Tier {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            other => Err(ServiceError::BadRequest(format!("unknown plan: {other}"))),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Features metered by a per-day usage counter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LimitedFeature {
    Decoder,
    Fortune,
    Horoscope,
    CreativeWriting,
}

impl LimitedFeature {
    pub const ALL: [LimitedFeature; 4] = [
        LimitedFeature::Decoder,
        LimitedFeature::Fortune,
        LimitedFeature::Horoscope,
        LimitedFeature::CreativeWriting,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Decoder => "decoder",
            Self::Fortune => "fortune",
            Self::Horoscope => "horoscope",
            Self::CreativeWriting => "creative_writing",
        }
    }
}

impl FromStr for LimitedFeature {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ServiceError::NotFound(format!("unknown feature: {s}")))
    }
}

impl std::fmt::Display for LimitedFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily limit for a feature on a plan. `None` means unlimited.
pub fn daily_limit(tier: Tier, feature: LimitedFeature) -> Option<u32> {
    use LimitedFeature::*;
    match (tier, feature) {
        (Tier::Bronze, Decoder) => Some(3),
        (Tier::Bronze, Fortune) => Some(2),
        (Tier::Bronze, Horoscope) => Some(3),
        (Tier::Bronze, CreativeWriting) => Some(2),
        (Tier::Silver, Decoder) => Some(15),
        (Tier::Silver, Fortune) => Some(8),
        (Tier::Silver, Horoscope) => Some(10),
        (Tier::Silver, CreativeWriting) => Some(20),
        (Tier::Gold, _) => None,
    }
}

/// Credits granted at every monthly refresh.
pub fn monthly_credits(tier: Tier) -> i64 {
    match tier {
        Tier::Bronze => 0,
        Tier::Silver => 200,
        Tier::Gold => 500,
    }
}

/// Number of songs a user may keep in their library.
pub fn library_capacity(tier: Tier) -> Option<u32> {
    match tier {
        Tier::Bronze => Some(3),
        Tier::Silver => Some(50),
        Tier::Gold => None,
    }
}

pub fn max_message_chars(tier: Tier) -> usize {
    match tier {
        Tier::Bronze => 500,
        Tier::Silver => 1000,
        Tier::Gold => 2000,
    }
}

/// Tier used for access checks. An active trial unlocks Gold access.
pub fn effective_access_tier(plan: Tier, trial_active: bool) -> Tier {
    if trial_active { Tier::Gold } else { plan }
}

/// Remaining uses given a limit and today's count.
pub fn remaining(limit: Option<u32>, used: u32) -> Option<u32> {
    limit.map(|l| l.saturating_sub(used))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_plan_aliases() {
        assert_eq!(Tier::from_plan("free"), Tier::Bronze);
        assert_eq!(Tier::from_plan(""), Tier::Bronze);
        assert_eq!(Tier::from_plan(" Growth "), Tier::Silver);
        assert_eq!(Tier::from_plan("PREMIUM"), Tier::Silver);
        assert_eq!(Tier::from_plan("max"), Tier::Gold);
        assert_eq!(Tier::from_plan("enterprise"), Tier::Gold);
        assert_eq!(Tier::from_plan("platinum"), Tier::Bronze);
    }

    #[test]
    fn test_strict_parse_rejects_aliases() {
        assert_eq!("Gold".parse::<Tier>().unwrap(), Tier::Gold);
        assert!("max".parse::<Tier>().is_err());
        assert!("".parse::<Tier>().is_err());
    }

    #[test]
    fn test_gold_is_unlimited() {
        for feature in LimitedFeature::ALL {
            assert_eq!(daily_limit(Tier::Gold, feature), None);
            let bronze = daily_limit(Tier::Bronze, feature).unwrap();
            assert!(bronze < daily_limit(Tier::Silver, feature).unwrap());
        }
    }

    #[test]
    fn test_trial_raises_access_not_limits() {
        let access = effective_access_tier(Tier::Bronze, true);
        assert_eq!(access, Tier::Gold);
        // Limits keep following the plan.
        assert_eq!(daily_limit(Tier::Bronze, LimitedFeature::Fortune), Some(2));
        assert_eq!(effective_access_tier(Tier::Silver, false), Tier::Silver);
    }

    #[test]
    fn test_remaining_saturates() {
        assert_eq!(remaining(Some(3), 5), Some(0));
        assert_eq!(remaining(Some(3), 1), Some(2));
        assert_eq!(remaining(None, 100), None);
    }

    #[test]
    fn test_feature_round_trip_names() {
        assert_eq!(
            "creative_writing".parse::<LimitedFeature>().unwrap(),
            LimitedFeature::CreativeWriting
        );
        assert!("tarot".parse::<LimitedFeature>().is_err());
    }
}
