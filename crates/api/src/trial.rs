//! Five-hour trial: temporary Gold access plus a small pool of trial credits.

use chrono::{Duration, NaiveDateTime};

use crate::ServiceError;
use crate::tier::Tier;

pub const TRIAL_HOURS: i64 = 5;
pub const TRIAL_CREDITS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    /// Never started.
    Inactive,
    Active { ends_at: NaiveDateTime, remaining_secs: i64 },
    Expired { ended_at: NaiveDateTime },
}

impl TrialState {
    pub fn at(started_at: Option<NaiveDateTime>, now: NaiveDateTime) -> Self {
        let Some(started) = started_at else {
            return Self::Inactive;
        };
        let ends_at = started + Duration::hours(TRIAL_HOURS);
        if now < ends_at {
            Self::Active {
                ends_at,
                remaining_secs: (ends_at - now).num_seconds(),
            }
        } else {
            Self::Expired { ended_at: ends_at }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Inactive => None,
            Self::Active { ends_at, .. } => Some(*ends_at),
            Self::Expired { ended_at } => Some(*ended_at),
        }
    }
}

/// Check whether a user may start a trial.
pub fn check_can_start(plan: Tier, trial_used: bool) -> Result<(), ServiceError> {
    if trial_used {
        return Err(ServiceError::Conflict("trial already used".into()));
    }
    if plan != Tier::Bronze {
        return Err(ServiceError::BadRequest(
            "trial is only available on the bronze plan".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_trial_lifecycle() {
        assert_eq!(TrialState::at(None, t(10, 0)), TrialState::Inactive);

        let state = TrialState::at(Some(t(10, 0)), t(14, 30));
        assert!(state.is_active());
        assert_eq!(
            state,
            TrialState::Active { ends_at: t(15, 0), remaining_secs: 1800 }
        );

        let state = TrialState::at(Some(t(10, 0)), t(15, 0));
        assert_eq!(state, TrialState::Expired { ended_at: t(15, 0) });
        assert!(!state.is_active());
    }

    #[test]
    fn test_check_can_start() {
        assert!(check_can_start(Tier::Bronze, false).is_ok());
        assert_eq!(check_can_start(Tier::Bronze, true).unwrap_err().status_code(), 409);
        assert_eq!(check_can_start(Tier::Gold, false).unwrap_err().status_code(), 400);
    }
}
