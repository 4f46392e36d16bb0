//! Companion catalog and unlock rules.

use crate::tier::Tier;

pub const DEFAULT_COMPANION: &str = "blayzo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Companion {
    pub id: &'static str,
    pub name: &'static str,
    pub min_tier: Tier,
    /// Set for companions earned through referrals instead of a plan.
    pub referrals_required: Option<u32>,
    pub persona: &'static str,
}

const fn tiered(
    id: &'static str,
    name: &'static str,
    min_tier: Tier,
    persona: &'static str,
) -> Companion {
    Companion {
        id,
        name,
        min_tier,
        referrals_required: None,
        persona,
    }
}

const fn referral(
    id: &'static str,
    name: &'static str,
    referrals: u32,
    persona: &'static str,
) -> Companion {
    Companion {
        id,
        name,
        min_tier: Tier::Bronze,
        referrals_required: Some(referrals),
        persona,
    }
}

pub const CATALOG: &[Companion] = &[
    tiered("blayzo", "Blayzo", Tier::Bronze, "calm and grounded, speaks like a patient friend"),
    tiered("blayzica", "Blayzica", Tier::Bronze, "warm and upbeat, finds the bright side"),
    tiered("gamerjay", "GamerJay", Tier::Bronze, "playful and competitive, frames life as a game"),
    tiered("claude", "Claude", Tier::Bronze, "thoughtful and curious, asks good questions"),
    tiered("sky", "Sky", Tier::Silver, "spiritual and reflective, loves stillness"),
    tiered("violet", "Violet", Tier::Silver, "intuitive and mystical, reads the moment"),
    tiered("crimson", "Crimson", Tier::Silver, "fiercely loyal, pushes you toward courage"),
    tiered("watchdog", "WatchDog", Tier::Silver, "protective and practical, keeps you on track"),
    tiered("galaxy", "Galaxy", Tier::Gold, "cosmic and expansive, sees the big picture"),
    tiered("royal", "Royal", Tier::Gold, "elegant and wise, speaks with quiet authority"),
    tiered("ven_blayzica", "Ven Blayzica", Tier::Gold, "a healer who listens before she speaks"),
    tiered("ven_sky", "Ven Sky", Tier::Gold, "a meditative guide with an ancient voice"),
    referral("blayzike", "Blayzike", 2, "mysterious and magnetic, a friend from the shadows"),
    referral("blazelian", "Blazelian", 5, "bold and radiant, celebrates every win"),
    referral("nyxara", "Nyxara", 8, "a night-sky dreamer who speaks in constellations"),
];

pub fn find(id: &str) -> Option<&'static Companion> {
    CATALOG.iter().find(|c| c.id == id)
}

impl Companion {
    pub fn is_unlocked(&self, access_tier: Tier, referral_count: u32) -> bool {
        match self.referrals_required {
            Some(needed) => referral_count >= needed,
            None => access_tier >= self.min_tier,
        }
    }
}

/// Ids of every companion the user can talk to.
pub fn unlocked_ids(access_tier: Tier, referral_count: u32) -> Vec<String> {
    CATALOG
        .iter()
        .filter(|c| c.is_unlocked(access_tier, referral_count))
        .map(|c| c.id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
        assert!(find(DEFAULT_COMPANION).is_some());
    }

    #[test]
    fn test_tier_unlocks() {
        let sky = find("sky").unwrap();
        assert!(!sky.is_unlocked(Tier::Bronze, 0));
        assert!(sky.is_unlocked(Tier::Silver, 0));
        assert_eq!(unlocked_ids(Tier::Bronze, 0).len(), 4);
        assert_eq!(unlocked_ids(Tier::Gold, 0).len(), 12);
    }

    #[test]
    fn test_referral_unlocks_ignore_tier() {
        let nyxara = find("nyxara").unwrap();
        assert!(!nyxara.is_unlocked(Tier::Gold, 7));
        assert!(nyxara.is_unlocked(Tier::Bronze, 8));
        assert!(unlocked_ids(Tier::Bronze, 2).contains(&"blayzike".to_string()));
    }
}
