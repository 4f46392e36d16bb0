use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ServiceError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// `(sign, start month, start day)` in calendar order. A date belongs to the
/// last entry whose start it has reached; early January wraps to Capricorn.
const SIGN_STARTS: [(ZodiacSign, u32, u32); 12] = [
    (ZodiacSign::Aquarius, 1, 20),
    (ZodiacSign::Pisces, 2, 19),
    (ZodiacSign::Aries, 3, 21),
    (ZodiacSign::Taurus, 4, 20),
    (ZodiacSign::Gemini, 5, 21),
    (ZodiacSign::Cancer, 6, 21),
    (ZodiacSign::Leo, 7, 23),
    (ZodiacSign::Virgo, 8, 23),
    (ZodiacSign::Libra, 9, 23),
    (ZodiacSign::Scorpio, 10, 23),
    (ZodiacSign::Sagittarius, 11, 22),
    (ZodiacSign::Capricorn, 12, 22),
];

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aries => "aries",
            Self::Taurus => "taurus",
            Self::Gemini => "gemini",
            Self::Cancer => "cancer",
            Self::Leo => "leo",
            Self::Virgo => "virgo",
            Self::Libra => "libra",
            Self::Scorpio => "scorpio",
            Self::Sagittarius => "sagittarius",
            Self::Capricorn => "capricorn",
            Self::Aquarius => "aquarius",
            Self::Pisces => "pisces",
        }
    }

    pub fn element(&self) -> &'static str {
        match self {
            Self::Aries | Self::Leo | Self::Sagittarius => "fire",
            Self::Taurus | Self::Virgo | Self::Capricorn => "earth",
            Self::Gemini | Self::Libra | Self::Aquarius => "air",
            Self::Cancer | Self::Scorpio | Self::Pisces => "water",
        }
    }

    pub fn ruling_planet(&self) -> &'static str {
        match self {
            Self::Aries => "Mars",
            Self::Taurus | Self::Libra => "Venus",
            Self::Gemini | Self::Virgo => "Mercury",
            Self::Cancer => "Moon",
            Self::Leo => "Sun",
            Self::Scorpio => "Pluto",
            Self::Sagittarius => "Jupiter",
            Self::Capricorn => "Saturn",
            Self::Aquarius => "Uranus",
            Self::Pisces => "Neptune",
        }
    }

    pub fn date_range(&self) -> &'static str {
        match self {
            Self::Aries => "Mar 21 - Apr 19",
            Self::Taurus => "Apr 20 - May 20",
            Self::Gemini => "May 21 - Jun 20",
            Self::Cancer => "Jun 21 - Jul 22",
            Self::Leo => "Jul 23 - Aug 22",
            Self::Virgo => "Aug 23 - Sep 22",
            Self::Libra => "Sep 23 - Oct 22",
            Self::Scorpio => "Oct 23 - Nov 21",
            Self::Sagittarius => "Nov 22 - Dec 21",
            Self::Capricorn => "Dec 22 - Jan 19",
            Self::Aquarius => "Jan 20 - Feb 18",
            Self::Pisces => "Feb 19 - Mar 20",
        }
    }

    /// Sun sign for a birthday. Returns `None` for an impossible month/day.
    pub fn for_birthday(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so Feb 29 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day)?;
        let sign = SIGN_STARTS
            .iter()
            .rev()
            .find(|(_, m, d)| (month, day) >= (*m, *d))
            .map(|(sign, _, _)| *sign)
            .unwrap_or(ZodiacSign::Capricorn);
        Some(sign)
    }
}

impl FromStr for ZodiacSign {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|z| z.as_str() == lower)
            .ok_or_else(|| ServiceError::BadRequest(format!("unknown zodiac sign: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Horoscope {
    pub sign: ZodiacSign,
    pub date: String,
    pub element: String,
    pub ruling_planet: String,
    pub date_range: String,
    pub mood: String,
    pub focus: String,
    pub lucky_number: u8,
    pub lucky_color: String,
    pub compatible_sign: ZodiacSign,
    pub message: String,
}

const MOODS: &[&str] = &[
    "hopeful", "reflective", "energized", "tender", "restless", "grounded", "playful",
    "determined", "dreamy", "serene",
];

const FOCUS_AREAS: &[&str] = &[
    "love", "career", "friendship", "self-care", "creativity", "family", "money", "growth",
];

const COLORS: &[&str] = &[
    "crimson", "gold", "emerald", "sapphire", "violet", "silver", "amber", "rose", "teal",
    "ivory",
];

const OPENERS: &[&str] = &[
    "The stars lean in your favor today.",
    "A quiet shift is happening beneath the surface.",
    "Today asks you to slow down and notice.",
    "Momentum is building around you.",
    "An old question finds a new answer today.",
    "The sky is clear enough to see where you are going.",
];

const ADVICE: &[&str] = &[
    "Say the thing you have been holding back.",
    "Let someone else take the lead for once.",
    "Finish one small task before starting anything new.",
    "Trust the first instinct, then double-check the details.",
    "Make space for rest; it is part of the work.",
    "Reach out to someone you have not heard from in a while.",
    "Write down the idea before it slips away.",
];

fn element_line(element: &str, focus: &str) -> String {
    match element {
        "fire" => format!("Your fire burns brightest when it is pointed at {focus}."),
        "earth" => format!("Steady, practical steps in {focus} pay off now."),
        "air" => format!("Conversations about {focus} open unexpected doors."),
        _ => format!("Follow your feelings where {focus} is concerned."),
    }
}

/// Generate the horoscope for `(user, sign, date)`. Stable for those inputs.
pub fn daily_horoscope(user_id: &str, sign: ZodiacSign, date: &str) -> Horoscope {
    let mut rng = super::seeded_rng(&["horoscope", user_id, sign.as_str(), date]);

    let pick = |rng: &mut rand::rngs::StdRng, table: &[&str]| -> String {
        table.choose(rng).copied().unwrap_or_default().to_string()
    };

    let mood = pick(&mut rng, MOODS);
    let focus = pick(&mut rng, FOCUS_AREAS);
    let lucky_color = pick(&mut rng, COLORS);
    let lucky_number = rng.gen_range(1..=99u8);
    let compatible_sign = *ZodiacSign::ALL
        .choose(&mut rng)
        .unwrap_or(&ZodiacSign::Libra);
    let opener = pick(&mut rng, OPENERS);
    let advice = pick(&mut rng, ADVICE);

    let message = format!("{opener} {} {advice}", element_line(sign.element(), &focus));

    Horoscope {
        sign,
        date: date.to_string(),
        element: sign.element().to_string(),
        ruling_planet: sign.ruling_planet().to_string(),
        date_range: sign.date_range().to_string(),
        mood,
        focus,
        lucky_number,
        lucky_color,
        compatible_sign,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_birthday_boundaries() {
        assert_eq!(ZodiacSign::for_birthday(3, 21), Some(ZodiacSign::Aries));
        assert_eq!(ZodiacSign::for_birthday(3, 20), Some(ZodiacSign::Pisces));
        assert_eq!(ZodiacSign::for_birthday(1, 5), Some(ZodiacSign::Capricorn));
        assert_eq!(ZodiacSign::for_birthday(12, 25), Some(ZodiacSign::Capricorn));
        assert_eq!(ZodiacSign::for_birthday(1, 20), Some(ZodiacSign::Aquarius));
        assert_eq!(ZodiacSign::for_birthday(2, 29), Some(ZodiacSign::Pisces));
        assert_eq!(ZodiacSign::for_birthday(13, 1), None);
        assert_eq!(ZodiacSign::for_birthday(0, 10), None);
        assert_eq!(ZodiacSign::for_birthday(2, 30), None);
        assert_eq!(ZodiacSign::for_birthday(2, 31), None);
        assert_eq!(ZodiacSign::for_birthday(4, 31), None);
    }

    #[test]
    fn test_horoscope_is_deterministic_per_day() {
        let a = daily_horoscope("user-1", ZodiacSign::Leo, "2026-07-30");
        let b = daily_horoscope("user-1", ZodiacSign::Leo, "2026-07-30");
        assert_eq!(a, b);
        assert!((1..=99).contains(&a.lucky_number));
        assert_eq!(a.element, "fire");
    }

    #[test]
    fn test_horoscope_varies_across_days() {
        let week: Vec<_> = (1..=7)
            .map(|d| daily_horoscope("user-1", ZodiacSign::Leo, &format!("2026-07-0{d}")))
            .collect();
        assert!(
            week.windows(2)
                .any(|w| w[0].message != w[1].message || w[0].lucky_number != w[1].lucky_number)
        );
    }

    #[test]
    fn test_sign_parse() {
        assert_eq!(" Scorpio ".parse::<ZodiacSign>().unwrap(), ZodiacSign::Scorpio);
        assert!("ophiuchus".parse::<ZodiacSign>().is_err());
    }
}
