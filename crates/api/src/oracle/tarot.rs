use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Probability that a drawn card lands reversed.
const REVERSED_PROBABILITY: f64 = 0.3;

const MAJOR_ARCANA: [(&str, &str, &str); 22] = [
    ("The Fool", "new beginnings, spontaneity", "recklessness, hesitation"),
    ("The Magician", "willpower, skill", "manipulation, untapped talent"),
    ("The High Priestess", "intuition, inner voice", "secrets, disconnection"),
    ("The Empress", "abundance, nurturing", "dependence, creative block"),
    ("The Emperor", "structure, authority", "rigidity, domination"),
    ("The Hierophant", "tradition, guidance", "rebellion, new paths"),
    ("The Lovers", "union, alignment", "imbalance, misalignment"),
    ("The Chariot", "drive, victory", "lack of direction"),
    ("Strength", "courage, compassion", "self-doubt"),
    ("The Hermit", "solitude, insight", "isolation, withdrawal"),
    ("Wheel of Fortune", "cycles, turning point", "resistance to change"),
    ("Justice", "fairness, truth", "dishonesty, imbalance"),
    ("The Hanged Man", "surrender, new perspective", "stalling, indecision"),
    ("Death", "endings, transformation", "clinging to the past"),
    ("Temperance", "balance, patience", "excess, discord"),
    ("The Devil", "attachment, temptation", "release, breaking free"),
    ("The Tower", "sudden change, revelation", "averted disaster, fear of change"),
    ("The Star", "hope, renewal", "discouragement"),
    ("The Moon", "illusion, intuition", "clarity returning"),
    ("The Sun", "joy, success", "temporary clouds"),
    ("Judgement", "awakening, reckoning", "self-criticism"),
    ("The World", "completion, wholeness", "loose ends"),
];

const SUITS: [(&str, &str); 4] = [
    ("Wands", "passion and ambition"),
    ("Cups", "emotion and relationships"),
    ("Swords", "thought and conflict"),
    ("Pentacles", "work and material life"),
];

const RANKS: [(&str, &str); 14] = [
    ("Ace", "a seed of"),
    ("Two", "a choice in"),
    ("Three", "early growth in"),
    ("Four", "stability in"),
    ("Five", "struggle in"),
    ("Six", "harmony returning to"),
    ("Seven", "a test of"),
    ("Eight", "swift movement in"),
    ("Nine", "near-fulfilment of"),
    ("Ten", "the culmination of"),
    ("Page", "curiosity about"),
    ("Knight", "bold pursuit of"),
    ("Queen", "mature mastery of"),
    ("King", "command over"),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Arcana {
    Major,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Card {
    name: String,
    arcana: Arcana,
    suit: Option<&'static str>,
    upright: String,
    reversed: String,
}

fn full_deck() -> Vec<Card> {
    let mut deck: Vec<Card> = MAJOR_ARCANA
        .iter()
        .map(|(name, up, rev)| Card {
            name: name.to_string(),
            arcana: Arcana::Major,
            suit: None,
            upright: up.to_string(),
            reversed: rev.to_string(),
        })
        .collect();

    for (suit, theme) in SUITS {
        for (rank, phrase) in RANKS {
            deck.push(Card {
                name: format!("{rank} of {suit}"),
                arcana: Arcana::Minor,
                suit: Some(suit),
                upright: format!("{phrase} {theme}"),
                reversed: format!("blocked energy: {phrase} {theme}"),
            });
        }
    }
    deck
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Spread {
    #[default]
    Single,
    ThreeCard,
    CelticCross,
}

impl Spread {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Single => "single",
            Self::ThreeCard => "three_card",
            Self::CelticCross => "celtic_cross",
        }
    }

    pub fn positions(&self) -> &'static [&'static str] {
        match self {
            Self::Single => &["guidance"],
            Self::ThreeCard => &["past", "present", "future"],
            Self::CelticCross => &[
                "present",
                "challenge",
                "foundation",
                "recent past",
                "crown",
                "near future",
                "self",
                "environment",
                "hopes and fears",
                "outcome",
            ],
        }
    }

    /// Lowest access tier allowed to draw this spread.
    pub fn min_tier(&self) -> Tier {
        match self {
            Self::CelticCross => Tier::Silver,
            _ => Tier::Bronze,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TarotRequest {
    #[serde(default)]
    pub spread: Spread,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawnCard {
    pub position: String,
    pub card: String,
    pub arcana: Arcana,
    pub suit: Option<String>,
    pub reversed: bool,
    pub meaning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TarotReading {
    pub spread: Spread,
    pub date: String,
    pub question: Option<String>,
    pub cards: Vec<DrawnCard>,
}

/// Draw a spread for `(user, date, spread, question)`. Same inputs, same cards.
pub fn draw(user_id: &str, date: &str, spread: Spread, question: Option<&str>) -> TarotReading {
    let question = question.map(str::trim).filter(|q| !q.is_empty());
    let mut rng = super::seeded_rng(&[
        "tarot",
        user_id,
        date,
        spread.as_str(),
        question.unwrap_or(""),
    ]);

    let mut deck = full_deck();
    deck.shuffle(&mut rng);

    let cards = spread
        .positions()
        .iter()
        .zip(deck)
        .map(|(position, card)| {
            let reversed = rng.gen_bool(REVERSED_PROBABILITY);
            DrawnCard {
                position: position.to_string(),
                card: card.name,
                arcana: card.arcana,
                suit: card.suit.map(str::to_string),
                reversed,
                meaning: if reversed { card.reversed } else { card.upright },
            }
        })
        .collect();

    TarotReading {
        spread,
        date: date.to_string(),
        question: question.map(str::to_string),
        cards,
    }
}
