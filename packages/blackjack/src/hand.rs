use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Card;

/// Hard and soft totals of a set of cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Every Ace counted as 1.
    pub hard: u8,
    /// One Ace promoted to 11 when that does not bust, otherwise equal to `hard`.
    pub soft: u8,
    pub is_soft: bool,
}

impl Totals {
    pub fn best(&self) -> u8 {
        if self.is_soft {
            self.soft
        } else {
            self.hard
        }
    }
}

pub fn hand_totals(cards: &[Card]) -> Totals {
    let mut hard: u8 = 0;
    let mut has_ace = false;

    for card in cards {
        if card.is_ace() {
            has_ace = true;
            hard = hard.saturating_add(1);
        } else {
            hard = hard.saturating_add(card.value());
        }
    }

    if has_ace && hard <= 11 {
        Totals {
            hard,
            soft: hard + 10,
            is_soft: true,
        }
    } else {
        Totals {
            hard,
            soft: hard,
            is_soft: false,
        }
    }
}

/// Calculate the value of a blackjack hand
pub fn calculate_hand_value(cards: &[Card]) -> u8 {
    hand_totals(cards).best()
}

pub fn is_busted(cards: &[Card]) -> bool {
    calculate_hand_value(cards) > 21
}

/// Check if two cards can be split (same rank, not merely same value)
pub fn can_split_cards(card1: &Card, card2: &Card) -> bool {
    card1.rank == card2.rank
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub cards: Vec<Card>,
    pub bet: u64,
    pub is_split_aces: bool,
    pub doubled: bool,
    pub surrendered: bool,
    /// No action taken yet; gates double, split and surrender.
    pub is_initial_deal: bool,
    /// Came out of a split and can never be a natural.
    pub is_from_split: bool,
    /// Only meaningful on the first hand of a round.
    pub insurance_bet: u64,
}

impl Hand {
    pub fn new(bet: u64) -> Self {
        Self {
            cards: Vec::new(),
            bet,
            is_split_aces: false,
            doubled: false,
            surrendered: false,
            is_initial_deal: true,
            is_from_split: false,
            insurance_bet: 0,
        }
    }

    pub fn from_cards(bet: u64, cards: &[Card]) -> Self {
        let mut hand = Self::new(bet);
        hand.cards.extend_from_slice(cards);
        hand
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn totals(&self) -> Totals {
        hand_totals(&self.cards)
    }

    pub fn value(&self) -> u8 {
        self.totals().best()
    }

    pub fn is_soft(&self) -> bool {
        self.totals().is_soft
    }

    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value() == 21 && self.is_initial_deal && !self.is_from_split
    }

    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }

    pub fn can_split(&self) -> bool {
        self.is_initial_deal
            && self.cards.len() == 2
            && can_split_cards(&self.cards[0], &self.cards[1])
    }

    pub fn can_double(&self) -> bool {
        self.is_initial_deal && !self.is_split_aces
    }

    pub fn can_surrender(&self) -> bool {
        self.is_initial_deal && self.cards.len() == 2
    }
}

impl Default for Hand {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{card}")?;
        }
        write!(f, "]")
    }
}
