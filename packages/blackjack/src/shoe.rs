use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ShoeError;
use crate::{Card, Rank, Suit};

/// Standard 52-card deck, suit by suit, Ace through King.
pub fn new_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
}

/// In-place Fisher–Yates shuffle. Reproducible for a given seeded `rng`.
pub fn shuffle<R: Rng + ?Sized>(deck: &mut [Card], rng: &mut R) {
    deck.shuffle(rng);
}

/// Splits off the first `n` cards. `n` is clamped to the deck size.
pub fn draw(deck: &[Card], n: usize) -> (&[Card], &[Card]) {
    deck.split_at(n.min(deck.len()))
}

/// Undealt cards, dealt from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shoe {
    cards: Vec<Card>,
}

impl Shoe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// A shuffled deck holding only the cards not listed in `in_play`.
    pub fn shuffled_excluding<R: Rng + ?Sized>(in_play: &[Card], rng: &mut R) -> Self {
        let mut cards = new_deck();
        cards.retain(|card| !in_play.contains(card));
        shuffle(&mut cards, rng);
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn draw_card(&mut self) -> Option<Card> {
        let (drawn, _) = draw(&self.cards, 1);
        let card = drawn.first().copied()?;
        self.cards.remove(0);
        Some(card)
    }

    pub fn draw_many(&mut self, n: usize) -> Vec<Card> {
        let taken = draw(&self.cards, n).0.len();
        self.cards.drain(..taken).collect()
    }
}

/// Reads one card token per line. Blank lines and `#` comments are skipped.
pub fn parse_shoe<R: BufRead>(reader: R) -> Result<Vec<Card>, ShoeError> {
    let mut cards = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        let card = token.parse::<Card>().map_err(|source| ShoeError::InvalidCard {
            line: index + 1,
            source,
        })?;
        cards.push(card);
    }
    Ok(cards)
}

pub fn load_shoe<P: AsRef<Path>>(path: P) -> Result<Vec<Card>, ShoeError> {
    let file = File::open(path)?;
    parse_shoe(BufReader::new(file))
}
