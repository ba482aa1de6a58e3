use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Hand;

pub const MIN_BET: u64 = 1;
pub const STARTING_BANK: u64 = 1000;
/// Splitting stops once this many hands are in play.
pub const MAX_HANDS: usize = 4;
/// Dealer stands once reaching this total, soft or hard.
pub const DEALER_STANDS_ON: u8 = 17;

pub const BLACKJACK_PAYOUT: PayoutRatio = PayoutRatio::THREE_TO_TWO;
pub const INSURANCE_PAYOUT: PayoutRatio = PayoutRatio::TWO_TO_ONE;

/// Winnings multiplier as a ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRatio {
    pub numerator: u16,
    pub denominator: u16,
}

impl PayoutRatio {
    pub const THREE_TO_TWO: Self = Self {
        numerator: 3,
        denominator: 2,
    };
    pub const TWO_TO_ONE: Self = Self {
        numerator: 2,
        denominator: 1,
    };
    pub const ONE_TO_ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Winnings on `bet`, excluding the returned stake. Rounds down, saturates at `u64::MAX`.
    pub fn calculate_payout(&self, bet: u64) -> u64 {
        let winnings = (bet as u128 * self.numerator as u128) / self.denominator as u128;
        u64::try_from(winnings).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandOutcome {
    Win,
    Lose,
    Push,
    Blackjack,
    Surrender,
}

impl fmt::Display for HandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HandOutcome::Win => "Win",
            HandOutcome::Lose => "Lose",
            HandOutcome::Push => "Push",
            HandOutcome::Blackjack => "Blackjack",
            HandOutcome::Surrender => "Surrender",
        };
        f.write_str(label)
    }
}

/// Which stake a payout settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wager {
    Main,
    Insurance,
}

/// When the shoe is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShoePolicy {
    /// Keep dealing from the same shoe; rebuild only once it runs out.
    #[default]
    Continuous,
    /// Fresh shuffled deck at the start of every round.
    ReshuffleEachRound,
}

/// Table settings for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub starting_bank: u64,
    pub min_bet: u64,
    pub shoe_policy: ShoePolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            starting_bank: STARTING_BANK,
            min_bet: MIN_BET,
            shoe_policy: ShoePolicy::Continuous,
        }
    }
}

/// Compare a finished player hand against the dealer.
pub fn determine_outcome(player: &Hand, dealer: &Hand) -> HandOutcome {
    if player.surrendered {
        return HandOutcome::Surrender;
    }
    if player.is_bust() {
        return HandOutcome::Lose;
    }
    if dealer.is_bust() {
        return HandOutcome::Win;
    }

    let player_blackjack = player.is_blackjack();
    let dealer_blackjack = dealer.is_blackjack();
    if player_blackjack && !dealer_blackjack {
        return HandOutcome::Blackjack;
    }
    if dealer_blackjack && !player_blackjack {
        return HandOutcome::Lose;
    }

    let player_value = player.value();
    let dealer_value = dealer.value();
    if player_value == dealer_value {
        HandOutcome::Push
    } else if player_value > dealer_value {
        HandOutcome::Win
    } else {
        HandOutcome::Lose
    }
}

/// Chips credited back to the bank. Stakes are debited up front, so this is never negative.
/// Saturates at `u64::MAX` rather than wrapping.
pub fn payout(outcome: HandOutcome, bet: u64, wager: Wager) -> u64 {
    match wager {
        Wager::Insurance => match outcome {
            HandOutcome::Win => bet.saturating_add(INSURANCE_PAYOUT.calculate_payout(bet)),
            _ => 0,
        },
        Wager::Main => match outcome {
            HandOutcome::Blackjack => bet.saturating_add(BLACKJACK_PAYOUT.calculate_payout(bet)),
            HandOutcome::Win => bet.saturating_add(PayoutRatio::ONE_TO_ONE.calculate_payout(bet)),
            HandOutcome::Push => bet,
            HandOutcome::Lose => 0,
            HandOutcome::Surrender => bet / 2,
        },
    }
}
