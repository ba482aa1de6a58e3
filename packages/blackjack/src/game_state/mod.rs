use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dealer::{dealer_play, dealer_should_draw, peek_for_blackjack};
use crate::error::GameError;
use crate::rules::{determine_outcome, payout, HandOutcome, ShoePolicy, TableConfig, Wager, MAX_HANDS};
use crate::shoe::Shoe;
use crate::{Card, Hand};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Betting,
    Insurance,
    PlayerAction,
    DealerAction,
    Resolution,
    /// Bank can no longer cover the minimum bet. Terminal.
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Hit,
        Action::Stand,
        Action::Double,
        Action::Split,
        Action::Surrender,
    ];

    /// Single-letter input shortcut.
    pub fn shortcut(&self) -> char {
        match self {
            Action::Hit => 'h',
            Action::Stand => 's',
            Action::Double => 'd',
            Action::Split => 'p',
            Action::Surrender => 'r',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Double => "double",
            Action::Split => "split",
            Action::Surrender => "surrender",
        };
        f.write_str(name)
    }
}

impl FromStr for Action {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        Action::ALL
            .into_iter()
            .find(|action| {
                input == action.to_string() || input.chars().eq(std::iter::once(action.shortcut()))
            })
            .ok_or_else(|| GameError::UnknownAction(s.trim().to_string()))
    }
}

/// How one player hand was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub hand_index: usize,
    pub outcome: HandOutcome,
    pub bet: u64,
    /// Chips returned to the bank for the main bet, stake included.
    pub credited: u64,
    pub insurance_bet: u64,
    pub insurance_credited: u64,
}

impl Settlement {
    pub fn total_credited(&self) -> u64 {
        self.credited.saturating_add(self.insurance_credited)
    }
}

/// Read-only view of the table. The hole card is withheld while the player is deciding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub bank: u64,
    pub active_hand_index: Option<usize>,
    pub player_hands: Vec<Hand>,
    pub dealer_cards: Vec<Card>,
    pub dealer_hole_hidden: bool,
    pub dealer_value: Option<u8>,
    pub available_actions: Vec<Action>,
    pub settlements: Vec<Settlement>,
    pub shoe_remaining: usize,
}

/// Authoritative single-player game: bank, shoe, hands and phase.
#[derive(Debug, Clone)]
pub struct Game<R = ChaCha8Rng> {
    config: TableConfig,
    bank: u64,
    shoe: Shoe,
    player_hands: Vec<Hand>,
    dealer_hand: Hand,
    phase: GamePhase,
    active_hand_index: usize,
    dealer_has_blackjack: bool,
    insurance_offered: bool,
    settlements: Vec<Settlement>,
    rng: R,
}

impl Game<ChaCha8Rng> {
    /// Game whose shuffles are seeded from OS entropy.
    pub fn new(config: TableConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Game with reproducible shuffles.
    pub fn seeded(config: TableConfig, seed: u64) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(config: TableConfig, rng: R) -> Self {
        let mut game = Self {
            config,
            bank: config.starting_bank,
            shoe: Shoe::new(),
            player_hands: Vec::new(),
            dealer_hand: Hand::new(0),
            phase: GamePhase::Betting,
            active_hand_index: 0,
            dealer_has_blackjack: false,
            insurance_offered: false,
            settlements: Vec::new(),
            rng,
        };
        if game.is_broke() {
            game.phase = GamePhase::GameOver;
        }
        game
    }

    // ── Queries ──

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn bank(&self) -> u64 {
        self.bank
    }

    pub fn active_hand_index(&self) -> usize {
        self.active_hand_index
    }

    /// The hand awaiting a decision, if the player is acting.
    pub fn active_hand(&self) -> Option<&Hand> {
        if self.phase != GamePhase::PlayerAction {
            return None;
        }
        self.player_hands.get(self.active_hand_index)
    }

    pub fn player_hands(&self) -> &[Hand] {
        &self.player_hands
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer_hand
    }

    /// The dealer's visible card: the second one dealt.
    pub fn dealer_up_card(&self) -> Option<Card> {
        self.dealer_hand.cards.get(1).copied()
    }

    pub fn dealer_has_blackjack(&self) -> bool {
        self.dealer_has_blackjack
    }

    pub fn insurance_offered(&self) -> bool {
        self.insurance_offered
    }

    /// Largest insurance bet allowed: half the opening bet, rounded down.
    pub fn max_insurance(&self) -> u64 {
        self.player_hands.first().map_or(0, |hand| hand.bet / 2)
    }

    /// Settlements from the most recently resolved round.
    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn shoe_len(&self) -> usize {
        self.shoe.len()
    }

    /// Legal actions for the active hand. Advisory: the engine still enforces every rule.
    pub fn available_actions(&self) -> Vec<Action> {
        let Some(hand) = self.active_hand() else {
            return Vec::new();
        };

        if hand.is_bust() {
            return Vec::new();
        }
        if hand.value() == 21 || (hand.is_split_aces && hand.cards.len() >= 2) {
            return vec![Action::Stand];
        }

        let mut actions = vec![Action::Hit, Action::Stand];
        if hand.can_double() && self.bank >= hand.bet {
            actions.push(Action::Double);
        }
        if hand.can_split()
            && !hand.is_split_aces
            && self.bank >= hand.bet
            && self.player_hands.len() < MAX_HANDS
        {
            actions.push(Action::Split);
        }
        if hand.can_surrender() {
            actions.push(Action::Surrender);
        }
        actions
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let hole_hidden = matches!(self.phase, GamePhase::Insurance | GamePhase::PlayerAction);
        let dealer_cards: Vec<Card> = if hole_hidden {
            self.dealer_hand.cards.iter().skip(1).copied().collect()
        } else {
            self.dealer_hand.cards.clone()
        };
        let dealer_value = (!hole_hidden && !self.dealer_hand.cards.is_empty())
            .then(|| self.dealer_hand.value());

        GameSnapshot {
            phase: self.phase,
            bank: self.bank,
            active_hand_index: self.active_hand().map(|_| self.active_hand_index),
            player_hands: self.player_hands.clone(),
            dealer_cards,
            dealer_hole_hidden: hole_hidden,
            dealer_value,
            available_actions: self.available_actions(),
            settlements: self.settlements.clone(),
            shoe_remaining: self.shoe.len(),
        }
    }

    // ── Bank ──

    /// Withdraw a stake from the bank.
    pub fn debit(&mut self, amount: u64) -> Result<(), GameError> {
        if amount > self.bank {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.bank,
            });
        }
        self.bank -= amount;
        Ok(())
    }

    // ── Round setup ──

    /// Replace the shoe with a predetermined card order, dealt front first.
    ///
    /// Under [`ShoePolicy::ReshuffleEachRound`] the next `start_hand` discards it.
    pub fn load_shoe(&mut self, cards: Vec<Card>) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::Betting)?;
        log::debug!("loaded shoe of {} cards", cards.len());
        self.shoe = Shoe::from_cards(cards);
        Ok(())
    }

    /// Deal a new round for `bet`. Does not touch the bank; see [`Game::place_bet`].
    pub fn start_hand(&mut self, bet: u64) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::Betting)?;
        if bet < self.config.min_bet {
            return Err(GameError::BetBelowMinimum {
                min: self.config.min_bet,
            });
        }
        if bet > self.bank {
            return Err(GameError::BetExceedsBank {
                bet,
                bank: self.bank,
            });
        }

        self.player_hands = vec![Hand::new(bet)];
        self.dealer_hand = Hand::new(0);
        self.active_hand_index = 0;
        self.dealer_has_blackjack = false;
        self.insurance_offered = false;
        self.settlements.clear();

        if self.shoe.is_empty() || self.config.shoe_policy == ShoePolicy::ReshuffleEachRound {
            self.replenish_shoe();
        }

        self.deal_to_player(0);
        self.deal_to_dealer();
        self.deal_to_player(0);
        self.deal_to_dealer();
        log::debug!(
            "dealt {} against dealer up card {:?}",
            self.player_hands[0],
            self.dealer_up_card()
        );

        // Ace up offers insurance. Otherwise a ten in the hole is peeked; an Ace in the
        // hole behind a ten goes unseen until the dealer's turn.
        let hole_is_ten = self.dealer_hand.cards.first().is_some_and(|card| card.value() == 10);
        match self.dealer_up_card() {
            Some(up) if up.is_ace() => {
                self.insurance_offered = true;
                self.set_phase(GamePhase::Insurance);
            }
            _ if hole_is_ten => self.peek_and_continue(),
            _ => self.set_phase(GamePhase::PlayerAction),
        }
        Ok(())
    }

    /// `start_hand` followed by the matching debit.
    pub fn place_bet(&mut self, bet: u64) -> Result<(), GameError> {
        self.start_hand(bet)?;
        self.debit(bet)
    }

    // ── Insurance ──

    /// Record an insurance bet and peek. Does not touch the bank; see [`Game::place_insurance`].
    pub fn take_insurance(&mut self, amount: u64) -> Result<(), GameError> {
        if self.phase != GamePhase::Insurance {
            return Err(GameError::InsuranceNotAvailable);
        }
        let max = self.max_insurance();
        if amount > max {
            return Err(GameError::InsuranceExceedsMax { max });
        }

        if let Some(hand) = self.player_hands.first_mut() {
            hand.insurance_bet = amount;
        }
        log::debug!("insurance taken for {amount}");
        self.peek_and_continue();
        Ok(())
    }

    pub fn decline_insurance(&mut self) -> Result<(), GameError> {
        if self.phase != GamePhase::Insurance {
            return Err(GameError::InsuranceNotAvailable);
        }
        self.peek_and_continue();
        Ok(())
    }

    /// `take_insurance` followed by the matching debit. Applies fully or not at all.
    pub fn place_insurance(&mut self, amount: u64) -> Result<(), GameError> {
        if self.phase != GamePhase::Insurance {
            return Err(GameError::InsuranceNotAvailable);
        }
        if amount > self.bank {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.bank,
            });
        }
        self.take_insurance(amount)?;
        self.debit(amount)
    }

    // ── Player actions ──

    pub fn player_action(&mut self, action: Action) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::PlayerAction)?;
        let index = self.active_hand_index;
        if index >= self.player_hands.len() {
            return Err(GameError::InvalidHandIndex(index));
        }

        log::debug!("hand {index}: {action}");
        match action {
            Action::Hit => self.hit(index),
            Action::Stand => {
                self.advance_to_next_hand();
                Ok(())
            }
            Action::Double => self.double(index),
            Action::Split => self.split(index),
            Action::Surrender => self.surrender(index),
        }
    }

    fn hit(&mut self, index: usize) -> Result<(), GameError> {
        self.player_hands[index].is_initial_deal = false;
        self.deal_to_player(index);

        let hand = &self.player_hands[index];
        if hand.value() == 21 || hand.is_bust() || hand.is_split_aces {
            self.advance_to_next_hand();
        }
        Ok(())
    }

    fn double(&mut self, index: usize) -> Result<(), GameError> {
        let hand = &self.player_hands[index];
        if !hand.can_double() {
            return Err(GameError::ActionNotLegal {
                action: Action::Double,
                reason: "hand can no longer be doubled",
            });
        }
        let bet = hand.bet;
        self.debit(bet)?;

        let hand = &mut self.player_hands[index];
        hand.bet = hand.bet.saturating_add(bet);
        hand.doubled = true;
        hand.is_initial_deal = false;
        self.deal_to_player(index);
        self.advance_to_next_hand();
        Ok(())
    }

    fn split(&mut self, index: usize) -> Result<(), GameError> {
        let hand = &self.player_hands[index];
        if !hand.can_split() {
            return Err(GameError::ActionNotLegal {
                action: Action::Split,
                reason: "hand is not an untouched pair",
            });
        }
        if hand.is_split_aces {
            return Err(GameError::ActionNotLegal {
                action: Action::Split,
                reason: "split aces cannot be split again",
            });
        }
        if self.player_hands.len() >= MAX_HANDS {
            return Err(GameError::ActionNotLegal {
                action: Action::Split,
                reason: "hand limit reached",
            });
        }
        let bet = hand.bet;
        self.debit(bet)?;

        let moved = self.player_hands[index].cards.remove(1);
        let aces = moved.is_ace();
        let mut sibling = Hand::new(bet);
        sibling.add_card(moved);
        self.player_hands.insert(index + 1, sibling);

        self.deal_to_player(index);
        self.deal_to_player(index + 1);
        for hand in &mut self.player_hands[index..=index + 1] {
            hand.is_split_aces = aces;
            hand.is_initial_deal = true;
            hand.is_from_split = true;
        }
        log::debug!("split into {} hands", self.player_hands.len());

        // Split aces take their one card and are done.
        if aces {
            while self.active_hand().is_some_and(|hand| hand.is_split_aces) {
                self.advance_to_next_hand();
            }
        }
        Ok(())
    }

    fn surrender(&mut self, index: usize) -> Result<(), GameError> {
        let hand = &mut self.player_hands[index];
        if !hand.can_surrender() {
            return Err(GameError::ActionNotLegal {
                action: Action::Surrender,
                reason: "surrender is only allowed on the first two cards",
            });
        }
        hand.surrendered = true;
        hand.is_initial_deal = false;
        self.advance_to_next_hand();
        Ok(())
    }

    fn advance_to_next_hand(&mut self) {
        self.active_hand_index += 1;
        if self.active_hand_index < self.player_hands.len() {
            return;
        }

        self.set_phase(GamePhase::DealerAction);
        self.play_dealer();
        self.set_phase(GamePhase::Resolution);
        self.settle();
    }

    // ── Dealer and settlement ──

    fn play_dealer(&mut self) {
        let nothing_to_beat = self
            .player_hands
            .iter()
            .all(|hand| hand.is_bust() || hand.surrendered);
        if nothing_to_beat || self.dealer_has_blackjack {
            log::debug!("dealer does not draw");
            return;
        }

        dealer_play(&mut self.shoe, &mut self.dealer_hand);
        if dealer_should_draw(&self.dealer_hand) {
            self.replenish_shoe();
            dealer_play(&mut self.shoe, &mut self.dealer_hand);
        }
        log::debug!("dealer finishes on {}", self.dealer_hand);
    }

    /// Settle a round that ended in Resolution without the player acting (dealer natural).
    pub fn resolve_payouts(&mut self) -> Result<(), GameError> {
        self.ensure_phase(GamePhase::Resolution)?;
        self.settle();
        Ok(())
    }

    fn settle(&mut self) {
        let dealer = &self.dealer_hand;
        let dealer_blackjack = self.dealer_has_blackjack;
        let settlements: Vec<Settlement> = self
            .player_hands
            .iter()
            .enumerate()
            .map(|(index, hand)| settle_hand(index, hand, dealer, dealer_blackjack))
            .collect();

        let credited = settlements
            .iter()
            .map(Settlement::total_credited)
            .fold(0u64, u64::saturating_add);
        self.bank = self.bank.saturating_add(credited);
        self.settlements = settlements;
        log::info!("round settled: {credited} credited, bank {}", self.bank);

        if self.is_broke() {
            self.set_phase(GamePhase::GameOver);
        } else {
            self.set_phase(GamePhase::Betting);
        }
    }

    // ── Internals ──

    fn is_broke(&self) -> bool {
        self.bank == 0 || self.bank < self.config.min_bet
    }

    fn ensure_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase != expected {
            return Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn set_phase(&mut self, phase: GamePhase) {
        log::debug!("phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn peek_and_continue(&mut self) {
        let natural = match self.dealer_hand.cards.as_slice() {
            [hole, up] => peek_for_blackjack(*up, *hole),
            _ => false,
        };
        if natural {
            self.dealer_has_blackjack = true;
            self.set_phase(GamePhase::Resolution);
        } else {
            self.set_phase(GamePhase::PlayerAction);
        }
    }

    /// Rebuild the shoe from every card not currently on the table.
    fn replenish_shoe(&mut self) {
        let in_play: Vec<Card> = self
            .player_hands
            .iter()
            .chain(std::iter::once(&self.dealer_hand))
            .flat_map(|hand| hand.cards.iter().copied())
            .collect();
        self.shoe = Shoe::shuffled_excluding(&in_play, &mut self.rng);
        log::info!(
            "shuffled a fresh {}-card shoe ({} cards on the table)",
            self.shoe.len(),
            in_play.len()
        );
    }

    fn next_card(&mut self) -> Option<Card> {
        if self.shoe.is_empty() {
            self.replenish_shoe();
        }
        self.shoe.draw_card()
    }

    fn deal_to_player(&mut self, index: usize) {
        if let Some(card) = self.next_card() {
            self.player_hands[index].add_card(card);
        }
    }

    fn deal_to_dealer(&mut self) {
        if let Some(card) = self.next_card() {
            self.dealer_hand.add_card(card);
        }
    }
}

fn settle_hand(index: usize, hand: &Hand, dealer: &Hand, dealer_blackjack: bool) -> Settlement {
    let insurance_credited = if hand.insurance_bet > 0 {
        let outcome = if dealer_blackjack {
            HandOutcome::Win
        } else {
            HandOutcome::Lose
        };
        payout(outcome, hand.insurance_bet, Wager::Insurance)
    } else {
        0
    };

    // A peeked dealer natural ends the round before the player acts.
    let outcome = if dealer_blackjack {
        if hand.is_blackjack() {
            HandOutcome::Push
        } else {
            HandOutcome::Lose
        }
    } else {
        determine_outcome(hand, dealer)
    };

    Settlement {
        hand_index: index,
        outcome,
        bet: hand.bet,
        credited: payout(outcome, hand.bet, Wager::Main),
        insurance_bet: hand.insurance_bet,
        insurance_credited,
    }
}
