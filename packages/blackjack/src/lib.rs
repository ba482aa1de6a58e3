mod card;
mod dealer;
mod error;
mod game_state;
mod hand;
mod rules;
mod shoe;

pub use card::{Card, Rank, Suit};
pub use dealer::{dealer_play, dealer_should_draw, peek_for_blackjack};
pub use error::{GameError, ParseCardError, ShoeError};
pub use game_state::{Action, Game, GamePhase, GameSnapshot, Settlement};
pub use hand::{calculate_hand_value, can_split_cards, hand_totals, is_busted, Hand, Totals};
pub use rules::{
    determine_outcome, payout, HandOutcome, PayoutRatio, ShoePolicy, TableConfig, Wager,
    BLACKJACK_PAYOUT, DEALER_STANDS_ON, INSURANCE_PAYOUT, MAX_HANDS, MIN_BET, STARTING_BANK,
};
pub use shoe::{draw, load_shoe, new_deck, parse_shoe, shuffle, Shoe};
