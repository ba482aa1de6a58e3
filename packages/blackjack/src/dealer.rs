use crate::rules::DEALER_STANDS_ON;
use crate::shoe::Shoe;
use crate::{Card, Hand};

/// True iff the two dealer cards form a natural.
///
/// Only meaningful when the visible card is an Ace or worth 10; checking that is up to the caller.
pub fn peek_for_blackjack(up_card: Card, down_card: Card) -> bool {
    Hand::from_cards(0, &[up_card, down_card]).is_blackjack()
}

/// S17: draw below 17, stand on every 17 including soft.
pub fn dealer_should_draw(hand: &Hand) -> bool {
    hand.value() < DEALER_STANDS_ON
}

/// Plays the dealer hand out from the shoe. Stops early if the shoe runs dry.
pub fn dealer_play(shoe: &mut Shoe, hand: &mut Hand) {
    while dealer_should_draw(hand) {
        match shoe.draw_card() {
            Some(card) => hand.add_card(card),
            None => {
                log::warn!("shoe exhausted while dealer drawing at {}", hand.value());
                break;
            }
        }
    }
}
