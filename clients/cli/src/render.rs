use std::fmt::Write;

use blackjack::{Action, Card, GameSnapshot, HandOutcome};

const CONTENT_WIDTH: usize = 41;
const BORDER: &str = "+------------------------------------------+";

/// Writes `content` inside the box, wrapping at spaces onto indented continuation rows.
fn boxed(out: &mut String, content: &str) {
    let mut row = String::new();
    for word in content.split(' ') {
        let used = row.chars().count();
        if used > 0 && used + 1 + word.chars().count() > CONTENT_WIDTH {
            boxed_row(out, &row);
            row = String::from("  ");
        } else if used > 0 {
            row.push(' ');
        }
        row.push_str(word);
    }
    boxed_row(out, &row);
}

fn boxed_row(out: &mut String, row: &str) {
    let chars: Vec<char> = row.chars().collect();
    for chunk in chars.chunks(CONTENT_WIDTH) {
        let chunk: String = chunk.iter().collect();
        // Padding counts chars, so suit symbols line up.
        let _ = writeln!(out, "| {chunk:<CONTENT_WIDTH$}|");
    }
}

fn card_list(cards: &[Card]) -> String {
    let labels: Vec<String> = cards.iter().map(Card::to_string).collect();
    labels.join(", ")
}

fn hand_label(index: usize, count: usize) -> String {
    if count > 1 {
        format!("Hand {}/{}: ", index + 1, count)
    } else {
        String::new()
    }
}

/// The table: dealer row, one row per player hand, bank row.
pub fn render_state(snapshot: &GameSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{BORDER}");

    let dealer = if snapshot.dealer_hole_hidden {
        format!("Dealer: [??, {}]", card_list(&snapshot.dealer_cards))
    } else {
        match snapshot.dealer_value {
            Some(value) => format!("Dealer: [{}] ({value})", card_list(&snapshot.dealer_cards)),
            None => "Dealer: []".to_string(),
        }
    };
    boxed(&mut out, &dealer);

    let count = snapshot.player_hands.len();
    for (index, hand) in snapshot.player_hands.iter().enumerate() {
        let marker = if count > 1 && snapshot.active_hand_index == Some(index) {
            "> "
        } else {
            ""
        };
        let mut line = if count > 1 {
            format!("{marker}You (Hand {}/{count}): {hand}", index + 1)
        } else {
            format!("You: {hand}")
        };
        if hand.is_bust() {
            line.push_str(" (BUST)");
        } else {
            let _ = write!(line, " ({})", hand.value());
        }
        if hand.surrendered {
            line.push_str(" [SURRENDERED]");
        }
        boxed(&mut out, &line);
    }

    let wagered = snapshot
        .player_hands
        .iter()
        .map(|hand| hand.bet)
        .fold(0u64, u64::saturating_add);
    boxed(&mut out, &format!("Bank: {:<10} Bet: {wagered}", snapshot.bank));
    out.push_str(BORDER);
    out
}

pub fn render_actions(actions: &[Action], hand_index: usize, hand_count: usize) -> String {
    let labels: Vec<&str> = actions
        .iter()
        .map(|action| match action {
            Action::Hit => "(H)it",
            Action::Stand => "(S)tand",
            Action::Double => "(D)ouble",
            Action::Split => "s(P)lit",
            Action::Surrender => "su(R)render",
        })
        .collect();

    let prefix = if hand_count > 1 {
        format!("Hand {}/{} ", hand_index + 1, hand_count)
    } else {
        String::new()
    };
    format!("{prefix}Action: {}", labels.join(", "))
}

/// Revealed table followed by one line per settled stake.
pub fn render_results(snapshot: &GameSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", render_state(snapshot));
    let _ = writeln!(out, "\nResults:");

    let count = snapshot.settlements.len();
    for settlement in &snapshot.settlements {
        let label = hand_label(settlement.hand_index, count);
        if settlement.insurance_bet > 0 {
            if settlement.insurance_credited > 0 {
                let won = settlement
                    .insurance_credited
                    .saturating_sub(settlement.insurance_bet);
                let _ = writeln!(out, "  {label}Insurance pays {won} chips");
            } else {
                let _ = writeln!(out, "  {label}Insurance loses {} chips", settlement.insurance_bet);
            }
        }

        let winnings = settlement.credited.saturating_sub(settlement.bet);
        let _ = match settlement.outcome {
            HandOutcome::Blackjack => writeln!(out, "  {label}BLACKJACK! Wins {winnings} chips"),
            HandOutcome::Win => writeln!(out, "  {label}Win! Pays {winnings} chips"),
            HandOutcome::Push => writeln!(out, "  {label}Push! Returns {} chips", settlement.credited),
            HandOutcome::Lose => writeln!(out, "  {label}Lose! Loses {} chips", settlement.bet),
            HandOutcome::Surrender => {
                writeln!(out, "  {label}Surrender! Returns {} chips", settlement.credited)
            }
        };
    }

    let _ = write!(out, "\nBank: {} chips", snapshot.bank);
    out
}
