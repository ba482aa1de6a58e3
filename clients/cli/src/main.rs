use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use blackjack::{load_shoe, Action, Game, GamePhase, ShoePolicy, TableConfig};
use clap::builder::FalseyValueParser;
use clap::Parser;
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

mod prompt;
mod render;

use prompt::Prompter;

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

/// Seed used by `--seeded` so sessions can be replayed.
const FIXED_SEED: u64 = 12345;

#[derive(Parser)]
#[command(name = "blackjack-cli", about = "Single-player blackjack in the terminal")]
struct Cli {
    /// Starting bank in chips
    #[arg(long, env = "BLACKJACK_BANK", default_value_t = blackjack::STARTING_BANK)]
    bank: u64,

    /// Minimum bet in chips
    #[arg(long, env = "BLACKJACK_MIN_BET", default_value_t = blackjack::MIN_BET)]
    min_bet: u64,

    /// Seed for the shuffle RNG
    #[arg(long, env = "BLACKJACK_SEED")]
    seed: Option<u64>,

    /// Use the fixed replay seed when no explicit seed is given
    #[arg(long, env = "BLACKJACK_SEEDED", value_parser = FalseyValueParser::new())]
    seeded: bool,

    /// Deal from a prepared shoe file, one card per line (e.g. "AS", "10H")
    #[arg(long, env = "BLACKJACK_SHOE", conflicts_with = "reshuffle_each_round")]
    shoe: Option<PathBuf>,

    /// Shuffle a fresh deck before every round
    #[arg(long)]
    reshuffle_each_round: bool,

    /// Print the table snapshot as JSON after each render
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn table_config(&self) -> TableConfig {
        TableConfig {
            starting_bank: self.bank,
            min_bet: self.min_bet,
            shoe_policy: if self.reshuffle_each_round {
                ShoePolicy::ReshuffleEachRound
            } else {
                ShoePolicy::Continuous
            },
        }
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed.or(self.seeded.then_some(FIXED_SEED)) {
            Some(seed) => {
                log::info!("Shuffling with seed {seed}");
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("blackjack-cli failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), BoxErr> {
    let mut game = Game::with_rng(cli.table_config(), cli.rng());
    if let Some(path) = &cli.shoe {
        let cards = load_shoe(path)?;
        log::info!("Loaded {} cards from {}", cards.len(), path.display());
        game.load_shoe(cards)?;
    }

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    prompter.say("+------------------------------------------+")?;
    prompter.say("|             BLACKJACK CLI GAME           |")?;
    prompter.say("+------------------------------------------+")?;

    play(&mut game, &mut prompter, cli.json)?;

    prompter.say(&format!("\nFinal Bank: {} chips", game.bank()))?;
    prompter.say("Thanks for playing!")?;
    Ok(())
}

/// Rounds until the player quits, input runs out or the bank is empty.
fn play<G, I, O>(game: &mut Game<G>, prompter: &mut Prompter<I, O>, json: bool) -> Result<(), BoxErr>
where
    G: Rng,
    I: BufRead,
    O: Write,
{
    while game.phase() == GamePhase::Betting {
        prompter.say(&format!("\nCurrent Bank: {} chips", game.bank()))?;
        let Some(bet) = prompter.bet(game.config().min_bet, game.bank())? else {
            break;
        };
        if let Err(e) = game.place_bet(bet) {
            prompter.say(&e.to_string())?;
            continue;
        }
        show_state(game, prompter, json)?;

        if game.phase() == GamePhase::Insurance && !offer_insurance(game, prompter)? {
            break;
        }

        if game.phase() == GamePhase::Resolution {
            game.resolve_payouts()?;
            prompter.say("\nDealer has Blackjack!")?;
        } else if !play_hands(game, prompter, json)? {
            break;
        }

        prompter.say(&render::render_results(&game.snapshot()))?;
        if json {
            prompter.say(&serde_json::to_string(&game.snapshot())?)?;
        }

        if game.phase() == GamePhase::GameOver {
            prompter.say("\nYou're out of chips.")?;
            break;
        }
        if prompter.yes_no("\nPlay another hand?")? != Some(true) {
            break;
        }
    }
    Ok(())
}

/// Returns false when input ran out.
fn offer_insurance<G, I, O>(game: &mut Game<G>, prompter: &mut Prompter<I, O>) -> Result<bool, BoxErr>
where
    G: Rng,
    I: BufRead,
    O: Write,
{
    let max = game.max_insurance().min(game.bank());
    if max == 0 {
        game.decline_insurance()?;
        return Ok(true);
    }

    let up_card = game
        .dealer_up_card()
        .map(|card| card.to_string())
        .unwrap_or_default();
    let Some(wants) = prompter.yes_no(&format!("Dealer shows {up_card}. Take insurance?"))? else {
        return Ok(false);
    };
    if wants {
        let Some(amount) = prompter.insurance(max)? else {
            return Ok(false);
        };
        if amount > 0 {
            game.place_insurance(amount)?;
            return Ok(true);
        }
    }
    game.decline_insurance()?;
    Ok(true)
}

/// Drives every player hand to completion. Returns false when input ran out.
fn play_hands<G, I, O>(
    game: &mut Game<G>,
    prompter: &mut Prompter<I, O>,
    json: bool,
) -> Result<bool, BoxErr>
where
    G: Rng,
    I: BufRead,
    O: Write,
{
    while game.phase() == GamePhase::PlayerAction {
        let index = game.active_hand_index();
        let actions = game.available_actions();

        let action = if actions.iter().all(|action| *action == Action::Stand) {
            match game.active_hand() {
                Some(hand) if hand.is_blackjack() => prompter.say("\nBlackjack!")?,
                Some(hand) if hand.value() == 21 => prompter.say("\n21!")?,
                _ => {}
            }
            Action::Stand
        } else {
            let count = game.player_hands().len();
            match prompter.action(&actions, index, count)? {
                Some(action) => action,
                None => return Ok(false),
            }
        };

        if let Err(e) = game.player_action(action) {
            prompter.say(&e.to_string())?;
            continue;
        }
        if game.player_hands().get(index).is_some_and(|hand| hand.is_bust()) {
            prompter.say("BUST!")?;
        }
        if game.phase() == GamePhase::PlayerAction {
            show_state(game, prompter, json)?;
        }
    }
    Ok(true)
}

fn show_state<G, I, O>(game: &Game<G>, prompter: &mut Prompter<I, O>, json: bool) -> Result<(), BoxErr>
where
    G: Rng,
    I: BufRead,
    O: Write,
{
    let snapshot = game.snapshot();
    prompter.say(&format!("\n{}", render::render_state(&snapshot)))?;
    if json {
        prompter.say(&serde_json::to_string(&snapshot)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack::Card;
    use std::io::Cursor;

    fn rigged_game(tokens: &[&str]) -> Game {
        let cards: Vec<Card> = tokens.iter().map(|t| t.parse().unwrap()).collect();
        let mut game = Game::seeded(TableConfig::default(), 1);
        game.load_shoe(cards).unwrap();
        game
    }

    fn run_session(game: &mut Game, input: &str) -> String {
        let mut output = Vec::new();
        {
            let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), &mut output);
            play(game, &mut prompter, false).unwrap();
        }
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_session_stand_and_quit() {
        let mut game = rigged_game(&["10S", "9C", "10H", "8C"]);
        let out = run_session(&mut game, "100\ns\nn\n");
        assert!(out.contains("Win! Pays 100 chips"));
        assert_eq!(game.bank(), 1100);
    }

    #[test]
    fn test_session_auto_stands_blackjack() {
        let mut game = rigged_game(&["AS", "KC", "KH", "QC"]);
        let out = run_session(&mut game, "100\nn\n");
        assert!(out.contains("Blackjack!"));
        assert!(out.contains("BLACKJACK! Wins 150 chips"));
        assert_eq!(game.bank(), 1150);
    }

    #[test]
    fn test_session_insurance_against_natural() {
        let mut game = rigged_game(&["KS", "KD", "10H", "AC"]);
        let out = run_session(&mut game, "100\ny\n50\nn\n");
        assert!(out.contains("Dealer shows A♣. Take insurance?"));
        assert!(out.contains("Dealer has Blackjack!"));
        assert_eq!(game.bank(), 1000);
    }

    #[test]
    fn test_session_insurance_auto_declined_when_broke() {
        let config = TableConfig {
            starting_bank: 100,
            ..TableConfig::default()
        };
        let cards: Vec<Card> = ["KS", "2D", "10H", "AC", "5C"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        let mut game = Game::seeded(config, 1);
        game.load_shoe(cards).unwrap();

        let out = run_session(&mut game, "100\ns\nn\n");
        assert!(!out.contains("Take insurance?"));
        assert_eq!(game.bank(), 200);
    }

    #[test]
    fn test_session_ends_on_game_over() {
        let config = TableConfig {
            starting_bank: 100,
            ..TableConfig::default()
        };
        let mut game = Game::seeded(config, 1);
        game.load_shoe(
            ["10S", "9C", "6H", "9D"]
                .iter()
                .map(|t| t.parse().unwrap())
                .collect(),
        )
        .unwrap();

        let out = run_session(&mut game, "100\ns\n");
        assert!(out.contains("You're out of chips."));
        assert!(!out.contains("Play another hand?"));
        assert_eq!(game.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_session_eof_mid_round() {
        let mut game = rigged_game(&["10S", "9C", "10H", "8C"]);
        run_session(&mut game, "100\n");
        assert_eq!(game.phase(), GamePhase::PlayerAction);
        assert_eq!(game.bank(), 900);
    }

    /// Flags fall back to these variables, so a developer's `.env` must not leak in.
    fn clear_cli_env() {
        for var in [
            "BLACKJACK_BANK",
            "BLACKJACK_MIN_BET",
            "BLACKJACK_SEED",
            "BLACKJACK_SEEDED",
            "BLACKJACK_SHOE",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_cli_defaults_and_seed_precedence() {
        clear_cli_env();
        let cli = Cli::parse_from(["blackjack-cli", "--seeded", "--seed", "7"]);
        assert_eq!(cli.table_config(), TableConfig::default());

        let mut explicit = cli.rng();
        let mut expected = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(explicit.gen::<u64>(), expected.gen::<u64>());

        let cli = Cli::parse_from(["blackjack-cli", "--seeded", "--reshuffle-each-round"]);
        assert_eq!(cli.table_config().shoe_policy, ShoePolicy::ReshuffleEachRound);
        let mut fixed = cli.rng();
        let mut expected = ChaCha8Rng::seed_from_u64(FIXED_SEED);
        assert_eq!(fixed.gen::<u64>(), expected.gen::<u64>());
    }

    #[test]
    fn test_cli_shoe_conflicts_with_reshuffle() {
        clear_cli_env();
        let parsed = Cli::try_parse_from([
            "blackjack-cli",
            "--shoe",
            "cards.txt",
            "--reshuffle-each-round",
        ]);
        assert!(parsed.is_err());
    }
}
