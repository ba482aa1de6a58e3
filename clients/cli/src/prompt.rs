use std::io::{self, BufRead, Write};

use blackjack::Action;

use crate::render::render_actions;

/// Line-based prompts over any reader/writer pair. Every prompt re-asks on bad input and
/// returns `Ok(None)` once the input is exhausted.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_lowercase()))
    }

    pub fn bet(&mut self, min: u64, bank: u64) -> io::Result<Option<u64>> {
        loop {
            let Some(input) = self.ask(&format!("Enter bet ({min}-{bank}): "))? else {
                return Ok(None);
            };
            match input.parse::<u64>() {
                Ok(bet) if bet < min => self.say(&format!("Minimum bet is {min}."))?,
                Ok(bet) if bet > bank => {
                    self.say(&format!("Bet exceeds bank balance ({bank})."))?
                }
                Ok(bet) => return Ok(Some(bet)),
                Err(_) => self.say("Invalid input. Please enter a number.")?,
            }
        }
    }

    pub fn yes_no(&mut self, question: &str) -> io::Result<Option<bool>> {
        loop {
            let Some(input) = self.ask(&format!("{question} (y/n): "))? else {
                return Ok(None);
            };
            match input.as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => self.say("Invalid input. Please enter 'y' or 'n'.")?,
            }
        }
    }

    pub fn insurance(&mut self, max: u64) -> io::Result<Option<u64>> {
        loop {
            let Some(input) = self.ask(&format!("Insurance bet (0-{max}): "))? else {
                return Ok(None);
            };
            match input.parse::<u64>() {
                Ok(amount) if amount > max => {
                    self.say(&format!("Insurance bet cannot exceed {max}."))?
                }
                Ok(amount) => return Ok(Some(amount)),
                Err(_) => self.say("Invalid input. Please enter a number.")?,
            }
        }
    }

    /// Ask for one of `actions` on hand `hand_index` of `hand_count`.
    pub fn action(
        &mut self,
        actions: &[Action],
        hand_index: usize,
        hand_count: usize,
    ) -> io::Result<Option<Action>> {
        let prompt = format!("{}: ", render_actions(actions, hand_index, hand_count));
        loop {
            let Some(input) = self.ask(&prompt)? else {
                return Ok(None);
            };
            match input.parse::<Action>() {
                Ok(action) if actions.contains(&action) => return Ok(Some(action)),
                Ok(_) => self.say("Action not available. Please choose from available actions.")?,
                Err(_) => self.say("Invalid action. Please try again.")?,
            }
        }
    }
}
