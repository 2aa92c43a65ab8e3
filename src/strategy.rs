use crate::pokemon::Pokemon;
use crate::random::BattleRng;
use log::warn;
use std::io::{self, BufRead, Write};

/// Decides which move a trainer's combatant uses this round.
pub trait Strategy {
    /// Returns an index into `own.moves()`. Neither combatant may be mutated.
    fn pick_move(&mut self, own: &Pokemon, opponent: &Pokemon, rng: &mut dyn BattleRng) -> usize;
}

impl<S: Strategy + ?Sized> Strategy for &mut S {
    fn pick_move(&mut self, own: &Pokemon, opponent: &Pokemon, rng: &mut dyn BattleRng) -> usize {
        (**self).pick_move(own, opponent, rng)
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn pick_move(&mut self, own: &Pokemon, opponent: &Pokemon, rng: &mut dyn BattleRng) -> usize {
        (**self).pick_move(own, opponent, rng)
    }
}

/// Uniform choice over the current move set.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomStrategy;

impl Strategy for RandomStrategy {
    fn pick_move(&mut self, own: &Pokemon, _opponent: &Pokemon, rng: &mut dyn BattleRng) -> usize {
        rng.index(own.moves().len())
    }
}

/// Source of human move choices.
pub trait MovePrompt {
    /// `options` is the labelled move list; the answer is 1-based.
    fn prompt(&mut self, own: &Pokemon, opponent: &Pokemon, options: &[String]) -> usize;
}

/// Reads the choice from standard input. A closed or unreadable stdin
/// answers 0, which the battle rejects as an invalid selection.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinPrompt;

impl MovePrompt for StdinPrompt {
    fn prompt(&mut self, own: &Pokemon, opponent: &Pokemon, options: &[String]) -> usize {
        println!(
            "{} ({}/{} HP) vs {} ({}/{} HP)",
            own.nickname(),
            own.hp(),
            own.stats().total_hp,
            opponent.nickname(),
            opponent.hp(),
            opponent.stats().total_hp
        );
        println!("Please select a move:");
        for (idx, label) in options.iter().enumerate() {
            println!("{}. {label}", idx + 1);
        }
        let stdin = io::stdin();
        loop {
            print!("> ");
            if let Err(err) = io::stdout().flush() {
                warn!("Failed to flush the move prompt: {err}");
            }
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => {
                    warn!("stdin closed before a move was chosen");
                    return 0;
                }
                Err(err) => {
                    warn!("Failed to read a move choice: {err}");
                    return 0;
                }
                Ok(_) => {}
            }
            match line.trim().parse::<usize>() {
                Ok(choice) if (1..=options.len()).contains(&choice) => return choice,
                _ => println!("Enter a number between 1 and {}", options.len()),
            }
        }
    }
}

/// Defers every decision to a [`MovePrompt`].
pub struct InteractiveStrategy<P> {
    prompt: P,
}

impl<P: MovePrompt> InteractiveStrategy<P> {
    pub fn new(prompt: P) -> Self {
        InteractiveStrategy { prompt }
    }
}

impl<P: MovePrompt> Strategy for InteractiveStrategy<P> {
    fn pick_move(&mut self, own: &Pokemon, opponent: &Pokemon, _rng: &mut dyn BattleRng) -> usize {
        let options: Vec<String> = own.moves().iter().map(|m| m.display_name()).collect();
        // An answer of 0 maps to an out-of-range index.
        self.prompt
            .prompt(own, opponent, &options)
            .checked_sub(1)
            .unwrap_or(usize::MAX)
    }
}
