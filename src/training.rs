use crate::battle::{Battle, BattleOutcome, Side, Trainer, DEFAULT_TURN_LIMIT};
use crate::error::Result;
use crate::learning::{BattleState, GreedyPolicy, LearningStrategy, Transition, ValueEstimator};
use crate::pokemon::{Pokemon, Volatile};
use crate::random::BattleRng;
use crate::strategy::RandomStrategy;
use crate::types::TypeChart;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;

/// Supplies freshly initialised combatants for each episode.
pub trait CombatantSource {
    fn generate_pair(&self, rng: &mut dyn BattleRng) -> Result<(Pokemon, Pokemon)>;
}

#[derive(Clone, Debug)]
pub struct TrainingOptions {
    pub episodes: usize,
    pub turn_limit: Option<u32>,
    /// Log a progress line every this many episodes; 0 disables it.
    pub log_every: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            episodes: 1000,
            turn_limit: Some(DEFAULT_TURN_LIMIT),
            log_every: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BattleRecord {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl BattleRecord {
    pub fn record(&mut self, outcome: BattleOutcome) {
        match outcome {
            BattleOutcome::AWins => self.wins += 1,
            BattleOutcome::BWins => self.losses += 1,
            BattleOutcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    /// Wins plus half the draws, over all battles.
    pub fn win_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.wins as f64 + 0.5 * self.draws as f64) / self.total() as f64
    }
}

impl<E: ValueEstimator> LearningStrategy<E> {
    /// Trains against a random sparring partner for `options.episodes`
    /// episodes.
    pub fn train<G: CombatantSource + ?Sized>(
        &mut self,
        chart: &Arc<TypeChart>,
        source: &G,
        options: &TrainingOptions,
        rng: &mut dyn BattleRng,
    ) -> Result<BattleRecord> {
        self.training = true;
        let result = self.run_episodes(chart, source, options, rng);
        self.training = false;
        self.pending = None;
        result
    }

    fn run_episodes<G: CombatantSource + ?Sized>(
        &mut self,
        chart: &Arc<TypeChart>,
        source: &G,
        options: &TrainingOptions,
        rng: &mut dyn BattleRng,
    ) -> Result<BattleRecord> {
        let mut record = BattleRecord::default();
        for episode in 1..=options.episodes {
            let (own, sparring) = source.generate_pair(rng)?;
            record.record(self.run_episode(chart, own, sparring, options.turn_limit, rng)?);
            if options.log_every > 0 && episode % options.log_every == 0 {
                info!(
                    "episode {episode}/{}: win rate {:.3}",
                    options.episodes,
                    record.win_rate()
                );
            }
        }
        Ok(record)
    }

    /// Plays one battle, updating the value function after every round.
    pub fn run_episode(
        &mut self,
        chart: &Arc<TypeChart>,
        own: Pokemon,
        sparring: Pokemon,
        turn_limit: Option<u32>,
        rng: &mut dyn BattleRng,
    ) -> Result<BattleOutcome> {
        let was_training = self.training;
        self.training = true;
        let mut battle = Battle::new(
            Arc::clone(chart),
            Trainer::new("self", own, &mut *self),
            Trainer::new("sparring partner", sparring, RandomStrategy),
        )?
        .with_turn_limit(turn_limit);

        let mut state = BattleState::capture(battle.pokemon(Side::A), battle.pokemon(Side::B));
        while !battle.finished() {
            let forced = battle
                .queued(Side::A)
                .filter(|_| battle.pokemon(Side::A).has(Volatile::Charging));
            let action = match forced {
                Some(index) => index,
                None => {
                    let learner = &mut battle.trainer_a_mut().strategy;
                    let index = learner.choose_move(&state, true, rng);
                    learner.pending = Some(index);
                    index
                }
            };

            battle.play_turn(rng)?;

            let next = BattleState::capture(battle.pokemon(Side::A), battle.pokemon(Side::B));
            let learner = &mut battle.trainer_a_mut().strategy;
            let reward = learner.reward(&state, &next, chart);
            let transition = Transition {
                state,
                action,
                reward,
                next,
            };
            learner.learn(&transition, rng);
            state = transition.next;
        }
        let outcome = battle.outcome().unwrap_or(BattleOutcome::Draw);
        drop(battle);

        self.training = was_training;
        self.pending = None;
        self.episodes_trained += 1;
        Ok(outcome)
    }
}

/// Plays `battles` greedy-policy battles against [`RandomStrategy`] in
/// parallel. Battle `i` is seeded from `seed` and `i` alone.
pub fn evaluate<E, G>(
    learner: &LearningStrategy<E>,
    chart: &Arc<TypeChart>,
    source: &G,
    battles: usize,
    seed: u64,
    turn_limit: Option<u32>,
) -> Result<BattleRecord>
where
    E: ValueEstimator + Sync,
    G: CombatantSource + Sync + ?Sized,
{
    let outcomes: Vec<BattleOutcome> = (0..battles)
        .into_par_iter()
        .map(|idx| {
            let mut rng = SmallRng::seed_from_u64(seed ^ (idx as u64).wrapping_mul(0x9E3779B97F4A7C15));
            let (own, foe) = source.generate_pair(&mut rng)?;
            let mut battle = Battle::new(
                Arc::clone(chart),
                Trainer::new("learner", own, GreedyPolicy::new(learner)),
                Trainer::new("random", foe, RandomStrategy),
            )?
            .with_turn_limit(turn_limit);
            battle.run(&mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut record = BattleRecord::default();
    for outcome in outcomes {
        record.record(outcome);
    }
    Ok(record)
}
