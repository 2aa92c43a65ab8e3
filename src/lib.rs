pub mod battle;
pub mod data;
pub mod error;
pub mod generator;
pub mod learning;
pub mod model;
pub mod pokemon;
pub mod random;
pub mod strategy;
pub mod training;
pub mod types;

use crate::battle::{Battle, BattleOutcome, Trainer, DEFAULT_TURN_LIMIT};
use crate::data::Catalog;
use crate::generator::PokemonGenerator;
use crate::learning::{
    ApproximateQLearning, LearningParams, LearningStrategy, LinearEstimator, QTable,
    TabularQLearning, ValueEstimator,
};
use crate::random::BattleRng;
use crate::strategy::{InteractiveStrategy, RandomStrategy, StdinPrompt, Strategy};
use crate::training::{evaluate, BattleRecord, CombatantSource, TrainingOptions};
use anyhow::Context;
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One battle, printed turn by turn at debug level.
    Battle,
    /// Train a learner, then evaluate it against a random opponent.
    Train,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnerKind {
    Tabular,
    Linear,
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub data_dir: PathBuf,
    pub mode: Mode,
    pub learner: LearnerKind,
    pub episodes: usize,
    pub eval_battles: usize,
    pub seed: u64,
    pub turn_limit: Option<u32>,
    pub params: LearningParams,
    pub interactive: bool,
    pub weights_in: Option<PathBuf>,
    pub weights_out: Option<PathBuf>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            mode: Mode::Battle,
            learner: LearnerKind::Linear,
            episodes: 1000,
            eval_battles: 200,
            seed: 0,
            turn_limit: Some(DEFAULT_TURN_LIMIT),
            params: LearningParams::default(),
            interactive: false,
            weights_in: None,
            weights_out: None,
        }
    }
}

/// Reads linear weights stored as a JSON object of `index -> weight`.
pub fn read_weights(path: &Path) -> anyhow::Result<HashMap<usize, f64>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read weights file at {}", path.display()))?;
    let weights: HashMap<usize, f64> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    Ok(weights)
}

pub fn write_weights(path: &Path, weights: &HashMap<usize, f64>) -> anyhow::Result<()> {
    let ordered: BTreeMap<usize, f64> = weights.iter().map(|(k, v)| (*k, *v)).collect();
    let raw = serde_json::to_string_pretty(&ordered)?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write weights to {}", path.display()))?;
    Ok(())
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    let catalog = Catalog::load(&opts.data_dir)?;
    let generator = PokemonGenerator::new(&catalog)?;
    let mut rng = SmallRng::seed_from_u64(opts.seed);
    match opts.mode {
        Mode::Battle => run_battle(&opts, &catalog, &generator, &mut rng),
        Mode::Train => run_training(&opts, &catalog, &generator, &mut rng),
    }
}

fn run_battle(
    opts: &CliOptions,
    catalog: &Catalog,
    generator: &PokemonGenerator,
    rng: &mut dyn BattleRng,
) -> anyhow::Result<()> {
    let (own, foe) = generator.generate_pair(rng)?;
    let (name, strategy): (&str, Box<dyn Strategy>) = if opts.interactive {
        ("You", Box::new(InteractiveStrategy::new(StdinPrompt)) as Box<dyn Strategy>)
    } else if let Some(path) = &opts.weights_in {
        let mut learner = ApproximateQLearning::new(
            opts.params.clone(),
            LinearEstimator::new(catalog.type_chart.clone()),
        );
        learner.load_weights(read_weights(path)?);
        ("Learner", Box::new(learner) as Box<dyn Strategy>)
    } else {
        ("Random", Box::new(RandomStrategy) as Box<dyn Strategy>)
    };

    let mut battle = Battle::new(
        catalog.type_chart.clone(),
        Trainer::new(name, own, strategy),
        Trainer::new("Random", foe, RandomStrategy),
    )?
    .with_turn_limit(opts.turn_limit);
    let outcome = battle.run(rng)?;
    match outcome {
        BattleOutcome::AWins => println!(
            "{} ({}) wins after {} turns",
            battle.trainer_a().name,
            battle.trainer_a().pokemon.nickname(),
            battle.turn_count()
        ),
        BattleOutcome::BWins => println!(
            "{} ({}) wins after {} turns",
            battle.trainer_b().name,
            battle.trainer_b().pokemon.nickname(),
            battle.turn_count()
        ),
        BattleOutcome::Draw => println!("Draw after {} turns", battle.turn_count()),
    }
    Ok(())
}

fn run_training(
    opts: &CliOptions,
    catalog: &Catalog,
    generator: &PokemonGenerator,
    rng: &mut dyn BattleRng,
) -> anyhow::Result<()> {
    if opts.episodes == 0 {
        anyhow::bail!("--episodes must be > 0");
    }
    match opts.learner {
        LearnerKind::Tabular => {
            if opts.weights_in.is_some() || opts.weights_out.is_some() {
                warn!("Weight files only apply to the linear learner; ignoring them");
            }
            let mut learner = TabularQLearning::new(opts.params.clone(), QTable::default());
            let record = train_and_evaluate(&mut learner, opts, catalog, generator, rng)?;
            info!("Q-table holds {} entries", learner.estimator().len());
            report(&record, opts.eval_battles);
        }
        LearnerKind::Linear => {
            let mut learner = ApproximateQLearning::new(
                opts.params.clone(),
                LinearEstimator::new(catalog.type_chart.clone()),
            );
            if let Some(path) = &opts.weights_in {
                learner.load_weights(read_weights(path)?);
            }
            let record = train_and_evaluate(&mut learner, opts, catalog, generator, rng)?;
            report(&record, opts.eval_battles);
            if let Some(path) = &opts.weights_out {
                write_weights(path, learner.estimator().weights())?;
                println!("Wrote weights to {}", path.display());
            }
        }
    }
    Ok(())
}

fn train_and_evaluate<E: ValueEstimator + Sync>(
    learner: &mut LearningStrategy<E>,
    opts: &CliOptions,
    catalog: &Catalog,
    generator: &PokemonGenerator,
    rng: &mut dyn BattleRng,
) -> anyhow::Result<BattleRecord> {
    let options = TrainingOptions {
        episodes: opts.episodes,
        turn_limit: opts.turn_limit,
        ..TrainingOptions::default()
    };
    let training = learner.train(&catalog.type_chart, generator, &options, rng)?;
    info!(
        "Trained {} episodes, training win rate {:.3}",
        learner.episodes_trained(),
        training.win_rate()
    );
    let record = evaluate(
        learner,
        &catalog.type_chart,
        generator,
        opts.eval_battles,
        opts.seed,
        opts.turn_limit,
    )?;
    Ok(record)
}

fn report(record: &BattleRecord, battles: usize) {
    println!(
        "Evaluation over {battles} battles: {} wins, {} losses, {} draws (win rate {:.3})",
        record.wins,
        record.losses,
        record.draws,
        record.win_rate()
    );
}
