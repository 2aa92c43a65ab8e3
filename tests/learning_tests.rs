mod common;

use common::{make_mon, make_move, species, FixedRng};
use pokemon_battle_learner::battle::{Battle, Side, Trainer};
use pokemon_battle_learner::error::BattleError;
use pokemon_battle_learner::generator::{Matchup, PokemonGenerator, MAX_MOVES};
use pokemon_battle_learner::learning::{
    terminal_reward, ApproximateQLearning, BattleState, LearningParams, LinearEstimator, QTable,
    RewardShaping, TabularQLearning, Transition, ValueEstimator, FEATURE_COUNT, TERMINAL_REWARD,
};
use pokemon_battle_learner::model::MoveInfo;
use pokemon_battle_learner::pokemon::Pokemon;
use pokemon_battle_learner::random::BattleRng;
use pokemon_battle_learner::strategy::{RandomStrategy, Strategy};
use pokemon_battle_learner::types::{Type, TypeChart};
use pokemon_battle_learner::training::{evaluate, TrainingOptions};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;

fn chart() -> Arc<TypeChart> {
    Arc::new(TypeChart::gen1())
}

fn params() -> LearningParams {
    LearningParams {
        alpha: 0.1,
        gamma: 0.9,
        ..LearningParams::default()
    }
}

/// Always uses the same move slot.
struct Slot(usize);

impl Strategy for Slot {
    fn pick_move(&mut self, _own: &Pokemon, _opponent: &Pokemon, _rng: &mut dyn BattleRng) -> usize {
        self.0
    }
}

fn opening_mons() -> (Pokemon, Pokemon) {
    let own = make_mon(
        "Bob",
        &[Type::Water],
        60,
        vec![
            make_move("tackle", Type::Normal, 40, Some(1.0)),
            make_move("surf", Type::Water, 90, Some(1.0)),
        ],
    );
    let opponent = make_mon("Mary", &[Type::Fire], 60, vec![make_move("ember", Type::Fire, 40, Some(1.0))]);
    (own, opponent)
}

fn opening_state() -> BattleState {
    let (own, opponent) = opening_mons();
    BattleState::capture(&own, &opponent)
}

fn fainted_opponent(state: &BattleState) -> BattleState {
    let mut next = state.clone();
    next.opponent.hp = 0;
    next
}

fn moves_of(power: &[u32]) -> Vec<Arc<MoveInfo>> {
    power
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let mut info = make_move(&format!("move-{idx}"), Type::Normal, *p, Some(1.0));
            info.id = idx as u32 + 1;
            Arc::new(info)
        })
        .collect()
}

fn generator() -> PokemonGenerator {
    let pool = vec![
        species("squirtle", &[Type::Water], moves_of(&[40, 90, 0])),
        species("charmander", &[Type::Fire], moves_of(&[40, 60, 0, 120, 15])),
        species("bulbasaur", &[Type::Grass, Type::Poison], moves_of(&[40, 55])),
        species("magikarp", &[Type::Water], moves_of(&[0])),
    ];
    PokemonGenerator::from_species(pool, chart()).unwrap()
}

#[test]
fn terminal_reward_follows_faints() {
    let state = opening_state();
    assert_eq!(terminal_reward(&state, &state), 0.0);
    assert_eq!(terminal_reward(&state, &fainted_opponent(&state)), TERMINAL_REWARD);

    let mut lost = state.clone();
    lost.own.hp = 0;
    assert_eq!(terminal_reward(&state, &lost), -TERMINAL_REWARD);

    let mut both = lost.clone();
    both.opponent.hp = 0;
    assert_eq!(terminal_reward(&state, &both), 0.0);
}

#[test]
fn linear_update_from_zero_weights_scales_features() {
    let mut learner = ApproximateQLearning::new(params(), LinearEstimator::new(chart()));
    let state = opening_state();
    let transition = Transition {
        state: state.clone(),
        action: 1,
        reward: TERMINAL_REWARD,
        next: fainted_opponent(&state),
    };
    let features = learner
        .estimator()
        .features(&state, state.own.moves[1].info());

    let delta = learner.learn(&transition, &mut FixedRng::default());
    assert_eq!(delta, TERMINAL_REWARD);
    for (idx, feature) in features.iter().enumerate().take(FEATURE_COUNT) {
        let expected = 0.1 * TERMINAL_REWARD * feature;
        assert!((learner.estimator().weight(idx) - expected).abs() < 1e-12);
    }
}

#[test]
fn linear_update_after_a_played_round() {
    let (own, opponent) = opening_mons();
    let mut battle = Battle::new(
        chart(),
        Trainer::new("Learner", own, Slot(1)),
        Trainer::new("Rival", opponent, RandomStrategy),
    )
    .unwrap();
    let mut rng = FixedRng::default();
    let before = BattleState::capture(battle.pokemon(Side::A), battle.pokemon(Side::B));
    // Surf: floor(232.8) = 232 halved, enough to faint a 100 HP fire type.
    battle.play_turn(&mut rng).unwrap();
    let after = BattleState::capture(battle.pokemon(Side::A), battle.pokemon(Side::B));
    assert!(after.opponent.is_fainted());

    let reward = terminal_reward(&before, &after);
    assert_eq!(reward, TERMINAL_REWARD);

    let mut learner = ApproximateQLearning::new(params(), LinearEstimator::new(chart()));
    let features = learner
        .estimator()
        .features(&before, before.own.moves[1].info());
    let transition = Transition {
        state: before,
        action: 1,
        reward,
        next: after,
    };
    // Zero weights value every move at 0, so delta is the reward alone.
    let delta = learner.learn(&transition, &mut rng);
    assert_eq!(delta, TERMINAL_REWARD);
    for (idx, feature) in features.iter().enumerate().take(FEATURE_COUNT) {
        let expected = 0.1 * TERMINAL_REWARD * feature;
        assert!((learner.estimator().weight(idx) - expected).abs() < 1e-12);
    }
}

#[test]
fn tabular_update_moves_toward_target() {
    let mut learner = TabularQLearning::new(params(), QTable::default());
    let state = opening_state();
    let transition = Transition {
        state: state.clone(),
        action: 0,
        reward: TERMINAL_REWARD,
        next: fainted_opponent(&state),
    };
    learner.learn(&transition, &mut FixedRng::default());
    assert_eq!(learner.estimator().len(), 1);
    let value = learner.value(&state, 0);
    assert!((value - 1.0).abs() < 1e-12);
    assert_eq!(learner.value(&state, 1), 0.0);

    learner.learn(&transition, &mut FixedRng::default());
    assert!((learner.value(&state, 0) - 1.9).abs() < 1e-12);
}

#[test]
fn fainted_learner_is_worth_nothing() {
    let mut learner = ApproximateQLearning::new(params(), LinearEstimator::new(chart()));
    learner.load_weights(HashMap::from([(4, 5.0)]));
    let state = opening_state();
    let live = learner.value(&state, 1);
    assert!(live > 0.0);

    // A won state is terminal but still valued by the estimator.
    let won = fainted_opponent(&state);
    assert!(won.is_terminal());
    assert_eq!(learner.value(&won, 1), live);

    let mut lost = state.clone();
    lost.own.hp = 0;
    assert_eq!(learner.value(&lost, 1), 0.0);
}

#[test]
fn greedy_choice_follows_weights() {
    let mut learner = ApproximateQLearning::new(
        LearningParams {
            epsilon: 0.0,
            ..params()
        },
        LinearEstimator::new(chart()),
    );
    // Reward raw power.
    learner.load_weights(HashMap::from([(4, 1.0)]));
    let state = opening_state();
    let mut rng = SmallRng::seed_from_u64(5);
    for _ in 0..50 {
        assert_eq!(learner.best_move(&state, &mut rng), 1);
        assert_eq!(learner.choose_move(&state, true, &mut rng), 1);
    }
}

#[test]
fn linear_estimate_is_dot_product() {
    let mut estimator = LinearEstimator::new(chart());
    estimator.load_weights(HashMap::from([(0, 2.0), (4, -1.0)]));
    let state = opening_state();
    let surf = state.own.moves[1].info();
    let features = estimator.features(&state, surf);
    assert_eq!(features[0], 1.0);
    // Water into Fire.
    assert_eq!(features[3], 0.5);
    let expected = 2.0 * features[0] - features[4];
    assert!((estimator.estimate(&state, surf) - expected).abs() < 1e-12);
}

#[test]
fn training_counts_episodes_and_resets_mode() {
    let mut learner = TabularQLearning::new(params(), QTable::default());
    let mut rng = SmallRng::seed_from_u64(17);
    let options = TrainingOptions {
        episodes: 25,
        log_every: 0,
        ..TrainingOptions::default()
    };
    let record = learner
        .train(&chart(), &generator(), &options, &mut rng)
        .unwrap();
    assert_eq!(record.total(), 25);
    assert_eq!(learner.episodes_trained(), 25);
    assert!(!learner.is_training());
    assert!(!learner.estimator().is_empty());
}

#[test]
fn linear_training_learns_something() {
    let mut learner = ApproximateQLearning::new(
        LearningParams {
            reward: RewardShaping::Shaped,
            ..params()
        },
        LinearEstimator::new(chart()),
    );
    let mut rng = SmallRng::seed_from_u64(3);
    let options = TrainingOptions {
        episodes: 10,
        log_every: 0,
        ..TrainingOptions::default()
    };
    learner.train(&chart(), &generator(), &options, &mut rng).unwrap();
    assert_eq!(learner.episodes_trained(), 10);
    assert!(learner.estimator().weights().values().any(|w| *w != 0.0));
}

#[test]
fn evaluation_is_reproducible() {
    let learner = TabularQLearning::new(params(), QTable::default());
    let generator = generator();
    let first = evaluate(&learner, &chart(), &generator, 40, 8, Some(500)).unwrap();
    let second = evaluate(&learner, &chart(), &generator, 40, 8, Some(500)).unwrap();
    assert_eq!(first.total(), 40);
    assert_eq!(first, second);
}

#[test]
fn generator_skips_species_with_too_few_moves() {
    let generator = generator();
    assert_eq!(generator.species_pool().len(), 3);
    assert!(generator
        .species_pool()
        .iter()
        .all(|s| s.name != "magikarp"));

    let only_magikarp = vec![species("magikarp", &[Type::Water], moves_of(&[0]))];
    assert_eq!(
        PokemonGenerator::from_species(only_magikarp, chart()).unwrap_err(),
        BattleError::EmptySpeciesPool
    );
}

#[test]
fn generated_combatants_are_battle_ready() {
    let generator = generator();
    let mut rng = SmallRng::seed_from_u64(1);
    for mon in generator.generate(50, &mut rng) {
        let count = mon.moves().len();
        assert!((2..=MAX_MOVES).contains(&count));
        let mut ids: Vec<u32> = mon.moves().iter().map(|m| m.info().id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert_eq!(mon.hp(), mon.stats().total_hp);
        assert_eq!(mon.level(), 100);
    }
}

#[test]
fn advantageous_matchups_favour_the_first_combatant() {
    let generator = generator().with_matchup(Matchup::Advantageous);
    let mut rng = SmallRng::seed_from_u64(21);
    for _ in 0..30 {
        let (first, second) = generator.generate_matchup(&mut rng);
        assert_eq!(
            generator.types_advantage(first.species(), second.species()),
            Matchup::Advantageous
        );
    }
}
