//! Value-function strategies trained by temporal-difference updates.

use crate::model::{DamageClass, MoveInfo, PokemonStats};
use crate::pokemon::{Move, NonVolatile, Pokemon, Volatile};
use crate::random::BattleRng;
use crate::strategy::Strategy;
use crate::types::{Type, TypeChart};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Reward for fainting the opponent (negated for fainting oneself).
pub const TERMINAL_REWARD: f64 = 10.0;

pub const SOFTMAX_TEMPERATURE: f64 = 10.0;

/// Length of [`LinearEstimator::features`].
pub const FEATURE_COUNT: usize = 8;

const HEALTH_BUCKETS: f64 = 4.0;
const POWER_BUCKET_WIDTH: u32 = 40;
const MAX_POWER_BUCKET: u32 = 5;
const MAX_POWER: f64 = 250.0;
const MAX_EFFECTIVENESS: f64 = 4.0;

/// Frozen copy of one combatant, detached from the live battle.
#[derive(Clone, Debug, PartialEq)]
pub struct CombatantSnapshot {
    pub types: Vec<Type>,
    pub stats: PokemonStats,
    pub hp: u32,
    pub moves: Vec<Move>,
    pub ailment: Option<NonVolatile>,
    pub volatile: HashSet<Volatile>,
    pub confusion_turns: u8,
    pub bound_turns: u8,
    pub toxic_multiplier: u8,
}

impl CombatantSnapshot {
    pub fn hp_ratio(&self) -> f64 {
        if self.stats.total_hp == 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.stats.total_hp)
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }
}

impl From<&Pokemon> for CombatantSnapshot {
    fn from(pokemon: &Pokemon) -> Self {
        CombatantSnapshot {
            types: pokemon.types().to_vec(),
            stats: *pokemon.stats(),
            hp: pokemon.hp(),
            moves: pokemon.moves().to_vec(),
            ailment: pokemon.ailment(),
            volatile: pokemon.volatile().clone(),
            confusion_turns: pokemon.confusion_turns(),
            bound_turns: pokemon.bound_turns(),
            toxic_multiplier: pokemon.toxic_multiplier(),
        }
    }
}

/// The learner's view of a battle: its own combatant and the opponent's.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleState {
    pub own: CombatantSnapshot,
    pub opponent: CombatantSnapshot,
}

impl BattleState {
    pub fn capture(own: &Pokemon, opponent: &Pokemon) -> Self {
        BattleState {
            own: own.into(),
            opponent: opponent.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.own.is_fainted() || self.opponent.is_fainted()
    }
}

/// Estimates the value of using a move in a state.
pub trait ValueEstimator {
    fn estimate(&self, state: &BattleState, action: &MoveInfo) -> f64;

    /// Moves the estimate for `(state, action)` by the TD error `delta`.
    fn update(&mut self, state: &BattleState, action: &MoveInfo, alpha: f64, delta: f64);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct StateKey {
    pub own_health: u8,
    pub opponent_health: u8,
    pub own_attack_above_special: bool,
    pub opponent_defense_above_special: bool,
    pub own_types: (usize, usize),
    pub opponent_types: (usize, usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ActionKey {
    pub move_type: usize,
    pub power_bucket: u32,
}

fn health_bucket(ratio: f64) -> u8 {
    (ratio * HEALTH_BUCKETS).ceil().clamp(0.0, HEALTH_BUCKETS) as u8
}

/// First type index, and second type index offset by one (0 when absent).
fn type_indices(types: &[Type]) -> (usize, usize) {
    let first = types.first().map(|t| t.index()).unwrap_or(0);
    let second = types.get(1).map(|t| t.index() + 1).unwrap_or(0);
    (first, second)
}

pub fn discretize_state(state: &BattleState) -> StateKey {
    StateKey {
        own_health: health_bucket(state.own.hp_ratio()),
        opponent_health: health_bucket(state.opponent.hp_ratio()),
        own_attack_above_special: state.own.stats.attack > state.own.stats.special,
        opponent_defense_above_special: state.opponent.stats.defense
            > state.opponent.stats.special,
        own_types: type_indices(&state.own.types),
        opponent_types: type_indices(&state.opponent.types),
    }
}

pub fn discretize_action(action: &MoveInfo) -> ActionKey {
    ActionKey {
        move_type: action.move_type.index(),
        power_bucket: (action.power / POWER_BUCKET_WIDTH).min(MAX_POWER_BUCKET),
    }
}

/// Tabular Q-values keyed by discretised state and action, 0 when unseen.
#[derive(Clone, Debug, Default)]
pub struct QTable {
    values: HashMap<(StateKey, ActionKey), f64>,
}

impl QTable {
    pub fn get(&self, state: StateKey, action: ActionKey) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueEstimator for QTable {
    fn estimate(&self, state: &BattleState, action: &MoveInfo) -> f64 {
        self.get(discretize_state(state), discretize_action(action))
    }

    fn update(&mut self, state: &BattleState, action: &MoveInfo, alpha: f64, delta: f64) {
        let key = (discretize_state(state), discretize_action(action));
        let old = self.values.get(&key).copied().unwrap_or(0.0);
        self.values.insert(key, old + alpha * delta);
    }
}

/// Linear value function over [`FEATURE_COUNT`] hand-picked features.
#[derive(Clone, Debug)]
pub struct LinearEstimator {
    chart: Arc<TypeChart>,
    weights: HashMap<usize, f64>,
}

impl LinearEstimator {
    pub fn new(chart: Arc<TypeChart>) -> Self {
        LinearEstimator {
            chart,
            weights: HashMap::new(),
        }
    }

    pub fn weight(&self, index: usize) -> f64 {
        self.weights.get(&index).copied().unwrap_or(0.0)
    }

    pub fn weights(&self) -> &HashMap<usize, f64> {
        &self.weights
    }

    /// Overwrites the given weights; others keep their value.
    pub fn load_weights(&mut self, weights: HashMap<usize, f64>) {
        self.weights.extend(weights);
    }

    /// own HP ratio, opponent HP ratio, attack share, type effectiveness,
    /// power, accuracy, high-crit flag, drain.
    pub fn features(&self, state: &BattleState, action: &MoveInfo) -> [f64; FEATURE_COUNT] {
        let own = &state.own.stats;
        let opponent = &state.opponent.stats;
        let (attack, defense) = match action.damage_class {
            DamageClass::Physical => (own.attack, opponent.defense),
            DamageClass::Special => (own.special, opponent.special),
        };
        let attack_share = if attack + defense == 0 {
            0.5
        } else {
            f64::from(attack) / f64::from(attack + defense)
        };
        let effectiveness = self
            .chart
            .effectiveness_against(action.move_type, &state.opponent.types);
        [
            state.own.hp_ratio(),
            state.opponent.hp_ratio(),
            attack_share,
            effectiveness / MAX_EFFECTIVENESS,
            f64::from(action.power) / MAX_POWER,
            action.accuracy.unwrap_or(1.0),
            if action.high_crit_ratio { 1.0 } else { 0.0 },
            action.drain,
        ]
    }
}

impl ValueEstimator for LinearEstimator {
    fn estimate(&self, state: &BattleState, action: &MoveInfo) -> f64 {
        self.features(state, action)
            .iter()
            .enumerate()
            .map(|(idx, feature)| self.weight(idx) * feature)
            .sum()
    }

    fn update(&mut self, state: &BattleState, action: &MoveInfo, alpha: f64, delta: f64) {
        for (idx, feature) in self.features(state, action).iter().enumerate() {
            *self.weights.entry(idx).or_insert(0.0) += alpha * delta * feature;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Exploration {
    /// Explore uniformly.
    EpsilonGreedy,
    /// Explore by sampling `e^(value / temperature)`.
    Softmax { temperature: f64 },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RewardShaping {
    /// +10 when the opponent faints, -10 when the learner's combatant does.
    Terminal,
    /// Dense reward from HP swings, scaled by the type matchup.
    Shaped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LearningParams {
    pub alpha: f64,
    pub gamma: f64,
    /// Probability of exploring during training.
    pub epsilon: f64,
    pub exploration: Exploration,
    pub reward: RewardShaping,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.01,
            gamma: 0.9,
            epsilon: 0.1,
            exploration: Exploration::EpsilonGreedy,
            reward: RewardShaping::Terminal,
        }
    }
}

/// One observed round from the learner's point of view.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: BattleState,
    /// Index into `state.own.moves`.
    pub action: usize,
    pub reward: f64,
    pub next: BattleState,
}

/// Q-learning strategy over any [`ValueEstimator`].
#[derive(Clone, Debug)]
pub struct LearningStrategy<E> {
    params: LearningParams,
    estimator: E,
    pub(crate) episodes_trained: usize,
    pub(crate) training: bool,
    pub(crate) pending: Option<usize>,
}

pub type TabularQLearning = LearningStrategy<QTable>;
pub type ApproximateQLearning = LearningStrategy<LinearEstimator>;

impl<E: ValueEstimator> LearningStrategy<E> {
    pub fn new(params: LearningParams, estimator: E) -> Self {
        LearningStrategy {
            params,
            estimator,
            episodes_trained: 0,
            training: false,
            pending: None,
        }
    }

    pub fn params(&self) -> &LearningParams {
        &self.params
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    pub fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Value of using `state.own.moves[action]`; 0 once the learner's own
    /// combatant has fainted.
    pub fn value(&self, state: &BattleState, action: usize) -> f64 {
        if state.own.is_fainted() {
            return 0.0;
        }
        self.estimator
            .estimate(state, state.own.moves[action].info())
    }

    /// Greedy choice; ties are broken uniformly.
    pub fn best_move(&self, state: &BattleState, rng: &mut dyn BattleRng) -> usize {
        let values: Vec<f64> = (0..state.own.moves.len())
            .map(|idx| self.value(state, idx))
            .collect();
        let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == best)
            .map(|(idx, _)| idx)
            .collect();
        if tied.is_empty() {
            return rng.index(values.len());
        }
        tied[rng.index(tied.len())]
    }

    /// Exploits unless `explore` is set and the epsilon roll succeeds.
    pub fn choose_move(&self, state: &BattleState, explore: bool, rng: &mut dyn BattleRng) -> usize {
        let count = state.own.moves.len();
        if explore && rng.chance(self.params.epsilon) {
            return match self.params.exploration {
                Exploration::EpsilonGreedy => rng.index(count),
                Exploration::Softmax { temperature } => {
                    let values: Vec<f64> = (0..count).map(|idx| self.value(state, idx)).collect();
                    rng.weighted(&softmax(&values, temperature))
                }
            };
        }
        self.best_move(state, rng)
    }

    pub fn reward(&self, before: &BattleState, after: &BattleState, chart: &TypeChart) -> f64 {
        match self.params.reward {
            RewardShaping::Terminal => terminal_reward(before, after),
            RewardShaping::Shaped => shaped_reward(before, after, chart),
        }
    }

    /// Temporal-difference update. Returns the TD error.
    pub fn learn(&mut self, transition: &Transition, rng: &mut dyn BattleRng) -> f64 {
        let next_best = self.best_move(&transition.next, rng);
        let delta = transition.reward + self.params.gamma * self.value(&transition.next, next_best)
            - self.value(&transition.state, transition.action);
        let action = transition.state.own.moves[transition.action].info();
        self.estimator
            .update(&transition.state, action, self.params.alpha, delta);
        delta
    }
}

impl LearningStrategy<LinearEstimator> {
    pub fn load_weights(&mut self, weights: HashMap<usize, f64>) {
        self.estimator.load_weights(weights);
    }
}

impl<E: ValueEstimator> Strategy for LearningStrategy<E> {
    fn pick_move(&mut self, own: &Pokemon, opponent: &Pokemon, rng: &mut dyn BattleRng) -> usize {
        if self.training {
            if let Some(cached) = self.pending.take() {
                return cached;
            }
        }
        self.choose_move(&BattleState::capture(own, opponent), false, rng)
    }
}

/// Read-only greedy view of a trained strategy.
pub struct GreedyPolicy<'a, E> {
    learner: &'a LearningStrategy<E>,
}

impl<'a, E> GreedyPolicy<'a, E> {
    pub fn new(learner: &'a LearningStrategy<E>) -> Self {
        GreedyPolicy { learner }
    }
}

impl<E: ValueEstimator> Strategy for GreedyPolicy<'_, E> {
    fn pick_move(&mut self, own: &Pokemon, opponent: &Pokemon, rng: &mut dyn BattleRng) -> usize {
        self.learner
            .best_move(&BattleState::capture(own, opponent), rng)
    }
}

/// Normalised `e^(v / temperature)` weights.
pub fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let raw: Vec<f64> = values
        .iter()
        .map(|v| ((v - max) / temperature).exp())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

pub fn terminal_reward(before: &BattleState, after: &BattleState) -> f64 {
    let mut reward = 0.0;
    if !before.opponent.is_fainted() && after.opponent.is_fainted() {
        reward += TERMINAL_REWARD;
    }
    if !before.own.is_fainted() && after.own.is_fainted() {
        reward -= TERMINAL_REWARD;
    }
    reward
}

/// HP swing reward: opponent damage counts double, scaled up for bad
/// matchups and down for good ones.
pub fn shaped_reward(before: &BattleState, after: &BattleState, chart: &TypeChart) -> f64 {
    let initial_own = f64::from(before.own.hp.max(1));
    let initial_opponent = f64::from(before.opponent.hp.max(1));
    let opponent_delta = f64::from(after.opponent.hp) - f64::from(before.opponent.hp);
    let own_delta = f64::from(after.own.hp) - f64::from(before.own.hp);
    let mut reward = (-2.0 * opponent_delta / initial_opponent + own_delta / initial_own) * 100.0;

    let weight = chart.matchup_weight(&after.own.types, &after.opponent.types);
    let type_mod = if weight > 0.0 { 1.0 / weight } else { 20.0 };
    if reward > 0.0 {
        reward *= type_mod;
    } else {
        reward /= type_mod;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_is_a_distribution() {
        let weights = softmax(&[1.0, 2.0, 3.0], SOFTMAX_TEMPERATURE);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(weights[2] > weights[1] && weights[1] > weights[0]);
        let expected = (0.1f64).exp() / (1.0 + (0.1f64).exp() + (0.2f64).exp());
        assert!((weights[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn health_buckets() {
        assert_eq!(health_bucket(0.0), 0);
        assert_eq!(health_bucket(0.1), 1);
        assert_eq!(health_bucket(0.5), 2);
        assert_eq!(health_bucket(1.0), 4);
    }

    #[test]
    fn type_index_pairs() {
        assert_eq!(type_indices(&[Type::Normal]), (0, 0));
        assert_eq!(type_indices(&[Type::Grass, Type::Poison]), (10, 4));
    }
}
