use crate::error::{BattleError, Result};
use crate::model::{DamageClass, MoveInfo};
use crate::pokemon::{NonVolatile, Pokemon, Volatile, CONFUSION_SELF_HIT_POWER};
use crate::random::BattleRng;
use crate::strategy::Strategy;
use crate::types::TypeChart;
use log::{debug, info, trace};
use std::sync::Arc;

/// Total damage of an action is divided by this to lengthen battles.
pub const LENGTH_MODIFIER: u32 = 2;

/// Rounds after which a battle is called a draw.
pub const DEFAULT_TURN_LIMIT: u32 = 500;

const FULL_PARALYSIS_CHANCE: f64 = 0.25;
const CONFUSION_SELF_HIT_CHANCE: f64 = 0.5;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BattleOutcome {
    AWins,
    BWins,
    /// Both combatants fainted in the same round, or the turn limit ran out.
    Draw,
}

pub struct Trainer<S> {
    pub name: String,
    pub pokemon: Pokemon,
    pub strategy: S,
}

impl<S> Trainer<S> {
    pub fn new(name: impl Into<String>, pokemon: Pokemon, strategy: S) -> Self {
        Trainer {
            name: name.into(),
            pokemon,
            strategy,
        }
    }

    pub fn cannot_continue(&self) -> bool {
        self.pokemon.is_fainted()
    }
}

/// A move selected for this round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChosenMove {
    pub side: Side,
    pub move_index: usize,
    /// Replayed from the charge queue; spends no use and skips the strategy.
    pub forced: bool,
}

/// How one action ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    Completed,
    /// The move started charging and will be forced next round.
    Charging,
    /// A status lock stopped the action.
    Blocked,
}

/// Turn-resolution engine for one fight between two trainers.
pub struct Battle<A, B> {
    chart: Arc<TypeChart>,
    trainer_a: Trainer<A>,
    trainer_b: Trainer<B>,
    turn_count: u32,
    queued: [Option<usize>; 2],
    turn_limit: Option<u32>,
}

impl<A: Strategy, B: Strategy> Battle<A, B> {
    pub fn new(chart: Arc<TypeChart>, trainer_a: Trainer<A>, trainer_b: Trainer<B>) -> Result<Self> {
        for trainer in [&trainer_a.pokemon, &trainer_b.pokemon] {
            if trainer.moves().is_empty() {
                return Err(BattleError::EmptyMoveSet(trainer.nickname().to_string()));
            }
        }
        Ok(Battle {
            chart,
            trainer_a,
            trainer_b,
            turn_count: 0,
            queued: [None, None],
            turn_limit: Some(DEFAULT_TURN_LIMIT),
        })
    }

    pub fn with_turn_limit(mut self, turn_limit: Option<u32>) -> Self {
        self.turn_limit = turn_limit;
        self
    }

    pub fn chart(&self) -> &Arc<TypeChart> {
        &self.chart
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn trainer_a(&self) -> &Trainer<A> {
        &self.trainer_a
    }

    pub fn trainer_b(&self) -> &Trainer<B> {
        &self.trainer_b
    }

    pub fn trainer_a_mut(&mut self) -> &mut Trainer<A> {
        &mut self.trainer_a
    }

    pub fn trainer_b_mut(&mut self) -> &mut Trainer<B> {
        &mut self.trainer_b
    }

    pub fn into_trainers(self) -> (Trainer<A>, Trainer<B>) {
        (self.trainer_a, self.trainer_b)
    }

    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::A => &self.trainer_a.name,
            Side::B => &self.trainer_b.name,
        }
    }

    pub fn pokemon(&self, side: Side) -> &Pokemon {
        match side {
            Side::A => &self.trainer_a.pokemon,
            Side::B => &self.trainer_b.pokemon,
        }
    }

    pub fn pokemon_mut(&mut self, side: Side) -> &mut Pokemon {
        match side {
            Side::A => &mut self.trainer_a.pokemon,
            Side::B => &mut self.trainer_b.pokemon,
        }
    }

    /// Move index waiting to be replayed after a charge turn.
    pub fn queued(&self, side: Side) -> Option<usize> {
        self.queued[side.index()]
    }

    fn either_cannot_continue(&self) -> bool {
        self.trainer_a.cannot_continue() || self.trainer_b.cannot_continue()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match (
            self.trainer_a.cannot_continue(),
            self.trainer_b.cannot_continue(),
        ) {
            (true, true) => Some(BattleOutcome::Draw),
            (true, false) => Some(BattleOutcome::BWins),
            (false, true) => Some(BattleOutcome::AWins),
            (false, false) => self
                .turn_limit
                .filter(|limit| self.turn_count >= *limit)
                .map(|_| BattleOutcome::Draw),
        }
    }

    pub fn finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Collects this round's moves in trainer order. A charging combatant
    /// replays its queued move, a recharging one sits the round out.
    pub fn choose_moves(&mut self, rng: &mut dyn BattleRng) -> Result<Vec<ChosenMove>> {
        let mut chosen = Vec::with_capacity(2);
        for side in [Side::A, Side::B] {
            if let Some(choice) = self.choose_move(side, rng)? {
                chosen.push(choice);
            }
        }
        Ok(chosen)
    }

    fn choose_move(&mut self, side: Side, rng: &mut dyn BattleRng) -> Result<Option<ChosenMove>> {
        if self.pokemon(side).has(Volatile::Charging) {
            match self.queued[side.index()].take() {
                Some(move_index) => {
                    return Ok(Some(ChosenMove {
                        side,
                        move_index,
                        forced: true,
                    }))
                }
                None => {
                    let pokemon = self.pokemon_mut(side);
                    pokemon.remove(Volatile::Charging);
                    pokemon.remove(Volatile::Invulnerable);
                }
            }
        }
        if self.pokemon_mut(side).remove(Volatile::Recharging) {
            debug!("{} must recharge", self.pokemon(side).nickname());
            return Ok(None);
        }
        let move_index = match side {
            Side::A => self.trainer_a.strategy.pick_move(
                &self.trainer_a.pokemon,
                &self.trainer_b.pokemon,
                rng,
            ),
            Side::B => self.trainer_b.strategy.pick_move(
                &self.trainer_b.pokemon,
                &self.trainer_a.pokemon,
                rng,
            ),
        };
        let available = self.pokemon(side).moves().len();
        if move_index >= available {
            return Err(BattleError::InvalidMoveSelection {
                trainer: self.name(side).to_string(),
                index: move_index,
                available,
            });
        }
        Ok(Some(ChosenMove {
            side,
            move_index,
            forced: false,
        }))
    }

    /// Sorts by priority, then speed, then a tiebreak drawn fresh each call,
    /// all descending. A forced move keeps its own priority even with no
    /// uses left.
    pub fn turn_order(&self, chosen: Vec<ChosenMove>, rng: &mut dyn BattleRng) -> Vec<ChosenMove> {
        let mut keyed: Vec<(i8, u32, u64, ChosenMove)> = chosen
            .into_iter()
            .map(|choice| {
                let pokemon = self.pokemon(choice.side);
                let slot = &pokemon.moves()[choice.move_index];
                let priority = if choice.forced {
                    slot.info().priority
                } else {
                    slot.resolved().priority
                };
                (priority, pokemon.stats().speed, rng.tiebreak(), choice)
            })
            .collect();
        keyed.sort_by(|lhs, rhs| {
            rhs.0
                .cmp(&lhs.0)
                .then_with(|| rhs.1.cmp(&lhs.1))
                .then_with(|| rhs.2.cmp(&lhs.2))
        });
        keyed.into_iter().map(|(_, _, _, choice)| choice).collect()
    }

    /// Resolves one action. Does nothing once either side cannot continue.
    pub fn use_move(&mut self, action: ChosenMove, rng: &mut dyn BattleRng) -> Resolution {
        if self.either_cannot_continue() {
            return Resolution::Blocked;
        }
        debug!(
            "{}'s {} tried to use: {}",
            self.name(action.side),
            self.pokemon(action.side).nickname(),
            self.pokemon(action.side).moves()[action.move_index].display_name()
        );
        let (attacker, defender) = match action.side {
            Side::A => (&mut self.trainer_a.pokemon, &mut self.trainer_b.pokemon),
            Side::B => (&mut self.trainer_b.pokemon, &mut self.trainer_a.pokemon),
        };
        let resolution = resolve_move(&self.chart, attacker, defender, action, rng);
        if resolution == Resolution::Charging {
            self.queued[action.side.index()] = Some(action.move_index);
        }
        resolution
    }

    pub fn play_turn(&mut self, rng: &mut dyn BattleRng) -> Result<()> {
        self.turn_count += 1;
        let chosen = self.choose_moves(rng)?;
        for action in self.turn_order(chosen, rng) {
            if self.either_cannot_continue() {
                break;
            }
            self.use_move(action, rng);
        }
        Ok(())
    }

    pub fn run(&mut self, rng: &mut dyn BattleRng) -> Result<BattleOutcome> {
        info!(
            "{} with {} ({}) VS {} with {} ({})",
            self.trainer_a.name,
            self.trainer_a.pokemon.nickname(),
            self.trainer_a.pokemon.species().display_name(),
            self.trainer_b.name,
            self.trainer_b.pokemon.nickname(),
            self.trainer_b.pokemon.species().display_name()
        );
        loop {
            if let Some(outcome) = self.outcome() {
                info!(
                    "Battle finished in {} turns: {:?}",
                    self.turn_count, outcome
                );
                return Ok(outcome);
            }
            debug!("----- Turn {} -----", self.turn_count + 1);
            for side in [Side::A, Side::B] {
                let p = self.pokemon(side);
                debug!("{}: {}/{}", p.nickname(), p.hp(), p.stats().total_hp);
            }
            self.play_turn(rng)?;
        }
    }
}

fn resolve_move(
    chart: &TypeChart,
    attacker: &mut Pokemon,
    defender: &mut Pokemon,
    action: ChosenMove,
    rng: &mut dyn BattleRng,
) -> Resolution {
    let move_used: Arc<MoveInfo> = if action.forced {
        Arc::clone(attacker.moves()[action.move_index].info())
    } else {
        attacker.moves_mut()[action.move_index].use_move()
    };

    if status_lock(attacker, rng) {
        // A blocked second round ends the charge.
        if action.forced {
            attacker.remove(Volatile::Charging);
            attacker.remove(Volatile::Invulnerable);
        }
        return Resolution::Blocked;
    }

    let flags = move_used.flags;
    if flags.invulnerable {
        attacker.toggle(Volatile::Invulnerable);
    }
    if flags.charge && attacker.toggle(Volatile::Charging) {
        debug!("{} is charging {}", attacker.nickname(), move_used.display_name());
        return Resolution::Charging;
    }
    if flags.recharge {
        attacker.add(Volatile::Recharging);
    }
    if flags.self_destruct {
        attacker.faint();
    }

    let hit = is_hit(&move_used, defender, rng);
    let total_damage = if hit {
        total_damage(chart, attacker, defender, &move_used, rng)
    } else {
        debug!(
            "{}'s move ({}) missed!",
            attacker.nickname(),
            move_used.display_name()
        );
        0
    };

    let mut attacker_delta = (move_used.drain * f64::from(total_damage)).floor() as i64;
    if attacker_delta != 0 {
        debug!("{} drain/recoil {attacker_delta}", attacker.nickname());
    }
    let opponent_faints = total_damage > 0 && total_damage >= defender.hp();
    let residual = attacker.residual_damage(opponent_faints);
    if residual > 0 {
        debug!("{} takes {residual} status damage", attacker.nickname());
    }
    attacker_delta -= i64::from(residual);

    if hit {
        if let Some(effect) = move_used.ailment {
            if rng.chance(effect.chance)
                && defender.inflict(effect.ailment, move_used.move_type, rng)
            {
                debug!("{} is now {:?}", defender.nickname(), effect.ailment);
            }
        }
    }

    debug!("{} dealt {total_damage} damage", attacker.nickname());
    attacker.apply_health_effect(attacker_delta);
    defender.apply_health_effect(-i64::from(total_damage));
    Resolution::Completed
}

/// Full paralysis, a confused self-hit or a bound turn. Each applies its
/// own side effects and reports whether the action is lost.
fn status_lock(attacker: &mut Pokemon, rng: &mut dyn BattleRng) -> bool {
    if attacker.ailment() == Some(NonVolatile::Paralysis) && rng.chance(FULL_PARALYSIS_CHANCE) {
        debug!("{} is fully paralyzed", attacker.nickname());
        return true;
    }
    if attacker.has(Volatile::Confused)
        && attacker.tick_confusion()
        && rng.chance(CONFUSION_SELF_HIT_CHANCE)
    {
        let damage = confusion_self_hit(attacker, rng);
        debug!(
            "{} hurt itself in its confusion for {damage}",
            attacker.nickname()
        );
        attacker.apply_health_effect(-i64::from(damage));
        return true;
    }
    if attacker.has(Volatile::Bound) && attacker.tick_bound() {
        let damage = attacker.bound_damage();
        debug!("{} is bound and takes {damage}", attacker.nickname());
        attacker.apply_health_effect(-i64::from(damage));
        return true;
    }
    false
}

/// Accuracy check. A byte roll in `0..=255` must fall below
/// `clamp(floor(accuracy * 255), 1, 255)`, so a perfect move still misses
/// one time in 256.
pub fn is_hit(move_used: &MoveInfo, defender: &Pokemon, rng: &mut dyn BattleRng) -> bool {
    if defender.has(Volatile::Invulnerable) {
        return false;
    }
    let Some(accuracy) = move_used.accuracy else {
        return true;
    };
    let threshold = ((accuracy * 255.0).floor() as i64).clamp(1, 255);
    let roll = rng.byte_roll();
    trace!("accuracy roll {roll} against {threshold}");
    i64::from(roll) < threshold
}

/// Critical-hit check driven by the species' base speed.
pub fn is_critical(attacker: &Pokemon, move_used: &MoveInfo, rng: &mut dyn BattleRng) -> bool {
    let mut threshold = attacker.species().base_stats.speed / 2;
    if move_used.high_crit_ratio {
        threshold *= 8;
    }
    let threshold = threshold.min(255);
    let roll = rng.byte_roll();
    trace!("crit roll {roll} against {threshold}");
    u32::from(roll) < threshold
}

fn base_damage(level: f64, power: u32, ratio: f64) -> f64 {
    (2.0 * level / 5.0 + 2.0) * f64::from(power) * ratio / 50.0 + 2.0
}

fn stat_ratio(numerator: u32, denominator: u32) -> f64 {
    f64::from(numerator) / f64::from(denominator.max(1))
}

/// Damage of a single strike, at least 1.
pub fn strike_damage(
    chart: &TypeChart,
    attacker: &Pokemon,
    defender: &Pokemon,
    move_used: &MoveInfo,
    critical: bool,
    rng: &mut dyn BattleRng,
) -> u32 {
    let level = f64::from(attacker.level()) * if critical { 2.0 } else { 1.0 };
    let ratio = match move_used.damage_class {
        DamageClass::Physical => stat_ratio(attacker.stats().attack, defender.stats().defense),
        DamageClass::Special => stat_ratio(attacker.stats().special, defender.stats().special),
    };
    let stab = if attacker.species().has_type(move_used.move_type) {
        1.5
    } else {
        1.0
    };
    let modifier = rng.damage_spread()
        * stab
        * chart.effectiveness_against(move_used.move_type, defender.types());
    (base_damage(level, move_used.power, ratio) * modifier)
        .floor()
        .max(1.0) as u32
}

/// Sum of every strike divided by [`LENGTH_MODIFIER`]. Only the first
/// strike can be critical. Every strike deals at least 1, immune targets
/// included.
pub fn total_damage(
    chart: &TypeChart,
    attacker: &Pokemon,
    defender: &Pokemon,
    move_used: &MoveInfo,
    rng: &mut dyn BattleRng,
) -> u32 {
    if chart.effectiveness_against(move_used.move_type, defender.types()) == 0.0 {
        debug!("It doesn't affect {}", defender.nickname());
    }
    let strikes = move_used.hit_count.sample(rng);
    let critical = is_critical(attacker, move_used, rng);
    if critical {
        debug!("Critical hit!");
    }
    let mut sum = 0u32;
    for strike in 0..strikes {
        sum += strike_damage(
            chart,
            attacker,
            defender,
            move_used,
            critical && strike == 0,
            rng,
        );
    }
    sum / LENGTH_MODIFIER
}

fn confusion_self_hit(pokemon: &Pokemon, rng: &mut dyn BattleRng) -> u32 {
    let ratio = stat_ratio(pokemon.stats().attack, pokemon.stats().defense);
    let raw = base_damage(f64::from(pokemon.level()), CONFUSION_SELF_HIT_POWER, ratio)
        * rng.damage_spread();
    (raw.floor().max(1.0) as u32) / LENGTH_MODIFIER
}
