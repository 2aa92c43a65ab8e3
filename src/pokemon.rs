use crate::model::{
    Ailment, DamageClass, HitCount, MoveFlags, MoveInfo, PokemonSpecies, PokemonStats,
    MULTI_HIT_WEIGHTS,
};
use crate::random::BattleRng;
use crate::types::Type;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

/// Used in place of any move whose uses have run out.
pub static STRUGGLE: Lazy<Arc<MoveInfo>> = Lazy::new(|| {
    Arc::new(MoveInfo {
        id: 165,
        name: "struggle".to_string(),
        move_type: Type::Normal,
        power: 50,
        pp: 0,
        damage_class: DamageClass::Physical,
        priority: 0,
        drain: -0.5,
        high_crit_ratio: false,
        hit_count: HitCount::default(),
        accuracy: Some(1.0),
        ailment: None,
        flags: MoveFlags::default(),
    })
});

/// Power of the typeless hit a confused combatant deals itself.
pub const CONFUSION_SELF_HIT_POWER: u32 = 40;

/// Badly-poisoned damage stops ramping after this many steps.
pub const TOXIC_MULTIPLIER_CAP: u8 = 15;

/// A learned move and its remaining uses.
#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    info: Arc<MoveInfo>,
    pp: u8,
}

impl Move {
    pub fn new(info: Arc<MoveInfo>) -> Self {
        let pp = info.pp;
        Move { info, pp }
    }

    pub fn with_pp(info: Arc<MoveInfo>, pp: u8) -> Self {
        Move { info, pp }
    }

    pub fn info(&self) -> &Arc<MoveInfo> {
        &self.info
    }

    pub fn pp(&self) -> u8 {
        self.pp
    }

    pub fn is_exhausted(&self) -> bool {
        self.pp == 0
    }

    /// Spends one use and returns the move to execute. An exhausted move
    /// resolves to Struggle and leaves every counter alone.
    pub fn use_move(&mut self) -> Arc<MoveInfo> {
        if self.pp == 0 {
            return Arc::clone(&STRUGGLE);
        }
        self.pp -= 1;
        Arc::clone(&self.info)
    }

    /// What selecting this move would execute, without spending a use.
    pub fn resolved(&self) -> &MoveInfo {
        if self.pp == 0 {
            &**STRUGGLE
        } else {
            &*self.info
        }
    }

    pub fn display_name(&self) -> String {
        format!(
            "{} ({}) {}/{}",
            self.info.display_name(),
            self.info.move_type,
            self.pp,
            self.info.pp
        )
    }
}

/// Status conditions of which at most one can be active.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NonVolatile {
    Burn,
    Paralysis,
    Poison,
    BadlyPoisoned,
}

/// Conditions that can stack with each other and with a [`NonVolatile`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Volatile {
    Charging,
    Recharging,
    Invulnerable,
    Confused,
    Bound,
}

/// Runtime state of one combatant.
#[derive(Clone, Debug)]
pub struct Pokemon {
    species: Arc<PokemonSpecies>,
    stats: PokemonStats,
    hp: u32,
    moves: Vec<Move>,
    nickname: String,
    level: u8,
    ailment: Option<NonVolatile>,
    volatile: HashSet<Volatile>,
    confusion_turns: u8,
    bound_turns: u8,
    toxic_multiplier: u8,
}

impl Pokemon {
    /// A full-health combatant with stats derived from the species at `level`.
    pub fn new(
        species: Arc<PokemonSpecies>,
        level: u8,
        moves: Vec<Arc<MoveInfo>>,
        nickname: impl Into<String>,
    ) -> Self {
        let stats = PokemonStats::at_level(&species.base_stats, level);
        let moves = moves.into_iter().map(Move::new).collect();
        Self::with_stats(species, stats, level, moves, nickname)
    }

    pub fn with_stats(
        species: Arc<PokemonSpecies>,
        stats: PokemonStats,
        level: u8,
        moves: Vec<Move>,
        nickname: impl Into<String>,
    ) -> Self {
        Pokemon {
            species,
            hp: stats.total_hp,
            stats,
            moves,
            nickname: nickname.into(),
            level,
            ailment: None,
            volatile: HashSet::new(),
            confusion_turns: 0,
            bound_turns: 0,
            toxic_multiplier: 0,
        }
    }

    pub fn species(&self) -> &Arc<PokemonSpecies> {
        &self.species
    }

    pub fn types(&self) -> &[Type] {
        &self.species.types
    }

    pub fn stats(&self) -> &PokemonStats {
        &self.stats
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.stats.total_hp == 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.stats.total_hp)
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn moves_mut(&mut self) -> &mut [Move] {
        &mut self.moves
    }

    pub fn ailment(&self) -> Option<NonVolatile> {
        self.ailment
    }

    pub fn volatile(&self) -> &HashSet<Volatile> {
        &self.volatile
    }

    pub fn has(&self, status: Volatile) -> bool {
        self.volatile.contains(&status)
    }

    pub fn confusion_turns(&self) -> u8 {
        self.confusion_turns
    }

    pub fn bound_turns(&self) -> u8 {
        self.bound_turns
    }

    pub fn toxic_multiplier(&self) -> u8 {
        self.toxic_multiplier
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    /// Adds `delta` to the current HP, clamped to `[0, total_hp]`.
    pub fn apply_health_effect(&mut self, delta: i64) {
        let total = i64::from(self.stats.total_hp);
        self.hp = (i64::from(self.hp) + delta).clamp(0, total) as u32;
    }

    pub fn faint(&mut self) {
        self.hp = 0;
    }

    /// Sets the non-volatile status unless another one is already active.
    pub fn set_ailment(&mut self, ailment: NonVolatile) -> bool {
        if self.ailment.is_some() {
            return false;
        }
        self.ailment = Some(ailment);
        if ailment == NonVolatile::BadlyPoisoned {
            self.toxic_multiplier = 1;
        }
        true
    }

    pub fn clear_ailment(&mut self) {
        self.ailment = None;
        self.toxic_multiplier = 0;
    }

    pub fn add(&mut self, status: Volatile) {
        self.volatile.insert(status);
    }

    pub fn remove(&mut self, status: Volatile) -> bool {
        self.volatile.remove(&status)
    }

    /// Flips `status` and reports whether it is now active.
    pub fn toggle(&mut self, status: Volatile) -> bool {
        if self.volatile.remove(&status) {
            false
        } else {
            self.volatile.insert(status);
            true
        }
    }

    /// Applies `ailment` from a move of `source` type. Fails when the target
    /// already holds a conflicting status or is immune by type.
    pub fn inflict(&mut self, ailment: Ailment, source: Type, rng: &mut dyn BattleRng) -> bool {
        match ailment {
            Ailment::Burn => {
                if source == Type::Fire && self.species.has_type(Type::Fire) {
                    return false;
                }
                self.set_ailment(NonVolatile::Burn)
            }
            Ailment::Paralysis => {
                if source == Type::Electric && self.species.has_type(Type::Ground) {
                    return false;
                }
                self.set_ailment(NonVolatile::Paralysis)
            }
            Ailment::Poison | Ailment::BadlyPoisoned => {
                if self.species.has_type(Type::Poison) {
                    return false;
                }
                let status = if ailment == Ailment::Poison {
                    NonVolatile::Poison
                } else {
                    NonVolatile::BadlyPoisoned
                };
                self.set_ailment(status)
            }
            Ailment::Confusion => {
                if self.has(Volatile::Confused) {
                    return false;
                }
                self.confusion_turns = 1 + rng.index(5) as u8;
                self.add(Volatile::Confused);
                true
            }
            Ailment::Bound => {
                if self.has(Volatile::Bound) {
                    return false;
                }
                self.bound_turns = 2 + rng.weighted(&MULTI_HIT_WEIGHTS) as u8;
                self.add(Volatile::Bound);
                true
            }
        }
    }

    /// Counts down one confused turn. Returns `true` while still confused.
    pub(crate) fn tick_confusion(&mut self) -> bool {
        self.confusion_turns = self.confusion_turns.saturating_sub(1);
        if self.confusion_turns == 0 {
            self.remove(Volatile::Confused);
            return false;
        }
        true
    }

    /// Counts down one bound turn. Returns `true` if the turn is lost.
    pub(crate) fn tick_bound(&mut self) -> bool {
        if self.bound_turns == 0 {
            self.remove(Volatile::Bound);
            return false;
        }
        self.bound_turns -= 1;
        true
    }

    fn residual_unit(&self) -> u32 {
        (self.stats.total_hp / 16).max(1)
    }

    pub fn bound_damage(&self) -> u32 {
        self.residual_unit()
    }

    /// Status damage taken at the end of this combatant's action. Poison is
    /// withheld when the action faints the opponent.
    pub fn residual_damage(&mut self, opponent_faints: bool) -> u32 {
        let unit = self.residual_unit();
        let mut damage = match self.ailment {
            Some(NonVolatile::Burn) => unit,
            Some(NonVolatile::Poison) if !opponent_faints => unit,
            Some(NonVolatile::BadlyPoisoned) if !opponent_faints => {
                let multiplier = self.toxic_multiplier.max(1);
                self.toxic_multiplier = (multiplier + 1).min(TOXIC_MULTIPLIER_CAP);
                unit * u32::from(multiplier)
            }
            _ => 0,
        };
        if self.has(Volatile::Bound) {
            damage += unit;
        }
        damage
    }
}
