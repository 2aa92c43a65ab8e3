use crate::error::{BattleError, Result};
use crate::random::BattleRng;
use crate::types::Type;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DamageClass {
    Physical,
    Special,
}

impl FromStr for DamageClass {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "physical" => Ok(DamageClass::Physical),
            "special" => Ok(DamageClass::Special),
            _ => Err(BattleError::UnknownDamageClass(s.to_string())),
        }
    }
}

/// Status a move may inflict on its target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Ailment {
    Burn,
    Paralysis,
    Poison,
    BadlyPoisoned,
    Confusion,
    Bound,
}

static AILMENT_NAMES: phf::Map<&'static str, Ailment> = phf::phf_map! {
    "burn" => Ailment::Burn,
    "paralysis" => Ailment::Paralysis,
    "poison" => Ailment::Poison,
    "badly-poisoned" => Ailment::BadlyPoisoned,
    "toxic" => Ailment::BadlyPoisoned,
    "confusion" => Ailment::Confusion,
    "trap" => Ailment::Bound,
    "bound" => Ailment::Bound,
};

impl FromStr for Ailment {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self> {
        AILMENT_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| BattleError::UnknownAilment(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AilmentEffect {
    pub ailment: Ailment,
    /// Probability in `[0, 1]`.
    pub chance: f64,
}

/// Weights of the four possible strike counts of a multi-hit move.
pub const MULTI_HIT_WEIGHTS: [f64; 4] = [0.375, 0.375, 0.125, 0.125];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HitCount {
    pub min_hits: u8,
    pub max_hits: u8,
}

impl Default for HitCount {
    fn default() -> Self {
        HitCount {
            min_hits: 1,
            max_hits: 1,
        }
    }
}

impl HitCount {
    pub fn definite(&self) -> Option<u8> {
        (self.min_hits >= self.max_hits).then_some(self.min_hits)
    }

    pub fn sample(&self, rng: &mut dyn BattleRng) -> u8 {
        if let Some(hits) = self.definite() {
            return hits;
        }
        let span = usize::from(self.max_hits - self.min_hits) + 1;
        let weights = &MULTI_HIT_WEIGHTS[..span.min(MULTI_HIT_WEIGHTS.len())];
        self.min_hits + rng.weighted(weights) as u8
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MoveFlags {
    /// Spends one turn charging before it hits.
    pub charge: bool,
    /// The user must recharge on the following turn.
    pub recharge: bool,
    /// The user is out of reach while charging.
    pub invulnerable: bool,
    pub self_destruct: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoveInfo {
    pub id: u32,
    pub name: String,
    pub move_type: Type,
    pub power: u32,
    pub pp: u8,
    pub damage_class: DamageClass,
    pub priority: i8,
    /// Signed fraction of the damage dealt returned to the user.
    pub drain: f64,
    pub high_crit_ratio: bool,
    pub hit_count: HitCount,
    /// `None` never misses.
    pub accuracy: Option<f64>,
    pub ailment: Option<AilmentEffect>,
    pub flags: MoveFlags,
}

impl MoveInfo {
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }
}

/// `"thunder-punch"` -> `"Thunder Punch"`.
pub fn display_name(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PokemonStats {
    pub total_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special: u32,
    pub speed: u32,
}

impl PokemonStats {
    /// Stats at `level` without IVs or EVs.
    pub fn at_level(base: &PokemonStats, level: u8) -> PokemonStats {
        let level = u32::from(level);
        let calc = |base: u32, is_hp: bool| {
            (2 * base * level) / 100 + level + if is_hp { 10 } else { 5 }
        };
        PokemonStats {
            total_hp: calc(base.total_hp, true),
            attack: calc(base.attack, false),
            defense: calc(base.defense, false),
            special: calc(base.special, false),
            speed: calc(base.speed, false),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PokemonSpecies {
    pub id: u32,
    pub name: String,
    /// One or two types.
    pub types: Vec<Type>,
    pub base_stats: PokemonStats,
    pub learn_set: Vec<Arc<MoveInfo>>,
}

impl PokemonSpecies {
    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    pub fn has_type(&self, t: Type) -> bool {
        self.types.contains(&t)
    }
}
