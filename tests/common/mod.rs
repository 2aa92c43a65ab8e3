#![allow(dead_code)]

use pokemon_battle_learner::model::{
    AilmentEffect, DamageClass, HitCount, MoveFlags, MoveInfo, PokemonSpecies, PokemonStats,
};
use pokemon_battle_learner::pokemon::{Move, Pokemon};
use pokemon_battle_learner::random::BattleRng;
use pokemon_battle_learner::types::Type;
use std::sync::Arc;

/// Rolls that always hit, never crit and never trigger low-odds effects.
pub struct FixedRng {
    pub byte: u8,
    pub unit: f64,
    pub tiebreak: u64,
}

impl Default for FixedRng {
    fn default() -> Self {
        FixedRng {
            byte: 254,
            unit: 0.99,
            tiebreak: 7,
        }
    }
}

impl BattleRng for FixedRng {
    fn byte_roll(&mut self) -> u8 {
        self.byte
    }

    fn unit(&mut self) -> f64 {
        self.unit
    }

    fn tiebreak(&mut self) -> u64 {
        self.tiebreak
    }

    fn damage_spread(&mut self) -> f64 {
        1.0
    }
}

pub fn make_move(name: &str, move_type: Type, power: u32, accuracy: Option<f64>) -> MoveInfo {
    MoveInfo {
        id: 0,
        name: name.to_string(),
        move_type,
        power,
        pp: 10,
        damage_class: DamageClass::Physical,
        priority: 0,
        drain: 0.0,
        high_crit_ratio: false,
        hit_count: HitCount::default(),
        accuracy,
        ailment: None,
        flags: MoveFlags::default(),
    }
}

pub fn with_ailment(mut info: MoveInfo, effect: AilmentEffect) -> MoveInfo {
    info.ailment = Some(effect);
    info
}

pub fn species(name: &str, types: &[Type], learn_set: Vec<Arc<MoveInfo>>) -> Arc<PokemonSpecies> {
    Arc::new(PokemonSpecies {
        id: 1,
        name: name.to_string(),
        types: types.to_vec(),
        base_stats: PokemonStats {
            total_hp: 50,
            attack: 50,
            defense: 50,
            special: 50,
            speed: 50,
        },
        learn_set,
    })
}

/// Level 100, 100 HP, every other stat 50 except `speed`.
pub fn make_mon(name: &str, types: &[Type], speed: u32, moves: Vec<MoveInfo>) -> Pokemon {
    let moves = moves.into_iter().map(|m| Move::new(Arc::new(m))).collect();
    make_mon_with(name, types, speed, moves)
}

/// Like [`make_mon`], with the use counters already set.
pub fn make_mon_with(name: &str, types: &[Type], speed: u32, moves: Vec<Move>) -> Pokemon {
    let stats = PokemonStats {
        total_hp: 100,
        attack: 50,
        defense: 50,
        special: 50,
        speed,
    };
    Pokemon::with_stats(species(name, types, Vec::new()), stats, 100, moves, name)
}
