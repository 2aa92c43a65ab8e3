//! Reference data loaded once before any battle: type chart, moves, species.

use crate::error::{BattleError, Result};
use crate::model::{
    Ailment, AilmentEffect, DamageClass, HitCount, MoveFlags, MoveInfo, PokemonSpecies,
    PokemonStats,
};
use crate::types::{Type, TypeChart, TypeRelations};
use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

pub const TYPE_CHART_FILE: &str = "type_chart.json";
pub const MOVES_FILE: &str = "moves.json";
pub const SPECIES_FILE: &str = "species.json";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TypeRelationsRecord {
    #[serde(default)]
    pub double_damage_to: Vec<String>,
    #[serde(default)]
    pub half_damage_to: Vec<String>,
    #[serde(default)]
    pub no_damage_to: Vec<String>,
}

fn default_hits() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveRecord {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: String,
    #[serde(default)]
    pub power: u32,
    pub pp: u8,
    pub damage_class: String,
    #[serde(default)]
    pub priority: i8,
    /// Percent of damage dealt; negative for recoil.
    #[serde(default)]
    pub drain: i32,
    #[serde(default)]
    pub high_crit_ratio: bool,
    #[serde(default = "default_hits")]
    pub min_hits: u8,
    #[serde(default = "default_hits")]
    pub max_hits: u8,
    /// Percent; absent for moves that never miss.
    #[serde(default)]
    pub accuracy: Option<u32>,
    #[serde(default)]
    pub ailment: Option<String>,
    /// Percent; 0 together with an ailment means the ailment always applies.
    #[serde(default)]
    pub ailment_chance: u8,
    #[serde(default)]
    pub charge: bool,
    #[serde(default)]
    pub recharge: bool,
    #[serde(default)]
    pub invulnerable: bool,
    #[serde(default)]
    pub self_destruct: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseStatsRecord {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special: u32,
    pub speed: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesRecord {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    pub base_stats: BaseStatsRecord,
    /// Learnable move ids.
    #[serde(default)]
    pub moves: Vec<u32>,
}

impl MoveRecord {
    pub fn into_info(self) -> Result<MoveInfo> {
        let ailment = match self.ailment.as_deref().map(str::trim) {
            None | Some("") | Some("none") => None,
            Some(name) => {
                let chance = if self.ailment_chance == 0 {
                    1.0
                } else {
                    f64::from(self.ailment_chance.min(100)) / 100.0
                };
                Some(AilmentEffect {
                    ailment: name.parse::<Ailment>()?,
                    chance,
                })
            }
        };
        Ok(MoveInfo {
            id: self.id,
            move_type: self.move_type.parse::<Type>()?,
            damage_class: self.damage_class.parse::<DamageClass>()?,
            name: self.name,
            power: self.power,
            pp: self.pp,
            priority: self.priority,
            drain: f64::from(self.drain) / 100.0,
            high_crit_ratio: self.high_crit_ratio,
            hit_count: HitCount {
                min_hits: self.min_hits,
                max_hits: self.max_hits.max(self.min_hits),
            },
            accuracy: self.accuracy.map(|a| f64::from(a) / 100.0),
            ailment,
            flags: MoveFlags {
                charge: self.charge,
                recharge: self.recharge,
                invulnerable: self.invulnerable,
                self_destruct: self.self_destruct,
            },
        })
    }
}

fn parse_types(names: &[String]) -> Result<Vec<Type>> {
    names.iter().map(|n| n.parse::<Type>()).collect()
}

/// Validated, immutable reference data keyed by external id.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub type_chart: Arc<TypeChart>,
    pub moves: HashMap<u32, Arc<MoveInfo>>,
    pub species: HashMap<u32, Arc<PokemonSpecies>>,
}

impl Catalog {
    pub fn from_records(
        chart: BTreeMap<String, TypeRelationsRecord>,
        moves: Vec<MoveRecord>,
        species: Vec<SpeciesRecord>,
    ) -> Result<Self> {
        let mut relations = HashMap::new();
        for (attacking, record) in chart {
            relations.insert(
                attacking.parse::<Type>()?,
                TypeRelations {
                    double_damage_to: parse_types(&record.double_damage_to)?,
                    half_damage_to: parse_types(&record.half_damage_to)?,
                    no_damage_to: parse_types(&record.no_damage_to)?,
                },
            );
        }
        let type_chart = Arc::new(TypeChart::new(relations)?);

        let moves: HashMap<u32, Arc<MoveInfo>> = moves
            .into_iter()
            .map(|record| Ok((record.id, Arc::new(record.into_info()?))))
            .collect::<Result<_>>()?;

        let mut species_map = HashMap::new();
        for record in species {
            let types = parse_types(&record.types)?;
            if types.is_empty() {
                return Err(BattleError::UnknownType(format!(
                    "<none given for {}>",
                    record.name
                )));
            }
            let mut learn_set: Vec<Arc<MoveInfo>> = Vec::new();
            for move_id in &record.moves {
                let info = moves.get(move_id).ok_or_else(|| BattleError::UnknownMove {
                    species: record.name.clone(),
                    move_id: *move_id,
                })?;
                if !learn_set.iter().any(|m| m.id == info.id) {
                    learn_set.push(Arc::clone(info));
                }
            }
            let base = &record.base_stats;
            let base_stats = PokemonStats {
                total_hp: base.hp,
                attack: base.attack,
                defense: base.defense,
                special: base.special,
                speed: base.speed,
            };
            species_map.insert(
                record.id,
                Arc::new(PokemonSpecies {
                    id: record.id,
                    name: record.name,
                    types,
                    base_stats,
                    learn_set,
                }),
            );
        }

        Ok(Catalog {
            type_chart,
            moves,
            species: species_map,
        })
    }

    pub fn from_json(type_chart: &str, moves: &str, species: &str) -> anyhow::Result<Self> {
        let chart: BTreeMap<String, TypeRelationsRecord> =
            serde_json::from_str(type_chart).context("Failed to parse type chart JSON")?;
        let moves: Vec<MoveRecord> =
            serde_json::from_str(moves).context("Failed to parse moves JSON")?;
        let species: Vec<SpeciesRecord> =
            serde_json::from_str(species).context("Failed to parse species JSON")?;
        Ok(Self::from_records(chart, moves, species)?)
    }

    /// Reads [`TYPE_CHART_FILE`], [`MOVES_FILE`] and [`SPECIES_FILE`] from `dir`.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))
        };
        let catalog = Self::from_json(&read(TYPE_CHART_FILE)?, &read(MOVES_FILE)?, &read(SPECIES_FILE)?)
            .with_context(|| format!("Invalid reference data in {}", dir.display()))?;
        log::info!(
            "Loaded {} moves and {} species from {}",
            catalog.moves.len(),
            catalog.species.len(),
            dir.display()
        );
        Ok(catalog)
    }

    pub fn move_named(&self, name: &str) -> Option<&Arc<MoveInfo>> {
        self.moves.values().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn species_named(&self, name: &str) -> Option<&Arc<PokemonSpecies>> {
        self.species
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}
