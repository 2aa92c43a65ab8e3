use crate::data::Catalog;
use crate::error::{BattleError, Result};
use crate::model::{MoveInfo, PokemonSpecies};
use crate::pokemon::Pokemon;
use crate::random::BattleRng;
use crate::training::CombatantSource;
use crate::types::TypeChart;
use std::sync::Arc;

pub const DEFAULT_LEVEL: u8 = 100;
pub const MAX_MOVES: usize = 4;

const NICKNAMES: [&str; 5] = ["Bob", "Bill", "John", "Mary", "Susan"];

/// Type relation of the first combatant of a pair against the second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Matchup {
    Disadvantageous,
    Neutral,
    Advantageous,
}

/// Builds battle-ready combatants from the species catalog.
#[derive(Clone, Debug)]
pub struct PokemonGenerator {
    species: Vec<Arc<PokemonSpecies>>,
    chart: Arc<TypeChart>,
    level: u8,
    matchup: Matchup,
}

impl PokemonGenerator {
    pub fn new(catalog: &Catalog) -> Result<Self> {
        let mut species: Vec<Arc<PokemonSpecies>> = catalog.species.values().cloned().collect();
        species.sort_by_key(|s| s.id);
        Self::from_species(species, Arc::clone(&catalog.type_chart))
    }

    /// Species with fewer than two learnable moves are left out.
    pub fn from_species(
        species: impl IntoIterator<Item = Arc<PokemonSpecies>>,
        chart: Arc<TypeChart>,
    ) -> Result<Self> {
        let species: Vec<_> = species
            .into_iter()
            .filter(|s| s.learn_set.len() > 1)
            .collect();
        if species.is_empty() {
            return Err(BattleError::EmptySpeciesPool);
        }
        Ok(PokemonGenerator {
            species,
            chart,
            level: DEFAULT_LEVEL,
            matchup: Matchup::Neutral,
        })
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_matchup(mut self, matchup: Matchup) -> Self {
        self.matchup = matchup;
        self
    }

    pub fn species_pool(&self) -> &[Arc<PokemonSpecies>] {
        &self.species
    }

    pub fn types_advantage(&self, a: &PokemonSpecies, b: &PokemonSpecies) -> Matchup {
        let weight = self.chart.matchup_weight(&a.types, &b.types);
        if weight > 1.0 {
            Matchup::Advantageous
        } else if weight < 1.0 {
            Matchup::Disadvantageous
        } else {
            Matchup::Neutral
        }
    }

    fn random_moves(&self, species: &PokemonSpecies, rng: &mut dyn BattleRng) -> Vec<Arc<MoveInfo>> {
        let mut pool: Vec<Arc<MoveInfo>> = species.learn_set.clone();
        let count = pool.len().min(MAX_MOVES);
        for slot in 0..count {
            let pick = slot + rng.index(pool.len() - slot);
            pool.swap(slot, pick);
        }
        pool.truncate(count);
        pool
    }

    pub fn pokemon_from_species(&self, species: &Arc<PokemonSpecies>, rng: &mut dyn BattleRng) -> Pokemon {
        let moves = self.random_moves(species, rng);
        let nickname = NICKNAMES[rng.index(NICKNAMES.len())];
        Pokemon::new(Arc::clone(species), self.level, moves, nickname)
    }

    fn random_species(&self, rng: &mut dyn BattleRng) -> &Arc<PokemonSpecies> {
        &self.species[rng.index(self.species.len())]
    }

    /// `n` combatants of independently drawn species.
    pub fn generate(&self, n: usize, rng: &mut dyn BattleRng) -> Vec<Pokemon> {
        (0..n)
            .map(|_| {
                let species = Arc::clone(self.random_species(rng));
                self.pokemon_from_species(&species, rng)
            })
            .collect()
    }

    /// A pair whose type matchup follows the configured [`Matchup`], falling
    /// back to a neutral opponent and then to any opponent.
    pub fn generate_matchup(&self, rng: &mut dyn BattleRng) -> (Pokemon, Pokemon) {
        let first = Arc::clone(self.random_species(rng));
        let second = match self.matchup {
            Matchup::Neutral => Arc::clone(self.random_species(rng)),
            wanted => {
                let pick = |relation: Matchup| -> Vec<&Arc<PokemonSpecies>> {
                    self.species
                        .iter()
                        .filter(|s| self.types_advantage(&first, s) == relation)
                        .collect()
                };
                let mut candidates = pick(wanted);
                if candidates.is_empty() {
                    candidates = pick(Matchup::Neutral);
                }
                if candidates.is_empty() {
                    Arc::clone(self.random_species(rng))
                } else {
                    Arc::clone(candidates[rng.index(candidates.len())])
                }
            }
        };
        (
            self.pokemon_from_species(&first, rng),
            self.pokemon_from_species(&second, rng),
        )
    }
}

impl CombatantSource for PokemonGenerator {
    fn generate_pair(&self, rng: &mut dyn BattleRng) -> Result<(Pokemon, Pokemon)> {
        Ok(self.generate_matchup(rng))
    }
}
