use crate::error::{BattleError, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Elemental type under the generation 1 rule set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Type {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
}

impl Type {
    pub const ALL: [Type; 15] = [
        Type::Normal,
        Type::Fighting,
        Type::Flying,
        Type::Poison,
        Type::Ground,
        Type::Rock,
        Type::Bug,
        Type::Ghost,
        Type::Fire,
        Type::Water,
        Type::Grass,
        Type::Electric,
        Type::Psychic,
        Type::Ice,
        Type::Dragon,
    ];

    /// Position in declaration order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Normal => "NORMAL",
            Type::Fighting => "FIGHTING",
            Type::Flying => "FLYING",
            Type::Poison => "POISON",
            Type::Ground => "GROUND",
            Type::Rock => "ROCK",
            Type::Bug => "BUG",
            Type::Ghost => "GHOST",
            Type::Fire => "FIRE",
            Type::Water => "WATER",
            Type::Grass => "GRASS",
            Type::Electric => "ELECTRIC",
            Type::Psychic => "PSYCHIC",
            Type::Ice => "ICE",
            Type::Dragon => "DRAGON",
        }
    }
}

static TYPE_NAMES: phf::Map<&'static str, Type> = phf::phf_map! {
    "normal" => Type::Normal,
    "fighting" => Type::Fighting,
    "flying" => Type::Flying,
    "poison" => Type::Poison,
    "ground" => Type::Ground,
    "rock" => Type::Rock,
    "bug" => Type::Bug,
    "ghost" => Type::Ghost,
    "fire" => Type::Fire,
    "water" => Type::Water,
    "grass" => Type::Grass,
    "electric" => Type::Electric,
    "psychic" => Type::Psychic,
    "ice" => Type::Ice,
    "dragon" => Type::Dragon,
};

impl FromStr for Type {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self> {
        TYPE_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| BattleError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Damage relations of one attacking type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeRelations {
    pub double_damage_to: Vec<Type>,
    pub half_damage_to: Vec<Type>,
    pub no_damage_to: Vec<Type>,
}

impl TypeRelations {
    fn multiplier(&self, defending: Type) -> f64 {
        if self.double_damage_to.contains(&defending) {
            2.0
        } else if self.half_damage_to.contains(&defending) {
            0.5
        } else if self.no_damage_to.contains(&defending) {
            0.0
        } else {
            1.0
        }
    }
}

/// Attacker -> defender damage multipliers.
///
/// Construction fails unless every attacking type has an entry, so
/// [`TypeChart::effectiveness`] is total over all 225 ordered pairs.
#[derive(Clone, Debug)]
pub struct TypeChart {
    relations: HashMap<Type, TypeRelations>,
}

impl TypeChart {
    pub fn new(relations: HashMap<Type, TypeRelations>) -> Result<Self> {
        if let Some(missing) = Type::ALL.iter().find(|t| !relations.contains_key(t)) {
            return Err(BattleError::MissingTypeEntry(*missing));
        }
        Ok(TypeChart { relations })
    }

    /// Multiplier in {0, 0.5, 1, 2}.
    pub fn effectiveness(&self, attacking: Type, defending: Type) -> f64 {
        self.relations
            .get(&attacking)
            .map(|r| r.multiplier(defending))
            .unwrap_or(1.0)
    }

    /// Product over every defending type.
    pub fn effectiveness_against(&self, attacking: Type, defending: &[Type]) -> f64 {
        defending
            .iter()
            .map(|t| self.effectiveness(attacking, *t))
            .product()
    }

    /// Product of every attacker type against every defender type.
    pub fn matchup_weight(&self, attacking: &[Type], defending: &[Type]) -> f64 {
        attacking
            .iter()
            .map(|a| self.effectiveness_against(*a, defending))
            .product()
    }

    /// The generation 1 chart, including its Ghost -> Psychic immunity.
    pub fn gen1() -> Self {
        use Type::*;
        let table: [(Type, &[Type], &[Type], &[Type]); 15] = [
            (Normal, &[], &[Rock], &[Ghost]),
            (
                Fighting,
                &[Normal, Rock, Ice],
                &[Flying, Poison, Bug, Psychic],
                &[Ghost],
            ),
            (Flying, &[Fighting, Bug, Grass], &[Rock, Electric], &[]),
            (Poison, &[Bug, Grass], &[Poison, Ground, Rock, Ghost], &[]),
            (
                Ground,
                &[Poison, Rock, Fire, Electric],
                &[Bug, Grass],
                &[Flying],
            ),
            (Rock, &[Flying, Bug, Fire, Ice], &[Fighting, Ground], &[]),
            (
                Bug,
                &[Poison, Grass, Psychic],
                &[Fighting, Flying, Ghost, Fire],
                &[],
            ),
            (Ghost, &[Ghost], &[], &[Normal, Psychic]),
            (Fire, &[Bug, Grass, Ice], &[Rock, Fire, Water, Dragon], &[]),
            (Water, &[Ground, Rock, Fire], &[Water, Grass, Dragon], &[]),
            (
                Grass,
                &[Ground, Rock, Water],
                &[Flying, Poison, Bug, Fire, Grass, Dragon],
                &[],
            ),
            (
                Electric,
                &[Flying, Water],
                &[Grass, Electric, Dragon],
                &[Ground],
            ),
            (Psychic, &[Fighting, Poison], &[Psychic], &[]),
            (Ice, &[Flying, Ground, Grass, Dragon], &[Water, Ice], &[]),
            (Dragon, &[Dragon], &[], &[]),
        ];
        let relations = table
            .iter()
            .map(|(attacking, double, half, none)| {
                (
                    *attacking,
                    TypeRelations {
                        double_damage_to: double.to_vec(),
                        half_damage_to: half.to_vec(),
                        no_damage_to: none.to_vec(),
                    },
                )
            })
            .collect();
        TypeChart { relations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen1_chart_is_total() {
        let chart = TypeChart::gen1();
        for attacking in Type::ALL {
            for defending in Type::ALL {
                let m = chart.effectiveness(attacking, defending);
                assert!(
                    [0.0, 0.5, 1.0, 2.0].contains(&m),
                    "{attacking} -> {defending} gave {m}"
                );
            }
        }
    }

    #[test]
    fn gen1_quirks() {
        let chart = TypeChart::gen1();
        assert_eq!(chart.effectiveness(Type::Ghost, Type::Psychic), 0.0);
        assert_eq!(chart.effectiveness(Type::Ice, Type::Fire), 1.0);
        assert_eq!(chart.effectiveness(Type::Electric, Type::Ground), 0.0);
        assert_eq!(
            chart.effectiveness_against(Type::Ground, &[Type::Rock, Type::Poison]),
            4.0
        );
    }

    #[test]
    fn missing_attacker_is_rejected() {
        let mut relations = HashMap::new();
        for t in Type::ALL.iter().filter(|t| **t != Type::Dragon) {
            relations.insert(*t, TypeRelations::default());
        }
        assert_eq!(
            TypeChart::new(relations).unwrap_err(),
            BattleError::MissingTypeEntry(Type::Dragon)
        );
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Fire".parse::<Type>().unwrap(), Type::Fire);
        assert_eq!(" ELECTRIC ".parse::<Type>().unwrap(), Type::Electric);
        assert!(matches!(
            "steel".parse::<Type>(),
            Err(BattleError::UnknownType(_))
        ));
    }
}
