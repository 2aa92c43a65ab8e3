use crate::types::Type;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BattleError {
    #[error("Unknown type name: {0}")]
    UnknownType(String),

    #[error("Unknown ailment name: {0}")]
    UnknownAilment(String),

    #[error("Unknown damage class: {0}")]
    UnknownDamageClass(String),

    #[error("Type chart has no entry for attacking type {0:?}")]
    MissingTypeEntry(Type),

    #[error("Species '{species}' references unknown move id {move_id}")]
    UnknownMove { species: String, move_id: u32 },

    #[error("{0} has no moves to choose from")]
    EmptyMoveSet(String),

    #[error("No species with at least two learnable moves")]
    EmptySpeciesPool,

    #[error("{trainer} picked move #{index} but only {available} moves are available")]
    InvalidMoveSelection {
        trainer: String,
        index: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, BattleError>;
