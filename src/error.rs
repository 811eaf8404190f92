use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::grid_config::SlotId;

/// Problems with the puzzle input. An unsatisfiable puzzle is not an error; see `FillFailure`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("structure contains no cells")]
    EmptyStructure,

    #[error("slot {slot_id} has zero length")]
    EmptySlot { slot_id: SlotId },

    #[error("cell ({row}, {col}) is shared by more than two slots")]
    CrowdedCell { row: usize, col: usize },

    #[error("slots {first} and {second} share more than one cell")]
    MultipleOverlaps { first: SlotId, second: SlotId },

    #[error("overlap between slots {first} and {second} is not symmetric")]
    AsymmetricOverlap { first: SlotId, second: SlotId },
}

pub type Result<T> = std::result::Result<T, Error>;
