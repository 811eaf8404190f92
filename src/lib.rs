//! Fill a crossword structure with words from a word list, treating it as a constraint
//! satisfaction problem: every slot gets a word of the right length, crossing slots agree on their
//! shared letter, and no word is used twice.
//!
//! The pipeline is: load a `GridConfig` and a `WordList`, build per-slot `Domains`, prune them with
//! node consistency and AC-3, then run a backtracking search that re-establishes arc consistency
//! after every tentative choice.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domain;
pub mod error;
pub mod grid_config;
pub mod render;
pub mod word_list;

#[cfg(test)]
mod test_utils;

pub use backtracking_search::{
    find_fill, solve, Assignment, Choice, CrosswordSolver, FillFailure, FillSuccess, SearchConfig,
    Statistics,
};
pub use error::{Error, Result};
pub use grid_config::{Direction, GridConfig, GridEntry, SlotId};
pub use render::{render_grid, render_svg, save_svg};
pub use word_list::{WordId, WordList};

/// Should we run extra checks to validate that we're never in an invalid state during search? This
/// can be enabled with `--features check_invariants` when debugging.
pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;
