//! This module implements grid filling as a backtracking search that maintains arc consistency.
//! Slots are chosen with the minimum-remaining-values heuristic (ties broken by degree and then by
//! slot id), and words are tried in least-constraining-value order. After each tentative choice the
//! chosen slot's domain is reduced to that word and AC-3 propagates the consequences; slots that
//! end up with a single option are folded into the assignment right away.

use instant::{Duration, Instant};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use thiserror::Error;

use crate::arc_consistency::{arcs_into, establish_arc_consistency, Arc};
use crate::domain::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};
use crate::CHECK_INVARIANTS;

/// A mapping from each filled slot to its chosen word.
pub type Assignment = BTreeMap<SlotId, WordId>;

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// Limits that let a caller stop a long search early. The default is unlimited.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Give up once this much time has passed since the fill started.
    pub timeout: Option<Duration>,
    /// Give up after visiting this many search states.
    pub max_states: Option<u64>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub forced_assignments: u64,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    #[error("no assignment satisfies the puzzle")]
    HardFailure,
    #[error("search timed out")]
    Timeout,
    #[error("search visited the maximum number of states")]
    StateLimitReached,
}

/// What propagating a tentative choice told us about the rest of the grid.
#[derive(Debug, PartialEq, Eq)]
enum Inference {
    /// Nothing was reduced to a single option.
    Stable,
    /// These unassigned slots were left with exactly one option each.
    Forced(Vec<Choice>),
    /// Propagation wiped out this slot's options.
    Contradiction { slot_id: SlotId },
}

/// Solver state for a single fill: the geometry and vocabulary it works on, plus the live domains
/// that are pruned during search and restored on backtrack.
pub struct CrosswordSolver<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    search_config: SearchConfig,
    domains: Domains,
    statistics: Statistics,
    deadline: Option<Instant>,
}

impl<'a> Debug for CrosswordSolver<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrosswordSolver")
            .field("slot_count", &self.config.slot_count())
            .field("word_list", &self.word_list)
            .field("domains", &self.domains)
            .field("statistics", &self.statistics)
            .finish()
    }
}

impl<'a> CrosswordSolver<'a> {
    /// Create a solver whose domains hold the entire vocabulary for every slot.
    pub fn new(config: &'a GridConfig, word_list: &'a WordList) -> CrosswordSolver<'a> {
        CrosswordSolver::with_search_config(config, word_list, SearchConfig::default())
    }

    pub fn with_search_config(
        config: &'a GridConfig,
        word_list: &'a WordList,
        search_config: SearchConfig,
    ) -> CrosswordSolver<'a> {
        CrosswordSolver {
            config,
            word_list,
            search_config,
            domains: Domains::new(config, word_list),
            statistics: Statistics::default(),
            deadline: None,
        }
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Remove words of the wrong length from every slot.
    pub fn enforce_node_consistency(&mut self) {
        self.domains.enforce_node_consistency(self.config, self.word_list);
    }

    /// Run AC-3 over the given arcs, or over every arc if `arcs` is `None`. Returns false if some
    /// slot ran out of options.
    pub fn ac3(&mut self, arcs: Option<Vec<Arc>>) -> bool {
        establish_arc_consistency(self.config, self.word_list, &mut self.domains, arcs).is_ok()
    }

    /// Enforce node and arc consistency, then search for a complete assignment. Returns `None` if
    /// the puzzle can't be filled.
    pub fn solve(&mut self) -> Option<Assignment> {
        self.find_fill().ok().map(|success| success.assignment)
    }

    /// Like `solve`, but reports statistics and distinguishes an exhausted search from one that
    /// was cut short by the `SearchConfig` limits.
    pub fn find_fill(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        self.deadline = self.search_config.timeout.map(|timeout| start + timeout);
        self.statistics = Statistics::default();
        self.domains = Domains::new(self.config, self.word_list);

        self.enforce_node_consistency();
        log::debug!(
            "{} slots, {} words; options after node consistency: {:?}",
            self.config.slot_count(),
            self.word_list.len(),
            self.domains,
        );

        let result = if let Some(slot_id) = self.domains.first_empty_slot() {
            log::debug!("no word fits slot {}", slot_id);
            Err(FillFailure::HardFailure)
        } else if !self.ac3(None) {
            log::debug!("initial arc consistency emptied a slot");
            Err(FillFailure::HardFailure)
        } else {
            log::debug!("options after arc consistency: {:?}", self.domains);

            let mut assignment = Assignment::new();
            match self.backtrack(&mut assignment) {
                Ok(true) => Ok(assignment),
                Ok(false) => Err(FillFailure::HardFailure),
                Err(failure) => Err(failure),
            }
        };

        self.statistics.duration = start.elapsed();
        log::debug!("fill finished: {:?}", self.statistics);

        result.map(|assignment| FillSuccess {
            statistics: self.statistics.clone(),
            assignment,
        })
    }

    /// Does the assignment give every slot a word?
    pub fn assignment_complete(&self, assignment: &Assignment) -> bool {
        self.config
            .slot_ids()
            .all(|slot_id| assignment.contains_key(&slot_id))
    }

    /// Check that every assigned word fits its slot, agrees with every assigned crossing slot, and
    /// is not used anywhere else.
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        for (&slot_id, &word_id) in assignment {
            let word = self.word_list.word(word_id);
            if word.len() != self.config.length(slot_id) {
                return false;
            }

            for &neighbor in self.config.neighbors(slot_id) {
                let Some(&neighbor_word_id) = assignment.get(&neighbor) else {
                    continue;
                };
                let Some((cell, neighbor_cell)) = self.config.overlap(slot_id, neighbor) else {
                    continue;
                };

                if word.glyph(cell) != self.word_list.word(neighbor_word_id).glyph(neighbor_cell) {
                    return false;
                }
            }
        }

        let mut word_ids: Vec<WordId> = assignment.values().copied().collect();
        word_ids.sort_unstable();
        word_ids.windows(2).all(|pair| pair[0] != pair[1])
    }

    /// Order a slot's remaining words so that the ones eliminating the fewest options from
    /// unassigned crossing slots come first. Ties keep word id order.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        let unassigned_crossings: Vec<(usize, SlotId, usize)> = self
            .config
            .neighbors(slot_id)
            .iter()
            .filter(|&&neighbor| !assignment.contains_key(&neighbor))
            .filter_map(|&neighbor| {
                self.config
                    .overlap(slot_id, neighbor)
                    .map(|(cell, neighbor_cell)| (cell, neighbor, neighbor_cell))
            })
            .collect();

        let mut options: Vec<(usize, WordId)> = self
            .domains
            .options(slot_id)
            .map(|word_id| {
                let word = self.word_list.word(word_id);
                let eliminated: usize = unassigned_crossings
                    .iter()
                    .map(|&(cell, neighbor, neighbor_cell)| {
                        let glyph = word.glyph(cell);
                        // `bit_set::Iter` under-reports its upper size bound, which `count()` on
                        // a filtered iterator trusts, so tally by hand.
                        self.domains
                            .options(neighbor)
                            .filter(|&other_id| {
                                self.word_list.word(other_id).glyph(neighbor_cell) != glyph
                            })
                            .fold(0, |eliminated, _| eliminated + 1)
                    })
                    .sum();

                (eliminated, word_id)
            })
            .collect();

        options.sort_by_key(|&(eliminated, _)| eliminated);
        options.into_iter().map(|(_, word_id)| word_id).collect()
    }

    /// Pick the unassigned slot with the fewest remaining options, preferring slots with more
    /// crossings and then lower slot ids. Returns `None` once every slot is assigned.
    pub fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
        self.config
            .slot_ids()
            .filter(|slot_id| !assignment.contains_key(slot_id))
            .min_by_key(|&slot_id| {
                (
                    self.domains.option_count(slot_id),
                    Reverse(self.config.neighbors(slot_id).len()),
                    slot_id,
                )
            })
    }

    /// Reduce the chosen slot's domain to its word and propagate. The caller is responsible for
    /// restoring the domains if this doesn't work out.
    fn inference(&mut self, choice: Choice, assignment: &Assignment) -> Inference {
        if CHECK_INVARIANTS && !self.domains.contains(choice.slot_id, choice.word_id) {
            panic!("Choosing a word that was already eliminated?");
        }
        self.domains.restrict_to(choice.slot_id, choice.word_id);

        match establish_arc_consistency(
            self.config,
            self.word_list,
            &mut self.domains,
            Some(arcs_into(self.config, choice.slot_id)),
        ) {
            Err(failure) => Inference::Contradiction {
                slot_id: failure.emptied_slot_id,
            },
            Ok(success) => {
                let forced: Vec<Choice> = success
                    .revised_slot_ids
                    .iter()
                    .filter(|slot_id| !assignment.contains_key(slot_id))
                    .filter_map(|slot_id| {
                        self.domains
                            .single_option(slot_id)
                            .map(|word_id| Choice { slot_id, word_id })
                    })
                    .collect();

                if forced.is_empty() {
                    Inference::Stable
                } else {
                    Inference::Forced(forced)
                }
            }
        }
    }

    fn check_limits(&self) -> Result<(), FillFailure> {
        if let Some(max_states) = self.search_config.max_states {
            if self.statistics.states >= max_states {
                return Err(FillFailure::StateLimitReached);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() > deadline {
                return Err(FillFailure::Timeout);
            }
        }
        Ok(())
    }

    /// Extend `assignment` to a complete one. Returns `Ok(true)` with the assignment completed,
    /// `Ok(false)` with the assignment and domains as they were on entry, or an error if a limit
    /// was hit.
    fn backtrack(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        self.check_limits()?;
        self.statistics.states += 1;

        let Some(slot_id) = self.select_unassigned_slot(assignment) else {
            return Ok(true);
        };

        let snapshot = self.domains.snapshot();

        for word_id in self.order_domain_values(slot_id, assignment) {
            log::trace!(
                "trying {} in slot {} ({} slots assigned)",
                self.word_list.word(word_id).string,
                slot_id,
                assignment.len(),
            );

            assignment.insert(slot_id, word_id);

            if self.consistent(assignment) {
                let forced = match self.inference(Choice { slot_id, word_id }, assignment) {
                    Inference::Contradiction { slot_id: emptied } => {
                        log::trace!("slot {} has no options left", emptied);
                        None
                    }
                    Inference::Stable => Some(vec![]),
                    Inference::Forced(forced) => Some(forced),
                };

                if let Some(forced) = forced {
                    for choice in &forced {
                        if CHECK_INVARIANTS
                            && self.domains.single_option(choice.slot_id) != Some(choice.word_id)
                        {
                            panic!("Forcing a slot that has more than one option?");
                        }
                        assignment.insert(choice.slot_id, choice.word_id);
                    }

                    if self.consistent(assignment) {
                        self.statistics.forced_assignments += forced.len() as u64;
                        if self.backtrack(assignment)? {
                            return Ok(true);
                        }
                    }

                    for choice in &forced {
                        assignment.remove(&choice.slot_id);
                    }
                }
            }

            assignment.remove(&slot_id);
            self.domains.restore(&snapshot);
            self.statistics.backtracks += 1;
        }

        Ok(false)
    }
}

/// Fill the grid, returning `None` if no assignment exists.
pub fn solve(config: &GridConfig, word_list: &WordList) -> Option<Assignment> {
    CrosswordSolver::new(config, word_list).solve()
}

/// Fill the grid within the given limits.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    search_config: &SearchConfig,
) -> Result<FillSuccess, FillFailure> {
    CrosswordSolver::with_search_config(config, word_list, search_config.clone()).find_fill()
}
