//! This module implements the AC-3 algorithm for establishing arc consistency between crossing
//! slots. An arc `(x, y)` is consistent when every word left in x's domain has at least one word in
//! y's domain with the same letter at the cell the two slots share. We keep revising arcs until no
//! more eliminations are possible or some slot runs out of options.

use bit_set::BitSet;
use std::collections::{HashSet, VecDeque};

use crate::domain::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// A directed pair of crossing slots: the first slot's options are checked against the second's.
pub type Arc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`, recording which slots lost at
/// least one option along the way.
#[derive(Debug)]
pub struct ArcConsistencySuccess {
    pub revised_slot_ids: BitSet,
}

/// Result from a failed call to `establish_arc_consistency`, naming the slot whose options were
/// wiped out.
#[derive(Debug, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub emptied_slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// FIFO worklist of arcs that need to be revised. An arc that's already waiting isn't queued a
/// second time, since revising it once with the latest domains covers both requests.
#[derive(Debug)]
struct ArcQueue {
    queue: VecDeque<Arc>,
    pending: HashSet<Arc>,
}

impl ArcQueue {
    fn with_initial_queue<Items>(items: Items) -> ArcQueue
    where
        Items: IntoIterator<Item = Arc>,
    {
        let mut queue = ArcQueue {
            queue: VecDeque::new(),
            pending: HashSet::new(),
        };
        for arc in items {
            queue.enqueue(arc);
        }
        queue
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.pending.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.pending.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Every ordered pair of slots that overlap, in slot id order.
pub fn all_arcs(config: &GridConfig) -> Vec<Arc> {
    config
        .slot_ids()
        .flat_map(|slot_id| {
            config
                .neighbors(slot_id)
                .iter()
                .map(move |&neighbor| (slot_id, neighbor))
        })
        .collect()
}

/// The arcs `(neighbor, slot_id)` for each neighbor of the slot. After a slot's domain shrinks,
/// these are the only arcs whose consistency can have changed.
pub fn arcs_into(config: &GridConfig, slot_id: SlotId) -> Vec<Arc> {
    config
        .neighbors(slot_id)
        .iter()
        .map(|&neighbor| (neighbor, slot_id))
        .collect()
}

/// Make slot `x` arc consistent with slot `y` by removing every option for `x` that has no
/// supporting option in `y`. Returns whether anything was removed. Slots that don't overlap are
/// trivially consistent.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return false;
    };

    // Collect the letters `y` can still place in the shared cell once, rather than scanning y's
    // domain for every option of x.
    let supported_glyphs: HashSet<char> = domains
        .options(y)
        .filter_map(|word_id| word_list.word(word_id).glyph(y_cell))
        .collect();

    let unsupported: Vec<WordId> = domains
        .options(x)
        .filter(|&word_id| {
            word_list
                .word(word_id)
                .glyph(x_cell)
                .map_or(true, |glyph| !supported_glyphs.contains(&glyph))
        })
        .collect();

    for &word_id in &unsupported {
        domains.remove(x, word_id);
    }

    !unsupported.is_empty()
}

/// Run AC-3 until the worklist drains. If `arcs` is `None`, start from every arc in the grid;
/// otherwise start from the given arcs only. Whenever `x` is revised against `y`, every arc
/// `(z, x)` with `z != y` is queued again because `z` may have lost its support in `x`.
pub fn establish_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    let mut queue = ArcQueue::with_initial_queue(arcs.unwrap_or_else(|| all_arcs(config)));
    let mut revised_slot_ids = BitSet::with_capacity(config.slot_count());

    while let Some((x, y)) = queue.pop_front() {
        if !revise(config, word_list, domains, x, y) {
            continue;
        }

        log::trace!(
            "revised slot {} against slot {}: {} options left",
            x,
            y,
            domains.option_count(x)
        );
        revised_slot_ids.insert(x);

        if domains.is_empty(x) {
            return Err(ArcConsistencyFailure { emptied_slot_id: x });
        }

        for &z in config.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    Ok(ArcConsistencySuccess { revised_slot_ids })
}
