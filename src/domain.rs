//! Per-slot candidate sets. Each slot's domain is a `BitSet` of `WordId`s, so iterating a domain
//! always visits words in id (alphabetical) order and a snapshot is a plain clone.

use bit_set::BitSet;
use std::fmt::{Debug, Formatter};

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::{WordId, WordList};

/// The live candidate words for every slot.
#[derive(Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<BitSet>,
}

/// A saved copy of every slot's domain. Restoring it is unaffected by anything done to the live
/// `Domains` after it was taken.
#[derive(Clone, PartialEq, Eq)]
pub struct DomainSnapshot {
    options: Vec<BitSet>,
}

impl Debug for Domains {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<usize> = self.options.iter().map(|options| options.len()).collect();
        f.debug_struct("Domains").field("option_counts", &counts).finish()
    }
}

impl Debug for DomainSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainSnapshot")
            .field("slot_count", &self.options.len())
            .finish()
    }
}

impl Domains {
    /// Give every slot the entire vocabulary.
    pub fn new(config: &GridConfig, word_list: &WordList) -> Domains {
        let all_words: BitSet = (0..word_list.len()).collect();

        Domains {
            options: config.slot_ids().map(|_| all_words.clone()).collect(),
        }
    }

    /// Remove every word whose length differs from its slot's length. Running this more than once
    /// has no further effect.
    pub fn enforce_node_consistency(&mut self, config: &GridConfig, word_list: &WordList) {
        for (slot_id, options) in self.options.iter_mut().enumerate() {
            let length = config.length(slot_id);
            let wrong_length: Vec<WordId> = options
                .iter()
                .filter(|&word_id| word_list.word(word_id).len() != length)
                .collect();

            for word_id in wrong_length {
                options.remove(word_id);
            }
        }
    }

    pub fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            options: self.options.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: &DomainSnapshot) {
        self.options.clone_from(&snapshot.options);
    }

    pub fn options(&self, slot_id: SlotId) -> bit_set::Iter<'_, u32> {
        self.options[slot_id].iter()
    }

    pub fn option_count(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options[slot_id].contains(word_id)
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.options[slot_id].is_empty()
    }

    /// Returns whether the word was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options[slot_id].remove(word_id)
    }

    /// Reduce a slot's domain to the single chosen word.
    pub fn restrict_to(&mut self, slot_id: SlotId, word_id: WordId) {
        let options = &mut self.options[slot_id];
        options.clear();
        options.insert(word_id);
    }

    /// The remaining word, if exactly one is left.
    pub fn single_option(&self, slot_id: SlotId) -> Option<WordId> {
        let mut options = self.options[slot_id].iter();
        match (options.next(), options.next()) {
            (Some(word_id), None) => Some(word_id),
            _ => None,
        }
    }

    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.options.iter().position(|options| options.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::Domains;
    use crate::test_utils::{crossing_pair_config, generate_config};
    use crate::word_list::WordList;

    #[test]
    fn test_initial_domains_hold_every_word() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["CAT", "DOGS", "AT"]);

        let domains = Domains::new(&config, &word_list);

        for slot_id in config.slot_ids() {
            assert_eq!(domains.option_count(slot_id), 3);
        }
    }

    #[test]
    fn test_node_consistency_keeps_only_matching_lengths() {
        let config = generate_config(
            "
            ____
            _###
            _###
            ",
        );
        let word_list = WordList::new(["CAT", "CATS", "DOG", "DOGS", "A", "ELEPHANT"]);

        let mut domains = Domains::new(&config, &word_list);
        domains.enforce_node_consistency(&config, &word_list);

        for slot_id in config.slot_ids() {
            assert!(domains
                .options(slot_id)
                .all(|word_id| word_list.word(word_id).len() == config.length(slot_id)));
        }
        assert_eq!(domains.option_count(0), 2);
        assert_eq!(domains.option_count(1), 2);
    }

    #[test]
    fn test_node_consistency_is_idempotent() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["CAT", "CATS", "ACT", "A"]);

        let mut once = Domains::new(&config, &word_list);
        once.enforce_node_consistency(&config, &word_list);

        let mut twice = once.clone();
        twice.enforce_node_consistency(&config, &word_list);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_restore_undoes_later_changes() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["ACT", "CAR", "CAT"]);

        let mut domains = Domains::new(&config, &word_list);
        let snapshot = domains.snapshot();

        domains.restrict_to(0, 1);
        domains.remove(1, 0);
        assert_eq!(domains.single_option(0), Some(1));
        assert_eq!(domains.option_count(1), 2);

        domains.restore(&snapshot);
        assert_eq!(domains, Domains::new(&config, &word_list));

        // The snapshot itself must not have been touched by the edits above.
        domains.remove(0, 2);
        domains.restore(&snapshot);
        assert_eq!(domains.option_count(0), 3);
    }

    #[test]
    fn test_first_empty_slot() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["ACT"]);

        let mut domains = Domains::new(&config, &word_list);
        assert_eq!(domains.first_empty_slot(), None);
        assert_eq!(domains.single_option(1), Some(0));

        domains.remove(1, 0);
        assert_eq!(domains.first_empty_slot(), Some(1));
        assert!(domains.is_empty(1));
    }
}
