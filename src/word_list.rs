use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the WordList's `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let glyphs = string.chars().collect();
        Word { string, glyphs }
    }

    /// The number of letters in the word (not bytes).
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The letter at the given cell, if the word is long enough to reach it.
    pub fn glyph(&self, cell_idx: usize) -> Option<char> {
        self.glyphs.get(cell_idx).copied()
    }
}

/// The full vocabulary available for filling. Words are uppercased, deduplicated, and sorted, so
/// `WordId`s follow alphabetical order and searches that iterate in id order are reproducible.
#[derive(Clone, PartialEq, Eq)]
pub struct WordList {
    pub words: Vec<Word>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: BTreeSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_uppercase())
            .filter(|word| !word.is_empty())
            .collect();

        WordList {
            words: normalized.into_iter().map(Word::new).collect(),
        }
    }

    /// Parse the contents of a word file: one word per line, blank lines ignored.
    pub fn parse(contents: &str) -> WordList {
        WordList::new(contents.lines())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<WordList> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let word_list = WordList::parse(&contents);
        log::debug!("loaded {} words from {}", word_list.len(), path.display());

        Ok(word_list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up the id of a word, ignoring case.
    pub fn find(&self, string: &str) -> Option<WordId> {
        let needle = string.trim().to_uppercase();
        self.words
            .binary_search_by(|word| word.string.as_str().cmp(needle.as_str()))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::word_list::WordList;

    #[test]
    fn test_words_are_normalized() {
        let word_list = WordList::parse("cat\n  Dog \n\nCAT\nact\n");

        let strings: Vec<&str> = word_list.words.iter().map(|w| w.string.as_str()).collect();
        assert_eq!(strings, vec!["ACT", "CAT", "DOG"]);
    }

    #[test]
    fn test_find_ignores_case() {
        let word_list = WordList::new(["one", "two", "three"]);

        assert_eq!(word_list.find("two"), Some(2));
        assert_eq!(word_list.find("THREE"), Some(1));
        assert_eq!(word_list.find("four"), None);
    }

    #[test]
    fn test_word_length_counts_chars() {
        let word_list = WordList::new(["ÉTÉ"]);

        assert_eq!(word_list.word(0).len(), 3);
        assert_eq!(word_list.word(0).glyph(1), Some('T'));
        assert_eq!(word_list.word(0).glyph(3), None);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = WordList::from_file("/nonexistent/words.txt");

        assert!(matches!(result, Err(crate::Error::Io { .. })));
    }
}
