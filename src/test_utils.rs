use crate::backtracking_search::Assignment;
use crate::grid_config::GridConfig;
use crate::word_list::WordList;

/// Build a GridConfig from an indented template, ignoring leading whitespace and blank lines.
pub fn generate_config(template: &str) -> GridConfig {
    let structure: Vec<&str> = template
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    GridConfig::from_structure_str(&structure.join("\n")).expect("Invalid test structure")
}

/// Two 3-letter slots crossing at their first cell: 0 is across, 1 is down.
pub fn crossing_pair_config() -> GridConfig {
    generate_config(
        "
        ___
        _##
        _##
        ",
    )
}

/// Map an assignment to the chosen strings, for readable assertions.
pub fn assignment_strings<'a>(word_list: &'a WordList, assignment: &Assignment) -> Vec<&'a str> {
    assignment
        .values()
        .map(|&word_id| word_list.word(word_id).string.as_str())
        .collect()
}

/// Check everything a complete fill has to satisfy.
pub fn assert_valid_fill(config: &GridConfig, word_list: &WordList, assignment: &Assignment) {
    assert_eq!(assignment.len(), config.slot_count(), "every slot is filled");

    for (&slot_id, &word_id) in assignment {
        let word = word_list.word(word_id);
        assert_eq!(word.len(), config.length(slot_id), "{} fits slot {}", word.string, slot_id);

        for &neighbor in config.neighbors(slot_id) {
            let (cell, neighbor_cell) = config.overlap(slot_id, neighbor).unwrap();
            let neighbor_word = word_list.word(assignment[&neighbor]);
            assert_eq!(
                word.glyph(cell),
                neighbor_word.glyph(neighbor_cell),
                "{} crosses {}",
                word.string,
                neighbor_word.string,
            );
        }
    }

    let mut word_ids: Vec<_> = assignment.values().collect();
    word_ids.sort_unstable();
    word_ids.dedup();
    assert_eq!(word_ids.len(), assignment.len(), "no word is used twice");
}
