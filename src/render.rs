use std::fs;
use std::path::Path;

use crate::backtracking_search::Assignment;
use crate::error::{Error, Result};
use crate::grid_config::GridConfig;
use crate::word_list::WordList;

/// Character used for blocked cells in text output.
pub const BLOCK_CHAR: char = '█';

const CELL_SIZE: usize = 100;
const CELL_BORDER: usize = 2;
const FONT_SIZE: usize = 80;

/// Place each assigned word's letters into a row-major grid. Cells that no assigned slot covers
/// are `None`.
pub fn letter_grid(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; config.width]; config.height];

    for (&slot_id, &word_id) in assignment {
        let slot_config = &config.slot_configs[slot_id];
        let word = word_list.word(word_id);

        for ((row, col), &glyph) in slot_config.cell_coords().zip(&word.glyphs) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string, one line per row.
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    letter_grid(config, word_list, assignment)
        .iter()
        .enumerate()
        .map(|(row, letters)| {
            letters
                .iter()
                .enumerate()
                .map(|(col, letter)| {
                    if config.is_open(row, col) {
                        letter.unwrap_or(' ')
                    } else {
                        BLOCK_CHAR
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the grid as an SVG image: black background, white open cells, and each letter centered
/// in its cell.
pub fn render_svg(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let letters = letter_grid(config, word_list, assignment);
    let width = config.width * CELL_SIZE;
    let height = config.height * CELL_SIZE;
    let interior_size = CELL_SIZE - 2 * CELL_BORDER;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );
    svg.push_str(&format!(
        "  <rect width=\"{width}\" height=\"{height}\" fill=\"black\"/>\n"
    ));

    for (row, row_letters) in letters.iter().enumerate() {
        for (col, letter) in row_letters.iter().enumerate() {
            if !config.is_open(row, col) {
                continue;
            }

            let x = col * CELL_SIZE + CELL_BORDER;
            let y = row * CELL_SIZE + CELL_BORDER;
            svg.push_str(&format!(
                r#"  <rect x="{x}" y="{y}" width="{interior_size}" height="{interior_size}" fill="white"/>"#
            ));
            svg.push('\n');

            if let Some(letter) = letter {
                svg.push_str(&format!(
                    r#"  <text x="{}" y="{}" font-family="sans-serif" font-size="{FONT_SIZE}" text-anchor="middle" dominant-baseline="central" fill="black">{}</text>"#,
                    x + interior_size / 2,
                    y + interior_size / 2,
                    escape_xml(*letter),
                ));
                svg.push('\n');
            }
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write the SVG rendering of the grid to `path`.
pub fn save_svg<P: AsRef<Path>>(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render_svg(config, word_list, assignment)).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn escape_xml(letter: char) -> String {
    match letter {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        '\'' => "&apos;".to_string(),
        _ => letter.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::backtracking_search::{solve, Assignment};
    use crate::render::{letter_grid, render_grid, render_svg, save_svg};
    use crate::test_utils::{crossing_pair_config, generate_config};
    use crate::word_list::WordList;

    #[test]
    fn test_render_solved_crossing_pair() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["CAT", "CAR", "ACT"]);
        let assignment = solve(&config, &word_list).expect("Failed to find a fill");

        assert_eq!(render_grid(&config, &word_list, &assignment), "CAR\nA██\nT██");
    }

    #[test]
    fn test_render_partial_assignment_leaves_open_cells_blank() {
        let config = generate_config(
            "
            ___
            _#_
            ",
        );
        let word_list = WordList::new(["DOG"]);
        let assignment = Assignment::from([(0, 0)]);

        assert_eq!(render_grid(&config, &word_list, &assignment), "DOG\n █ ");
        assert_eq!(
            letter_grid(&config, &word_list, &assignment)[1],
            vec![None, None, None]
        );
    }

    #[test]
    fn test_render_svg_draws_open_cells_and_letters() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["CAT", "CAR"]);
        let assignment = Assignment::from([(0, 1), (1, 0)]);

        let svg = render_svg(&config, &word_list, &assignment);

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="300" height="300""#));
        assert_eq!(svg.matches(r#"fill="white""#).count(), 5);
        assert_eq!(svg.matches("<text").count(), 5);
        assert!(svg.contains(">T</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
        // Header, background, five cells, five letters, closing tag.
        assert_eq!(svg.lines().count(), 13);
    }

    #[test]
    fn test_save_svg_writes_file() {
        let config = crossing_pair_config();
        let word_list = WordList::new(["CAT", "CAR"]);
        let assignment = Assignment::from([(0, 1), (1, 0)]);
        let path = std::env::temp_dir().join(format!("crossword-fill-{}.svg", std::process::id()));

        save_svg(&config, &word_list, &assignment, &path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, render_svg(&config, &word_list, &assignment));
        fs::remove_file(&path).unwrap();
    }
}
