use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::ops::Range;
use std::path::Path;

use crate::error::{Error, Result};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
/// Slot ids are also the stable order used to break ties during search.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing. `Across` sorts before `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// The static geometry of a single slot.
#[derive(Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossing_count", &self.crossings.iter().flatten().count())
            .finish()
    }
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| cell_coord(self.start_cell, self.direction, cell_idx))
    }
}

fn cell_coord(start: GridCoord, direction: Direction, cell_idx: usize) -> GridCoord {
    match direction {
        Direction::Across => (start.0, start.1 + cell_idx),
        Direction::Down => (start.0 + cell_idx, start.1),
    }
}

/// An across or down entry in the input to `GridConfig::from_entries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

impl GridEntry {
    fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.len).map(move |cell_idx| cell_coord(self.loc, self.dir, cell_idx))
    }
}

/// The puzzle geometry: which cells are open, the slots, and the overlap and neighbor relations
/// between slots. Built once and read-only for the rest of the fill.
#[derive(Clone)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    open_cells: Vec<Vec<bool>>,
    pub slot_configs: Vec<SlotConfig>,
    neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("slot_configs", &self.slot_configs)
            .finish()
    }
}

impl GridConfig {
    /// Generate a GridConfig representing a grid with the specified entries. Slot ids follow the
    /// order of `entries`, and the open cells are exactly the cells covered by some entry.
    pub fn from_entries(entries: &[GridEntry]) -> Result<GridConfig> {
        let (height, width) = entries
            .iter()
            .flat_map(|entry| entry.cell_coords())
            .fold((0, 0), |(height, width), (row, col)| {
                (height.max(row + 1), width.max(col + 1))
            });

        let mut open_cells = vec![vec![false; width]; height];
        for (row, col) in entries.iter().flat_map(|entry| entry.cell_coords()) {
            open_cells[row][col] = true;
        }

        GridConfig::build(width, height, open_cells, entries)
    }

    /// Generate a GridConfig from the contents of a structure file. Each line is a row; `_` or a
    /// space marks a fillable cell and anything else is a block. Rows shorter than the widest row
    /// are padded with blocks. Slots are the maximal runs of at least two fillable cells, ordered
    /// by start cell and then direction.
    pub fn from_structure_str(structure: &str) -> Result<GridConfig> {
        let rows: Vec<Vec<bool>> = structure
            .lines()
            .map(|line| {
                line.trim_end_matches('\r')
                    .chars()
                    .map(|c| c == '_' || c == ' ')
                    .collect()
            })
            .collect();

        let height = rows.len();
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(Error::EmptyStructure);
        }

        let open_cells: Vec<Vec<bool>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, false);
                row
            })
            .collect();

        let mut entries: Vec<GridEntry> = vec![];

        // Runs can be found with the same scan in both directions by walking each line of cells
        // and closing a run at every block and at the end of the line.
        let mut collect_runs = |line_count: usize, line_len: usize, dir: Direction| {
            for line in 0..line_count {
                let mut run_start: Option<usize> = None;

                for pos in 0..=line_len {
                    let open = pos < line_len
                        && match dir {
                            Direction::Across => open_cells[line][pos],
                            Direction::Down => open_cells[pos][line],
                        };

                    match (open, run_start) {
                        (true, None) => run_start = Some(pos),
                        (false, Some(start)) => {
                            if pos - start > 1 {
                                let loc = match dir {
                                    Direction::Across => (line, start),
                                    Direction::Down => (start, line),
                                };
                                entries.push(GridEntry { loc, len: pos - start, dir });
                            }
                            run_start = None;
                        }
                        _ => {}
                    }
                }
            }
        };
        collect_runs(height, width, Direction::Across);
        collect_runs(width, height, Direction::Down);

        entries.sort_by_key(|entry| (entry.loc, entry.dir));

        GridConfig::build(width, height, open_cells, &entries)
    }

    pub fn from_structure_file<P: AsRef<Path>>(path: P) -> Result<GridConfig> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = GridConfig::from_structure_str(&contents)?;
        log::debug!(
            "loaded {}x{} structure with {} slots from {}",
            config.height,
            config.width,
            config.slot_count(),
            path.display(),
        );

        Ok(config)
    }

    fn build(
        width: usize,
        height: usize,
        open_cells: Vec<Vec<bool>>,
        entries: &[GridEntry],
    ) -> Result<GridConfig> {
        if let Some(slot_id) = entries.iter().position(|entry| entry.len == 0) {
            return Err(Error::EmptySlot { slot_id });
        }

        // Build a map from cell location to the entries involved, which we can then use to
        // calculate crossings. Each value is a list of (entry index, cell index within entry).
        let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> =
            HashMap::new();

        for (entry_idx, entry) in entries.iter().enumerate() {
            for (cell_idx, loc) in entry.cell_coords().enumerate() {
                let cell_entries = entries_by_loc.entry(loc).or_default();
                if cell_entries.len() == 2 {
                    return Err(Error::CrowdedCell { row: loc.0, col: loc.1 });
                }
                cell_entries.push((entry_idx, cell_idx));
            }
        }

        let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(entries.len());
        let mut neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>> =
            Vec::with_capacity(entries.len());

        for (entry_idx, entry) in entries.iter().enumerate() {
            let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = entry
                .cell_coords()
                .map(|loc| {
                    entries_by_loc[&loc]
                        .iter()
                        .find(|&&(other_entry_idx, _)| other_entry_idx != entry_idx)
                        .map(|&(other_slot_id, other_slot_cell)| Crossing {
                            other_slot_id,
                            other_slot_cell,
                        })
                })
                .collect();

            let mut slot_neighbors: SmallVec<[SlotId; MAX_SLOT_LENGTH]> = crossings
                .iter()
                .flatten()
                .map(|crossing| crossing.other_slot_id)
                .collect();
            slot_neighbors.sort_unstable();

            if let Some(pair) = slot_neighbors.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(Error::MultipleOverlaps {
                    first: entry_idx.min(pair[0]),
                    second: entry_idx.max(pair[0]),
                });
            }

            slot_configs.push(SlotConfig {
                id: entry_idx,
                start_cell: entry.loc,
                direction: entry.dir,
                length: entry.len,
                crossings,
            });
            neighbors.push(slot_neighbors);
        }

        let config = GridConfig {
            width,
            height,
            open_cells,
            slot_configs,
            neighbors,
        };
        config.validate_overlaps()?;

        Ok(config)
    }

    /// Make sure every crossing is mirrored by the slot it points at. Propagation relies on this,
    /// so a broken table is rejected up front.
    fn validate_overlaps(&self) -> Result<()> {
        for slot_config in &self.slot_configs {
            for (cell_idx, crossing) in slot_config.crossings.iter().enumerate() {
                let Some(crossing) = crossing else { continue };

                let mirrored = self
                    .slot_configs
                    .get(crossing.other_slot_id)
                    .and_then(|other| other.crossings.get(crossing.other_slot_cell))
                    .copied()
                    .flatten();

                if mirrored
                    != Some(Crossing {
                        other_slot_id: slot_config.id,
                        other_slot_cell: cell_idx,
                    })
                {
                    return Err(Error::AsymmetricOverlap {
                        first: slot_config.id,
                        second: crossing.other_slot_id,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slot_ids(&self) -> Range<SlotId> {
        0..self.slot_configs.len()
    }

    pub fn length(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].length
    }

    pub fn direction(&self, slot_id: SlotId) -> Direction {
        self.slot_configs[slot_id].direction
    }

    pub fn start(&self, slot_id: SlotId) -> GridCoord {
        self.slot_configs[slot_id].start_cell
    }

    /// The cell index within each slot at which `slot_id` and `other_slot_id` intersect, if they
    /// do. `overlap(a, b)` is always the mirror image of `overlap(b, a)`.
    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<(usize, usize)> {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == other_slot_id => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    /// The slots that cross this one, in ascending id order.
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    /// Is the given cell fillable? Cells outside the grid are treated as blocks.
    pub fn is_open(&self, row: usize, col: usize) -> bool {
        self.open_cells
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::grid_config::{Direction, GridConfig, GridEntry};
    use crate::test_utils::generate_config;
    use crate::Error;

    #[test]
    fn test_slots_are_discovered_in_stable_order() {
        let config = generate_config(
            "
            #___#
            #_##_
            #_##_
            #_##_
            #____
            ",
        );

        let slots: Vec<_> = config
            .slot_configs
            .iter()
            .map(|slot| (slot.start_cell, slot.direction, slot.length))
            .collect();

        assert_eq!(
            slots,
            vec![
                ((0, 1), Direction::Across, 3),
                ((0, 1), Direction::Down, 5),
                ((1, 4), Direction::Down, 4),
                ((4, 1), Direction::Across, 4),
            ]
        );
        assert_eq!((config.height, config.width), (5, 5));
    }

    #[test]
    fn test_overlaps_are_symmetric() {
        let config = generate_config(
            "
            #___#
            #_##_
            #_##_
            #_##_
            #____
            ",
        );

        assert_eq!(config.overlap(0, 1), Some((0, 0)));
        assert_eq!(config.overlap(1, 3), Some((4, 0)));
        assert_eq!(config.overlap(3, 1), Some((0, 4)));
        assert_eq!(config.overlap(2, 3), Some((3, 3)));
        assert_eq!(config.overlap(0, 2), None);

        for a in config.slot_ids() {
            for b in config.slot_ids() {
                assert_eq!(
                    config.overlap(a, b),
                    config.overlap(b, a).map(|(i, j)| (j, i))
                );
            }
        }
    }

    #[test]
    fn test_neighbors_follow_overlaps() {
        let config = generate_config(
            "
            #___#
            #_##_
            #_##_
            #_##_
            #____
            ",
        );

        assert_eq!(config.neighbors(0), &[1]);
        assert_eq!(config.neighbors(1), &[0, 3]);
        assert_eq!(config.neighbors(2), &[3]);
        assert_eq!(config.neighbors(3), &[1, 2]);
    }

    #[test]
    fn test_blank_cells_are_fillable_and_short_rows_are_padded() {
        let config = GridConfig::from_structure_str("   \n #\n").unwrap();

        assert!(config.is_open(0, 2));
        assert!(!config.is_open(1, 1));
        assert!(!config.is_open(1, 2));
        assert_eq!(config.slot_count(), 2);
        assert_eq!(config.overlap(0, 1), Some((0, 0)));
    }

    #[test]
    fn test_single_cells_are_not_slots() {
        let config = generate_config(
            "
            _#_
            ###
            _#_
            ",
        );

        assert_eq!(config.slot_count(), 0);
        assert!(config.is_open(2, 2));
    }

    #[test]
    fn test_empty_structure_is_rejected() {
        assert!(matches!(
            GridConfig::from_structure_str(""),
            Err(Error::EmptyStructure)
        ));
    }

    #[test]
    fn test_from_entries_keeps_entry_order() {
        let config = GridConfig::from_entries(&[
            GridEntry { loc: (0, 2), len: 3, dir: Direction::Down },
            GridEntry { loc: (0, 0), len: 3, dir: Direction::Across },
        ])
        .unwrap();

        assert_eq!(config.start(0), (0, 2));
        assert_eq!(config.direction(1), Direction::Across);
        assert_eq!(config.overlap(0, 1), Some((0, 2)));
        assert_eq!((config.height, config.width), (3, 3));
        assert!(!config.is_open(1, 0));
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        assert!(matches!(
            GridConfig::from_entries(&[GridEntry { loc: (0, 0), len: 0, dir: Direction::Across }]),
            Err(Error::EmptySlot { slot_id: 0 })
        ));

        assert!(matches!(
            GridConfig::from_entries(&[
                GridEntry { loc: (0, 0), len: 3, dir: Direction::Across },
                GridEntry { loc: (0, 1), len: 3, dir: Direction::Across },
            ]),
            Err(Error::MultipleOverlaps { first: 0, second: 1 })
        ));

        assert!(matches!(
            GridConfig::from_entries(&[
                GridEntry { loc: (0, 0), len: 3, dir: Direction::Across },
                GridEntry { loc: (0, 1), len: 2, dir: Direction::Down },
                GridEntry { loc: (0, 1), len: 2, dir: Direction::Across },
            ]),
            Err(Error::CrowdedCell { row: 0, col: 1 })
        ));
    }
}
