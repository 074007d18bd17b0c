//! Row builders
//!
//! Every row is laid out on a grid of lane columns separated by one spacer
//! column. Trailing blanks are trimmed.

const NODE: char = '●';
const LANE: char = '│';
const HORIZONTAL: char = '─';
const CROSSING: char = '┼';
const TEE_RIGHT: char = '├';
const TEE_LEFT: char = '┤';
const TEE_DOWN: char = '┬';
const TEE_UP: char = '┴';
const CORNER_DOWN_LEFT: char = '┐';
const CORNER_DOWN_RIGHT: char = '┌';
const CORNER_UP_LEFT: char = '┘';

fn is_occupied(occupied: &[bool], col: usize) -> bool {
    occupied.get(col).copied().unwrap_or(false)
}

fn finish(row: String) -> String {
    row.trim_end().to_string()
}

/// Marker at the node's lane, a bar at every other occupied lane
pub(super) fn node_row(occupied: &[bool], node_col: usize) -> String {
    let width = occupied.len().max(node_col + 1);
    let mut row = String::new();

    for col in 0..width {
        if col == node_col {
            row.push(NODE);
        } else if is_occupied(occupied, col) {
            row.push(LANE);
        } else {
            row.push(' ');
        }
        if col + 1 < width {
            row.push(' ');
        }
    }

    finish(row)
}

/// A bar for every open lane
pub(super) fn connector_row(occupied: &[bool]) -> String {
    let mut row = String::new();

    for (col, open) in occupied.iter().enumerate() {
        row.push(if *open { LANE } else { ' ' });
        if col + 1 < occupied.len() {
            row.push(' ');
        }
    }

    finish(row)
}

/// Sweep from the node's lane out to every child lane
pub(super) fn branch_row(occupied: &[bool], node_col: usize, child_cols: &[usize]) -> String {
    sweep(occupied, node_col, child_cols, |col, min, max| {
        if col < node_col {
            if col == min {
                CORNER_DOWN_RIGHT
            } else {
                TEE_DOWN
            }
        } else if col == max {
            CORNER_DOWN_LEFT
        } else {
            TEE_DOWN
        }
    })
}

/// Sweep from the other parent lanes into the node's lane
pub(super) fn merge_row(occupied: &[bool], parent_cols: &[usize], node_col: usize) -> String {
    sweep(occupied, node_col, parent_cols, |col, _, max| {
        if col == max {
            CORNER_UP_LEFT
        } else {
            TEE_UP
        }
    })
}

fn sweep(
    occupied: &[bool],
    node_col: usize,
    cols: &[usize],
    endpoint: impl Fn(usize, usize, usize) -> char,
) -> String {
    let min = cols.iter().copied().chain([node_col]).min().unwrap_or(node_col);
    let max = cols.iter().copied().chain([node_col]).max().unwrap_or(node_col);
    let last = max.max(occupied.len().saturating_sub(1));
    let mut row = String::new();

    for col in 0..=last {
        let glyph = if col == node_col {
            if node_col == min {
                TEE_RIGHT
            } else if node_col == max {
                TEE_LEFT
            } else {
                CROSSING
            }
        } else if cols.contains(&col) {
            endpoint(col, min, max)
        } else if col > min && col < max {
            if is_occupied(occupied, col) {
                CROSSING
            } else {
                HORIZONTAL
            }
        } else if is_occupied(occupied, col) {
            LANE
        } else {
            ' '
        };
        row.push(glyph);

        if col >= min && col < max {
            row.push(HORIZONTAL);
        } else if col < last {
            row.push(' ');
        }
    }

    finish(row)
}
