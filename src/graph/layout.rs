//! Grid seed layout.

/// Distance between neighbouring grid cells.
pub const GRID_SPACING: f64 = 120.0;

/// Returns seed positions for `n` nodes on a square grid.
///
/// The grid has side `ceil(sqrt(n))` and is filled row by row, starting one
/// cell in from the origin.
#[must_use]
pub fn grid_positions(n: usize, spacing: f64) -> Vec<(f64, f64)> {
    let side = (1..).find(|s: &usize| s * s >= n).unwrap_or(1);
    (0..n)
        .map(|index| {
            let row = index / side;
            let col = index % side;
            (cell(col) * spacing, cell(row) * spacing)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn cell(i: usize) -> f64 {
    (i + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(grid_positions(0, GRID_SPACING).is_empty());
    }

    #[test]
    fn test_single_node() {
        assert_eq!(grid_positions(1, 120.0), vec![(120.0, 120.0)]);
    }

    #[test]
    fn test_five_nodes_use_three_columns() {
        let positions = grid_positions(5, 120.0);
        assert_eq!(
            positions,
            vec![
                (120.0, 120.0),
                (240.0, 120.0),
                (360.0, 120.0),
                (120.0, 240.0),
                (240.0, 240.0),
            ]
        );
    }

    #[test]
    fn test_perfect_square() {
        let positions = grid_positions(4, 10.0);
        assert_eq!(positions[3], (20.0, 20.0));
    }
}
