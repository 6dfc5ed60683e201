use egui::{vec2, Pos2, Rect, Vec2};

use crate::config::Icon;

/// Dots per row/column.
pub const GRID_DIM: usize = 3;
/// Total number of dots in the grid.
pub const DOT_COUNT: usize = GRID_DIM * GRID_DIM;
/// Side length of a single dot, in points.
pub const DOT_SIZE: f32 = 10.0;
/// Gap between adjacent dots, in points.
pub const DOT_GAP: f32 = 6.0;
/// Side length of the full grid: the outer dot edges sit on the grid bounds.
pub const GRID_SIDE: f32 = GRID_DIM as f32 * DOT_SIZE + (GRID_DIM as f32 - 1.0) * DOT_GAP;

/// Natural size of the grid footprint.
pub fn grid_size() -> Vec2 {
    Vec2::splat(GRID_SIDE)
}

/// Rect of the dot at `index` (0..9, row-major) for a grid anchored at `origin`.
pub fn dot_rect(origin: Pos2, index: usize) -> Rect {
    debug_assert!(index < DOT_COUNT);
    let row = (index / GRID_DIM) as f32;
    let col = (index % GRID_DIM) as f32;
    let step = DOT_SIZE + DOT_GAP;
    Rect::from_min_size(origin + vec2(col * step, row * step), Vec2::splat(DOT_SIZE))
}

/// Corner radius for a dot: circles are squares rounded to half the side.
pub fn corner_radius(icon: Icon) -> f32 {
    match icon {
        Icon::Circle => DOT_SIZE / 2.0,
        Icon::Square => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_grid_side() {
        assert_eq!(GRID_SIDE, 42.0);
    }

    #[test]
    fn test_dot_rects_form_3x3_grid() {
        let origin = pos2(100.0, 200.0);
        for index in 0..DOT_COUNT {
            let rect = dot_rect(origin, index);
            assert_eq!(rect.width(), DOT_SIZE);
            assert_eq!(rect.height(), DOT_SIZE);

            let row = (index / GRID_DIM) as f32;
            let col = (index % GRID_DIM) as f32;
            assert_eq!(rect.min.x, origin.x + col * (DOT_SIZE + DOT_GAP));
            assert_eq!(rect.min.y, origin.y + row * (DOT_SIZE + DOT_GAP));
        }
    }

    #[test]
    fn test_adjacent_gap_is_six() {
        let origin = pos2(0.0, 0.0);
        // Horizontal neighbour
        assert_eq!(
            dot_rect(origin, 1).min.x - dot_rect(origin, 0).max.x,
            DOT_GAP
        );
        // Vertical neighbour
        assert_eq!(
            dot_rect(origin, 3).min.y - dot_rect(origin, 0).max.y,
            DOT_GAP
        );
    }

    #[test]
    fn test_outer_edges_align_with_bounds() {
        let origin = pos2(0.0, 0.0);
        assert_eq!(dot_rect(origin, 0).min, origin);
        assert_eq!(dot_rect(origin, 8).max, pos2(GRID_SIDE, GRID_SIDE));
    }

    #[test]
    fn test_corner_radius() {
        assert_eq!(corner_radius(Icon::Circle), DOT_SIZE / 2.0);
        assert_eq!(corner_radius(Icon::Square), 0.0);
    }
}
