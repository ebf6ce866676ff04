//! Center-based rectangles for wall and goal detection.

/// An axis-aligned rectangle described by its center and size.
///
/// Negative centers are clamped to zero before the edges are derived, so a
/// puck that has drifted past the left or bottom wall is still tested as if
/// it sat on the wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub right: f64,
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let x = x.max(0.0);
        let y = y.max(0.0);
        let right = x + width / 2.0;
        let top = y + height / 2.0;
        Self {
            x,
            y,
            width,
            height,
            right,
            left: right - width,
            top,
            bottom: top - height,
        }
    }

    /// Directional overlap used by goal detection.
    ///
    /// Holds when this rectangle's left edge lies inside `other`'s horizontal
    /// span and the vertical spans touch. Not symmetric: swapping the operands
    /// can change the answer.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left <= other.right
            && self.left >= other.left
            && self.bottom <= other.top
            && self.top >= other.bottom
    }

    /// Symmetric intersection test (touching edges count).
    ///
    /// Goal detection does not use this; it is the general AABB test that
    /// [`Rect::overlaps`] deliberately differs from.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.bottom <= other.top
            && other.bottom <= self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GOAL_PROTRUDE, GOAL_SIZE, PUCK_SIZE, TABLE_SIZE};
    use assert_approx_eq::assert_approx_eq;

    fn left_goal() -> Rect {
        Rect::new(0.0, TABLE_SIZE / 2.0, GOAL_PROTRUDE, GOAL_SIZE)
    }

    #[test]
    fn test_edges_from_center() {
        let rect = Rect::new(100.0, 200.0, 50.0, 30.0);
        assert_approx_eq!(rect.right, 125.0);
        assert_approx_eq!(rect.left, 75.0);
        assert_approx_eq!(rect.top, 215.0);
        assert_approx_eq!(rect.bottom, 185.0);
    }

    #[test]
    fn test_negative_center_is_clamped() {
        let rect = Rect::new(-30.0, -1.0, PUCK_SIZE, PUCK_SIZE);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 0.0);
        assert_approx_eq!(rect.left, -25.0);
        assert_approx_eq!(rect.bottom, -25.0);
    }

    #[test]
    fn test_puck_inside_left_goal() {
        let puck = Rect::new(20.0, 500.0, PUCK_SIZE, PUCK_SIZE);
        assert!(puck.overlaps(&left_goal()));
    }

    #[test]
    fn test_overlap_requires_left_edge_inside_other() {
        // Left edge at -25 is outside the goal's [-10, 10] span even though
        // the two rectangles intersect.
        let puck = Rect::new(0.0, 500.0, PUCK_SIZE, PUCK_SIZE);
        assert!(!puck.overlaps(&left_goal()));
        assert!(puck.intersects(&left_goal()));
    }

    #[test]
    fn test_overlap_is_directional() {
        let small = Rect::new(100.0, 100.0, 10.0, 10.0);
        let large = Rect::new(100.0, 100.0, 100.0, 100.0);
        assert!(small.overlaps(&large));
        assert!(!large.overlaps(&small));
    }

    #[test]
    fn test_overlap_vertical_miss() {
        let puck = Rect::new(20.0, 800.0, PUCK_SIZE, PUCK_SIZE);
        assert!(!puck.overlaps(&left_goal()));
    }

    #[test]
    fn test_intersects_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(100.0, 100.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }
}
