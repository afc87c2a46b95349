//! Stroke styling shared by surface implementations.

use peniko::Color;

/// How marks are painted and layered over the page.
#[derive(Debug, Clone, Copy)]
pub struct MarkStyle {
    /// Stroke color for every mark kind.
    pub stroke_color: Color,
    /// Stacking order while the surface receives pointer input.
    pub raised_z_index: i32,
    /// Stacking order otherwise.
    pub base_z_index: i32,
}

impl Default for MarkStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            raised_z_index: 9999,
            base_z_index: 0,
        }
    }
}

impl MarkStyle {
    /// Set the stroke color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.stroke_color = color;
        self
    }

    /// Stacking order for the given raised state.
    pub fn z_index(&self, raised: bool) -> i32 {
        if raised {
            self.raised_z_index
        } else {
            self.base_z_index
        }
    }
}
