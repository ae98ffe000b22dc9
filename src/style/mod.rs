//! # Style
//!
//! Colors and the house palette. Reports use a fixed look, so there is no
//! cascade: renderers pick from [`Palette`] directly.

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// The house palette shared by flowed documents.
pub struct Palette;

impl Palette {
    /// Header bar, accent stripe, labels.
    pub const ACCENT: Color = Color::rgb(0.082, 0.365, 0.306);
    /// Body text.
    pub const INK: Color = Color::rgb(0.12, 0.13, 0.15);
    /// Footer and secondary text.
    pub const MUTED: Color = Color::rgb(0.42, 0.45, 0.48);
    /// Block borders.
    pub const BORDER: Color = Color::rgb(0.80, 0.83, 0.85);
    /// Block background.
    pub const SURFACE: Color = Color::rgb(0.975, 0.98, 0.982);
    /// Row separators inside tables.
    pub const RULE: Color = Color::rgb(0.90, 0.92, 0.93);
    /// Failed inspection checks.
    pub const ALERT: Color = Color::rgb(0.70, 0.16, 0.14);
    /// Debug crosshairs in overlay calibration mode.
    pub const DEBUG: Color = Color::rgb(0.90, 0.0, 0.45);
}
