use std::fmt;

/// An RGBA colour as used by the chart layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with a different alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Category colours, assigned by label position.
pub const CATEGORY_PALETTE: [Rgba; 6] = [
    Rgba::new(102, 126, 234, 0.8),
    Rgba::new(118, 75, 162, 0.8),
    Rgba::new(255, 99, 132, 0.8),
    Rgba::new(54, 162, 235, 0.8),
    Rgba::new(255, 206, 86, 0.8),
    Rgba::new(75, 192, 192, 0.8),
];

pub const FLOWRATE_COLOR: Rgba = Rgba::new(102, 126, 234, 1.0);
pub const PRESSURE_COLOR: Rgba = Rgba::new(118, 75, 162, 1.0);
pub const TEMPERATURE_COLOR: Rgba = Rgba::new(255, 99, 132, 1.0);

/// Palette slot for the category at `position`.
pub fn category_color_index(position: usize) -> usize {
    position % CATEGORY_PALETTE.len()
}

pub fn category_color(position: usize) -> Rgba {
    CATEGORY_PALETTE[category_color_index(position)]
}
