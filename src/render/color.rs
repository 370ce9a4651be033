use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const TEXT_COLOR: Rgb = Rgb::WHITE;

/// What the drawing layer fills behind the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Solid { color: Rgb },
    /// Vertical: `top` at the top edge blending into `bottom`.
    Gradient { top: Rgb, bottom: Rgb },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPolicy {
    pub use_gradient: bool,
    pub use_custom_color: bool,
    pub solid_color: Rgb,
    pub gradient_start: Rgb,
    pub gradient_end: Rgb,
}

impl ColorPolicy {
    pub fn new(use_gradient: bool, use_custom_color: bool) -> Self {
        Self {
            use_gradient,
            use_custom_color,
            solid_color: Rgb::BLACK,
            gradient_start: Rgb::RED,
            gradient_end: Rgb::BLACK,
        }
    }

    /// Builds the policy from color file text.
    ///
    /// Line 1 is the solid color and the gradient start; line 2, read only
    /// when the gradient is on, is the gradient end. A line that does not
    /// parse leaves that value at its default.
    pub fn from_color_file(use_gradient: bool, use_custom_color: bool, contents: &str) -> Self {
        let mut policy = Self::new(use_gradient, use_custom_color);
        if !use_custom_color {
            return policy;
        }

        let mut lines = contents.lines();
        if let Some(first) = lines.next().and_then(parse_color_line) {
            policy.solid_color = first;
            policy.gradient_start = first;
        }
        if use_gradient {
            if let Some(second) = lines.next().and_then(parse_color_line) {
                policy.gradient_end = second;
            }
        }
        policy
    }

    /// Reads the color file when custom colors are on. Read failures are
    /// logged and leave the defaults in place.
    pub fn load(use_gradient: bool, use_custom_color: bool, path: &Path) -> Self {
        if !use_custom_color {
            return Self::new(use_gradient, use_custom_color);
        }
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_color_file(use_gradient, use_custom_color, &contents),
            Err(err) => {
                log::warn!(
                    "Could not open color file {} ({err}); using the default color scheme",
                    path.display()
                );
                Self::new(use_gradient, use_custom_color)
            }
        }
    }

    pub fn resolve(&self) -> Background {
        match (self.use_gradient, self.use_custom_color) {
            (false, false) => Background::Solid { color: Rgb::BLACK },
            (false, true) => Background::Solid {
                color: self.solid_color,
            },
            (true, false) => Background::Gradient {
                top: Rgb::RED,
                bottom: Rgb::BLACK,
            },
            (true, true) => Background::Gradient {
                top: self.gradient_start,
                bottom: self.gradient_end,
            },
        }
    }
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Parses `( r, g, b )` with free whitespace; channels clamp to 0..=255.
pub fn parse_color_line(line: &str) -> Option<Rgb> {
    let body = line.trim().strip_prefix('(')?;
    let body = body.trim_end();
    let body = body.strip_suffix(')').unwrap_or(body);

    let mut channels = body.split(',').map(parse_channel);
    let r = channels.next()??;
    let g = channels.next()??;
    let b = channels.next()??;
    if channels.next().is_some() {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

fn parse_channel(raw: &str) -> Option<u8> {
    let value: i64 = raw.trim().parse().ok()?;
    Some(value.clamp(0, 255) as u8)
}
