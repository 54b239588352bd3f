/// Shared geometric primitives and window state enumerations.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRectError {
    #[error("expected 4 components in rectangle {input:?}, found {found}")]
    ComponentCount { input: String, found: usize },
    #[error("invalid rectangle component {component:?} in {input:?}")]
    InvalidComponent { input: String, component: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Integer rectangle in screen coordinates.
///
/// The canonical text form is `X=<n>, Y=<n>,Width=<n>,Height=<n>`; the
/// irregular spacing is part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn left(&self) -> i32 {
        self.x
    }

    pub const fn top(&self) -> i32 {
        self.y
    }

    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True iff all four components are zero.
    pub const fn is_empty(&self) -> bool {
        self.x == 0 && self.y == 0 && self.width == 0 && self.height == 0
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub const fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x.max(other.x) < self.right().min(other.right())
            && self.y.max(other.y) < self.bottom().min(other.bottom())
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X={}, Y={},Width={},Height={}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl FromStr for Rect {
    type Err = ParseRectError;

    /// Accepts the canonical form, bare `x,y,w,h` lists and `;` separators.
    /// Fractional components are truncated toward zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .split([',', ';'])
            .map(|part| strip_label(part.trim(), &["X=", "Y=", "Width=", "Height="]))
            .collect::<Vec<_>>();
        if components.len() != 4 {
            return Err(ParseRectError::ComponentCount {
                input: s.to_string(),
                found: components.len(),
            });
        }

        let mut values = [0_i32; 4];
        for (slot, component) in values.iter_mut().zip(&components) {
            *slot = parse_component(component).ok_or_else(|| ParseRectError::InvalidComponent {
                input: s.to_string(),
                component: component.to_string(),
            })?;
        }

        Ok(Rect::new(values[0], values[1], values[2], values[3]))
    }
}

fn strip_label<'a>(part: &'a str, labels: &[&str]) -> &'a str {
    labels
        .iter()
        .find_map(|label| part.strip_prefix(label))
        .unwrap_or(part)
        .trim()
}

fn parse_component(component: &str) -> Option<i32> {
    if let Ok(value) = component.parse::<i32>() {
        return Some(value);
    }
    let value = component.parse::<f64>().ok()?;
    if !value.is_finite() || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    Some(value.trunc() as i32)
}

/// Display resolution in dots per inch, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dpi {
    pub x: f32,
    pub y: f32,
}

impl Dpi {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={}, Y={}", self.x, self.y)
    }
}

impl FromStr for Dpi {
    type Err = ParseRectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .split([',', ';'])
            .map(|part| strip_label(part.trim(), &["X=", "Y="]))
            .collect::<Vec<_>>();
        let [x, y] = components.as_slice() else {
            return Err(ParseRectError::ComponentCount {
                input: s.to_string(),
                found: components.len(),
            });
        };
        let parse = |component: &str| {
            component
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| ParseRectError::InvalidComponent {
                    input: s.to_string(),
                    component: component.to_string(),
                })
        };
        Ok(Self::new(parse(*x)?, parse(*y)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Minimized,
}

impl WindowState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Maximized => "Maximized",
            Self::Minimized => "Minimized",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.strip_prefix("State").unwrap_or(trimmed) {
            "Normal" => Ok(Self::Normal),
            "Maximized" => Ok(Self::Maximized),
            "Minimized" => Ok(Self::Minimized),
            _ => Err(ParseEnumError {
                kind: "window state",
                value: s.to_string(),
            }),
        }
    }
}

/// How an off-screen window is brought back into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeChangeMode {
    /// Only the top-left corner is moved; the size is kept.
    #[default]
    MoveTopLeft,
    /// The window is moved and shrunk until it fits the target display.
    ResizeFit,
}

impl SizeChangeMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoveTopLeft => "MoveTopLeft",
            Self::ResizeFit => "ResizeFit",
        }
    }
}

impl fmt::Display for SizeChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeChangeMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MoveTopLeft" => Ok(Self::MoveTopLeft),
            "ResizeFit" => Ok(Self::ResizeFit),
            _ => Err(ParseEnumError {
                kind: "size change mode",
                value: s.to_string(),
            }),
        }
    }
}
