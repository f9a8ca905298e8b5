//! Widget placement records
//!
//! A `WidgetLayout` places one widget panel on the dashboard grid. The JSON
//! form keeps the short field names the grid component reads (`i`, `minW`,
//! ...) so a persisted collection can be handed to it unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::LayoutError;

/// The widgets the dashboard knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Weather,
    Clock,
    Sports,
    Resume,
    Stocks,
    Chat,
    Discord,
}

impl WidgetKind {
    /// Every widget, in default layout order
    pub const ALL: [WidgetKind; 7] = [
        WidgetKind::Weather,
        WidgetKind::Clock,
        WidgetKind::Sports,
        WidgetKind::Resume,
        WidgetKind::Stocks,
        WidgetKind::Chat,
        WidgetKind::Discord,
    ];

    /// Stable identifier used in layout records
    pub fn id(&self) -> &'static str {
        match self {
            WidgetKind::Weather => "weather",
            WidgetKind::Clock => "clock",
            WidgetKind::Sports => "sports",
            WidgetKind::Resume => "resume",
            WidgetKind::Stocks => "stocks",
            WidgetKind::Chat => "chat",
            WidgetKind::Discord => "discord",
        }
    }

    /// Looks up a widget by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Named widget dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
}

impl SizeCategory {
    /// Width and height in grid cells
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SizeCategory::Small => (1, 2),
            SizeCategory::Medium => (2, 2),
            SizeCategory::Large => (3, 4),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SizeCategory::Small => "small",
            SizeCategory::Medium => "medium",
            SizeCategory::Large => "large",
        }
    }
}

impl FromStr for SizeCategory {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(SizeCategory::Small),
            "medium" | "m" => Ok(SizeCategory::Medium),
            "large" | "l" => Ok(SizeCategory::Large),
            _ => Err(LayoutError::UnknownSize(s.to_string())),
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position and size of one widget panel, in grid cells
///
/// Size bounds are optional. A missing minimum means 1 and a missing
/// maximum means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetLayout {
    /// Widget identifier, unique within a collection
    #[serde(rename = "i")]
    pub id: String,
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
    /// Width in cells, at least 1
    pub w: u32,
    /// Height in cells, at least 1
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
}

impl WidgetLayout {
    /// Creates an unconstrained record
    pub fn new(id: impl Into<String>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            min_w: None,
            min_h: None,
            max_w: None,
            max_h: None,
        }
    }

    /// Sets the minimum size
    pub fn with_min(mut self, w: u32, h: u32) -> Self {
        self.min_w = Some(w);
        self.min_h = Some(h);
        self
    }

    /// Sets the maximum size
    pub fn with_max(mut self, w: u32, h: u32) -> Self {
        self.max_w = Some(w);
        self.max_h = Some(h);
        self
    }

    /// Effective `(min, max)` width; `None` max means unbounded
    pub fn width_bounds(&self) -> (u32, Option<u32>) {
        (self.min_w.unwrap_or(1), self.max_w)
    }

    /// Effective `(min, max)` height; `None` max means unbounded
    pub fn height_bounds(&self) -> (u32, Option<u32>) {
        (self.min_h.unwrap_or(1), self.max_h)
    }

    /// Whether a `w`×`h` panel satisfies this record's bounds
    pub fn admits(&self, w: u32, h: u32) -> bool {
        within(w, self.width_bounds()) && within(h, self.height_bounds())
    }

    /// Resizes to `w`×`h`, keeping the position
    ///
    /// Bounds that would exclude the new size are widened just enough to
    /// admit it.
    pub fn resize(&mut self, w: u32, h: u32) {
        self.w = w;
        self.h = h;
        widen(&mut self.min_w, &mut self.max_w, w);
        widen(&mut self.min_h, &mut self.max_h, h);
    }

    /// Checks size and bound invariants for this record alone
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.w == 0 || self.h == 0 {
            return Err(LayoutError::EmptySize(self.id.clone()));
        }
        if !bounds_ordered(self.width_bounds()) || !bounds_ordered(self.height_bounds()) {
            return Err(LayoutError::InvertedBounds(self.id.clone()));
        }
        if !self.admits(self.w, self.h) {
            return Err(LayoutError::OutOfBounds {
                id: self.id.clone(),
                w: self.w,
                h: self.h,
            });
        }
        Ok(())
    }
}

fn within(value: u32, (min, max): (u32, Option<u32>)) -> bool {
    value >= min && max.map_or(true, |max| value <= max)
}

fn bounds_ordered((min, max): (u32, Option<u32>)) -> bool {
    max.map_or(true, |max| min <= max)
}

fn widen(min: &mut Option<u32>, max: &mut Option<u32>, value: u32) {
    if min.is_some_and(|lo| value < lo) {
        *min = Some(value);
    }
    if max.is_some_and(|hi| value > hi) {
        *max = Some(value);
    }
}

/// Checks a whole collection: every record valid and ids unique
///
/// The store itself accepts any collection; callers that build one from
/// user input run this first.
pub fn validate_layouts(layouts: &[WidgetLayout]) -> Result<(), LayoutError> {
    let mut seen = HashSet::new();
    for layout in layouts {
        if !seen.insert(layout.id.as_str()) {
            return Err(LayoutError::DuplicateId(layout.id.clone()));
        }
        layout.validate()?;
    }
    Ok(())
}

/// The layout shown before the user has arranged anything
pub fn default_layouts() -> Vec<WidgetLayout> {
    vec![
        WidgetLayout::new(WidgetKind::Weather.id(), 0, 0, 1, 2)
            .with_min(1, 2)
            .with_max(1, 2),
        WidgetLayout::new(WidgetKind::Clock.id(), 1, 0, 1, 2)
            .with_min(1, 1)
            .with_max(1, 2),
        WidgetLayout::new(WidgetKind::Sports.id(), 2, 0, 1, 2)
            .with_min(1, 2)
            .with_max(1, 2),
        WidgetLayout::new(WidgetKind::Resume.id(), 1, 2, 1, 2)
            .with_min(1, 1)
            .with_max(1, 2),
        WidgetLayout::new(WidgetKind::Stocks.id(), 0, 4, 1, 2)
            .with_min(1, 2)
            .with_max(1, 2),
        WidgetLayout::new(WidgetKind::Chat.id(), 1, 4, 2, 2)
            .with_min(2, 2)
            .with_max(2, 2),
        WidgetLayout::new(WidgetKind::Discord.id(), 0, 6, 1, 2)
            .with_min(1, 2)
            .with_max(1, 2),
    ]
}
