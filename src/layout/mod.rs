//! Widget layout persistence
//!
//! Remembers where each widget panel sits on the dashboard grid and how big
//! it is, across restarts, with a hardcoded default arrangement to fall back
//! on.

mod record;
mod store;

pub use record::{default_layouts, validate_layouts, SizeCategory, WidgetKind, WidgetLayout};
pub use store::{LayoutStore, LAYOUT_STORAGE_KEY};

use thiserror::Error;

/// Problems with a layout collection or a layout request
///
/// The store never returns these; they come from validation and parsing,
/// which belong to whoever builds a new collection.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Two records share an id
    #[error("Duplicate widget id: '{0}'")]
    DuplicateId(String),

    /// A width or height of zero
    #[error("Widget '{0}' must be at least 1x1")]
    EmptySize(String),

    /// A minimum larger than its maximum
    #[error("Widget '{0}' has a minimum size larger than its maximum")]
    InvertedBounds(String),

    /// The size falls outside the record's own bounds
    #[error("Widget '{id}' size {w}x{h} is outside its size bounds")]
    OutOfBounds { id: String, w: u32, h: u32 },

    /// The size category name is not recognized
    #[error("Invalid size: '{0}'. Valid sizes: small, medium, large")]
    UnknownSize(String),

    /// No widget with this id in the collection
    #[error("Unknown widget: '{0}'")]
    UnknownWidget(String),
}
