//! Persisted widget layout collection
//!
//! Holds the current arrangement of widget panels in memory and mirrors it
//! to storage after every change. Storage failures never reach the caller:
//! they are logged and the store carries on with its in-memory copy.

use tracing::{debug, warn};

use super::record::{default_layouts, SizeCategory, WidgetLayout};
use crate::storage::Storage;

/// Storage key holding the whole serialized collection
pub const LAYOUT_STORAGE_KEY: &str = "widget-layouts";

/// The dashboard's widget arrangement
///
/// The persisted copy is read lazily, on the first access in a session.
#[derive(Debug)]
pub struct LayoutStore<S> {
    storage: S,
    layouts: Option<Vec<WidgetLayout>>,
}

impl<S: Storage> LayoutStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            layouts: None,
        }
    }

    /// Returns the current collection, loading it on first use
    ///
    /// Falls back to the default layout when nothing is persisted or the
    /// persisted copy cannot be read.
    pub fn layouts(&mut self) -> &[WidgetLayout] {
        self.loaded()
    }

    /// Replaces the whole collection and persists it
    ///
    /// No validation happens here; see `validate_layouts`.
    pub fn update_layouts(&mut self, layouts: Vec<WidgetLayout>) {
        self.layouts = Some(layouts);
        self.persist();
    }

    /// Forgets the persisted collection and returns to the default layout
    pub fn reset_layouts(&mut self) {
        if let Err(e) = self.storage.remove_item(LAYOUT_STORAGE_KEY) {
            warn!(error = %e, "failed to remove persisted layouts");
        }
        self.layouts = Some(default_layouts());
        debug!("layouts reset to default");
    }

    /// Resizes the widget `id` to the given category, keeping its position
    ///
    /// Returns `false` and changes nothing if no widget has that id.
    pub fn update_widget_size(&mut self, id: &str, size: SizeCategory) -> bool {
        let Some(layout) = self.loaded().iter_mut().find(|layout| layout.id == id) else {
            debug!(id, "resize requested for unknown widget");
            return false;
        };

        let (w, h) = size.dimensions();
        layout.resize(w, h);
        self.persist();
        true
    }

    /// Looks up a single widget's record
    pub fn get(&mut self, id: &str) -> Option<&WidgetLayout> {
        self.layouts().iter().find(|layout| layout.id == id)
    }

    fn loaded(&mut self) -> &mut Vec<WidgetLayout> {
        if self.layouts.is_none() {
            self.layouts = Some(self.load());
        }
        self.layouts.get_or_insert_with(default_layouts)
    }

    fn load(&self) -> Vec<WidgetLayout> {
        let raw = match self.storage.get_item(LAYOUT_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default_layouts(),
            Err(e) => {
                warn!(error = %e, "failed to read persisted layouts, using defaults");
                return default_layouts();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(layouts) => {
                debug!("restored persisted layouts");
                layouts
            }
            Err(e) => {
                warn!(error = %e, "persisted layouts are unreadable, using defaults");
                default_layouts()
            }
        }
    }

    fn persist(&self) {
        let Some(layouts) = &self.layouts else {
            return;
        };

        let json = match serde_json::to_string(layouts) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize layouts");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(LAYOUT_STORAGE_KEY, &json) {
            warn!(error = %e, "failed to persist layouts, keeping them in memory");
        }
    }
}
