//! Page registry.
//!
//! Plugins request pages through [`PageActions::create_page`]. The registry
//! keeps one descriptor per path, in first-request order; a repeated path
//! replaces the earlier descriptor in place.

use std::sync::RwLock;

use serde::Serialize;
use serde_json::Value;

/// A requested output page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDescriptor {
    /// URL path, always starting with `/`.
    pub path: String,
    /// Rendering component reference.
    pub component: String,
    /// Data handed to the component.
    pub context: Value,
}

/// Page creation callback handed to plugins.
pub trait PageActions: Send + Sync {
    /// Request `page`. Invalid requests are logged and dropped.
    fn create_page(&self, page: PageDescriptor);
}

/// In-memory [`PageActions`] implementation.
#[derive(Default)]
pub struct PageRegistry {
    pages: RwLock<Vec<PageDescriptor>>,
}

impl PageRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all registered pages.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn pages(&self) -> Vec<PageDescriptor> {
        self.pages.read().unwrap().clone()
    }

    /// Registered page at `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn get(&self, path: &str) -> Option<PageDescriptor> {
        self.pages
            .read()
            .unwrap()
            .iter()
            .find(|page| page.path == path)
            .cloned()
    }

    /// Number of registered pages.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn len(&self) -> usize {
        self.pages.read().unwrap().len()
    }

    /// Whether no page has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageActions for PageRegistry {
    fn create_page(&self, page: PageDescriptor) {
        if !page.path.starts_with('/') {
            tracing::warn!(path = %page.path, "ignoring page with a relative path");
            return;
        }

        let mut pages = self.pages.write().unwrap();
        if let Some(existing) = pages.iter_mut().find(|p| p.path == page.path) {
            tracing::warn!(path = %page.path, "page requested twice, keeping the latest");
            *existing = page;
        } else {
            tracing::debug!(path = %page.path, component = %page.component, "page created");
            pages.push(page);
        }
    }
}
