//! Static registry of downstream APIs.
//!
//! The registry is both the menu shown to the language model and the
//! dispatch table the fetcher walks. It is built once at startup and shared
//! read-only behind an `Arc`.

use serde::Serialize;
use tracing::debug;

/// One downstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiEntry {
    /// Unique identifier, also the key of this API's slot in the aggregated result.
    pub name: String,
    /// Endpoint the fetcher issues a GET against.
    pub url: String,
    /// Human-readable text the router shows the language model.
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApiRegistry {
    entries: Vec<ApiEntry>,
}

impl ApiRegistry {
    /// Names are assumed unique; config loading enforces this.
    pub fn new(entries: Vec<ApiEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ApiEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `name: description` line per entry, for the routing prompt.
    pub fn menu(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.name, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Entries whose name appears in `selection`, in registry order.
    ///
    /// Unknown names are dropped silently and repeated names dispatch once.
    pub fn select(&self, selection: &[String]) -> Vec<&ApiEntry> {
        for name in selection {
            if !self.entries.iter().any(|e| &e.name == name) {
                debug!(api = %name, "selected api not in registry — skipped");
            }
        }
        self.entries
            .iter()
            .filter(|e| selection.iter().any(|s| s == &e.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ApiRegistry {
        ApiRegistry::new(vec![
            ApiEntry {
                name: "OrderAPI".into(),
                url: "http://localhost:8001/order".into(),
                description: "Fetch order details".into(),
            },
            ApiEntry {
                name: "LabAPI".into(),
                url: "http://localhost:8001/lab".into(),
                description: "Fetch lab test results".into(),
            },
        ])
    }

    fn names(sel: &[&str]) -> Vec<String> {
        sel.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn menu_lists_name_and_description() {
        assert_eq!(
            registry().menu(),
            "OrderAPI: Fetch order details\nLabAPI: Fetch lab test results"
        );
    }

    #[test]
    fn select_keeps_registry_order() {
        let reg = registry();
        let picked = reg.select(&names(&["LabAPI", "OrderAPI"]));
        let picked: Vec<&str> = picked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(picked, ["OrderAPI", "LabAPI"]);
    }

    #[test]
    fn select_drops_unknown_names() {
        let reg = registry();
        let picked = reg.select(&names(&["NopeAPI", "LabAPI", "orderapi"]));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "LabAPI");
    }

    #[test]
    fn select_dedups_repeated_names() {
        let reg = registry();
        assert_eq!(reg.select(&names(&["LabAPI", "LabAPI"])).len(), 1);
    }

    #[test]
    fn empty_selection_selects_nothing() {
        assert!(registry().select(&[]).is_empty());
    }
}
