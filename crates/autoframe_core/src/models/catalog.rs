//! Aspect ratio catalog.

use serde::{Deserialize, Serialize};

use super::enums::LabelMode;

/// One output aspect ratio the batch can render to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectTarget {
    /// Stable key (`square`, `portrait`, ...).
    pub key: String,
    /// Filename-friendly label (`1x1`).
    pub short_label: String,
    /// Display label (`1:1 Square`).
    pub friendly_label: String,
    pub width: u32,
    pub height: u32,
}

impl AspectTarget {
    pub fn new(
        key: impl Into<String>,
        short_label: impl Into<String>,
        friendly_label: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            key: key.into(),
            short_label: short_label.into(),
            friendly_label: friendly_label.into(),
            width,
            height,
        }
    }

    /// Label for the given label mode.
    pub fn label(&self, mode: LabelMode) -> &str {
        match mode {
            LabelMode::Short => &self.short_label,
            LabelMode::Friendly => &self.friendly_label,
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Read-only set of aspect targets, in menu order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectCatalog {
    targets: Vec<AspectTarget>,
}

impl AspectCatalog {
    pub fn new(targets: Vec<AspectTarget>) -> Self {
        Self { targets }
    }

    /// The four targets the app ships with.
    pub fn builtin() -> Self {
        Self::new(vec![
            AspectTarget::new("portrait", "9x16", "9:16 Portrait", 1080, 1920),
            AspectTarget::new("four_five", "4x5", "4:5 Portrait", 1080, 1350),
            AspectTarget::new("square", "1x1", "1:1 Square", 1080, 1080),
            AspectTarget::new("landscape", "16x9", "16:9 Landscape", 1920, 1080),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&AspectTarget> {
        self.targets.iter().find(|t| t.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AspectTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Resolve keys in the given order, dropping unknown and repeated keys.
    pub fn resolve<S: AsRef<str>>(&self, keys: &[S]) -> Vec<AspectTarget> {
        let mut resolved: Vec<AspectTarget> = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            if resolved.iter().any(|t| t.key == key) {
                continue;
            }
            if let Some(target) = self.get(key) {
                resolved.push(target.clone());
            } else {
                tracing::warn!("Ignoring unknown aspect ratio '{}'", key);
            }
        }
        resolved
    }
}

impl Default for AspectCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_square() {
        let catalog = AspectCatalog::builtin();
        let square = catalog.get("square").unwrap();
        assert_eq!(square.short_label, "1x1");
        assert_eq!(square.pixel_size(), (1080, 1080));
        assert_eq!(square.label(LabelMode::Friendly), "1:1 Square");
    }

    #[test]
    fn resolve_keeps_selection_order() {
        let catalog = AspectCatalog::builtin();
        let resolved = catalog.resolve(&["landscape", "bogus", "portrait", "landscape"]);
        let keys: Vec<&str> = resolved.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["landscape", "portrait"]);
    }
}
