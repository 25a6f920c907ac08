use std::collections::HashMap;

use crate::feature::{Feature, FeatureId, Polygon};

/// Value that marks an unassigned code in country datasets.
pub const ABSENT_CODE_SENTINEL: &str = "-99";

/// Trims and uppercases a raw code; empty strings and the sentinel read as absent.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() || code == ABSENT_CODE_SENTINEL {
        None
    } else {
        Some(code)
    }
}

/// Immutable set of features plus a normalized code lookup.
///
/// Ordering contract:
/// - Features keep insertion order; `FeatureId` is the position.
/// - The first feature to supply a code owns it; later duplicates stay
///   pickable but are not reachable by code.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    features: Vec<Feature>,
    by_code: HashMap<String, FeatureId>,
    duplicate_codes: usize,
}

impl FeatureIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.index())
    }

    /// Case-insensitive lookup by alpha-2 code.
    pub fn find_by_code(&self, code: &str) -> Option<&Feature> {
        let code = normalize_code(code)?;
        self.by_code.get(&code).and_then(|id| self.get(*id))
    }

    pub fn code_count(&self) -> usize {
        self.by_code.len()
    }

    pub fn duplicate_codes(&self) -> usize {
        self.duplicate_codes
    }

    pub fn vertex_count(&self) -> usize {
        self.features.iter().map(Feature::vertex_count).sum()
    }
}

/// Accumulates features in order and resolves code ownership.
#[derive(Debug, Default)]
pub struct FeatureIndexBuilder {
    index: FeatureIndex,
}

impl FeatureIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature; returns `None` (and adds nothing) when it has no polygons.
    pub fn push(
        &mut self,
        code: Option<String>,
        name: Option<String>,
        polygons: Vec<Polygon>,
    ) -> Option<FeatureId> {
        if polygons.is_empty() {
            return None;
        }
        let id = FeatureId(self.index.features.len() as u32);

        if let Some(code) = &code {
            if self.index.by_code.contains_key(code) {
                self.index.duplicate_codes += 1;
                tracing::debug!(code = %code, feature = id.0, "duplicate code ignored");
            } else {
                self.index.by_code.insert(code.clone(), id);
            }
        }

        self.index.features.push(Feature {
            id,
            code,
            name,
            polygons,
        });
        Some(id)
    }

    pub fn build(self) -> FeatureIndex {
        self.index
    }
}
