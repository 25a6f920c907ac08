use crate::feature::FeatureId;

/// How a feature should be drawn given the current selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HighlightRole {
    Selected,
    Hovered,
}

/// At most one selected and one hovered feature.
///
/// Ordering contract:
/// - Selected takes precedence over hovered for the same feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<FeatureId>,
    hovered: Option<FeatureId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<FeatureId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    /// Returns `true` if the selection changed.
    pub fn select(&mut self, id: Option<FeatureId>) -> bool {
        let changed = self.selected != id;
        self.selected = id;
        changed
    }

    /// Returns `true` if the hover changed.
    pub fn hover(&mut self, id: Option<FeatureId>) -> bool {
        let changed = self.hovered != id;
        self.hovered = id;
        changed
    }

    /// Hovered feature that should still be drawn as hovered, i.e. one that
    /// is not also selected.
    pub fn effective_hover(&self) -> Option<FeatureId> {
        match (self.hovered, self.selected) {
            (Some(h), Some(s)) if h == s => None,
            (h, _) => h,
        }
    }

    pub fn role(&self, id: FeatureId) -> Option<HighlightRole> {
        if self.selected == Some(id) {
            Some(HighlightRole::Selected)
        } else if self.hovered == Some(id) {
            Some(HighlightRole::Hovered)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightRole, SelectionState};
    use crate::feature::FeatureId;

    #[test]
    fn select_and_hover_report_changes() {
        let mut s = SelectionState::new();
        assert!(s.select(Some(FeatureId(1))));
        assert!(!s.select(Some(FeatureId(1))));
        assert!(s.hover(Some(FeatureId(2))));
        assert!(!s.hover(Some(FeatureId(2))));
        assert!(s.hover(None));
    }

    #[test]
    fn selected_wins_over_hovered() {
        let mut s = SelectionState::new();
        s.select(Some(FeatureId(3)));
        s.hover(Some(FeatureId(3)));
        assert_eq!(s.role(FeatureId(3)), Some(HighlightRole::Selected));
        assert_eq!(s.effective_hover(), None);

        s.hover(Some(FeatureId(4)));
        assert_eq!(s.role(FeatureId(4)), Some(HighlightRole::Hovered));
        assert_eq!(s.effective_hover(), Some(FeatureId(4)));
        assert_eq!(s.role(FeatureId(5)), None);
    }
}
