use shared::domain::SimId;

/// SIMs chosen by the operator for a bulk action.
///
/// Members keep the order in which they were selected; `toggle_all` adopts
/// the order of the universe it is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selected: Vec<SimId>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: SimId) {
        if let Some(position) = self.selected.iter().position(|member| *member == id) {
            self.selected.remove(position);
        } else {
            self.selected.push(id);
        }
    }

    pub fn toggle_all(&mut self, on: bool, universe: &[SimId]) {
        self.selected.clear();
        if on {
            for id in universe {
                if !self.selected.contains(id) {
                    self.selected.push(id.clone());
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_all_selected(&self, universe: &[SimId]) -> bool {
        !universe.is_empty() && self.selected.len() == universe.len()
    }

    /// Drops members that are no longer part of `universe` and returns them.
    pub fn prune(&mut self, universe: &[SimId]) -> Vec<SimId> {
        let mut removed = Vec::new();
        self.selected.retain(|member| {
            let keep = universe.contains(member);
            if !keep {
                removed.push(member.clone());
            }
            keep
        });
        removed
    }

    pub fn contains(&self, id: &SimId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn snapshot(&self) -> Vec<SimId> {
        self.selected.clone()
    }
}
