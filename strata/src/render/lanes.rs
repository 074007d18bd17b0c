use std::collections::BTreeSet;

/// One rendering column
///
/// `owner` is the position of the node whose edges currently run down this
/// lane; `pending` holds the positions of children expected to arrive here.
#[derive(Debug, Default, Clone)]
struct Lane {
    owner: Option<usize>,
    pending: BTreeSet<usize>,
}

/// Growable lane list used while rendering
#[derive(Debug, Default)]
pub(super) struct Lanes {
    lanes: Vec<Lane>,
}

impl Lanes {
    /// Lanes that list `child` as pending, ascending
    pub(super) fn parents_of(&self, child: usize) -> Vec<usize> {
        self.lanes
            .iter()
            .enumerate()
            .filter(|(_, lane)| lane.pending.contains(&child))
            .map(|(col, _)| col)
            .collect()
    }

    /// First free lane, growing the list when every lane is taken
    pub(super) fn claim_free(&mut self) -> usize {
        match self.lanes.iter().position(|lane| lane.owner.is_none()) {
            Some(col) => col,
            None => {
                self.lanes.push(Lane::default());
                self.lanes.len() - 1
            }
        }
    }

    /// Marks `child` as arrived in lane `col`; frees the lane once nothing
    /// else is expected through it
    pub(super) fn arrive(&mut self, col: usize, child: usize) {
        if let Some(lane) = self.lanes.get_mut(col) {
            lane.pending.remove(&child);
            if lane.pending.is_empty() {
                lane.owner = None;
            }
        }
    }

    /// Hands lane `col` to `owner`, expecting `child` through it
    pub(super) fn assign(&mut self, col: usize, owner: usize, child: usize) {
        while self.lanes.len() <= col {
            self.lanes.push(Lane::default());
        }
        let lane = &mut self.lanes[col];
        lane.owner = Some(owner);
        lane.pending.insert(child);
    }

    /// Occupancy snapshot, one flag per lane
    pub(super) fn occupied(&self) -> Vec<bool> {
        self.lanes.iter().map(|lane| lane.owner.is_some()).collect()
    }

    pub(super) fn any_occupied(&self) -> bool {
        self.lanes.iter().any(|lane| lane.owner.is_some())
    }
}
