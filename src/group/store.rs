use crate::group::dto::GroupSnapshot;
use crate::state::{Seq, StateCell};

/// Group membership as this client sees it: either the session holds a
/// snapshot of exactly one group, or it is in no group at all. No partial
/// state is representable.
#[derive(Debug)]
pub struct GroupStore {
    cell: StateCell<Option<GroupSnapshot>>,
}

impl Default for GroupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupStore {
    pub fn new() -> Self {
        Self {
            cell: StateCell::new(None),
        }
    }

    /// Sequence ticket for the next snapshot refresh.
    pub fn begin(&self) -> Seq {
        self.cell.begin()
    }

    /// Commits a snapshot wholesale. Returns false if a newer snapshot has
    /// already been committed and this one was dropped.
    pub fn join_order_group(&self, seq: Seq, snapshot: GroupSnapshot) -> bool {
        self.cell.commit(seq, Some(snapshot))
    }

    /// Local transition to "not in a group". Also invalidates any still
    /// in-flight snapshot responses.
    pub fn leave_order_group(&self) {
        self.cell.replace(None);
    }

    pub fn is_in_order_group(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn current(&self) -> Option<GroupSnapshot> {
        self.cell.get()
    }
}
