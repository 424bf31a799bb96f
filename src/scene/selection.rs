//! Ephemeral multi-object selections.

use crate::scene::{Canvas, ObjectId, SceneObject};

/// A transient, non-owning grouping of objects addressed together for one
/// interactive operation.
///
/// A selection holds ids, never object references, and is never stored as
/// an action target — actions record the member-id list and reconstitute a
/// selection against the live canvas when they are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    members: Vec<ObjectId>,
}

impl Selection {
    pub(crate) fn new(members: Vec<ObjectId>) -> Self {
        Self { members }
    }

    /// Ids of the member objects, in z-order at construction time.
    pub fn member_ids(&self) -> &[ObjectId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolves the members against the live canvas, skipping any id that
    /// no longer exists.
    pub fn members<'c>(&self, canvas: &'c Canvas) -> Vec<&'c SceneObject> {
        self.members
            .iter()
            .filter_map(|id| canvas.find_by_id(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Canvas, SceneObject};

    #[test]
    fn members_resolve_against_live_canvas() {
        let mut canvas = Canvas::new();
        let a = canvas.add(SceneObject::rect("red", 10.0, 10.0));
        let b = canvas.add(SceneObject::rect("blue", 10.0, 10.0));
        let selection = canvas.make_selection(&[a.clone(), b.clone()]);
        assert_eq!(selection.len(), 2);

        canvas.remove(&a);
        // The id list is unchanged; resolution filters to survivors.
        assert_eq!(selection.member_ids().len(), 2);
        let members = selection.members(&canvas);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id(), Some(&b));
    }

    #[test]
    fn make_selection_filters_unknown_ids() {
        let mut canvas = Canvas::new();
        let a = canvas.add(SceneObject::rect("red", 10.0, 10.0));
        let selection = canvas.make_selection(&[a.clone(), ObjectId::new("ghost")]);
        assert_eq!(selection.member_ids(), &[a]);
    }
}
