//! Clipboard copy/paste for scene objects.
//!
//! Copy serializes the active object (or every member of the active
//! selection) through the same property whitelist the history uses, with
//! identities stripped. Paste revives the payload, so each pasted object
//! gets a fresh id and the insertions are captured as ordinary add actions.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::editable::ensure_editable;
use crate::scene::{ActiveTarget, Canvas, ObjectId};
use crate::snapshot::{revive, ObjectSnapshot, SnapshotError};

/// What a copy produced: one object or a whole selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum ClipboardPayload {
    Object(ObjectSnapshot),
    Selection(Vec<ObjectSnapshot>),
}

impl ClipboardPayload {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}

/// Serializes the active target, identities stripped. `None` when nothing
/// is active.
pub fn copy(canvas: &Canvas) -> Option<ClipboardPayload> {
    match canvas.active() {
        ActiveTarget::None => None,
        ActiveTarget::Object(id) => {
            let object = canvas.find_by_id(id)?;
            Some(ClipboardPayload::Object(
                ObjectSnapshot::capture(object).without_id(),
            ))
        }
        ActiveTarget::Selection(selection) => {
            let snapshots: Vec<ObjectSnapshot> = selection
                .members(canvas)
                .into_iter()
                .map(|object| ObjectSnapshot::capture(object).without_id())
                .collect();
            if snapshots.is_empty() {
                None
            } else {
                Some(ClipboardPayload::Selection(snapshots))
            }
        }
    }
}

/// Revives the payload into the document at its recorded positions.
///
/// Every pasted object gets a fresh id; multiples become the active
/// selection, a single object becomes the active object. The insertions
/// are captured as add actions.
pub fn paste(
    document: &mut Document,
    payload: &ClipboardPayload,
) -> Result<Vec<ObjectId>, SnapshotError> {
    let snapshots: Vec<&ObjectSnapshot> = match payload {
        ClipboardPayload::Object(snapshot) => vec![snapshot],
        ClipboardPayload::Selection(snapshots) => snapshots.iter().collect(),
    };

    let mut ids = Vec::new();
    for snapshot in snapshots {
        let mut object = revive(&snapshot.clone().without_id())?;
        ensure_editable(&mut object);
        let id = document.canvas_mut().add(object);
        document.canvas_mut().bring_to_front(&id);
        ids.push(id);
    }

    let selection = document.canvas().make_selection(&ids);
    document.canvas_mut().set_active_selection(selection);
    document.canvas_mut().request_render();
    document.sync();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ActiveTarget;
    use crate::test_util::png_bytes;

    fn document_with_two_images() -> (Document, ObjectId, ObjectId) {
        let mut document = Document::new();
        let a = document.insert_image(png_bytes(8, 8)).unwrap();
        let b = document.insert_image(png_bytes(4, 4)).unwrap();
        (document, a, b)
    }

    #[test]
    fn copy_nothing_active_is_none() {
        let mut document = Document::new();
        document.canvas_mut().discard_active();
        assert!(copy(document.canvas()).is_none());
    }

    #[test]
    fn copy_strips_identity() {
        let (document, _a, _b) = document_with_two_images();
        match copy(document.canvas()) {
            Some(ClipboardPayload::Object(snapshot)) => assert!(snapshot.id.is_none()),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn copy_selection_serializes_every_member() {
        let (mut document, a, b) = document_with_two_images();
        let selection = document.canvas().make_selection(&[a, b]);
        document.canvas_mut().set_active_selection(selection);
        match copy(document.canvas()) {
            Some(ClipboardPayload::Selection(snapshots)) => {
                assert_eq!(snapshots.len(), 2);
                assert!(snapshots.iter().all(|s| s.id.is_none()));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn paste_assigns_fresh_ids_and_preserves_geometry() {
        let (mut document, a, _b) = document_with_two_images();
        document.canvas_mut().set_active_object(a.clone());
        let payload = copy(document.canvas()).unwrap();
        let source_left = document.canvas().find_by_id(&a).unwrap().left;

        let ids = paste(&mut document, &payload).unwrap();
        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], a);
        let pasted = document.canvas().find_by_id(&ids[0]).unwrap();
        assert_eq!(pasted.left, source_left);
        assert_eq!(document.canvas().active(), &ActiveTarget::Object(ids[0].clone()));
    }

    #[test]
    fn paste_is_undoable() {
        let (mut document, a, b) = document_with_two_images();
        let selection = document.canvas().make_selection(&[a, b]);
        document.canvas_mut().set_active_selection(selection);
        let payload = copy(document.canvas()).unwrap();

        let before = document.canvas().objects().len();
        let undo_before = document.history().undo_count();
        let ids = paste(&mut document, &payload).unwrap();
        assert_eq!(document.canvas().objects().len(), before + 2);
        assert_eq!(document.history().undo_count(), undo_before + 2);
        assert_eq!(document.canvas().active_ids(), ids);

        document.undo().unwrap();
        document.undo().unwrap();
        assert_eq!(document.canvas().objects().len(), before);
    }

    #[test]
    fn payload_json_round_trip() {
        let (mut document, a, _b) = document_with_two_images();
        document.canvas_mut().set_active_object(a);
        let payload = copy(document.canvas()).unwrap();
        let json = payload.to_json().unwrap();
        assert!(json.contains("\"kind\":\"object\""));
        assert_eq!(ClipboardPayload::from_json(&json).unwrap(), payload);
    }
}
