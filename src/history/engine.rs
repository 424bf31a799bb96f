//! The undo/redo engine.
//!
//! [`DocumentHistory`] keeps two stacks of [`HistoryAction`]s: a bounded
//! undo stack and an unbounded redo stack. New actions arrive through
//! capture ([`sync`](DocumentHistory::sync) drains the canvas notification
//! queue and converts each event into exactly one action) or through the
//! manual path used by property-panel edits and keyboard nudges. Every new
//! user-driven action clears the redo stack: history is linear, and
//! branching after an undo discards the abandoned future.
//!
//! Applying an action is symmetric: `undo` pops the undo stack, performs
//! the inverse mutation on the canvas, and pushes the *forward* form onto
//! the redo stack; `redo` mirrors it. While an application is in flight the
//! engine is in the [`Applying`](ReplayState::Applying) state — capture
//! checks it, and the notifications the replay itself produces are drained
//! and discarded before the engine returns to idle, so replay never
//! pollutes the log.
//!
//! Reviving a removed object assigns a fresh id; references to the old id
//! anywhere in either stack are remapped to the new one so that older
//! entries keep applying across the identity change.
//!
//! A signed save-distance tracker records how far the current state is from
//! the last [`mark_saved`](DocumentHistory::mark_saved) point, driving the
//! host's dirty indicator.

use std::collections::VecDeque;
use std::fmt;

use crate::editable::ensure_editable;
use crate::history::action::{
    HistoryAction, HistoryError, HistoryResult, ModifyTarget, ObjectRef, PropertyMap,
};
use crate::scene::{
    Canvas, GroupBounds, ModifiedTarget, ObjectId, PropertyKey, PropertyValue, SceneEvent,
    SceneObject, Selection, TransformOriginal,
};
use crate::snapshot::{revive, ObjectSnapshot};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Whether the engine is idle or currently applying an action.
///
/// Capture is suppressed while `Applying`; the two-state machine replaces a
/// loose processing flag so the guard has exactly one place it can be set
/// and cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplayState {
    Idle,
    Applying,
}

/// Something the manual capture path can address: a single object or a
/// selection. Whether the target exposes a member list decides which
/// modify-action shape is recorded.
pub trait CaptureTarget {
    /// The member-id list, when the target is a selection.
    fn selection_ids(&self) -> Option<&[ObjectId]> {
        None
    }

    /// The single object's id, when it has one.
    fn object_id(&self) -> Option<&ObjectId>;

    /// Targets excluded from export never generate history.
    fn history_excluded(&self) -> bool {
        false
    }
}

impl CaptureTarget for SceneObject {
    fn object_id(&self) -> Option<&ObjectId> {
        self.id()
    }

    fn history_excluded(&self) -> bool {
        self.exclude_from_export
    }
}

impl CaptureTarget for Selection {
    fn selection_ids(&self) -> Option<&[ObjectId]> {
        Some(self.member_ids())
    }

    fn object_id(&self) -> Option<&ObjectId> {
        None
    }
}

/// Undo/redo stacks plus capture for one document.
pub struct DocumentHistory {
    undo_stack: VecDeque<HistoryAction>,
    redo_stack: Vec<HistoryAction>,
    max_undo: usize,
    state: ReplayState,
    /// Crop offsets cached at transform start; the end-of-transform payload
    /// does not include them.
    pending_crop: Option<(f64, f64)>,
    /// Signed distance from the saved state: `Some(0)` at the save point,
    /// positive = undos to reach it, negative = redos, `None` = unreachable.
    save_distance: Option<i64>,
}

impl DocumentHistory {
    /// Creates an empty history with the given maximum undo depth.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
            state: ReplayState::Idle,
            pending_crop: None,
            save_distance: Some(0),
        }
    }

    // -- capture ----------------------------------------------------------

    /// Drains the canvas notification queue, converting each event into at
    /// most one recorded action. Call after every host-driven gesture.
    pub fn sync(&mut self, canvas: &mut Canvas) {
        for event in canvas.take_events() {
            self.handle_event(canvas, event);
        }
    }

    fn handle_event(&mut self, canvas: &Canvas, event: SceneEvent) {
        if self.state == ReplayState::Applying {
            return;
        }
        match event {
            SceneEvent::TransformStarted { crop_x, crop_y } => {
                self.pending_crop = Some((crop_x, crop_y));
            }
            SceneEvent::ObjectAdded { id } => {
                match canvas.find_by_id(&id) {
                    Some(object) if object.exclude_from_export => return,
                    None => {
                        log::debug!("added object {id} already gone; not recorded");
                        return;
                    }
                    _ => {}
                }
                self.push(HistoryAction::AddObject {
                    object: ObjectRef::Live(id),
                });
            }
            SceneEvent::ObjectRemoved { snapshot, excluded } => {
                if excluded {
                    return;
                }
                self.push(HistoryAction::RemoveObject {
                    object: ObjectRef::Stored(snapshot),
                });
            }
            SceneEvent::ObjectModified { target, original } => {
                if let ModifiedTarget::Object(id) = &target {
                    if let Some(object) = canvas.find_by_id(id) {
                        if object.exclude_from_export {
                            return;
                        }
                    }
                }
                let previous = self.transform_previous(&original);
                self.push(HistoryAction::ModifyObject {
                    target: target.into(),
                    previous,
                });
            }
        }
    }

    /// Records a modification whose previous values the call site supplies
    /// directly — property-panel edits and keyboard nudges mutate a field
    /// outside any drag gesture, so no scene notification carries them.
    pub fn record_manual_modify<T: CaptureTarget + ?Sized>(
        &mut self,
        target: &T,
        previous: PropertyMap,
    ) {
        if self.state == ReplayState::Applying || target.history_excluded() {
            return;
        }
        if previous.is_empty() {
            log::debug!("manual modify carried no previous values; not recorded");
            return;
        }
        let target = if let Some(ids) = target.selection_ids() {
            ModifyTarget::Selection(ids.to_vec())
        } else if let Some(id) = target.object_id() {
            ModifyTarget::Object(id.clone())
        } else {
            log::warn!("manual modify on an object without an id; not recorded");
            return;
        };
        self.push(HistoryAction::ModifyObject { target, previous });
    }

    fn transform_previous(&mut self, original: &TransformOriginal) -> PropertyMap {
        let mut previous = PropertyMap::new();
        previous.insert(PropertyKey::Left, original.left.into());
        previous.insert(PropertyKey::Top, original.top.into());
        previous.insert(PropertyKey::ScaleX, original.scale_x.into());
        previous.insert(PropertyKey::ScaleY, original.scale_y.into());
        previous.insert(PropertyKey::Angle, original.angle.into());
        previous.insert(PropertyKey::Width, original.width.into());
        previous.insert(PropertyKey::Height, original.height.into());
        previous.insert(PropertyKey::OriginX, original.origin_x.as_str().into());
        previous.insert(PropertyKey::OriginY, original.origin_y.as_str().into());
        if let Some((crop_x, crop_y)) = self.pending_crop.take() {
            previous.insert(PropertyKey::CropX, crop_x.into());
            previous.insert(PropertyKey::CropY, crop_y.into());
        }
        previous
    }

    fn push(&mut self, action: HistoryAction) {
        self.redo_stack.clear();
        // Discarding the redo branch loses a save point that lived in it.
        if matches!(self.save_distance, Some(d) if d < 0) {
            self.save_distance = None;
        }
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.undo_stack.push_back(action);
        self.trim_overflow();
    }

    fn trim_overflow(&mut self) {
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
            if matches!(self.save_distance, Some(d) if d > self.undo_stack.len() as i64) {
                self.save_distance = None;
            }
        }
    }

    // -- application ------------------------------------------------------

    /// Reverts the most recent action. An empty stack is a no-op.
    ///
    /// A step whose target has gone missing is logged and skipped with the
    /// entry consumed; only a failed snapshot revival surfaces as `Err`.
    pub fn undo(&mut self, canvas: &mut Canvas) -> HistoryResult {
        let Some(action) = self.undo_stack.pop_back() else {
            return Ok(());
        };
        self.state = ReplayState::Applying;
        let outcome = self.apply_action(canvas, action);
        self.finish_replay(canvas);
        match outcome {
            Ok(Some(inverse)) => {
                self.redo_stack.push(inverse);
                if let Some(d) = &mut self.save_distance {
                    *d -= 1;
                }
                Ok(())
            }
            Ok(None) => {
                self.save_distance = None;
                Ok(())
            }
            Err(err) => {
                self.save_distance = None;
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone action. An empty stack is a
    /// no-op. Same error policy as [`undo`](Self::undo).
    pub fn redo(&mut self, canvas: &mut Canvas) -> HistoryResult {
        let Some(action) = self.redo_stack.pop() else {
            return Ok(());
        };
        self.state = ReplayState::Applying;
        let outcome = self.apply_action(canvas, action);
        self.finish_replay(canvas);
        match outcome {
            Ok(Some(inverse)) => {
                self.undo_stack.push_back(inverse);
                self.trim_overflow();
                if let Some(d) = &mut self.save_distance {
                    *d += 1;
                }
                Ok(())
            }
            Ok(None) => {
                self.save_distance = None;
                Ok(())
            }
            Err(err) => {
                self.save_distance = None;
                Err(err)
            }
        }
    }

    /// Drops replay-generated notifications and leaves the applying state.
    fn finish_replay(&mut self, canvas: &mut Canvas) {
        let discarded = canvas.take_events();
        if !discarded.is_empty() {
            log::debug!("discarded {} replay notification(s)", discarded.len());
        }
        self.state = ReplayState::Idle;
        canvas.request_render();
    }

    /// Performs one action against the canvas and returns its inverse, or
    /// `None` when the step had to be skipped (entry still consumed).
    fn apply_action(
        &mut self,
        canvas: &mut Canvas,
        action: HistoryAction,
    ) -> HistoryResult<Option<HistoryAction>> {
        match action {
            HistoryAction::AddObject { object } => Ok(self
                .swap_object_ref(canvas, object)?
                .map(|object| HistoryAction::AddObject { object })),
            HistoryAction::RemoveObject { object } => Ok(self
                .swap_object_ref(canvas, object)?
                .map(|object| HistoryAction::RemoveObject { object })),
            HistoryAction::ModifyObject { target, previous } => {
                self.apply_modify(canvas, target, previous)
            }
        }
    }

    /// Turns a live reference into a stored one (snapshot + remove) or a
    /// stored reference into a live one (revive + insert). The returned
    /// reference is the inverse side's.
    fn swap_object_ref(
        &mut self,
        canvas: &mut Canvas,
        reference: ObjectRef,
    ) -> HistoryResult<Option<ObjectRef>> {
        match reference {
            ObjectRef::Live(id) => {
                let Some(object) = canvas.find_by_id(&id) else {
                    log::error!("skipping step: {}", HistoryError::TargetNotFound(id));
                    return Ok(None);
                };
                let snapshot = ObjectSnapshot::capture(object);
                canvas.remove(&id);
                Ok(Some(ObjectRef::Stored(snapshot)))
            }
            ObjectRef::Stored(snapshot) => {
                let recorded_id = snapshot.id.clone();
                let mut object = revive(&snapshot.without_id())?;
                ensure_editable(&mut object);
                let new_id = canvas.add(object);
                if let Some(old_id) = recorded_id {
                    if old_id != new_id {
                        self.remap_object_id(&old_id, &new_id);
                    }
                }
                Ok(Some(ObjectRef::Live(new_id)))
            }
        }
    }

    fn apply_modify(
        &mut self,
        canvas: &mut Canvas,
        target: ModifyTarget,
        previous: PropertyMap,
    ) -> HistoryResult<Option<HistoryAction>> {
        if previous.is_empty() {
            let err = HistoryError::MalformedAction("modify carries no properties".into());
            log::error!("skipping step: {err}");
            return Ok(None);
        }
        match target {
            ModifyTarget::Object(id) => {
                let Some(object) = canvas.find_by_id_mut(&id) else {
                    log::error!("skipping step: {}", HistoryError::TargetNotFound(id));
                    return Ok(None);
                };
                let current = read_current(object, &previous);
                apply_previous(object, &previous);
                object.set_coords();
                Ok(Some(HistoryAction::ModifyObject {
                    target: ModifyTarget::Object(id),
                    previous: current,
                }))
            }
            ModifyTarget::Selection(ids) => {
                let surviving: Vec<ObjectId> = ids
                    .iter()
                    .filter(|id| canvas.contains(id))
                    .cloned()
                    .collect();
                if surviving.len() < ids.len() {
                    log::warn!(
                        "group modify: {} member(s) no longer present; restoring the remainder",
                        ids.len() - surviving.len()
                    );
                }
                let Some(bounds) = canvas.group_bounds(&surviving) else {
                    log::error!("could not apply action: no selection members remain");
                    return Ok(None);
                };
                let current = group_current(&bounds, &previous);
                // With members missing, the stored box no longer describes
                // this member set; scale ratios derived from it would be
                // garbage. Restore position only, like a fresh container.
                let degraded = surviving.len() < ids.len();
                apply_group_previous(canvas, &surviving, &bounds, &previous, degraded);
                let selection = canvas.make_selection(&surviving);
                canvas.set_active_selection(selection);
                Ok(Some(HistoryAction::ModifyObject {
                    target: ModifyTarget::Selection(ids),
                    previous: current,
                }))
            }
        }
    }

    /// Rewrites every reference to `old` in both stacks after a revival
    /// assigned `new`. Identity is not stable across a remove/undo cycle;
    /// older entries must follow the object to its new id.
    fn remap_object_id(&mut self, old: &ObjectId, new: &ObjectId) {
        fn remap(action: &mut HistoryAction, old: &ObjectId, new: &ObjectId) {
            match action {
                HistoryAction::AddObject { object } | HistoryAction::RemoveObject { object } => {
                    if let ObjectRef::Live(id) = object {
                        if id == old {
                            *id = new.clone();
                        }
                    }
                }
                HistoryAction::ModifyObject { target, .. } => match target {
                    ModifyTarget::Object(id) => {
                        if id == old {
                            *id = new.clone();
                        }
                    }
                    ModifyTarget::Selection(ids) => {
                        for id in ids.iter_mut() {
                            if id == old {
                                *id = new.clone();
                            }
                        }
                    }
                },
            }
        }
        for action in &mut self.undo_stack {
            remap(action, old, new);
        }
        for action in &mut self.redo_stack {
            remap(action, old, new);
        }
    }

    // -- bookkeeping ------------------------------------------------------

    /// Empties both stacks. Called on new-document and document-switch.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.pending_crop = None;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Undo action labels, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.undo_stack.iter().rev().map(HistoryAction::description)
    }

    /// Redo action labels, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.redo_stack.iter().rev().map(HistoryAction::description)
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// True when the current state differs from the last saved state, or
    /// the save point has become unreachable.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }
}

impl Default for DocumentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl fmt::Debug for DocumentHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .field("state", &self.state)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}

/// Reads the object's current value for every key in `keys` — the payload
/// of the inverse action.
fn read_current(object: &SceneObject, keys: &PropertyMap) -> PropertyMap {
    keys.keys().map(|&key| (key, object.get(key))).collect()
}

/// Writes stored values back onto an object. Origin anchors are skipped:
/// they are re-derived, and restoring them verbatim shifts geometry.
fn apply_previous(object: &mut SceneObject, previous: &PropertyMap) {
    for (key, value) in previous {
        if key.is_origin_anchor() {
            continue;
        }
        object.set(*key, value);
    }
}

/// Container-level current values for a group target: the enclosing box at
/// unit scale plays the container role.
fn group_current(bounds: &GroupBounds, keys: &PropertyMap) -> PropertyMap {
    let mut current = PropertyMap::new();
    for &key in keys.keys() {
        let value = match key {
            PropertyKey::Left => PropertyValue::Number(bounds.left),
            PropertyKey::Top => PropertyValue::Number(bounds.top),
            PropertyKey::Width => PropertyValue::Number(bounds.width),
            PropertyKey::Height => PropertyValue::Number(bounds.height),
            PropertyKey::ScaleX | PropertyKey::ScaleY => PropertyValue::Number(1.0),
            PropertyKey::Angle => PropertyValue::Number(0.0),
            PropertyKey::CropX | PropertyKey::CropY => PropertyValue::Number(0.0),
            PropertyKey::OriginX => PropertyValue::Text("left".into()),
            PropertyKey::OriginY => PropertyValue::Text("top".into()),
            other => {
                log::debug!("group modify: no container value for {other:?}");
                continue;
            }
        };
        current.insert(key, value);
    }
    current
}

/// Restores a group's container geometry by the affine difference between
/// the stored container values and the members' current enclosing box,
/// distributed to every member. All members move in one pass — application
/// is atomic by construction.
fn apply_group_previous(
    canvas: &mut Canvas,
    ids: &[ObjectId],
    bounds: &GroupBounds,
    previous: &PropertyMap,
    degraded: bool,
) {
    let number = |key: PropertyKey, fallback: f64| {
        previous
            .get(&key)
            .and_then(PropertyValue::as_number)
            .unwrap_or(fallback)
    };
    let prev_left = number(PropertyKey::Left, bounds.left);
    let prev_top = number(PropertyKey::Top, bounds.top);
    let prev_scale_x = number(PropertyKey::ScaleX, 1.0);
    let prev_scale_y = number(PropertyKey::ScaleY, 1.0);
    let prev_width = number(PropertyKey::Width, bounds.width);
    let prev_height = number(PropertyKey::Height, bounds.height);

    let fx = if !degraded && bounds.width > 0.0 {
        (prev_width * prev_scale_x) / bounds.width
    } else {
        1.0
    };
    let fy = if !degraded && bounds.height > 0.0 {
        (prev_height * prev_scale_y) / bounds.height
    } else {
        1.0
    };

    for id in ids {
        if let Some(object) = canvas.find_by_id_mut(id) {
            object.scale_x *= fx;
            object.scale_y *= fy;
            object.left = prev_left + (object.left - bounds.left) * fx;
            object.top = prev_top + (object.top - bounds.top) * fy;
            object.set_coords();
        }
    }
}
