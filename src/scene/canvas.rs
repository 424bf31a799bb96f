//! The live scene graph and its notification queue.
//!
//! [`Canvas`] owns the ordered object list (vector order is z-order), tracks
//! the active object or selection, and publishes every observable mutation
//! as a [`SceneEvent`] through an internal queue. Consumers drain the queue
//! with [`take_events`](Canvas::take_events) after each host gesture — the
//! same drain-per-step discipline an editor frame loop uses for its action
//! queue. Events are a closed tagged type dispatched through one handler on
//! the consumer side, instead of string-keyed callbacks.
//!
//! Interactive transforms are bracketed: [`begin_transform`] snapshots the
//! target's pre-gesture geometry and announces the crop offsets (which the
//! end-of-gesture payload does not include), the host mutates the target
//! across any number of frames, and [`end_transform`] publishes a single
//! modified event carrying the recorded original geometry.
//!
//! [`begin_transform`]: Canvas::begin_transform
//! [`end_transform`]: Canvas::end_transform

use std::collections::VecDeque;

use crate::scene::{ObjectId, SceneObject, Selection};
use crate::snapshot::ObjectSnapshot;

/// Which object(s) a modification addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifiedTarget {
    Object(ObjectId),
    Selection(Vec<ObjectId>),
}

/// Pre-gesture geometry recorded when an interactive transform begins.
///
/// Mirrors what the end-of-gesture notification reports: position, scale,
/// rotation, origin anchors, and the pre-drag logical size. Crop offsets are
/// deliberately absent — they travel in [`SceneEvent::TransformStarted`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOriginal {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub origin_x: crate::scene::HorizontalAnchor,
    pub origin_y: crate::scene::VerticalAnchor,
    pub width: f64,
    pub height: f64,
}

impl TransformOriginal {
    fn of(object: &SceneObject) -> Self {
        Self {
            left: object.left,
            top: object.top,
            scale_x: object.scale_x,
            scale_y: object.scale_y,
            angle: object.angle,
            origin_x: object.origin_x,
            origin_y: object.origin_y,
            width: object.width,
            height: object.height,
        }
    }

    /// A group gesture is recorded against its enclosing box: unit scale,
    /// no rotation, geometry of the box itself.
    fn of_group(bounds: &GroupBounds) -> Self {
        Self {
            left: bounds.left,
            top: bounds.top,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin_x: crate::scene::HorizontalAnchor::Left,
            origin_y: crate::scene::VerticalAnchor::Top,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

/// Axis-aligned box enclosing a set of objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A scene-graph notification.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// An object entered the graph.
    ObjectAdded { id: ObjectId },
    /// An object left the graph. The snapshot was taken at removal time,
    /// while the object was still live.
    ObjectRemoved {
        snapshot: ObjectSnapshot,
        excluded: bool,
    },
    /// An interactive transform finished.
    ObjectModified {
        target: ModifiedTarget,
        original: TransformOriginal,
    },
    /// An interactive transform is about to begin; carries the
    /// transform-sensitive offsets the end notification omits.
    TransformStarted { crop_x: f64, crop_y: f64 },
}

/// The active object or selection driving the property panel and keyboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveTarget {
    #[default]
    None,
    Object(ObjectId),
    Selection(Selection),
}

struct TransformState {
    target: ModifiedTarget,
    original: TransformOriginal,
}

/// The live, mutable set of positioned drawable objects.
#[derive(Default)]
pub struct Canvas {
    objects: Vec<SceneObject>,
    active: ActiveTarget,
    events: VecDeque<SceneEvent>,
    transform: Option<TransformState>,
    needs_render: bool,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// All objects in z-order (back to front).
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn find_by_id(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id() == Some(id))
    }

    pub fn find_by_id_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id() == Some(id))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Inserts an object at the top of the z-order and announces it.
    ///
    /// An object without an id gets one here so the notification can name
    /// it; interactive paths will already have run `ensure_editable`.
    pub fn add(&mut self, mut object: SceneObject) -> ObjectId {
        let id = match object.id() {
            Some(id) => id.clone(),
            None => {
                let id = ObjectId::generate();
                log::debug!("object added without id, assigned {id}");
                object.assign_id(id.clone());
                id
            }
        };
        object.set_coords();
        self.objects.push(object);
        self.events.push_back(SceneEvent::ObjectAdded { id: id.clone() });
        id
    }

    /// Removes an object, snapshotting it while still live, and announces
    /// the removal. Returns `false` when the id is unknown.
    pub fn remove(&mut self, id: &ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id() == Some(id)) else {
            return false;
        };
        let object = self.objects.remove(index);
        let excluded = object.exclude_from_export;
        let snapshot = ObjectSnapshot::capture(&object);

        let replacement = match &self.active {
            ActiveTarget::Object(active) if active == id => Some(ActiveTarget::None),
            ActiveTarget::Selection(selection) => {
                let survivors: Vec<ObjectId> = selection
                    .member_ids()
                    .iter()
                    .filter(|member| *member != id)
                    .cloned()
                    .collect();
                Some(if survivors.is_empty() {
                    ActiveTarget::None
                } else {
                    ActiveTarget::Selection(Selection::new(survivors))
                })
            }
            _ => None,
        };
        if let Some(active) = replacement {
            self.active = active;
        }

        self.events
            .push_back(SceneEvent::ObjectRemoved { snapshot, excluded });
        true
    }

    /// Moves an object to the top of the z-order.
    pub fn bring_to_front(&mut self, id: &ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id() == Some(id)) else {
            return false;
        };
        let object = self.objects.remove(index);
        self.objects.push(object);
        true
    }

    /// Recomputes an object's cached corner coordinates.
    pub fn recompute_bounds(&mut self, id: &ObjectId) {
        if let Some(object) = self.find_by_id_mut(id) {
            object.set_coords();
        }
    }

    /// Builds a selection from ids, keeping only those present in the graph.
    pub fn make_selection(&self, ids: &[ObjectId]) -> Selection {
        let present: Vec<ObjectId> = ids
            .iter()
            .filter(|id| self.contains(id))
            .cloned()
            .collect();
        Selection::new(present)
    }

    pub fn active(&self) -> &ActiveTarget {
        &self.active
    }

    /// Ids addressed by the active target: none, one, or the member list.
    pub fn active_ids(&self) -> Vec<ObjectId> {
        match &self.active {
            ActiveTarget::None => Vec::new(),
            ActiveTarget::Object(id) => vec![id.clone()],
            ActiveTarget::Selection(selection) => selection.member_ids().to_vec(),
        }
    }

    pub fn set_active_object(&mut self, id: ObjectId) {
        if !self.contains(&id) {
            log::warn!("activating unknown object {id}");
        }
        self.active = ActiveTarget::Object(id);
    }

    pub fn set_active_selection(&mut self, selection: Selection) {
        self.active = match selection.len() {
            0 => ActiveTarget::None,
            1 => ActiveTarget::Object(selection.member_ids()[0].clone()),
            _ => ActiveTarget::Selection(selection),
        };
    }

    pub fn discard_active(&mut self) {
        self.active = ActiveTarget::None;
    }

    /// The enclosing box of the given objects, unknown ids skipped.
    /// Rotation is not folded in; group gestures operate on upright boxes.
    pub fn group_bounds(&self, ids: &[ObjectId]) -> Option<GroupBounds> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut any = false;
        for object in ids.iter().filter_map(|id| self.find_by_id(id)) {
            any = true;
            min_x = min_x.min(object.left);
            min_y = min_y.min(object.top);
            max_x = max_x.max(object.left + object.scaled_width());
            max_y = max_y.max(object.top + object.scaled_height());
        }
        any.then(|| GroupBounds {
            left: min_x,
            top: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    /// Starts an interactive transform on the given target.
    ///
    /// Records the pre-gesture geometry: the object's own for a single
    /// target, the enclosing box (unit scale) for a selection. Crop offsets
    /// are announced for single objects only — selections have none.
    pub fn begin_transform(&mut self, target: ModifiedTarget) {
        if self.transform.is_some() {
            log::warn!("transform begun while another is active; replacing");
        }
        let original = match &target {
            ModifiedTarget::Object(id) => {
                let Some(subject) = self.find_by_id(id) else {
                    log::warn!("transform target {id} not found; gesture ignored");
                    return;
                };
                let original = TransformOriginal::of(subject);
                let (crop_x, crop_y) = (subject.crop_x, subject.crop_y);
                self.events
                    .push_back(SceneEvent::TransformStarted { crop_x, crop_y });
                original
            }
            ModifiedTarget::Selection(ids) => {
                let Some(bounds) = self.group_bounds(ids) else {
                    log::warn!("transform selection has no live members; gesture ignored");
                    return;
                };
                TransformOriginal::of_group(&bounds)
            }
        };
        self.transform = Some(TransformState { target, original });
    }

    /// Ends the current interactive transform, announcing the single
    /// modified event that covers the whole gesture.
    pub fn end_transform(&mut self) {
        let Some(state) = self.transform.take() else {
            log::warn!("end_transform without a matching begin_transform");
            return;
        };
        self.events.push_back(SceneEvent::ObjectModified {
            target: state.target,
            original: state.original,
        });
        self.needs_render = true;
    }

    /// True while a transform gesture is in progress.
    pub fn transform_in_progress(&self) -> bool {
        self.transform.is_some()
    }

    /// Drains and returns all pending notifications in publication order.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events).into()
    }

    /// Marks the scene as needing a repaint.
    pub fn request_render(&mut self) {
        self.needs_render = true;
    }

    /// Consumes the pending repaint request, if any.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("objects", &self.objects.len())
            .field("pending_events", &self.events.len())
            .field("active", &self.active)
            .finish()
    }
}
