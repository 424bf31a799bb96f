//! Document context: page settings, the background object, lifecycle, and
//! the host-facing edit operations.
//!
//! A [`Document`] owns one [`Canvas`] and one [`DocumentHistory`] and keeps
//! them consistent: interactive mutations are synced into the history after
//! each gesture, manual edits (property panel, keyboard nudges) go through
//! the manual capture path, and document lifecycle transitions (new, load)
//! clear both stacks before a replacement graph could ever see stale
//! actions.
//!
//! The page itself is a well-known rectangle object at the back of the
//! z-order: not selectable, not transformable, mutated only through the
//! page-settings operations, which are deliberately not undoable.

use serde::{Deserialize, Serialize};

use crate::editable::ensure_editable;
use crate::history::{DocumentHistory, HistoryResult, PropertyMap};
use crate::scene::{
    ActiveTarget, Canvas, ImageSource, ObjectId, PropertyKey, PropertyValue, SceneObject,
};
use crate::snapshot::{revive, ObjectSnapshot, SnapshotError};

/// Default print resolution in pixels per inch.
pub const DEFAULT_PPI: f64 = 300.0;
/// Default page width in inches (US letter).
pub const DEFAULT_PAGE_WIDTH_IN: f64 = 8.5;
/// Default page height in inches (US letter).
pub const DEFAULT_PAGE_HEIGHT_IN: f64 = 11.0;
/// Well-known id of the page background object.
pub const BACKGROUND_ID: &str = "__background__";

/// Page geometry and print resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub width_in: f64,
    pub height_in: f64,
    pub ppi: f64,
}

impl PageSettings {
    pub fn width_px(&self) -> f64 {
        self.width_in * self.ppi
    }

    pub fn height_px(&self) -> f64 {
        self.height_in * self.ppi
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            width_in: DEFAULT_PAGE_WIDTH_IN,
            height_in: DEFAULT_PAGE_HEIGHT_IN,
            ppi: DEFAULT_PPI,
        }
    }
}

/// Everything the host persists for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub page: PageSettings,
    pub objects: Vec<ObjectSnapshot>,
}

/// Direction of a keyboard nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// One open document: canvas, history, and page configuration.
#[derive(Debug)]
pub struct Document {
    canvas: Canvas,
    history: DocumentHistory,
    page: PageSettings,
    page_edited: bool,
}

impl Document {
    /// A fresh document with default page settings.
    pub fn new() -> Self {
        Self::with_settings(PageSettings::default())
    }

    /// A fresh document with the given page settings.
    pub fn with_settings(page: PageSettings) -> Self {
        let mut canvas = Canvas::new();
        let mut background = SceneObject::rect("white", page.width_px(), page.height_px())
            .with_id(ObjectId::new(BACKGROUND_ID));
        background.selectable = false;
        background.has_controls = false;
        background.hover_cursor = Some("default".into());
        canvas.add(background);
        // Document construction is not part of history.
        canvas.take_events();
        Self {
            canvas,
            history: DocumentHistory::default(),
            page,
            page_edited: false,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn history(&self) -> &DocumentHistory {
        &self.history
    }

    pub fn page(&self) -> &PageSettings {
        &self.page
    }

    pub fn background(&self) -> Option<&SceneObject> {
        self.canvas.find_by_id(&ObjectId::new(BACKGROUND_ID))
    }

    // -- lifecycle --------------------------------------------------------

    /// Captures pending scene notifications into the history. Call after
    /// every host-driven gesture.
    pub fn sync(&mut self) {
        self.history.sync(&mut self.canvas);
    }

    pub fn undo(&mut self) -> HistoryResult {
        self.history.undo(&mut self.canvas)
    }

    pub fn redo(&mut self) -> HistoryResult {
        self.history.redo(&mut self.canvas)
    }

    /// True when the document diverged from its last saved state.
    pub fn is_dirty(&self) -> bool {
        self.page_edited || self.history.has_unsaved_changes()
    }

    /// Records the current state as saved.
    pub fn mark_saved(&mut self) {
        self.page_edited = false;
        self.history.mark_saved();
    }

    /// The persistable form of this document: page settings plus the
    /// whitelist snapshot of every exportable object, in z-order.
    pub fn save_payload(&self) -> DocumentPayload {
        let objects = self
            .canvas
            .objects()
            .iter()
            .filter(|o| !o.exclude_from_export)
            .map(ObjectSnapshot::capture)
            .collect();
        DocumentPayload {
            page: self.page,
            objects,
        }
    }

    /// Replaces this document's content from a persisted payload.
    ///
    /// Recorded ids are restored; every object except the background is
    /// made editable again. Both history stacks are cleared first — stale
    /// actions must never apply against a replaced graph.
    pub fn load(&mut self, payload: &DocumentPayload) -> Result<(), SnapshotError> {
        let background_id = ObjectId::new(BACKGROUND_ID);
        let mut canvas = Canvas::new();
        let mut has_background = false;
        for snapshot in &payload.objects {
            let mut object = revive(snapshot)?;
            if object.id() == Some(&background_id) {
                has_background = true;
            } else {
                ensure_editable(&mut object);
            }
            canvas.add(object);
        }
        if !has_background {
            let mut background =
                SceneObject::rect("white", payload.page.width_px(), payload.page.height_px())
                    .with_id(background_id.clone());
            background.selectable = false;
            background.has_controls = false;
            canvas.add(background);
        }
        canvas.bring_to_front(&background_id);
        // Background belongs at the very back.
        let order: Vec<ObjectId> = canvas
            .objects()
            .iter()
            .filter_map(|o| o.id().cloned())
            .filter(|id| *id != background_id)
            .collect();
        for id in order {
            canvas.bring_to_front(&id);
        }
        canvas.take_events();

        self.history.clear();
        self.canvas = canvas;
        self.page = payload.page;
        self.page_edited = false;
        self.mark_saved();
        self.canvas.request_render();
        Ok(())
    }

    // -- page settings (not undoable) -------------------------------------

    /// Resizes the page. Mutates the background directly; page geometry is
    /// not part of the undo history.
    pub fn set_page_size(&mut self, width_in: f64, height_in: f64) {
        if width_in <= 0.0 || height_in <= 0.0 {
            log::warn!("ignoring non-positive page size {width_in}x{height_in}");
            return;
        }
        self.page.width_in = width_in;
        self.page.height_in = height_in;
        self.resize_background();
    }

    /// Changes the print resolution, keeping the page size in inches.
    pub fn set_ppi(&mut self, ppi: f64) {
        if ppi <= 0.0 {
            log::warn!("ignoring non-positive ppi {ppi}");
            return;
        }
        self.page.ppi = ppi;
        self.resize_background();
    }

    fn resize_background(&mut self) {
        let (w, h) = (self.page.width_px(), self.page.height_px());
        let background_id = ObjectId::new(BACKGROUND_ID);
        if let Some(background) = self.canvas.find_by_id_mut(&background_id) {
            background.width = w;
            background.height = h;
            background.set_coords();
        }
        self.page_edited = true;
        self.canvas.request_render();
    }

    // -- object operations ------------------------------------------------

    /// Decodes image bytes and places the image centered on the page.
    pub fn insert_image(&mut self, data: Vec<u8>) -> Result<ObjectId, SnapshotError> {
        let decoded =
            image::load_from_memory(&data).map_err(|e| SnapshotError::Image(e.to_string()))?;
        use image::GenericImageView;
        let (w, h) = decoded.dimensions();
        let object = SceneObject::image(ImageSource {
            data,
            natural_width: f64::from(w),
            natural_height: f64::from(h),
        });
        Ok(self.insert_object(object))
    }

    /// Makes an object editable, adds it on top, activates it, and captures
    /// the insertion.
    pub fn insert_object(&mut self, mut object: SceneObject) -> ObjectId {
        ensure_editable(&mut object);
        object.left = (self.page.width_px() - object.scaled_width()) / 2.0;
        object.top = (self.page.height_px() - object.scaled_height()) / 2.0;
        let id = self.canvas.add(object);
        self.canvas.bring_to_front(&id);
        self.canvas.set_active_object(id.clone());
        self.canvas.request_render();
        self.sync();
        id
    }

    /// Removes every object in the active target and captures each removal.
    pub fn delete_active(&mut self) {
        let ids = self.canvas.active_ids();
        if ids.is_empty() {
            return;
        }
        for id in &ids {
            self.canvas.remove(id);
        }
        self.canvas.discard_active();
        self.canvas.request_render();
        self.sync();
    }

    /// Moves the active object one unit in the given direction, recording
    /// the pre-edit value through the manual capture path.
    pub fn nudge(&mut self, direction: NudgeDirection) {
        let ActiveTarget::Object(id) = self.canvas.active() else {
            return;
        };
        let id = id.clone();
        let Some(object) = self.canvas.find_by_id(&id) else {
            return;
        };
        let (key, previous_value, new_value) = match direction {
            NudgeDirection::Left => (PropertyKey::Left, object.left, object.left - 1.0),
            NudgeDirection::Right => (PropertyKey::Left, object.left, object.left + 1.0),
            NudgeDirection::Up => (PropertyKey::Top, object.top, object.top - 1.0),
            NudgeDirection::Down => (PropertyKey::Top, object.top, object.top + 1.0),
        };
        let mut previous = PropertyMap::new();
        previous.insert(key, PropertyValue::Number(previous_value));
        self.history.record_manual_modify(object, previous);

        if let Some(object) = self.canvas.find_by_id_mut(&id) {
            object.set(key, &PropertyValue::Number(new_value));
            object.set_coords();
        }
        self.canvas.request_render();
    }

    /// Sets the active object's displayed width in inches via uniform
    /// scaling. Returns whether a change was applied.
    pub fn set_display_width(&mut self, inches: f64) -> bool {
        self.scale_active(inches, SceneObject::scale_to_width)
    }

    /// Sets the active object's displayed height in inches via uniform
    /// scaling. Returns whether a change was applied.
    pub fn set_display_height(&mut self, inches: f64) -> bool {
        self.scale_active(inches, SceneObject::scale_to_height)
    }

    fn scale_active(&mut self, inches: f64, apply: fn(&mut SceneObject, f64)) -> bool {
        let target = inches * self.page.ppi;
        if !(target > 0.0) {
            log::warn!("ignoring non-positive display size {inches}in");
            return false;
        }
        let ActiveTarget::Object(id) = self.canvas.active() else {
            log::debug!("display-size edit needs a single active object");
            return false;
        };
        let id = id.clone();
        let Some(object) = self.canvas.find_by_id(&id) else {
            return false;
        };
        let mut previous = PropertyMap::new();
        previous.insert(PropertyKey::ScaleX, PropertyValue::Number(object.scale_x));
        previous.insert(PropertyKey::ScaleY, PropertyValue::Number(object.scale_y));
        self.history.record_manual_modify(object, previous);

        if let Some(object) = self.canvas.find_by_id_mut(&id) {
            apply(object, target);
            object.set_coords();
        }
        self.canvas.request_render();
        true
    }

    /// Sets the active object's X position in inches from the page origin.
    pub fn set_position_x(&mut self, inches: f64) -> bool {
        self.position_active(PropertyKey::Left, inches)
    }

    /// Sets the active object's Y position in inches from the page origin.
    pub fn set_position_y(&mut self, inches: f64) -> bool {
        self.position_active(PropertyKey::Top, inches)
    }

    fn position_active(&mut self, key: PropertyKey, inches: f64) -> bool {
        let ActiveTarget::Object(id) = self.canvas.active() else {
            log::debug!("position edit needs a single active object");
            return false;
        };
        let id = id.clone();
        let Some(object) = self.canvas.find_by_id(&id) else {
            return false;
        };
        let mut previous = PropertyMap::new();
        previous.insert(key, object.get(key));
        self.history.record_manual_modify(object, previous);

        let value = inches * self.page.ppi;
        if let Some(object) = self.canvas.find_by_id_mut(&id) {
            object.set(key, &PropertyValue::Number(value));
            object.set_coords();
        }
        self.canvas.request_render();
        true
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::png_bytes;

    fn doc_with_image() -> (Document, ObjectId) {
        let mut document = Document::new();
        let id = document.insert_image(png_bytes(8, 8)).unwrap();
        (document, id)
    }

    #[test]
    fn new_document_has_page_background() {
        let document = Document::new();
        let background = document.background().unwrap();
        assert!(!background.selectable);
        assert!(!background.has_controls);
        assert_eq!(background.width, 8.5 * 300.0);
        assert_eq!(background.height, 11.0 * 300.0);
        assert_eq!(document.history().undo_count(), 0);
        assert!(!document.is_dirty());
    }

    #[test]
    fn insert_image_centers_activates_and_records() {
        let (document, id) = doc_with_image();
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.left, (8.5 * 300.0 - 8.0) / 2.0);
        assert_eq!(object.top, (11.0 * 300.0 - 8.0) / 2.0);
        assert_eq!(document.canvas().active_ids(), vec![id]);
        assert_eq!(document.history().undo_count(), 1);
        assert!(document.is_dirty());
    }

    #[test]
    fn insert_image_rejects_undecodable_bytes() {
        let mut document = Document::new();
        assert!(matches!(
            document.insert_image(vec![1, 2, 3]),
            Err(SnapshotError::Image(_))
        ));
        assert_eq!(document.history().undo_count(), 0);
    }

    #[test]
    fn nudge_moves_and_is_undoable() {
        let (mut document, id) = doc_with_image();
        let before = document.canvas().find_by_id(&id).unwrap().left;

        document.nudge(NudgeDirection::Right);
        document.nudge(NudgeDirection::Down);
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.left, before + 1.0);
        assert_eq!(document.history().undo_count(), 3);

        document.undo().unwrap();
        document.undo().unwrap();
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.left, before);
    }

    #[test]
    fn nudge_without_active_object_is_noop() {
        let (mut document, _id) = doc_with_image();
        document.canvas_mut().discard_active();
        document.nudge(NudgeDirection::Left);
        assert_eq!(document.history().undo_count(), 1);
    }

    #[test]
    fn display_width_scales_uniformly_and_is_undoable() {
        let (mut document, id) = doc_with_image();
        // 8px-wide image displayed at 2in on a 300ppi page: scale 75.
        assert!(document.set_display_width(2.0));
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.scaled_width(), 600.0);
        assert_eq!(object.scale_x, object.scale_y);

        document.undo().unwrap();
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.scale_x, 1.0);
        assert_eq!(object.scale_y, 1.0);
    }

    #[test]
    fn display_width_rejects_non_positive() {
        let (mut document, _id) = doc_with_image();
        assert!(!document.set_display_width(0.0));
        assert_eq!(document.history().undo_count(), 1);
    }

    #[test]
    fn position_is_in_inches_from_page_origin() {
        let (mut document, id) = doc_with_image();
        assert!(document.set_position_x(1.0));
        assert!(document.set_position_y(2.0));
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.left, 300.0);
        assert_eq!(object.top, 600.0);

        document.undo().unwrap();
        document.undo().unwrap();
        let object = document.canvas().find_by_id(&id).unwrap();
        assert_eq!(object.left, (8.5 * 300.0 - 8.0) / 2.0);
    }

    #[test]
    fn delete_active_removes_all_selected_and_is_undoable() {
        let (mut document, a) = doc_with_image();
        let b = document.insert_image(png_bytes(4, 4)).unwrap();
        let selection = document.canvas().make_selection(&[a.clone(), b.clone()]);
        document.canvas_mut().set_active_selection(selection);

        document.delete_active();
        assert!(!document.canvas().contains(&a));
        assert!(!document.canvas().contains(&b));
        assert_eq!(document.canvas().active_ids(), Vec::<ObjectId>::new());
        // Two adds + two removals.
        assert_eq!(document.history().undo_count(), 4);

        document.undo().unwrap();
        document.undo().unwrap();
        assert_eq!(document.canvas().objects().len(), 3, "background + both images");
    }

    #[test]
    fn delete_never_touches_the_background() {
        let mut document = Document::new();
        document.delete_active();
        assert!(document.background().is_some());
    }

    #[test]
    fn page_resize_is_dirty_but_not_undoable() {
        let mut document = Document::new();
        document.set_page_size(4.0, 6.0);
        assert!(document.is_dirty());
        assert_eq!(document.history().undo_count(), 0);
        let background = document.background().unwrap();
        assert_eq!(background.width, 1200.0);
        assert_eq!(background.height, 1800.0);

        document.set_ppi(150.0);
        assert_eq!(document.background().unwrap().width, 600.0);
    }

    #[test]
    fn save_and_load_round_trip_preserves_ids_and_clears_history() {
        let (mut document, id) = doc_with_image();
        document.nudge(NudgeDirection::Right);
        let payload = document.save_payload();
        assert_eq!(payload.objects.len(), 2, "background + image");

        let mut restored = Document::new();
        restored.load(&payload).unwrap();
        assert!(restored.canvas().contains(&id), "load restores recorded ids");
        assert_eq!(restored.history().undo_count(), 0);
        assert!(!restored.is_dirty());
        // Background sits at the back of the z-order.
        assert_eq!(
            restored.canvas().objects()[0].id().map(ObjectId::as_str),
            Some(BACKGROUND_ID)
        );
    }

    #[test]
    fn save_payload_skips_excluded_objects() {
        let mut document = Document::new();
        let mut grid = SceneObject::rect("gray", 10.0, 10.0);
        grid.exclude_from_export = true;
        document.canvas_mut().add(grid);
        document.canvas_mut().take_events();
        assert_eq!(document.save_payload().objects.len(), 1, "background only");
    }

    #[test]
    fn mark_saved_clears_dirty() {
        let (mut document, _id) = doc_with_image();
        document.set_page_size(5.0, 5.0);
        assert!(document.is_dirty());
        document.mark_saved();
        assert!(!document.is_dirty());
    }
}
