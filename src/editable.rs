//! Object identity and the editable-property contract.
//!
//! [`ensure_editable`] is run on every object entering the document through
//! an interactive path (insert, paste, history revival): it assigns a stable
//! id when the object has none, sets the baseline interaction flags, and
//! installs the four edge-crop handles. The call is idempotent — an existing
//! id is never replaced and the handle slots are simply overwritten.
//!
//! The crop handlers themselves run inside a drag gesture. Each adjusts the
//! displayed `width`/`height` and the crop offsets so the visible window
//! slides over the source asset, clamped so it never exceeds the asset
//! bounds and never inverts. A handler returns whether it changed anything;
//! the transform loop uses that to decide if the frame needs a re-render.
//! No handler records history — the whole drag becomes a single modify
//! action, captured at drag end.

use crate::scene::{Control, ControlAction, ObjectId, Point, SceneObject};

/// Rotation snap granularity installed on editable objects, in degrees.
pub const SNAP_ANGLE_DEGREES: f64 = 5.0;

/// Makes an object editable: stable id, baseline flags, edge-crop handles.
///
/// Returns the object's id (freshly generated when it had none).
pub fn ensure_editable(object: &mut SceneObject) -> ObjectId {
    let id = match object.id() {
        Some(id) => id.clone(),
        None => {
            let id = ObjectId::generate();
            object.assign_id(id.clone());
            id
        }
    };

    object.transparent_corners = false;
    object.selectable = true;
    object.snap_angle = SNAP_ANGLE_DEGREES;
    object.stroke_width = 0.0;

    object.controls.top = Some(Control {
        x: 0.0,
        y: -0.5,
        action: ControlAction::CropTop,
        cursor: "pointer",
    });
    object.controls.right = Some(Control {
        x: 0.5,
        y: 0.0,
        action: ControlAction::CropRight,
        cursor: "pointer",
    });
    object.controls.bottom = Some(Control {
        x: 0.0,
        y: 0.5,
        action: ControlAction::CropBottom,
        cursor: "pointer",
    });
    object.controls.left = Some(Control {
        x: -0.5,
        y: 0.0,
        action: ControlAction::CropLeft,
        cursor: "pointer",
    });

    id
}

/// Dispatches a pointer position to the handler for the given handle.
pub fn apply_crop_handle(action: ControlAction, object: &mut SceneObject, pointer: Point) -> bool {
    match action {
        ControlAction::CropTop => crop_from_top(object, pointer),
        ControlAction::CropRight => crop_from_right(object, pointer),
        ControlAction::CropBottom => crop_from_bottom(object, pointer),
        ControlAction::CropLeft => crop_from_left(object, pointer),
    }
}

/// Right edge: narrows or widens the visible window in place.
pub fn crop_from_right(object: &mut SceneObject, pointer: Point) -> bool {
    if object.scale_x == 0.0 {
        return false;
    }
    let local_x = pointer[0] - object.left;
    let new_width = local_x / object.scale_x;
    let (natural_width, _) = object.original_size();
    let limit = natural_width - object.crop_x;
    if new_width > 0.0 && new_width <= limit {
        object.width = new_width;
        return true;
    }
    false
}

/// Left edge: narrows the window while sliding the crop offset so the right
/// edge stays fixed on the page.
pub fn crop_from_left(object: &mut SceneObject, pointer: Point) -> bool {
    let scaled_width = object.scaled_width();
    if scaled_width == 0.0 {
        return false;
    }
    let (natural_width, _) = object.original_size();
    let delta = pointer[0] - object.left;
    let percent_decrease = delta / scaled_width;
    let new_width = object.width * (1.0 - percent_decrease);
    let crop_delta = object.width * percent_decrease;
    let new_crop = object.crop_x + crop_delta;
    if new_width > 0.0 && new_width <= natural_width {
        object.width = new_width;
        object.crop_x = new_crop.max(0.0);
        object.left = pointer[0];
        return true;
    }
    false
}

/// Top edge: vertical counterpart of [`crop_from_left`].
pub fn crop_from_top(object: &mut SceneObject, pointer: Point) -> bool {
    let scaled_height = object.scaled_height();
    if scaled_height == 0.0 {
        return false;
    }
    let (_, natural_height) = object.original_size();
    let delta = pointer[1] - object.top;
    let percent_decrease = delta / scaled_height;
    let new_height = object.height * (1.0 - percent_decrease);
    let crop_delta = object.height * percent_decrease;
    if new_height > 0.0 && new_height <= natural_height {
        object.height = new_height;
        object.crop_y = (object.crop_y + crop_delta).max(0.0);
        object.top = pointer[1];
        return true;
    }
    false
}

/// Bottom edge: vertical counterpart of [`crop_from_right`].
pub fn crop_from_bottom(object: &mut SceneObject, pointer: Point) -> bool {
    let scaled_height = object.scaled_height();
    if scaled_height == 0.0 {
        return false;
    }
    let (_, natural_height) = object.original_size();
    let limit = natural_height - object.crop_y;
    let new_scaled_height = pointer[1] - object.top;
    let percent_of_full_height = new_scaled_height / scaled_height;
    let new_height = object.height * percent_of_full_height;
    if new_height > 0.0 && new_height <= limit {
        object.height = new_height;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ImageSource, SceneObject};

    fn editable_image(natural_width: f64, natural_height: f64) -> SceneObject {
        let mut object = SceneObject::image(ImageSource {
            data: Vec::new(),
            natural_width,
            natural_height,
        });
        ensure_editable(&mut object);
        object
    }

    #[test]
    fn ensure_editable_assigns_id_once() {
        let mut object = editable_image(100.0, 100.0);
        let first = object.id().cloned().unwrap();
        let second = ensure_editable(&mut object);
        assert_eq!(first, second);
    }

    #[test]
    fn ensure_editable_sets_baseline_flags() {
        let object = editable_image(100.0, 100.0);
        assert!(object.selectable);
        assert!(!object.transparent_corners);
        assert_eq!(object.snap_angle, SNAP_ANGLE_DEGREES);
        assert_eq!(object.stroke_width, 0.0);
    }

    #[test]
    fn ensure_editable_installs_all_four_handles_idempotently() {
        let mut object = editable_image(100.0, 100.0);
        ensure_editable(&mut object);
        let controls = &object.controls;
        assert_eq!(
            controls.top.as_ref().map(|c| c.action),
            Some(ControlAction::CropTop)
        );
        assert_eq!(
            controls.right.as_ref().map(|c| c.action),
            Some(ControlAction::CropRight)
        );
        assert_eq!(
            controls.bottom.as_ref().map(|c| c.action),
            Some(ControlAction::CropBottom)
        );
        assert_eq!(
            controls.left.as_ref().map(|c| c.action),
            Some(ControlAction::CropLeft)
        );
    }

    #[test]
    fn crop_right_shrinks_width() {
        let mut object = editable_image(100.0, 100.0);
        assert!(crop_from_right(&mut object, [60.0, 0.0]));
        assert_eq!(object.width, 60.0);
    }

    #[test]
    fn crop_right_respects_scale() {
        let mut object = editable_image(100.0, 100.0);
        object.scale_x = 2.0;
        assert!(crop_from_right(&mut object, [120.0, 0.0]));
        assert_eq!(object.width, 60.0);
    }

    #[test]
    fn crop_right_refuses_inverted_window() {
        let mut object = editable_image(100.0, 100.0);
        assert!(!crop_from_right(&mut object, [-5.0, 0.0]));
        assert_eq!(object.width, 100.0);
    }

    #[test]
    fn crop_right_clamps_to_remaining_asset() {
        let mut object = editable_image(100.0, 100.0);
        object.crop_x = 30.0;
        object.width = 70.0;
        // 80 would need 80 source columns but only 70 remain past the crop.
        assert!(!crop_from_right(&mut object, [80.0, 0.0]));
        assert_eq!(object.width, 70.0);
    }

    #[test]
    fn crop_left_moves_edge_and_offset_together() {
        let mut object = editable_image(100.0, 100.0);
        assert!(crop_from_left(&mut object, [25.0, 0.0]));
        assert_eq!(object.width, 75.0);
        assert_eq!(object.crop_x, 25.0);
        assert_eq!(object.left, 25.0);
    }

    #[test]
    fn crop_left_can_grow_back_into_cropped_region() {
        let mut object = editable_image(100.0, 100.0);
        object.crop_x = 20.0;
        object.width = 80.0;
        object.left = 20.0;
        assert!(crop_from_left(&mut object, [10.0, 0.0]));
        assert_eq!(object.width, 90.0);
        assert_eq!(object.crop_x, 10.0);
        assert_eq!(object.left, 10.0);
    }

    #[test]
    fn crop_left_offset_never_negative() {
        let mut object = editable_image(100.0, 100.0);
        object.crop_x = 5.0;
        object.width = 80.0;
        object.left = 20.0;
        assert!(crop_from_left(&mut object, [0.0, 0.0]));
        assert_eq!(object.crop_x, 0.0);
        assert_eq!(object.width, 100.0);
    }

    #[test]
    fn crop_left_refuses_overgrown_window() {
        let mut object = editable_image(100.0, 100.0);
        // Window already spans the full asset; growing past it is refused.
        assert!(!crop_from_left(&mut object, [-10.0, 0.0]));
        assert_eq!(object.width, 100.0);
        assert_eq!(object.left, 0.0);
    }

    #[test]
    fn crop_top_moves_edge_and_offset_together() {
        let mut object = editable_image(100.0, 80.0);
        object.top = 10.0;
        assert!(crop_from_top(&mut object, [0.0, 30.0]));
        assert_eq!(object.height, 60.0);
        assert_eq!(object.crop_y, 20.0);
        assert_eq!(object.top, 30.0);
    }

    #[test]
    fn crop_bottom_shrinks_height() {
        let mut object = editable_image(100.0, 80.0);
        object.top = 10.0;
        assert!(crop_from_bottom(&mut object, [0.0, 50.0]));
        assert_eq!(object.height, 40.0);
    }

    #[test]
    fn crop_bottom_clamps_to_remaining_asset() {
        let mut object = editable_image(100.0, 80.0);
        object.crop_y = 30.0;
        object.height = 50.0;
        assert!(!crop_from_bottom(&mut object, [0.0, 60.0]));
        assert_eq!(object.height, 50.0);
    }

    #[test]
    fn handlers_never_record_history_state() {
        // Handlers only touch the object; nothing else to observe here, but
        // the dispatch path must route each action to its edge.
        let mut object = editable_image(100.0, 100.0);
        assert!(apply_crop_handle(
            ControlAction::CropRight,
            &mut object,
            [40.0, 0.0]
        ));
        assert_eq!(object.width, 40.0);
    }
}
