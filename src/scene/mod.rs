//! Scene graph: objects, the live canvas, and ephemeral selections.
//!
//! - [`SceneObject`] — a positioned, transformable drawable with a stable
//!   string id and a closed set of history-visible properties
//! - [`Canvas`] — the mutable object set, active-target tracking, and the
//!   tagged notification queue consumers drain per gesture
//! - [`Selection`] — a transient multi-object aggregate addressed by ids

mod canvas;
mod object;
mod selection;

pub use canvas::{ActiveTarget, Canvas, GroupBounds, ModifiedTarget, SceneEvent, TransformOriginal};
pub use object::{
    Bounds, Control, ControlAction, Controls, HorizontalAnchor, ImageSource, ObjectId,
    ObjectKind, Point, PropertyKey, PropertyValue, SceneObject, VerticalAnchor,
};
pub use selection::Selection;
