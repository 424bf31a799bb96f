//! Scene object data types.
//!
//! A [`SceneObject`] is a positioned, transformable item on the page: an
//! image with an embedded encoded source, or a solid rectangle (the page
//! background). Objects are addressed by a stable string [`ObjectId`],
//! assigned once and never changed for the lifetime of the instance.
//! Everything else in the crate (actions, selections, clipboard) refers to
//! objects by id, never by pointer.
//!
//! Geometry uses plain `f64` scalars and `[f64; 2]` points instead of a
//! math library type; nothing here needs more than that.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D point in scene coordinates.
pub type Point = [f64; 2];

/// Stable, unique object identifier (UUID v4 text).
///
/// Identity is by-value: two `ObjectId`s compare equal when their text is
/// equal. After a remove/undo cycle the revived object carries a *new* id —
/// actions reference objects weakly by id precisely so they can outlive the
/// instance they were recorded against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Creates an id from an explicit string (used for well-known objects
    /// like the page background, and by the document-load path).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh globally-unique id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal origin anchor of an object's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Vertical origin anchor of an object's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    #[default]
    Top,
    Center,
    Bottom,
}

impl VerticalAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// The closed set of mutable, history-visible property names.
///
/// Actions store previous values keyed by `PropertyKey`; the serialized
/// form uses the camelCase names the portable records use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    Left,
    Top,
    Width,
    Height,
    ScaleX,
    ScaleY,
    Angle,
    CropX,
    CropY,
    OriginX,
    OriginY,
    Selectable,
    HasControls,
    TransparentCorners,
    HoverCursor,
    StrokeWidth,
    SnapAngle,
}

impl PropertyKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Top => "top",
            Self::Width => "width",
            Self::Height => "height",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Angle => "angle",
            Self::CropX => "cropX",
            Self::CropY => "cropY",
            Self::OriginX => "originX",
            Self::OriginY => "originY",
            Self::Selectable => "selectable",
            Self::HasControls => "hasControls",
            Self::TransparentCorners => "transparentCorners",
            Self::HoverCursor => "hoverCursor",
            Self::StrokeWidth => "strokeWidth",
            Self::SnapAngle => "snapAngle",
        }
    }

    /// Origin anchors are re-derived by the layout pass rather than restored
    /// verbatim; restoring them naively shifts geometry.
    pub fn is_origin_anchor(self) -> bool {
        matches!(self, Self::OriginX | Self::OriginY)
    }
}

/// A property value: number, flag, or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Embedded raster source for an image object.
///
/// `data` holds the encoded bytes (PNG as pasted/loaded); `natural_width` /
/// `natural_height` are the decoded pixel dimensions — the asset bounds the
/// crop window is clamped against.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub data: Vec<u8>,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// What kind of drawable an object is.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// A placed raster image.
    Image(ImageSource),
    /// A solid-fill rectangle (the page background).
    Rect { fill: String },
}

impl ObjectKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Rect { .. } => "rect",
        }
    }
}

/// The action a control handle performs while dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    CropTop,
    CropRight,
    CropBottom,
    CropLeft,
}

/// An interactive handle rendered on a selected object.
///
/// `x`/`y` are the handle position in the object's unit box (−0.5..0.5 from
/// the center, so `(0.0, -0.5)` is the top edge midpoint).
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub x: f64,
    pub y: f64,
    pub action: ControlAction,
    pub cursor: &'static str,
}

/// The fixed control slots of an editable object.
///
/// Slots are addressed by name and overwritten wholesale when the editable
/// contract is (re)installed, which keeps installation idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub top: Option<Control>,
    pub right: Option<Control>,
    pub bottom: Option<Control>,
    pub left: Option<Control>,
}

/// Axis-aligned corner coordinates of an object, rotation applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub tl: Point,
    pub tr: Point,
    pub br: Point,
    pub bl: Point,
}

/// A positioned, transformable object on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    id: Option<ObjectId>,
    pub kind: ObjectKind,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees, clockwise.
    pub angle: f64,
    /// Crop window offset into the source asset, in unscaled object units.
    pub crop_x: f64,
    pub crop_y: f64,
    pub origin_x: HorizontalAnchor,
    pub origin_y: VerticalAnchor,
    pub selectable: bool,
    pub has_controls: bool,
    pub transparent_corners: bool,
    /// Excluded objects are invisible to both export and the history log.
    pub exclude_from_export: bool,
    pub hover_cursor: Option<String>,
    pub snap_angle: f64,
    pub stroke_width: f64,
    pub controls: Controls,
    bounds: Option<Bounds>,
}

impl SceneObject {
    fn base(kind: ObjectKind, width: f64, height: f64) -> Self {
        Self {
            id: None,
            kind,
            left: 0.0,
            top: 0.0,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            crop_x: 0.0,
            crop_y: 0.0,
            origin_x: HorizontalAnchor::Left,
            origin_y: VerticalAnchor::Top,
            selectable: true,
            has_controls: true,
            transparent_corners: true,
            exclude_from_export: false,
            hover_cursor: None,
            snap_angle: 0.0,
            stroke_width: 0.0,
            controls: Controls::default(),
            bounds: None,
        }
    }

    /// Creates an image object displayed at its natural size.
    pub fn image(source: ImageSource) -> Self {
        let (w, h) = (source.natural_width, source.natural_height);
        Self::base(ObjectKind::Image(source), w, h)
    }

    /// Creates a solid rectangle.
    pub fn rect(fill: impl Into<String>, width: f64, height: f64) -> Self {
        Self::base(ObjectKind::Rect { fill: fill.into() }, width, height)
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Set an explicit id (well-known objects, document load).
    #[must_use]
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    /// The object's id, if one has been assigned.
    pub fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    /// Assigns an id. Ignored with a warning if one is already set — ids are
    /// immutable once assigned.
    pub fn assign_id(&mut self, id: ObjectId) {
        if let Some(existing) = &self.id {
            log::warn!("refusing to re-assign id {existing} -> {id}");
            return;
        }
        self.id = Some(id);
    }

    /// Displayed width after scaling.
    pub fn scaled_width(&self) -> f64 {
        self.width * self.scale_x
    }

    /// Displayed height after scaling.
    pub fn scaled_height(&self) -> f64 {
        self.height * self.scale_y
    }

    /// The underlying asset bounds the crop window may not exceed: decoded
    /// pixel size for images, current logical size for rectangles.
    pub fn original_size(&self) -> (f64, f64) {
        match &self.kind {
            ObjectKind::Image(source) => (source.natural_width, source.natural_height),
            ObjectKind::Rect { .. } => (self.width, self.height),
        }
    }

    /// Scales uniformly so the displayed width equals `target`.
    pub fn scale_to_width(&mut self, target: f64) {
        if self.width > 0.0 && target > 0.0 {
            let factor = target / self.width;
            self.scale_x = factor;
            self.scale_y = factor;
        }
    }

    /// Scales uniformly so the displayed height equals `target`.
    pub fn scale_to_height(&mut self, target: f64) {
        if self.height > 0.0 && target > 0.0 {
            let factor = target / self.height;
            self.scale_x = factor;
            self.scale_y = factor;
        }
    }

    /// Reads a property value.
    pub fn get(&self, key: PropertyKey) -> PropertyValue {
        match key {
            PropertyKey::Left => self.left.into(),
            PropertyKey::Top => self.top.into(),
            PropertyKey::Width => self.width.into(),
            PropertyKey::Height => self.height.into(),
            PropertyKey::ScaleX => self.scale_x.into(),
            PropertyKey::ScaleY => self.scale_y.into(),
            PropertyKey::Angle => self.angle.into(),
            PropertyKey::CropX => self.crop_x.into(),
            PropertyKey::CropY => self.crop_y.into(),
            PropertyKey::OriginX => self.origin_x.as_str().into(),
            PropertyKey::OriginY => self.origin_y.as_str().into(),
            PropertyKey::Selectable => self.selectable.into(),
            PropertyKey::HasControls => self.has_controls.into(),
            PropertyKey::TransparentCorners => self.transparent_corners.into(),
            PropertyKey::HoverCursor => {
                PropertyValue::Text(self.hover_cursor.clone().unwrap_or_default())
            }
            PropertyKey::StrokeWidth => self.stroke_width.into(),
            PropertyKey::SnapAngle => self.snap_angle.into(),
        }
    }

    /// Writes a property value. A value of the wrong shape for the key is
    /// logged and ignored rather than coerced.
    pub fn set(&mut self, key: PropertyKey, value: &PropertyValue) {
        match (key, value) {
            (PropertyKey::Left, PropertyValue::Number(n)) => self.left = *n,
            (PropertyKey::Top, PropertyValue::Number(n)) => self.top = *n,
            (PropertyKey::Width, PropertyValue::Number(n)) => self.width = *n,
            (PropertyKey::Height, PropertyValue::Number(n)) => self.height = *n,
            (PropertyKey::ScaleX, PropertyValue::Number(n)) => self.scale_x = *n,
            (PropertyKey::ScaleY, PropertyValue::Number(n)) => self.scale_y = *n,
            (PropertyKey::Angle, PropertyValue::Number(n)) => self.angle = *n,
            (PropertyKey::CropX, PropertyValue::Number(n)) => self.crop_x = *n,
            (PropertyKey::CropY, PropertyValue::Number(n)) => self.crop_y = *n,
            (PropertyKey::OriginX, PropertyValue::Text(t)) => {
                match HorizontalAnchor::parse(t) {
                    Some(anchor) => self.origin_x = anchor,
                    None => log::warn!("unknown originX anchor {t:?}"),
                }
            }
            (PropertyKey::OriginY, PropertyValue::Text(t)) => match VerticalAnchor::parse(t) {
                Some(anchor) => self.origin_y = anchor,
                None => log::warn!("unknown originY anchor {t:?}"),
            },
            (PropertyKey::Selectable, PropertyValue::Bool(b)) => self.selectable = *b,
            (PropertyKey::HasControls, PropertyValue::Bool(b)) => self.has_controls = *b,
            (PropertyKey::TransparentCorners, PropertyValue::Bool(b)) => {
                self.transparent_corners = *b;
            }
            (PropertyKey::HoverCursor, PropertyValue::Text(t)) => {
                self.hover_cursor = if t.is_empty() { None } else { Some(t.clone()) };
            }
            (PropertyKey::StrokeWidth, PropertyValue::Number(n)) => self.stroke_width = *n,
            (PropertyKey::SnapAngle, PropertyValue::Number(n)) => self.snap_angle = *n,
            (key, value) => {
                log::warn!("ignoring value {value:?} of wrong shape for property {key:?}");
            }
        }
    }

    /// Recomputes the cached corner coordinates from the current geometry.
    pub fn set_coords(&mut self) {
        let w = self.scaled_width();
        let h = self.scaled_height();
        let rad = self.angle.to_radians();
        let (sin, cos) = rad.sin_cos();
        let tl = [self.left, self.top];
        let tr = [tl[0] + w * cos, tl[1] + w * sin];
        let bl = [tl[0] - h * sin, tl[1] + h * cos];
        let br = [tr[0] + bl[0] - tl[0], tr[1] + bl[1] - tl[1]];
        self.bounds = Some(Bounds { tl, tr, br, bl });
    }

    /// Cached corner coordinates, if [`set_coords`](Self::set_coords) has run
    /// since the last geometry change.
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(w: f64, h: f64) -> SceneObject {
        SceneObject::image(ImageSource {
            data: Vec::new(),
            natural_width: w,
            natural_height: h,
        })
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(ObjectId::generate(), ObjectId::generate());
    }

    #[test]
    fn assign_id_is_write_once() {
        let mut object = test_image(10.0, 10.0);
        assert!(object.id().is_none());
        object.assign_id(ObjectId::new("a1"));
        object.assign_id(ObjectId::new("a2"));
        assert_eq!(object.id().map(ObjectId::as_str), Some("a1"));
    }

    #[test]
    fn image_starts_at_natural_size() {
        let object = test_image(640.0, 480.0);
        assert_eq!(object.width, 640.0);
        assert_eq!(object.height, 480.0);
        assert_eq!(object.original_size(), (640.0, 480.0));
    }

    #[test]
    fn get_set_round_trip_numeric() {
        let mut object = test_image(10.0, 10.0);
        object.set(PropertyKey::Left, &PropertyValue::Number(42.5));
        assert_eq!(object.get(PropertyKey::Left), PropertyValue::Number(42.5));
    }

    #[test]
    fn set_ignores_wrong_shape() {
        let mut object = test_image(10.0, 10.0);
        object.left = 7.0;
        object.set(PropertyKey::Left, &PropertyValue::Bool(true));
        assert_eq!(object.left, 7.0);
    }

    #[test]
    fn origin_anchors_round_trip_as_text() {
        let mut object = test_image(10.0, 10.0);
        object.set(PropertyKey::OriginX, &PropertyValue::Text("center".into()));
        assert_eq!(object.origin_x, HorizontalAnchor::Center);
        assert_eq!(
            object.get(PropertyKey::OriginX),
            PropertyValue::Text("center".into())
        );
    }

    #[test]
    fn scale_to_width_is_uniform() {
        let mut object = test_image(200.0, 100.0);
        object.scale_to_width(100.0);
        assert_eq!(object.scale_x, 0.5);
        assert_eq!(object.scale_y, 0.5);
        assert_eq!(object.scaled_width(), 100.0);
        assert_eq!(object.scaled_height(), 50.0);
    }

    #[test]
    fn set_coords_unrotated() {
        let mut object = test_image(100.0, 50.0).with_position(10.0, 20.0);
        object.set_coords();
        let bounds = object.bounds().unwrap();
        assert_eq!(bounds.tl, [10.0, 20.0]);
        assert_eq!(bounds.tr, [110.0, 20.0]);
        assert_eq!(bounds.bl, [10.0, 70.0]);
        assert_eq!(bounds.br, [110.0, 70.0]);
    }

    #[test]
    fn set_coords_applies_scale() {
        let mut object = test_image(100.0, 50.0);
        object.scale_x = 2.0;
        object.set_coords();
        let bounds = object.bounds().unwrap();
        assert_eq!(bounds.tr, [200.0, 0.0]);
    }

    #[test]
    fn property_key_serializes_camel_case() {
        let json = serde_json::to_string(&PropertyKey::ScaleX).unwrap();
        assert_eq!(json, "\"scaleX\"");
    }

    #[test]
    fn property_value_untagged_json() {
        assert_eq!(
            serde_json::to_string(&PropertyValue::Number(1.5)).unwrap(),
            "1.5"
        );
        assert_eq!(
            serde_json::from_str::<PropertyValue>("true").unwrap(),
            PropertyValue::Bool(true)
        );
    }
}
