//! Property-whitelist serialization of scene objects.
//!
//! An [`ObjectSnapshot`] is the portable record form of a [`SceneObject`]:
//! exactly the whitelisted properties (identity, kind and embedded source,
//! geometry, crop offsets, origin anchors, and the interaction flag subset),
//! nothing else. The same whitelist backs history snapshots, the clipboard
//! copy path, and document persistence, so a capture/revive round trip is
//! faithful for precisely those properties. Transient UI state is never
//! captured and therefore never restored.
//!
//! Reviving an image snapshot decodes the embedded data to validate it and
//! to recover the natural asset bounds; a snapshot whose payload cannot be
//! decoded fails with [`SnapshotError::Image`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scene::{
    HorizontalAnchor, ImageSource, ObjectId, ObjectKind, SceneObject, VerticalAnchor,
};

/// Errors from snapshot capture, encoding, and revival.
#[derive(Debug)]
pub enum SnapshotError {
    /// Embedded image data could not be decoded back into a raster.
    Image(String),
    /// A record could not be decoded from its interchange form.
    Decode(String),
    /// A record could not be encoded into its interchange form.
    Encode(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(msg) => write!(f, "image data error: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Encode(msg) => write!(f, "encode error: {msg}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Kind-specific snapshot payload. Image sources travel base64-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotKind {
    Image {
        #[serde(with = "base64_bytes")]
        src: Vec<u8>,
    },
    Rect {
        fill: String,
    },
}

/// The whitelist projection of a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSnapshot {
    /// Recorded identity. Kept for diagnostics and document persistence;
    /// history revival strips it so a fresh id is assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    pub kind: SnapshotKind,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub crop_x: f64,
    pub crop_y: f64,
    pub origin_x: HorizontalAnchor,
    pub origin_y: VerticalAnchor,
    pub selectable: bool,
    pub has_controls: bool,
    pub transparent_corners: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_cursor: Option<String>,
}

impl ObjectSnapshot {
    /// Captures the whitelisted properties of a live object.
    pub fn capture(object: &SceneObject) -> Self {
        let kind = match &object.kind {
            ObjectKind::Image(source) => SnapshotKind::Image {
                src: source.data.clone(),
            },
            ObjectKind::Rect { fill } => SnapshotKind::Rect { fill: fill.clone() },
        };
        Self {
            id: object.id().cloned(),
            kind,
            left: object.left,
            top: object.top,
            width: object.width,
            height: object.height,
            scale_x: object.scale_x,
            scale_y: object.scale_y,
            angle: object.angle,
            crop_x: object.crop_x,
            crop_y: object.crop_y,
            origin_x: object.origin_x,
            origin_y: object.origin_y,
            selectable: object.selectable,
            has_controls: object.has_controls,
            transparent_corners: object.transparent_corners,
            hover_cursor: object.hover_cursor.clone(),
        }
    }

    /// Returns this snapshot with its recorded identity removed, so revival
    /// assigns a fresh id.
    #[must_use]
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    /// Encodes the record as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decodes a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}

/// Rebuilds a live object from a snapshot.
///
/// Image payloads are decoded to validate the data and recover natural
/// bounds. The result has no controls and no editable flags beyond the
/// recorded ones — callers that want an editable object run
/// [`ensure_editable`](crate::editable::ensure_editable) afterwards, which
/// also assigns an id when the snapshot carried none.
pub fn revive(snapshot: &ObjectSnapshot) -> Result<SceneObject, SnapshotError> {
    let mut object = match &snapshot.kind {
        SnapshotKind::Image { src } => {
            let decoded = image::load_from_memory(src)
                .map_err(|e| SnapshotError::Image(e.to_string()))?;
            use image::GenericImageView;
            let (w, h) = decoded.dimensions();
            SceneObject::image(ImageSource {
                data: src.clone(),
                natural_width: f64::from(w),
                natural_height: f64::from(h),
            })
        }
        SnapshotKind::Rect { fill } => {
            SceneObject::rect(fill.clone(), snapshot.width, snapshot.height)
        }
    };

    if let Some(id) = &snapshot.id {
        object.assign_id(id.clone());
    }
    object.left = snapshot.left;
    object.top = snapshot.top;
    object.width = snapshot.width;
    object.height = snapshot.height;
    object.scale_x = snapshot.scale_x;
    object.scale_y = snapshot.scale_y;
    object.angle = snapshot.angle;
    object.crop_x = snapshot.crop_x;
    object.crop_y = snapshot.crop_y;
    object.origin_x = snapshot.origin_x;
    object.origin_y = snapshot.origin_y;
    object.selectable = snapshot.selectable;
    object.has_controls = snapshot.has_controls;
    object.transparent_corners = snapshot.transparent_corners;
    object.hover_cursor = snapshot.hover_cursor.clone();
    object.set_coords();
    Ok(object)
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PropertyKey;
    use crate::test_util::image_object;

    fn sample_image_object() -> SceneObject {
        let mut object = image_object(4, 2)
            .with_position(10.0, 20.0)
            .with_id(ObjectId::new("a1"));
        object.scale_x = 2.0;
        object.crop_x = 1.0;
        object
    }

    #[test]
    fn capture_projects_whitelist() {
        let object = sample_image_object();
        let snapshot = ObjectSnapshot::capture(&object);
        assert_eq!(snapshot.id.as_ref().map(ObjectId::as_str), Some("a1"));
        assert_eq!(snapshot.left, 10.0);
        assert_eq!(snapshot.scale_x, 2.0);
        assert_eq!(snapshot.crop_x, 1.0);
    }

    #[test]
    fn revive_restores_whitelisted_properties() {
        let object = sample_image_object();
        let snapshot = ObjectSnapshot::capture(&object);
        let revived = revive(&snapshot).unwrap();
        assert_eq!(revived.id().map(ObjectId::as_str), Some("a1"));
        for key in [
            PropertyKey::Left,
            PropertyKey::Top,
            PropertyKey::Width,
            PropertyKey::Height,
            PropertyKey::ScaleX,
            PropertyKey::ScaleY,
            PropertyKey::Angle,
            PropertyKey::CropX,
            PropertyKey::CropY,
        ] {
            assert_eq!(revived.get(key), object.get(key), "{key:?}");
        }
    }

    #[test]
    fn revive_recovers_natural_bounds_from_data() {
        let snapshot = ObjectSnapshot::capture(&sample_image_object());
        let revived = revive(&snapshot).unwrap();
        assert_eq!(revived.original_size(), (4.0, 2.0));
    }

    #[test]
    fn revive_without_id_leaves_identity_unassigned() {
        let snapshot = ObjectSnapshot::capture(&sample_image_object()).without_id();
        let revived = revive(&snapshot).unwrap();
        assert!(revived.id().is_none());
    }

    #[test]
    fn revive_rejects_undecodable_image_data() {
        let mut snapshot = ObjectSnapshot::capture(&sample_image_object());
        snapshot.kind = SnapshotKind::Image {
            src: vec![0, 1, 2, 3],
        };
        assert!(matches!(revive(&snapshot), Err(SnapshotError::Image(_))));
    }

    #[test]
    fn json_round_trip() {
        let snapshot = ObjectSnapshot::capture(&sample_image_object());
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"type\":\"image\""));
        assert!(json.contains("\"scaleX\""));
        let decoded = ObjectSnapshot::from_json(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn rect_snapshot_round_trips_without_image_decode() {
        let rect = SceneObject::rect("white", 100.0, 200.0).with_id(ObjectId::new("bg"));
        let snapshot = ObjectSnapshot::capture(&rect);
        let revived = revive(&snapshot).unwrap();
        assert_eq!(revived.kind, rect.kind);
        assert_eq!(revived.width, 100.0);
        assert_eq!(revived.height, 200.0);
    }

    #[test]
    fn transient_state_is_not_captured() {
        let mut object = sample_image_object();
        object.exclude_from_export = true;
        let revived = revive(&ObjectSnapshot::capture(&object)).unwrap();
        // Not on the whitelist: reset to default on revival.
        assert!(!revived.exclude_from_export);
    }
}
