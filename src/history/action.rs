//! Reversible history actions and their error type.
//!
//! A [`HistoryAction`] is the unit of undo/redo: an immutable record of one
//! mutation carrying enough data to invert it. The three kinds form a closed
//! tagged union — each case has exactly the fields it needs, so "which
//! optional fields are set for this kind" is not a question that can arise.
//!
//! Add/remove actions reference their subject through an [`ObjectRef`]:
//! either the id of a live object or a stored snapshot. Which one an entry
//! holds follows from the direction it will be applied in (removing needs
//! a live id, re-inserting needs a snapshot), and applying an entry yields
//! its inverse with the other reference form, which is what makes
//! undo/redo symmetric and repeatable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scene::{ModifiedTarget, ObjectId, PropertyKey, PropertyValue};
use crate::snapshot::{ObjectSnapshot, SnapshotError};

/// Previous (or, on the inverse side, current) property values by key.
pub type PropertyMap = BTreeMap<PropertyKey, PropertyValue>;

/// Reference to an action's subject: live by id, or stored as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectRef {
    /// The object is (expected to be) live in the graph.
    #[serde(rename = "objectId")]
    Live(ObjectId),
    /// A whitelist snapshot sufficient to rebuild the object.
    #[serde(rename = "snapshot")]
    Stored(ObjectSnapshot),
}

/// Which object(s) a modify action addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifyTarget {
    #[serde(rename = "objectId")]
    Object(ObjectId),
    #[serde(rename = "objectIds")]
    Selection(Vec<ObjectId>),
}

impl From<ModifiedTarget> for ModifyTarget {
    fn from(target: ModifiedTarget) -> Self {
        match target {
            ModifiedTarget::Object(id) => Self::Object(id),
            ModifiedTarget::Selection(ids) => Self::Selection(ids),
        }
    }
}

/// One undoable mutation.
///
/// The serialized form is the flat tagged record used when actions are
/// externalized for diagnostics: `kind` plus whichever of `objectId`,
/// `objectIds`, `snapshot`, and `previousProperties` the kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryAction {
    /// An object entered the graph. Applying removes the live object (or
    /// revives the stored form when this entry sits on the redo side).
    #[serde(rename = "add")]
    AddObject {
        #[serde(flatten)]
        object: ObjectRef,
    },
    /// An object left the graph. Applying revives the stored form (or
    /// removes the live object when this entry sits on the redo side).
    #[serde(rename = "remove")]
    RemoveObject {
        #[serde(flatten)]
        object: ObjectRef,
    },
    /// Properties of one object or of a selection changed; `previous` holds
    /// the values to write back.
    #[serde(rename = "modify")]
    ModifyObject {
        #[serde(flatten)]
        target: ModifyTarget,
        #[serde(rename = "previousProperties")]
        previous: PropertyMap,
    },
}

impl HistoryAction {
    /// A short label for the edit menu.
    pub fn description(&self) -> &'static str {
        match self {
            Self::AddObject { .. } => "Add object",
            Self::RemoveObject { .. } => "Remove object",
            Self::ModifyObject { .. } => "Modify object",
        }
    }
}

/// Errors from applying a history action.
#[derive(Debug)]
pub enum HistoryError {
    /// The action's payload cannot address anything (empty selection,
    /// empty property map).
    MalformedAction(String),
    /// The referenced object id is absent from the live graph.
    TargetNotFound(ObjectId),
    /// A stored snapshot could not be revived.
    Snapshot(SnapshotError),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedAction(msg) => write!(f, "malformed action: {msg}"),
            Self::TargetNotFound(id) => write!(f, "target not found: {id}"),
            Self::Snapshot(err) => write!(f, "snapshot error: {err}"),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SnapshotError> for HistoryError {
    fn from(err: SnapshotError) -> Self {
        Self::Snapshot(err)
    }
}

/// Result type for history operations.
pub type HistoryResult<T = ()> = Result<T, HistoryError>;
