//! Undo/redo history for the scene graph.
//!
//! The engine records every capturable mutation as an invertible
//! [`HistoryAction`] and replays actions in reverse (undo) or forward
//! (redo) while keeping the graph and the active selection consistent.
//!
//! - [`HistoryAction`] — closed tagged union of the three action kinds
//! - [`DocumentHistory`] — the two stacks, capture, and application
//! - [`CaptureTarget`] — what the manual capture path can address
//!
//! # Capture discipline
//!
//! The canvas queues a [`SceneEvent`](crate::scene::SceneEvent) for every
//! observable mutation; [`DocumentHistory::sync`] drains the queue after
//! each host gesture and records at most one action per event. Replay
//! (undo/redo) drains and discards its own notifications before returning
//! to idle, so applying an action never records new ones. Objects flagged
//! excluded-from-export never generate actions through any path.

mod action;
mod engine;

pub use action::{
    HistoryAction, HistoryError, HistoryResult, ModifyTarget, ObjectRef, PropertyMap,
};
pub use engine::{CaptureTarget, DocumentHistory, DEFAULT_MAX_UNDO};
