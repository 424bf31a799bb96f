//! # Pasteup
//!
//! Scene model and undo/redo history engine for a print-oriented image
//! layout editor: place, move, crop, scale, and arrange images on a
//! virtual page, with every capturable mutation recorded as an invertible
//! action.
//!
//! The host application owns rendering, file dialogs, and export; this
//! crate owns the document model — the [`scene`] graph, the [`history`]
//! engine layered on top of it, the [`snapshot`] whitelist serialization
//! they share with the [`clipboard`], the [`editable`] object contract
//! with its edge-crop handles, the [`document`] lifecycle, and the
//! [`viewport`] math.

pub mod clipboard;
pub mod document;
pub mod editable;
pub mod history;
pub mod scene;
pub mod snapshot;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_util;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
