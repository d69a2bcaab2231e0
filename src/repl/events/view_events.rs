//! # View Events
//!
//! Events describing which parts of the screen need repainting.

/// Events emitted when view updates are needed
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Full screen redraw required (terminal resize, modal closed, etc)
    FullRedrawRequired,

    /// Search input text or cursor changed
    SearchBarRedrawRequired,

    /// Rows, selection or scroll offset of the product list changed
    ListRedrawRequired,

    /// Selected product details (features, image status) changed
    DetailRedrawRequired,

    /// Status bar needs updating
    StatusBarUpdateRequired,

    /// Error notification appeared
    ModalRedrawRequired,

    /// Only cursor position/visibility needs updating (cheapest)
    CursorUpdateRequired,
}
