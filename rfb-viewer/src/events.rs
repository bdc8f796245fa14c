//! Events returned to the host by [`crate::Session::poll`].

use rfb_common::Rect;

/// One consumed server message, in host terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Regions of the framebuffer changed; re-render them.
    FramebufferUpdated {
        /// The rectangles touched, in arrival order.
        rectangles: Vec<Rect>,
    },
    /// The server rang the bell. Advisory only.
    Bell,
    /// The server's clipboard changed. Advisory only.
    Clipboard(String),
}
