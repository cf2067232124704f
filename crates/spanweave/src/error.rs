use thiserror::Error;

use crate::tree::NodeId;

/// Structural failures raised by [`Tree`](crate::Tree) operations.
///
/// Malformed *text* never ends up here: unterminated delimiters and quotes
/// are resolved by the scanners themselves. These errors only describe
/// misuse of node handles.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The handle is stale or was never issued.
    #[error("node {0} does not exist")]
    MissingNode(NodeId),
    /// A text operation was given an element.
    #[error("node {0} is not a text fragment")]
    NotText(NodeId),
    /// An element operation was given a text fragment.
    #[error("node {0} is not an element")]
    NotElement(NodeId),
    /// Roots have no parent to splice into.
    #[error("node {0} has no parent")]
    Detached(NodeId),
    /// A split offset past the end of the fragment.
    #[error("split offset {offset} is out of range for a fragment of {len} bytes")]
    SplitOutOfRange {
        /// Requested byte offset.
        offset: usize,
        /// Fragment length in bytes.
        len: usize,
    },
    /// A split offset inside a multi-byte character.
    #[error("split offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// Errors surfaced by [`Engine`](crate::Engine) entry points.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A tree operation failed mid-pass.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The node exists but is not a root, or is gone.
    #[error("root {0} is not a root of this tree")]
    UnknownRoot(NodeId),
}

/// Failure reported by an optional [`PresentationHook`](crate::PresentationHook).
///
/// The engine logs these and carries on with the pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{hook}: {message}")]
pub struct HookError {
    /// Name of the failing hook.
    pub hook: &'static str,
    /// What went wrong, for the log.
    pub message: String,
}

impl HookError {
    /// Build an error attributed to `hook`.
    #[must_use]
    pub fn new(hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            hook,
            message: message.into(),
        }
    }
}
