/// Errors from the navigation layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// The path doesn't name any screen.
    #[error("unknown path: {0}")]
    UnknownPath(String),
}
