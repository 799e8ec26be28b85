/// Errors that can occur while registering or looking up backends
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Backend names are unique keys; a second registration is refused.
    #[error("backend already registered: {0}")]
    DuplicateBackend(String),

    #[error("backend name must not be empty")]
    EmptyName,
}
