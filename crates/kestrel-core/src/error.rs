use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("{name} not registered")]
    NotRegistered { name: &'static str },
    #[error("context registered under {name} has a different type")]
    TypeMismatch { name: &'static str },
}
