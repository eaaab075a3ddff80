//! The content publication workflow.

use failure::Fail;
use serde::Serialize;

use crate::{
    ApiError,
    audit::TransitionRecord,
    db::types::{StateLabel, WorkflowState},
    permissions::Capabilities,
    store::StoreError,
};

pub mod engine;
pub mod graph;
pub mod rules;
pub mod sweeper;

pub use self::{
    engine::{Clock, SystemClock, TransitionEngine},
    sweeper::ExpirySweeper,
};

/// A request to move a content item to another state.
#[derive(Clone, Debug)]
pub struct TransitionRequest {
    pub content: i32,
    /// ID of the user asking for the transition.
    pub actor: i32,
    /// Capabilities `actor` holds, as resolved by the caller.
    pub capabilities: Capabilities,
    pub target: WorkflowState,
    pub reason: Option<String>,
}

/// Result of a successful transition request.
#[derive(Clone, Debug)]
pub struct Transitioned {
    pub content: i32,
    /// State the content is in now.
    pub state: WorkflowState,
    /// Record of this transition, or `None` if the content was already in the
    /// requested state.
    pub record: Option<TransitionRecord>,
}

/// Reason for which rules refused a transition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Denial {
    InvalidTransition(WorkflowState, WorkflowState),
    Forbidden,
    ModeratedCategoryBlocked,
    NotAuthor,
    ContentExpired,
}

#[derive(ApiError, Debug, Fail)]
pub enum TransitionError {
    #[api(code = "content:not-found", status = "NOT_FOUND")]
    #[fail(display = "Contenido no encontrado.")]
    NotFound,
    #[api(code = "workflow:invalid-transition", status = "BAD_REQUEST")]
    #[fail(display = "No es posible cambiar de {} a {}.", _0, _1)]
    InvalidTransition(StateLabel, StateLabel),
    #[api(code = "workflow:forbidden", status = "FORBIDDEN")]
    #[fail(display = "No tienes permiso para cambiar el estado.")]
    Forbidden,
    #[api(code = "workflow:moderated-category", status = "FORBIDDEN")]
    #[fail(display = "No se puede publicar un contenido de categoría moderada \
        desde el estado de Borrador.")]
    ModeratedCategoryBlocked,
    #[api(code = "workflow:not-author", status = "FORBIDDEN")]
    #[fail(display = "Solo el autor puede cambiar el estado de este contenido.")]
    NotAuthor,
    #[api(code = "workflow:expired", status = "BAD_REQUEST")]
    #[fail(display = "El contenido ha expirado y no puede volver a publicarse.")]
    ContentExpired,
    /// Another transition of the same content didn't finish in time.
    #[api(code = "workflow:contended", status = "CONFLICT")]
    #[fail(display = "El contenido está siendo modificado. Inténtalo de nuevo.")]
    Contended,
    /// Storage failed. Nothing was changed and the request may be retried.
    #[api(status = "SERVICE_UNAVAILABLE")]
    #[fail(display = "Storage unavailable: {}", _0)]
    StorageUnavailable(#[cause] StoreError),
}

/// Kind of a [`TransitionError`], as reported to API clients.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    Forbidden,
    ModeratedCategoryBlocked,
    NotAuthor,
    ContentExpired,
    Contended,
    StorageUnavailable,
}

impl TransitionError {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            TransitionError::NotFound => ErrorKind::NotFound,
            TransitionError::InvalidTransition(..) => ErrorKind::InvalidTransition,
            TransitionError::Forbidden => ErrorKind::Forbidden,
            TransitionError::ModeratedCategoryBlocked =>
                ErrorKind::ModeratedCategoryBlocked,
            TransitionError::NotAuthor => ErrorKind::NotAuthor,
            TransitionError::ContentExpired => ErrorKind::ContentExpired,
            TransitionError::Contended => ErrorKind::Contended,
            TransitionError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }

    /// Is this a rejection of the request, as opposed to a failure of the
    /// system?
    pub fn is_rejection(&self) -> bool {
        match *self {
            TransitionError::StorageUnavailable(_) => false,
            _ => true,
        }
    }
}

impl From<Denial> for TransitionError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::InvalidTransition(from, to) =>
                TransitionError::InvalidTransition(StateLabel(from), StateLabel(to)),
            Denial::Forbidden => TransitionError::Forbidden,
            Denial::ModeratedCategoryBlocked => TransitionError::ModeratedCategoryBlocked,
            Denial::NotAuthor => TransitionError::NotAuthor,
            Denial::ContentExpired => TransitionError::ContentExpired,
        }
    }
}

impl From<StoreError> for TransitionError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => TransitionError::NotFound,
            StoreError::Contended => TransitionError::Contended,
            _ => TransitionError::StorageUnavailable(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_state_labels() {
        let err = TransitionError::from(Denial::InvalidTransition(
            WorkflowState::Draft, WorkflowState::ReadyToPublish));
        assert_eq!(err.to_string(), "No es posible cambiar de Borrador a A publicar.");
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn kinds_serialize_as_names() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::ModeratedCategoryBlocked).unwrap(),
            r#""ModeratedCategoryBlocked""#,
        );
    }
}
