use diesel_derive_enum::DbEnum;
use failure::Fail;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::ApiError;

/// State of a content item in the publication workflow.
///
/// This is the complete set of states; the database enum type mirrors it
/// exactly, so no other value can ever be persisted.
#[derive(Clone, Copy, DbEnum, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[DieselType = "Workflow_state"]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Content is being written by its author.
    Draft,
    /// Content was submitted and is being reviewed by an editor.
    InReview,
    /// Content was accepted by an editor and awaits a publisher.
    ReadyToPublish,
    /// Content is visible to readers.
    Published,
    /// Content was withdrawn, either manually or because it expired.
    Inactive,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 5] = [
        WorkflowState::Draft,
        WorkflowState::InReview,
        WorkflowState::ReadyToPublish,
        WorkflowState::Published,
        WorkflowState::Inactive,
    ];

    /// Machine name of this state, as used in the API and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Draft => "draft",
            WorkflowState::InReview => "in_review",
            WorkflowState::ReadyToPublish => "ready_to_publish",
            WorkflowState::Published => "published",
            WorkflowState::Inactive => "inactive",
        }
    }

    /// Name of this state as shown to operators.
    pub fn label(self) -> &'static str {
        match self {
            WorkflowState::Draft => "Borrador",
            WorkflowState::InReview => "Edicion",
            WorkflowState::ReadyToPublish => "A publicar",
            WorkflowState::Published => "Publicado",
            WorkflowState::Inactive => "Inactivo",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = ParseStateError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        WorkflowState::ALL.iter()
            .cloned()
            .find(|state| state.as_str() == v)
            .ok_or_else(|| ParseStateError(v.to_string()))
    }
}

/// Displays a state by its operator-facing [`WorkflowState::label()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StateLabel(pub WorkflowState);

impl fmt::Display for StateLabel {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.0.label())
    }
}

#[derive(ApiError, Debug, Fail)]
#[api(code = "workflow:state:unknown", status = "BAD_REQUEST")]
#[fail(display = "Estado '{}' no es válido.", _0)]
pub struct ParseStateError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_state_by_name() {
        for state in WorkflowState::ALL.iter() {
            assert_eq!(state.as_str().parse::<WorkflowState>().unwrap(), *state);
        }
    }

    #[test]
    fn reject_legacy_names() {
        let err = "to_publish".parse::<WorkflowState>().unwrap_err();
        assert_eq!(err.to_string(), "Estado 'to_publish' no es válido.");
    }
}
