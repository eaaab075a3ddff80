//! The fixed workflow graph.

use crate::{
    db::types::WorkflowState::{self, *},
    permissions::Capabilities,
};

/// Capabilities of which an actor must hold at least one to move content
/// from `from` to `to`, or `None` if there is no such edge.
///
/// Staying in the same state is not an edge.
pub fn requirement(from: WorkflowState, to: WorkflowState) -> Option<Capabilities> {
    let required = match (from, to) {
        (Draft, InReview) =>
            Capabilities::CREATE_CONTENT | Capabilities::PUBLISH_CONTENT,
        (Draft, Published) =>
            Capabilities::PUBLISH_CONTENT | Capabilities::CREATE_CONTENT,
        (InReview, ReadyToPublish) => Capabilities::EDIT_CONTENT,
        (InReview, Draft) => Capabilities::EDIT_CONTENT,
        (ReadyToPublish, Published) => Capabilities::PUBLISH_CONTENT,
        (ReadyToPublish, InReview) => Capabilities::PUBLISH_CONTENT,
        (Published, Inactive) =>
            Capabilities::EDIT_IS_ACTIVE
            | Capabilities::CREATE_CONTENT
            | Capabilities::SYSTEM,
        (Inactive, Published) =>
            Capabilities::EDIT_IS_ACTIVE | Capabilities::CREATE_CONTENT,
        _ => return None,
    };

    Some(required)
}

/// All states reachable from `from` in a single step.
pub fn targets(from: WorkflowState) -> impl Iterator<Item = WorkflowState> {
    WorkflowState::ALL.iter()
        .cloned()
        .filter(move |&to| requirement(from, to).is_some())
}

/// All edges of the graph, with their requirements.
pub fn edges() -> impl Iterator<Item = (WorkflowState, WorkflowState, Capabilities)> {
    WorkflowState::ALL.iter()
        .cloned()
        .flat_map(|from| targets(from).map(move |to| (from, to)))
        .filter_map(|(from, to)| requirement(from, to).map(|req| (from, to, req)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_has_eight_edges() {
        assert_eq!(edges().count(), 8);
    }

    #[test]
    fn no_self_loops() {
        for &state in WorkflowState::ALL.iter() {
            assert!(requirement(state, state).is_none());
        }
    }

    #[test]
    fn inactive_only_leads_back_to_published() {
        assert_eq!(targets(Inactive).collect::<Vec<_>>(), vec![Published]);
        assert!(requirement(Inactive, Draft).is_none());
    }

    #[test]
    fn system_only_withdraws() {
        let system = edges()
            .filter(|(_, _, req)| req.contains(Capabilities::SYSTEM))
            .map(|(from, to, _)| (from, to))
            .collect::<Vec<_>>();
        assert_eq!(system, vec![(Published, Inactive)]);
    }
}
