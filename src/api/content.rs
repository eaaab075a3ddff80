use actix_web::{App, HttpResponse, Json, Path, Query};
use serde::{Deserialize, Serialize};

use crate::{
    audit::TransitionRecord,
    db::types::WorkflowState,
    models::{ContentItem, NewContent},
    permissions::Capabilities,
    workflow::{ErrorKind, TransitionRequest},
};
use super::{ApiError, Error, RouteExt, State};

/// Configure routes.
pub fn routes(app: App<State>) -> App<State> {
    app
        .resource("/content", |r| {
            r.get().api_with(list_content);
            r.post().api_with(create_content);
        })
        .resource("/content/{id}", |r| {
            r.get().api_with(get_content);
        })
        .resource("/content/{id}/transition", |r| {
            r.post().api_with(request_transition);
        })
        .resource("/content/{id}/transitions", |r| {
            r.get().api_with(available_transitions);
        })
        .resource("/content/{id}/history", |r| {
            r.get().api_with(list_history);
        })
}

type Result<T, E=Error> = std::result::Result<T, E>;

#[derive(Deserialize)]
pub struct ListQuery {
    state: Option<String>,
}

/// Get list of all content, optionally only in a given state.
///
/// ## Method
///
/// ```text
/// GET /content?state=:state
/// ```
pub fn list_content(
    state: actix_web::State<State>,
    query: Query<ListQuery>,
) -> Result<Json<Vec<ContentItem>>> {
    let filter = match query.state {
        Some(ref name) => Some(name.parse::<WorkflowState>()?),
        None => None,
    };

    Ok(Json(state.engine.list(filter)?))
}

#[derive(Deserialize)]
pub struct NewContentBody {
    #[serde(flatten)]
    content: NewContent,
    /// Send the new content for review right away.
    #[serde(default)]
    submit: bool,
}

/// Create new content.
///
/// ## Method
///
/// ```text
/// POST /content
/// ```
pub fn create_content(
    state: actix_web::State<State>,
    data: Json<NewContentBody>,
) -> Result<HttpResponse> {
    let NewContentBody { content, submit } = data.into_inner();
    let item = state.engine.create_content(content, submit)?;

    Ok(HttpResponse::Created().json(item))
}

/// Get a content item by ID.
///
/// ## Method
///
/// ```text
/// GET /content/:id
/// ```
pub fn get_content(
    state: actix_web::State<State>,
    id: Path<i32>,
) -> Result<Json<ContentItem>> {
    Ok(Json(state.engine.content(id.into_inner())?))
}

#[derive(Deserialize)]
pub struct TransitionBody {
    /// ID of the user requesting the transition.
    actor: i32,
    /// Workflow capabilities of `actor`.
    #[serde(default)]
    capabilities: Capabilities,
    /// Name of the target state.
    state: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransitionResponse {
    Success {
        state: WorkflowState,
    },
    Error {
        #[serde(rename = "errorKind")]
        error_kind: ErrorKind,
        message: String,
    },
}

/// Move content to another state.
///
/// Rejections are reported with a status of `"error"`, the kind of
/// rejection and a message which can be shown to the user as is.
///
/// ## Method
///
/// ```text
/// POST /content/:id/transition
/// ```
pub fn request_transition(
    state: actix_web::State<State>,
    id: Path<i32>,
    data: Json<TransitionBody>,
) -> Result<HttpResponse> {
    let TransitionBody { actor, capabilities, state: target, reason } = data.into_inner();

    let request = TransitionRequest {
        content: id.into_inner(),
        actor,
        capabilities,
        target: target.parse::<WorkflowState>()?,
        reason,
    };

    match state.engine.request_transition(request) {
        Ok(done) => Ok(HttpResponse::Ok().json(TransitionResponse::Success {
            state: done.state,
        })),
        Err(err) if err.is_rejection() => Ok(HttpResponse::build(err.status())
            .json(TransitionResponse::Error {
                error_kind: err.kind(),
                message: err.to_string(),
            })),
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct ActorQuery {
    actor: i32,
    /// Comma-separated list of capability names.
    #[serde(default)]
    capabilities: String,
}

/// Get list of states an actor could move content to.
///
/// ## Method
///
/// ```text
/// GET /content/:id/transitions?actor=:actor&capabilities=:capabilities
/// ```
pub fn available_transitions(
    state: actix_web::State<State>,
    id: Path<i32>,
    query: Query<ActorQuery>,
) -> Result<Json<Vec<WorkflowState>>> {
    let capabilities = Capabilities::parse_list(&query.capabilities)?;

    state.engine.available_transitions(id.into_inner(), query.actor, capabilities)
        .map(Json)
        .map_err(Into::into)
}

/// Get transition history of content, newest first.
///
/// ## Method
///
/// ```text
/// GET /content/:id/history
/// ```
pub fn list_history(
    state: actix_web::State<State>,
    id: Path<i32>,
) -> Result<Json<Vec<TransitionRecord>>> {
    Ok(Json(state.engine.history(id.into_inner())?))
}
