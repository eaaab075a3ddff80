use actix_web::{App, Json};

use crate::models::Category;
use super::{Error, RouteExt, State};

/// Configure routes.
pub fn routes(app: App<State>) -> App<State> {
    app
        .resource("/categories", |r| {
            r.get().api_with(list_categories);
        })
}

type Result<T, E=Error> = std::result::Result<T, E>;

/// Get list of all categories.
///
/// ## Method
///
/// ```text
/// GET /categories
/// ```
pub fn list_categories(state: actix_web::State<State>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.engine.categories()?))
}
