use chrono::NaiveDateTime;

use super::{schema::*, types::WorkflowState};

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "categories"]
pub struct Category {
    pub id: i32,
    /// Category's display name.
    pub name: String,
    /// Must content in this category pass review before being published?
    pub is_moderated: bool,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "categories"]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub is_moderated: bool,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "contents"]
pub struct Content {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// Content's body. Opaque to the workflow.
    pub body: String,
    /// ID of the user who wrote this content.
    pub author: i32,
    /// ID of the category this content belongs to.
    pub category: i32,
    /// Soft-disable switch, independent of `state`.
    pub is_active: bool,
    pub state: WorkflowState,
    pub created_at: NaiveDateTime,
    /// Date of the first publication. Never changed once set.
    pub published_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "contents"]
pub struct NewContent<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub body: &'a str,
    pub author: i32,
    pub category: i32,
    pub is_active: bool,
    pub state: WorkflowState,
    pub created_at: NaiveDateTime,
    pub expires_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[table_name = "transitions"]
pub struct Transition {
    pub id: i64,
    pub content: i32,
    /// ID of the acting user, or `None` for actions taken by the system.
    pub actor: Option<i32>,
    pub from_state: WorkflowState,
    pub to_state: WorkflowState,
    pub timestamp: NaiveDateTime,
    pub reason: Option<String>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[table_name = "transitions"]
pub struct NewTransition<'a> {
    pub content: i32,
    pub actor: Option<i32>,
    pub from_state: WorkflowState,
    pub to_state: WorkflowState,
    pub timestamp: NaiveDateTime,
    pub reason: Option<&'a str>,
}
