//! Persistence of content, categories and the audit log.
//!
//! The workflow engine talks to storage only through [`Store`]. Production
//! deployments use [`PgStore`]; [`MemoryStore`] keeps everything in process
//! and honours the same locking rules.

use chrono::NaiveDateTime;
use diesel::result::{DatabaseErrorKind, Error as DbError};
use failure::Fail;
use std::time::Duration;

use crate::{
    ApiError,
    audit::{Actor, TransitionRecord},
    db::types::WorkflowState,
    models::{Category, ContentItem, NewCategory, NewContent},
    workflow::Denial,
};

pub mod memory;
pub mod postgres;

pub use self::{memory::MemoryStore, postgres::PgStore};

/// A content item together with the category it belongs to, as seen while
/// holding the item's lock.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub item: ContentItem,
    pub category: Category,
}

/// State change to be committed by [`Store::transition`].
#[derive(Clone, Debug)]
pub struct Change {
    pub to: WorkflowState,
    /// Publication date to set, unless the item already has one.
    pub published_at: Option<NaiveDateTime>,
    pub actor: Actor,
    pub timestamp: NaiveDateTime,
    pub reason: Option<String>,
}

/// Outcome of [`Store::transition`].
#[derive(Debug)]
pub enum Applied {
    /// Decision function didn't request any change.
    Unchanged(Snapshot),
    /// Change was committed.
    Committed {
        /// Item as it was before the change.
        before: Snapshot,
        /// Item after the change.
        item: ContentItem,
        record: TransitionRecord,
    },
    /// Decision function refused to make a change.
    Denied(Snapshot, Denial),
}

/// Decision made while holding an item's lock.
pub type Decide<'a> = dyn FnMut(&Snapshot) -> Result<Option<Change>, Denial> + 'a;

pub trait Store: Send + Sync {
    /// Create a new category.
    fn create_category(&self, new: &NewCategory) -> Result<Category, StoreError>;

    /// List all categories, ordered by ID.
    fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Create a new content item in [`WorkflowState::Draft`].
    fn create_content(&self, new: &NewContent, now: NaiveDateTime)
    -> Result<ContentItem, StoreError>;

    /// Get current state of a content item.
    fn content(&self, id: i32) -> Result<Snapshot, StoreError>;

    /// List content items, ordered by ID, optionally only those in a
    /// particular state.
    fn list_content(&self, state: Option<WorkflowState>)
    -> Result<Vec<ContentItem>, StoreError>;

    /// Lock a content item and let `decide` determine what to do with it.
    ///
    /// The lock is held from reading the item until the change (if any) and
    /// its audit record are committed, so no other transition of the same
    /// item can interleave. If the lock can't be acquired within `timeout`
    /// this fails with [`StoreError::Contended`] without calling `decide`.
    ///
    /// Returning `Ok(None)` from `decide` leaves the item untouched and
    /// writes no record.
    fn transition(
        &self,
        id: i32,
        timeout: Duration,
        decide: &mut Decide,
    ) -> Result<Applied, StoreError>;

    /// Get complete transition history of a content item, newest first.
    fn history(&self, id: i32) -> Result<Vec<TransitionRecord>, StoreError>;

    /// Find IDs of all published content whose expiration date is before
    /// `now`.
    fn expired(&self, now: NaiveDateTime) -> Result<Vec<i32>, StoreError>;
}

#[derive(ApiError, Debug, Fail)]
pub enum StoreError {
    #[api(code = "content:not-found", status = "NOT_FOUND")]
    #[fail(display = "No such content")]
    NotFound,
    #[api(code = "category:not-found", status = "BAD_REQUEST")]
    #[fail(display = "No such category")]
    CategoryNotFound,
    /// Lock on a content item could not be acquired in time.
    #[api(code = "content:contended", status = "CONFLICT")]
    #[fail(display = "Content is locked by another transition")]
    Contended,
    #[api(status = "SERVICE_UNAVAILABLE")]
    #[fail(display = "Database error: {}", _0)]
    Database(#[cause] DbError),
    #[api(status = "SERVICE_UNAVAILABLE")]
    #[fail(display = "Cannot obtain database connection: {}", _0)]
    Pool(#[cause] r2d2::Error),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => StoreError::NotFound,
            DbError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) =>
                StoreError::CategoryNotFound,
            _ => StoreError::Database(e),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Pool(e)
    }
}
