use chrono::NaiveDateTime;
use diesel::{pg::PgConnection, prelude::*};
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::{
    audit::TransitionRecord,
    db::{
        Pool,
        models as db,
        schema::{categories, contents, transitions},
        types::WorkflowState,
    },
    models::{Category, ContentItem, NewCategory, NewContent},
};
use super::{Applied, Decide, Snapshot, Store, StoreError};

/// How long to wait before trying to lock a busy row again.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Store backed by a PostgreSQL database.
///
/// Transitions lock the content's row with `SELECT ... FOR UPDATE SKIP
/// LOCKED`, retrying until the row is free or the timeout passes.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> PgStore {
        PgStore { pool }
    }

    fn snapshot(dbcon: &PgConnection, item: db::Content) -> Result<Snapshot, StoreError> {
        let category = categories::table
            .find(item.category)
            .get_result::<db::Category>(dbcon)?;

        Ok(Snapshot {
            item: ContentItem::from_db(item),
            category: Category::from_db(category),
        })
    }

    /// Lock a content item's row for the rest of the current transaction.
    ///
    /// A row locked by another transaction is skipped rather than waited
    /// on, so a locked row and a missing one both return nothing. The two
    /// are told apart with a plain read, which doesn't wait for locks.
    fn lock(dbcon: &PgConnection, id: i32, timeout: Duration)
    -> Result<db::Content, StoreError> {
        let deadline = Instant::now() + timeout;

        loop {
            let item = contents::table
                .find(id)
                .for_update()
                .skip_locked()
                .get_result::<db::Content>(dbcon)
                .optional()?;

            if let Some(item) = item {
                return Ok(item);
            }

            contents::table
                .find(id)
                .select(contents::id)
                .get_result::<i32>(dbcon)?;

            let now = Instant::now();

            if now >= deadline {
                return Err(StoreError::Contended);
            }

            thread::sleep(LOCK_RETRY_INTERVAL.min(deadline - now));
        }
    }
}

impl Store for PgStore {
    fn create_category(&self, new: &NewCategory) -> Result<Category, StoreError> {
        let dbcon = self.pool.get()?;

        diesel::insert_into(categories::table)
            .values(db::NewCategory {
                name: &new.name,
                is_moderated: new.is_moderated,
            })
            .get_result::<db::Category>(&*dbcon)
            .map(Category::from_db)
            .map_err(Into::into)
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let dbcon = self.pool.get()?;

        categories::table
            .order_by(categories::id)
            .get_results::<db::Category>(&*dbcon)
            .map(|v| v.into_iter().map(Category::from_db).collect())
            .map_err(Into::into)
    }

    fn create_content(&self, new: &NewContent, now: NaiveDateTime)
    -> Result<ContentItem, StoreError> {
        let dbcon = self.pool.get()?;

        diesel::insert_into(contents::table)
            .values(&new.as_db(now))
            .get_result::<db::Content>(&*dbcon)
            .map(ContentItem::from_db)
            .map_err(Into::into)
    }

    fn content(&self, id: i32) -> Result<Snapshot, StoreError> {
        let dbcon = self.pool.get()?;
        let item = contents::table
            .find(id)
            .get_result::<db::Content>(&*dbcon)?;

        PgStore::snapshot(&*dbcon, item)
    }

    fn list_content(&self, state: Option<WorkflowState>)
    -> Result<Vec<ContentItem>, StoreError> {
        let dbcon = self.pool.get()?;
        let mut query = contents::table
            .order_by(contents::id)
            .into_boxed();

        if let Some(state) = state {
            query = query.filter(contents::state.eq(state));
        }

        query.get_results::<db::Content>(&*dbcon)
            .map(|v| v.into_iter().map(ContentItem::from_db).collect())
            .map_err(Into::into)
    }

    fn transition(
        &self,
        id: i32,
        timeout: Duration,
        decide: &mut Decide,
    ) -> Result<Applied, StoreError> {
        let dbcon = self.pool.get()?;

        dbcon.transaction::<_, StoreError, _>(|| {
            let item = PgStore::lock(&*dbcon, id, timeout)?;
            let before = PgStore::snapshot(&*dbcon, item)?;

            let change = match decide(&before) {
                Ok(Some(change)) => change,
                Ok(None) => return Ok(Applied::Unchanged(before)),
                Err(denial) => return Ok(Applied::Denied(before, denial)),
            };

            let published_at = before.item.published_at.or(change.published_at);

            let item = diesel::update(contents::table.find(id))
                .set((
                    contents::state.eq(change.to),
                    contents::published_at.eq(published_at),
                ))
                .get_result::<db::Content>(&*dbcon)?;

            let record = diesel::insert_into(transitions::table)
                .values(db::NewTransition {
                    content: id,
                    actor: change.actor.as_db(),
                    from_state: before.item.state,
                    to_state: change.to,
                    timestamp: change.timestamp,
                    reason: change.reason.as_ref().map(String::as_str),
                })
                .get_result::<db::Transition>(&*dbcon)?;

            Ok(Applied::Committed {
                before,
                item: ContentItem::from_db(item),
                record: TransitionRecord::from_db(record),
            })
        })
    }

    fn history(&self, id: i32) -> Result<Vec<TransitionRecord>, StoreError> {
        let dbcon = self.pool.get()?;

        // Fail with NotFound for unknown content rather than returning an
        // empty history.
        contents::table
            .find(id)
            .select(contents::id)
            .get_result::<i32>(&*dbcon)?;

        transitions::table
            .filter(transitions::content.eq(id))
            .order_by((transitions::timestamp.desc(), transitions::id.desc()))
            .get_results::<db::Transition>(&*dbcon)
            .map(|v| v.into_iter().map(TransitionRecord::from_db).collect())
            .map_err(Into::into)
    }

    fn expired(&self, now: NaiveDateTime) -> Result<Vec<i32>, StoreError> {
        let dbcon = self.pool.get()?;

        contents::table
            .filter(contents::state.eq(WorkflowState::Published)
                .and(contents::expires_at.lt(now)))
            .order_by(contents::id)
            .select(contents::id)
            .get_results::<i32>(&*dbcon)
            .map_err(Into::into)
    }
}
