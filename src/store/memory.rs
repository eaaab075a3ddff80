use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    audit::TransitionRecord,
    db::types::WorkflowState,
    models::{Category, ContentItem, NewCategory, NewContent},
};
use super::{Applied, Decide, Snapshot, Store, StoreError};

/// Store keeping all data in process memory.
///
/// Each content item has its own transition mutex, held for the whole
/// duration of [`Store::transition`], which gives the same guarantees as
/// row locks in [`PgStore`](super::PgStore). Readers never take that mutex;
/// they see the last committed version of an item, like they would in
/// a database. Nothing is persisted.
#[derive(Default)]
pub struct MemoryStore {
    categories: RwLock<Vec<Category>>,
    contents: RwLock<BTreeMap<i32, Arc<Entry>>>,
    records: Mutex<Vec<TransitionRecord>>,
}

struct Entry {
    transition: Mutex<()>,
    item: RwLock<ContentItem>,
}

impl Entry {
    fn committed(&self) -> ContentItem {
        self.item.read().clone()
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn entry(&self, id: i32) -> Result<Arc<Entry>, StoreError> {
        self.contents.read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn category(&self, id: i32) -> Result<Category, StoreError> {
        self.categories.read()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::CategoryNotFound)
    }
}

impl Store for MemoryStore {
    fn create_category(&self, new: &NewCategory) -> Result<Category, StoreError> {
        let mut categories = self.categories.write();
        let category = Category {
            id: categories.len() as i32 + 1,
            name: new.name.clone(),
            is_moderated: new.is_moderated,
        };
        categories.push(category.clone());
        Ok(category)
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.categories.read().clone())
    }

    fn create_content(&self, new: &NewContent, now: NaiveDateTime)
    -> Result<ContentItem, StoreError> {
        self.category(new.category)?;

        let mut contents = self.contents.write();
        let id = contents.keys().next_back().map_or(1, |last| last + 1);
        let data = new.as_db(now);
        let item = ContentItem {
            id,
            title: data.title.to_string(),
            summary: data.summary.to_string(),
            body: data.body.to_string(),
            author: data.author,
            category: data.category,
            is_active: data.is_active,
            state: data.state,
            created_at: data.created_at,
            published_at: None,
            expires_at: data.expires_at,
        };
        contents.insert(id, Arc::new(Entry {
            transition: Mutex::new(()),
            item: RwLock::new(item.clone()),
        }));
        Ok(item)
    }

    fn content(&self, id: i32) -> Result<Snapshot, StoreError> {
        let item = self.entry(id)?.committed();
        let category = self.category(item.category)?;
        Ok(Snapshot { item, category })
    }

    fn list_content(&self, state: Option<WorkflowState>)
    -> Result<Vec<ContentItem>, StoreError> {
        let entries = self.contents.read().values().cloned().collect::<Vec<_>>();

        Ok(entries.iter()
            .map(|entry| entry.committed())
            .filter(|item| state.map_or(true, |state| item.state == state))
            .collect())
    }

    fn transition(
        &self,
        id: i32,
        timeout: Duration,
        decide: &mut Decide,
    ) -> Result<Applied, StoreError> {
        let entry = self.entry(id)?;
        let _guard = entry.transition.try_lock_for(timeout)
            .ok_or(StoreError::Contended)?;

        let mut item = entry.committed();
        let before = Snapshot {
            category: self.category(item.category)?,
            item: item.clone(),
        };

        let change = match decide(&before) {
            Ok(Some(change)) => change,
            Ok(None) => return Ok(Applied::Unchanged(before)),
            Err(denial) => return Ok(Applied::Denied(before, denial)),
        };

        let record = {
            let mut records = self.records.lock();
            let record = TransitionRecord {
                id: records.len() as i64 + 1,
                content: id,
                actor: change.actor,
                from: item.state,
                to: change.to,
                timestamp: change.timestamp,
                reason: change.reason,
            };
            records.push(record.clone());
            record
        };

        item.state = change.to;
        item.published_at = item.published_at.or(change.published_at);
        *entry.item.write() = item.clone();

        Ok(Applied::Committed {
            before,
            item,
            record,
        })
    }

    fn history(&self, id: i32) -> Result<Vec<TransitionRecord>, StoreError> {
        self.entry(id)?;

        let mut records = self.records.lock()
            .iter()
            .filter(|record| record.content == id)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(TransitionRecord::newest_first);
        Ok(records)
    }

    fn expired(&self, now: NaiveDateTime) -> Result<Vec<i32>, StoreError> {
        let entries = self.contents.read().values().cloned().collect::<Vec<_>>();

        Ok(entries.iter()
            .map(|entry| entry.committed())
            .filter(|item| item.state == WorkflowState::Published)
            .filter(|item| item.expires_at.map_or(false, |expires| expires < now))
            .map(|item| item.id)
            .collect())
    }
}
