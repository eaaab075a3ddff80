use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::{models as db, types::WorkflowState};

/// A piece of content moving through the publication workflow.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub author: i32,
    pub category: i32,
    /// Soft-disable switch. The workflow never reads nor writes it.
    pub is_active: bool,
    pub state: WorkflowState,
    pub created_at: NaiveDateTime,
    /// Date of the first publication.
    pub published_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

impl ContentItem {
    pub(crate) fn from_db(data: db::Content) -> ContentItem {
        let db::Content {
            id, title, summary, body, author, category, is_active, state,
            created_at, published_at, expires_at,
        } = data;

        ContentItem {
            id, title, summary, body, author, category, is_active, state,
            created_at, published_at, expires_at,
        }
    }

    /// Has this content expired as of `now`?
    ///
    /// Content expires at the exact moment of its expiration date. Content
    /// without an expiration date never expires.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at.map_or(false, |expires| now >= expires)
    }

    /// Is `user` the author of this content?
    pub fn is_author(&self, user: i32) -> bool {
        self.author == user
    }
}

/// Data needed to create a new content item.
///
/// New content always starts in [`WorkflowState::Draft`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
    pub author: i32,
    pub category: i32,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
}

impl NewContent {
    pub(crate) fn as_db(&self, created_at: NaiveDateTime) -> db::NewContent {
        db::NewContent {
            title: &self.title,
            summary: &self.summary,
            body: &self.body,
            author: self.author,
            category: self.category,
            is_active: true,
            state: WorkflowState::Draft,
            created_at,
            expires_at: self.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn item(expires_at: Option<NaiveDateTime>) -> ContentItem {
        let created = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        ContentItem {
            id: 1,
            title: "Title".into(),
            summary: String::new(),
            body: String::new(),
            author: 1,
            category: 1,
            is_active: true,
            state: WorkflowState::Published,
            created_at: created,
            published_at: Some(created),
            expires_at,
        }
    }

    #[test]
    fn expires_at_the_exact_moment() {
        let at = NaiveDate::from_ymd_opt(2019, 3, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let content = item(Some(at));

        assert!(!content.is_expired(at - chrono::Duration::seconds(1)));
        assert!(content.is_expired(at));
    }

    #[test]
    fn content_without_date_never_expires() {
        let far = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert!(!item(None).is_expired(far));
    }
}
