use serde::{Deserialize, Serialize};

use crate::db::models as db;

/// Category content is filed under.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    /// Content in a moderated category can only be published after being
    /// reviewed, that is from [`WorkflowState::ReadyToPublish`].
    ///
    /// [`WorkflowState::ReadyToPublish`]: crate::db::types::WorkflowState::ReadyToPublish
    #[serde(rename = "isModerated")]
    pub is_moderated: bool,
}

impl Category {
    pub(crate) fn from_db(data: db::Category) -> Category {
        let db::Category { id, name, is_moderated } = data;
        Category { id, name, is_moderated }
    }
}

/// Data needed to create a new category.
#[derive(Clone, Debug, Deserialize)]
pub struct NewCategory {
    pub name: String,
    /// Categories are moderated unless stated otherwise.
    #[serde(default = "default_moderated", rename = "isModerated")]
    pub is_moderated: bool,
}

fn default_moderated() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_moderated_by_default() {
        let new: NewCategory = serde_json::from_str(r#"{"name": "Opinión"}"#).unwrap();
        assert!(new.is_moderated);
    }
}
