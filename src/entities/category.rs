// Category entity - groups accounts of one CategoryType

use super::{require_name, require_uuid, timestamp_or_now, CategoryType, MoneyRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    #[serde(default)]
    pub icon_uuid: Option<Uuid>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl Category {
    pub fn new(name: impl Into<String>, category_type: CategoryType) -> Self {
        let now = super::now_millis();
        Category {
            uuid: Uuid::new_v4(),
            name: name.into(),
            comment: String::new(),
            category_type,
            icon_uuid: None,
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_icon(mut self, icon_uuid: Option<Uuid>) -> Self {
        self.icon_uuid = icon_uuid;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }
}

impl MoneyRecord for Category {
    const ENTITY: &'static str = "category";

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn created(&self) -> i64 {
        self.created
    }

    fn modified(&self) -> i64 {
        self.modified
    }

    fn validate(&self) -> Result<()> {
        require_uuid(Self::ENTITY, self.uuid)?;
        require_name(Self::ENTITY, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let category = Category::new("  ", CategoryType::Expenses);
        assert!(category.validate().is_err());
    }

    #[test]
    fn test_json_uses_type_key() {
        let category = Category::new("Food", CategoryType::Expenses);
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["type"], "EXPENSES");
    }
}
