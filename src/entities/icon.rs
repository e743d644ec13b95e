use super::{require_name, require_uuid, timestamp_or_now, MoneyRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Small image attached to categories, accounts and contacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub uuid: Uuid,
    pub name: String,
    /// Image content; served separately so listings stay small
    #[serde(default, skip_serializing)]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl Icon {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Icon {
            uuid: Uuid::new_v4(),
            name: name.into(),
            bytes,
            created: 0,
            modified: 0,
        }
        .with_timestamps()
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }
}

impl MoneyRecord for Icon {
    const ENTITY: &'static str = "icon";

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
