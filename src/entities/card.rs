use super::{require_uuid, timestamp_or_now, CardType, MoneyRecord};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment card issued on an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub uuid: Uuid,
    pub account_uuid: Uuid,
    #[serde(default)]
    pub card_type: CardType,
    pub number: String,
    #[serde(default)]
    pub expiration: Option<NaiveDate>,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

fn default_enabled() -> bool {
    true
}

impl Card {
    pub fn new(account_uuid: Uuid, card_type: CardType, number: impl Into<String>) -> Self {
        let now = super::now_millis();
        Card {
            uuid: Uuid::new_v4(),
            account_uuid,
            card_type,
            number: number.into(),
            expiration: None,
            comment: String::new(),
            enabled: true,
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_expiration(mut self, expiration: NaiveDate) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }

    pub fn number_no_spaces(&self) -> String {
        self.number.replace(' ', "")
    }
}

impl MoneyRecord for Card {
    const ENTITY: &'static str = "card";

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
        require_uuid("card account", self.account_uuid)?;
        if self.number.trim().is_empty() {
            return Err(MoneyError::validation("card number must not be blank"));
        }
        Ok(())
    }
}
