// MoneyDocument - metadata of an attached file
// Content bytes live in the blob table and in the zip container.

use super::{require_uuid, timestamp_or_now, DocumentType, MoneyRecord};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyDocument {
    pub uuid: Uuid,
    /// Record the document belongs to; defaults to the contact
    #[serde(default)]
    pub owner_uuid: Uuid,
    pub contact_uuid: Uuid,
    #[serde(default)]
    pub document_type: DocumentType,
    pub file_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub compressed: bool,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl MoneyDocument {
    pub fn new(contact_uuid: Uuid, file_name: impl Into<String>, date: NaiveDate) -> Self {
        let now = super::now_millis();
        MoneyDocument {
            uuid: Uuid::new_v4(),
            owner_uuid: contact_uuid,
            contact_uuid,
            document_type: DocumentType::Other,
            file_name: file_name.into(),
            date,
            size: 0,
            compressed: false,
            mime_type: String::new(),
            description: String::new(),
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_owner(mut self, owner_uuid: Uuid) -> Self {
        self.owner_uuid = owner_uuid;
        self
    }

    pub fn with_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_size(mut self, size: i64, compressed: bool) -> Self {
        self.size = size;
        self.compressed = compressed;
        self
    }

    /// Fill the owner and timestamps left unset by a client
    pub fn normalized(mut self) -> Self {
        if self.owner_uuid.is_nil() {
            self.owner_uuid = self.contact_uuid;
        }
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }
}

impl MoneyRecord for MoneyDocument {
    const ENTITY: &'static str = "document";

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
        require_uuid("document contact", self.contact_uuid)?;
        if self.file_name.trim().is_empty() {
            return Err(MoneyError::validation("document file name must not be blank"));
        }
        Ok(())
    }
}
