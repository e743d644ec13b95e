use super::{require_name, require_uuid, timestamp_or_now, ContactType, MoneyRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counterparty of transactions and owner of documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default, rename = "type")]
    pub contact_type: ContactType,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub web: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub icon_uuid: Option<Uuid>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub modified: i64,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        let now = super::now_millis();
        Contact {
            uuid: Uuid::new_v4(),
            name: name.into(),
            contact_type: ContactType::Personal,
            phone: String::new(),
            mobile: String::new(),
            email: String::new(),
            web: String::new(),
            comment: String::new(),
            street: String::new(),
            city: String::new(),
            country: String::new(),
            zip: String::new(),
            icon_uuid: None,
            created: now,
            modified: now,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_type(mut self, contact_type: ContactType) -> Self {
        self.contact_type = contact_type;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>, mobile: impl Into<String>) -> Self {
        self.phone = phone.into();
        self.mobile = mobile.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_address(
        mut self,
        street: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        self.street = street.into();
        self.city = city.into();
        self.country = country.into();
        self.zip = zip.into();
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.created = timestamp_or_now(self.created);
        self.modified = timestamp_or_now(self.modified);
        self
    }
}

impl MoneyRecord for Contact {
    const ENTITY: &'static str = "contact";

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
