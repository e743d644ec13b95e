// XML interchange format
//
//   <Money>
//     <Icons><Icon uuid=".." name=".." bytes="<base64>" created=".." modified=".."/></Icons>
//     <Categories>..</Categories>
//     ...
//   </Money>
//
// Every record is an empty element whose attributes are the record's
// non-null fields in camelCase. Icon images are inlined as base64; document
// payloads only travel in the zip container, which holds `money.xml` plus
// one entry per payload (`documents/<uuid>`, `icons/<uuid>`). An icon entry
// in the zip takes precedence over the inlined image.

pub mod export;
pub mod import;
pub mod records;

pub use export::{write_file, write_xml, write_zip};
pub use import::{read_file, read_xml, read_zip};

use crate::dao::{MoneyDao, MoneyDump};
use crate::error::{MoneyError, Result};
use log::info;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

pub const ROOT: &str = "Money";
pub const XML_ENTRY: &str = "money.xml";
pub const DOCUMENTS_DIR: &str = "documents";
pub const ICONS_DIR: &str = "icons";

/// Section element names in export order
pub const SECTIONS: &[&str] = &[
    "Icons",
    "Categories",
    "Currencies",
    "ExchangeSecurities",
    "Accounts",
    "Cards",
    "Contacts",
    "Transactions",
    "Documents",
    "PeriodicPayments",
];

// ============================================================================
// RECORD MAPPING
// ============================================================================

/// Entity that maps to one XML element
pub trait XmlRecord: Sized {
    const TAG: &'static str;

    fn to_attributes(&self) -> AttributeList;

    fn from_attributes(attributes: &Attributes) -> Result<Self>;
}

/// Attributes of an element being written, in output order
#[derive(Debug, Default)]
pub struct AttributeList(Vec<(&'static str, String)>);

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.0.push((name, value.to_string()));
        self
    }

    /// Skipped when `None`
    pub fn with_opt<T: ToString>(self, name: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

/// Attributes of an element being read
#[derive(Debug, Clone)]
pub struct Attributes {
    tag: String,
    values: HashMap<String, String>,
}

impl Attributes {
    pub fn new(tag: impl Into<String>) -> Self {
        Attributes {
            tag: tag.into(),
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn parse<T>(&self, name: &str, value: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        value
            .parse()
            .map_err(|e| MoneyError::xml(format!("{}.{}: invalid value '{}': {}", self.tag, name, value, e)))
    }

    /// Required attribute
    pub fn get<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self
            .raw(name)
            .ok_or_else(|| MoneyError::xml(format!("{}: missing attribute '{}'", self.tag, name)))?;
        self.parse(name, value)
    }

    pub fn get_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(name) {
            Some(value) => self.parse(name, value),
            None => Ok(default),
        }
    }

    pub fn get_opt<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.raw(name).map(|value| self.parse(name, value)).transpose()
    }

    /// Optional text, empty when missing
    pub fn string(&self, name: &str) -> String {
        self.raw(name).unwrap_or_default().to_string()
    }
}

// ============================================================================
// DAO ENTRY POINTS
// ============================================================================

/// Replace the whole ledger with the content of an XML or zip file
pub fn import_file(dao: &mut MoneyDao, path: &Path) -> Result<usize> {
    let dump = read_file(path)?;
    let count = dump.record_count();
    dao.import_full_dump(&dump)?;
    info!("Imported {} records from {}", count, path.display());
    Ok(count)
}

/// Write the whole ledger to an XML or zip file
pub fn export_file(dao: &MoneyDao, path: &Path, zip: bool) -> Result<usize> {
    let dump: MoneyDump = dao.export_dump()?;
    write_file(path, &dump, zip)?;
    info!("Exported {} records to {}", dump.record_count(), path.display());
    Ok(dump.record_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn attributes(pairs: &[(&str, &str)]) -> Attributes {
        let mut attributes = Attributes::new("Test");
        for (name, value) in pairs {
            attributes.insert(*name, *value);
        }
        attributes
    }

    #[test]
    fn test_typed_getters() {
        let uuid = Uuid::new_v4();
        let uuid_text = uuid.to_string();
        let attrs = attributes(&[
            ("uuid", uuid_text.as_str()),
            ("amount", "12.50"),
            ("date", "2024-02-29"),
            ("checked", "true"),
        ]);

        assert_eq!(attrs.get::<Uuid>("uuid").unwrap(), uuid);
        assert_eq!(attrs.get::<Decimal>("amount").unwrap(), dec!(12.50));
        assert_eq!(
            attrs.get::<NaiveDate>("date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(attrs.get_or("checked", false).unwrap());
        assert_eq!(attrs.get_or("limit", Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(attrs.get_opt::<Uuid>("iconUuid").unwrap(), None);
        assert_eq!(attrs.string("comment"), "");
    }

    #[test]
    fn test_missing_and_invalid_attributes() {
        let attrs = attributes(&[("amount", "twelve")]);
        assert!(matches!(attrs.get::<Uuid>("uuid"), Err(MoneyError::Xml(_))));
        let err = attrs.get::<Decimal>("amount").unwrap_err();
        assert!(err.to_string().contains("Test.amount"));
    }

    #[test]
    fn test_attribute_list_skips_none() {
        let list = AttributeList::new()
            .with("name", "Cash")
            .with_opt::<Uuid>("iconUuid", None)
            .with_opt("closingDate", Some("2024-01-01"));
        let names: Vec<_> = list.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "closingDate"]);
    }
}
