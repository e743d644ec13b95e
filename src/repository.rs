// Repository layer - generic CRUD over SQLite
//
// Each entity names its table and columns and knows how to bind itself and
// read itself back from a row; the SQL strings are generated from that.
// The uuid column is always bound last so update can reuse the bind order.

use crate::entities::{
    Account, Card, Category, Contact, Currency, ExchangeSecurity, Icon, MoneyDocument, MoneyRecord,
    PeriodicPayment, Transaction,
};
use crate::error::{MoneyError, Result};
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub trait Repository: MoneyRecord + Sized {
    const TABLE: &'static str;
    /// Columns other than uuid, in bind order
    const COLUMNS: &'static [&'static str];

    fn bind(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=Self::COLUMNS.len() + 1).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}, uuid) VALUES ({})",
            Self::TABLE,
            Self::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = Self::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE uuid = ?{}",
            Self::TABLE,
            assignments.join(", "),
            Self::COLUMNS.len() + 1
        )
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.bind();
        values.push(uuid_value(self.uuid()));
        values
    }

    fn insert(conn: &Connection, record: &Self) -> Result<()> {
        conn.execute(&Self::insert_sql(), params_from_iter(record.values()))
            .map_err(|e| constraint_error(e, Self::ENTITY, record.uuid()))?;
        Ok(())
    }

    fn insert_all(conn: &Connection, records: &[Self]) -> Result<()> {
        let mut stmt = conn.prepare_cached(&Self::insert_sql())?;
        for record in records {
            stmt.execute(params_from_iter(record.values()))
                .map_err(|e| constraint_error(e, Self::ENTITY, record.uuid()))?;
        }
        Ok(())
    }

    fn update(conn: &Connection, record: &Self) -> Result<()> {
        let changed = conn
            .execute(&Self::update_sql(), params_from_iter(record.values()))
            .map_err(|e| constraint_error(e, Self::ENTITY, record.uuid()))?;
        if changed == 0 {
            return Err(MoneyError::not_found(Self::ENTITY, record.uuid()));
        }
        Ok(())
    }

    /// Returns false when nothing was deleted
    fn delete(conn: &Connection, uuid: Uuid) -> Result<bool> {
        let changed = conn
            .execute(&format!("DELETE FROM {} WHERE uuid = ?1", Self::TABLE), params![uuid.to_string()])
            .map_err(|e| constraint_error(e, Self::ENTITY, uuid))?;
        Ok(changed > 0)
    }

    fn get(conn: &Connection, uuid: Uuid) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT uuid, {} FROM {} WHERE uuid = ?1",
            Self::COLUMNS.join(", "),
            Self::TABLE
        );
        let record = conn
            .query_row(&sql, params![uuid.to_string()], |row| Self::from_row(row))
            .optional()?;
        Ok(record)
    }

    fn get_all(conn: &Connection) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT uuid, {} FROM {} ORDER BY rowid",
            Self::COLUMNS.join(", "),
            Self::TABLE
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], |row| Self::from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", Self::TABLE), [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Foreign key and uniqueness failures are caller mistakes, not store failures
fn constraint_error(err: rusqlite::Error, entity: &str, uuid: Uuid) -> MoneyError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, ref message) if e.code == ErrorCode::ConstraintViolation => {
            MoneyError::validation(format!(
                "{} {} violates a constraint: {}",
                entity,
                uuid,
                message.as_deref().unwrap_or("constraint failed")
            ))
        }
        other => MoneyError::Database(other),
    }
}

// ============================================================================
// VALUE HELPERS
// ============================================================================

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn uuid_value(uuid: Uuid) -> Value {
    Value::Text(uuid.to_string())
}

fn opt_uuid_value(uuid: Option<Uuid>) -> Value {
    uuid.map(uuid_value).unwrap_or(Value::Null)
}

fn decimal_value(value: Decimal) -> Value {
    Value::Text(value.to_string())
}

fn opt_decimal_value(value: Option<Decimal>) -> Value {
    value.map(decimal_value).unwrap_or(Value::Null)
}

fn date_value(date: NaiveDate) -> Value {
    Value::Text(date.format(DATE_FORMAT).to_string())
}

fn opt_date_value(date: Option<NaiveDate>) -> Value {
    date.map(date_value).unwrap_or(Value::Null)
}

fn opt_int_value(value: Option<i32>) -> Value {
    value.map(|v| Value::Integer(v as i64)).unwrap_or(Value::Null)
}

fn bool_value(value: bool) -> Value {
    Value::Integer(value as i64)
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn parse_column<T, E>(row: &Row<'_>, name: &str, raw: &str, parse: impl Fn(&str) -> std::result::Result<T, E>) -> rusqlite::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parse(raw).map_err(|e| {
        let index = row.as_ref().column_index(name).unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

fn get_uuid(row: &Row<'_>, name: &str) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(name)?;
    parse_column(row, name, &raw, Uuid::parse_str)
}

fn get_opt_uuid(row: &Row<'_>, name: &str) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|raw| parse_column(row, name, &raw, Uuid::parse_str)).transpose()
}

fn get_decimal(row: &Row<'_>, name: &str) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(name)?;
    parse_column(row, name, &raw, Decimal::from_str)
}

fn get_opt_decimal(row: &Row<'_>, name: &str) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|raw| parse_column(row, name, &raw, Decimal::from_str)).transpose()
}

fn get_date(row: &Row<'_>, name: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(name)?;
    parse_column(row, name, &raw, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))
}

fn get_opt_date(row: &Row<'_>, name: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|raw| parse_column(row, name, &raw, |s| NaiveDate::parse_from_str(s, DATE_FORMAT)))
        .transpose()
}

fn get_enum<T>(row: &Row<'_>, name: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = MoneyError>,
{
    let raw: String = row.get(name)?;
    parse_column(row, name, &raw, T::from_str)
}

// ============================================================================
// ENTITY MAPPINGS
// ============================================================================

impl Repository for Icon {
    const TABLE: &'static str = "icon";
    const COLUMNS: &'static [&'static str] = &["name", "bytes", "created", "modified"];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            Value::Blob(self.bytes.clone()),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Icon {
            uuid: get_uuid(row, "uuid")?,
            name: row.get("name")?,
            bytes: row.get("bytes")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for Category {
    const TABLE: &'static str = "category";
    const COLUMNS: &'static [&'static str] = &["name", "comment", "type", "icon_uuid", "created", "modified"];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.comment),
            text(self.category_type.as_str()),
            opt_uuid_value(self.icon_uuid),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            uuid: get_uuid(row, "uuid")?,
            name: row.get("name")?,
            comment: row.get("comment")?,
            category_type: get_enum(row, "type")?,
            icon_uuid: get_opt_uuid(row, "icon_uuid")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for Currency {
    const TABLE: &'static str = "currency";
    const COLUMNS: &'static [&'static str] = &[
        "symbol",
        "description",
        "format_symbol",
        "format_symbol_position",
        "show_format_symbol",
        "def",
        "rate",
        "direction",
        "use_thousand_separator",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.symbol),
            text(&self.description),
            text(&self.format_symbol),
            Value::Integer(self.format_symbol_position as i64),
            bool_value(self.show_format_symbol),
            bool_value(self.def),
            decimal_value(self.rate),
            Value::Integer(self.direction as i64),
            bool_value(self.use_thousand_separator),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Currency {
            uuid: get_uuid(row, "uuid")?,
            symbol: row.get("symbol")?,
            description: row.get("description")?,
            format_symbol: row.get("format_symbol")?,
            format_symbol_position: row.get("format_symbol_position")?,
            show_format_symbol: row.get("show_format_symbol")?,
            def: row.get("def")?,
            rate: get_decimal(row, "rate")?,
            direction: row.get("direction")?,
            use_thousand_separator: row.get("use_thousand_separator")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for ExchangeSecurity {
    const TABLE: &'static str = "exchange_security";
    const COLUMNS: &'static [&'static str] = &[
        "sec_id",
        "name",
        "short_name",
        "isin",
        "reg_number",
        "face_value",
        "issue_date",
        "mat_date",
        "days_to_redemption",
        "sec_group",
        "group_name",
        "sec_type",
        "type_name",
        "market_value",
        "coupon_value",
        "coupon_percent",
        "coupon_date",
        "coupon_frequency",
        "accrued_interest",
        "coupon_period",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.sec_id),
            text(&self.name),
            text(&self.short_name),
            text(&self.isin),
            text(&self.reg_number),
            decimal_value(self.face_value),
            opt_date_value(self.issue_date),
            opt_date_value(self.mat_date),
            opt_int_value(self.days_to_redemption),
            text(&self.group),
            text(&self.group_name),
            text(&self.security_type),
            text(&self.type_name),
            decimal_value(self.market_value),
            opt_decimal_value(self.coupon_value),
            opt_decimal_value(self.coupon_percent),
            opt_date_value(self.coupon_date),
            opt_int_value(self.coupon_frequency),
            opt_decimal_value(self.accrued_interest),
            opt_int_value(self.coupon_period),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ExchangeSecurity {
            uuid: get_uuid(row, "uuid")?,
            sec_id: row.get("sec_id")?,
            name: row.get("name")?,
            short_name: row.get("short_name")?,
            isin: row.get("isin")?,
            reg_number: row.get("reg_number")?,
            face_value: get_decimal(row, "face_value")?,
            issue_date: get_opt_date(row, "issue_date")?,
            mat_date: get_opt_date(row, "mat_date")?,
            days_to_redemption: row.get("days_to_redemption")?,
            group: row.get("sec_group")?,
            group_name: row.get("group_name")?,
            security_type: row.get("sec_type")?,
            type_name: row.get("type_name")?,
            market_value: get_decimal(row, "market_value")?,
            coupon_value: get_opt_decimal(row, "coupon_value")?,
            coupon_percent: get_opt_decimal(row, "coupon_percent")?,
            coupon_date: get_opt_date(row, "coupon_date")?,
            coupon_frequency: row.get("coupon_frequency")?,
            accrued_interest: get_opt_decimal(row, "accrued_interest")?,
            coupon_period: row.get("coupon_period")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for Account {
    const TABLE: &'static str = "account";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "comment",
        "account_number",
        "opening_balance",
        "account_limit",
        "currency_rate",
        "type",
        "category_uuid",
        "currency_uuid",
        "security_uuid",
        "enabled",
        "interest",
        "closing_date",
        "icon_uuid",
        "card_type",
        "card_number",
        "total",
        "total_waiting",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.comment),
            text(&self.account_number),
            decimal_value(self.opening_balance),
            decimal_value(self.account_limit),
            decimal_value(self.currency_rate),
            text(self.account_type.as_str()),
            uuid_value(self.category_uuid),
            opt_uuid_value(self.currency_uuid),
            opt_uuid_value(self.security_uuid),
            bool_value(self.enabled),
            decimal_value(self.interest),
            opt_date_value(self.closing_date),
            opt_uuid_value(self.icon_uuid),
            text(self.card_type.as_str()),
            text(&self.card_number),
            decimal_value(self.total),
            decimal_value(self.total_waiting),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Account {
            uuid: get_uuid(row, "uuid")?,
            name: row.get("name")?,
            comment: row.get("comment")?,
            account_number: row.get("account_number")?,
            opening_balance: get_decimal(row, "opening_balance")?,
            account_limit: get_decimal(row, "account_limit")?,
            currency_rate: get_decimal(row, "currency_rate")?,
            account_type: get_enum(row, "type")?,
            category_uuid: get_uuid(row, "category_uuid")?,
            currency_uuid: get_opt_uuid(row, "currency_uuid")?,
            security_uuid: get_opt_uuid(row, "security_uuid")?,
            enabled: row.get("enabled")?,
            interest: get_decimal(row, "interest")?,
            closing_date: get_opt_date(row, "closing_date")?,
            icon_uuid: get_opt_uuid(row, "icon_uuid")?,
            card_type: get_enum(row, "card_type")?,
            card_number: row.get("card_number")?,
            total: get_decimal(row, "total")?,
            total_waiting: get_decimal(row, "total_waiting")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for Card {
    const TABLE: &'static str = "card";
    const COLUMNS: &'static [&'static str] = &[
        "account_uuid",
        "card_type",
        "number",
        "expiration",
        "comment",
        "enabled",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            uuid_value(self.account_uuid),
            text(self.card_type.as_str()),
            text(&self.number),
            opt_date_value(self.expiration),
            text(&self.comment),
            bool_value(self.enabled),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Card {
            uuid: get_uuid(row, "uuid")?,
            account_uuid: get_uuid(row, "account_uuid")?,
            card_type: get_enum(row, "card_type")?,
            number: row.get("number")?,
            expiration: get_opt_date(row, "expiration")?,
            comment: row.get("comment")?,
            enabled: row.get("enabled")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for Contact {
    const TABLE: &'static str = "contact";
    const COLUMNS: &'static [&'static str] = &[
        "name", "type", "phone", "mobile", "email", "web", "comment", "street", "city", "country", "zip",
        "icon_uuid", "created", "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(self.contact_type.as_str()),
            text(&self.phone),
            text(&self.mobile),
            text(&self.email),
            text(&self.web),
            text(&self.comment),
            text(&self.street),
            text(&self.city),
            text(&self.country),
            text(&self.zip),
            opt_uuid_value(self.icon_uuid),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Contact {
            uuid: get_uuid(row, "uuid")?,
            name: row.get("name")?,
            contact_type: get_enum(row, "type")?,
            phone: row.get("phone")?,
            mobile: row.get("mobile")?,
            email: row.get("email")?,
            web: row.get("web")?,
            comment: row.get("comment")?,
            street: row.get("street")?,
            city: row.get("city")?,
            country: row.get("country")?,
            zip: row.get("zip")?,
            icon_uuid: get_opt_uuid(row, "icon_uuid")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for Transaction {
    const TABLE: &'static str = "transactions";
    const COLUMNS: &'static [&'static str] = &[
        "amount",
        "credit_amount",
        "transaction_date",
        "type",
        "comment",
        "checked",
        "account_debited_uuid",
        "account_credited_uuid",
        "account_debited_type",
        "account_credited_type",
        "account_debited_category_uuid",
        "account_credited_category_uuid",
        "contact_uuid",
        "invoice_number",
        "parent_uuid",
        "detailed",
        "statement_date",
        "card_uuid",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            decimal_value(self.amount),
            decimal_value(self.credit_amount),
            date_value(self.transaction_date),
            text(self.transaction_type.as_str()),
            text(&self.comment),
            bool_value(self.checked),
            uuid_value(self.account_debited_uuid),
            uuid_value(self.account_credited_uuid),
            text(self.account_debited_type.as_str()),
            text(self.account_credited_type.as_str()),
            uuid_value(self.account_debited_category_uuid),
            uuid_value(self.account_credited_category_uuid),
            opt_uuid_value(self.contact_uuid),
            text(&self.invoice_number),
            opt_uuid_value(self.parent_uuid),
            bool_value(self.detailed),
            date_value(self.statement_date),
            opt_uuid_value(self.card_uuid),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            uuid: get_uuid(row, "uuid")?,
            amount: get_decimal(row, "amount")?,
            credit_amount: get_decimal(row, "credit_amount")?,
            transaction_date: get_date(row, "transaction_date")?,
            transaction_type: get_enum(row, "type")?,
            comment: row.get("comment")?,
            checked: row.get("checked")?,
            account_debited_uuid: get_uuid(row, "account_debited_uuid")?,
            account_credited_uuid: get_uuid(row, "account_credited_uuid")?,
            account_debited_type: get_enum(row, "account_debited_type")?,
            account_credited_type: get_enum(row, "account_credited_type")?,
            account_debited_category_uuid: get_uuid(row, "account_debited_category_uuid")?,
            account_credited_category_uuid: get_uuid(row, "account_credited_category_uuid")?,
            contact_uuid: get_opt_uuid(row, "contact_uuid")?,
            invoice_number: row.get("invoice_number")?,
            parent_uuid: get_opt_uuid(row, "parent_uuid")?,
            detailed: row.get("detailed")?,
            statement_date: get_date(row, "statement_date")?,
            card_uuid: get_opt_uuid(row, "card_uuid")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for MoneyDocument {
    const TABLE: &'static str = "document";
    const COLUMNS: &'static [&'static str] = &[
        "owner_uuid",
        "contact_uuid",
        "type",
        "file_name",
        "date",
        "size",
        "compressed",
        "mime_type",
        "description",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            uuid_value(self.owner_uuid),
            uuid_value(self.contact_uuid),
            text(self.document_type.as_str()),
            text(&self.file_name),
            date_value(self.date),
            Value::Integer(self.size),
            bool_value(self.compressed),
            text(&self.mime_type),
            text(&self.description),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(MoneyDocument {
            uuid: get_uuid(row, "uuid")?,
            owner_uuid: get_uuid(row, "owner_uuid")?,
            contact_uuid: get_uuid(row, "contact_uuid")?,
            document_type: get_enum(row, "type")?,
            file_name: row.get("file_name")?,
            date: get_date(row, "date")?,
            size: row.get("size")?,
            compressed: row.get("compressed")?,
            mime_type: row.get("mime_type")?,
            description: row.get("description")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

impl Repository for PeriodicPayment {
    const TABLE: &'static str = "periodic_payment";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "payment_type",
        "recurrence_type",
        "amount",
        "day_of_month",
        "month",
        "account_debited_uuid",
        "account_credited_uuid",
        "contact_uuid",
        "comment",
        "created",
        "modified",
    ];

    fn bind(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(self.payment_type.as_str()),
            text(self.recurrence_type.as_str()),
            decimal_value(self.amount),
            Value::Integer(self.day_of_month as i64),
            Value::Integer(self.month as i64),
            uuid_value(self.account_debited_uuid),
            uuid_value(self.account_credited_uuid),
            uuid_value(self.contact_uuid),
            text(&self.comment),
            Value::Integer(self.created),
            Value::Integer(self.modified),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PeriodicPayment {
            uuid: get_uuid(row, "uuid")?,
            name: row.get("name")?,
            payment_type: get_enum(row, "payment_type")?,
            recurrence_type: get_enum(row, "recurrence_type")?,
            amount: get_decimal(row, "amount")?,
            day_of_month: row.get("day_of_month")?,
            month: row.get("month")?,
            account_debited_uuid: get_uuid(row, "account_debited_uuid")?,
            account_credited_uuid: get_uuid(row, "account_credited_uuid")?,
            contact_uuid: get_uuid(row, "contact_uuid")?,
            comment: row.get("comment")?,
            created: row.get("created")?,
            modified: row.get("modified")?,
        })
    }
}

// ============================================================================
// DOCUMENT CONTENT
// ============================================================================

pub fn put_document_content(conn: &Connection, uuid: Uuid, bytes: &[u8]) -> Result<()> {
    conn.execute(
        "INSERT INTO document_content (uuid, bytes) VALUES (?1, ?2)
         ON CONFLICT(uuid) DO UPDATE SET bytes = excluded.bytes",
        params![uuid.to_string(), bytes],
    )
    .map_err(|e| constraint_error(e, "document content", uuid))?;
    Ok(())
}

pub fn get_document_content(conn: &Connection, uuid: Uuid) -> Result<Option<Vec<u8>>> {
    let bytes = conn
        .query_row(
            "SELECT bytes FROM document_content WHERE uuid = ?1",
            params![uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(bytes)
}

pub fn get_all_document_content(conn: &Connection) -> Result<Vec<(Uuid, Vec<u8>)>> {
    let mut stmt = conn.prepare("SELECT uuid, bytes FROM document_content ORDER BY rowid")?;
    let contents = stmt
        .query_map([], |row| Ok((get_uuid(row, "uuid")?, row.get::<_, Vec<u8>>("bytes")?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(contents)
}
