// Attribute mapping for every entity

use super::{AttributeList, Attributes, XmlRecord};
use crate::entities::{
    timestamp_or_now, Account, CardType, Card, Category, CategoryType, Contact, ContactType, Currency, DocumentType,
    ExchangeSecurity, Icon, MoneyDocument, PeriodicPayment, PeriodicPaymentType, RecurrenceType, Transaction,
    TransactionType,
};
use crate::error::{MoneyError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rust_decimal::Decimal;
use uuid::Uuid;

fn timestamps(list: AttributeList, created: i64, modified: i64) -> AttributeList {
    list.with("created", created).with("modified", modified)
}

fn read_timestamps(attrs: &Attributes) -> Result<(i64, i64)> {
    let created = timestamp_or_now(attrs.get_or("created", 0)?);
    let modified = timestamp_or_now(attrs.get_or("modified", created)?);
    Ok((created, modified))
}

impl XmlRecord for Icon {
    const TAG: &'static str = "Icon";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("name", &self.name)
            .with("bytes", BASE64.encode(&self.bytes));
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        let bytes = BASE64
            .decode(attrs.string("bytes").trim())
            .map_err(|e| MoneyError::xml(format!("Icon.bytes: invalid base64: {}", e)))?;
        Ok(Icon {
            uuid: attrs.get("uuid")?,
            name: attrs.get("name")?,
            bytes,
            created,
            modified,
        })
    }
}

impl XmlRecord for Category {
    const TAG: &'static str = "Category";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("name", &self.name)
            .with("comment", &self.comment)
            .with("type", self.category_type)
            .with_opt("iconUuid", self.icon_uuid);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(Category {
            uuid: attrs.get("uuid")?,
            name: attrs.get("name")?,
            comment: attrs.string("comment"),
            category_type: attrs.get::<CategoryType>("type")?,
            icon_uuid: attrs.get_opt("iconUuid")?,
            created,
            modified,
        })
    }
}

impl XmlRecord for Currency {
    const TAG: &'static str = "Currency";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("symbol", &self.symbol)
            .with("description", &self.description)
            .with("formatSymbol", &self.format_symbol)
            .with("formatSymbolPosition", self.format_symbol_position)
            .with("showFormatSymbol", self.show_format_symbol)
            .with("def", self.def)
            .with("rate", self.rate)
            .with("direction", self.direction)
            .with("useThousandSeparator", self.use_thousand_separator);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(Currency {
            uuid: attrs.get("uuid")?,
            symbol: attrs.get("symbol")?,
            description: attrs.string("description"),
            format_symbol: attrs.string("formatSymbol"),
            format_symbol_position: attrs.get_or("formatSymbolPosition", 0)?,
            show_format_symbol: attrs.get_or("showFormatSymbol", false)?,
            def: attrs.get_or("def", false)?,
            rate: attrs.get_or("rate", Decimal::ONE)?,
            direction: attrs.get_or("direction", 0)?,
            use_thousand_separator: attrs.get_or("useThousandSeparator", false)?,
            created,
            modified,
        })
    }
}

impl XmlRecord for ExchangeSecurity {
    const TAG: &'static str = "ExchangeSecurity";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("secId", &self.sec_id)
            .with("name", &self.name)
            .with("shortName", &self.short_name)
            .with("isin", &self.isin)
            .with("regNumber", &self.reg_number)
            .with("faceValue", self.face_value)
            .with_opt("issueDate", self.issue_date)
            .with_opt("matDate", self.mat_date)
            .with_opt("daysToRedemption", self.days_to_redemption)
            .with("group", &self.group)
            .with("groupName", &self.group_name)
            .with("type", &self.security_type)
            .with("typeName", &self.type_name)
            .with("marketValue", self.market_value)
            .with_opt("couponValue", self.coupon_value)
            .with_opt("couponPercent", self.coupon_percent)
            .with_opt("couponDate", self.coupon_date)
            .with_opt("couponFrequency", self.coupon_frequency)
            .with_opt("accruedInterest", self.accrued_interest)
            .with_opt("couponPeriod", self.coupon_period);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(ExchangeSecurity {
            uuid: attrs.get("uuid")?,
            sec_id: attrs.get("secId")?,
            name: attrs.string("name"),
            short_name: attrs.string("shortName"),
            isin: attrs.string("isin"),
            reg_number: attrs.string("regNumber"),
            face_value: attrs.get_or("faceValue", Decimal::ZERO)?,
            issue_date: attrs.get_opt("issueDate")?,
            mat_date: attrs.get_opt("matDate")?,
            days_to_redemption: attrs.get_opt("daysToRedemption")?,
            group: attrs.string("group"),
            group_name: attrs.string("groupName"),
            security_type: attrs.string("type"),
            type_name: attrs.string("typeName"),
            market_value: attrs.get_or("marketValue", Decimal::ZERO)?,
            coupon_value: attrs.get_opt("couponValue")?,
            coupon_percent: attrs.get_opt("couponPercent")?,
            coupon_date: attrs.get_opt("couponDate")?,
            coupon_frequency: attrs.get_opt("couponFrequency")?,
            accrued_interest: attrs.get_opt("accruedInterest")?,
            coupon_period: attrs.get_opt("couponPeriod")?,
            created,
            modified,
        })
    }
}

impl XmlRecord for Account {
    const TAG: &'static str = "Account";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("name", &self.name)
            .with("comment", &self.comment)
            .with("accountNumber", &self.account_number)
            .with("openingBalance", self.opening_balance)
            .with("accountLimit", self.account_limit)
            .with("currencyRate", self.currency_rate)
            .with("type", self.account_type)
            .with("categoryUuid", self.category_uuid)
            .with_opt("currencyUuid", self.currency_uuid)
            .with_opt("securityUuid", self.security_uuid)
            .with("enabled", self.enabled)
            .with("interest", self.interest)
            .with_opt("closingDate", self.closing_date)
            .with_opt("iconUuid", self.icon_uuid)
            .with("cardType", self.card_type)
            .with("cardNumber", &self.card_number)
            .with("total", self.total)
            .with("totalWaiting", self.total_waiting);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(Account {
            uuid: attrs.get("uuid")?,
            name: attrs.get("name")?,
            comment: attrs.string("comment"),
            account_number: attrs.string("accountNumber"),
            opening_balance: attrs.get_or("openingBalance", Decimal::ZERO)?,
            account_limit: attrs.get_or("accountLimit", Decimal::ZERO)?,
            currency_rate: attrs.get_or("currencyRate", Decimal::ONE)?,
            account_type: attrs.get::<CategoryType>("type")?,
            category_uuid: attrs.get("categoryUuid")?,
            currency_uuid: attrs.get_opt("currencyUuid")?,
            security_uuid: attrs.get_opt("securityUuid")?,
            enabled: attrs.get_or("enabled", true)?,
            interest: attrs.get_or("interest", Decimal::ZERO)?,
            closing_date: attrs.get_opt("closingDate")?,
            icon_uuid: attrs.get_opt("iconUuid")?,
            card_type: attrs.get_or("cardType", CardType::NoCard)?,
            card_number: attrs.string("cardNumber"),
            total: attrs.get_or("total", Decimal::ZERO)?,
            total_waiting: attrs.get_or("totalWaiting", Decimal::ZERO)?,
            created,
            modified,
        })
    }
}

impl XmlRecord for Card {
    const TAG: &'static str = "Card";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("accountUuid", self.account_uuid)
            .with("type", self.card_type)
            .with("number", &self.number)
            .with_opt("expiration", self.expiration)
            .with("comment", &self.comment)
            .with("enabled", self.enabled);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(Card {
            uuid: attrs.get("uuid")?,
            account_uuid: attrs.get("accountUuid")?,
            card_type: attrs.get_or("type", CardType::NoCard)?,
            number: attrs.get("number")?,
            expiration: attrs.get_opt("expiration")?,
            comment: attrs.string("comment"),
            enabled: attrs.get_or("enabled", true)?,
            created,
            modified,
        })
    }
}

impl XmlRecord for Contact {
    const TAG: &'static str = "Contact";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("name", &self.name)
            .with("type", self.contact_type)
            .with("phone", &self.phone)
            .with("mobile", &self.mobile)
            .with("email", &self.email)
            .with("web", &self.web)
            .with("comment", &self.comment)
            .with("street", &self.street)
            .with("city", &self.city)
            .with("country", &self.country)
            .with("zip", &self.zip)
            .with_opt("iconUuid", self.icon_uuid);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(Contact {
            uuid: attrs.get("uuid")?,
            name: attrs.get("name")?,
            contact_type: attrs.get_or("type", ContactType::Personal)?,
            phone: attrs.string("phone"),
            mobile: attrs.string("mobile"),
            email: attrs.string("email"),
            web: attrs.string("web"),
            comment: attrs.string("comment"),
            street: attrs.string("street"),
            city: attrs.string("city"),
            country: attrs.string("country"),
            zip: attrs.string("zip"),
            icon_uuid: attrs.get_opt("iconUuid")?,
            created,
            modified,
        })
    }
}

impl XmlRecord for Transaction {
    const TAG: &'static str = "Transaction";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("amount", self.amount)
            .with("creditAmount", self.credit_amount)
            .with("transactionDate", self.transaction_date)
            .with("type", self.transaction_type)
            .with("comment", &self.comment)
            .with("checked", self.checked)
            .with("accountDebitedUuid", self.account_debited_uuid)
            .with("accountCreditedUuid", self.account_credited_uuid)
            .with("accountDebitedType", self.account_debited_type)
            .with("accountCreditedType", self.account_credited_type)
            .with("accountDebitedCategoryUuid", self.account_debited_category_uuid)
            .with("accountCreditedCategoryUuid", self.account_credited_category_uuid)
            .with_opt("contactUuid", self.contact_uuid)
            .with("invoiceNumber", &self.invoice_number)
            .with_opt("parentUuid", self.parent_uuid)
            .with("detailed", self.detailed)
            .with("statementDate", self.statement_date)
            .with_opt("cardUuid", self.card_uuid);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        let amount: Decimal = attrs.get("amount")?;
        let transaction_date = attrs.get("transactionDate")?;
        Ok(Transaction {
            uuid: attrs.get("uuid")?,
            amount,
            credit_amount: attrs.get_or("creditAmount", amount)?,
            transaction_date,
            transaction_type: attrs.get_or("type", TransactionType::Undefined)?,
            comment: attrs.string("comment"),
            checked: attrs.get_or("checked", false)?,
            account_debited_uuid: attrs.get("accountDebitedUuid")?,
            account_credited_uuid: attrs.get("accountCreditedUuid")?,
            account_debited_type: attrs.get::<CategoryType>("accountDebitedType")?,
            account_credited_type: attrs.get::<CategoryType>("accountCreditedType")?,
            account_debited_category_uuid: attrs.get("accountDebitedCategoryUuid")?,
            account_credited_category_uuid: attrs.get("accountCreditedCategoryUuid")?,
            contact_uuid: attrs.get_opt("contactUuid")?,
            invoice_number: attrs.string("invoiceNumber"),
            parent_uuid: attrs.get_opt("parentUuid")?,
            detailed: attrs.get_or("detailed", false)?,
            statement_date: attrs.get_or("statementDate", transaction_date)?,
            card_uuid: attrs.get_opt("cardUuid")?,
            created,
            modified,
        })
    }
}

impl XmlRecord for MoneyDocument {
    const TAG: &'static str = "Document";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("ownerUuid", self.owner_uuid)
            .with("contactUuid", self.contact_uuid)
            .with("type", self.document_type)
            .with("fileName", &self.file_name)
            .with("date", self.date)
            .with("size", self.size)
            .with("compressed", self.compressed)
            .with("mimeType", &self.mime_type)
            .with("description", &self.description);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        let contact_uuid: Uuid = attrs.get("contactUuid")?;
        Ok(MoneyDocument {
            uuid: attrs.get("uuid")?,
            owner_uuid: attrs.get_or("ownerUuid", contact_uuid)?,
            contact_uuid,
            document_type: attrs.get_or("type", DocumentType::Other)?,
            file_name: attrs.get("fileName")?,
            date: attrs.get("date")?,
            size: attrs.get_or("size", 0)?,
            compressed: attrs.get_or("compressed", false)?,
            mime_type: attrs.string("mimeType"),
            description: attrs.string("description"),
            created,
            modified,
        })
    }
}

impl XmlRecord for PeriodicPayment {
    const TAG: &'static str = "PeriodicPayment";

    fn to_attributes(&self) -> AttributeList {
        let list = AttributeList::new()
            .with("uuid", self.uuid)
            .with("name", &self.name)
            .with("paymentType", self.payment_type)
            .with("recurrenceType", self.recurrence_type)
            .with("amount", self.amount)
            .with("dayOfMonth", self.day_of_month)
            .with("month", self.month)
            .with("accountDebitedUuid", self.account_debited_uuid)
            .with("accountCreditedUuid", self.account_credited_uuid)
            .with("contactUuid", self.contact_uuid)
            .with("comment", &self.comment);
        timestamps(list, self.created, self.modified)
    }

    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let (created, modified) = read_timestamps(attrs)?;
        Ok(PeriodicPayment {
            uuid: attrs.get("uuid")?,
            name: attrs.get("name")?,
            payment_type: attrs.get_or("paymentType", PeriodicPaymentType::ManualPayment)?,
            recurrence_type: attrs.get_or("recurrenceType", RecurrenceType::Monthly)?,
            amount: attrs.get_or("amount", Decimal::ZERO)?,
            day_of_month: attrs.get("dayOfMonth")?,
            month: attrs.get_or("month", 1)?,
            account_debited_uuid: attrs.get("accountDebitedUuid")?,
            account_credited_uuid: attrs.get("accountCreditedUuid")?,
            contact_uuid: attrs.get("contactUuid")?,
            comment: attrs.string("comment"),
            created,
            modified,
        })
    }
}
