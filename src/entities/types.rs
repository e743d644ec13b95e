// Enumerations shared by the ledger entities.
// Every enum travels as its SCREAMING_SNAKE name in JSON, XML and SQL.

use crate::error::MoneyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = MoneyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(MoneyError::validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = MoneyError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }
    };
}

string_enum! {
    /// Classification shared by categories and accounts
    CategoryType {
        BanksAndCash => "BANKS_AND_CASH",
        Debts => "DEBTS",
        Portfolio => "PORTFOLIO",
        Assets => "ASSETS",
        Incomes => "INCOMES",
        Expenses => "EXPENSES",
        Startup => "STARTUP",
    }
}

string_enum! {
    TransactionType {
        CardPayment => "CARD_PAYMENT",
        CashPurchase => "CASH_PURCHASE",
        Cheque => "CHEQUE",
        Withdrawal => "WITHDRAWAL",
        Cachier => "CACHIER",
        Deposit => "DEPOSIT",
        Transfer => "TRANSFER",
        SbpTransfer => "SBP_TRANSFER",
        SbpPayment => "SBP_PAYMENT",
        Interest => "INTEREST",
        Dividend => "DIVIDEND",
        DirectBilling => "DIRECT_BILLING",
        Charge => "CHARGE",
        Fee => "FEE",
        Income => "INCOME",
        Purchase => "PURCHASE",
        Sale => "SALE",
        Refund => "REFUND",
        Undefined => "UNDEFINED",
    }
}

string_enum! {
    ContactType {
        Personal => "PERSONAL",
        Client => "CLIENT",
        Supplier => "SUPPLIER",
        Employee => "EMPLOYEE",
        Employer => "EMPLOYER",
        Service => "SERVICE",
    }
}

string_enum! {
    /// Payment system of a card attached to an account
    CardType {
        NoCard => "NONE",
        Visa => "VISA",
        Mastercard => "MASTERCARD",
        Mir => "MIR",
        Amex => "AMEX",
    }
}

string_enum! {
    DocumentType {
        Contract => "CONTRACT",
        Statement => "STATEMENT",
        Invoice => "INVOICE",
        Bill => "BILL",
        Receipt => "RECEIPT",
        Other => "OTHER",
    }
}

string_enum! {
    PeriodicPaymentType {
        ManualPayment => "MANUAL_PAYMENT",
        AutoPayment => "AUTO_PAYMENT",
    }
}

string_enum! {
    RecurrenceType {
        Monthly => "MONTHLY",
        Yearly => "YEARLY",
    }
}

impl Default for TransactionType {
    fn default() -> Self {
        TransactionType::Undefined
    }
}

impl Default for CardType {
    fn default() -> Self {
        CardType::NoCard
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Other
    }
}

impl Default for ContactType {
    fn default() -> Self {
        ContactType::Personal
    }
}

impl Default for PeriodicPaymentType {
    fn default() -> Self {
        PeriodicPaymentType::ManualPayment
    }
}

impl Default for RecurrenceType {
    fn default() -> Self {
        RecurrenceType::Monthly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_text_round_trip() {
        for t in CategoryType::ALL {
            assert_eq!(t.as_str().parse::<CategoryType>().unwrap(), *t);
        }
        for t in TransactionType::ALL {
            assert_eq!(t.as_str().parse::<TransactionType>().unwrap(), *t);
        }
    }

    #[test]
    fn test_card_none_text() {
        assert_eq!(CardType::default().as_str(), "NONE");
        assert_eq!("NONE".parse::<CardType>().unwrap(), CardType::NoCard);
    }

    #[test]
    fn test_unknown_value_rejected() {
        let err = "GAMBLING".parse::<CategoryType>().unwrap_err();
        assert!(err.to_string().contains("CategoryType"));
    }

    #[test]
    fn test_serde_uses_text() {
        let json = serde_json::to_string(&TransactionType::SbpTransfer).unwrap();
        assert_eq!(json, "\"SBP_TRANSFER\"");
        let back: TransactionType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TransactionType::SbpTransfer);
    }
}
