use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

/// Bank codes accepted by the statement upload endpoint.
pub const SUPPORTED_BANKS: &[&str] = &[
    "ABHYUDAYA",
    "ALLAHABAD",
    "AMEX",
    "ANDHRA",
    "AU",
    "AXIS",
    "BANDHAN",
    "BARCLAYS",
    "BASSEIN_CATHOLIC",
    "BHARAT",
    "BOB",
    "BOI",
    "BOM",
    "CANARA",
    "CATHOLIC_SYRIAN",
    "CBI",
    "CITI",
    "CITY_UNION",
    "COSMOS",
    "CORPORATION",
    "DBS",
    "DCB",
    "DENA",
    "DEUTSCHE",
    "DHANLAXMI",
    "EQUITAS",
    "FEDERAL",
    "HDFC",
    "HSBC",
    "ICICI",
    "IDBI",
    "IDFC",
    "INDIAN",
    "INDUSIND",
    "IOB",
    "JANATA_SAHAKARI",
    "JK",
    "KALUPUR",
    "KARNATAKA",
    "KARUR_VYSYA",
    "KOTAK",
    "LVB",
    "MAHANAGAR",
    "NKGSB",
    "OBC",
    "PMC",
    "PNB",
    "PSB",
    "RBL",
    "SARASWAT",
    "SBI",
    "SCB",
    "SIB",
    "SVC",
    "SYNDICATE",
    "TJSB",
    "TMB",
    "UCO",
    "UJJIVAN",
    "UNION",
    "UNITED",
    "VIJAYA",
    "YES",
];

/// Account types accepted by the statement upload endpoint, in wire form.
pub const SUPPORTED_ACCOUNT_TYPES: &[&str] = &["SAVING", "CURRENT", "CREDIT_CARD"];

/// Case-insensitive membership check against [`SUPPORTED_BANKS`].
pub fn is_supported_bank(code: &str) -> bool {
    SUPPORTED_BANKS
        .iter()
        .any(|bank| bank.eq_ignore_ascii_case(code))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Saving,
    Current,
    CreditCard,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Saving => "SAVING",
            AccountType::Current => "CURRENT",
            AccountType::CreditCard => "CREDIT_CARD",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            AccountType::Saving,
            AccountType::Current,
            AccountType::CreditCard,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| ValidationError {
            field: "accountType",
            value: s.to_string(),
        })
    }
}

/// Ensure `code` names a supported bank.
pub fn validate_bank(code: &str) -> Result<(), ValidationError> {
    if is_supported_bank(code) {
        Ok(())
    } else {
        Err(ValidationError {
            field: "bank",
            value: code.to_string(),
        })
    }
}
