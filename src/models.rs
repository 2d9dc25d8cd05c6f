use crate::banks::{AccountType, validate_bank};
use crate::error::{Fin360Error, ValidationError};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Multipart part carrying the statement file.
pub(crate) const STATEMENT_FIELD: &str = "bankStmt";
const RESERVED_FIELDS: &[&str] = &["bank", "accountType", STATEMENT_FIELD];

pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("emailAddress".to_string(), self.email.clone()),
            ("password".to_string(), self.password.clone()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A statement file plus the metadata sent alongside it.
///
/// `bank` and `account_type` are validated case-insensitively before upload
/// but are sent exactly as given. `fields` are passed through verbatim and
/// may not reuse the `bank`, `accountType` or `bankStmt` keys.
#[derive(Debug, Clone)]
pub struct StatementUpload {
    pub bank: String,
    pub account_type: String,
    pub file: PathBuf,
    pub fields: BTreeMap<String, String>,
}

impl StatementUpload {
    pub fn new(
        bank: impl Into<String>,
        account_type: impl Into<String>,
        file: impl AsRef<Path>,
    ) -> Self {
        Self {
            bank: bank.into(),
            account_type: account_type.into(),
            file: file.as_ref().to_path_buf(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach an extra form field, e.g. a PDF password.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Local checks run before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_bank(&self.bank)?;
        self.account_type.parse::<AccountType>()?;
        for (key, value) in &self.fields {
            if let Some(reserved) = RESERVED_FIELDS.iter().copied().find(|r| *r == key.as_str()) {
                return Err(ValidationError {
                    field: reserved,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn form_fields(&self) -> Vec<(String, String)> {
        let mut out = vec![
            ("bank".to_string(), self.bank.clone()),
            ("accountType".to_string(), self.account_type.clone()),
        ];
        out.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

/// Decoded JSON body, returned as the server sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse(Value);

impl ApiResponse {
    pub(crate) fn from_body(body: &str) -> Result<Self, Fin360Error> {
        serde_json::from_str(body)
            .map(Self)
            .map_err(|_| Fin360Error::InvalidResponse)
    }

    /// Look up a top-level key. Returns `None` for non-object bodies.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Deserialize the body into a typed model.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, Fin360Error> {
        T::deserialize(&self.0).map_err(|_| Fin360Error::InvalidResponse)
    }
}

pub type AuthResult = ApiResponse;
pub type TransactionsResult = ApiResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsWithDetails {
    pub bank_account: BankAccount,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankName {
    pub name: Option<String>,
    #[serde(rename = "enumType")]
    pub enum_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BankAccount {
    #[serde(rename = "accountHolder")]
    pub account_holder: Option<String>,
    #[serde(rename = "accountNo")]
    pub account_no: Option<String>,
    pub bank: Option<BankName>,
    #[serde(rename = "bankAccountUID")]
    pub bank_account_uid: Option<String>,
    #[serde(rename = "isValidBankStatement")]
    pub is_valid_bank_statement: Option<bool>,
    #[serde(rename = "openingBalance")]
    pub opening_balance: Option<Decimal>,
    #[serde(rename = "fromDate", default, deserialize_with = "deserialize_date_opt")]
    pub from_date: Option<NaiveDate>,
    #[serde(rename = "toDate", default, deserialize_with = "deserialize_date_opt")]
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub amount: Decimal,
    #[serde(rename = "balanceAfterTransaction")]
    pub balance_after_transaction: Option<Decimal>,
    pub category: Option<String>,
    #[serde(rename = "dateTime", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub description: Option<String>,
    pub remark: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(rename = "valueDate", default, deserialize_with = "deserialize_date_opt")]
    pub value_date: Option<NaiveDate>,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.transaction_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("CREDIT"))
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom("invalid date value"))
}

fn deserialize_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom("invalid date value")),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// Parse a `transactionsWithDetails` body into typed models.
pub fn parse_transactions_with_details(
    data: &ApiResponse,
) -> Result<TransactionsWithDetails, Fin360Error> {
    let parsed: TransactionsWithDetails = data.parse()?;
    debug!("Parsed {} transactions", parsed.transactions.len());
    Ok(parsed)
}
