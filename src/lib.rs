//! Rust client for the Fin360 bank statement API.
//! Logs in, uploads statement files and fetches the parsed transactions,
//! with optional helpers for turning the JSON into typed models.

pub mod banks;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use banks::{AccountType, SUPPORTED_ACCOUNT_TYPES, SUPPORTED_BANKS, is_supported_bank};
pub use client::{Client, ClientConfig};
pub use error::{ApiError, Fin360Error, ValidationError, describe_status};
pub use models::{
    ApiResponse, AuthResult, BankAccount, Credentials, StatementUpload, Transaction,
    TransactionsResult, TransactionsWithDetails, parse_transactions_with_details,
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
