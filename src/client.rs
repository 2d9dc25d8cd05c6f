use crate::error::{ApiError, Fin360Error};
use crate::models::{
    ApiResponse, AuthResult, Credentials, STATEMENT_FIELD, StatementUpload, TransactionsResult,
};
use crate::transport::{
    FilePart, HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport,
};
use log::{debug, info};
use reqwest::Url;
use std::time::Duration;

const BASE_URL: &str = "https://www.fin360.in";
const LOGIN_PATH: &str = "/bank-auth/api/v1/login";
const UPLOAD_STATEMENT_PATH: &str = "/bank-connect/api/v1/uploadStatement";
const TRANSACTIONS_WITH_DETAILS_SEGMENTS: [&str; 4] =
    ["bank-account", "api", "v1", "transactionsWithDetails"];
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Token from an earlier login; `None` until `authenticate` succeeds.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for the Fin360 statement API.
///
/// `authenticate` takes `&mut self` since it replaces the stored token; share
/// a client across tasks behind a lock if logins can race other calls.
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    access_token: Option<String>,
    transport: T,
    base_url: String,
}

impl Client<ReqwestTransport> {
    /// Create a new client with the default base URL and timeout.
    pub fn new(access_token: Option<String>) -> Result<Self, Fin360Error> {
        Self::with_config(ClientConfig {
            access_token,
            ..ClientConfig::default()
        })
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, Fin360Error> {
        let transport = ReqwestTransport::new(config.timeout)?;
        info!("Initialized Fin360 API client with default base URL");
        Ok(Client::with_transport(transport, config.access_token))
    }
}

impl<T: Transport> Client<T> {
    /// Create a client on top of a custom transport.
    pub fn with_transport(transport: T, access_token: Option<String>) -> Self {
        Self {
            access_token,
            transport,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the base URL (useful for tests or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Updated Fin360 API base URL to {}", self.base_url);
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Log in and keep the returned access token for later calls.
    pub async fn authenticate(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<AuthResult, Fin360Error> {
        let credentials = Credentials::new(email, password);
        debug!("Authenticating {}", credentials.email);
        let request = HttpRequest {
            method: Method::Post,
            url: self.url(LOGIN_PATH),
            query: Vec::new(),
            body: RequestBody::Form(credentials.form_fields()),
        };
        let response = self.send(request).await?;
        let body = ApiResponse::from_body(&response.body)?;
        let token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(Fin360Error::InvalidResponse)?;
        self.access_token = Some(token.to_string());
        info!("Authenticated {}", credentials.email);
        Ok(body)
    }

    /// Upload a statement file for parsing.
    ///
    /// Bank, account type and extra field keys are checked locally first; an
    /// invalid value fails without touching the network.
    pub async fn upload_statement(&self, statement: &StatementUpload) -> Result<(), Fin360Error> {
        statement.validate()?;
        let token = self.token()?;

        let bytes = tokio::fs::read(&statement.file)
            .await
            .map_err(|source| Fin360Error::Io {
                path: statement.file.clone(),
                source,
            })?;
        let file_name = statement
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| STATEMENT_FIELD.to_string());
        debug!(
            "Uploading {} ({} bytes) for bank={} accountType={}",
            file_name,
            bytes.len(),
            statement.bank,
            statement.account_type
        );

        let request = HttpRequest {
            method: Method::Post,
            url: self.url(UPLOAD_STATEMENT_PATH),
            query: token_query(token),
            body: RequestBody::Multipart {
                fields: statement.form_fields(),
                file: FilePart {
                    field: STATEMENT_FIELD.to_string(),
                    file_name,
                    bytes,
                },
            },
        };
        self.send(request).await?;
        info!("Uploaded statement {}", statement.file.display());
        Ok(())
    }

    /// Fetch bank account details and parsed transactions of an uploaded
    /// statement. The body is returned unchanged.
    pub async fn get_transactions_with_details(
        &self,
        account_id: &str,
    ) -> Result<TransactionsResult, Fin360Error> {
        let token = self.token()?;
        let mut url = Url::parse(&self.base_url)
            .map_err(|_| Fin360Error::InvalidBaseUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| Fin360Error::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(TRANSACTIONS_WITH_DETAILS_SEGMENTS)
            .push(&format!("{account_id}.json"));
        debug!("Fetching transactions with details for account {}", account_id);
        let request = HttpRequest {
            method: Method::Get,
            url: url.to_string(),
            query: token_query(token),
            body: RequestBody::Empty,
        };
        let response = self.send(request).await?;
        ApiResponse::from_body(&response.body)
    }

    fn token(&self) -> Result<&str, Fin360Error> {
        self.access_token
            .as_deref()
            .ok_or(Fin360Error::MissingAccessToken)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Fin360Error> {
        let method = request.method;
        let redacted = if request.query.is_empty() { "" } else { "?access_token=<token>" };
        debug!("{:?} request to {}{}", method, request.url, redacted);
        let response = self.transport.execute(request).await?;
        handle_status(response.status)?;
        Ok(response)
    }
}

fn token_query(token: &str) -> Vec<(String, String)> {
    vec![("access_token".to_string(), token.to_string())]
}

fn handle_status(status: u16) -> Result<(), Fin360Error> {
    if status == 200 {
        return Ok(());
    }
    Err(Fin360Error::Api(ApiError::from_status(status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::io::Write;
    use std::sync::Mutex;

    /// Replays one canned response and records every request it sees.
    struct FakeTransport {
        status: u16,
        body: String,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn new(status: u16, body: Value) -> Self {
            Self::raw(status, body.to_string())
        }

        fn raw(status: u16, body: impl Into<String>) -> Self {
            Self {
                status,
                body: body.into(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Fin360Error> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn client(transport: FakeTransport, token: Option<&str>) -> Client<FakeTransport> {
        Client::with_transport(transport, token.map(str::to_string))
    }

    fn statement_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 statement").unwrap();
        file
    }

    fn api_error(err: Fin360Error) -> ApiError {
        match err {
            Fin360Error::Api(e) => e,
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn authenticate_stores_token_and_returns_body() {
        let body = json!({ "access_token": "T", "token_type": "bearer", "expires_in": 3600 });
        let mut client = client(FakeTransport::new(200, body.clone()), None);

        let result = client.authenticate("user@example.com", "pw").await.unwrap();

        assert_eq!(client.access_token(), Some("T"));
        assert_eq!(result.as_value(), &body);
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "https://www.fin360.in/bank-auth/api/v1/login");
        assert!(requests[0].query.is_empty());
        assert_eq!(
            requests[0].body,
            RequestBody::Form(vec![
                ("emailAddress".to_string(), "user@example.com".to_string()),
                ("password".to_string(), "pw".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn authenticate_maps_401() {
        let mut client = client(FakeTransport::raw(401, "denied"), Some("old"));

        let err = api_error(client.authenticate("u", "p").await.unwrap_err());

        assert_eq!(err.status, 401);
        assert_eq!(err.description, "Invalid Access Token");
        assert_eq!(client.access_token(), Some("old"));
    }

    #[tokio::test]
    async fn authenticate_without_token_in_body_is_invalid() {
        let mut client = client(FakeTransport::new(200, json!({ "ok": true })), None);

        let err = client.authenticate("u", "p").await.unwrap_err();

        assert!(matches!(err, Fin360Error::InvalidResponse));
        assert_eq!(client.access_token(), None);
    }

    #[tokio::test]
    async fn authenticated_token_is_used_by_later_calls() {
        let body = json!({ "access_token": "fresh" });
        let mut client = client(FakeTransport::new(200, body), Some("stale"));

        client.authenticate("u", "p").await.unwrap();
        client.get_transactions_with_details("acct").await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(
            requests[1].query,
            vec![("access_token".to_string(), "fresh".to_string())]
        );
    }

    #[tokio::test]
    async fn upload_accepts_lowercase_bank_and_account_type() {
        let file = statement_file();
        let client = client(FakeTransport::raw(200, ""), Some("tok"));
        let statement = StatementUpload::new("icici", "saving", file.path())
            .with_field("password", "pdfpass");

        client.upload_statement(&statement).await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url,
            "https://www.fin360.in/bank-connect/api/v1/uploadStatement"
        );
        assert_eq!(
            request.query,
            vec![("access_token".to_string(), "tok".to_string())]
        );
        match &request.body {
            RequestBody::Multipart { fields, file: part } => {
                assert_eq!(
                    fields,
                    &vec![
                        ("bank".to_string(), "icici".to_string()),
                        ("accountType".to_string(), "saving".to_string()),
                        ("password".to_string(), "pdfpass".to_string()),
                    ]
                );
                assert_eq!(part.field, "bankStmt");
                assert_eq!(part.bytes, b"%PDF-1.4 statement");
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_rejects_unknown_bank_without_request() {
        let file = statement_file();
        let client = client(FakeTransport::raw(200, ""), Some("tok"));
        let statement = StatementUpload::new("UNKNOWN_BANK", "SAVING", file.path());

        let err = client.upload_statement(&statement).await.unwrap_err();

        match err {
            Fin360Error::Validation(ValidationError { field, value }) => {
                assert_eq!(field, "bank");
                assert_eq!(value, "UNKNOWN_BANK");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_unknown_account_type_without_request() {
        let file = statement_file();
        let client = client(FakeTransport::raw(200, ""), Some("tok"));
        let statement = StatementUpload::new("HDFC", "LOAN", file.path());

        let err = client.upload_statement(&statement).await.unwrap_err();

        assert!(matches!(
            err,
            Fin360Error::Validation(ValidationError { field: "accountType", .. })
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_extra_fields_shadowing_validated_ones() {
        let file = statement_file();
        let client = client(FakeTransport::raw(200, ""), Some("tok"));
        let statement = StatementUpload::new("ICICI", "SAVING", file.path())
            .with_field("bank", "UNKNOWN_BANK")
            .with_field("accountType", "LOAN")
            .with_field("bankStmt", "not-a-file");

        let err = client.upload_statement(&statement).await.unwrap_err();

        assert!(matches!(err, Fin360Error::Validation(_)));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_padded_codes_without_request() {
        let file = statement_file();
        let client = client(FakeTransport::raw(200, ""), Some("tok"));
        let statement = StatementUpload::new(" icici\n", "\tsaving ", file.path());

        let err = client.upload_statement(&statement).await.unwrap_err();

        assert!(matches!(
            err,
            Fin360Error::Validation(ValidationError { field: "bank", .. })
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn upload_reports_missing_file() {
        let client = client(FakeTransport::raw(200, ""), Some("tok"));
        let statement = StatementUpload::new("SBI", "CURRENT", "/nonexistent/statement.pdf");

        let err = client.upload_statement(&statement).await.unwrap_err();

        assert!(matches!(err, Fin360Error::Io { .. }));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn upload_maps_server_error() {
        let file = statement_file();
        let client = client(FakeTransport::raw(500, "boom"), Some("tok"));
        let statement = StatementUpload::new("AXIS", "CREDIT_CARD", file.path());

        let err = api_error(client.upload_statement(&statement).await.unwrap_err());

        assert_eq!(err.status, 500);
        assert_eq!(err.description, "Internal Server Error");
    }

    #[tokio::test]
    async fn transactions_returns_body_unchanged() {
        let body = json!({
            "bank_account": {
                "accountHolder": "A",
                "bank": { "enumType": "", "name": "B" },
                "bankTransactionList": []
            },
            "transactions": [
                { "amount": 500, "balanceAfterTransaction": 1000.5, "remark": null }
            ]
        });
        let client = client(FakeTransport::new(200, body.clone()), Some("tok"));

        let result = client.get_transactions_with_details("acct123").await.unwrap();

        assert_eq!(result.into_value(), body);
        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(
            requests[0].url,
            "https://www.fin360.in/bank-account/api/v1/transactionsWithDetails/acct123.json"
        );
        assert_eq!(
            requests[0].query,
            vec![("access_token".to_string(), "tok".to_string())]
        );
        assert_eq!(requests[0].body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn transactions_maps_404() {
        let client = client(FakeTransport::raw(404, ""), Some("tok"));

        let err = api_error(client.get_transactions_with_details("missing").await.unwrap_err());

        assert_eq!(err.status, 404);
        assert_eq!(err.description, "Not Found");
    }

    #[tokio::test]
    async fn authenticated_calls_require_token() {
        let client = client(FakeTransport::raw(200, "{}"), None);

        let err = client.get_transactions_with_details("acct").await.unwrap_err();

        assert!(matches!(err, Fin360Error::MissingAccessToken));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn transactions_encodes_account_id() {
        let client = client(FakeTransport::new(200, json!({})), Some("tok"));

        client.get_transactions_with_details("a/b?x=1").await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(
            requests[0].url,
            "https://www.fin360.in/bank-account/api/v1/transactionsWithDetails/a%2Fb%3Fx=1.json"
        );
        assert_eq!(
            requests[0].query,
            vec![("access_token".to_string(), "tok".to_string())]
        );
    }

    #[tokio::test]
    async fn custom_transport_failures_surface_as_transport_errors() {
        struct Unreachable;

        #[async_trait]
        impl Transport for Unreachable {
            async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, Fin360Error> {
                let refused =
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
                Err(Fin360Error::Transport(Box::new(refused)))
            }
        }

        let client = Client::with_transport(Unreachable, Some("tok".to_string()));

        let err = client.get_transactions_with_details("acct").await.unwrap_err();

        assert!(matches!(err, Fin360Error::Transport(_)));
    }

    #[tokio::test]
    async fn base_url_override_is_used() {
        let client = client(FakeTransport::new(200, json!({})), Some("tok"))
            .with_base_url("http://localhost:8080/");

        client.get_transactions_with_details("a").await.unwrap();

        assert_eq!(
            client.transport().requests()[0].url,
            "http://localhost:8080/bank-account/api/v1/transactionsWithDetails/a.json"
        );
    }

    #[test]
    fn default_config_has_no_token() {
        let config = ClientConfig::default();
        assert!(config.access_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
