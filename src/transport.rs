//! HTTP transport seam.
//!
//! The client describes each call as an [`HttpRequest`] and hands it to a
//! [`Transport`]. [`ReqwestTransport`] executes it over the network; tests
//! substitute a recording fake.

use crate::error::Fin360Error;
use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// File attached to a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request. Non-2xx statuses are returned as data, not errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Fin360Error>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, Fin360Error> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Fin360Error> {
        let builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
        };
        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart { fields, file } => {
                let part = Part::bytes(file.bytes).file_name(file.file_name);
                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k, v))
                    .part(file.field, part);
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        debug!("Received status {}", status);
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
