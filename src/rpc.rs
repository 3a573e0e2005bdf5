use anyhow::Context;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::backend::ChainRpc;
use crate::error::{QueryError, QueryResult};
use crate::hippius::REQUEST_TIMEOUT;
use crate::models::{BucketRecord, FileRecord, byte_count};

pub const GET_USER_FILES: &str = "get_user_files";
pub const CALCULATE_TOTAL_FILE_SIZE: &str = "calculate_total_file_size";
pub const GET_USER_BUCKETS: &str = "get_user_buckets";
pub const GET_FREE_CREDITS: &str = "get_free_credits_rpc";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a [&'a str],
    pub id: u32,
}

impl<'a> RpcRequest<'a> {
    pub const fn new(
        method: &'a str,
        params: &'a [&'a str],
    ) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        }
    }
}

trait SendAndHandle {
    async fn send_and_handle(self) -> QueryResult<(StatusCode, String)>;
}

impl SendAndHandle for RequestBuilder {
    async fn send_and_handle(self) -> QueryResult<(StatusCode, String)> {
        let resp = self.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        Ok((status, text))
    }
}

fn describe_rpc_error(error: &Value) -> String {
    match (
        error.get("message").and_then(Value::as_str),
        error.get("code"),
    ) {
        (Some(message), Some(code)) => format!("{message} (code {code})"),
        (Some(message), None) => message.to_owned(),
        _ => error.to_string(),
    }
}

/// Turn a raw HTTP response into the JSON-RPC `result` member.
///
/// An `error` member wins over `result`; a body that is not a JSON object is a decode failure.
pub fn decode_response(
    status: StatusCode,
    body: &str,
) -> QueryResult<Value> {
    if !status.is_success() {
        return Err(QueryError::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_owned(),
        });
    }

    let Ok(Value::Object(mut data)) = serde_json::from_str::<Value>(body) else {
        return Err(QueryError::Decode);
    };

    if let Some(error) = data.remove("error") {
        return Err(QueryError::Rpc(describe_rpc_error(&error)));
    }

    data.remove("result").ok_or(QueryError::MissingResult)
}

/// `null` counts as an empty listing.
pub fn decode_list<T: DeserializeOwned>(
    method: &str,
    value: Value,
) -> QueryResult<Vec<T>> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    serde_json::from_value(value).map_err(|err| QueryError::invalid_result(method, err))
}

pub fn parse_byte_count(
    method: &str,
    value: &Value,
) -> QueryResult<u64> {
    byte_count(value)
        .ok_or_else(|| QueryError::invalid_result(method, format!("{value} is not a byte count")))
}

/// Falsy results (`0`, `""`, `false`, `[]`, `{}`) read as an empty balance.
pub fn parse_credits(
    method: &str,
    value: &Value,
) -> QueryResult<f64> {
    let credits = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(false) => Some(0.0),
        Value::Array(items) if items.is_empty() => Some(0.0),
        Value::Object(fields) if fields.is_empty() => Some(0.0),
        _ => None,
    };

    credits.ok_or_else(|| {
        QueryError::invalid_result(method, format!("{value} is not a credit balance"))
    })
}

/// JSON-RPC 2.0 over HTTP POST against the Hippius API.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    url: Url,
}

impl RpcClient {
    pub fn try_new(url: Url) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .with_context(|| "Could not set up the HTTP client")?;

        Ok(Self { client, url })
    }

    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn call(
        &self,
        method: &str,
        params: &[&str],
    ) -> QueryResult<Value> {
        let payload = RpcRequest::new(method, params);

        let (status, body) = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send_and_handle()
            .await?;

        debug!(%status, bytes = body.len(), "received JSON-RPC response");

        decode_response(status, &body)
    }
}

impl ChainRpc for RpcClient {
    async fn list_user_files(
        &self,
        account: &str,
    ) -> QueryResult<Vec<FileRecord>> {
        let result = self.call(GET_USER_FILES, &[account]).await?;
        decode_list(GET_USER_FILES, result)
    }

    async fn total_storage(
        &self,
        account: &str,
    ) -> QueryResult<u64> {
        let result = self.call(CALCULATE_TOTAL_FILE_SIZE, &[account]).await?;
        parse_byte_count(CALCULATE_TOTAL_FILE_SIZE, &result)
    }

    async fn list_user_buckets(
        &self,
        account: &str,
    ) -> QueryResult<Vec<BucketRecord>> {
        let result = self.call(GET_USER_BUCKETS, &[account]).await?;
        decode_list(GET_USER_BUCKETS, result)
    }

    async fn account_credits(
        &self,
        account: &str,
    ) -> QueryResult<f64> {
        let result = self.call(GET_FREE_CREDITS, &[account]).await?;
        parse_credits(GET_FREE_CREDITS, &result)
    }
}
