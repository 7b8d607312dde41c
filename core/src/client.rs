//! Request builder, transport driver, and response parser for the results API.
//!
//! # Design
//! Every operation is split into a `build_*` method that validates its
//! arguments and produces an `HttpRequest`, and a `parse_*` method that
//! consumes an `HttpResponse`. The one-call operations (`create_results`,
//! `delete_result`, ...) run build, transport, and parse back to back.
//! Argument validation happens in `build_*`, so an invalid call never
//! reaches the transport.

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::transport::UreqTransport;
use crate::types::{
    create_results_request, delete_results_request, steps_request, update_results_request, Record,
};

pub const CREATE_RESULTS_ROUTE: &str = "nitestmonitor/v2/results";
pub const CREATE_STEPS_ROUTE: &str = "nitestmonitor/v2/steps";
pub const UPDATE_RESULTS_ROUTE: &str = "nitestmonitor/v2/update-results";
pub const UPDATE_STEPS_ROUTE: &str = "nitestmonitor/v2/update-steps";
pub const DELETE_RESULTS_ROUTE: &str = "nitestmonitor/v2/delete-results";
pub const DELETE_RESULT_ROUTE: &str = "nitestmonitor/v2/results";

const NO_CONTENT: u16 = 204;

/// Blocking client for the Test Monitor results and steps endpoints.
///
/// Holds the connection settings and a `Transport`. Configuration changes go
/// through `&mut self`, so they can never race a request on the same client.
#[derive(Debug, Clone)]
pub struct ResultsClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl ResultsClient<UreqTransport> {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_transport(ClientConfig::new(base_url, api_key), UreqTransport::new())
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::with_transport(ClientConfig::from_env()?, UreqTransport::new()))
    }
}

impl<T: Transport> ResultsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Point the client at another server and key. Takes effect on the next call.
    pub fn set_base_url_and_api_key(&mut self, server_url: &str, key: &str) {
        self.config.set_base_url_and_api_key(server_url, key);
    }

    // -----------------------------------------------------------------------
    // One-call operations
    // -----------------------------------------------------------------------

    /// Create results. The server generates ids for results that lack one.
    pub fn create_results(&self, results: &[Record]) -> Result<Value, ApiError> {
        let req = self.build_create_results(results)?;
        let resp = self.send(req)?;
        self.parse_json(resp)
    }

    /// Merge or replace values on existing results.
    pub fn update_results(&self, results: &[Record]) -> Result<Value, ApiError> {
        let req = self.build_update_results(results)?;
        let resp = self.send(req)?;
        self.parse_json(resp)
    }

    /// Create steps. Each step's result must already exist on the server.
    pub fn create_steps(&self, steps: &[Record]) -> Result<Value, ApiError> {
        let req = self.build_create_steps(steps)?;
        let resp = self.send(req)?;
        self.parse_json(resp)
    }

    pub fn update_steps(&self, steps: &[Record]) -> Result<Value, ApiError> {
        let req = self.build_update_steps(steps)?;
        let resp = self.send(req)?;
        self.parse_json(resp)
    }

    pub fn delete_result(&self, result_id: &str, delete_steps: bool) -> Result<(), ApiError> {
        let req = self.build_delete_result(result_id, delete_steps)?;
        let resp = self.send(req)?;
        self.parse_delete_result(resp)
    }

    /// Delete several results at once. Returns an empty object when the
    /// server answers 204, otherwise the decoded response body.
    pub fn delete_results(&self, result_ids: &[String], delete_steps: bool) -> Result<Value, ApiError> {
        let req = self.build_delete_results(result_ids, delete_steps)?;
        let resp = self.send(req)?;
        self.parse_delete_results(resp)
    }

    // -----------------------------------------------------------------------
    // Transport helpers
    // -----------------------------------------------------------------------

    /// POST `body` as JSON to `url` with the auth header attached.
    ///
    /// Fails with `ApiError::Http` on a 4xx/5xx status; any other response is
    /// returned as-is for the caller to interpret.
    pub fn raise_post_request<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, ApiError> {
        let req = self.post_request(url, body)?;
        self.send(req)
    }

    /// DELETE `url` with the auth header attached. Same status rules as
    /// `raise_post_request`.
    pub fn raise_delete_request(&self, url: &str) -> Result<HttpResponse, ApiError> {
        let req = self.delete_request(url);
        self.send(req)
    }

    fn send(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!("{} {}", req.method, req.url);
        let resp = self.transport.execute(req)?;
        check_status(&resp)?;
        Ok(resp)
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_create_results(&self, results: &[Record]) -> Result<HttpRequest, ApiError> {
        require_non_empty(results, "number of results to be created can not be empty")?;
        let url = self.config.url_for(CREATE_RESULTS_ROUTE);
        self.post_request(&url, &create_results_request(results))
    }

    pub fn build_update_results(&self, results: &[Record]) -> Result<HttpRequest, ApiError> {
        require_non_empty(results, "number of results to be updated can not be empty")?;
        let url = self.config.url_for(UPDATE_RESULTS_ROUTE);
        self.post_request(&url, &update_results_request(results, true))
    }

    pub fn build_create_steps(&self, steps: &[Record]) -> Result<HttpRequest, ApiError> {
        require_non_empty(steps, "number of steps to be created can not be empty")?;
        let url = self.config.url_for(CREATE_STEPS_ROUTE);
        self.post_request(&url, &steps_request(steps, true))
    }

    pub fn build_update_steps(&self, steps: &[Record]) -> Result<HttpRequest, ApiError> {
        require_non_empty(steps, "number of steps to be updated can not be empty")?;
        let url = self.config.url_for(UPDATE_STEPS_ROUTE);
        self.post_request(&url, &steps_request(steps, true))
    }

    /// The query carries no `=`, and the flag is written `True`/`False`
    /// (`?deleteStepsTrue`). The deployed server is addressed in exactly
    /// this form, so it is kept byte for byte.
    pub fn build_delete_result(&self, result_id: &str, delete_steps: bool) -> Result<HttpRequest, ApiError> {
        if result_id.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "missing required parameter 'result_id' for delete result".to_string(),
            ));
        }
        let url = format!(
            "{}/{result_id}?{}",
            self.config.url_for(DELETE_RESULT_ROUTE),
            delete_steps_query(delete_steps)
        );
        Ok(self.delete_request(&url))
    }

    pub fn build_delete_results(
        &self,
        result_ids: &[String],
        delete_steps: bool,
    ) -> Result<HttpRequest, ApiError> {
        require_non_empty(
            result_ids,
            "result_ids is required for delete results and cannot be empty",
        )?;
        let url = self.config.url_for(DELETE_RESULTS_ROUTE);
        self.post_request(&url, &delete_results_request(result_ids, delete_steps))
    }

    fn post_request<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = self.config.headers().to_vec();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.to_string(),
            headers,
            body: Some(body),
        })
    }

    fn delete_request(&self, url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: url.to_string(),
            headers: self.config.headers().to_vec(),
            body: None,
        }
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    /// Decode the body of a create/update response.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_delete_result(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)?;
        Ok(())
    }

    pub fn parse_delete_results(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        if response.status == NO_CONTENT {
            return Ok(Value::Object(Map::new()));
        }
        self.parse_json(response)
    }
}

fn require_non_empty<E>(items: &[E], message: &str) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::InvalidArgument(message.to_string()));
    }
    Ok(())
}

fn delete_steps_query(delete_steps: bool) -> &'static str {
    if delete_steps {
        "deleteStepsTrue"
    } else {
        "deleteStepsFalse"
    }
}

/// Map 4xx/5xx responses to `ApiError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if !response.is_error() {
        return Ok(());
    }
    warn!("request failed with HTTP {}", response.status);
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
