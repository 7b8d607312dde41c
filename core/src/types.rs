//! Request envelopes for the results API.
//!
//! # Design
//! Results and steps are opaque JSON objects whose schema belongs to the
//! server, so they are carried as `Record` maps and passed through untouched.
//! Each envelope borrows its payload list and adds the operation's flags;
//! field names are renamed to the camelCase the server expects.

use serde::Serialize;
use serde_json::{Map, Value};

/// An opaque result or step object.
pub type Record = Map<String, Value>;

/// Body of `POST nitestmonitor/v2/results`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateResultsRequest<'a> {
    pub results: &'a [Record],
}

/// Body of `POST nitestmonitor/v2/steps` and `nitestmonitor/v2/update-steps`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepsRequest<'a> {
    pub steps: &'a [Record],
    pub update_result_total_time: bool,
}

/// Body of `POST nitestmonitor/v2/update-results`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResultsRequest<'a> {
    pub results: &'a [Record],
    pub determine_status_from_steps: bool,
}

/// Body of `POST nitestmonitor/v2/delete-results`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResultsRequest<'a> {
    pub ids: &'a [String],
    pub delete_steps: bool,
}

pub fn create_results_request(results: &[Record]) -> CreateResultsRequest<'_> {
    CreateResultsRequest { results }
}

/// Shared by step creation and step update.
pub fn steps_request(steps: &[Record], update_result_total_time: bool) -> StepsRequest<'_> {
    StepsRequest {
        steps,
        update_result_total_time,
    }
}

/// `determine_status_from_steps` asks the server to derive each result's
/// status from its steps.
pub fn update_results_request(
    results: &[Record],
    determine_status_from_steps: bool,
) -> UpdateResultsRequest<'_> {
    UpdateResultsRequest {
        results,
        determine_status_from_steps,
    }
}

/// `delete_steps` controls whether the steps of each result are removed too.
pub fn delete_results_request(ids: &[String], delete_steps: bool) -> DeleteResultsRequest<'_> {
    DeleteResultsRequest { ids, delete_steps }
}
