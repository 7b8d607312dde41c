use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

const KEY: &str = "test-key";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("X-NI-API-KEY", KEY)
        .body(body.to_string())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<String> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("X-NI-API-KEY", KEY)
        .body(String::new())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_api_key_returns_401() {
    let resp = app(KEY)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/nitestmonitor/v2/results")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"results":[{}]}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let resp = app("other-key")
        .oneshot(json_request("/nitestmonitor/v2/results", r#"{"results":[{}]}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- create ---

#[tokio::test]
async fn create_results_assigns_missing_ids() {
    let resp = app(KEY)
        .oneshot(json_request(
            "/nitestmonitor/v2/results",
            r#"{"results":[{"programName":"A"},{"id":"given","programName":"B"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(results[1]["id"], "given");
}

#[tokio::test]
async fn create_steps_for_unknown_result_returns_400() {
    let resp = app(KEY)
        .oneshot(json_request(
            "/nitestmonitor/v2/steps",
            r#"{"steps":[{"resultId":"nope","name":"s"}],"updateResultTotalTime":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let resp = app(KEY)
        .oneshot(json_request("/nitestmonitor/v2/delete-results", r#"{"deleteSteps":true}"#))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- update ---

#[tokio::test]
async fn update_unknown_result_returns_404() {
    let resp = app(KEY)
        .oneshot(json_request(
            "/nitestmonitor/v2/update-results",
            r#"{"results":[{"id":"nope"}],"determineStatusFromSteps":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- delete ---

#[tokio::test]
async fn delete_unknown_result_returns_404() {
    let resp = app(KEY)
        .oneshot(delete_request("/nitestmonitor/v2/results/nope?deleteStepsTrue"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_results_with_unknown_ids_lists_failures() {
    let resp = app(KEY)
        .oneshot(json_request(
            "/nitestmonitor/v2/delete-results",
            r#"{"ids":["x","y"],"deleteSteps":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["failed"], serde_json::json!(["x", "y"]));
}

// --- full lifecycle ---

#[tokio::test]
async fn results_and_steps_lifecycle() {
    use tower::Service;

    let mut app = app(KEY).into_service();

    // create a result
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/nitestmonitor/v2/results",
            r#"{"results":[{"programName":"Battery","status":{"statusType":"RUNNING"}}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    let id = body["results"][0]["id"].as_str().unwrap().to_string();

    // add two steps, updating total time
    let steps = format!(
        r#"{{"steps":[
            {{"resultId":"{id}","stepId":"s1","totalTimeInSeconds":1.5}},
            {{"resultId":"{id}","stepId":"s2","totalTimeInSeconds":2.5}}
        ],"updateResultTotalTime":true}}"#
    );
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("/nitestmonitor/v2/steps", &steps))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["steps"].as_array().unwrap().len(), 2);

    // update a step
    let patch = format!(
        r#"{{"steps":[{{"resultId":"{id}","stepId":"s1","totalTimeInSeconds":3.5}}],"updateResultTotalTime":true}}"#
    );
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("/nitestmonitor/v2/update-steps", &patch))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["steps"][0]["totalTimeInSeconds"], 3.5);

    // update the result; merged fields keep the old ones and the recomputed time
    let patch = format!(
        r#"{{"results":[{{"id":"{id}","status":{{"statusType":"PASSED"}}}}],"determineStatusFromSteps":true}}"#
    );
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("/nitestmonitor/v2/update-results", &patch))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let result = &body["results"][0];
    assert_eq!(result["programName"], "Battery");
    assert_eq!(result["status"]["statusType"], "PASSED");
    assert_eq!(result["totalTimeInSeconds"], 6.0);

    // delete it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(delete_request(&format!(
            "/nitestmonitor/v2/results/{id}?deleteStepsTrue"
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // steps went with it
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("/nitestmonitor/v2/update-steps", &patch_step(&id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

fn patch_step(result_id: &str) -> String {
    format!(r#"{{"steps":[{{"resultId":"{result_id}","stepId":"s2"}}]}}"#)
}

#[tokio::test]
async fn bulk_delete_of_known_ids_returns_204() {
    use tower::Service;

    let mut app = app(KEY).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/nitestmonitor/v2/results",
            r#"{"results":[{"id":"a"},{"id":"b"}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/nitestmonitor/v2/delete-results",
            r#"{"ids":["a","b"],"deleteSteps":false}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}
