mod common;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rpp_generator::config::Config;
use rpp_generator::coordinator::{Coordinator, CoordinatorState};
use rpp_generator::error::GENERATION_FAILED_MESSAGE;
use rpp_generator::models::Phase;
use rpp_generator::{GeminiClient, GenerationError, LessonGenerator};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
    GeminiClient::new(&Config {
        api_key: api_key.map(str::to_string),
        api_base: server.uri(),
        ..Config::default()
    })
}

#[tokio::test]
async fn decodes_structured_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::envelope(&common::response_json().to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, Some("test-key"))
        .generate(&common::request())
        .await
        .unwrap();

    assert_eq!(response.topic_refined, "Interaksi Makhluk Hidup di Ekosistem Sungai");
    let phases: Vec<Phase> = response.learning_flow.iter().map(|f| f.phase).collect();
    assert_eq!(phases, Phase::ALL.to_vec());
}

#[tokio::test]
async fn request_carries_prompt_schema_and_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::envelope(&common::response_json().to_string())),
        )
        .mount(&server)
        .await;

    let request = common::request();
    client(&server, Some("test-key")).generate(&request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    for value in [
        &request.school_name,
        &request.teacher_name,
        &request.subject,
        &request.grade,
        &request.topic,
        &request.cp,
        &request.conditions,
        &request.academic_year,
        &request.semester,
        &request.time_allocation,
        &request.learning_method,
    ] {
        assert!(prompt.contains(value.as_str()), "prompt is missing {value:?}");
    }

    let config = &body["generationConfig"];
    assert_eq!(config["responseMimeType"], "application/json");
    assert_eq!(config["responseSchema"]["type"], "OBJECT");
    assert!((config["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server, Some("test-key"))
        .generate(&common::request())
        .await
        .unwrap_err();
    match err {
        GenerationError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::envelope("{\"topic_refined\": ")))
        .mount(&server)
        .await;

    let err = client(&server, Some("test-key"))
        .generate(&common::request())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidJson(_)));
}

#[tokio::test]
async fn unknown_phase_is_rejected() {
    let mut payload = common::response_json();
    payload["learning_flow"][1]["phase"] = json!("Mengevaluasi");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::envelope(&payload.to_string())))
        .mount(&server)
        .await;

    let err = client(&server, Some("test-key"))
        .generate(&common::request())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidJson(_)));
}

#[tokio::test]
async fn empty_flow_fails_validation() {
    let mut payload = common::response_json();
    payload["learning_flow"] = json!([]);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::envelope(&payload.to_string())))
        .mount(&server)
        .await;

    let err = client(&server, Some("test-key"))
        .generate(&common::request())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Schema(_)));
}

#[tokio::test]
async fn missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, None).generate(&common::request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::MissingCredential));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_generation_leaves_form_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::envelope("not json")))
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new();
    coordinator
        .submit(&client(&server, Some("test-key")), common::request())
        .await
        .unwrap();

    match coordinator.state() {
        CoordinatorState::Form { error, draft } => {
            assert_eq!(error.as_deref(), Some(GENERATION_FAILED_MESSAGE));
            assert_eq!(draft.school_name, "SMA 1");
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert!(coordinator.result().is_none());

    coordinator.reset();
    assert_eq!(coordinator.state(), &CoordinatorState::default());
}
