//! End-to-end workflow tests against the mock backend.

use std::sync::Arc;
use std::time::Duration;

use filmrecipe_core::api::ApiError;
use filmrecipe_core::config::IntakeConfig;
use filmrecipe_core::orchestrator::{
    IntakeOutcome, ProcessOutcome, WorkflowError, WorkflowOrchestrator,
};
use filmrecipe_core::session::SessionStatus;
use filmrecipe_core::testing::{fixtures, MockFilmLabApi};
use filmrecipe_core::{FilmLabApi, ImagePayload};

fn orchestrator() -> (Arc<WorkflowOrchestrator<MockFilmLabApi>>, MockFilmLabApi) {
    let mock = MockFilmLabApi::new();
    let orchestrator = Arc::new(WorkflowOrchestrator::new(
        mock.clone(),
        IntakeConfig::default(),
    ));
    (orchestrator, mock)
}

#[tokio::test]
async fn test_upload_then_render_happy_path() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123def456",
        fixtures::candidate_list(3),
    )))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/abc123def456/film_1.jpg"),
        fixtures::render_success_wire(2, "/output/abc123def456/film_2.jpg"),
        fixtures::render_success_wire(3, "/output/abc123def456/film_3.jpg"),
    ])))
    .await;

    let outcome = orchestrator.submit(fixtures::jpeg_payload(64)).await.unwrap();
    let receipt = match outcome {
        IntakeOutcome::Accepted(receipt) => receipt,
        IntakeOutcome::Superseded => panic!("unexpected supersede"),
    };
    assert_eq!(receipt.job_id, "abc123def456");
    assert_eq!(receipt.candidate_films.len(), 3);

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert_eq!(session.job_id.as_deref(), Some("abc123def456"));
    assert_eq!(session.candidate_films.len(), 3);
    assert!(session.error.is_none());

    let summary = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.failed_count, 0);
    assert_eq!(
        summary.zip_url.as_deref(),
        Some("/api/download/abc123/all_films.zip")
    );

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.results.len(), 3);
    assert!(session.error.is_none());

    // The batch carried every candidate in one request.
    let requests = mock.recorded_process().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].film_ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_oversized_photo_rejected_without_request() {
    let (orchestrator, mock) = orchestrator();

    let payload = ImagePayload::new("huge.jpg", vec![0u8; 60 * 1024 * 1024]);
    let err = orchestrator.submit(payload).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(session.error.is_some());
    assert_eq!(mock.upload_count().await, 0);
}

#[tokio::test]
async fn test_unsupported_extension_rejected_without_request() {
    let (orchestrator, mock) = orchestrator();

    let err = orchestrator
        .submit(ImagePayload::new("photo.gif", vec![1, 2, 3]))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(mock.upload_count().await, 0);
}

#[tokio::test]
async fn test_partial_results_counts_sum_to_received() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(3),
    )))
    .await;
    // Server only answered for two of the three requested films.
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/abc123/film_1.jpg"),
        fixtures::render_success_wire(2, "/output/abc123/film_2.jpg"),
    ])))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let summary = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.success_count + summary.failed_count, 2);
    assert_eq!(orchestrator.session().await.status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_partial_failure_sets_advisory() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(2),
    )))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/abc123/film_1.jpg"),
        fixtures::render_failure_wire(2, "render pipeline crashed"),
    ])))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let summary = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failed_count, 1);

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.error.as_deref(), Some("1 films failed, 1 succeeded"));
}

#[tokio::test]
async fn test_upload_transport_failure_returns_to_idle() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Err(ApiError::Transport("request timed out".into())))
        .await;

    let err = orchestrator
        .submit(fixtures::jpeg_payload(1))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Transport(_)));

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(session.candidate_films.is_empty());
    assert!(session.error.as_deref().unwrap().contains("request timed out"));
}

#[tokio::test]
async fn test_server_error_message_surfaces() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Err(ApiError::Server {
        status: 400,
        message: "Unsupported file type".into(),
    }))
    .await;

    let err = orchestrator
        .submit(fixtures::jpeg_payload(1))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Server { status: 400, .. }));
    assert!(err.to_string().contains("Unsupported file type"));
}

#[tokio::test]
async fn test_fast_resubmit_supersedes_slow_upload() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload_delayed(
        Duration::from_millis(50),
        Ok(fixtures::upload_response("job-slow", fixtures::candidate_list(2))),
    )
    .await;
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "job-fast",
        fixtures::candidate_list(3),
    )))
    .await;

    let slow = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.submit(fixtures::jpeg_payload(1)).await })
    };
    // Let the slow submit take the first scripted response before resubmitting.
    tokio::time::sleep(Duration::from_millis(10)).await;

    let fast = orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    assert!(matches!(fast, IntakeOutcome::Accepted(_)));

    let slow = slow.await.unwrap().unwrap();
    assert!(matches!(slow, IntakeOutcome::Superseded));

    // The slow response must not have clobbered the newer session.
    let session = orchestrator.session().await;
    assert_eq!(session.job_id.as_deref(), Some("job-fast"));
    assert_eq!(session.candidate_films.len(), 3);
    assert_eq!(session.status, SessionStatus::Matched);
}

#[tokio::test]
async fn test_superseded_failure_is_not_an_error() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload_delayed(
        Duration::from_millis(50),
        Err(ApiError::Transport("connection failed".into())),
    )
    .await;
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "job-fast",
        fixtures::candidate_list(1),
    )))
    .await;

    let slow = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.submit(fixtures::jpeg_payload(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();

    let slow = slow.await.unwrap().unwrap();
    assert!(matches!(slow, IntakeOutcome::Superseded));

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert!(session.error.is_none());
}

#[tokio::test]
async fn test_process_from_idle_is_precondition_without_request() {
    let (orchestrator, mock) = orchestrator();

    let err = orchestrator.process_all().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Precondition(_)));
    assert_eq!(mock.process_count().await, 0);
    assert_eq!(orchestrator.session().await.status, SessionStatus::Idle);
}

#[tokio::test]
async fn test_unrequested_film_result_is_dropped() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(2),
    )))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/abc123/film_1.jpg"),
        fixtures::render_success_wire(99, "/output/abc123/film_99.jpg"),
    ])))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let summary = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();

    assert_eq!(summary.outcomes.len(), 1);
    assert!(summary.outcomes.iter().all(|o| o.film_id() != 99));
}

#[tokio::test]
async fn test_reported_counts_are_ignored_in_favor_of_derived() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(2),
    )))
    .await;
    let mut response = fixtures::process_response(vec![fixtures::render_success_wire(
        1,
        "/output/abc123/film_1.jpg",
    )]);
    response.success = Some(5);
    response.failed = Some(5);
    mock.enqueue_process(Ok(response)).await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let summary = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failed_count, 0);
}

#[tokio::test]
async fn test_reprocess_allowed_from_completed() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(1),
    )))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_failure_wire(1, "transient"),
    ])))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/abc123/film_1.jpg"),
    ])))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let first = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();
    assert_eq!(first.failed_count, 1);

    let second = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();
    assert_eq!(second.success_count, 1);

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Completed);
    // The retry cleared the previous advisory.
    assert!(session.error.is_none());
    assert_eq!(mock.process_count().await, 2);
}

#[tokio::test]
async fn test_malformed_upload_response_restores_status() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(1),
    )))
    .await;
    // Second upload answers with no job_id at all.
    mock.enqueue_upload(Ok(fixtures::upload_response("", fixtures::candidate_list(1))))
        .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let err = orchestrator
        .submit(fixtures::jpeg_payload(1))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedResponse(_)));

    // The failed re-submit falls back to the prior stable state.
    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert!(session.error.is_some());
}

#[tokio::test]
async fn test_missing_results_field_is_malformed_and_restores_matched() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(1),
    )))
    .await;
    let mut response = fixtures::process_response(vec![]);
    response.results = None;
    mock.enqueue_process(Ok(response)).await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let err = orchestrator.process_all().await.unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedResponse(_)));

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert!(session.results.is_empty());
}

#[tokio::test]
async fn test_process_transport_failure_restores_matched() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(2),
    )))
    .await;
    mock.enqueue_process(Err(ApiError::Transport("connection failed".into())))
        .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let err = orchestrator.process_all().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Transport(_)));

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert_eq!(session.candidate_films.len(), 2);
}

#[tokio::test]
async fn test_new_submit_replaces_completed_session() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "job-one",
        fixtures::candidate_list(2),
    )))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/job-one/film_1.jpg"),
        fixtures::render_success_wire(2, "/output/job-one/film_2.jpg"),
    ])))
    .await;
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "job-two",
        fixtures::candidate_list(3),
    )))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    orchestrator.process_all().await.unwrap();
    assert_eq!(orchestrator.session().await.results.len(), 2);

    // Submitting a new photo wipes the finished workflow entirely.
    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert_eq!(session.job_id.as_deref(), Some("job-two"));
    assert_eq!(session.candidate_films.len(), 3);
    assert!(session.results.is_empty());
    assert!(session.error.is_none());
}

#[tokio::test]
async fn test_resubmit_supersedes_in_flight_render() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "job-one",
        fixtures::candidate_list(1),
    )))
    .await;
    mock.enqueue_process_delayed(
        Duration::from_millis(50),
        Ok(fixtures::process_response(vec![
            fixtures::render_success_wire(1, "/output/job-one/film_1.jpg"),
        ])),
    )
    .await;
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "job-two",
        fixtures::candidate_list(2),
    )))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let render = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.process_all().await })
    };
    // Let the render take the scripted response before resubmitting.
    tokio::time::sleep(Duration::from_millis(10)).await;
    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();

    let outcome = render.await.unwrap().unwrap();
    assert!(matches!(outcome, ProcessOutcome::Superseded));

    // The stale batch must not have touched the newer session.
    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Matched);
    assert_eq!(session.job_id.as_deref(), Some("job-two"));
    assert!(session.results.is_empty());
}

#[tokio::test]
async fn test_reset_returns_to_idle() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(1),
    )))
    .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    orchestrator.reset().await;

    let session = orchestrator.session().await;
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(session.job_id.is_none());
    assert!(session.candidate_films.is_empty());
}

#[tokio::test]
async fn test_artifact_fetch_after_completion() {
    let (orchestrator, mock) = orchestrator();
    mock.enqueue_upload(Ok(fixtures::upload_response(
        "abc123",
        fixtures::candidate_list(1),
    )))
    .await;
    mock.enqueue_process(Ok(fixtures::process_response(vec![
        fixtures::render_success_wire(1, "/output/abc123/film_1.jpg"),
    ])))
    .await;
    mock.insert_artifact("/output/abc123/film_1.jpg", vec![0xFF, 0xD8, 0xFF])
        .await;

    orchestrator.submit(fixtures::jpeg_payload(1)).await.unwrap();
    let summary = orchestrator
        .process_all()
        .await
        .unwrap()
        .into_summary()
        .unwrap();

    let url = summary.outcomes[0].output_url().unwrap();
    let bytes = orchestrator.api().fetch_artifact(url).await.unwrap();
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
}
