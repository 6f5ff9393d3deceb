//! End-to-end session tests against a scripted agent.
//!
//! Each test wires a `ClientFactory` with a `StaticResolver` and a
//! `ScriptedConnector`, runs the raw renderer over in-memory writers and
//! checks output, exit code and files on disk.

use std::sync::atomic::Ordering;

use anyhow::Result;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use a2acli_core::artifact::ArtifactDestination;
use a2acli_core::negotiate::{Binding, NegotiationError};
use a2acli_core::protocol::{Phase, Task};
use a2acli_core::render::RawRenderer;
use a2acli_core::transport::{ClientFactory, Endpoint, TransportError};
use a2acli_core::{Session, SessionError, SessionOptions, SessionOutcome, StreamRequest};
use a2acli_test_utils::{
    ScriptedConnector, ScriptedTransport, StaticResolver, Step, artifact_data_event,
    artifact_text_event, card, status_event,
};

// ===========================================================================
// Helpers
// ===========================================================================

struct RawRun {
    outcome: SessionOutcome,
    phase: Option<Phase>,
    stdout: String,
    stderr: String,
}

fn factory(transport: ScriptedTransport) -> (ClientFactory, StaticResolver) {
    let resolver = StaticResolver::new(card("scripted", &["JSONRPC"], true));
    let factory = ClientFactory::new()
        .with_resolver(resolver.clone())
        .with_connector(ScriptedConnector::new(Binding::JsonRpc, transport));
    (factory, resolver)
}

fn options(destination: ArtifactDestination) -> SessionOptions {
    SessionOptions {
        endpoint: Endpoint::new("http://127.0.0.1:9001"),
        destination,
        ..SessionOptions::default()
    }
}

async fn run_raw(session: &Session, request: StreamRequest) -> RawRun {
    let mut renderer = RawRenderer::new(Vec::new(), Vec::new(), CancellationToken::new());
    let report = session.stream(request, &mut renderer).await;
    let (out, err) = renderer.into_inner();
    RawRun {
        outcome: report.outcome,
        phase: report.projection.phase().cloned(),
        stdout: String::from_utf8(out).expect("stdout is utf-8"),
        stderr: String::from_utf8(err).expect("stderr is utf-8"),
    }
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn completed_stream_writes_artifact() -> Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let transport = ScriptedTransport::new([
        Step::from(status_event("t-1", Phase::Submitted)),
        Step::from(status_event("t-1", Phase::Working)),
        Step::from(artifact_text_event("t-1", "report.txt", "hello")),
        Step::from(status_event("t-1", Phase::Completed)),
    ]);
    let (factory, _) = factory(transport);
    let session = Session::connect(
        &factory,
        options(ArtifactDestination::new(Some(tmp.path().to_path_buf()), None)),
    )
    .await?;

    let run = run_raw(&session, StreamRequest::Send(session.request("go"))).await;

    assert_eq!(run.outcome, SessionOutcome::Completed);
    assert_eq!(run.outcome.exit_code(), 0);
    assert_eq!(run.phase, Some(Phase::Completed));
    assert_eq!(run.stdout.lines().count(), 4);
    assert!(run.stderr.is_empty(), "unexpected stderr: {}", run.stderr);

    let files: Vec<_> = std::fs::read_dir(tmp.path())?.collect::<Result<_, _>>()?;
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read_to_string(tmp.path().join("report.txt"))?, "hello");
    Ok(())
}

#[tokio::test]
async fn stream_error_is_reported_once() -> Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let out_dir = tmp.path().join("out");
    let transport = ScriptedTransport::new([
        Step::from(status_event("t-1", Phase::Submitted)),
        Step::Error("connection reset".to_string()),
    ]);
    let (factory, _) = factory(transport);
    let session = Session::connect(
        &factory,
        options(ArtifactDestination::new(Some(out_dir.clone()), None)),
    )
    .await?;

    let run = run_raw(&session, StreamRequest::Send(session.request("go"))).await;

    assert_ne!(run.outcome.exit_code(), 0);
    let errors: Vec<&str> = run.stderr.lines().collect();
    assert_eq!(errors.len(), 1, "stderr: {}", run.stderr);
    let parsed: serde_json::Value = serde_json::from_str(errors[0])?;
    assert!(
        parsed["error"].as_str().unwrap_or_default().contains("connection reset"),
        "got {parsed}"
    );
    assert!(!out_dir.exists(), "no files should have been written");
    Ok(())
}

#[tokio::test]
async fn explicit_file_name_is_suffixed_on_repeat() -> Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let transport = ScriptedTransport::new([
        Step::from(artifact_data_event("t-1", "out.json", json!({"n": 1}))),
        Step::from(artifact_data_event("t-1", "out.json", json!({"n": 2}))),
        Step::from(status_event("t-1", Phase::Completed)),
    ]);
    let (factory, _) = factory(transport);
    let session = Session::connect(
        &factory,
        options(ArtifactDestination::new(
            Some(tmp.path().to_path_buf()),
            Some("out.json".to_string()),
        )),
    )
    .await?;

    let run = run_raw(&session, StreamRequest::Send(session.request("go"))).await;
    assert_eq!(run.outcome, SessionOutcome::Completed);

    let first: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("out.json"))?)?;
    let second: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("out_1.json"))?)?;
    assert_eq!(first, json!({"n": 1}));
    assert_eq!(second, json!({"n": 2}));
    Ok(())
}

#[tokio::test]
async fn unknown_forced_transport_fails_before_resolving() {
    let transport = ScriptedTransport::new([Step::from(status_event("t-1", Phase::Completed))]);
    let connector = ScriptedConnector::new(Binding::JsonRpc, transport);
    let connects = connector.connects();
    let resolver = StaticResolver::new(card("scripted", &["JSONRPC"], true));
    let calls = resolver.calls();
    let factory = ClientFactory::new()
        .with_resolver(resolver)
        .with_connector(connector);

    let mut opts = options(ArtifactDestination::default());
    opts.transport = Some("quic".to_string());

    let err = Session::connect(&factory, opts)
        .await
        .expect_err("quic must be rejected");

    assert!(
        matches!(err, SessionError::Negotiation(NegotiationError::UnknownTransport(_))),
        "got {err:?}"
    );
    assert!(err.to_string().contains("quic"));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "card must not be fetched");
    assert_eq!(connects.load(Ordering::SeqCst), 0, "no connection may be opened");
}

// ===========================================================================
// Negotiation through the factory
// ===========================================================================

#[tokio::test]
async fn negotiated_binding_needs_a_connector() {
    let resolver = StaticResolver::new(card("grpc-only", &["GRPC"], true));
    let factory = ClientFactory::new()
        .with_resolver(resolver)
        .with_connector(ScriptedConnector::new(
            Binding::JsonRpc,
            ScriptedTransport::default(),
        ));

    let err = Session::connect(&factory, options(ArtifactDestination::default()))
        .await
        .expect_err("grpc has no connector");

    assert!(matches!(
        err,
        SessionError::Transport(TransportError::NoConnector(Binding::Grpc))
    ));
    assert_eq!(err.to_string(), "no connector linked for binding grpc");
}

#[tokio::test]
async fn forced_binding_overrides_priority() -> Result<()> {
    let resolver = StaticResolver::new(card("multi", &["GRPC", "HTTP+JSON"], true));
    let factory = ClientFactory::new()
        .with_resolver(resolver)
        .with_connector(ScriptedConnector::new(
            Binding::HttpJson,
            ScriptedTransport::default(),
        ));

    let mut opts = options(ArtifactDestination::default());
    opts.transport = Some("http+json".to_string());
    let session = Session::connect(&factory, opts).await?;

    assert_eq!(session.binding(), Some(Binding::HttpJson));
    Ok(())
}

// ===========================================================================
// Task operations
// ===========================================================================

#[tokio::test]
async fn fetch_and_blocking_send_use_the_transport() -> Result<()> {
    let transport = ScriptedTransport::new([]).with_task(Task::new("t-5", Phase::Completed));
    let (factory, _) = factory(transport.clone());
    let mut opts = options(ArtifactDestination::default());
    opts.reference_task = Some("t-4".into());
    let session = Session::connect(&factory, opts).await?;

    let task = session.fetch(&"t-5".into()).await?;
    assert_eq!(task.phase(), &Phase::Completed);

    let err = session.fetch(&"missing".into()).await.unwrap_err();
    assert!(matches!(err, TransportError::TaskNotFound(_)));

    let done = session.send_blocking(&session.request("hi")).await?;
    assert_eq!(done.id.as_str(), "t-5");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.reference_task_ids, vec![a2acli_core::protocol::TaskId::from("t-4")]);
    Ok(())
}

#[tokio::test]
async fn subscribe_streams_existing_task() -> Result<()> {
    let transport = ScriptedTransport::new([
        Step::from(status_event("t-3", Phase::Working)),
        Step::from(status_event("t-3", Phase::Completed)),
    ]);
    let (factory, _) = factory(transport);
    let session = Session::connect(&factory, options(ArtifactDestination::default())).await?;

    let run = run_raw(&session, StreamRequest::Subscribe("t-3".into())).await;
    assert_eq!(run.phase, Some(Phase::Completed));
    assert_eq!(run.stdout.lines().count(), 2);
    Ok(())
}
