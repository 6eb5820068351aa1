// crates/flight-atlas-core/tests/orchestrator_cycle.rs
// ============================================================================
// Module: Orchestrator Cycle Tests
// Description: Request-cycle tests over scripted engine and fetcher mocks.
// Purpose: Verify dedup, polling, completion, and terminal-failure handling.
// Dependencies: flight-atlas-core
// ============================================================================

//! Request-cycle tests over scripted engine and fetcher mocks.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use flight_atlas_core::CanonicalQuery;
use flight_atlas_core::EngineError;
use flight_atlas_core::FetchError;
use flight_atlas_core::InMemoryCacheStore;
use flight_atlas_core::JobId;
use flight_atlas_core::JobPoll;
use flight_atlas_core::JobStatus;
use flight_atlas_core::Orchestrator;
use flight_atlas_core::OrchestratorError;
use flight_atlas_core::ProcessingPhase;
use flight_atlas_core::QueryEngine;
use flight_atlas_core::QueryResponse;
use flight_atlas_core::ResponsePayload;
use flight_atlas_core::ResultFetcher;
use flight_atlas_core::ResultLocation;
use flight_atlas_core::ResultRow;
use flight_atlas_core::SharedCacheStore;
use flight_atlas_core::Timestamp;
use flight_atlas_core::normalize_request;

/// Engine mock that counts submissions and replays scripted poll responses.
struct ScriptedEngine {
    submits: AtomicUsize,
    polls: Mutex<VecDeque<JobPoll>>,
}

impl ScriptedEngine {
    fn new(polls: Vec<JobPoll>) -> Arc<Self> {
        Arc::new(Self {
            submits: AtomicUsize::new(0),
            polls: Mutex::new(polls.into()),
        })
    }

    fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

/// Local handle passing the shared scripted engine into the orchestrator.
struct EngineHandle(Arc<ScriptedEngine>);

impl QueryEngine for EngineHandle {
    fn submit(&self, _query: &CanonicalQuery) -> Result<JobId, EngineError> {
        let n = self.0.submits.fetch_add(1, Ordering::SeqCst);
        Ok(JobId::new(format!("job-{n}")))
    }

    fn poll(&self, _job_id: &JobId) -> Result<JobPoll, EngineError> {
        let mut polls = self.0.polls.lock().unwrap();
        polls
            .pop_front()
            .ok_or_else(|| EngineError::Poll("no scripted poll response".to_string()))
    }
}

/// Fetcher mock serving fixed rows and counting fetches.
struct StaticFetcher {
    rows: Vec<ResultRow>,
    fetches: AtomicUsize,
}

impl StaticFetcher {
    fn new(rows: Vec<ResultRow>) -> Arc<Self> {
        Arc::new(Self {
            rows,
            fetches: AtomicUsize::new(0),
        })
    }
}

/// Local handle passing the shared static fetcher into the orchestrator.
struct FetcherHandle(Arc<StaticFetcher>);

impl ResultFetcher for FetcherHandle {
    fn fetch(&self, _location: &ResultLocation) -> Result<Vec<ResultRow>, FetchError> {
        self.0.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.rows.clone())
    }
}

fn route_row(airline: &str, src: &str, dst: &str) -> ResultRow {
    ResultRow::new(vec![
        ("airline_code".to_string(), airline.to_string()),
        ("src_airport".to_string(), src.to_string()),
        ("dst_airport".to_string(), dst.to_string()),
        ("src_geometry".to_string(), "POINT (-122.3 47.4)".to_string()),
        ("dst_geometry".to_string(), "POINT (-73.8 40.6)".to_string()),
    ])
}

fn orchestrator(
    engine: Arc<ScriptedEngine>,
    fetcher: Arc<StaticFetcher>,
    ttl_seconds: i64,
) -> Orchestrator {
    Orchestrator::builder()
        .store(SharedCacheStore::from_store(InMemoryCacheStore::new()))
        .engine(EngineHandle(engine))
        .fetcher(FetcherHandle(fetcher))
        .ttl_seconds(ttl_seconds)
        .build()
        .unwrap()
}

#[test]
fn first_request_submits_and_acknowledges_started() {
    let engine = ScriptedEngine::new(vec![]);
    let fetcher = StaticFetcher::new(vec![]);
    let orchestrator = orchestrator(Arc::clone(&engine), fetcher, 3600);
    let request = normalize_request("/routes", Some("SEA"), None).unwrap();

    let response = orchestrator.handle(&request, Timestamp::from_unix_seconds(1000)).unwrap();

    assert_eq!(engine.submit_count(), 1);
    match response {
        QueryResponse::Processing {
            phase,
            job_id,
        } => {
            assert_eq!(phase, ProcessingPhase::Started);
            assert_eq!(job_id.as_str(), "job-0");
        }
        other => panic!("expected processing ack, got {other:?}"),
    }
}

#[test]
fn repeat_request_polls_without_resubmitting() {
    let engine = ScriptedEngine::new(vec![JobPoll {
        state: JobStatus::Running,
        result_location: None,
    }]);
    let fetcher = StaticFetcher::new(vec![]);
    let orchestrator = orchestrator(Arc::clone(&engine), fetcher, 3600);
    let request = normalize_request("/routes", Some("SEA"), None).unwrap();

    let _first = orchestrator.handle(&request, Timestamp::from_unix_seconds(1000)).unwrap();
    let second = orchestrator.handle(&request, Timestamp::from_unix_seconds(1005)).unwrap();

    assert_eq!(engine.submit_count(), 1);
    match second {
        QueryResponse::Processing {
            phase, ..
        } => assert_eq!(phase, ProcessingPhase::Processing),
        other => panic!("expected processing ack, got {other:?}"),
    }
}

#[test]
fn completed_job_serves_transformed_result_then_cache() {
    let engine = ScriptedEngine::new(vec![JobPoll {
        state: JobStatus::Succeeded,
        result_location: Some(ResultLocation::new("results/job-0.csv")),
    }]);
    let fetcher = StaticFetcher::new(vec![route_row("AA", "SEA", "JFK")]);
    let orchestrator = orchestrator(Arc::clone(&engine), Arc::clone(&fetcher), 3600);
    let request = normalize_request("/routes", Some("SEA"), None).unwrap();

    let _ack = orchestrator.handle(&request, Timestamp::from_unix_seconds(1000)).unwrap();
    let ready = orchestrator.handle(&request, Timestamp::from_unix_seconds(1010)).unwrap();

    match ready {
        QueryResponse::Ready {
            payload: ResponsePayload::Routes(collection),
            skipped,
        } => {
            assert_eq!(collection.features.len(), 1);
            assert_eq!(collection.features[0].properties.src_airport, "SEA");
            assert!(skipped.is_empty());
        }
        other => panic!("expected routes payload, got {other:?}"),
    }

    // Third request is served from the stored location; the scripted poll
    // queue is empty, so any further poll would error.
    let again = orchestrator.handle(&request, Timestamp::from_unix_seconds(1020)).unwrap();
    assert!(matches!(again, QueryResponse::Ready { .. }));
    assert_eq!(engine.submit_count(), 1);
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_job_is_terminal_until_expiry() {
    let engine = ScriptedEngine::new(vec![JobPoll {
        state: JobStatus::Failed,
        result_location: None,
    }]);
    let fetcher = StaticFetcher::new(vec![]);
    let orchestrator = orchestrator(Arc::clone(&engine), fetcher, 3600);
    let request = normalize_request("/routes", Some("SEA"), None).unwrap();

    let _ack = orchestrator.handle(&request, Timestamp::from_unix_seconds(1000)).unwrap();
    let failed = orchestrator.handle(&request, Timestamp::from_unix_seconds(1010));
    assert!(matches!(failed, Err(OrchestratorError::JobFailed { .. })));

    // The terminal entry is served from the store; no new submission and no
    // further poll happen before the TTL expires.
    let still_failed = orchestrator.handle(&request, Timestamp::from_unix_seconds(1020));
    assert!(matches!(still_failed, Err(OrchestratorError::JobFailed { .. })));
    assert_eq!(engine.submit_count(), 1);
}

#[test]
fn expired_entry_is_replaced_by_a_fresh_submission() {
    let engine = ScriptedEngine::new(vec![]);
    let fetcher = StaticFetcher::new(vec![]);
    let orchestrator = orchestrator(Arc::clone(&engine), fetcher, 100);
    let request = normalize_request("/airports", None, None).unwrap();

    let _first = orchestrator.handle(&request, Timestamp::from_unix_seconds(1000)).unwrap();
    let after_expiry =
        orchestrator.handle(&request, Timestamp::from_unix_seconds(1100)).unwrap();

    assert_eq!(engine.submit_count(), 2);
    assert!(matches!(
        after_expiry,
        QueryResponse::Processing {
            phase: ProcessingPhase::Started,
            ..
        }
    ));
}

#[test]
fn concurrent_first_requests_track_one_job() {
    // Threads that arrive after the winner created the entry will poll; keep
    // the job in flight for all of them.
    let engine = ScriptedEngine::new(vec![
        JobPoll {
            state: JobStatus::Running,
            result_location: None,
        };
        8
    ]);
    let fetcher = StaticFetcher::new(vec![]);
    let orchestrator = orchestrator(Arc::clone(&engine), fetcher, 3600);
    let request = normalize_request("/routes", None, Some("DL")).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orchestrator = orchestrator.clone();
        let request = request.clone();
        handles.push(thread::spawn(move || {
            orchestrator.handle(&request, Timestamp::from_unix_seconds(1000)).unwrap()
        }));
    }

    let mut started = 0;
    let mut tracked = Vec::new();
    for handle in handles {
        match handle.join().unwrap() {
            QueryResponse::Processing {
                phase,
                job_id,
            } => {
                if phase == ProcessingPhase::Started {
                    started += 1;
                }
                tracked.push(job_id);
            }
            other => panic!("expected processing ack, got {other:?}"),
        }
    }

    // Exactly one request wins the create race; everyone observes the same
    // tracked job even if several threads raced to submit.
    assert_eq!(started, 1);
    assert!(tracked.windows(2).all(|pair| pair[0] == pair[1]));
}
