//! 캡처 파이프라인 통합 테스트.
//!
//! 트리거 → 런타임 → 오케스트레이터 → 해시 엔진 → 중복 인덱스 →
//! 아티팩트 저장 cross-crate 연동. 실제 지각 해시와 인메모리 SQLite,
//! 임시 디렉토리 파일 저장을 사용한다.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;

use pagesnap_capture::control::CaptureControl;
use pagesnap_capture::dedup::DuplicateIndex;
use pagesnap_capture::orchestrator::CaptureOrchestrator;
use pagesnap_capture::runtime::{CaptureRuntime, OutcomeEvent};
use pagesnap_capture::trigger::DebounceTrigger;
use pagesnap_core::config::AppConfig;
use pagesnap_core::models::outcome::CaptureOutcome;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::models::signal::{NavKey, NavigationSignal, SignalKind, SurfaceEvent};
use pagesnap_core::ports::recorder::OutcomeRecorder;
use pagesnap_storage::artifacts::PageFileStorage;
use pagesnap_storage::sqlite::SqliteDuplicateStore;
use pagesnap_vision::hash::PerceptualHasher;

use common::{horizontal_page, vertical_page, ScriptedAcquirer};

/// 결과만 세는 수집기
#[derive(Default)]
struct NullRecorder;

#[async_trait::async_trait]
impl OutcomeRecorder for NullRecorder {
    async fn record(&self, _scope: &DocumentScope, _outcome: &CaptureOutcome) {}
}

struct Pipeline {
    acquirer: Arc<ScriptedAcquirer>,
    control: Arc<CaptureControl>,
    events_tx: tokio::sync::mpsc::UnboundedSender<SurfaceEvent>,
    outcome_rx: tokio::sync::broadcast::Receiver<OutcomeEvent>,
    _shutdown_tx: tokio::sync::watch::Sender<bool>,
    _save_dir: tempfile::TempDir,
}

/// settle 지연 100ms로 전체 파이프라인 조립
async fn make_pipeline(threshold: u32) -> Pipeline {
    let mut config = AppConfig::default_config();
    config.capture.settle_delay_ms = 100;
    config.dedup.similarity_threshold = threshold;

    let save_dir = tempfile::tempdir().unwrap();
    let control = Arc::new(CaptureControl::from_config(&config));
    let acquirer = Arc::new(ScriptedAcquirer::showing(horizontal_page()));
    let artifacts = Arc::new(
        PageFileStorage::new(save_dir.path().to_path_buf(), 0)
            .await
            .unwrap(),
    );
    let store = Arc::new(SqliteDuplicateStore::open_in_memory().unwrap());
    let index = Arc::new(DuplicateIndex::new(store, config.dedup.hot_set_capacity));

    let orchestrator = Arc::new(CaptureOrchestrator::new(
        control.clone(),
        acquirer.clone(),
        Arc::new(PerceptualHasher::new(config.dedup.hash_algorithm)),
        index,
        artifacts,
    ));

    let trigger = DebounceTrigger::new(control.clone(), config.capture.settle_delay_ms);
    let runtime = CaptureRuntime::new(trigger, orchestrator, Arc::new(NullRecorder));
    let outcome_rx = runtime.subscribe();

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(runtime.run(events_rx, shutdown_rx));

    Pipeline {
        acquirer,
        control,
        events_tx,
        outcome_rx,
        _shutdown_tx: shutdown_tx,
        _save_dir: save_dir,
    }
}

impl Pipeline {
    fn signal(&self, scope: &DocumentScope, kind: SignalKind) {
        self.events_tx
            .send(SurfaceEvent::Navigation(NavigationSignal::now(
                kind,
                scope.clone(),
            )))
            .unwrap();
    }

    fn nav(&self, scope: &DocumentScope) {
        self.signal(
            scope,
            SignalKind::KeyNav {
                key: NavKey::PageDown,
            },
        );
    }

    async fn next_outcome(&mut self) -> OutcomeEvent {
        tokio::time::timeout(Duration::from_secs(5), self.outcome_rx.recv())
            .await
            .expect("결과 대기 타임아웃")
            .expect("결과 채널 종료")
    }
}

/// §시나리오: 신호 버스트 → Saved(1) → 동일 렌더 → 중복 → 다른 페이지 → Saved(2)
#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_dedup_scenario() {
    let mut pipeline = make_pipeline(5).await;
    let scope = DocumentScope::named("doc-A");

    // 페이지 X: 50ms 간격 신호 3개 → 캡처 하나
    for _ in 0..3 {
        pipeline.nav(&scope);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let event = pipeline.next_outcome().await;
    assert_eq!(event.scope, scope);
    let saved_path = match event.outcome {
        CaptureOutcome::Saved {
            sequence: 1,
            ref artifact,
        } => artifact.path.clone(),
        other => panic!("Saved(seq 1) 기대, 실제: {other:?}"),
    };
    assert!(saved_path.exists());

    // 페이지 X 재방문 (동일 렌더) → 중복 생략
    pipeline.nav(&scope);
    let event = pipeline.next_outcome().await;
    assert_matches!(
        event.outcome,
        CaptureOutcome::SkippedDuplicate { matched } if matched.sequence == 1
    );

    // 시각적으로 다른 페이지 Y → seq 2로 저장
    pipeline.acquirer.show(vertical_page());
    pipeline.nav(&scope);
    let event = pipeline.next_outcome().await;
    assert_matches!(event.outcome, CaptureOutcome::Saved { sequence: 2, .. });
}

/// 수동 요청은 디바운스와 독립적으로 즉시 발화한다
#[tokio::test(flavor = "multi_thread")]
async fn manual_bypass_fires_immediately() {
    let mut pipeline = make_pipeline(0).await;
    let scope = DocumentScope::named("doc-A");

    pipeline.signal(&scope, SignalKind::ManualNav);
    let event = pipeline.next_outcome().await;
    assert_matches!(event.outcome, CaptureOutcome::Saved { sequence: 1, .. });
}

/// 스코프 A의 중복/시퀀스 상태는 스코프 B에 영향을 주지 않는다
#[tokio::test(flavor = "multi_thread")]
async fn scope_isolation_across_documents() {
    let mut pipeline = make_pipeline(5).await;
    let a = DocumentScope::named("doc-A");
    let b = DocumentScope::named("doc-B");

    pipeline.signal(&a, SignalKind::ManualNav);
    let event = pipeline.next_outcome().await;
    assert_matches!(event.outcome, CaptureOutcome::Saved { sequence: 1, .. });

    // 같은 픽셀, 다른 문서 → 교차 억제 없음, 독립 시퀀스
    pipeline.signal(&b, SignalKind::ManualNav);
    let event = pipeline.next_outcome().await;
    assert_eq!(event.scope, b);
    assert_matches!(event.outcome, CaptureOutcome::Saved { sequence: 1, .. });
}

/// 비활성화 중 신호는 버려지고, 재활성화하면 재개된다
#[tokio::test(flavor = "multi_thread")]
async fn disabled_flag_gates_signals() {
    let mut pipeline = make_pipeline(0).await;
    let scope = DocumentScope::named("doc-A");

    pipeline.control.set_enabled(false);
    pipeline.nav(&scope);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 결과가 없어야 한다
    assert!(pipeline.outcome_rx.try_recv().is_err());

    pipeline.control.set_enabled(true);
    pipeline.nav(&scope);
    let event = pipeline.next_outcome().await;
    assert_matches!(event.outcome, CaptureOutcome::Saved { sequence: 1, .. });
}

/// 중복 감지를 끄면 동일 페이지도 계속 저장된다
#[tokio::test(flavor = "multi_thread")]
async fn dedup_toggle_takes_effect_on_next_request() {
    let mut pipeline = make_pipeline(5).await;
    let scope = DocumentScope::named("doc-A");

    pipeline.signal(&scope, SignalKind::ManualNav);
    assert_matches!(
        pipeline.next_outcome().await.outcome,
        CaptureOutcome::Saved { sequence: 1, .. }
    );

    pipeline.signal(&scope, SignalKind::ManualNav);
    assert_matches!(
        pipeline.next_outcome().await.outcome,
        CaptureOutcome::SkippedDuplicate { .. }
    );

    // 다음 요청부터 적용 — 기존 레코드는 재평가하지 않는다
    pipeline.control.set_dedup_enabled(false);
    pipeline.signal(&scope, SignalKind::ManualNav);
    assert_matches!(
        pipeline.next_outcome().await.outcome,
        CaptureOutcome::Saved { sequence: 2, .. }
    );
}
