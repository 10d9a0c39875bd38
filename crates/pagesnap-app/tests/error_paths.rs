//! 실패 경로 통합 테스트.
//!
//! 획득 실패, 내구 인덱스 강등, 영속화 실패가 파이프라인을 막지 않고
//! `Failed` 결과로 수렴하는지 검증한다.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;

use pagesnap_capture::control::CaptureControl;
use pagesnap_capture::dedup::DuplicateIndex;
use pagesnap_capture::orchestrator::CaptureOrchestrator;
use pagesnap_core::config::AppConfig;
use pagesnap_core::error::CoreError;
use pagesnap_core::models::capture::{CaptureRequest, TriggerKind};
use pagesnap_core::models::outcome::{CaptureOutcome, FailureReason};
use pagesnap_core::models::record::DuplicateRecord;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::index::DuplicateStore;
use pagesnap_storage::artifacts::PageFileStorage;
use pagesnap_vision::hash::PerceptualHasher;

use common::{horizontal_page, ScriptedAcquirer};

/// 항상 실패하는 내구 저장소 — 지속적 인덱스 장애 시뮬레이션
struct BrokenStore;

#[async_trait]
impl DuplicateStore for BrokenStore {
    async fn append(&self, _record: &DuplicateRecord) -> Result<(), CoreError> {
        Err(CoreError::Index("디스크 분리됨".to_string()))
    }

    async fn load_recent(
        &self,
        _scope: &DocumentScope,
        _limit: usize,
    ) -> Result<Vec<DuplicateRecord>, CoreError> {
        Err(CoreError::Index("디스크 분리됨".to_string()))
    }

    async fn last_sequence(&self, _scope: &DocumentScope) -> Result<u64, CoreError> {
        Err(CoreError::Index("디스크 분리됨".to_string()))
    }

    async fn clear_scope(&self, _scope: &DocumentScope) -> Result<usize, CoreError> {
        Err(CoreError::Index("디스크 분리됨".to_string()))
    }
}

async fn make_orchestrator(
    acquirer: Arc<ScriptedAcquirer>,
    store: Arc<dyn DuplicateStore>,
    save_dir: &tempfile::TempDir,
) -> (CaptureOrchestrator, Arc<CaptureControl>) {
    let config = AppConfig::default_config();
    let control = Arc::new(CaptureControl::from_config(&config));
    let artifacts = Arc::new(
        PageFileStorage::new(save_dir.path().to_path_buf(), 0)
            .await
            .unwrap(),
    );
    let orchestrator = CaptureOrchestrator::new(
        control.clone(),
        acquirer,
        Arc::new(PerceptualHasher::default()),
        Arc::new(DuplicateIndex::new(store, 64)),
        artifacts,
    );
    (orchestrator, control)
}

fn request(scope: &DocumentScope) -> CaptureRequest {
    CaptureRequest {
        scope: scope.clone(),
        requested_at: Utc::now(),
        trigger: TriggerKind::Debounced,
    }
}

/// 획득 실패 → Failed, 다음 내비게이션에서 정상 복구
#[tokio::test(flavor = "multi_thread")]
async fn acquisition_failure_recovers_on_next_attempt() {
    let save_dir = tempfile::tempdir().unwrap();
    let acquirer = Arc::new(ScriptedAcquirer::showing(horizontal_page()));
    let store = Arc::new(pagesnap_storage::sqlite::SqliteDuplicateStore::open_in_memory().unwrap());
    let (orchestrator, _control) = make_orchestrator(acquirer.clone(), store, &save_dir).await;
    let scope = DocumentScope::named("doc-A");

    acquirer.set_failing(true);
    let outcome = orchestrator.execute(request(&scope)).await;
    assert_matches!(
        outcome,
        CaptureOutcome::Failed {
            reason: FailureReason::Acquisition { .. }
        }
    );

    // 실패는 시퀀스를 소비하지 않는다
    acquirer.set_failing(false);
    let outcome = orchestrator.execute(request(&scope)).await;
    assert_matches!(outcome, CaptureOutcome::Saved { sequence: 1, .. });
}

/// 지속적 인덱스 장애 → "중복 없음" 강등, 캡처는 계속된다
#[tokio::test(flavor = "multi_thread")]
async fn broken_index_store_degrades_to_no_duplicate() {
    let save_dir = tempfile::tempdir().unwrap();
    let acquirer = Arc::new(ScriptedAcquirer::showing(horizontal_page()));
    let (orchestrator, _control) =
        make_orchestrator(acquirer, Arc::new(BrokenStore), &save_dir).await;
    let scope = DocumentScope::named("doc-A");

    // 내구 저장소가 완전히 죽어도 저장은 성공한다
    let outcome = orchestrator.execute(request(&scope)).await;
    assert_matches!(outcome, CaptureOutcome::Saved { sequence: 1, .. });

    // 핫셋은 살아 있으므로 같은 렌더는 여전히 중복으로 잡힌다
    let outcome = orchestrator.execute(request(&scope)).await;
    assert_matches!(outcome, CaptureOutcome::SkippedDuplicate { .. });
}
