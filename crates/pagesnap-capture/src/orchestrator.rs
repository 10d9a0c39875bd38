//! 캡처 오케스트레이터.
//!
//! CaptureRequest 하나 → CaptureOutcome 정확히 하나. 순서:
//! (1) 비활성 재확인 → (2) 이미지 획득(타임아웃 한정) →
//! (3) 핑거프린트 → (4) 중복 조회 → (5) 영속화 + 레코드 + 시퀀스.
//!
//! 어떤 실패도 `Failed` 결과로 수렴한다 — 자동 재시도 없음, 패닉 없음.
//! 실패한 시도는 레코드를 만들지 않고 시퀀스 번호도 소비하지 않는다.

use std::sync::Arc;

use tokio::time::Duration;
use tracing::{debug, info, warn};

use pagesnap_core::models::capture::CaptureRequest;
use pagesnap_core::models::outcome::{CaptureOutcome, FailureReason};
use pagesnap_core::ports::acquire::{FingerprintEngine, ImageAcquirer};
use pagesnap_core::ports::artifact::ArtifactStore;

use crate::control::CaptureControl;
use crate::dedup::DuplicateIndex;

/// 캡처 오케스트레이터 — 요청 하나의 수명 주기를 소유
pub struct CaptureOrchestrator {
    control: Arc<CaptureControl>,
    acquirer: Arc<dyn ImageAcquirer>,
    engine: Arc<dyn FingerprintEngine>,
    index: Arc<DuplicateIndex>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl CaptureOrchestrator {
    /// 새 오케스트레이터 생성
    pub fn new(
        control: Arc<CaptureControl>,
        acquirer: Arc<dyn ImageAcquirer>,
        engine: Arc<dyn FingerprintEngine>,
        index: Arc<DuplicateIndex>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            control,
            acquirer,
            engine,
            index,
            artifacts,
        }
    }

    /// 중복 인덱스 핸들 (스코프 초기화 등 외부 조작용)
    pub fn index(&self) -> &Arc<DuplicateIndex> {
        &self.index
    }

    /// 요청 하나 실행 → 결과 하나
    pub async fn execute(&self, request: CaptureRequest) -> CaptureOutcome {
        // (1) 비활성 재확인 — 요청이 비활성화 이전에 큐잉됐을 수 있다
        if !self.control.is_enabled() {
            debug!("비활성 상태에서 해소된 요청 생략: {}", request.scope);
            return CaptureOutcome::SkippedDisabled;
        }

        // (2) 이미지 획득 — 타임아웃 한정
        let timeout_ms = self.control.acquire_timeout_ms();
        let acquired = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.acquirer.acquire(&request.scope),
        )
        .await;

        let raw = match acquired {
            Err(_) => {
                warn!("이미지 획득 타임아웃: {} ({timeout_ms}ms)", request.scope);
                return CaptureOutcome::Failed {
                    reason: FailureReason::Timeout { timeout_ms },
                };
            }
            Ok(Err(e)) => {
                warn!("이미지 획득 실패: {}: {e}", request.scope);
                return CaptureOutcome::Failed {
                    reason: FailureReason::Acquisition {
                        message: e.to_string(),
                    },
                };
            }
            Ok(Ok(raw)) => raw,
        };

        // (3) 핑거프린트
        let fingerprint = match self.engine.fingerprint(&raw) {
            Err(e) => {
                warn!("핑거프린트 계산 실패: {}: {e}", request.scope);
                return CaptureOutcome::Failed {
                    reason: FailureReason::Hash {
                        message: e.to_string(),
                    },
                };
            }
            Ok(fp) => fp,
        };

        // (4)(5) 스코프 임계 구역 — check-then-insert와 시퀀스 할당을
        // 같은 스코프의 동시 요청과 직렬화한다
        let mut scope_guard = self.index.begin(&request.scope).await;

        if self.control.dedup_enabled() {
            let threshold = self.control.threshold();
            if let Some(matched) = scope_guard.query(fingerprint, threshold) {
                debug!(
                    "중복 생략: {} (기존 seq {})",
                    request.scope, matched.sequence
                );
                return CaptureOutcome::SkippedDuplicate { matched };
            }
        }

        let sequence = scope_guard.next_sequence();
        let artifact = match self.artifacts.persist(&raw, &request.scope, sequence).await {
            Err(e) => {
                // 레코드 없음, 시퀀스 미소비 — 갭 없는 번호가 유지된다
                warn!("아티팩트 저장 실패: {}: {e}", request.scope);
                return CaptureOutcome::Failed {
                    reason: FailureReason::Persistence {
                        message: e.to_string(),
                    },
                };
            }
            Ok(artifact) => artifact,
        };

        let record = scope_guard.commit(fingerprint, raw.captured_at).await;
        info!(
            "페이지 저장: {} seq {} ({} bytes, fp {})",
            request.scope, record.sequence, artifact.bytes_written, fingerprint
        );

        CaptureOutcome::Saved {
            artifact,
            sequence: record.sequence,
        }
    }
}
