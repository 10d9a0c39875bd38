//! 세션 통계 수집기.
//!
//! `OutcomeRecorder` 포트 구현. 순수 가산적 — 캡처 코어는 이 수집기를
//! 절대 조회하지 않는다. 스코프별/세션 전체 카운터를 유지하고 종료 시
//! 요약을 남긴다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use pagesnap_core::models::outcome::CaptureOutcome;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::recorder::OutcomeRecorder;

/// 스코프 하나의 카운터
#[derive(Debug, Clone, Default)]
pub struct ScopeCounters {
    /// 저장된 페이지 수
    pub saved: u64,
    /// 중복으로 생략된 수
    pub duplicates: u64,
    /// 비활성으로 생략된 수
    pub disabled: u64,
    /// 실패한 시도 수
    pub failed: u64,
}

/// 세션 통계 스냅샷
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// 세션 ID
    pub session_id: Uuid,
    /// 세션 시작 시각
    pub started_at: DateTime<Utc>,
    /// 스코프 라벨 → 카운터
    pub scopes: HashMap<String, ScopeCounters>,
}

impl SessionSnapshot {
    /// 세션 전체 저장 수
    pub fn total_saved(&self) -> u64 {
        self.scopes.values().map(|c| c.saved).sum()
    }
}

/// 세션 통계 수집기 — `OutcomeRecorder` 포트 구현
pub struct SessionStatsRecorder {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    scopes: Mutex<HashMap<String, ScopeCounters>>,
}

impl SessionStatsRecorder {
    /// 새 수집기 생성
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            scopes: Mutex::new(HashMap::new()),
        }
    }

    /// 현재 스냅샷
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            started_at: self.started_at,
            scopes: self.scopes.lock().clone(),
        }
    }

    /// 세션 요약 로그 (종료 시 호출)
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        let (mut saved, mut duplicates, mut failed) = (0u64, 0u64, 0u64);
        for counters in snapshot.scopes.values() {
            saved += counters.saved;
            duplicates += counters.duplicates;
            failed += counters.failed;
        }
        info!(
            "세션 {} 요약: 문서 {}개, 저장 {saved}, 중복 생략 {duplicates}, 실패 {failed}",
            snapshot.session_id,
            snapshot.scopes.len()
        );
    }
}

impl Default for SessionStatsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeRecorder for SessionStatsRecorder {
    async fn record(&self, scope: &DocumentScope, outcome: &CaptureOutcome) {
        let mut scopes = self.scopes.lock();
        let counters = scopes.entry(scope.label().to_string()).or_default();
        match outcome {
            CaptureOutcome::Saved { .. } => counters.saved += 1,
            CaptureOutcome::SkippedDuplicate { .. } => counters.duplicates += 1,
            CaptureOutcome::SkippedDisabled => counters.disabled += 1,
            CaptureOutcome::Failed { .. } => counters.failed += 1,
        }
    }
}
