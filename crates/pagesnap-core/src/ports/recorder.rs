//! 세션/통계 수집기 포트.
//!
//! 구현: `pagesnap-app` (세션 카운터). 순수 가산적 — 코어가 조회하는
//! 일은 없다.

use async_trait::async_trait;

use crate::models::outcome::CaptureOutcome;
use crate::models::scope::DocumentScope;

/// 캡처 결과 수집기
#[async_trait]
pub trait OutcomeRecorder: Send + Sync {
    /// 결과 한 건 기록 (CaptureRequest당 한 번)
    async fn record(&self, scope: &DocumentScope, outcome: &CaptureOutcome);
}
