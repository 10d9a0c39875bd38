//! 표면 모니터 포트.
//!
//! 구현: `pagesnap-monitor` crate (데스크톱 리더 창 / 브라우저 브리지)
//!
//! 신호 스트림은 와이어링 시점에 건네받은 mpsc 송신단으로 어댑터가
//! 직접 밀어 넣는다 — 포트는 현재 스코프 조회만 담당한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::scope::DocumentScope;

/// 문서 표면 모니터 — "지금 감시 중인 문서가 무엇인가"
#[async_trait]
pub trait SurfaceMonitor: Send + Sync {
    /// 현재 활성 문서 스코프 조회 (문서 표면이 아니면 `None`)
    async fn current_scope(&self) -> Result<Option<DocumentScope>, CoreError>;
}
