//! 이미지 획득 포트.
//!
//! 구현: `pagesnap-vision` crate (xcap 기반 데스크톱 캡처)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::capture::RawCapture;
use crate::models::fingerprint::Fingerprint;
use crate::models::scope::DocumentScope;

/// 이미지 획득 — 해소된 CaptureRequest당 한 번 호출 가능해야 한다
///
/// 실패하거나 타임아웃될 수 있다. 타임아웃 한정은 오케스트레이터가
/// 건다 (`acquire_timeout_ms`).
#[async_trait]
pub trait ImageAcquirer: Send + Sync {
    /// 대상 표면의 원본 캡처 획득
    async fn acquire(&self, scope: &DocumentScope) -> Result<RawCapture, CoreError>;
}

/// 지각 핑거프린트 엔진 — 순수 변환, 상태 없음
///
/// 동일 픽셀 입력에 결정적이어야 하고, 도메인이 기대하는 렌더링 노이즈
/// (안티앨리어싱, 커서 오버레이)에는 작은 비트 거리로 안정적이어야 한다.
pub trait FingerprintEngine: Send + Sync {
    /// 원본 캡처 → 핑거프린트 (빈/불량 입력은 `CoreError::Hash`)
    fn fingerprint(&self, capture: &RawCapture) -> Result<Fingerprint, CoreError>;
}
