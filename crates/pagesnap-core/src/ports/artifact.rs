//! 아티팩트 저장소 포트.
//!
//! 구현: `pagesnap-storage` crate (스코프별 폴더 + PNG 파일)
//! 파일명/폴더 규약은 저장소의 관심사다 — 코어는 관여하지 않는다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::capture::RawCapture;
use crate::models::outcome::ArtifactRef;
use crate::models::scope::DocumentScope;

/// 페이지 이미지 아티팩트 저장소
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 캡처 이미지 영속화 → 아티팩트 참조 반환
    async fn persist(
        &self,
        capture: &RawCapture,
        scope: &DocumentScope,
        sequence: u64,
    ) -> Result<ArtifactRef, CoreError>;
}
