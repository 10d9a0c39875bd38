//! 중복 레코드 영속 저장소 포트.
//!
//! 구현: `pagesnap-storage` crate (rusqlite)
//!
//! 인메모리 핫셋(`pagesnap-capture::dedup`)의 내구 백킹이다.
//! 지속 실패는 "중복 없음"으로 강등된다 — 캡처 가용성이 우선이다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::record::DuplicateRecord;
use crate::models::scope::DocumentScope;

/// 중복 레코드 내구 저장소
#[async_trait]
pub trait DuplicateStore: Send + Sync {
    /// 레코드 추가 (수락된 캡처당 한 건)
    async fn append(&self, record: &DuplicateRecord) -> Result<(), CoreError>;

    /// 스코프의 최신 레코드 N건 조회 (핫셋 워밍업용, 오래된 것부터 정렬)
    async fn load_recent(
        &self,
        scope: &DocumentScope,
        limit: usize,
    ) -> Result<Vec<DuplicateRecord>, CoreError>;

    /// 스코프의 마지막 시퀀스 번호 (레코드 없으면 0)
    async fn last_sequence(&self, scope: &DocumentScope) -> Result<u64, CoreError>;

    /// 스코프의 레코드 전부 삭제 — 다른 스코프는 건드리지 않는다
    async fn clear_scope(&self, scope: &DocumentScope) -> Result<usize, CoreError>;
}
