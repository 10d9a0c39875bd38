//! 중복 레코드 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fingerprint::Fingerprint;
use super::scope::DocumentScope;

/// 영속 중복 레코드 — 수락된 캡처 하나당 한 건
///
/// 불변식: 한 스코프 안에서 두 레코드의 비트 거리는 각자의 삽입 시점에
/// 유효했던 임계값을 하회하지 않는다. 임계값 변경은 소급 적용하지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRecord {
    /// 소속 문서 스코프
    pub scope: DocumentScope,
    /// 지각 핑거프린트
    pub fingerprint: Fingerprint,
    /// 최초 관측 시각
    pub first_seen_at: DateTime<Utc>,
    /// 스코프 내 시퀀스 번호 (Saved 결과만 소비, 1부터)
    pub sequence: u64,
}
