//! 캡처 결과 모델.
//!
//! 오케스트레이터 실행 하나의 종결 결과. CaptureRequest당 정확히 한 번
//! 방출되며, 코어는 보관하지 않는다 (영속화는 통계 수집기의 책임).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::record::DuplicateRecord;

/// 저장된 아티팩트 참조
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// 저장 경로
    pub path: PathBuf,
    /// 기록된 바이트 수
    pub bytes_written: u64,
}

/// 실패 사유 (§7 에러 분류의 결과 표현)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FailureReason {
    /// 이미지 획득 실패
    Acquisition {
        /// 상세 메시지
        message: String,
    },
    /// 이미지 획득 타임아웃
    Timeout {
        /// 초과된 타임아웃 (밀리초)
        timeout_ms: u64,
    },
    /// 핑거프린트 계산 실패
    Hash {
        /// 상세 메시지
        message: String,
    },
    /// 아티팩트 저장 실패
    Persistence {
        /// 상세 메시지
        message: String,
    },
}

/// 캡처 결과 — CaptureRequest 하나당 정확히 하나
///
/// 자동 재시도는 없다. 실패한 시도는 레코드를 만들지 않고
/// 시퀀스 번호도 소비하지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureOutcome {
    /// 새 페이지로 수락되어 저장됨
    Saved {
        /// 저장된 아티팩트
        artifact: ArtifactRef,
        /// 스코프 내 시퀀스 번호
        sequence: u64,
    },
    /// 기존 레코드와 임계값 이내 — 저장 생략
    SkippedDuplicate {
        /// 일치한 기존 레코드
        matched: DuplicateRecord,
    },
    /// 비활성 상태에서 해소된 요청 — 저장 생략
    SkippedDisabled,
    /// 파이프라인 실패 (자동 재시도 없음)
    Failed {
        /// 실패 사유
        reason: FailureReason,
    },
}

impl CaptureOutcome {
    /// 저장 성공 여부
    pub fn is_saved(&self) -> bool {
        matches!(self, CaptureOutcome::Saved { .. })
    }
}
