//! PAGESNAP 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 실패를 `CoreError`로 매핑하여 반환한다.
//! 어떤 에러도 프로세스 치명적이지 않다 — 오케스트레이터는 항상
//! `Failed` 결과로 수렴하고, 트리거는 다음 내비게이션에서 재시도 가능
//! 상태로 복귀한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 캡처 파이프라인 단계별 실패와 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 이미지 획득 실패 (캡처 대상 없음, 권한 거부 등)
    #[error("이미지 획득 실패: {0}")]
    Acquisition(String),

    /// 이미지 획득 타임아웃
    #[error("이미지 획득 타임아웃: {timeout_ms}ms 초과")]
    AcquisitionTimeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 핑거프린트 계산 실패 (빈 이미지, 버퍼 크기 불일치 등)
    #[error("핑거프린트 에러: {0}")]
    Hash(String),

    /// 아티팩트 저장 실패 (파일 I/O)
    #[error("아티팩트 저장 실패: {0}")]
    Persistence(String),

    /// 중복 인덱스 저장소 에러 (SQLite I/O)
    ///
    /// 지속되는 경우 "중복 없음"으로 강등 처리된다 — 캡처를 막지 않는다.
    #[error("중복 인덱스 에러: {0}")]
    Index(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}
