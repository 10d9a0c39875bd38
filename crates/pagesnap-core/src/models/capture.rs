//! 캡처 요청/원본 캡처 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scope::DocumentScope;

/// 캡처 요청을 발생시킨 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    /// 디바운스 해소 (키/스크롤 버스트 정착)
    Debounced,
    /// 수동 요청 (디바운스 우회)
    Manual,
    /// 외부 페이지 전환 통지
    PageChange,
}

/// 캡처 요청 — 디바운스 해소 시점에 트리거가 생성
///
/// 오케스트레이터가 발화하거나 대체되는 즉시 소멸한다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// 대상 문서 스코프
    pub scope: DocumentScope,
    /// 요청 시각 — 디바운스 요청이면 마지막 신호 시각 + settle 지연
    pub requested_at: DateTime<Utc>,
    /// 요청 경로
    pub trigger: TriggerKind,
}

/// 원본 캡처 — 한 번의 오케스트레이터 실행이 단독 소유
///
/// RGBA8 픽셀 버퍼 (`width * height * 4` 바이트). 공유하지 않는다.
#[derive(Debug, Clone)]
pub struct RawCapture {
    /// 캡처 대상 스코프
    pub scope: DocumentScope,
    /// 너비 (픽셀)
    pub width: u32,
    /// 높이 (픽셀)
    pub height: u32,
    /// RGBA8 픽셀 데이터
    pub pixels: Vec<u8>,
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
}

impl RawCapture {
    /// 픽셀 버퍼가 해상도와 일치하는 비어 있지 않은 캡처인지 검사
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.pixels.len() == (self.width as usize) * (self.height as usize) * 4
    }
}
