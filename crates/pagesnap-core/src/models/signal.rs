//! 내비게이션 신호 모델.
//!
//! 표면 모니터가 방출하는 일시적 이벤트. 절대 영속화하지 않으며,
//! 캡처 트리거가 즉시 소비한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scope::DocumentScope;

/// 내비게이션 키 (원본 리더의 페이지 이동 키 집합)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavKey {
    PageDown,
    PageUp,
    ArrowDown,
    ArrowUp,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
}

/// 신호 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SignalKind {
    /// 내비게이션 키 입력
    KeyNav {
        /// 입력된 키
        key: NavKey,
    },
    /// 스크롤 틱
    ScrollNav,
    /// 수동 캡처 요청 — 디바운스를 우회하여 즉시 발화
    ManualNav,
    /// 외부 페이지 전환 통지 (브라우저 확장 등)
    ExternalPageChange,
}

impl SignalKind {
    /// 디바운스를 우회하는 수동 신호 여부
    pub fn is_manual(&self) -> bool {
        matches!(self, SignalKind::ManualNav)
    }
}

/// 내비게이션 신호 — 트리거 상태 기계의 입력
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSignal {
    /// 신호 종류
    pub kind: SignalKind,
    /// 발생 시각
    pub timestamp: DateTime<Utc>,
    /// 발생 표면의 문서 스코프
    pub scope: DocumentScope,
}

impl NavigationSignal {
    /// 현재 시각으로 신호 생성
    pub fn now(kind: SignalKind, scope: DocumentScope) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            scope,
        }
    }
}

/// 표면 모니터가 수집 채널로 방출하는 이벤트
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// 내비게이션 신호
    Navigation(NavigationSignal),
    /// 감시 표면 전환 — 이전 스코프의 대기 중 settle 타이머를
    /// stale 요청 방출 없이 취소한다 (`None`은 문서 표면 이탈)
    ScopeChanged(Option<DocumentScope>),
}
