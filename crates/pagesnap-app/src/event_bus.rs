//! 내부 이벤트 버스.
//!
//! `tokio::broadcast` 기반 내부 이벤트 라우팅. 캡처 결과 스트림을
//! UI/트레이/알림 소비자에게 중계한다.

use pagesnap_core::models::outcome::CaptureOutcome;
use pagesnap_core::models::scope::DocumentScope;
use tokio::sync::broadcast;
use tracing::debug;

/// 내부 앱 이벤트
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum AppEvent {
    /// 캡처 결과 도착 (CaptureRequest당 하나)
    OutcomeReady {
        /// 요청 스코프
        scope: DocumentScope,
        /// 종결 결과
        outcome: CaptureOutcome,
    },
    /// 감시 표면 전환
    ScopeChanged(Option<DocumentScope>),
    /// 에러 발생
    Error(String),
}

/// 내부 이벤트 버스
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 새 이벤트 버스 생성
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행
    pub fn publish(&self, event: AppEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    /// 구독자 생성
    #[allow(dead_code)]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
