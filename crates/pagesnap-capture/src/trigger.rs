//! 디바운스 캡처 트리거.
//!
//! 원시 내비게이션 신호(키 입력, 스크롤 틱, 페이지 전환 통지)를 소비하여
//! "정확히 한 번의 캡처 시도"가 언제 발화해야 하는지 결정하는 상태 기계.
//!
//! 상태 순환: `Idle → Armed → Settling → Idle`. 종결 상태 없음 —
//! 프로세스 수명 동안 돈다. 순수·동기이며 신호당 작업은 상태 전이와
//! 데드라인 갱신뿐이다. 신호 폭주에도 신호당 할당이나 블로킹이 없어야
//! 한다 (스코프 복제는 Idle→Armed 전이에서만 일어난다).
//!
//! 타이머 구동은 호출자(런타임 루프)의 몫이다: `deadline()`이 주는
//! 시각까지 대기한 뒤 `on_deadline()`을 호출한다.

use tokio::time::{Duration, Instant};
use tracing::{debug, trace};

use pagesnap_core::models::capture::{CaptureRequest, TriggerKind};
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::models::signal::{NavigationSignal, SignalKind};
use std::sync::Arc;

use crate::control::CaptureControl;

/// 대기 중인 디바운스 사이클
#[derive(Debug, Clone)]
struct Pending {
    /// 신호가 속한 문서 스코프
    scope: DocumentScope,
    /// 마지막 신호의 벽시계 시각 (요청 타임스탬프 계산용)
    last_signal_at: chrono::DateTime<chrono::Utc>,
    /// 발화 데드라인 (마지막 신호 + settle 지연)
    deadline: Instant,
    /// 버스트를 시작한 신호 종류에서 유도한 요청 경로
    kind: TriggerKind,
}

/// 상태 기계 단계
#[derive(Debug, Clone)]
enum Phase {
    /// 대기 중인 캡처 없음
    Idle,
    /// 첫 신호 수신, settle 대기 시작
    Armed(Pending),
    /// 버스트 진행 중 — 신호마다 데드라인이 뒤로 밀린다
    Settling(Pending),
}

/// 디바운스 캡처 트리거 — 신호 버스트 → CaptureRequest 하나
pub struct DebounceTrigger {
    control: Arc<CaptureControl>,
    settle_delay: Duration,
    phase: Phase,
}

impl DebounceTrigger {
    /// 새 트리거 생성
    pub fn new(control: Arc<CaptureControl>, settle_delay_ms: u64) -> Self {
        Self {
            control,
            settle_delay: Duration::from_millis(settle_delay_ms),
            phase: Phase::Idle,
        }
    }

    /// settle 지연 변경 (다음 버스트부터 적용)
    pub fn set_settle_delay_ms(&mut self, settle_delay_ms: u64) {
        self.settle_delay = Duration::from_millis(settle_delay_ms);
    }

    /// 신호 수신 처리
    ///
    /// 수동 신호만 즉시 `Some`을 반환한다 — 디바운스를 우회하며, 진행
    /// 중인 settle 사이클을 리셋하거나 취소하지 않는다. 비활성 상태에서는
    /// 모든 신호가 상태 변화 없이 버려진다.
    pub fn on_signal(&mut self, signal: &NavigationSignal, now: Instant) -> Option<CaptureRequest> {
        if !self.control.is_enabled() {
            trace!("비활성 상태 — 신호 폐기");
            return None;
        }

        if signal.kind.is_manual() {
            debug!("수동 캡처 요청: {}", signal.scope);
            return Some(CaptureRequest {
                scope: signal.scope.clone(),
                requested_at: signal.timestamp,
                trigger: TriggerKind::Manual,
            });
        }

        let deadline = now + self.settle_delay;
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => {
                trace!("armed: {}", signal.scope);
                Phase::Armed(Pending {
                    scope: signal.scope.clone(),
                    last_signal_at: signal.timestamp,
                    deadline,
                    kind: request_kind(signal.kind),
                })
            }
            Phase::Armed(mut pending) | Phase::Settling(mut pending) => {
                if pending.scope != signal.scope {
                    // 표면 전환 — 이전 스코프의 대기 요청은 stale이므로
                    // 방출 없이 버리고 새 스코프로 재무장한다
                    debug!(
                        "스코프 전환으로 대기 사이클 취소: {} → {}",
                        pending.scope, signal.scope
                    );
                    Phase::Armed(Pending {
                        scope: signal.scope.clone(),
                        last_signal_at: signal.timestamp,
                        deadline,
                        kind: request_kind(signal.kind),
                    })
                } else {
                    pending.last_signal_at = signal.timestamp;
                    pending.deadline = deadline;
                    Phase::Settling(pending)
                }
            }
        };
        None
    }

    /// 다음 발화 데드라인 (대기 사이클이 없으면 `None`)
    pub fn deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Armed(p) | Phase::Settling(p) => Some(p.deadline),
        }
    }

    /// 데드라인 도달 처리 — settle 지연 동안 조용했다면 요청 하나 방출
    ///
    /// 이른 깨움(아직 데드라인 전)은 무시한다.
    pub fn on_deadline(&mut self, now: Instant) -> Option<CaptureRequest> {
        let pending = match &self.phase {
            Phase::Idle => return None,
            Phase::Armed(p) | Phase::Settling(p) => p.clone(),
        };

        if now < pending.deadline {
            return None;
        }

        self.phase = Phase::Idle;
        let settle_ms = self.settle_delay.as_millis() as i64;
        let requested_at = pending.last_signal_at + chrono::Duration::milliseconds(settle_ms);
        debug!("디바운스 해소: {} ({:?})", pending.scope, pending.kind);

        Some(CaptureRequest {
            scope: pending.scope,
            requested_at,
            trigger: pending.kind,
        })
    }

    /// 감시 표면 전환 통지
    ///
    /// 대기 중인 사이클의 스코프와 다르면 stale 요청 방출 없이 취소한다.
    pub fn on_scope_changed(&mut self, new_scope: Option<&DocumentScope>) {
        if let Phase::Armed(pending) | Phase::Settling(pending) = &self.phase {
            if new_scope != Some(&pending.scope) {
                debug!("표면 전환 — 대기 사이클 취소: {}", pending.scope);
                self.phase = Phase::Idle;
            }
        }
    }

    /// 대기 중인 사이클 존재 여부
    pub fn is_pending(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }
}

/// 신호 종류 → 방출될 요청의 경로
fn request_kind(kind: SignalKind) -> TriggerKind {
    match kind {
        SignalKind::ExternalPageChange => TriggerKind::PageChange,
        _ => TriggerKind::Debounced,
    }
}
