//! 캡처 런타임 루프.
//!
//! 경량 태스크 하나가 표면 이벤트 채널과 트리거의 settle 데드라인을
//! `select!`로 감시한다. 해소된 CaptureRequest마다 독립 태스크를 스폰해
//! 오케스트레이터를 돌린다 — 신호 수집은 진행 중인 캡처를 절대 기다리지
//! 않는다.
//!
//! 스코프 전환이나 비활성화가 일어나도 이미 획득 단계를 지난
//! 오케스트레이터 실행은 강제 중단하지 않는다. 원래 스코프로 기록된다.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use pagesnap_core::models::outcome::CaptureOutcome;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::models::signal::SurfaceEvent;
use pagesnap_core::ports::recorder::OutcomeRecorder;

use crate::orchestrator::CaptureOrchestrator;
use crate::trigger::DebounceTrigger;

/// 결과 스트림 이벤트 — CaptureRequest당 하나
#[derive(Debug, Clone)]
pub struct OutcomeEvent {
    /// 요청 스코프
    pub scope: DocumentScope,
    /// 종결 결과
    pub outcome: CaptureOutcome,
}

/// 캡처 런타임 — 트리거 타이머 구동 + 오케스트레이터 디스패치
pub struct CaptureRuntime {
    trigger: DebounceTrigger,
    orchestrator: Arc<CaptureOrchestrator>,
    recorder: Arc<dyn OutcomeRecorder>,
    outcomes: broadcast::Sender<OutcomeEvent>,
}

impl CaptureRuntime {
    /// 새 런타임 생성
    pub fn new(
        trigger: DebounceTrigger,
        orchestrator: Arc<CaptureOrchestrator>,
        recorder: Arc<dyn OutcomeRecorder>,
    ) -> Self {
        let (outcomes, _) = broadcast::channel(64);
        Self {
            trigger,
            orchestrator,
            recorder,
            outcomes,
        }
    }

    /// 결과 스트림 구독 (UI/트레이/알림 소비자용)
    pub fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent> {
        self.outcomes.subscribe()
    }

    /// 런타임 루프 — 이벤트 채널이 닫히거나 종료 신호까지 돈다
    pub async fn run(
        mut self,
        mut events_rx: mpsc::UnboundedReceiver<SurfaceEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("캡처 런타임 시작");

        loop {
            let deadline = self.trigger.deadline();

            tokio::select! {
                event = events_rx.recv() => {
                    match event {
                        None => {
                            debug!("표면 이벤트 채널 종료");
                            break;
                        }
                        Some(SurfaceEvent::Navigation(signal)) => {
                            if let Some(request) = self.trigger.on_signal(&signal, Instant::now()) {
                                self.dispatch(request);
                            }
                        }
                        Some(SurfaceEvent::ScopeChanged(scope)) => {
                            self.trigger.on_scope_changed(scope.as_ref());
                        }
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(request) = self.trigger.on_deadline(Instant::now()) {
                        self.dispatch(request);
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("캡처 런타임 종료");
                        break;
                    }
                }
            }
        }
    }

    /// 요청 하나를 독립 태스크로 실행
    fn dispatch(&self, request: pagesnap_core::models::capture::CaptureRequest) {
        let orchestrator = self.orchestrator.clone();
        let recorder = self.recorder.clone();
        let outcomes = self.outcomes.clone();

        tokio::spawn(async move {
            let scope = request.scope.clone();
            let outcome = orchestrator.execute(request).await;
            recorder.record(&scope, &outcome).await;
            // 구독자가 없으면 조용히 버려진다
            let _ = outcomes.send(OutcomeEvent { scope, outcome });
        });
    }
}
