//! 데스크톱 리더 표면 모니터.
//!
//! 활성 창을 폴링하여 리더 창(제목 마커 부분 일치)을 인식하고, 문서
//! 스코프 전환을 `ScopeChanged`로 방출한다. OS 훅 레이어는
//! [`SignalHandle`]을 통해 키/스크롤/수동 신호를 밀어 넣는다 —
//! 핸들 호출은 신호 폭주에도 할당·블로킹 없이 동작해야 하므로
//! unbounded 채널 전송과 스코프 복제 한 번이 전부다.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use xcap::Window;

use pagesnap_core::config::MonitorConfig;
use pagesnap_core::error::CoreError;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::models::signal::{NavKey, NavigationSignal, SignalKind, SurfaceEvent};
use pagesnap_core::ports::monitor::SurfaceMonitor;

/// 데스크톱 리더 표면 모니터 — `SurfaceMonitor` 포트 구현
pub struct DesktopSurface {
    /// 리더 창 제목 마커 (부분 일치)
    reader_titles: Vec<String>,
    /// 활성 창 폴링 간격
    poll_interval: Duration,
    /// 현재 감시 중인 문서 스코프
    current: Arc<RwLock<Option<DocumentScope>>>,
    /// 수집 채널 송신단
    events_tx: mpsc::UnboundedSender<SurfaceEvent>,
}

/// OS 훅 레이어가 잡는 신호 핸들 — 복제 가능, 호출 비용 상수
#[derive(Clone)]
pub struct SignalHandle {
    current: Arc<RwLock<Option<DocumentScope>>>,
    events_tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl DesktopSurface {
    /// 새 데스크톱 모니터 생성
    pub fn new(config: &MonitorConfig, events_tx: mpsc::UnboundedSender<SurfaceEvent>) -> Self {
        Self {
            reader_titles: config.reader_titles.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            current: Arc::new(RwLock::new(None)),
            events_tx,
        }
    }

    /// 신호 핸들 발급
    pub fn handle(&self) -> SignalHandle {
        SignalHandle {
            current: self.current.clone(),
            events_tx: self.events_tx.clone(),
        }
    }

    /// 활성 창 폴링 루프 — 종료 신호까지 돈다
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "데스크톱 표면 모니터 시작 (폴링 {}ms)",
            self.poll_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let markers = self.reader_titles.clone();
                    match tokio::task::spawn_blocking(move || active_reader_window(&markers)).await {
                        Ok(window) => self.observe_window(window.as_ref().map(|(p, t)| (p.as_str(), t.as_str()))),
                        Err(e) => warn!("활성 창 조회 태스크 실패: {e}"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("데스크톱 표면 모니터 종료");
                        break;
                    }
                }
            }
        }
    }

    /// 활성 창 관측 결과 반영 — 스코프 전환 시 `ScopeChanged` 방출
    ///
    /// 폴링 루프와 테스트가 공유하는 진입점.
    pub fn observe_window(&self, window: Option<(&str, &str)>) {
        let new_scope = window.map(|(process, title)| DocumentScope::from_window(process, title));

        let changed = {
            let current = self.current.read().unwrap();
            *current != new_scope
        };

        if changed {
            debug!(
                "감시 표면 전환: {:?}",
                new_scope.as_ref().map(|s| s.label())
            );
            *self.current.write().unwrap() = new_scope.clone();
            let _ = self.events_tx.send(SurfaceEvent::ScopeChanged(new_scope));
        }
    }
}

#[async_trait]
impl SurfaceMonitor for DesktopSurface {
    async fn current_scope(&self) -> Result<Option<DocumentScope>, CoreError> {
        Ok(self.current.read().unwrap().clone())
    }
}

impl SignalHandle {
    /// 내비게이션 키 입력 통지
    pub fn key(&self, key: NavKey) {
        self.send(SignalKind::KeyNav { key });
    }

    /// 스크롤 틱 통지
    pub fn scroll(&self) {
        self.send(SignalKind::ScrollNav);
    }

    /// 수동 캡처 요청 (디바운스 우회)
    pub fn manual(&self) {
        self.send(SignalKind::ManualNav);
    }

    /// 현재 스코프가 있을 때만 신호 전송
    fn send(&self, kind: SignalKind) {
        let scope = match self.current.read() {
            Ok(current) => current.clone(),
            Err(_) => None,
        };
        if let Some(scope) = scope {
            let _ = self
                .events_tx
                .send(SurfaceEvent::Navigation(NavigationSignal::now(kind, scope)));
        }
    }
}

/// 활성 리더 창 조회 (블로킹) — (프로세스 이름, 창 제목)
///
/// 포커스 창이 리더가 아니면 `None`. 포커스 조회가 실패하는 플랫폼에서는
/// 최소화되지 않은 첫 리더 창으로 폴백한다.
fn active_reader_window(markers: &[String]) -> Option<(String, String)> {
    let windows = Window::all().ok()?;

    let mut fallback: Option<(String, String)> = None;
    for window in windows {
        let Ok(title) = window.title() else { continue };
        if !is_reader_title(&title, markers) {
            continue;
        }
        let process = window.app_name().unwrap_or_default();

        if window.is_focused().unwrap_or(false) {
            return Some((process, title));
        }
        if fallback.is_none() && !window.is_minimized().unwrap_or(true) {
            fallback = Some((process, title));
        }
    }
    fallback
}

/// 제목이 리더 마커를 포함하는지 검사
pub fn is_reader_title(title: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| title.contains(marker.as_str()))
}
