//! 브라우저 확장 브리지.
//!
//! 확장의 네이티브 메시징 호스트가 전달하는 JSON 페이지 전환 메시지를
//! 수신해 `ExternalPageChange` 신호로 바꾼다. 탭/문서 전환은
//! `ScopeChanged`로 구분해 방출한다 — 데스크톱 표면과 동일한 트리거
//! 상태 기계가 그대로 소비한다.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use pagesnap_core::error::CoreError;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::models::signal::{NavigationSignal, SignalKind, SurfaceEvent};
use pagesnap_core::ports::monitor::SurfaceMonitor;

/// 확장이 보내는 페이지 전환 메시지
#[derive(Debug, Clone, Deserialize)]
pub struct PageChangeMessage {
    /// 탭 URL
    pub url: String,
    /// 탭 제목
    #[serde(default)]
    pub title: String,
    /// 브라우저 탭 ID
    #[serde(default)]
    pub tab_id: Option<u32>,
}

/// 브라우저 브리지 표면 — `SurfaceMonitor` 포트 구현
pub struct BrowserBridge {
    /// 현재 감시 중인 탭 스코프
    current: Arc<RwLock<Option<DocumentScope>>>,
    /// 수집 채널 송신단
    events_tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl BrowserBridge {
    /// 새 브리지 생성
    pub fn new(events_tx: mpsc::UnboundedSender<SurfaceEvent>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            events_tx,
        }
    }

    /// JSON 한 줄 처리 (네이티브 메시징 페이로드)
    pub fn handle_json(&self, raw: &str) -> Result<(), CoreError> {
        let message: PageChangeMessage = serde_json::from_str(raw)?;
        self.handle_message(message);
        Ok(())
    }

    /// 페이지 전환 메시지 처리
    ///
    /// 스코프(문서/탭)가 바뀌면 `ScopeChanged`를 먼저 방출한 뒤
    /// 페이지 전환 신호를 보낸다. 같은 문서 안의 페이지 이동은
    /// 신호만 방출한다.
    pub fn handle_message(&self, message: PageChangeMessage) {
        let scope = DocumentScope::from_url(&message.url, &message.title);

        let changed = {
            let current = self.current.read().unwrap();
            current.as_ref() != Some(&scope)
        };

        if changed {
            debug!("브리지 탭 전환: {} (tab {:?})", scope, message.tab_id);
            *self.current.write().unwrap() = Some(scope.clone());
            let _ = self
                .events_tx
                .send(SurfaceEvent::ScopeChanged(Some(scope.clone())));
        }

        let _ = self.events_tx.send(SurfaceEvent::Navigation(
            NavigationSignal::now(SignalKind::ExternalPageChange, scope),
        ));
    }
}

#[async_trait]
impl SurfaceMonitor for BrowserBridge {
    async fn current_scope(&self) -> Result<Option<DocumentScope>, CoreError> {
        Ok(self.current.read().unwrap().clone())
    }
}
