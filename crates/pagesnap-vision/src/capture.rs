//! 스크린 캡처 어댑터.
//!
//! xcap 기반 `ImageAcquirer` 포트 구현. 스코프 라벨과 제목이 일치하는
//! 리더 창을 우선 캡처하고, 못 찾으면 주 모니터로 폴백한다.
//!
//! xcap 호출은 블로킹이므로 `spawn_blocking`으로 감싼다 — 타임아웃
//! 한정은 오케스트레이터의 몫이다.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use xcap::{Monitor, Window};

use pagesnap_core::error::CoreError;
use pagesnap_core::models::capture::RawCapture;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::acquire::ImageAcquirer;

/// xcap 이미지 획득기 — `ImageAcquirer` 포트 구현
pub struct XcapAcquirer;

impl XcapAcquirer {
    /// 새 획득기 생성
    pub fn new() -> Self {
        Self
    }
}

impl Default for XcapAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageAcquirer for XcapAcquirer {
    async fn acquire(&self, scope: &DocumentScope) -> Result<RawCapture, CoreError> {
        let scope = scope.clone();
        tokio::task::spawn_blocking(move || capture_surface(&scope))
            .await
            .map_err(|e| CoreError::Acquisition(format!("캡처 태스크 조인 실패: {e}")))?
    }
}

/// 스코프에 해당하는 표면 캡처 (블로킹)
fn capture_surface(scope: &DocumentScope) -> Result<RawCapture, CoreError> {
    if let Some(capture) = capture_matching_window(scope)? {
        return Ok(capture);
    }

    // 일치 창 없음 — 주 모니터 폴백
    debug!("일치 창 없음, 주 모니터 캡처: {}", scope);
    capture_primary_monitor(scope)
}

/// 제목이 스코프 라벨을 포함하는 창 캡처
fn capture_matching_window(scope: &DocumentScope) -> Result<Option<RawCapture>, CoreError> {
    let windows = Window::all()
        .map_err(|e| CoreError::Acquisition(format!("창 목록 조회 실패: {e}")))?;

    let target = windows.into_iter().find(|w| {
        w.title()
            .map(|title| title.contains(scope.label()))
            .unwrap_or(false)
    });

    let Some(window) = target else {
        return Ok(None);
    };

    let image = window
        .capture_image()
        .map_err(|e| CoreError::Acquisition(format!("창 캡처 실패: {e}")))?;

    debug!("창 캡처 완료: {} {}x{}", scope, image.width(), image.height());
    Ok(Some(raw_capture_from(scope, image)))
}

/// 주 모니터 캡처
fn capture_primary_monitor(scope: &DocumentScope) -> Result<RawCapture, CoreError> {
    let monitors = Monitor::all()
        .map_err(|e| CoreError::Acquisition(format!("모니터 목록 조회 실패: {e}")))?;

    let monitor = monitors
        .into_iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| Monitor::all().ok()?.into_iter().next())
        .ok_or_else(|| CoreError::Acquisition("모니터를 찾을 수 없음".to_string()))?;

    let image = monitor
        .capture_image()
        .map_err(|e| CoreError::Acquisition(format!("모니터 캡처 실패: {e}")))?;

    Ok(raw_capture_from(scope, image))
}

/// xcap RGBA 이미지 → RawCapture
fn raw_capture_from(scope: &DocumentScope, image: image::RgbaImage) -> RawCapture {
    let (width, height) = image.dimensions();
    RawCapture {
        scope: scope.clone(),
        width,
        height,
        pixels: image.into_raw(),
        captured_at: Utc::now(),
    }
}
