//! 페이지 아티팩트 파일 저장소.
//!
//! PNG 페이지 이미지를 스코프별 폴더에 저장/관리.
//! 구조: `<base_dir>/pages/<스코프 슬러그>/page-NNNN-<타임스탬프>.png`
//!
//! 파일명/폴더 규약은 이 저장소의 관심사다 — 코어는 시퀀스 번호만 준다.
//! 보존 정책(retention_days)이 0이면 무기한 보존한다.

use async_trait::async_trait;
use chrono::Utc;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

use pagesnap_core::error::CoreError;
use pagesnap_core::models::capture::RawCapture;
use pagesnap_core::models::outcome::ArtifactRef;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::artifact::ArtifactStore;

/// 스코프 슬러그 최대 길이 (파일시스템 호환)
const SLUG_MAX_LEN: usize = 50;

/// 페이지 아티팩트 파일 저장소 — `ArtifactStore` 포트 구현
pub struct PageFileStorage {
    /// 기본 저장 디렉토리 (pages 하위 폴더에 저장)
    base_dir: PathBuf,
    /// 보존 기간 (일, 0 = 무기한)
    retention_days: u32,
}

impl PageFileStorage {
    /// 새 아티팩트 저장소 생성
    pub async fn new(base_dir: PathBuf, retention_days: u32) -> Result<Self, CoreError> {
        let pages_dir = base_dir.join("pages");
        fs::create_dir_all(&pages_dir)
            .await
            .map_err(|e| CoreError::Persistence(format!("페이지 디렉토리 생성 실패: {e}")))?;

        info!(
            "페이지 저장소 초기화: {} ({}일 보존)",
            pages_dir.display(),
            retention_days
        );

        Ok(Self {
            base_dir,
            retention_days,
        })
    }

    /// 보존 정책 적용 — 기간을 넘긴 페이지 파일 삭제, 삭제 수 반환
    ///
    /// `retention_days == 0`이면 아무것도 지우지 않는다.
    pub async fn enforce_retention(&self) -> Result<usize, CoreError> {
        if self.retention_days == 0 {
            return Ok(0);
        }

        let cutoff = SystemTime::now() - Duration::from_secs(self.retention_days as u64 * 86_400);
        let pages_dir = self.base_dir.join("pages");
        let mut removed = 0usize;

        let mut scope_dirs = fs::read_dir(&pages_dir)
            .await
            .map_err(|e| CoreError::Persistence(format!("페이지 디렉토리 열기 실패: {e}")))?;

        while let Ok(Some(scope_dir)) = scope_dirs.next_entry().await {
            let Ok(mut files) = fs::read_dir(scope_dir.path()).await else {
                continue;
            };
            while let Ok(Some(file)) = files.next_entry().await {
                let expired = file
                    .metadata()
                    .await
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(|modified| modified < cutoff)
                    .unwrap_or(false);

                if expired {
                    match fs::remove_file(file.path()).await {
                        Ok(()) => removed += 1,
                        Err(e) => warn!("만료 파일 삭제 실패: {}: {e}", file.path().display()),
                    }
                }
            }
        }

        if removed > 0 {
            info!("보존 정책 적용: {removed}개 파일 삭제");
        }
        Ok(removed)
    }

    /// 스코프의 저장 디렉토리 경로
    fn scope_dir(&self, scope: &DocumentScope) -> PathBuf {
        self.base_dir.join("pages").join(sanitize_slug(scope.label()))
    }
}

#[async_trait]
impl ArtifactStore for PageFileStorage {
    async fn persist(
        &self,
        capture: &RawCapture,
        scope: &DocumentScope,
        sequence: u64,
    ) -> Result<ArtifactRef, CoreError> {
        let dir = self.scope_dir(scope);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Persistence(format!("스코프 디렉토리 생성 실패: {e}")))?;

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let path = dir.join(format!("page-{sequence:04}-{timestamp}.png"));

        let encoded = encode_png(capture)?;
        let bytes_written = encoded.len() as u64;

        fs::write(&path, encoded)
            .await
            .map_err(|e| CoreError::Persistence(format!("페이지 파일 쓰기 실패: {e}")))?;

        debug!(
            "페이지 파일 저장: {} ({bytes_written} bytes)",
            path.display()
        );

        Ok(ArtifactRef {
            path,
            bytes_written,
        })
    }
}

/// RGBA 버퍼 → PNG 바이트
fn encode_png(capture: &RawCapture) -> Result<Vec<u8>, CoreError> {
    if !capture.is_well_formed() {
        return Err(CoreError::Persistence(format!(
            "불량 캡처 버퍼: {}x{}, {} bytes",
            capture.width,
            capture.height,
            capture.pixels.len()
        )));
    }

    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(
            &capture.pixels,
            capture.width,
            capture.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| CoreError::Persistence(format!("PNG 인코딩 실패: {e}")))?;
    Ok(encoded)
}

/// 문서 라벨 → 파일시스템 안전 슬러그
///
/// 영숫자, 공백, `-`, `_`, `.`만 남기고 50자로 자른다.
fn sanitize_slug(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect();
    let trimmed = cleaned.trim();

    let slug: String = trimmed.chars().take(SLUG_MAX_LEN).collect();
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}
