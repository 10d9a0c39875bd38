//! 통합 테스트 공용 헬퍼.
//!
//! 스크립트 가능한 이미지 획득기와 합성 페이지 이미지 생성기.

// 테스트 바이너리마다 쓰는 헬퍼가 달라 dead_code 경고가 난다
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use pagesnap_core::error::CoreError;
use pagesnap_core::models::capture::RawCapture;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::acquire::ImageAcquirer;

/// 테스트 페이지 해상도
pub const PAGE_W: u32 = 256;
pub const PAGE_H: u32 = 320;

/// 가로 줄무늬 페이지 (본문 텍스트 대역)
pub fn horizontal_page() -> Vec<u8> {
    let mut pixels = vec![255u8; (PAGE_W * PAGE_H * 4) as usize];
    for y in 0..PAGE_H {
        if y % 24 < 3 {
            for x in 0..PAGE_W {
                let p = ((y * PAGE_W + x) * 4) as usize;
                pixels[p] = 20;
                pixels[p + 1] = 20;
                pixels[p + 2] = 20;
            }
        }
    }
    pixels
}

/// 세로 줄무늬 페이지 — 시각적으로 전혀 다른 페이지
pub fn vertical_page() -> Vec<u8> {
    let mut pixels = vec![255u8; (PAGE_W * PAGE_H * 4) as usize];
    for y in 0..PAGE_H {
        for x in 0..PAGE_W {
            if x % 16 < 8 {
                let p = ((y * PAGE_W + x) * 4) as usize;
                pixels[p] = 20;
                pixels[p + 1] = 20;
                pixels[p + 2] = 20;
            }
        }
    }
    pixels
}

/// 현재 "화면에 보이는 페이지"를 교체할 수 있는 획득기
pub struct ScriptedAcquirer {
    page: Mutex<Arc<Vec<u8>>>,
    fail: Mutex<bool>,
}

impl ScriptedAcquirer {
    pub fn showing(page: Vec<u8>) -> Self {
        Self {
            page: Mutex::new(Arc::new(page)),
            fail: Mutex::new(false),
        }
    }

    /// 표시 중인 페이지 교체 (내비게이션 시뮬레이션)
    pub fn show(&self, page: Vec<u8>) {
        *self.page.lock() = Arc::new(page);
    }

    /// 다음 획득부터 실패하도록 설정
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl ImageAcquirer for ScriptedAcquirer {
    async fn acquire(&self, scope: &DocumentScope) -> Result<RawCapture, CoreError> {
        if *self.fail.lock() {
            return Err(CoreError::Acquisition("표면 사라짐".to_string()));
        }
        let page = self.page.lock().clone();
        Ok(RawCapture {
            scope: scope.clone(),
            width: PAGE_W,
            height: PAGE_H,
            pixels: page.as_ref().clone(),
            captured_at: Utc::now(),
        })
    }
}
