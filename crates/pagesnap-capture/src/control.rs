//! 캡처 제어 핸들.
//!
//! 전역 가변 "enabled" 플래그를 암묵적 전역 상태가 아니라 생성 시점에
//! 주입되는 명시적 핸들로 모델링한다. 모든 읽기는 정해진 체크포인트에서만
//! 일어난다: 신호 수신 시점(트리거), 요청 처리 시작 시점(오케스트레이터).

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use pagesnap_core::config::AppConfig;
use pagesnap_core::models::fingerprint::FINGERPRINT_BITS;
use tracing::info;

/// 캡처 파이프라인 런타임 제어 — 스레드 안전 세터/게터
///
/// 중복 감지 토글과 임계값 변경은 다음 CaptureRequest부터 적용된다.
/// 이미 영속화된 레코드는 재평가하지 않는다.
#[derive(Debug)]
pub struct CaptureControl {
    /// 자동 캡처 활성화
    enabled: AtomicBool,
    /// 중복 감지 활성화
    dedup_enabled: AtomicBool,
    /// 유사도 임계값 (해밍 거리)
    threshold: AtomicU32,
    /// 이미지 획득 타임아웃 (밀리초)
    acquire_timeout_ms: AtomicU64,
}

impl CaptureControl {
    /// 설정 스냅샷으로 제어 핸들 생성
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.capture.enabled),
            dedup_enabled: AtomicBool::new(config.dedup.enabled),
            threshold: AtomicU32::new(config.dedup.similarity_threshold.min(FINGERPRINT_BITS)),
            acquire_timeout_ms: AtomicU64::new(config.capture.acquire_timeout_ms),
        }
    }

    /// 자동 캡처 활성화 여부 (신호 수신/요청 처리 체크포인트에서 호출)
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// 자동 캡처 토글
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        info!("자동 캡처 {}", if enabled { "활성화" } else { "비활성화" });
    }

    /// 중복 감지 활성화 여부
    pub fn dedup_enabled(&self) -> bool {
        self.dedup_enabled.load(Ordering::Relaxed)
    }

    /// 중복 감지 토글
    pub fn set_dedup_enabled(&self, enabled: bool) {
        self.dedup_enabled.store(enabled, Ordering::Relaxed);
    }

    /// 현재 유사도 임계값
    pub fn threshold(&self) -> u32 {
        self.threshold.load(Ordering::Relaxed)
    }

    /// 유사도 임계값 변경 (0..=64로 클램프)
    pub fn set_threshold(&self, threshold: u32) {
        self.threshold
            .store(threshold.min(FINGERPRINT_BITS), Ordering::Relaxed);
    }

    /// 이미지 획득 타임아웃 (밀리초)
    pub fn acquire_timeout_ms(&self) -> u64 {
        self.acquire_timeout_ms.load(Ordering::Relaxed)
    }

    /// 이미지 획득 타임아웃 변경
    pub fn set_acquire_timeout_ms(&self, timeout_ms: u64) {
        self.acquire_timeout_ms.store(timeout_ms, Ordering::Relaxed);
    }

    /// 설정 변경 반영 (ConfigManager 업데이트 후 호출)
    pub fn apply(&self, config: &AppConfig) {
        self.enabled.store(config.capture.enabled, Ordering::Relaxed);
        self.dedup_enabled
            .store(config.dedup.enabled, Ordering::Relaxed);
        self.set_threshold(config.dedup.similarity_threshold);
        self.acquire_timeout_ms
            .store(config.capture.acquire_timeout_ms, Ordering::Relaxed);
    }
}
