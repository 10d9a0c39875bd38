//! 애플리케이션 설정 구조체.
//!
//! 캡처 디바운스, 중복 제거, 저장소 경로, 표면 모니터링 등
//! 런타임 설정을 정의한다. JSON 파일에서 `ConfigManager`로 로드.
//!
//! `dedup.enabled`와 `dedup.similarity_threshold` 변경은 다음
//! CaptureRequest부터 적용된다 — 이미 영속화된 중복 레코드를
//! 재평가하지 않는다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::fingerprint::{HashAlgorithm, FINGERPRINT_BITS};

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 캡처 트리거/오케스트레이터 설정
    pub capture: CaptureConfig,
    /// 중복 제거 설정
    #[serde(default)]
    pub dedup: DedupConfig,
    /// 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 표면 모니터링 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
}

// ============================================================
// 캡처 설정
// ============================================================

/// 캡처 설정 — 디바운스와 획득 타임아웃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 자동 캡처 활성화 여부 (신호 수신 시점에 동기적으로 검사)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// settle 지연 (밀리초) — 마지막 내비게이션 신호 후 캡처까지 대기.
    /// 지배적 튜너블: 너무 짧으면 반렌더링 프레임, 너무 길면 둔한 반응.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// 이미지 획득 타임아웃 (밀리초)
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settle_delay_ms: default_settle_delay_ms(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

// ============================================================
// 중복 제거 설정
// ============================================================

/// 중복 제거 설정 — 유사도 임계값과 핫셋 바운드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// 중복 감지 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 유사도 임계값 (해밍 거리, 0..=64; 0 = 완전 일치만)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: u32,
    /// 스코프당 인메모리 핫셋 최대 레코드 수 (초과 시 오래된 것부터 축출)
    #[serde(default = "default_hot_set_capacity")]
    pub hot_set_capacity: usize,
    /// 지각 해시 알고리즘
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: default_similarity_threshold(),
            hot_set_capacity: default_hot_set_capacity(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 저장소 설정 — 인덱스 DB와 페이지 아티팩트 폴더
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 데이터 디렉토리 (인덱스 DB 위치, None이면 플랫폼 기본값)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// 페이지 이미지 저장 폴더 (None이면 문서 폴더 하위 PageSnap)
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
    /// 아티팩트 보존 기간 (일, 0 = 무기한 보존)
    #[serde(default)]
    pub retention_days: u32,
}

#[allow(clippy::derivable_impls)]
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            save_dir: None,
            retention_days: 0,
        }
    }
}

// ============================================================
// 표면 모니터링 설정
// ============================================================

/// 표면 모니터링 설정 — 리더 창 인식과 폴링 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 리더 창 제목 마커 (부분 일치)
    #[serde(default = "default_reader_titles")]
    pub reader_titles: Vec<String>,
    /// 활성 창 폴링 간격 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reader_titles: default_reader_titles(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            capture: CaptureConfig::default(),
            dedup: DedupConfig::default(),
            storage: StorageConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }

    /// 범위를 벗어난 값 정규화 (로드/업데이트 직후 호출)
    ///
    /// 임계값은 핑거프린트 비트 수를 넘을 수 없다.
    pub fn sanitize(&mut self) {
        if self.dedup.similarity_threshold > FINGERPRINT_BITS {
            self.dedup.similarity_threshold = FINGERPRINT_BITS;
        }
        if self.dedup.hot_set_capacity == 0 {
            self.dedup.hot_set_capacity = default_hot_set_capacity();
        }
        if self.capture.settle_delay_ms == 0 {
            self.capture.settle_delay_ms = default_settle_delay_ms();
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn default_true() -> bool {
    true
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_acquire_timeout_ms() -> u64 {
    2_000
}

fn default_similarity_threshold() -> u32 {
    5
}

fn default_hot_set_capacity() -> usize {
    512
}

fn default_reader_titles() -> Vec<String> {
    vec![
        "Adobe Acrobat".to_string(),
        "Adobe Reader".to_string(),
        "Acrobat Reader".to_string(),
        "Foxit".to_string(),
        "Okular".to_string(),
        "Evince".to_string(),
        "Preview".to_string(),
    ]
}

fn default_poll_interval_ms() -> u64 {
    500
}
