//! # pagesnap-app
//!
//! PAGESNAP 에이전트 바이너리 진입점.
//! DI 컨테이너 역할, 라이프사이클 관리, 캡처 런타임 오케스트레이션.
//!
//! 문서 리딩 표면(데스크톱 리더 창 / 브라우저 탭)의 내비게이션을 감시해
//! 페이지 이미지를 자동으로, 중복 없이, 순서대로 저장한다.

mod event_bus;
mod lifecycle;
mod stats;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use directories::UserDirs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use pagesnap_capture::control::CaptureControl;
use pagesnap_capture::dedup::DuplicateIndex;
use pagesnap_capture::orchestrator::CaptureOrchestrator;
use pagesnap_capture::runtime::CaptureRuntime;
use pagesnap_capture::trigger::DebounceTrigger;
use pagesnap_core::config::AppConfig;
use pagesnap_core::config_manager::ConfigManager;
use pagesnap_core::models::outcome::CaptureOutcome;
use pagesnap_core::models::signal::NavKey;
use pagesnap_core::ports::monitor::SurfaceMonitor;
use pagesnap_monitor::bridge::BrowserBridge;
use pagesnap_monitor::desktop::DesktopSurface;
use pagesnap_storage::artifacts::PageFileStorage;
use pagesnap_storage::sqlite::SqliteDuplicateStore;
use pagesnap_vision::capture::XcapAcquirer;
use pagesnap_vision::hash::PerceptualHasher;

use crate::event_bus::{AppEvent, EventBus};
use crate::lifecycle::LifecycleManager;
use crate::stats::SessionStatsRecorder;

/// 감시 표면 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SurfaceKind {
    /// 데스크톱 리더 창 (xcap 폴링 + 신호 핸들)
    Desktop,
    /// 브라우저 확장 브리지 (stdin 네이티브 메시징)
    Bridge,
}

/// PAGESNAP 데스크톱 에이전트
///
/// 문서 내비게이션 추적 기반 자동 페이지 캡처 + 지각 해시 중복 제거
#[derive(Parser, Debug)]
#[command(name = "pagesnap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 감시 표면 (desktop: 리더 창 / bridge: 브라우저 확장)
    #[arg(long, short = 's', value_enum, default_value = "desktop")]
    surface: SurfaceKind,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 데이터 디렉토리 (인덱스 DB 위치, 기본: 플랫폼 데이터 디렉토리)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 페이지 이미지 저장 폴더 (기본: 문서 폴더/PageSnap)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// settle 지연 (밀리초)
    #[arg(long)]
    settle_delay: Option<u64>,

    /// 유사도 임계값 (해밍 거리, 0..=64)
    #[arg(long)]
    threshold: Option<u32>,

    /// 중복 감지 비활성화
    #[arg(long)]
    no_dedup: bool,

    /// 자동 캡처 꺼진 상태로 시작
    #[arg(long)]
    start_disabled: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .init();

    info!("PAGESNAP 시작 (표면: {:?})", args.surface);

    // ============================================================
    // 설정 로드 + CLI 오버라이드 (오버라이드는 파일에 저장하지 않는다)
    // ============================================================
    let config_manager = ConfigManager::new().context("설정 로드 실패")?;
    let mut config = config_manager.get();
    apply_overrides(&mut config, &args);
    config.sanitize();

    let data_dir = match config.storage.data_dir.clone() {
        Some(dir) => dir,
        None => ConfigManager::data_dir().context("데이터 디렉토리 결정 실패")?,
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("데이터 디렉토리 생성 실패: {}", data_dir.display()))?;

    let save_dir = resolve_save_dir(&config, &data_dir);
    info!(
        "저장 경로: {} / 인덱스: {}",
        save_dir.display(),
        data_dir.display()
    );

    // ============================================================
    // 어댑터 와이어링 (Arc<dyn Port>)
    // ============================================================
    let duplicate_store = Arc::new(
        SqliteDuplicateStore::open(&data_dir.join("index.db")).context("중복 인덱스 열기 실패")?,
    );
    let artifacts = Arc::new(
        PageFileStorage::new(save_dir, config.storage.retention_days)
            .await
            .context("페이지 저장소 초기화 실패")?,
    );

    // 시작 시 보존 정책 1회 적용
    if let Err(e) = artifacts.enforce_retention().await {
        warn!("보존 정책 적용 실패: {e}");
    }

    let control = Arc::new(CaptureControl::from_config(&config));
    let index = Arc::new(DuplicateIndex::new(
        duplicate_store,
        config.dedup.hot_set_capacity,
    ));
    let orchestrator = Arc::new(CaptureOrchestrator::new(
        control.clone(),
        Arc::new(XcapAcquirer::new()),
        Arc::new(PerceptualHasher::new(config.dedup.hash_algorithm)),
        index,
        artifacts,
    ));

    let recorder = Arc::new(SessionStatsRecorder::new());
    let trigger = DebounceTrigger::new(control.clone(), config.capture.settle_delay_ms);
    let runtime = CaptureRuntime::new(trigger, orchestrator.clone(), recorder.clone());

    let bus = Arc::new(EventBus::default());
    let lifecycle = LifecycleManager::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    // ============================================================
    // 결과 스트림 중계 (런타임 → 이벤트 버스 + 로그)
    // ============================================================
    let mut outcome_rx = runtime.subscribe();
    {
        let bus = bus.clone();
        let mut shutdown = lifecycle.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = outcome_rx.recv() => {
                        let Ok(event) = event else { break };
                        log_outcome(&event.scope.to_string(), &event.outcome);
                        if let CaptureOutcome::Failed { reason } = &event.outcome {
                            bus.publish(AppEvent::Error(format!("{reason:?}")));
                        }
                        bus.publish(AppEvent::OutcomeReady {
                            scope: event.scope,
                            outcome: event.outcome,
                        });
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    // ============================================================
    // 표면 모니터 기동
    // ============================================================
    match args.surface {
        SurfaceKind::Desktop => {
            let surface = Arc::new(DesktopSurface::new(&config.monitor, events_tx.clone()));
            let handle = surface.handle();

            let shutdown = lifecycle.subscribe();
            let poll_surface = surface.clone();
            tokio::spawn(async move { poll_surface.run(shutdown).await });

            // OS 전역 키 훅이 붙는 자리 — 기본 빌드는 stdin 커맨드로 구동
            // (n: 다음 페이지, p: 이전 페이지, c: 수동 캡처, r: 현재 문서 dedup 초기화)
            let index = orchestrator.index().clone();
            let scope_surface = surface.clone();
            tokio::spawn(async move {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                let mut lines = stdin.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    match line.trim() {
                        "n" | "next" | "" => handle.key(NavKey::PageDown),
                        "p" | "prev" => handle.key(NavKey::PageUp),
                        "c" | "capture" => handle.manual(),
                        "r" | "reset" => {
                            let Ok(Some(scope)) = scope_surface.current_scope().await else {
                                warn!("초기화할 문서 표면 없음");
                                continue;
                            };
                            match index.clear(&scope).await {
                                Ok(removed) => info!("중복 감지 초기화: {scope} ({removed}건)"),
                                Err(e) => warn!("중복 감지 초기화 실패: {e}"),
                            }
                        }
                        other => debug!("알 수 없는 커맨드: {other}"),
                    }
                }
            });
        }
        SurfaceKind::Bridge => {
            let bridge = Arc::new(BrowserBridge::new(events_tx.clone()));

            // 확장 네이티브 메시징: stdin에서 JSON 한 줄씩
            tokio::spawn(async move {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                let mut lines = stdin.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = bridge.handle_json(&line) {
                        warn!("브리지 메시지 파싱 실패: {e}");
                    }
                }
            });
        }
    }

    // ============================================================
    // 캡처 런타임 기동 + 종료 대기
    // ============================================================
    let runtime_shutdown = lifecycle.subscribe();
    let runtime_task = tokio::spawn(runtime.run(events_rx, runtime_shutdown));

    lifecycle.wait_for_signal().await;

    if let Err(e) = runtime_task.await {
        warn!("런타임 태스크 종료 오류: {e}");
    }
    recorder.log_summary();
    info!("PAGESNAP 종료");

    Ok(())
}

/// CLI 인자를 설정 스냅샷에 반영
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.save_dir {
        config.storage.save_dir = Some(dir.clone());
    }
    if let Some(delay) = args.settle_delay {
        config.capture.settle_delay_ms = delay;
    }
    if let Some(threshold) = args.threshold {
        config.dedup.similarity_threshold = threshold;
    }
    if args.no_dedup {
        config.dedup.enabled = false;
    }
    if args.start_disabled {
        config.capture.enabled = false;
    }
}

/// 페이지 저장 폴더 결정 — 설정 > 문서 폴더 > 데이터 디렉토리
fn resolve_save_dir(config: &AppConfig, data_dir: &std::path::Path) -> PathBuf {
    if let Some(dir) = &config.storage.save_dir {
        return dir.clone();
    }
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|d| d.join("PageSnap")))
        .unwrap_or_else(|| data_dir.join("PageSnap"))
}

/// 결과 한 건 로그
fn log_outcome(scope: &str, outcome: &CaptureOutcome) {
    match outcome {
        CaptureOutcome::Saved { artifact, sequence } => {
            info!(
                "저장: {scope} seq {sequence} → {}",
                artifact.path.display()
            );
        }
        CaptureOutcome::SkippedDuplicate { matched } => {
            debug!("중복 생략: {scope} (기존 seq {})", matched.sequence);
        }
        CaptureOutcome::SkippedDisabled => {
            debug!("비활성 생략: {scope}");
        }
        CaptureOutcome::Failed { reason } => {
            warn!("캡처 실패: {scope}: {reason:?}");
        }
    }
}
