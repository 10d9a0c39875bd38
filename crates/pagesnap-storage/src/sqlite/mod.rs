//! SQLite 저장소 어댑터.
//!
//! `DuplicateStore` 포트 구현 — 중복 인덱스의 내구 백킹.
//!
//! # 모듈 구조
//! - `records`: 중복 레코드 저장/조회/삭제, 스코프 시퀀스 카운터

mod records;

use pagesnap_core::error::CoreError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::migration;

/// SQLite 중복 레코드 저장소 — `DuplicateStore` 포트 구현
pub struct SqliteDuplicateStore {
    pub(super) conn: Mutex<Connection>,
}

impl SqliteDuplicateStore {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)
            .map_err(|e| CoreError::Index(format!("SQLite 열기 실패: {e}")))?;

        // 성능 최적화 PRAGMA 설정
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA cache_size=4000;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(|e| CoreError::Index(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Index(format!("마이그레이션 실패: {e}")))?;

        info!("중복 인덱스 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Index(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Index(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}
