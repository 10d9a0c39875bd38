//! 스키마 마이그레이션.
//!
//! 버전 기반 SQLite 스키마 관리.

use rusqlite::Connection;
use tracing::{debug, info};

/// 현재 스키마 버전
const CURRENT_VERSION: u32 = 2;

/// 스키마 마이그레이션 실행
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = get_version(conn)?;
    info!("현재 스키마 버전: {current}, 목표: {CURRENT_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }

    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// 현재 스키마 버전 조회
fn get_version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    let result: Result<u32, _> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );
    result.or(Ok(0))
}

/// V1: duplicate_records 테이블 생성
fn migrate_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V1 실행: duplicate_records 테이블");

    conn.execute_batch(
        "
        -- 중복 레코드 테이블 (수락된 캡처당 한 건)
        CREATE TABLE IF NOT EXISTS duplicate_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope_key TEXT NOT NULL,
            scope_label TEXT NOT NULL,
            fingerprint INTEGER NOT NULL,
            first_seen_at TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_duplicate_records_scope ON duplicate_records(scope_key);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_duplicate_records_scope_seq
            ON duplicate_records(scope_key, sequence);

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
}

/// V2: scope_sequences 테이블 — clear 후에도 시퀀스 카운터 유지
fn migrate_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    debug!("마이그레이션 V2 실행: scope_sequences 테이블");

    conn.execute_batch(
        "
        -- 스코프별 마지막 시퀀스 번호 (레코드 삭제와 독립적)
        CREATE TABLE IF NOT EXISTS scope_sequences (
            scope_key TEXT PRIMARY KEY,
            last_sequence INTEGER NOT NULL DEFAULT 0
        );

        -- 기존 레코드에서 카운터 백필
        INSERT OR REPLACE INTO scope_sequences (scope_key, last_sequence)
            SELECT scope_key, MAX(sequence) FROM duplicate_records GROUP BY scope_key;

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )
}
