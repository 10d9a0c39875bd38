//! 중복 레코드 스토리지 메서드.
//!
//! `DuplicateStore` 포트 구현. 핑거프린트는 u64 ↔ i64 비트 캐스트로
//! 저장한다 (SQLite INTEGER는 부호 있는 64비트).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use pagesnap_core::error::CoreError;
use pagesnap_core::models::fingerprint::Fingerprint;
use pagesnap_core::models::record::DuplicateRecord;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::index::DuplicateStore;

use super::SqliteDuplicateStore;

#[async_trait]
impl DuplicateStore for SqliteDuplicateStore {
    async fn append(&self, record: &DuplicateRecord) -> Result<(), CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Index(format!("잠금 획득 실패: {e}")))?;

        conn.execute(
            "INSERT INTO duplicate_records (scope_key, scope_label, fingerprint, first_seen_at, sequence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                record.scope.key(),
                record.scope.label(),
                record.fingerprint.0 as i64,
                record.first_seen_at.to_rfc3339(),
                record.sequence as i64,
            ],
        )
        .map_err(|e| CoreError::Index(format!("레코드 저장 실패: {e}")))?;

        conn.execute(
            "INSERT INTO scope_sequences (scope_key, last_sequence) VALUES (?1, ?2)
             ON CONFLICT(scope_key) DO UPDATE SET last_sequence = MAX(last_sequence, excluded.last_sequence)",
            rusqlite::params![record.scope.key(), record.sequence as i64],
        )
        .map_err(|e| CoreError::Index(format!("시퀀스 갱신 실패: {e}")))?;

        debug!(
            "중복 레코드 저장: {} seq {} fp {}",
            record.scope, record.sequence, record.fingerprint
        );

        Ok(())
    }

    async fn load_recent(
        &self,
        scope: &DocumentScope,
        limit: usize,
    ) -> Result<Vec<DuplicateRecord>, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Index(format!("잠금 획득 실패: {e}")))?;

        let mut stmt = conn
            .prepare(
                "SELECT scope_key, scope_label, fingerprint, first_seen_at, sequence
                 FROM duplicate_records
                 WHERE scope_key = ?1
                 ORDER BY sequence DESC
                 LIMIT ?2",
            )
            .map_err(|e| CoreError::Index(format!("쿼리 준비 실패: {e}")))?;

        let mut records: Vec<DuplicateRecord> = stmt
            .query_map(rusqlite::params![scope.key(), limit as i64], |row| {
                let key: String = row.get(0)?;
                let label: String = row.get(1)?;
                let fingerprint: i64 = row.get(2)?;
                let first_seen_at: String = row.get(3)?;
                let sequence: i64 = row.get(4)?;
                Ok(DuplicateRecord {
                    scope: DocumentScope::from_parts(key, label),
                    fingerprint: Fingerprint(fingerprint as u64),
                    first_seen_at: parse_timestamp(&first_seen_at),
                    sequence: sequence as u64,
                })
            })
            .map_err(|e| CoreError::Index(format!("쿼리 실행 실패: {e}")))?
            .filter_map(|r| r.ok())
            .collect();

        // 워밍업 삽입 순서 보존을 위해 오래된 것부터 정렬
        records.reverse();
        Ok(records)
    }

    async fn last_sequence(&self, scope: &DocumentScope) -> Result<u64, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Index(format!("잠금 획득 실패: {e}")))?;

        let sequence: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(last_sequence), 0) FROM scope_sequences WHERE scope_key = ?1",
                rusqlite::params![scope.key()],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Index(format!("시퀀스 조회 실패: {e}")))?;

        Ok(sequence as u64)
    }

    async fn clear_scope(&self, scope: &DocumentScope) -> Result<usize, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Index(format!("잠금 획득 실패: {e}")))?;

        // scope_sequences는 남긴다 — 시퀀스 번호는 계속 이어진다
        let removed = conn
            .execute(
                "DELETE FROM duplicate_records WHERE scope_key = ?1",
                rusqlite::params![scope.key()],
            )
            .map_err(|e| CoreError::Index(format!("레코드 삭제 실패: {e}")))?;

        debug!("스코프 초기화: {} ({removed}건)", scope);
        Ok(removed)
    }
}

/// RFC3339 타임스탬프 파싱 (파싱 불가 시 epoch)
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default())
}
