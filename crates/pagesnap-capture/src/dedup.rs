//! 중복 인덱스.
//!
//! (문서 스코프, 핑거프린트) → 레코드 매핑. "이 문서에서 비슷한 걸 이미
//! 캡처했는가"를 설정 가능한 거리 임계값 안에서 답한다.
//!
//! 스코프당 바운드된 인메모리 핫셋(초과 시 오래된 것부터 축출)과 내구
//! 저장소 백킹의 이중 구조다. 핫셋 선형 스캔은 바운드 덕에 상수 비용이고,
//! 오래된 페이지 대비 중복을 놓칠 확률은 무시 가능한 수준으로 교환된다.
//!
//! 동시성: check-then-insert와 시퀀스 할당은 스코프별 비동기 뮤텍스로
//! 직렬화된다. 서로 다른 스코프는 완전히 독립적으로 병렬 실행된다.
//!
//! 내구 저장소 실패는 "중복 없음"으로 강등된다 — dedup의 거짓 음성을
//! 감수하고 캡처 가용성을 지킨다.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use pagesnap_core::error::CoreError;
use pagesnap_core::models::fingerprint::Fingerprint;
use pagesnap_core::models::record::DuplicateRecord;
use pagesnap_core::models::scope::DocumentScope;
use pagesnap_core::ports::index::DuplicateStore;

/// 스코프 하나의 핫셋 + 시퀀스 카운터
///
/// `LruCache`는 조회 시 승격하지 않으므로 삽입 순서가 곧 축출 순서다
/// (가장 오래된 레코드부터 밀려난다).
struct ScopeSet {
    /// 내구 저장소에서 워밍업 완료 여부
    warmed: bool,
    /// 바운드된 핫셋
    records: LruCache<Fingerprint, DuplicateRecord>,
    /// 마지막으로 할당된 시퀀스 번호 (Saved 결과만 소비)
    sequence: u64,
}

/// 중복 인덱스 — 핫셋 + 내구 백킹
pub struct DuplicateIndex {
    store: Arc<dyn DuplicateStore>,
    hot_capacity: NonZeroUsize,
    /// 스코프 키 → 스코프 상태. 바깥 잠금은 맵 조작 동안만 잡는다.
    scopes: parking_lot::Mutex<HashMap<String, Arc<Mutex<ScopeSet>>>>,
}

/// 스코프 임계 구역 가드
///
/// 가드가 살아 있는 동안 해당 스코프의 query → persist → commit 구간이
/// 다른 요청과 직렬화된다.
pub struct ScopeGuard {
    guard: OwnedMutexGuard<ScopeSet>,
    store: Arc<dyn DuplicateStore>,
    scope: DocumentScope,
}

impl DuplicateIndex {
    /// 새 인덱스 생성
    pub fn new(store: Arc<dyn DuplicateStore>, hot_capacity: usize) -> Self {
        let hot_capacity = NonZeroUsize::new(hot_capacity.max(1)).unwrap();
        Self {
            store,
            hot_capacity,
            scopes: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// 스코프 임계 구역 진입 — 첫 진입 시 내구 저장소에서 워밍업
    pub async fn begin(&self, scope: &DocumentScope) -> ScopeGuard {
        let cell = {
            let mut scopes = self.scopes.lock();
            scopes
                .entry(scope.key().to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(ScopeSet {
                        warmed: false,
                        records: LruCache::new(self.hot_capacity),
                        sequence: 0,
                    }))
                })
                .clone()
        };

        let mut guard = cell.lock_owned().await;
        if !guard.warmed {
            self.warm(scope, &mut guard).await;
        }

        ScopeGuard {
            guard,
            store: self.store.clone(),
            scope: scope.clone(),
        }
    }

    /// 임계값 이내 레코드 조회 (단발 질의용 — 가드 없이)
    pub async fn query(
        &self,
        scope: &DocumentScope,
        fingerprint: Fingerprint,
        threshold: u32,
    ) -> Option<DuplicateRecord> {
        let mut guard = self.begin(scope).await;
        guard.query(fingerprint, threshold)
    }

    /// 레코드 삽입 (단발 삽입용 — 가드 없이)
    pub async fn insert(
        &self,
        scope: &DocumentScope,
        fingerprint: Fingerprint,
        at: DateTime<Utc>,
    ) -> DuplicateRecord {
        let mut guard = self.begin(scope).await;
        guard.commit(fingerprint, at).await
    }

    /// 스코프의 레코드 전부 삭제 — 다른 스코프에는 영향 없음
    ///
    /// 시퀀스 카운터는 유지된다: 기존 아티팩트 번호와의 충돌을 막는다.
    pub async fn clear(&self, scope: &DocumentScope) -> Result<usize, CoreError> {
        let mut guard = self.begin(scope).await;
        guard.guard.records.clear();
        let removed = self.store.clear_scope(scope).await?;
        debug!("중복 인덱스 초기화: {} ({}건 삭제)", scope, removed);
        Ok(removed)
    }

    /// 내구 저장소에서 핫셋/시퀀스 복원
    ///
    /// 저장소 실패 시 빈 핫셋으로 강등하고 캡처를 계속한다.
    async fn warm(&self, scope: &DocumentScope, set: &mut ScopeSet) {
        match self.store.last_sequence(scope).await {
            Ok(sequence) => set.sequence = sequence,
            Err(e) => warn!("시퀀스 복원 실패, 0에서 시작: {e}"),
        }

        match self.store.load_recent(scope, self.hot_capacity.get()).await {
            Ok(records) => {
                let count = records.len();
                // load_recent는 오래된 것부터 정렬 — 삽입 순서 유지
                for record in records {
                    set.records.push(record.fingerprint, record);
                }
                if count > 0 {
                    debug!("핫셋 워밍업: {} ({count}건)", scope);
                }
            }
            Err(e) => warn!("핫셋 워밍업 실패, 빈 셋으로 진행: {e}"),
        }

        set.warmed = true;
    }
}

impl ScopeGuard {
    /// 임계값 이내의 기존 레코드 조회 (가장 가까운 것)
    ///
    /// 임계값 0은 완전 일치만 잡는다.
    pub fn query(&mut self, fingerprint: Fingerprint, threshold: u32) -> Option<DuplicateRecord> {
        let mut best: Option<(u32, &DuplicateRecord)> = None;
        for (candidate, record) in self.guard.records.iter() {
            let distance = fingerprint.distance(candidate);
            if distance <= threshold && best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, record));
            }
        }
        best.map(|(distance, record)| {
            debug!(
                "중복 일치: {} 거리 {distance} (seq {})",
                self.scope, record.sequence
            );
            record.clone()
        })
    }

    /// 다음에 할당될 시퀀스 번호 (아직 소비하지 않음)
    pub fn next_sequence(&self) -> u64 {
        self.guard.sequence + 1
    }

    /// 레코드 확정 — 시퀀스 소비, 핫셋 삽입, 내구 저장소 추가
    ///
    /// 내구 추가 실패는 경고만 남긴다 (핫셋은 이미 갱신됨).
    pub async fn commit(&mut self, fingerprint: Fingerprint, at: DateTime<Utc>) -> DuplicateRecord {
        self.guard.sequence += 1;
        let record = DuplicateRecord {
            scope: self.scope.clone(),
            fingerprint,
            first_seen_at: at,
            sequence: self.guard.sequence,
        };

        self.guard.records.push(fingerprint, record.clone());

        if let Err(e) = self.store.append(&record).await {
            warn!("중복 레코드 영속화 실패 (핫셋만 유지): {e}");
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 인메모리 내구 저장소 (테스트용)
    #[derive(Default)]
    struct MemoryStore {
        rows: parking_lot::Mutex<Vec<DuplicateRecord>>,
        fail: std::sync::atomic::AtomicBool,
    }

    impl MemoryStore {
        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, std::sync::atomic::Ordering::Relaxed);
        }

        fn check(&self) -> Result<(), CoreError> {
            if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
                Err(CoreError::Index("저장소 불가".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DuplicateStore for MemoryStore {
        async fn append(&self, record: &DuplicateRecord) -> Result<(), CoreError> {
            self.check()?;
            self.rows.lock().push(record.clone());
            Ok(())
        }

        async fn load_recent(
            &self,
            scope: &DocumentScope,
            limit: usize,
        ) -> Result<Vec<DuplicateRecord>, CoreError> {
            self.check()?;
            let rows = self.rows.lock();
            let mut matching: Vec<_> = rows.iter().filter(|r| &r.scope == scope).cloned().collect();
            matching.sort_by_key(|r| r.sequence);
            let skip = matching.len().saturating_sub(limit);
            Ok(matching.into_iter().skip(skip).collect())
        }

        async fn last_sequence(&self, scope: &DocumentScope) -> Result<u64, CoreError> {
            self.check()?;
            let rows = self.rows.lock();
            Ok(rows
                .iter()
                .filter(|r| &r.scope == scope)
                .map(|r| r.sequence)
                .max()
                .unwrap_or(0))
        }

        async fn clear_scope(&self, scope: &DocumentScope) -> Result<usize, CoreError> {
            self.check()?;
            let mut rows = self.rows.lock();
            let before = rows.len();
            rows.retain(|r| &r.scope != scope);
            Ok(before - rows.len())
        }
    }

    fn make_index() -> (Arc<MemoryStore>, DuplicateIndex) {
        let store = Arc::new(MemoryStore::default());
        let index = DuplicateIndex::new(store.clone(), 8);
        (store, index)
    }

    #[tokio::test]
    async fn exact_match_at_threshold_zero() {
        let (_, index) = make_index();
        let scope = DocumentScope::named("doc-A");
        let fp = Fingerprint(0xabcd);

        assert!(index.query(&scope, fp, 0).await.is_none());
        index.insert(&scope, fp, Utc::now()).await;
        assert!(index.query(&scope, fp, 0).await.is_some());
        assert!(index.query(&scope, Fingerprint(0xabce), 0).await.is_none());
    }

    #[tokio::test]
    async fn threshold_monotonicity() {
        let (_, index) = make_index();
        let scope = DocumentScope::named("doc-A");
        index.insert(&scope, Fingerprint(0b1111), Utc::now()).await;

        // 거리 3짜리 후보
        let probe = Fingerprint(0b1000);
        for threshold in 0..64u32 {
            let hit_low = index.query(&scope, probe, threshold).await.is_some();
            let hit_high = index.query(&scope, probe, threshold + 1).await.is_some();
            // 임계값을 올려서 중복이 비중복이 되는 일은 없다
            if hit_low {
                assert!(hit_high);
            }
        }
        assert!(index.query(&scope, probe, 2).await.is_none());
        assert!(index.query(&scope, probe, 3).await.is_some());
    }

    #[tokio::test]
    async fn scope_isolation() {
        let (_, index) = make_index();
        let a = DocumentScope::named("doc-A");
        let b = DocumentScope::named("doc-B");
        let fp = Fingerprint(0x1234);

        index.insert(&a, fp, Utc::now()).await;
        assert!(index.query(&a, fp, 0).await.is_some());
        assert!(index.query(&b, fp, 0).await.is_none());

        // A 초기화는 B에 영향 없음
        index.insert(&b, fp, Utc::now()).await;
        index.clear(&a).await.unwrap();
        assert!(index.query(&a, fp, 0).await.is_none());
        assert!(index.query(&b, fp, 0).await.is_some());
    }

    #[tokio::test]
    async fn sequences_are_gap_free_per_scope() {
        let (_, index) = make_index();
        let a = DocumentScope::named("doc-A");
        let b = DocumentScope::named("doc-B");

        for i in 0..5u64 {
            let rec = index.insert(&a, Fingerprint(i), Utc::now()).await;
            assert_eq!(rec.sequence, i + 1);
        }
        let rec = index.insert(&b, Fingerprint(99), Utc::now()).await;
        assert_eq!(rec.sequence, 1);
    }

    #[tokio::test]
    async fn sequence_restored_from_durable_store() {
        let store = Arc::new(MemoryStore::default());
        {
            let index = DuplicateIndex::new(store.clone(), 8);
            let scope = DocumentScope::named("doc-A");
            index.insert(&scope, Fingerprint(1), Utc::now()).await;
            index.insert(&scope, Fingerprint(2), Utc::now()).await;
        }

        // 새 인덱스 (재시작 시뮬레이션) — 시퀀스가 이어진다
        let index = DuplicateIndex::new(store, 8);
        let scope = DocumentScope::named("doc-A");
        let rec = index.insert(&scope, Fingerprint(3), Utc::now()).await;
        assert_eq!(rec.sequence, 3);
        // 워밍업된 핫셋으로 이전 레코드도 조회된다
        assert!(index.query(&scope, Fingerprint(1), 0).await.is_some());
    }

    #[tokio::test]
    async fn hot_set_evicts_oldest_first() {
        let store = Arc::new(MemoryStore::default());
        let index = DuplicateIndex::new(store, 3);
        let scope = DocumentScope::named("doc-A");

        // 서로 충분히 먼 핑거프린트 4개 → 첫 번째가 축출된다
        let fps = [
            Fingerprint(0x0000_0000_0000_00ff),
            Fingerprint(0x0000_0000_00ff_0000),
            Fingerprint(0x0000_00ff_0000_0000),
            Fingerprint(0xff00_0000_0000_0000),
        ];
        for fp in fps {
            index.insert(&scope, fp, Utc::now()).await;
        }

        assert!(index.query(&scope, fps[0], 0).await.is_none());
        assert!(index.query(&scope, fps[1], 0).await.is_some());
        assert!(index.query(&scope, fps[3], 0).await.is_some());
    }

    #[tokio::test]
    async fn degraded_store_does_not_block_captures() {
        let (store, index) = make_index();
        store.set_failing(true);
        let scope = DocumentScope::named("doc-A");

        // 워밍업/영속화가 다 실패해도 삽입·조회는 동작한다
        let rec = index.insert(&scope, Fingerprint(7), Utc::now()).await;
        assert_eq!(rec.sequence, 1);
        assert!(index.query(&scope, Fingerprint(7), 0).await.is_some());
    }

    #[tokio::test]
    async fn concurrent_same_scope_serializes() {
        let (_, index) = make_index();
        let index = Arc::new(index);
        let scope = DocumentScope::named("doc-A");

        let mut handles = Vec::new();
        for i in 0..16u64 {
            let index = index.clone();
            let scope = scope.clone();
            handles.push(tokio::spawn(async move {
                index.insert(&scope, Fingerprint(i << 8), Utc::now()).await
            }));
        }

        let mut sequences: Vec<u64> = Vec::new();
        for handle in handles {
            sequences.push(handle.await.unwrap().sequence);
        }
        sequences.sort_unstable();
        let expected: Vec<u64> = (1..=16).collect();
        assert_eq!(sequences, expected);
    }
}
