//! 문서 스코프 모델.
//!
//! 열린 문서/탭 단위로 내비게이션·중복 제거 상태를 분할하는 불투명 식별자.
//! 서로 다른 문서는 절대 교차 억제되지 않는다.

use serde::{Deserialize, Serialize};

/// 문서 스코프 — 중복 인덱스와 시퀀스 카운터의 분할 키
///
/// 데스크톱 표면에서는 "프로세스 이름 + 추출된 문서 제목",
/// 브라우저 표면에서는 "URL origin + path"에서 유도된다.
/// 동등성은 정규화된 키 문자열로 판정한다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentScope {
    /// 정규화된 스코프 키
    key: String,
    /// 사람이 읽을 문서 이름 (아티팩트 폴더명 등에 사용)
    label: String,
}

/// 데스크톱 리더 창 제목에서 문서 이름을 분리하는 구분자.
/// 리더는 보통 "Document.pdf - Adobe Acrobat Reader" 형태의 제목을 보인다.
const TITLE_SEPARATORS: &[&str] = &[" - Adobe", " – Adobe", " — Adobe", " - PDF", " - Okular"];

impl DocumentScope {
    /// 데스크톱 창에서 스코프 유도 (프로세스 이름 + 창 제목)
    pub fn from_window(process: &str, window_title: &str) -> Self {
        let doc_name = Self::extract_document_name(window_title);
        Self {
            key: format!("win:{}:{}", process.to_lowercase(), doc_name.to_lowercase()),
            label: doc_name,
        }
    }

    /// 브라우저 탭에서 스코프 유도 (URL origin + path, 쿼리/프래그먼트 제외)
    pub fn from_url(url: &str, title: &str) -> Self {
        let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
        let trimmed = without_fragment
            .split_once('?')
            .map_or(without_fragment, |(head, _)| head);
        let label = if title.is_empty() {
            trimmed.to_string()
        } else {
            title.to_string()
        };
        Self {
            key: format!("url:{}", trimmed.to_lowercase()),
            label,
        }
    }

    /// 저장된 키/라벨에서 스코프 복원 (저장소 역직렬화용)
    pub fn from_parts(key: String, label: String) -> Self {
        Self { key, label }
    }

    /// 테스트/임의 스코프 생성
    pub fn named(name: &str) -> Self {
        Self {
            key: format!("named:{}", name.to_lowercase()),
            label: name.to_string(),
        }
    }

    /// 창 제목에서 문서 이름 추출
    ///
    /// 구분자가 없으면 제목 전체를 문서 이름으로 본다.
    fn extract_document_name(window_title: &str) -> String {
        for sep in TITLE_SEPARATORS {
            if let Some((doc, _)) = window_title.split_once(sep) {
                let doc = doc.trim();
                if !doc.is_empty() {
                    return doc.to_string();
                }
            }
        }
        let trimmed = window_title.trim();
        if trimmed.is_empty() {
            "Unknown Document".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// 정규화된 스코프 키
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 문서 이름 라벨
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for DocumentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}
