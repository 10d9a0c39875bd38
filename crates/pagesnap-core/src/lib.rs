//! # pagesnap-core
//!
//! PAGESNAP 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 캡처 엔진과 어댑터 crate들이 공유하는 핵심 타입을 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (스코프, 신호, 요청, 핑거프린트, 결과)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체
//! - [`config_manager`] — 설정 파일 관리 (로드/저장)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
