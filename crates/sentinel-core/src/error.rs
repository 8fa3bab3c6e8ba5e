//! 리스크 엔진의 에러 타입.
//!
//! 이 모듈은 리스크 엔진 전반에서 사용되는 에러 타입을 정의합니다.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::providers::ProviderError;

/// 핵심 리스크 엔진 에러.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// 유효하지 않은 가격 (0 이하 또는 라운딩 후 0 이하)
    #[error("유효하지 않은 가격: {value}")]
    InvalidPrice { value: Decimal },

    /// 유효하지 않은 호가 단위
    #[error("유효하지 않은 호가 단위: {tick}")]
    InvalidTick { tick: Decimal },

    /// 유효하지 않은 퍼센트 값 (strict 모드에서 0~100 범위 초과)
    #[error("유효하지 않은 퍼센트 값: {value}")]
    InvalidPercent { value: Decimal },

    /// 유효하지 않은 가격 범위 (from >= to)
    #[error("유효하지 않은 가격 범위: {from} ~ {to}")]
    InvalidRange { from: Decimal, to: Decimal },

    /// 심볼 불일치
    #[error("심볼 불일치: 기대값 {expected}, 실제값 {actual}")]
    SymbolMismatch { expected: String, actual: String },

    /// 필수 설정 누락
    #[error("필수 설정을 찾을 수 없음: {key}")]
    MissingSetting { key: String },

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 포지션 에러
    #[error("포지션 에러: {0}")]
    Position(String),

    /// 외부 제공자 에러
    #[error("제공자 에러: {0}")]
    Provider(#[from] ProviderError),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 리스크 엔진 작업을 위한 Result 타입.
pub type SentinelResult<T> = Result<T, SentinelError>;

impl SentinelError {
    /// 호출자 계약 위반 에러인지 확인합니다.
    ///
    /// 계약 위반은 복구 대상이 아니며 호출 측 버그를 의미합니다.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SentinelError::InvalidPrice { .. }
                | SentinelError::InvalidTick { .. }
                | SentinelError::InvalidPercent { .. }
                | SentinelError::InvalidRange { .. }
                | SentinelError::SymbolMismatch { .. }
        )
    }

    /// 설정 관련 에러인지 확인합니다.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SentinelError::MissingSetting { .. } | SentinelError::Config(_)
        )
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(err: serde_json::Error) -> Self {
        SentinelError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for SentinelError {
    fn from(err: config::ConfigError) -> Self {
        SentinelError::Config(err.to_string())
    }
}
