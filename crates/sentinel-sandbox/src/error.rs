//! 샌드박스 에러 타입.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use sentinel_core::{ProviderError, SentinelError};

/// 샌드박스 시뮬레이션 에러.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// 가용 잔고 부족. 정책에 따라 무시될 수 있는 유일한 에러입니다.
    #[error("가용 잔고 부족: 필요 {required}, 가용 {available}")]
    InsufficientAvailableBalance {
        required: Decimal,
        available: Decimal,
    },

    /// 스톱 주문 대상 포지션 없음
    #[error("포지션을 찾을 수 없음: {symbol} {side}")]
    PositionNotFound { symbol: String, side: String },

    /// 협력자 호출 중 예기치 못한 실패. 실패한 주문의 위치와 ID를
    /// 함께 보고합니다.
    #[error("주문 처리 중 예기치 못한 실패 (순번 {order_index}, 주문 {order_id}): {source}")]
    UnexpectedExecution {
        order_index: usize,
        order_id: Uuid,
        #[source]
        source: ProviderError,
    },

    /// 핵심 크레이트 에러
    #[error(transparent)]
    Core(#[from] SentinelError),
}

/// 샌드박스 작업을 위한 Result 타입.
pub type SandboxResult<T> = Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = SandboxError::InsufficientAvailableBalance {
            required: dec!(100),
            available: dec!(40),
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("40"));
    }

    #[test]
    fn test_unexpected_execution_carries_order_context() {
        let id = Uuid::new_v4();
        let err = SandboxError::UnexpectedExecution {
            order_index: 2,
            order_id: id,
            source: ProviderError::Network("timeout".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("순번 2"));
        assert!(text.contains(&id.to_string()));
    }
}
