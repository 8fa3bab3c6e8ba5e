//! 주문 안전성 검증.
//!
//! 주문을 거래소에 내보내기 전에 실행되는 검증 모듈입니다:
//! - `TradingCheck` - 개별 검증이 구현하는 트레이트
//! - `CheckOutcome` - 통과/실패와 설명을 담는 결과
//! - `CheckFailure` - 실패 사유의 닫힌 열거형
//!
//! 각 검증은 거래소 상태를 읽기만 하며, 같은 입력으로 다시 실행하면
//! 같은 결과를 냅니다.

mod average_price;
mod balance;
mod buy_liquidation;
mod fixation;
mod stop_main_liquidation;

pub use average_price::AveragePriceDistanceCheck;
pub use balance::AvailableBalanceCheck;
pub use buy_liquidation::BuyLiquidationCheck;
pub use fixation::FixationStopsCheck;
pub use stop_main_liquidation::StopMainLiquidationCheck;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sentinel_core::{PlannedOrder, SentinelError, SentinelResult};
use sentinel_sandbox::SandboxError;
use serde::{Deserialize, Serialize};

use crate::context::TradingCheckContext;

/// 샌드박스 재생 실패를 검증 에러로 변환합니다.
///
/// 검증의 가상 재생에서 나온 샌드박스 고유 에러는 검증 실패가 아니라
/// 내부 에러로 취급합니다.
pub(crate) fn sandbox_failure(err: SandboxError) -> SentinelError {
    match err {
        SandboxError::Core(inner) => inner,
        other => SentinelError::Internal(other.to_string()),
    }
}

/// 주문 검증 한 건의 인터페이스.
///
/// `supports`가 `false`를 반환하면 해당 주문에 대해 `check`는 호출되지
/// 않고 건너뜀으로 기록됩니다.
#[async_trait]
pub trait TradingCheck: Send + Sync {
    /// 로그와 리포트에 쓰이는 검증 이름.
    fn name(&self) -> &str;

    /// 이 검증이 주어진 주문에 적용되는지 판단합니다.
    async fn supports(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<bool>;

    /// 검증을 수행합니다.
    async fn check(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<CheckOutcome>;
}

/// 검증 실패 사유.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckFailure {
    /// 가용 잔고가 0 이하
    InsufficientContractBalance {
        /// 계산된 가용 잔고
        available: Decimal,
    },
    /// 매수 체결 후 청산가가 안전 거리 안으로 들어옴
    FurtherPositionLiquidationAfterBuyIsTooClose {
        /// 측정된 청산가와 기준점 사이 거리
        delta: Decimal,
        /// 설정된 안전 거리
        safe_distance: Decimal,
    },
    /// 스톱 체결 후 주 포지션 청산가가 안전 거리 안으로 들어옴
    MainPositionLiquidationAfterStopIsTooClose {
        /// 측정된 청산가와 기준점 사이 거리
        delta: Decimal,
        /// 설정된 안전 거리
        safe_distance: Decimal,
    },
    /// 주문 가격이 평균 진입가에서 허용 범위 이상 벗어남
    EntryPriceDistanceExceeded {
        /// 진입가 대비 이탈 비율(%)
        distance_percent: Decimal,
        /// 허용 비율(%)
        allowed_percent: Decimal,
    },
    /// 진입가와 시세 사이에 놓인 이익 고정 스톱 발견
    FixationsFound {
        /// 발견된 스톱 수
        count: usize,
    },
}

/// 검증 한 건의 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// 통과 여부
    pub passed: bool,
    /// 실패 시 사유
    pub failure: Option<CheckFailure>,
    /// 사람이 읽는 설명
    pub info: String,
}

impl CheckOutcome {
    /// 통과 결과를 만듭니다.
    pub fn pass(info: impl Into<String>) -> Self {
        Self {
            passed: true,
            failure: None,
            info: info.into(),
        }
    }

    /// 실패 결과를 만듭니다.
    pub fn fail(failure: CheckFailure, info: impl Into<String>) -> Self {
        Self {
            passed: false,
            failure: Some(failure),
            info: info.into(),
        }
    }
}
