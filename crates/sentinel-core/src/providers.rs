//! 외부 협력자 인터페이스.
//!
//! 청산가 추정기, 주문 비용 계산기, 포지션/스톱 주문 조회를 위한
//! 거래소 중립적인 인터페이스를 제공합니다. 리스크 엔진 핵심은 이
//! trait들만 알며, 거래소별 구현은 외부 크레이트가 제공합니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{PlacedStop, PlannedOrder, Position, PositionSide};
use crate::types::{Price, RoundMethod, Symbol};

// =============================================================================
// 에러 타입
// =============================================================================

/// 외부 제공자 에러.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 인증 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// API 에러
    #[error("API 에러: {0}")]
    Api(String),

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 지원하지 않는 기능
    #[error("지원하지 않는 기능: {0}")]
    Unsupported(String),

    /// 기타 에러
    #[error("기타 에러: {0}")]
    Other(String),
}

// =============================================================================
// 계좌 잔고
// =============================================================================

/// 계좌 잔고 스냅샷.
#[derive(Debug, Clone)]
pub struct AccountBalance {
    /// 사용 가능 잔고
    pub free: Decimal,
    /// 총 잔고
    pub total: Decimal,
}

// =============================================================================
// 협력자 trait
// =============================================================================

/// 청산가 추정기.
///
/// 가상의 포지션과 가용 잔고로부터 예상 청산가를 계산합니다.
/// 샌드박스가 체결 시뮬레이션 후 청산가를 재산출할 때 사용합니다.
pub trait LiquidationEstimator: Send + Sync {
    /// 포지션과 가용 잔고에 대한 예상 청산가를 반환합니다.
    fn estimate(&self, position: &Position, free_balance: Decimal) -> Result<Price, ProviderError>;
}

/// 주문 비용 계산기.
///
/// 거래소별 수수료/증거금 모델을 캡슐화합니다.
pub trait OrderCostCalculator: Send + Sync {
    /// 매수 주문의 총비용(증거금 + 수수료)을 반환합니다.
    fn total_buy_cost(&self, order: &PlannedOrder) -> Result<Decimal, ProviderError>;

    /// 주문 증거금을 반환합니다.
    fn order_margin(&self, order: &PlannedOrder) -> Result<Decimal, ProviderError>;
}

/// 포지션/잔고 조회 제공자.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// 심볼과 방향에 해당하는 현재 포지션을 조회합니다.
    ///
    /// # Returns
    ///
    /// 포지션이 없으면 `None`.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Network`: 네트워크 연결 실패
    /// - `ProviderError::Authentication`: 인증 실패
    /// - `ProviderError::Api`: 거래소 API 에러
    async fn fetch_position(
        &self,
        symbol: &Symbol,
        side: PositionSide,
    ) -> Result<Option<Position>, ProviderError>;

    /// 계좌 잔고를 조회합니다.
    async fn fetch_balance(&self) -> Result<AccountBalance, ProviderError>;
}

/// 등록된 스톱 주문 조회 제공자.
#[async_trait]
pub trait StopOrderProvider: Send + Sync {
    /// 심볼과 방향에 등록된 스톱 주문 목록을 조회합니다.
    async fn fetch_stops(
        &self,
        symbol: &Symbol,
        side: PositionSide,
    ) -> Result<Vec<PlacedStop>, ProviderError>;
}

// =============================================================================
// 기본 구현체
// =============================================================================

/// 선형 마진 모델 기반 청산가 추정기.
///
/// 격리/교차 마진의 단순화된 선형 공식을 사용합니다:
/// `거리 = (초기 증거금 + 가용 잔고 − 유지 증거금) / 수량`.
#[derive(Debug, Clone)]
pub struct LinearLiquidationEstimator {
    /// 유지 증거금 비율 (예: 0.005 = 0.5%)
    pub maintenance_margin_rate: Decimal,
}

impl LinearLiquidationEstimator {
    /// 새 추정기를 생성합니다.
    pub fn new(maintenance_margin_rate: Decimal) -> Self {
        Self {
            maintenance_margin_rate,
        }
    }
}

impl LiquidationEstimator for LinearLiquidationEstimator {
    fn estimate(&self, position: &Position, free_balance: Decimal) -> Result<Price, ProviderError> {
        if position.size <= Decimal::ZERO {
            return Err(ProviderError::Unsupported(
                "수량이 0 이하인 포지션".to_string(),
            ));
        }

        let maintenance = self.maintenance_margin_rate * position.value;
        let buffer = position.initial_margin + free_balance.max(Decimal::ZERO) - maintenance;
        let distance = buffer / position.size;

        let entry = position.entry_price.value();
        let raw = match position.side {
            PositionSide::Long => entry - distance,
            PositionSide::Short => entry + distance,
        };

        let tick = position.symbol.tick_size;
        Price::with_method(raw.max(tick), tick, RoundMethod::Round)
            .map_err(|e| ProviderError::Other(e.to_string()))
    }
}

/// 테이커 수수료 기반 주문 비용 계산기.
#[derive(Debug, Clone)]
pub struct TakerFeeCostCalculator {
    /// 테이커 수수료율 (예: 0.00055 = 0.055%)
    pub taker_fee_rate: Decimal,
}

impl TakerFeeCostCalculator {
    /// 새 비용 계산기를 생성합니다.
    pub fn new(taker_fee_rate: Decimal) -> Self {
        Self { taker_fee_rate }
    }
}

impl OrderCostCalculator for TakerFeeCostCalculator {
    fn total_buy_cost(&self, order: &PlannedOrder) -> Result<Decimal, ProviderError> {
        let margin = self.order_margin(order)?;
        let fee = order.notional() * self.taker_fee_rate;
        Ok(margin + fee)
    }

    fn order_margin(&self, order: &PlannedOrder) -> Result<Decimal, ProviderError> {
        if order.leverage <= Decimal::ZERO {
            return Err(ProviderError::Unsupported(format!(
                "레버리지가 0 이하: {}",
                order.leverage
            )));
        }
        Ok(order.notional() / order.leverage)
    }
}

// =============================================================================
// 테스트
// =============================================================================
