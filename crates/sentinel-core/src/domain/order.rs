//! 검증 대상 주문 모델.
//!
//! 리스크 엔진이 평가하는 가상의 매수/스톱 주문과, 거래소에 이미 등록된
//! 스톱 주문의 스냅샷을 정의합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::position::PositionSide;
use crate::types::{Price, Symbol};

/// 주문 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// 포지션 확대 주문
    Buy,
    /// 포지션 축소(스톱) 주문
    Stop,
}

/// 검증 대상 주문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedOrder {
    /// 주문 ID
    pub id: Uuid,
    /// 주문 종류
    pub kind: OrderKind,
    /// 심볼
    pub symbol: Symbol,
    /// 대상 포지션 방향
    pub side: PositionSide,
    /// 주문 가격
    pub price: Price,
    /// 주문 수량
    pub volume: Decimal,
    /// 레버리지
    pub leverage: Decimal,
    /// 검증 강제 통과 플래그
    #[serde(default)]
    pub force: bool,
    /// 평균 진입가 거리 검증 제외 플래그
    #[serde(default)]
    pub allow_entry_drift: bool,
}

impl PlannedOrder {
    /// 매수 주문을 생성합니다.
    pub fn buy(
        symbol: Symbol,
        side: PositionSide,
        price: Price,
        volume: Decimal,
        leverage: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OrderKind::Buy,
            symbol,
            side,
            price,
            volume,
            leverage,
            force: false,
            allow_entry_drift: false,
        }
    }

    /// 스톱 주문을 생성합니다.
    pub fn stop(
        symbol: Symbol,
        side: PositionSide,
        price: Price,
        volume: Decimal,
        leverage: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OrderKind::Stop,
            symbol,
            side,
            price,
            volume,
            leverage,
            force: false,
            allow_entry_drift: false,
        }
    }

    /// 검증 강제 통과를 설정합니다.
    pub fn with_force(mut self) -> Self {
        self.force = true;
        self
    }

    /// 평균 진입가 거리 검증을 제외합니다.
    pub fn with_allow_entry_drift(mut self) -> Self {
        self.allow_entry_drift = true;
        self
    }

    /// 주문 명목 가치를 반환합니다.
    pub fn notional(&self) -> Decimal {
        self.price.value() * self.volume
    }
}

/// 거래소에 등록되어 있는 스톱 주문 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedStop {
    /// 스톱 가격
    pub price: Price,
    /// 스톱 수량
    pub volume: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_planned_order_ctors() {
        let symbol = Symbol::new("BTC", "USDT", dec!(0.01));
        let price = symbol.price(dec!(29000)).unwrap();

        let buy = PlannedOrder::buy(
            symbol.clone(),
            PositionSide::Short,
            price.clone(),
            dec!(0.003),
            dec!(100),
        );
        assert_eq!(buy.kind, OrderKind::Buy);
        assert!(!buy.force);
        assert_eq!(buy.notional(), dec!(87));

        let stop = PlannedOrder::stop(symbol, PositionSide::Short, price, dec!(0.003), dec!(100))
            .with_force()
            .with_allow_entry_drift();
        assert_eq!(stop.kind, OrderKind::Stop);
        assert!(stop.force);
        assert!(stop.allow_entry_drift);
    }
}
