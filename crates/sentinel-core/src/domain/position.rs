//! 포지션 모델.
//!
//! 거래소 포지션의 스냅샷을 나타냅니다. 포지션은 불변 값으로 취급하며,
//! 변경은 `with_*` 빌더로 새 값을 만들어 수행합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Price, Symbol};

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    /// 롱 (가격 상승 시 이익)
    Long,
    /// 숏 (가격 하락 시 이익)
    Short,
}

impl PositionSide {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            PositionSide::Long => PositionSide::Short,
            PositionSide::Short => PositionSide::Long,
        }
    }

    /// 가격 상승이 이익인 방향이면 +1, 손실인 방향이면 -1.
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

/// 거래소 포지션 스냅샷.
///
/// 헤지 상태에서 청산 리스크가 없는 지지(support) 레그는
/// `liquidation_price`가 `None`으로 보고됩니다 (거래소의 "청산가 0").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// 내부 포지션 ID
    pub id: Uuid,
    /// 심볼
    pub symbol: Symbol,
    /// 포지션 방향
    pub side: PositionSide,
    /// 평균 진입 가격
    pub entry_price: Price,
    /// 보유 수량
    pub size: Decimal,
    /// 명목 가치 (진입가 × 수량)
    pub value: Decimal,
    /// 레버리지
    pub leverage: Decimal,
    /// 초기 증거금
    pub initial_margin: Decimal,
    /// 청산 가격 (헤지 지지 레그는 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_price: Option<Price>,
    /// 미실현 손익
    pub unrealized_pnl: Decimal,
    /// 헤지 메인 레그 여부
    #[serde(default)]
    pub is_main: bool,
    /// 포지션 오픈 타임스탬프
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// 새 포지션을 생성합니다.
    ///
    /// 명목 가치와 초기 증거금은 진입가, 수량, 레버리지로부터 계산됩니다.
    pub fn new(
        symbol: Symbol,
        side: PositionSide,
        entry_price: Price,
        size: Decimal,
        leverage: Decimal,
    ) -> Self {
        let value = entry_price.value() * size;
        let initial_margin = if leverage > Decimal::ZERO {
            value / leverage
        } else {
            value
        };

        Self {
            id: Uuid::new_v4(),
            symbol,
            side,
            entry_price,
            size,
            value,
            leverage,
            initial_margin,
            liquidation_price: None,
            unrealized_pnl: Decimal::ZERO,
            is_main: false,
            opened_at: Utc::now(),
        }
    }

    /// 진입 가격을 변경한 새 포지션을 반환합니다.
    pub fn with_entry_price(mut self, entry_price: Price) -> Self {
        self.entry_price = entry_price;
        self.value = self.entry_price.value() * self.size;
        self
    }

    /// 수량을 변경한 새 포지션을 반환합니다.
    pub fn with_size(mut self, size: Decimal) -> Self {
        self.size = size;
        self.value = self.entry_price.value() * self.size;
        self
    }

    /// 초기 증거금을 변경한 새 포지션을 반환합니다.
    pub fn with_initial_margin(mut self, initial_margin: Decimal) -> Self {
        self.initial_margin = initial_margin;
        self
    }

    /// 청산 가격을 변경한 새 포지션을 반환합니다.
    pub fn with_liquidation(mut self, liquidation_price: Option<Price>) -> Self {
        self.liquidation_price = liquidation_price;
        self
    }

    /// 미실현 손익을 변경한 새 포지션을 반환합니다.
    pub fn with_unrealized_pnl(mut self, unrealized_pnl: Decimal) -> Self {
        self.unrealized_pnl = unrealized_pnl;
        self
    }

    /// 헤지 메인 레그 플래그를 설정한 새 포지션을 반환합니다.
    pub fn with_is_main(mut self, is_main: bool) -> Self {
        self.is_main = is_main;
        self
    }

    /// 주어진 가격에서 포지션이 손실 상태인지 확인합니다.
    pub fn in_loss_at(&self, price: &Price) -> bool {
        match self.side {
            PositionSide::Long => price < &self.entry_price,
            PositionSide::Short => price > &self.entry_price,
        }
    }

    /// 진입 시점의 명목 가치를 반환합니다.
    pub fn notional(&self) -> Decimal {
        self.entry_price.value() * self.size
    }
}
