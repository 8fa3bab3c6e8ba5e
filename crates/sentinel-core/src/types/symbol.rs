//! 심볼 정의.
//!
//! 파생상품 심볼과 거래소 메타데이터(호가 단위, 수량 단위, 최소 주문
//! 조건, 레버리지 한도)를 정의합니다. 조회 후 불변으로 취급됩니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::SentinelResult;
use crate::types::price::{round_to_step, Price, RoundMethod};

/// 거래 가능한 파생상품 심볼.
///
/// 심볼은 기준 자산과 호가 자산의 조합으로 식별되며, 동일성 비교는
/// 메타데이터를 제외한 `(base, quote)` 쌍으로만 수행됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC)
    pub base: String,
    /// 호가 자산 (예: USDT)
    pub quote: String,
    /// 호가 단위
    pub tick_size: Decimal,
    /// 수량 단위
    pub qty_step: Decimal,
    /// 최소 주문 수량
    pub min_order_qty: Decimal,
    /// 최소 주문 명목 가치
    pub min_notional: Decimal,
    /// 최대 레버리지
    pub max_leverage: Decimal,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>, tick_size: Decimal) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
            tick_size,
            qty_step: dec!(0.001),
            min_order_qty: dec!(0.001),
            min_notional: Decimal::ZERO,
            max_leverage: dec!(100),
        }
    }

    /// 수량 단위를 설정합니다.
    pub fn with_qty_step(mut self, qty_step: Decimal) -> Self {
        self.qty_step = qty_step;
        self
    }

    /// 최소 주문 수량을 설정합니다.
    pub fn with_min_order_qty(mut self, min_order_qty: Decimal) -> Self {
        self.min_order_qty = min_order_qty;
        self
    }

    /// 최소 주문 명목 가치를 설정합니다.
    pub fn with_min_notional(mut self, min_notional: Decimal) -> Self {
        self.min_notional = min_notional;
        self
    }

    /// 최대 레버리지를 설정합니다.
    pub fn with_max_leverage(mut self, max_leverage: Decimal) -> Self {
        self.max_leverage = max_leverage;
        self
    }

    /// 이 심볼의 호가 단위로 가격을 생성합니다.
    pub fn price(&self, value: Decimal) -> SentinelResult<Price> {
        Price::new(value, self.tick_size)
    }

    /// 지정된 라운딩 방법으로 가격을 생성합니다.
    pub fn price_with(&self, value: Decimal, method: RoundMethod) -> SentinelResult<Price> {
        Price::with_method(value, self.tick_size, method)
    }

    /// 수량을 수량 단위로 라운딩합니다.
    pub fn round_qty(&self, qty: Decimal, method: RoundMethod) -> Decimal {
        round_to_step(qty, self.qty_step, method)
    }

    /// "BASE/QUOTE" 형식 문자열에서 심볼을 파싱합니다.
    pub fn from_string(s: &str, tick_size: Decimal) -> Option<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 2 {
            Some(Self::new(parts[0], parts[1], tick_size))
        } else {
            None
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.quote == other.quote
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
        self.quote.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
