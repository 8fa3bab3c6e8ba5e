//! 호가 단위 정밀도를 갖는 가격 타입.
//!
//! 거래소의 모든 가격은 심볼별 호가 단위(tick size)로 라운딩되어야 하며,
//! 이 모듈은 라운딩 규칙이 항상 적용되는 가격 값 타입을 제공합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{SentinelError, SentinelResult};

/// 호가 단위 라운딩 방법.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMethod {
    /// 일반 반올림 (기본)
    Round,
    /// 내림 (보수적, 매수 시 유리)
    Floor,
    /// 올림 (공격적, 매도 시 유리)
    Ceil,
}

/// 값을 주어진 단위로 라운딩합니다.
///
/// 단위가 0이면 값을 그대로 반환합니다.
pub fn round_to_step(value: Decimal, step: Decimal, method: RoundMethod) -> Decimal {
    if step.is_zero() {
        return value;
    }

    let steps = value / step;
    let rounded = match method {
        RoundMethod::Round => steps.round(),
        RoundMethod::Floor => steps.floor(),
        RoundMethod::Ceil => steps.ceil(),
    };

    rounded * step
}

/// 호가 단위로 라운딩된 양수 가격.
///
/// 생성 시점과 모든 연산 결과에서 호가 단위 라운딩이 다시 적용되며,
/// 결과가 0 이하인 가격은 생성할 수 없습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    value: Decimal,
    tick: Decimal,
}

impl Price {
    /// 새 가격을 생성합니다 (일반 반올림).
    ///
    /// # Errors
    ///
    /// - `SentinelError::InvalidTick`: 호가 단위가 0 이하인 경우
    /// - `SentinelError::InvalidPrice`: 라운딩 결과가 0 이하인 경우
    pub fn new(value: Decimal, tick: Decimal) -> SentinelResult<Self> {
        Self::with_method(value, tick, RoundMethod::Round)
    }

    /// 지정된 라운딩 방법으로 가격을 생성합니다.
    pub fn with_method(value: Decimal, tick: Decimal, method: RoundMethod) -> SentinelResult<Self> {
        if tick <= Decimal::ZERO {
            return Err(SentinelError::InvalidTick { tick });
        }

        let rounded = round_to_step(value, tick, method);
        if rounded <= Decimal::ZERO {
            return Err(SentinelError::InvalidPrice { value });
        }

        Ok(Self {
            value: rounded,
            tick,
        })
    }

    /// 가격 값을 반환합니다.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// 호가 단위를 반환합니다.
    pub fn tick(&self) -> Decimal {
        self.tick
    }

    /// 가격에 델타를 더한 새 가격을 반환합니다.
    ///
    /// 결과는 다시 호가 단위로 라운딩되며, 0 이하가 되면 실패합니다.
    pub fn offset(&self, delta: Decimal) -> SentinelResult<Self> {
        Self::new(self.value + delta, self.tick)
    }

    /// 가격을 더합니다.
    pub fn add(&self, amount: Decimal) -> SentinelResult<Self> {
        self.offset(amount)
    }

    /// 가격을 뺍니다.
    pub fn sub(&self, amount: Decimal) -> SentinelResult<Self> {
        self.offset(-amount)
    }

    /// 두 가격 사이의 절대 거리를 반환합니다 (호가 단위 라운딩).
    pub fn difference(&self, other: &Price) -> Decimal {
        round_to_step((self.value - other.value).abs(), self.tick, RoundMethod::Round)
    }

    /// 다른 가격보다 작은 쪽을 반환합니다.
    pub fn min_price(self, other: Price) -> Price {
        if self.value <= other.value {
            self
        } else {
            other
        }
    }

    /// 다른 가격보다 큰 쪽을 반환합니다.
    pub fn max_price(self, other: Price) -> Price {
        if self.value >= other.value {
            self
        } else {
            other
        }
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
