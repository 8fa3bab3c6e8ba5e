//! 퍼센트 값 타입.
//!
//! 설정과 계산에서 사용하는 퍼센트(0~100 표기)를 나타냅니다.
//! PnL 퍼센트처럼 100을 초과할 수 있는 값은 unrestricted로 생성합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SentinelError, SentinelResult};

/// 퍼센트 값 (예: 30 = 30%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(Decimal);

impl Percent {
    /// 0~100 범위를 검증하는 퍼센트를 생성합니다.
    ///
    /// # Errors
    ///
    /// `SentinelError::InvalidPercent`: 값이 0 미만이거나 100 초과인 경우
    pub fn strict(value: Decimal) -> SentinelResult<Self> {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(SentinelError::InvalidPercent { value });
        }
        Ok(Self(value))
    }

    /// 범위 제한 없는 퍼센트를 생성합니다.
    pub fn unrestricted(value: Decimal) -> Self {
        Self(value)
    }

    /// 비율(0.0~1.0)을 퍼센트로 변환합니다.
    pub fn from_part(part: Decimal) -> Self {
        Self(part * dec!(100))
    }

    /// 주어진 값의 이 퍼센트만큼을 계산합니다.
    pub fn of(&self, value: Decimal) -> Decimal {
        value * self.0 / dec!(100)
    }

    /// 퍼센트 값을 반환합니다.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_strict_bounds() {
        assert!(Percent::strict(dec!(0)).is_ok());
        assert!(Percent::strict(dec!(100)).is_ok());
        assert!(matches!(
            Percent::strict(dec!(100.1)),
            Err(SentinelError::InvalidPercent { .. })
        ));
        assert!(matches!(
            Percent::strict(dec!(-1)),
            Err(SentinelError::InvalidPercent { .. })
        ));
    }

    #[test]
    fn test_percent_unrestricted() {
        let pct = Percent::unrestricted(dec!(250));
        assert_eq!(pct.value(), dec!(250));
    }

    #[test]
    fn test_percent_of() {
        let pct = Percent::strict(dec!(30)).unwrap();
        assert_eq!(pct.of(dec!(5000)), dec!(1500));

        let pct = Percent::strict(dec!(5)).unwrap();
        assert_eq!(pct.of(dec!(5000)), dec!(250));
    }

    #[test]
    fn test_percent_from_part() {
        let pct = Percent::from_part(dec!(0.7));
        assert_eq!(pct.value(), dec!(70));
    }
}
