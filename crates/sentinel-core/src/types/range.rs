//! 가격 범위 타입.
//!
//! `[from, to)` 반개구간으로 동작하는 정렬된 가격 쌍입니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SentinelError, SentinelResult};
use crate::types::price::Price;

/// 정렬된 가격 범위 `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    from: Price,
    to: Price,
}

impl PriceRange {
    /// 새 가격 범위를 생성합니다.
    ///
    /// # Errors
    ///
    /// `SentinelError::InvalidRange`: `from >= to`인 경우
    pub fn new(from: Price, to: Price) -> SentinelResult<Self> {
        if from >= to {
            return Err(SentinelError::InvalidRange {
                from: from.value(),
                to: to.value(),
            });
        }
        Ok(Self { from, to })
    }

    /// 두 가격을 정렬하여 범위를 생성합니다.
    ///
    /// 두 가격이 같으면 `InvalidRange`로 실패합니다.
    pub fn ordered(a: Price, b: Price) -> SentinelResult<Self> {
        if a <= b {
            Self::new(a, b)
        } else {
            Self::new(b, a)
        }
    }

    /// 범위 시작 가격.
    pub fn from(&self) -> &Price {
        &self.from
    }

    /// 범위 끝 가격 (미포함).
    pub fn to(&self) -> &Price {
        &self.to
    }

    /// 가격이 범위 안에 있는지 확인합니다 (`[from, to)`).
    pub fn contains(&self, price: &Price) -> bool {
        price >= &self.from && price < &self.to
    }

    /// 범위 폭을 반환합니다.
    pub fn width(&self) -> Decimal {
        self.to.value() - self.from.value()
    }

    /// 범위를 주어진 간격으로 나눕니다.
    ///
    /// 마지막 구간은 범위 끝에서 잘립니다.
    pub fn split_by_step(&self, step: Decimal) -> SentinelResult<Vec<PriceRange>> {
        if step <= Decimal::ZERO {
            return Err(SentinelError::InvalidRange {
                from: self.from.value(),
                to: self.to.value(),
            });
        }

        let mut parts = Vec::new();
        let mut cursor = self.from.clone();
        while cursor < self.to {
            let next_value = (cursor.value() + step).min(self.to.value());
            let next = Price::new(next_value, self.from.tick())?;
            if next <= cursor {
                break;
            }
            parts.push(PriceRange::new(cursor.clone(), next.clone())?);
            cursor = next;
        }
        Ok(parts)
    }

    /// 범위를 N등분합니다.
    pub fn split_into(&self, count: u32) -> SentinelResult<Vec<PriceRange>> {
        if count == 0 {
            return Err(SentinelError::InvalidRange {
                from: self.from.value(),
                to: self.to.value(),
            });
        }
        let step = self.width() / Decimal::from(count);
        self.split_by_step(step)
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(v: Decimal) -> Price {
        Price::new(v, dec!(0.01)).unwrap()
    }

    #[test]
    fn test_range_requires_order() {
        assert!(PriceRange::new(price(dec!(100)), price(dec!(200))).is_ok());
        assert!(matches!(
            PriceRange::new(price(dec!(200)), price(dec!(100))),
            Err(SentinelError::InvalidRange { .. })
        ));
        assert!(matches!(
            PriceRange::new(price(dec!(100)), price(dec!(100))),
            Err(SentinelError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_range_ordered_sorts() {
        let range = PriceRange::ordered(price(dec!(200)), price(dec!(100))).unwrap();
        assert_eq!(range.from().value(), dec!(100));
        assert_eq!(range.to().value(), dec!(200));
    }

    #[test]
    fn test_range_contains_half_open() {
        let range = PriceRange::new(price(dec!(100)), price(dec!(200))).unwrap();

        assert!(range.contains(&price(dec!(100))));
        assert!(range.contains(&price(dec!(199.99))));
        assert!(!range.contains(&price(dec!(200))));
        assert!(!range.contains(&price(dec!(99.99))));
    }

    #[test]
    fn test_range_split_into() {
        let range = PriceRange::new(price(dec!(100)), price(dec!(200))).unwrap();
        let parts = range.split_into(4).unwrap();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].from().value(), dec!(100));
        assert_eq!(parts[3].to().value(), dec!(200));
    }

    #[test]
    fn test_range_split_by_step_truncates_last() {
        let range = PriceRange::new(price(dec!(100)), price(dec!(130))).unwrap();
        let parts = range.split_by_step(dec!(20)).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].width(), dec!(10));
    }
}
