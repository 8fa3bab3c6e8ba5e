//! 손익 계산 공통 로직.
//!
//! 샌드박스와 동적 파라미터 계산이 공유하는 PnL 계산 함수를 제공합니다.
//! PnL 퍼센트와 가격 거리 사이의 변환은 반드시 이 모듈의 단일 함수를
//! 거칩니다. 호출자마다 다른 라운딩이 생기면 안 됩니다.

use rust_decimal::Decimal;

use crate::domain::position::PositionSide;
use crate::types::{Percent, Price};

/// 호가 통화 기준의 실현/평가 손익을 계산합니다.
///
/// # Arguments
///
/// * `side` - 포지션 방향
/// * `entry_price` - 진입 가격
/// * `exit_price` - 청산(평가) 가격
/// * `quantity` - 수량
///
/// # Returns
///
/// 부호 있는 손익 (손실이면 음수)
pub fn pnl_in_quote(
    side: PositionSide,
    entry_price: &Price,
    exit_price: &Price,
    quantity: Decimal,
) -> Decimal {
    let diff = match side {
        PositionSide::Long => exit_price.value() - entry_price.value(),
        PositionSide::Short => entry_price.value() - exit_price.value(),
    };
    diff * quantity
}

/// PnL 퍼센트를 절대 가격 거리로 변환합니다.
///
/// 레버리지 포지션에서 PnL은 증거금 대비이므로, 가격 거리는
/// `기준가 × 퍼센트 / 레버리지`입니다. 레버리지는 양수여야 합니다
/// (호출자 계약).
pub fn pnl_percent_to_price_delta(pct: &Percent, price: &Price, leverage: Decimal) -> Decimal {
    pct.of(price.value()) / leverage
}
