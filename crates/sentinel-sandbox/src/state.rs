//! 샌드박스 상태.
//!
//! 한 심볼의 잔고와 포지션을 담는 자기완결적 스냅샷입니다. 가상 주문은
//! 이 스냅샷에만 적용되며 실제 거래소 상태를 건드리지 않습니다.
//! 생성 시점의 잔고는 `*_before` 필드에 고정되어 시뮬레이션 후에도
//! 비교 기준으로 남습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sentinel_core::{Hedge, Position, PositionSide, Price, SentinelError, SentinelResult, Symbol};

/// 한 심볼의 잔고/포지션 스냅샷.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxState {
    /// 대상 심볼
    pub symbol: Symbol,
    /// 롱 포지션
    long: Option<Position>,
    /// 숏 포지션
    short: Option<Position>,
    /// 기준 가격 (가용 잔고 계산에 사용)
    last_price: Price,
    /// 사용 가능 잔고
    free_balance: Decimal,
    /// 생성 시점의 사용 가능 잔고
    free_balance_before: Decimal,
    /// 생성 시점의 가용 잔고
    available_balance_before: Decimal,
}

impl SandboxState {
    /// 새 샌드박스 상태를 생성합니다.
    ///
    /// 생성 시점의 잔고가 `*_before` 스냅샷으로 고정됩니다.
    ///
    /// # Errors
    ///
    /// `SentinelError::SymbolMismatch`: 포지션 심볼이 상태 심볼과 다른 경우
    pub fn new(
        symbol: Symbol,
        last_price: Price,
        free_balance: Decimal,
        long: Option<Position>,
        short: Option<Position>,
    ) -> SentinelResult<Self> {
        let mut state = Self {
            symbol,
            long: None,
            short: None,
            last_price,
            free_balance,
            free_balance_before: free_balance,
            available_balance_before: Decimal::ZERO,
        };

        if let Some(position) = long {
            state.set_position(position)?;
        }
        if let Some(position) = short {
            state.set_position(position)?;
        }

        state.available_balance_before = state.available_balance();
        Ok(state)
    }

    /// 포지션을 방향 슬롯에 저장합니다.
    ///
    /// # Errors
    ///
    /// `SentinelError::SymbolMismatch`: 포지션 심볼이 상태 심볼과 다른 경우.
    pub fn set_position(&mut self, position: Position) -> SentinelResult<()> {
        if position.symbol != self.symbol {
            return Err(SentinelError::SymbolMismatch {
                expected: self.symbol.to_string(),
                actual: position.symbol.to_string(),
            });
        }

        match position.side {
            PositionSide::Long => self.long = Some(position),
            PositionSide::Short => self.short = Some(position),
        }
        Ok(())
    }

    /// 방향에 해당하는 포지션을 반환합니다.
    pub fn position(&self, side: PositionSide) -> Option<&Position> {
        match side {
            PositionSide::Long => self.long.as_ref(),
            PositionSide::Short => self.short.as_ref(),
        }
    }

    /// 방향에 해당하는 포지션을 꺼냅니다 (슬롯은 빈 상태가 됨).
    pub fn take_position(&mut self, side: PositionSide) -> Option<Position> {
        match side {
            PositionSide::Long => self.long.take(),
            PositionSide::Short => self.short.take(),
        }
    }

    /// 양방향 포지션이 모두 있으면 헤지 뷰를 반환합니다.
    pub fn hedge(&self) -> Option<Hedge<'_>> {
        match (&self.long, &self.short) {
            (Some(long), Some(short)) => Some(Hedge::resolve(long, short)),
            _ => None,
        }
    }

    /// 기준 가격을 반환합니다.
    pub fn last_price(&self) -> &Price {
        &self.last_price
    }

    /// 기준 가격을 갱신합니다.
    ///
    /// 다중 주문 시뮬레이션에서 주문 사이에 가격이 움직이므로, 매 주문
    /// 적용 전에 호출됩니다.
    pub fn set_last_price(&mut self, price: Price) {
        self.last_price = price;
    }

    /// 사용 가능 잔고를 반환합니다.
    pub fn free_balance(&self) -> Decimal {
        self.free_balance
    }

    /// 사용 가능 잔고에 증감을 적용합니다.
    ///
    /// 하한 없음: 음수 잔고는 이후 잔고 부족 검증의 정당한 전제 조건입니다.
    pub fn modify_free_balance(&mut self, delta: Decimal) {
        self.free_balance += delta;
    }

    /// 생성 시점의 사용 가능 잔고를 반환합니다.
    pub fn free_balance_before(&self) -> Decimal {
        self.free_balance_before
    }

    /// 생성 시점의 가용 잔고를 반환합니다.
    pub fn available_balance_before(&self) -> Decimal {
        self.available_balance_before
    }

    /// 미실현 손실을 차감한 가용 잔고를 반환합니다.
    ///
    /// - 양쪽 레그가 완전히 상쇄되는 헤지는 리스크 노출이 없으므로
    ///   사용 가능 잔고를 그대로 반환합니다.
    /// - 그 외에는 메인 (또는 유일한) 포지션의 미상쇄 수량에 대해
    ///   `손실 = 미상쇄 수량 × |기준가 − 진입가|`를 차감하며, 결과는
    ///   0 아래로 내려가지 않습니다. 실현 전 손실이 증거금을 잠식하는
    ///   거래소 마진콜 회계를 반영합니다.
    pub fn available_balance(&self) -> Decimal {
        let (exposed, not_covered) = match (&self.long, &self.short) {
            (Some(long), Some(short)) => {
                let hedge = Hedge::resolve(long, short);
                if hedge.is_equivalent() {
                    return self.free_balance;
                }
                (Some(hedge.main), hedge.not_covered_size())
            }
            (Some(position), None) | (None, Some(position)) => (Some(position), position.size),
            (None, None) => (None, Decimal::ZERO),
        };

        let loss = match exposed {
            Some(position) if position.in_loss_at(&self.last_price) => {
                not_covered * self.last_price.difference(&position.entry_price)
            }
            _ => Decimal::ZERO,
        };

        (self.free_balance - loss).max(Decimal::ZERO)
    }
}
