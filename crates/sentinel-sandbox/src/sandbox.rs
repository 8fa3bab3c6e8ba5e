//! 예측 실행 시뮬레이터.
//!
//! 가상의 매수/스톱 주문 시퀀스를 샌드박스 상태에 결정적으로 재생합니다.
//! 모든 안전 검증이 사용하는 "이 주문을 실행하면 어떻게 되는가" 오라클이며,
//! 바인딩된 상태 밖으로는 어떤 부수 효과도 내지 않습니다.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use sentinel_core::{
    pnl_in_quote, LiquidationEstimator, OrderCostCalculator, OrderKind, PlannedOrder, Position,
    PositionSide, SentinelError,
};

use crate::error::{SandboxError, SandboxResult};
use crate::state::SandboxState;

/// 매수 중 가용 잔고 부족 처리 정책.
///
/// "그래도 매수한다면" 시나리오를 시뮬레이션하는 검증은 `Ignore`를
/// 사용합니다. 그 외 모든 에러는 정책과 무관하게 전파됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceShortfallPolicy {
    /// 잔고 부족 시 `InsufficientAvailableBalance`로 실패
    Enforce,
    /// 잔고 부족을 무시하고 계속 진행 (잔고는 음수가 될 수 있음)
    Ignore,
}

/// 가상 주문 재생 샌드박스.
///
/// (상태, 주문 시퀀스)의 순수 함수이며, 주입된 청산가 추정기와
/// 비용 계산기 외에는 어떤 외부 자원도 사용하지 않습니다.
pub struct TradingSandbox {
    estimator: Arc<dyn LiquidationEstimator>,
    cost: Arc<dyn OrderCostCalculator>,
    state: SandboxState,
}

impl TradingSandbox {
    /// 새 샌드박스를 생성하고 상태를 바인딩합니다.
    pub fn new(
        estimator: Arc<dyn LiquidationEstimator>,
        cost: Arc<dyn OrderCostCalculator>,
        state: SandboxState,
    ) -> Self {
        Self {
            estimator,
            cost,
            state,
        }
    }

    /// 바인딩된 상태를 반환합니다.
    pub fn state(&self) -> &SandboxState {
        &self.state
    }

    /// 샌드박스를 소비하고 최종 상태를 반환합니다.
    pub fn into_state(self) -> SandboxState {
        self.state
    }

    /// 새 상태를 바인딩합니다.
    ///
    /// # Errors
    ///
    /// `SentinelError::SymbolMismatch`: 새 상태의 심볼이 기존과 다른 경우
    pub fn set_state(&mut self, state: SandboxState) -> SandboxResult<()> {
        if state.symbol != self.state.symbol {
            return Err(SandboxError::Core(SentinelError::SymbolMismatch {
                expected: self.state.symbol.to_string(),
                actual: state.symbol.to_string(),
            }));
        }
        self.state = state;
        Ok(())
    }

    /// 주문 시퀀스를 순서대로 재생합니다.
    ///
    /// 순서가 결과를 결정합니다: 뒤의 주문은 앞의 주문이 남긴 상태를
    /// 봅니다. 각 주문 적용 후 청산가를 재산출합니다.
    ///
    /// # Errors
    ///
    /// - `SandboxError::InsufficientAvailableBalance`: `Enforce` 정책에서
    ///   매수 비용이 가용 잔고를 초과한 경우
    /// - `SandboxError::PositionNotFound`: 스톱 대상 포지션이 없는 경우
    /// - `SandboxError::UnexpectedExecution`: 협력자 호출 실패
    pub fn process_orders(
        &mut self,
        orders: &[PlannedOrder],
        policy: BalanceShortfallPolicy,
    ) -> SandboxResult<()> {
        for (index, order) in orders.iter().enumerate() {
            if order.symbol != self.state.symbol {
                return Err(SandboxError::Core(SentinelError::SymbolMismatch {
                    expected: self.state.symbol.to_string(),
                    actual: order.symbol.to_string(),
                }));
            }

            match order.kind {
                OrderKind::Buy => self.apply_buy(index, order, policy)?,
                OrderKind::Stop => self.apply_stop(index, order)?,
            }

            self.refresh_liquidations(index, order)?;
        }
        Ok(())
    }

    fn apply_buy(
        &mut self,
        index: usize,
        order: &PlannedOrder,
        policy: BalanceShortfallPolicy,
    ) -> SandboxResult<()> {
        self.state.set_last_price(order.price.clone());

        let cost = self
            .cost
            .total_buy_cost(order)
            .map_err(|source| SandboxError::UnexpectedExecution {
                order_index: index,
                order_id: order.id,
                source,
            })?;

        if policy == BalanceShortfallPolicy::Enforce {
            let available = self.state.available_balance();
            if available < cost {
                return Err(SandboxError::InsufficientAvailableBalance {
                    required: cost,
                    available,
                });
            }
        }

        self.state.modify_free_balance(-cost);

        let updated = match self.state.take_position(order.side) {
            Some(existing) => {
                let order_margin = self.cost.order_margin(order).map_err(|source| {
                    SandboxError::UnexpectedExecution {
                        order_index: index,
                        order_id: order.id,
                        source,
                    }
                })?;

                let new_size = existing.size + order.volume;
                // 가치 가중 평균 진입가
                let raw_entry = (existing.size * existing.entry_price.value()
                    + order.volume * order.price.value())
                    / new_size;
                let new_entry = self.state.symbol.price(raw_entry)?;

                let margin = existing.initial_margin + order_margin;
                existing
                    .with_entry_price(new_entry)
                    .with_size(new_size)
                    .with_initial_margin(margin)
            }
            None => Position::new(
                self.state.symbol.clone(),
                order.side,
                order.price.clone(),
                order.volume,
                order.leverage,
            ),
        };

        debug!(
            order_id = %order.id,
            side = ?order.side,
            cost = %cost,
            entry = %updated.entry_price,
            size = %updated.size,
            "매수 주문 적용"
        );

        self.state.set_position(updated)?;
        Ok(())
    }

    fn apply_stop(&mut self, index: usize, order: &PlannedOrder) -> SandboxResult<()> {
        self.state.set_last_price(order.price.clone());

        let existing = self.state.take_position(order.side).ok_or_else(|| {
            SandboxError::PositionNotFound {
                symbol: self.state.symbol.to_string(),
                side: format!("{:?}", order.side),
            }
        })?;

        let margin = self
            .cost
            .order_margin(order)
            .map_err(|source| SandboxError::UnexpectedExecution {
                order_index: index,
                order_id: order.id,
                source,
            })?;

        let closed_volume = order.volume.min(existing.size);
        let pnl = pnl_in_quote(order.side, &existing.entry_price, &order.price, closed_volume);

        // 반환 증거금과 실현 손익 모두 잔고로 (손실이면 잔고 감소)
        self.state.modify_free_balance(margin + pnl);

        let new_size = (existing.size - order.volume).max(Decimal::ZERO);

        debug!(
            order_id = %order.id,
            side = ?order.side,
            pnl = %pnl,
            margin = %margin,
            remaining = %new_size,
            "스톱 주문 적용"
        );

        if new_size > Decimal::ZERO {
            let remaining_margin = (existing.initial_margin - margin).max(Decimal::ZERO);
            let updated = existing
                .with_size(new_size)
                .with_initial_margin(remaining_margin);
            self.state.set_position(updated)?;
        }
        // 수량 0이면 포지션 종료, 슬롯은 빈 상태로 남음

        Ok(())
    }

    /// 체결 후 청산가를 재산출합니다.
    ///
    /// 헤지 계좌에서 청산은 레그 단위가 아니라 순노출의 속성입니다.
    /// 지지 레그는 독립적인 청산 리스크가 없으므로 청산가를 비우고,
    /// 메인 레그만 새 잔고로 재산출합니다.
    fn refresh_liquidations(&mut self, index: usize, order: &PlannedOrder) -> SandboxResult<()> {
        let free = self.state.free_balance();

        let (main_side, support_side) = match self.state.hedge() {
            Some(hedge) => {
                if hedge.is_equivalent() {
                    // 완전 상쇄 헤지는 양쪽 모두 청산 리스크 없음
                    (None, vec![PositionSide::Long, PositionSide::Short])
                } else {
                    (Some(hedge.main.side), vec![hedge.support.side])
                }
            }
            None => {
                let sole = [PositionSide::Long, PositionSide::Short]
                    .into_iter()
                    .find(|side| self.state.position(*side).is_some());
                (sole, Vec::new())
            }
        };

        for side in support_side {
            if let Some(position) = self.state.take_position(side) {
                self.state.set_position(position.with_liquidation(None))?;
            }
        }

        if let Some(side) = main_side {
            if let Some(position) = self.state.take_position(side) {
                let liquidation = self
                    .estimator
                    .estimate(&position, free)
                    .map_err(|source| SandboxError::UnexpectedExecution {
                        order_index: index,
                        order_id: order.id,
                        source,
                    })?;
                self.state
                    .set_position(position.with_liquidation(Some(liquidation)))?;
            }
        }

        Ok(())
    }
}
