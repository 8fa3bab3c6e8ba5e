//! 매수 후 청산가 근접 검증.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sentinel_core::{
    LiquidationEstimator, LiquidationSafetyStrategy, OrderCostCalculator, OrderKind, PlannedOrder,
    PositionProvider, PositionSide, SentinelResult,
};
use sentinel_sandbox::{BalanceShortfallPolicy, TradingSandbox};

use crate::checks::{sandbox_failure, CheckFailure, CheckOutcome, TradingCheck};
use crate::context::TradingCheckContext;

/// 매수 주문이 체결되었을 때 청산가가 시세에 너무 가까워지는지 검증합니다.
///
/// 주문을 샌드박스에 재생하여 체결 후 포지션의 청산가를 구하고,
/// 청산가와 평가 기준가 사이 거리가 `safe_liquidation_distance` 미만이면
/// 실패합니다. 잔고 부족은 무시하고 재생합니다. 체결 자체가 가능한지는
/// 잔고 검증의 몫이고 여기서는 체결되었다면 어떻게 되는지만 봅니다.
///
/// `LiquidationSafetyStrategy`가 거리를 따지는 방향을 정합니다:
/// - `Conservative`: 청산가가 어느 쪽에 있든 항상 검사
/// - `Moderate`: 청산가가 손실 방향에 있을 때만 검사
/// - `Aggressive`: 청산가가 비정상 방향(이익 방향)에 있을 때만 검사
pub struct BuyLiquidationCheck {
    positions: Arc<dyn PositionProvider>,
    estimator: Arc<dyn LiquidationEstimator>,
    cost: Arc<dyn OrderCostCalculator>,
}

impl BuyLiquidationCheck {
    /// 새 검증을 생성합니다.
    pub fn new(
        positions: Arc<dyn PositionProvider>,
        estimator: Arc<dyn LiquidationEstimator>,
        cost: Arc<dyn OrderCostCalculator>,
    ) -> Self {
        Self {
            positions,
            estimator,
            cost,
        }
    }
}

#[async_trait]
impl TradingCheck for BuyLiquidationCheck {
    fn name(&self) -> &str {
        "buy_liquidation"
    }

    async fn supports(
        &self,
        order: &PlannedOrder,
        _ctx: &mut TradingCheckContext,
    ) -> SentinelResult<bool> {
        Ok(order.kind == OrderKind::Buy && !order.force)
    }

    async fn check(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<CheckOutcome> {
        let state = ctx.ensure_sandbox_state(self.positions.as_ref()).await?;

        let mut sandbox =
            TradingSandbox::new(Arc::clone(&self.estimator), Arc::clone(&self.cost), state);
        sandbox
            .process_orders(
                std::slice::from_ref(order),
                BalanceShortfallPolicy::Ignore,
            )
            .map_err(sandbox_failure)?;

        let liquidation = sandbox
            .state()
            .position(order.side)
            .and_then(|position| position.liquidation_price.clone());

        let liquidation = match liquidation {
            Some(price) => price,
            None => {
                return Ok(CheckOutcome::pass(
                    "체결 후 청산가 없음 (헤지 커버 또는 포지션 없음)",
                ))
            }
        };

        let mark = &ctx.ticker.mark_price;
        let delta = liquidation.difference(mark);
        let safe_distance = ctx.settings.safe_liquidation_distance;

        let on_loss_side = match order.side {
            PositionSide::Long => liquidation.value() < mark.value(),
            PositionSide::Short => liquidation.value() > mark.value(),
        };
        let must_check = match ctx.settings.safety_strategy {
            LiquidationSafetyStrategy::Conservative => true,
            LiquidationSafetyStrategy::Moderate => on_loss_side,
            LiquidationSafetyStrategy::Aggressive => !on_loss_side,
        };

        debug!(
            liquidation = %liquidation.value(),
            mark = %mark.value(),
            delta = %delta,
            safe_distance = %safe_distance,
            on_loss_side,
            must_check,
            "매수 후 청산가 평가"
        );

        if must_check && delta < safe_distance {
            return Ok(CheckOutcome::fail(
                CheckFailure::FurtherPositionLiquidationAfterBuyIsTooClose {
                    delta,
                    safe_distance,
                },
                format!(
                    "체결 후 청산가 {}가 시세 {}에서 {} 거리 (안전 거리 {})",
                    liquidation.value(),
                    mark.value(),
                    delta,
                    safe_distance
                ),
            ));
        }

        Ok(CheckOutcome::pass(format!(
            "체결 후 청산가 거리 {} (안전 거리 {})",
            delta, safe_distance
        )))
    }
}
