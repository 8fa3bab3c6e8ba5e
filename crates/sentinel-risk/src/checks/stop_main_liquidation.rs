//! 보조 포지션 스톱 후 주 포지션 청산가 검증.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use sentinel_core::{
    Hedge, LiquidationEstimator, OrderCostCalculator, OrderKind, PlannedOrder, PositionProvider,
    PositionSide, SentinelResult,
};
use sentinel_sandbox::{BalanceShortfallPolicy, TradingSandbox};

use crate::checks::{sandbox_failure, CheckFailure, CheckOutcome, TradingCheck};
use crate::context::TradingCheckContext;

/// 헤지의 보조 포지션을 스톱으로 줄였을 때 주 포지션의 청산가가
/// 시세에 너무 가까워지는지 검증합니다.
///
/// 보조 포지션이 줄면 주 포지션의 커버가 약해져 청산가가 재산출됩니다.
/// 스톱 주문을 샌드박스에 재생한 뒤 주 포지션의 새 청산가와 평가
/// 기준가 사이 거리가 `safe_liquidation_distance` 미만이면 실패합니다.
pub struct StopMainLiquidationCheck {
    positions: Arc<dyn PositionProvider>,
    estimator: Arc<dyn LiquidationEstimator>,
    cost: Arc<dyn OrderCostCalculator>,
}

impl StopMainLiquidationCheck {
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
impl TradingCheck for StopMainLiquidationCheck {
    fn name(&self) -> &str {
        "stop_main_liquidation"
    }

    async fn supports(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<bool> {
        if order.kind != OrderKind::Stop {
            return Ok(false);
        }

        let long = ctx
            .ensure_position(self.positions.as_ref(), PositionSide::Long)
            .await?;
        let short = ctx
            .ensure_position(self.positions.as_ref(), PositionSide::Short)
            .await?;

        match (long, short) {
            (Some(long), Some(short)) => {
                let hedge = Hedge::resolve(&long, &short);
                Ok(hedge.support.side == order.side)
            }
            _ => Ok(false),
        }
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

        let main_side = order.side.opposite();
        let liquidation = sandbox
            .state()
            .position(main_side)
            .and_then(|position| position.liquidation_price.clone());

        let liquidation = match liquidation {
            Some(price) => price,
            None => return Ok(CheckOutcome::pass("스톱 후 주 포지션 청산가 없음")),
        };

        let mark = &ctx.ticker.mark_price;
        let delta = liquidation.difference(mark);
        let safe_distance = ctx.settings.safe_liquidation_distance;

        debug!(
            main_side = ?main_side,
            liquidation = %liquidation.value(),
            mark = %mark.value(),
            delta = %delta,
            safe_distance = %safe_distance,
            "스톱 후 주 포지션 청산가 평가"
        );

        if delta < safe_distance {
            return Ok(CheckOutcome::fail(
                CheckFailure::MainPositionLiquidationAfterStopIsTooClose {
                    delta,
                    safe_distance,
                },
                format!(
                    "스톱 후 주 포지션 청산가 {}가 시세 {}에서 {} 거리 (안전 거리 {})",
                    liquidation.value(),
                    mark.value(),
                    delta,
                    safe_distance
                ),
            ));
        }

        Ok(CheckOutcome::pass(format!(
            "스톱 후 주 포지션 청산가 거리 {} (안전 거리 {})",
            delta, safe_distance
        )))
    }
}
