//! 가용 잔고 검증.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use sentinel_core::{OrderKind, PlannedOrder, PositionProvider, SentinelResult};

use crate::checks::{CheckFailure, CheckOutcome, TradingCheck};
use crate::context::TradingCheckContext;

/// 매수 전에 가용 잔고가 남아 있는지 검증합니다.
///
/// 헤지의 미커버 손실을 차감한 가용 잔고가 0 이하이면 실패합니다.
/// `force` 주문은 잔고와 무관하게 내보내야 하므로 건너뜁니다.
pub struct AvailableBalanceCheck {
    positions: Arc<dyn PositionProvider>,
}

impl AvailableBalanceCheck {
    /// 새 검증을 생성합니다.
    pub fn new(positions: Arc<dyn PositionProvider>) -> Self {
        Self { positions }
    }
}

#[async_trait]
impl TradingCheck for AvailableBalanceCheck {
    fn name(&self) -> &str {
        "available_balance"
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
        _order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<CheckOutcome> {
        let state = ctx.ensure_sandbox_state(self.positions.as_ref()).await?;
        let available = state.available_balance();

        debug!(available = %available, free = %state.free_balance(), "가용 잔고 평가");

        if available <= Decimal::ZERO {
            return Ok(CheckOutcome::fail(
                CheckFailure::InsufficientContractBalance { available },
                format!("가용 잔고 {} (0 이하)", available),
            ));
        }

        Ok(CheckOutcome::pass(format!("가용 잔고 {}", available)))
    }
}
