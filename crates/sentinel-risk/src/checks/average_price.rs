//! 평균 진입가 이탈 검증.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use sentinel_core::{OrderKind, PlannedOrder, PositionProvider, SentinelResult};

use crate::checks::{CheckFailure, CheckOutcome, TradingCheck};
use crate::context::TradingCheckContext;

/// 추가 매수 가격이 평균 진입가에서 과도하게 벗어나는지 검증합니다.
///
/// 이익 중인 포지션에 추가 매수할 때만 적용됩니다. 손실 중이거나
/// 포지션이 없거나 주문이 이탈을 명시적으로 허용하면 건너뜁니다.
/// 허용 이탈 폭은 `entry_price_max_distance_percent`에
/// `RiskLevel` 배수를 곱해 정합니다.
pub struct AveragePriceDistanceCheck {
    positions: Arc<dyn PositionProvider>,
}

impl AveragePriceDistanceCheck {
    /// 새 검증을 생성합니다.
    pub fn new(positions: Arc<dyn PositionProvider>) -> Self {
        Self { positions }
    }
}

#[async_trait]
impl TradingCheck for AveragePriceDistanceCheck {
    fn name(&self) -> &str {
        "average_price_distance"
    }

    async fn supports(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<bool> {
        if order.kind != OrderKind::Buy || order.allow_entry_drift {
            return Ok(false);
        }

        let mark = ctx.ticker.mark_price.clone();
        let position = ctx
            .ensure_position(self.positions.as_ref(), order.side)
            .await?;
        match position {
            Some(position) => Ok(!position.in_loss_at(&mark)),
            None => Ok(false),
        }
    }

    async fn check(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<CheckOutcome> {
        let position = ctx
            .ensure_position(self.positions.as_ref(), order.side)
            .await?;
        let position = match position {
            Some(position) => position,
            None => return Ok(CheckOutcome::pass("포지션 없음")),
        };

        let entry = position.entry_price.value();
        let distance_percent = (order.price.value() - entry).abs() / entry * Decimal::ONE_HUNDRED;
        let allowed_percent = ctx.settings.entry_price_max_distance_percent.value()
            * ctx.settings.risk_level.multiplier();

        debug!(
            entry = %entry,
            order_price = %order.price.value(),
            distance_percent = %distance_percent,
            allowed_percent = %allowed_percent,
            "평균 진입가 이탈 평가"
        );

        if distance_percent > allowed_percent {
            return Ok(CheckOutcome::fail(
                CheckFailure::EntryPriceDistanceExceeded {
                    distance_percent,
                    allowed_percent,
                },
                format!(
                    "주문 가격 {}가 평균 진입가 {}에서 {}% 이탈 (허용 {}%)",
                    order.price.value(),
                    entry,
                    distance_percent.round_dp(4),
                    allowed_percent
                ),
            ));
        }

        Ok(CheckOutcome::pass(format!(
            "진입가 이탈 {}% (허용 {}%)",
            distance_percent.round_dp(4),
            allowed_percent
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sentinel_core::{
        AccountBalance, Position, PositionSide, ProviderError, RiskLevel, RiskSettings, Symbol,
        Ticker,
    };

    struct StaticProvider {
        position: Option<Position>,
    }

    #[async_trait]
    impl PositionProvider for StaticProvider {
        async fn fetch_position(
            &self,
            _symbol: &Symbol,
            side: PositionSide,
        ) -> Result<Option<Position>, ProviderError> {
            Ok(self
                .position
                .clone()
                .filter(|position| position.side == side))
        }

        async fn fetch_balance(&self) -> Result<AccountBalance, ProviderError> {
            Ok(AccountBalance {
                free: dec!(1000),
                total: dec!(1000),
            })
        }
    }

    fn btc_usdt() -> Symbol {
        Symbol::new("BTC", "USDT", dec!(0.01))
    }

    fn ticker(mark: Decimal) -> Ticker {
        let symbol = btc_usdt();
        let price = symbol.price(mark).unwrap();
        Ticker::new(symbol, price.clone(), price.clone(), price)
    }

    fn long_position(entry: Decimal) -> Position {
        let symbol = btc_usdt();
        let entry = symbol.price(entry).unwrap();
        Position::new(symbol, PositionSide::Long, entry, dec!(1), dec!(10))
    }

    fn long_buy(price: Decimal) -> PlannedOrder {
        let symbol = btc_usdt();
        let price = symbol.price(price).unwrap();
        PlannedOrder::buy(symbol, PositionSide::Long, price, dec!(0.1), dec!(10))
    }

    fn check_with(position: Option<Position>) -> AveragePriceDistanceCheck {
        AveragePriceDistanceCheck::new(Arc::new(StaticProvider { position }))
    }

    #[tokio::test]
    async fn test_skips_without_position_or_in_loss_or_with_drift_allowed() {
        // 포지션 없음
        let check = check_with(None);
        let mut ctx = TradingCheckContext::new(ticker(dec!(31000)), RiskSettings::default());
        assert!(!check.supports(&long_buy(dec!(31000)), &mut ctx).await.unwrap());

        // 손실 중인 롱 (시세가 진입가 아래)
        let check = check_with(Some(long_position(dec!(30000))));
        let mut ctx = TradingCheckContext::new(ticker(dec!(29000)), RiskSettings::default());
        assert!(!check.supports(&long_buy(dec!(29000)), &mut ctx).await.unwrap());

        // 이탈 허용 주문
        let check = check_with(Some(long_position(dec!(30000))));
        let mut ctx = TradingCheckContext::new(ticker(dec!(31000)), RiskSettings::default());
        let order = long_buy(dec!(31000)).with_allow_entry_drift();
        assert!(!check.supports(&order, &mut ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_supports_profitable_position() {
        let check = check_with(Some(long_position(dec!(30000))));
        let mut ctx = TradingCheckContext::new(ticker(dec!(31000)), RiskSettings::default());
        assert!(check.supports(&long_buy(dec!(31000)), &mut ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_fails_beyond_allowed_distance() {
        // 진입가 30000, 주문 30400 => 이탈 1.333...% > 기본 허용 1%
        let check = check_with(Some(long_position(dec!(30000))));
        let mut ctx = TradingCheckContext::new(ticker(dec!(30500)), RiskSettings::default());

        let outcome = check.check(&long_buy(dec!(30400)), &mut ctx).await.unwrap();

        assert!(!outcome.passed);
        match outcome.failure {
            Some(CheckFailure::EntryPriceDistanceExceeded {
                distance_percent,
                allowed_percent,
            }) => {
                assert_eq!(allowed_percent, dec!(1));
                assert!(distance_percent > dec!(1.33) && distance_percent < dec!(1.34));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_passes_within_allowed_distance() {
        let check = check_with(Some(long_position(dec!(30000))));
        let mut ctx = TradingCheckContext::new(ticker(dec!(30500)), RiskSettings::default());

        let outcome = check.check(&long_buy(dec!(30200)), &mut ctx).await.unwrap();
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_risk_level_multiplier_widens_allowance() {
        // Aggressive 배수 2 => 허용 2%, 이탈 1.33%는 통과
        let check = check_with(Some(long_position(dec!(30000))));
        let settings = RiskSettings {
            risk_level: RiskLevel::Aggressive,
            ..RiskSettings::default()
        };
        let mut ctx = TradingCheckContext::new(ticker(dec!(30500)), settings);

        let outcome = check.check(&long_buy(dec!(30400)), &mut ctx).await.unwrap();
        assert!(outcome.passed);

        // Cautious 배수 0.5 => 허용 0.5%, 이탈 0.66%는 실패
        let check = check_with(Some(long_position(dec!(30000))));
        let settings = RiskSettings {
            risk_level: RiskLevel::Cautious,
            ..RiskSettings::default()
        };
        let mut ctx = TradingCheckContext::new(ticker(dec!(30500)), settings);

        let outcome = check.check(&long_buy(dec!(30200)), &mut ctx).await.unwrap();
        assert!(!outcome.passed);
    }
}
