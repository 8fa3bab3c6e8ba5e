//! 검증 파이프라인 시나리오 테스트
//!
//! 실제 협력자 구현(선형 청산가 추정기, 테이커 수수료 비용 계산기)으로
//! 전체 파이프라인을 구성하고 대표 시나리오를 검증합니다.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sentinel_core::{
    AccountBalance, LinearLiquidationEstimator, PlacedStop, PlannedOrder, Position,
    PositionProvider, PositionSide, ProviderError, RiskSettings, StopOrderProvider, Symbol,
    TakerFeeCostCalculator, Ticker,
};
use sentinel_risk::{
    AvailableBalanceCheck, AveragePriceDistanceCheck, BuyLiquidationCheck, CheckFailure,
    CheckPipeline, FixationStopsCheck, PipelinePolicy, StopMainLiquidationCheck,
    TradingCheckContext,
};

struct ExchangeStub {
    long: Option<Position>,
    short: Option<Position>,
    free: Decimal,
    stops: Vec<PlacedStop>,
}

#[async_trait]
impl PositionProvider for ExchangeStub {
    async fn fetch_position(
        &self,
        _symbol: &Symbol,
        side: PositionSide,
    ) -> Result<Option<Position>, ProviderError> {
        Ok(match side {
            PositionSide::Long => self.long.clone(),
            PositionSide::Short => self.short.clone(),
        })
    }

    async fn fetch_balance(&self) -> Result<AccountBalance, ProviderError> {
        Ok(AccountBalance {
            free: self.free,
            total: self.free,
        })
    }
}

#[async_trait]
impl StopOrderProvider for ExchangeStub {
    async fn fetch_stops(
        &self,
        _symbol: &Symbol,
        _side: PositionSide,
    ) -> Result<Vec<PlacedStop>, ProviderError> {
        Ok(self.stops.clone())
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

fn full_pipeline(exchange: Arc<ExchangeStub>) -> CheckPipeline {
    let estimator = Arc::new(LinearLiquidationEstimator::new(dec!(0)));
    let cost = Arc::new(TakerFeeCostCalculator::new(dec!(0.00055)));

    CheckPipeline::new(PipelinePolicy::StopAtFirstFailure)
        .with_check(Box::new(BuyLiquidationCheck::new(
            exchange.clone(),
            estimator.clone(),
            cost.clone(),
        )))
        .with_check(Box::new(AvailableBalanceCheck::new(exchange.clone())))
        .with_check(Box::new(AveragePriceDistanceCheck::new(exchange.clone())))
        .with_check(Box::new(FixationStopsCheck::new(
            exchange.clone(),
            exchange.clone(),
        )))
        .with_check(Box::new(StopMainLiquidationCheck::new(
            exchange, estimator, cost,
        )))
}

fn short_position(entry: Decimal, size: Decimal, liquidation: Decimal) -> Position {
    let symbol = btc_usdt();
    let entry = symbol.price(entry).unwrap();
    let liquidation = symbol.price(liquidation).unwrap();
    Position::new(symbol, PositionSide::Short, entry, size, dec!(10))
        .with_liquidation(Some(liquidation))
}

#[tokio::test]
async fn test_buy_moving_liquidation_inside_safe_distance_fails() {
    // 숏 0.01 (진입 30000, 청산 30100)에 0.003을 29000에 추가 매수.
    // 잔고가 얇아 체결 후 청산가가 시세에서 5000 안으로 들어옴.
    let exchange = Arc::new(ExchangeStub {
        long: None,
        short: Some(short_position(dec!(30000), dec!(0.01), dec!(30100))),
        free: dec!(10),
        stops: vec![],
    });
    let pipeline = full_pipeline(exchange);
    let mut ctx = TradingCheckContext::new(ticker(dec!(29000)), RiskSettings::default());

    let symbol = btc_usdt();
    let price = symbol.price(dec!(29000)).unwrap();
    let buy = PlannedOrder::buy(symbol, PositionSide::Short, price, dec!(0.003), dec!(10));

    let report = pipeline.run(&buy, &mut ctx).await.unwrap();

    assert!(!report.passed());
    let failure = report.first_failure().unwrap();
    assert_eq!(failure.name, "buy_liquidation");
    assert_eq!(
        failure.outcome.as_ref().unwrap().failure,
        Some(CheckFailure::FurtherPositionLiquidationAfterBuyIsTooClose {
            delta: dec!(3842.47),
            safe_distance: dec!(5000),
        })
    );
}

#[tokio::test]
async fn test_buy_with_ample_balance_passes_all_checks() {
    let exchange = Arc::new(ExchangeStub {
        long: None,
        short: Some(short_position(dec!(30000), dec!(0.01), dec!(30100))),
        free: dec!(100000),
        stops: vec![],
    });
    let pipeline = full_pipeline(exchange);
    let mut ctx = TradingCheckContext::new(ticker(dec!(29000)), RiskSettings::default());

    // 평균 진입가 이탈 검증을 통과하도록 진입가와 같은 가격으로 추가 매수
    let symbol = btc_usdt();
    let price = symbol.price(dec!(30000)).unwrap();
    let buy = PlannedOrder::buy(symbol, PositionSide::Short, price, dec!(0.003), dec!(10));

    let report = pipeline.run(&buy, &mut ctx).await.unwrap();

    assert!(report.passed());
    // 스톱 검증만 건너뛰고 나머지 넷은 실행됨
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.executed_count(), 4);
    assert!(report
        .records
        .iter()
        .find(|record| record.name == "stop_main_liquidation")
        .unwrap()
        .outcome
        .is_none());
}

#[tokio::test]
async fn test_support_stop_weakening_main_cover_fails() {
    // 롱 1.0이 주, 숏 0.4가 보조인 헤지에서 보조를 0.2 줄이면
    // 주 포지션 청산가가 25400으로 재산출되어 시세 30000에서 4600 거리.
    let symbol = btc_usdt();
    let entry = symbol.price(dec!(30000)).unwrap();
    let long = Position::new(
        symbol.clone(),
        PositionSide::Long,
        entry.clone(),
        dec!(1),
        dec!(10),
    )
    .with_is_main(true);
    let short = Position::new(symbol.clone(), PositionSide::Short, entry, dec!(0.4), dec!(10));

    let exchange = Arc::new(ExchangeStub {
        long: Some(long),
        short: Some(short),
        free: dec!(1000),
        stops: vec![],
    });
    let pipeline = full_pipeline(exchange);
    let mut ctx = TradingCheckContext::new(ticker(dec!(30000)), RiskSettings::default());

    let price = symbol.price(dec!(30000)).unwrap();
    let stop = PlannedOrder::stop(symbol, PositionSide::Short, price, dec!(0.2), dec!(10));

    let report = pipeline.run(&stop, &mut ctx).await.unwrap();

    assert!(!report.passed());
    let failure = report.first_failure().unwrap();
    assert_eq!(failure.name, "stop_main_liquidation");
    assert_eq!(
        failure.outcome.as_ref().unwrap().failure,
        Some(CheckFailure::MainPositionLiquidationAfterStopIsTooClose {
            delta: dec!(4600),
            safe_distance: dec!(5000),
        })
    );
}

#[tokio::test]
async fn test_rerun_with_same_context_yields_identical_report() {
    let exchange = Arc::new(ExchangeStub {
        long: None,
        short: Some(short_position(dec!(30000), dec!(0.01), dec!(30100))),
        free: dec!(10),
        stops: vec![],
    });
    let pipeline = full_pipeline(exchange);
    let mut ctx = TradingCheckContext::new(ticker(dec!(29000)), RiskSettings::default());

    let symbol = btc_usdt();
    let price = symbol.price(dec!(29000)).unwrap();
    let buy = PlannedOrder::buy(symbol, PositionSide::Short, price, dec!(0.003), dec!(10));

    let first = pipeline.run(&buy, &mut ctx).await.unwrap();
    let second = pipeline.run(&buy, &mut ctx).await.unwrap();

    assert_eq!(first, second);
}
