//! 검증 파이프라인.
//!
//! 등록된 검증들을 순서대로 실행하고 결과 리포트를 만듭니다.
//! 파이프라인 자체는 거래소 상태를 읽기만 하므로, 같은 컨텍스트로
//! 다시 실행하면 같은 리포트가 나옵니다.

use sentinel_core::{risk_span, PlannedOrder, SentinelResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Instrument};

use crate::checks::{CheckOutcome, TradingCheck};
use crate::context::TradingCheckContext;

/// 실패 검증을 만났을 때의 진행 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePolicy {
    /// 첫 실패에서 중단
    #[default]
    StopAtFirstFailure,
    /// 실패해도 나머지 검증을 계속 실행
    CollectAll,
}

/// 검증 한 건의 실행 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// 검증 이름
    pub name: String,
    /// 실행 결과. 건너뛴 검증은 `None`
    pub outcome: Option<CheckOutcome>,
}

impl CheckRecord {
    fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: None,
        }
    }

    fn executed(name: &str, outcome: CheckOutcome) -> Self {
        Self {
            name: name.to_string(),
            outcome: Some(outcome),
        }
    }
}

/// 파이프라인 실행 리포트.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    /// 실행 순서대로의 검증 기록
    pub records: Vec<CheckRecord>,
}

impl PipelineReport {
    /// 실행된 모든 검증이 통과했으면 `true`.
    ///
    /// 건너뛴 검증은 통과로 칩니다. 실행된 검증이 하나도 없어도
    /// 통과입니다.
    pub fn passed(&self) -> bool {
        self.records
            .iter()
            .filter_map(|record| record.outcome.as_ref())
            .all(|outcome| outcome.passed)
    }

    /// 첫 번째 실패 기록을 반환합니다.
    pub fn first_failure(&self) -> Option<&CheckRecord> {
        self.records.iter().find(|record| {
            record
                .outcome
                .as_ref()
                .is_some_and(|outcome| !outcome.passed)
        })
    }

    /// 실행된(건너뛰지 않은) 검증 수.
    pub fn executed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_some())
            .count()
    }
}

/// 주문 안전성 검증 파이프라인.
///
/// 검증은 등록 순서대로 실행됩니다. 앞선 검증이 컨텍스트 캐시를
/// 채워 두면 뒤의 검증은 재조회 없이 재사용합니다.
pub struct CheckPipeline {
    checks: Vec<Box<dyn TradingCheck>>,
    policy: PipelinePolicy,
}

impl CheckPipeline {
    /// 빈 파이프라인을 생성합니다.
    pub fn new(policy: PipelinePolicy) -> Self {
        Self {
            checks: Vec::new(),
            policy,
        }
    }

    /// 검증을 뒤에 추가합니다.
    pub fn with_check(mut self, check: Box<dyn TradingCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// 등록된 검증 수.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// 등록된 검증이 없으면 `true`.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// 주문에 대해 모든 검증을 실행합니다.
    ///
    /// `supports`가 `false`인 검증은 건너뜀으로 기록됩니다.
    /// `StopAtFirstFailure` 정책이면 첫 실패 이후의 검증은 실행하지
    /// 않고 리포트에도 남지 않습니다.
    ///
    /// # Errors
    ///
    /// 검증 내부의 조회/시뮬레이션 에러는 그대로 전파됩니다. 검증
    /// "실패"는 에러가 아니라 리포트에 기록되는 결과입니다.
    pub async fn run(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<PipelineReport> {
        let span = risk_span!("check_pipeline", order.symbol, order.side, order.id);
        self.run_inner(order, ctx).instrument(span).await
    }

    async fn run_inner(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<PipelineReport> {
        let mut report = PipelineReport::default();

        for check in &self.checks {
            let name = check.name();

            if !check.supports(order, ctx).await? {
                debug!(check = name, "건너뜀");
                report.records.push(CheckRecord::skipped(name));
                continue;
            }

            let outcome = check.check(order, ctx).await?;
            debug!(check = name, passed = outcome.passed, info = %outcome.info, "검증 완료");

            let failed = !outcome.passed;
            report.records.push(CheckRecord::executed(name, outcome));

            if failed && self.policy == PipelinePolicy::StopAtFirstFailure {
                break;
            }
        }

        info!(
            executed = report.executed_count(),
            total = self.checks.len(),
            passed = report.passed(),
            "파이프라인 완료"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use sentinel_core::{PositionSide, RiskSettings, Symbol, Ticker};

    use crate::checks::CheckFailure;

    struct FixedCheck {
        name: &'static str,
        supported: bool,
        outcome: CheckOutcome,
    }

    #[async_trait]
    impl TradingCheck for FixedCheck {
        fn name(&self) -> &str {
            self.name
        }

        async fn supports(
            &self,
            _order: &PlannedOrder,
            _ctx: &mut TradingCheckContext,
        ) -> SentinelResult<bool> {
            Ok(self.supported)
        }

        async fn check(
            &self,
            _order: &PlannedOrder,
            _ctx: &mut TradingCheckContext,
        ) -> SentinelResult<CheckOutcome> {
            Ok(self.outcome.clone())
        }
    }

    fn btc_usdt() -> Symbol {
        Symbol::new("BTC", "USDT", dec!(0.01))
    }

    fn ctx() -> TradingCheckContext {
        let symbol = btc_usdt();
        let price = symbol.price(dec!(30000)).unwrap();
        let ticker = Ticker::new(symbol, price.clone(), price.clone(), price);
        TradingCheckContext::new(ticker, RiskSettings::default())
    }

    fn buy_order() -> PlannedOrder {
        let symbol = btc_usdt();
        let price = symbol.price(dec!(30000)).unwrap();
        PlannedOrder::buy(symbol, PositionSide::Long, price, dec!(0.1), dec!(10))
    }

    fn passing(name: &'static str) -> Box<FixedCheck> {
        Box::new(FixedCheck {
            name,
            supported: true,
            outcome: CheckOutcome::pass("ok"),
        })
    }

    fn failing(name: &'static str) -> Box<FixedCheck> {
        Box::new(FixedCheck {
            name,
            supported: true,
            outcome: CheckOutcome::fail(
                CheckFailure::InsufficientContractBalance {
                    available: dec!(0),
                },
                "no balance",
            ),
        })
    }

    fn unsupported(name: &'static str) -> Box<FixedCheck> {
        Box::new(FixedCheck {
            name,
            supported: false,
            outcome: CheckOutcome::pass("unused"),
        })
    }

    #[tokio::test]
    async fn test_all_passing_pipeline() {
        let pipeline = CheckPipeline::new(PipelinePolicy::StopAtFirstFailure)
            .with_check(passing("a"))
            .with_check(passing("b"));
        let mut ctx = ctx();

        let report = pipeline.run(&buy_order(), &mut ctx).await.unwrap();

        assert!(report.passed());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.executed_count(), 2);
        assert!(report.first_failure().is_none());
    }

    #[tokio::test]
    async fn test_stop_at_first_failure_halts() {
        let pipeline = CheckPipeline::new(PipelinePolicy::StopAtFirstFailure)
            .with_check(passing("a"))
            .with_check(failing("b"))
            .with_check(passing("c"));
        let mut ctx = ctx();

        let report = pipeline.run(&buy_order(), &mut ctx).await.unwrap();

        assert!(!report.passed());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.first_failure().unwrap().name, "b");
    }

    #[tokio::test]
    async fn test_collect_all_continues_after_failure() {
        let pipeline = CheckPipeline::new(PipelinePolicy::CollectAll)
            .with_check(failing("a"))
            .with_check(passing("b"));
        let mut ctx = ctx();

        let report = pipeline.run(&buy_order(), &mut ctx).await.unwrap();

        assert!(!report.passed());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.executed_count(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_check_recorded_as_skipped() {
        let pipeline = CheckPipeline::new(PipelinePolicy::StopAtFirstFailure)
            .with_check(unsupported("a"))
            .with_check(passing("b"));
        let mut ctx = ctx();

        let report = pipeline.run(&buy_order(), &mut ctx).await.unwrap();

        assert!(report.passed());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.executed_count(), 1);
        assert!(report.records[0].outcome.is_none());
    }

    #[tokio::test]
    async fn test_empty_pipeline_passes() {
        let pipeline = CheckPipeline::new(PipelinePolicy::StopAtFirstFailure);
        let mut ctx = ctx();

        let report = pipeline.run(&buy_order(), &mut ctx).await.unwrap();
        assert!(report.passed());
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_yields_identical_report() {
        let pipeline = CheckPipeline::new(PipelinePolicy::CollectAll)
            .with_check(passing("a"))
            .with_check(unsupported("b"))
            .with_check(failing("c"));
        let mut ctx = ctx();

        let first = pipeline.run(&buy_order(), &mut ctx).await.unwrap();
        let second = pipeline.run(&buy_order(), &mut ctx).await.unwrap();

        assert_eq!(first, second);
    }
}
