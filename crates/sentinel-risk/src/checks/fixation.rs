//! 이익 고정 스톱 검증.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use sentinel_core::{
    OrderKind, PlacedStop, PlannedOrder, PositionProvider, PositionSide, SentinelResult,
    StopOrderProvider,
};

use crate::checks::{CheckFailure, CheckOutcome, TradingCheck};
use crate::context::TradingCheckContext;

/// 스톱 주문 조회 캐시 유지 시간.
const STOPS_CACHE_TTL: Duration = Duration::from_secs(5);

/// 진입가와 시세 사이에 걸린 이익 고정 스톱이 있는지 검증합니다.
///
/// 이익 중인 포지션에만 적용됩니다. 진입가와 현재 시세 사이에 놓인
/// 스톱은 이미 이익 일부를 고정하고 있다는 뜻이므로, 이 상태에서
/// 추가 주문을 내면 고정된 이익 구조가 깨집니다. 스톱 목록 조회는
/// 짧은 시간 캐시되어 연속 검증에서 재조회하지 않습니다.
pub struct FixationStopsCheck {
    positions: Arc<dyn PositionProvider>,
    stops: Arc<dyn StopOrderProvider>,
    cache: Mutex<HashMap<(String, PositionSide), (Instant, Vec<PlacedStop>)>>,
    ttl: Duration,
}

impl FixationStopsCheck {
    /// 새 검증을 생성합니다.
    pub fn new(positions: Arc<dyn PositionProvider>, stops: Arc<dyn StopOrderProvider>) -> Self {
        Self {
            positions,
            stops,
            cache: Mutex::new(HashMap::new()),
            ttl: STOPS_CACHE_TTL,
        }
    }

    /// 캐시 유지 시간을 바꿉니다.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn fetch_stops_cached(
        &self,
        order: &PlannedOrder,
    ) -> SentinelResult<Vec<PlacedStop>> {
        let key = (order.symbol.to_string(), order.side);
        let mut cache = self.cache.lock().await;

        if let Some((fetched_at, stops)) = cache.get(&key) {
            if fetched_at.elapsed() < self.ttl {
                return Ok(stops.clone());
            }
        }

        let stops = self.stops.fetch_stops(&order.symbol, order.side).await?;
        cache.insert(key, (Instant::now(), stops.clone()));
        Ok(stops)
    }
}

#[async_trait]
impl TradingCheck for FixationStopsCheck {
    fn name(&self) -> &str {
        "fixation_stops"
    }

    async fn supports(
        &self,
        order: &PlannedOrder,
        ctx: &mut TradingCheckContext,
    ) -> SentinelResult<bool> {
        if order.kind != OrderKind::Buy {
            return Ok(false);
        }

        let mark = ctx.ticker.mark_price.clone();
        let position = ctx
            .ensure_position(self.positions.as_ref(), order.side)
            .await?;
        match position {
            Some(position) => {
                let in_profit = !position.in_loss_at(&mark)
                    && position.entry_price.value() != mark.value();
                Ok(in_profit)
            }
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
        let mark = ctx.ticker.mark_price.value();
        let lower = entry.min(mark);
        let upper = entry.max(mark);

        let stops = self.fetch_stops_cached(order).await?;
        let count = stops
            .iter()
            .filter(|stop| {
                let price = stop.price.value();
                lower < price && price < upper
            })
            .count();

        debug!(
            entry = %entry,
            mark = %mark,
            total_stops = stops.len(),
            fixations = count,
            "이익 고정 스톱 평가"
        );

        if count > 0 {
            return Ok(CheckOutcome::fail(
                CheckFailure::FixationsFound { count },
                format!(
                    "진입가 {}와 시세 {} 사이에 스톱 {}건",
                    entry, mark, count
                ),
            ));
        }

        Ok(CheckOutcome::pass("진입가와 시세 사이 스톱 없음"))
    }
}
