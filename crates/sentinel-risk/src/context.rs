//! 검증 컨텍스트.
//!
//! 한 번의 평가 동안 공유되는 시세/포지션/샌드박스 상태 캐시입니다.
//! 평가마다 새로 생성되어 평가가 끝나면 버려지며, 포지션과 잔고 조회는
//! 첫 요청 시 한 번만 수행됩니다. 이후 검증은 캐시를 재사용하므로 같은
//! 입력에 대한 재실행은 동일한 결과를 냅니다.

use std::collections::HashMap;

use sentinel_core::{
    PositionProvider, Position, PositionSide, RiskSettings, SentinelResult, Ticker,
};
use sentinel_sandbox::SandboxState;

/// 한 번의 주문 평가에 대한 공유 컨텍스트.
pub struct TradingCheckContext {
    /// 평가 기준 시세 스냅샷
    pub ticker: Ticker,
    /// 평가에 적용되는 리스크 설정
    pub settings: RiskSettings,
    positions: HashMap<PositionSide, Option<Position>>,
    sandbox_state: Option<SandboxState>,
}

impl TradingCheckContext {
    /// 새 컨텍스트를 생성합니다.
    pub fn new(ticker: Ticker, settings: RiskSettings) -> Self {
        Self {
            ticker,
            settings,
            positions: HashMap::new(),
            sandbox_state: None,
        }
    }

    /// 방향의 현재 포지션을 조회하고 캐시합니다.
    ///
    /// 포지션이 없다는 응답(`None`)도 캐시되어 재조회하지 않습니다.
    pub async fn ensure_position(
        &mut self,
        provider: &dyn PositionProvider,
        side: PositionSide,
    ) -> SentinelResult<Option<Position>> {
        if let Some(cached) = self.positions.get(&side) {
            return Ok(cached.clone());
        }

        let fetched = provider.fetch_position(&self.ticker.symbol, side).await?;
        self.positions.insert(side, fetched.clone());
        Ok(fetched)
    }

    /// 포지션 캐시를 직접 채웁니다.
    ///
    /// 호출자가 이미 포지션 스냅샷을 들고 있을 때 재조회를 피합니다.
    pub fn prime_position(&mut self, side: PositionSide, position: Option<Position>) {
        self.positions.insert(side, position);
    }

    /// 잔고와 양방향 포지션으로 샌드박스 상태를 만들고 캐시합니다.
    pub async fn ensure_sandbox_state(
        &mut self,
        provider: &dyn PositionProvider,
    ) -> SentinelResult<SandboxState> {
        if let Some(state) = &self.sandbox_state {
            return Ok(state.clone());
        }

        let long = self.ensure_position(provider, PositionSide::Long).await?;
        let short = self.ensure_position(provider, PositionSide::Short).await?;
        let balance = provider.fetch_balance().await?;

        let state = SandboxState::new(
            self.ticker.symbol.clone(),
            self.ticker.last_price.clone(),
            balance.free,
            long,
            short,
        )?;
        self.sandbox_state = Some(state.clone());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sentinel_core::{AccountBalance, Price, ProviderError, Symbol};

    struct CountingProvider {
        position: Option<Position>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PositionProvider for CountingProvider {
        async fn fetch_position(
            &self,
            _symbol: &Symbol,
            side: PositionSide,
        ) -> Result<Option<Position>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
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

    #[tokio::test]
    async fn test_ensure_position_fetches_once() {
        let provider = CountingProvider {
            position: Some(long_position(dec!(30000))),
            calls: AtomicUsize::new(0),
        };
        let mut ctx = TradingCheckContext::new(ticker(dec!(30000)), RiskSettings::default());

        let first = ctx
            .ensure_position(&provider, PositionSide::Long)
            .await
            .unwrap();
        let second = ctx
            .ensure_position(&provider, PositionSide::Long)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_position_caches_none_answer() {
        let provider = CountingProvider {
            position: None,
            calls: AtomicUsize::new(0),
        };
        let mut ctx = TradingCheckContext::new(ticker(dec!(30000)), RiskSettings::default());

        assert!(ctx
            .ensure_position(&provider, PositionSide::Short)
            .await
            .unwrap()
            .is_none());
        assert!(ctx
            .ensure_position(&provider, PositionSide::Short)
            .await
            .unwrap()
            .is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ensure_sandbox_state_built_from_fetches() {
        let provider = CountingProvider {
            position: Some(long_position(dec!(30000))),
            calls: AtomicUsize::new(0),
        };
        let mut ctx = TradingCheckContext::new(ticker(dec!(29000)), RiskSettings::default());

        let state = ctx.ensure_sandbox_state(&provider).await.unwrap();
        assert_eq!(state.free_balance(), dec!(1000));
        assert!(state.position(PositionSide::Long).is_some());
        assert!(state.position(PositionSide::Short).is_none());

        // 두 번째 호출은 캐시 사용
        let again = ctx.ensure_sandbox_state(&provider).await.unwrap();
        assert_eq!(again.free_balance(), dec!(1000));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_prime_position_skips_fetch() {
        let provider = CountingProvider {
            position: None,
            calls: AtomicUsize::new(0),
        };
        let mut ctx = TradingCheckContext::new(ticker(dec!(30000)), RiskSettings::default());

        ctx.prime_position(PositionSide::Long, Some(long_position(dec!(30000))));
        let cached = ctx
            .ensure_position(&provider, PositionSide::Long)
            .await
            .unwrap();

        assert!(cached.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
