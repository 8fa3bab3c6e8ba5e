//! 청산 동적 파라미터.
//!
//! 설정과 실시간 시세를 한 포지션의 일관된 리스크 임계값 집합으로
//! 변환합니다. 개입이 필요한지 판단할 때와 개입 규모를 정할 때 모두
//! 이 모듈의 값을 사용합니다. 모든 PnL-가격 변환은 `pnl` 모듈의
//! 단일 함수를 거칩니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use sentinel_core::{
    pnl_percent_to_price_delta, Percent, Position, PositionSide, Price, PriceRange, RiskSettings,
    SentinelError, SentinelResult, Ticker,
};

/// 정상 시나리오에서 경고 거리에 적용하는 청산 거리 대비 하한 비율.
const WARNING_FLOOR_PART: Decimal = dec!(30);

/// `check_stops_on_distance` 기본 배수.
const CHECK_STOPS_FACTOR: Decimal = dec!(1.5);

/// 한 포지션에 대한 동적 리스크 임계값 계산기.
///
/// 포지션, 티커, 설정의 불변 스냅샷 위에서 동작하며 내부 상태를
/// 갖지 않습니다. 같은 입력에 대해 항상 같은 값을 반환합니다.
pub struct LiquidationDynamicParams<'a> {
    position: &'a Position,
    ticker: &'a Ticker,
    settings: &'a RiskSettings,
    liquidation: Price,
}

impl<'a> LiquidationDynamicParams<'a> {
    /// 새 계산기를 생성합니다.
    ///
    /// # Errors
    ///
    /// - `SentinelError::SymbolMismatch`: 티커와 포지션의 심볼이 다른 경우
    /// - `SentinelError::Position`: 청산 가격이 없거나, 레버리지가 0 이하이거나,
    ///   진입가와 청산가가 같은 경우
    pub fn new(
        position: &'a Position,
        ticker: &'a Ticker,
        settings: &'a RiskSettings,
    ) -> SentinelResult<Self> {
        if ticker.symbol != position.symbol {
            return Err(SentinelError::SymbolMismatch {
                expected: position.symbol.to_string(),
                actual: ticker.symbol.to_string(),
            });
        }

        let liquidation = position
            .liquidation_price
            .clone()
            .ok_or_else(|| SentinelError::Position("청산 가격이 없는 포지션".to_string()))?;

        if position.leverage <= Decimal::ZERO {
            return Err(SentinelError::Position(format!(
                "레버리지가 0 이하: {}",
                position.leverage
            )));
        }

        if liquidation == position.entry_price {
            return Err(SentinelError::Position(
                "진입가와 청산가가 같은 포지션".to_string(),
            ));
        }

        Ok(Self {
            position,
            ticker,
            settings,
            liquidation,
        })
    }

    /// 진입가와 청산가 사이의 전체 거리.
    pub fn liquidation_distance(&self) -> Decimal {
        self.position.entry_price.difference(&self.liquidation)
    }

    /// 청산가에서 진입가 방향으로의 부호 (+1 또는 −1).
    fn sign(&self) -> Decimal {
        if self.position.entry_price > self.liquidation {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        }
    }

    /// 청산가가 진입가의 손실 방향에 있는 정상 시나리오인지 확인합니다.
    ///
    /// 비정상 시나리오에서는 경고 거리 하한을 적용하지 않습니다.
    fn is_normal_scenario(&self) -> bool {
        match self.position.side {
            PositionSide::Long => self.liquidation < self.position.entry_price,
            PositionSide::Short => self.liquidation > self.position.entry_price,
        }
    }

    /// 경고 거리.
    ///
    /// 마크 가격 기준 경고 PnL 퍼센트의 가격 거리이며, 정상 시나리오에서는
    /// 청산 거리의 30%를 하한으로 합니다.
    pub fn warning_distance(&self) -> Decimal {
        let base = pnl_percent_to_price_delta(
            &self.settings.warning_pnl_percent,
            &self.ticker.mark_price,
            self.position.leverage,
        );

        if self.is_normal_scenario() {
            let floor = Percent::unrestricted(WARNING_FLOOR_PART).of(self.liquidation_distance());
            base.max(floor)
        } else {
            base
        }
    }

    /// 치명 거리. 이 값보다 작은 거리를 근거로 거래 결정을 내리면 안 됩니다.
    pub fn critical_distance(&self) -> Decimal {
        self.settings
            .critical_part_of_liquidation_distance
            .of(self.liquidation_distance())
    }

    /// 청산가에 인접하고 진입가 방향으로 뻗는 치명 구간.
    pub fn critical_range(&self) -> SentinelResult<PriceRange> {
        let inner = self
            .liquidation
            .offset(self.sign() * self.critical_distance())?;
        PriceRange::ordered(self.liquidation.clone(), inner)
    }

    /// 추가 스톱을 배치할 청산가로부터의 거리.
    ///
    /// 설정 비율의 청산 거리와 경고 거리 중 큰 값입니다. `min_with_ticker`가
    /// 참이면 현재 마크 가격 위치로 추가 상한을 적용해, 제안되는 스톱이
    /// 청산가 너머에 놓이는 일을 막습니다.
    pub fn additional_stop_distance(&self, min_with_ticker: bool) -> SentinelResult<Decimal> {
        let part = self
            .settings
            .part_of_liquidation_distance_to_add_stop
            .of(self.liquidation_distance());
        let mut distance = part.max(self.warning_distance());

        if min_with_ticker {
            let mark_to_liquidation = self.ticker.mark_price.difference(&self.liquidation);
            let cap = if self.critical_range()?.contains(&self.ticker.mark_price) {
                self.critical_distance()
            } else {
                mark_to_liquidation
            };
            distance = distance.min(cap);
        }

        Ok(distance)
    }

    /// 추가 스톱 가격: 청산가를 진입가 방향으로 이동시킨 가격.
    pub fn additional_stop_price(&self) -> SentinelResult<Price> {
        self.liquidation
            .offset(self.sign() * self.additional_stop_distance(true)?)
    }

    /// 스톱 수량 점검을 시작할 거리.
    ///
    /// 설정 재정의가 있으면 그 값, 없으면 추가 스톱 거리의 1.5배입니다.
    pub fn check_stops_on_distance(&self) -> SentinelResult<Decimal> {
        match self.settings.check_stops_on_distance {
            Some(distance) => Ok(distance),
            None => Ok(CHECK_STOPS_FACTOR * self.additional_stop_distance(false)?),
        }
    }

    /// 추가 스톱 가격 주변의 스톱 배치 범위.
    ///
    /// 폭은 설정 비율의 청산 거리를 PnL 기반 상한의 `[50%, 100%]`로
    /// 클램프한 값입니다. 청산 쪽 경계는 치명 구간 밖으로, 시장 쪽 경계는
    /// 마크 가격 안으로 제한됩니다. 0 이하 가격이 나오는 비정상 입력은
    /// 같은 중심의 `min(후보 폭, 100% PnL 폭)`으로 폭을 재산출합니다.
    pub fn actual_stops_range(&self) -> SentinelResult<PriceRange> {
        let center = self.additional_stop_price()?;
        let leverage = self.position.leverage;

        let candidate = self
            .settings
            .stop_range_part_of_liquidation_distance
            .of(self.liquidation_distance());
        let bound = pnl_percent_to_price_delta(
            &self.settings.stop_range_pnl_percent,
            &center,
            leverage,
        );

        let mut width = candidate.clamp(bound / dec!(2), bound);
        if center.value() - width / dec!(2) <= Decimal::ZERO {
            let full_pnl_width =
                pnl_percent_to_price_delta(&Percent::unrestricted(dec!(100)), &center, leverage);
            width = candidate.min(full_pnl_width);
        }

        let half = width / dec!(2);
        let s = self.sign();

        let mut liquidation_side = center.value() - s * half;
        let mut market_side = center.value() + s * half;

        // 청산 쪽 경계는 치명 구간 경계까지만 접근
        let critical = self.critical_range()?;
        let liquidation_side_price = self.position.symbol.price(liquidation_side)?;
        if critical.contains(&liquidation_side_price) {
            liquidation_side = self.liquidation.value() + s * self.critical_distance();
        }

        // 시장 쪽 경계는 마크 가격을 넘지 않음
        let mark = self.ticker.mark_price.value();
        if s > Decimal::ZERO {
            market_side = market_side.min(mark);
        } else {
            market_side = market_side.max(mark);
        }

        // 두 클램프가 같은 가격으로 수렴하면 최소 폭 한 틱을 확보
        if liquidation_side == market_side {
            market_side += s * self.position.symbol.tick_size;
        }

        let range = PriceRange::ordered(
            self.position.symbol.price(liquidation_side)?,
            self.position.symbol.price(market_side)?,
        )?;

        // 반개구간 특성상 중심이 상단 경계와 같아질 수 있음
        if !range.contains(&center) && &center == range.to() {
            let extended = range.to().offset(range.to().tick())?;
            return PriceRange::new(range.from().clone(), extended);
        }

        Ok(range)
    }

    /// 이미 스톱으로 덮여 있어야 하는 포지션 수량 비율.
    ///
    /// 세 가지 산출 방식의 최댓값을 100 상한으로 반환합니다:
    /// - 설정의 고정 비율
    /// - 청산까지 남은 거리가 경고 거리 이내일 때: 경고 거리 대비
    ///   소진된 비율을 분모로 나눈 값
    /// - 손실 구간일 때: 청산 거리 대비 남은 비율로 스케일링하고
    ///   경고/남은 거리 보정 계수(최대 1)를 곱한 값
    pub fn acceptable_stopped_part(&self) -> Percent {
        let divider = self.settings.acceptable_stopped_part_divider;
        let warning = self.warning_distance();
        let remaining = self.ticker.mark_price.difference(&self.liquidation);

        let mut best = self.settings.acceptable_stopped_part.value();

        if remaining <= warning && warning > Decimal::ZERO {
            let approaching = (warning - remaining) / warning * dec!(100) / divider;
            best = best.max(approaching);
        }

        if self.position.in_loss_at(&self.ticker.mark_price) {
            let remaining_pct = remaining / self.liquidation_distance() * dec!(100);
            let modifier = if remaining > Decimal::ZERO {
                (warning / remaining).min(Decimal::ONE)
            } else {
                Decimal::ONE
            };
            let in_loss = (dec!(100) - remaining_pct) / divider * modifier;
            best = best.max(in_loss);
        }

        Percent::unrestricted(best.min(dec!(100)))
    }
}
