//! 리스크 설정.
//!
//! 동적 파라미터 계산과 검증 파이프라인이 사용하는 리스크 설정을
//! 정의합니다. 설정은 (심볼 × 방향) 키로 조회하며, 필수 설정 누락은
//! 조용한 기본값이 아니라 명시적 에러입니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::domain::PositionSide;
use crate::error::{SentinelError, SentinelResult};
use crate::types::{Percent, Symbol};

/// 청산 안전 전략.
///
/// 매수 후 청산가 검증에서 안전 거리 창의 어느 쪽을 요구할지 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationSafetyStrategy {
    /// 청산가가 안전 거리 이상 멀어야 통과
    Conservative,
    /// 청산가가 안전 거리 창 안에 있으면 통과
    Moderate,
    /// 청산가가 안전 거리 이내로 가까워도 통과
    Aggressive,
}

impl Default for LiquidationSafetyStrategy {
    fn default() -> Self {
        LiquidationSafetyStrategy::Moderate
    }
}

/// 리스크 수준.
///
/// 진입가 거리 허용치 등 일부 한도에 곱해지는 배율을 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// 신중 (한도 절반)
    Cautious,
    /// 표준
    Standard,
    /// 공격적 (한도 2배)
    Aggressive,
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Standard
    }
}

impl RiskLevel {
    /// 한도에 곱해지는 배율을 반환합니다.
    pub fn multiplier(&self) -> Decimal {
        match self {
            RiskLevel::Cautious => dec!(0.5),
            RiskLevel::Standard => Decimal::ONE,
            RiskLevel::Aggressive => dec!(2),
        }
    }
}

/// 한 (심볼 × 방향)에 대한 리스크 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSettings {
    /// 경고 거리 계산에 쓰는 PnL 퍼센트 (기본값: 100%)
    #[serde(default = "default_warning_pnl_percent")]
    pub warning_pnl_percent: Percent,

    /// 청산 거리 대비 치명 구간 비율 (기본값: 30%)
    #[serde(default = "default_critical_part")]
    pub critical_part_of_liquidation_distance: Percent,

    /// 청산 거리 대비 추가 스톱 배치 비율 (기본값: 70%)
    #[serde(default = "default_add_stop_part")]
    pub part_of_liquidation_distance_to_add_stop: Percent,

    /// 청산 거리 대비 스톱 범위 폭 비율 (기본값: 5%)
    #[serde(default = "default_stop_range_part")]
    pub stop_range_part_of_liquidation_distance: Percent,

    /// 스톱 범위 폭 상한을 만드는 PnL 퍼센트 (기본값: 30%)
    #[serde(default = "default_stop_range_pnl_percent")]
    pub stop_range_pnl_percent: Percent,

    /// 스톱 점검 시작 거리 재정의. None이면 추가 스톱 거리의 1.5배
    #[serde(default)]
    pub check_stops_on_distance: Option<Decimal>,

    /// 스톱으로 덮여 있어야 하는 포지션 비율의 기본값 (기본값: 40%)
    #[serde(default = "default_acceptable_stopped_part")]
    pub acceptable_stopped_part: Percent,

    /// 손실 구간 스케일링 분모 (기본값: 2)
    #[serde(default = "default_acceptable_stopped_part_divider")]
    pub acceptable_stopped_part_divider: Decimal,

    /// 매수 후 청산가가 마크 가격에서 떨어져야 하는 안전 거리 (기본값: 5000)
    #[serde(default = "default_safe_liquidation_distance")]
    pub safe_liquidation_distance: Decimal,

    /// 청산 안전 전략 (기본값: moderate)
    #[serde(default)]
    pub safety_strategy: LiquidationSafetyStrategy,

    /// 리스크 수준 (기본값: standard)
    #[serde(default)]
    pub risk_level: RiskLevel,

    /// 평균 진입가 대비 최대 주문 거리 퍼센트 (기본값: 1%)
    #[serde(default = "default_entry_price_max_distance_percent")]
    pub entry_price_max_distance_percent: Percent,
}

// 기본값 함수들
fn default_warning_pnl_percent() -> Percent {
    Percent::unrestricted(dec!(100))
}

fn default_critical_part() -> Percent {
    Percent::unrestricted(dec!(30))
}

fn default_add_stop_part() -> Percent {
    Percent::unrestricted(dec!(70))
}

fn default_stop_range_part() -> Percent {
    Percent::unrestricted(dec!(5))
}

fn default_stop_range_pnl_percent() -> Percent {
    Percent::unrestricted(dec!(30))
}

fn default_acceptable_stopped_part() -> Percent {
    Percent::unrestricted(dec!(40))
}

fn default_acceptable_stopped_part_divider() -> Decimal {
    dec!(2)
}

fn default_safe_liquidation_distance() -> Decimal {
    dec!(5000)
}

fn default_entry_price_max_distance_percent() -> Percent {
    Percent::unrestricted(dec!(1))
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            warning_pnl_percent: default_warning_pnl_percent(),
            critical_part_of_liquidation_distance: default_critical_part(),
            part_of_liquidation_distance_to_add_stop: default_add_stop_part(),
            stop_range_part_of_liquidation_distance: default_stop_range_part(),
            stop_range_pnl_percent: default_stop_range_pnl_percent(),
            check_stops_on_distance: None,
            acceptable_stopped_part: default_acceptable_stopped_part(),
            acceptable_stopped_part_divider: default_acceptable_stopped_part_divider(),
            safe_liquidation_distance: default_safe_liquidation_distance(),
            safety_strategy: LiquidationSafetyStrategy::default(),
            risk_level: RiskLevel::default(),
            entry_price_max_distance_percent: default_entry_price_max_distance_percent(),
        }
    }
}

impl RiskSettings {
    /// 기본값으로 새 설정을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 보수적인 설정을 생성합니다 (먼 스톱, 넓은 안전 거리).
    pub fn conservative() -> Self {
        Self {
            critical_part_of_liquidation_distance: Percent::unrestricted(dec!(40)),
            part_of_liquidation_distance_to_add_stop: Percent::unrestricted(dec!(60)),
            acceptable_stopped_part: Percent::unrestricted(dec!(60)),
            safe_liquidation_distance: dec!(8000),
            safety_strategy: LiquidationSafetyStrategy::Conservative,
            risk_level: RiskLevel::Cautious,
            ..Self::default()
        }
    }

    /// 공격적인 설정을 생성합니다 (가까운 스톱, 좁은 안전 거리).
    pub fn aggressive() -> Self {
        Self {
            critical_part_of_liquidation_distance: Percent::unrestricted(dec!(20)),
            part_of_liquidation_distance_to_add_stop: Percent::unrestricted(dec!(80)),
            acceptable_stopped_part: Percent::unrestricted(dec!(25)),
            safe_liquidation_distance: dec!(3000),
            safety_strategy: LiquidationSafetyStrategy::Aggressive,
            risk_level: RiskLevel::Aggressive,
            ..Self::default()
        }
    }

    /// 설정 값을 검증합니다.
    ///
    /// # Errors
    ///
    /// `SentinelError::Config`: 범위를 벗어난 값이 있는 경우
    pub fn validate(&self) -> SentinelResult<()> {
        if self.warning_pnl_percent.value() <= Decimal::ZERO {
            return Err(SentinelError::Config(
                "warning_pnl_percent must be greater than 0".into(),
            ));
        }

        for (name, pct) in [
            (
                "critical_part_of_liquidation_distance",
                &self.critical_part_of_liquidation_distance,
            ),
            (
                "part_of_liquidation_distance_to_add_stop",
                &self.part_of_liquidation_distance_to_add_stop,
            ),
            (
                "stop_range_part_of_liquidation_distance",
                &self.stop_range_part_of_liquidation_distance,
            ),
            ("acceptable_stopped_part", &self.acceptable_stopped_part),
            (
                "entry_price_max_distance_percent",
                &self.entry_price_max_distance_percent,
            ),
        ] {
            if pct.value() <= Decimal::ZERO || pct.value() > dec!(100) {
                return Err(SentinelError::Config(format!(
                    "{} must be between 0 and 100",
                    name
                )));
            }
        }

        if self.stop_range_pnl_percent.value() <= Decimal::ZERO {
            return Err(SentinelError::Config(
                "stop_range_pnl_percent must be greater than 0".into(),
            ));
        }

        if self.acceptable_stopped_part_divider <= Decimal::ZERO {
            return Err(SentinelError::Config(
                "acceptable_stopped_part_divider must be greater than 0".into(),
            ));
        }

        if self.safe_liquidation_distance < Decimal::ZERO {
            return Err(SentinelError::Config(
                "safe_liquidation_distance must not be negative".into(),
            ));
        }

        if let Some(distance) = self.check_stops_on_distance {
            if distance <= Decimal::ZERO {
                return Err(SentinelError::Config(
                    "check_stops_on_distance must be greater than 0".into(),
                ));
            }
        }

        // 스톱 배치 구간이 치명 구간을 포함해야 범위 클램프가 성립함
        if self.part_of_liquidation_distance_to_add_stop.value()
            < self.critical_part_of_liquidation_distance.value()
        {
            return Err(SentinelError::Config(
                "part_of_liquidation_distance_to_add_stop must not be less than \
                 critical_part_of_liquidation_distance"
                    .into(),
            ));
        }

        Ok(())
    }
}

/// 리스크 설정 조회 제공자.
///
/// 동적 파라미터와 검증 파이프라인은 설정을 전역 레지스트리가 아니라
/// 이 trait을 통해 생성자 주입으로 받습니다.
pub trait SettingsProvider: Send + Sync {
    /// (심볼 × 방향) 키의 리스크 설정을 반환합니다.
    ///
    /// `alternatives_allowed`가 참이면 심볼별 설정이 없을 때 전역 기본
    /// 설정으로 폴백합니다. 거짓이면 누락은 `MissingSetting` 에러입니다.
    fn risk_settings(
        &self,
        symbol: &Symbol,
        side: PositionSide,
        alternatives_allowed: bool,
    ) -> SentinelResult<RiskSettings>;
}

/// 메모리 내 정적 설정 제공자.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsProvider {
    entries: HashMap<(String, PositionSide), RiskSettings>,
    fallback: Option<RiskSettings>,
}

impl StaticSettingsProvider {
    /// 빈 제공자를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 전역 기본 설정을 지정합니다.
    pub fn with_fallback(mut self, settings: RiskSettings) -> Self {
        self.fallback = Some(settings);
        self
    }

    /// (심볼 × 방향) 키의 설정을 등록합니다.
    pub fn insert(&mut self, symbol: &Symbol, side: PositionSide, settings: RiskSettings) {
        self.entries.insert((symbol.to_string(), side), settings);
    }

    fn key_of(symbol: &Symbol, side: PositionSide) -> String {
        format!("{}:{:?}", symbol, side)
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn risk_settings(
        &self,
        symbol: &Symbol,
        side: PositionSide,
        alternatives_allowed: bool,
    ) -> SentinelResult<RiskSettings> {
        if let Some(settings) = self.entries.get(&(symbol.to_string(), side)) {
            return Ok(settings.clone());
        }

        if alternatives_allowed {
            if let Some(fallback) = &self.fallback {
                return Ok(fallback.clone());
            }
        }

        Err(SentinelError::MissingSetting {
            key: Self::key_of(symbol, side),
        })
    }
}

/// 설정 파일 레이아웃.
///
/// `default` 섹션은 전역 폴백, `long`/`short` 섹션은 심볼 문자열
/// (`"BTC/USDT"`) 키의 방향별 설정입니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    /// 전역 기본 설정
    #[serde(default)]
    pub default: Option<RiskSettings>,
    /// 롱 포지션 심볼별 설정
    #[serde(default)]
    pub long: HashMap<String, RiskSettings>,
    /// 숏 포지션 심볼별 설정
    #[serde(default)]
    pub short: HashMap<String, RiskSettings>,
}

impl SettingsFile {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> SentinelResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .try_parsing(true),
            );

        let file: SettingsFile = builder.build()?.try_deserialize()?;
        Ok(file)
    }

    /// 모든 항목을 검증하고 정적 제공자로 변환합니다.
    pub fn into_provider(self) -> SentinelResult<StaticSettingsProvider> {
        let mut provider = StaticSettingsProvider::new();

        if let Some(fallback) = self.default {
            fallback.validate()?;
            provider.fallback = Some(fallback);
        }

        for (side, table) in [
            (PositionSide::Long, self.long),
            (PositionSide::Short, self.short),
        ] {
            for (name, settings) in table {
                settings.validate()?;
                // 조회 키는 (base, quote)만 쓰므로 호가 단위는 자리표시자
                let symbol = Symbol::from_string(&name, dec!(0.01)).ok_or_else(|| {
                    SentinelError::Config(format!("invalid symbol key: {}", name))
                })?;
                provider.insert(&symbol, side, settings);
            }
        }

        Ok(provider)
    }
}
