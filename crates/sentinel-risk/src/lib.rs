//! # Sentinel Risk
//!
//! 청산 동적 파라미터와 주문 안전성 검증 파이프라인을 제공합니다.
//!
//! - `LiquidationDynamicParams` - 포지션별 리스크 임계값 계산
//! - `TradingCheckContext` - 한 번의 평가 동안 공유되는 조회 캐시
//! - `CheckPipeline` - 주문을 내보내기 전 실행되는 검증 시퀀스
//! - 검증 구현: 매수 후 청산가, 평균 진입가 이탈, 이익 고정 스톱,
//!   가용 잔고, 보조 스톱 후 주 포지션 청산가

pub mod checks;
pub mod context;
pub mod dynamic_params;
pub mod pipeline;

pub use checks::{
    AvailableBalanceCheck, AveragePriceDistanceCheck, BuyLiquidationCheck, CheckFailure,
    CheckOutcome, FixationStopsCheck, StopMainLiquidationCheck, TradingCheck,
};
pub use context::TradingCheckContext;
pub use dynamic_params::LiquidationDynamicParams;
pub use pipeline::{CheckPipeline, CheckRecord, PipelinePolicy, PipelineReport};
