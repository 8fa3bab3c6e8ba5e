//! 도메인 모델.
//!
//! - `Position` / `PositionSide` - 거래소 포지션 스냅샷
//! - `Hedge` - 롱+숏 쌍의 읽기 전용 뷰
//! - `Ticker` - 기준 가격 스냅샷
//! - `PlannedOrder` / `PlacedStop` - 검증 대상 주문
//! - `pnl` - 손익 계산 공통 로직

pub mod hedge;
pub mod order;
pub mod pnl;
pub mod position;
pub mod ticker;

pub use hedge::Hedge;
pub use order::{OrderKind, PlacedStop, PlannedOrder};
pub use pnl::{pnl_in_quote, pnl_percent_to_price_delta};
pub use position::{Position, PositionSide};
pub use ticker::Ticker;
