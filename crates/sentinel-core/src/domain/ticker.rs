//! 티커 스냅샷.

use serde::{Deserialize, Serialize};

use crate::types::{Price, Symbol};

/// 거래소가 보고하는 세 가지 기준 가격의 불변 스냅샷.
///
/// 평가마다 새로 생성되며 이후 수정되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// 심볼
    pub symbol: Symbol,
    /// 마크 가격 (리스크 모델 기준)
    pub mark_price: Price,
    /// 인덱스 가격 (정산 기준)
    pub index_price: Price,
    /// 최종 체결 가격
    pub last_price: Price,
}

impl Ticker {
    /// 새 티커 스냅샷을 생성합니다.
    pub fn new(symbol: Symbol, mark_price: Price, index_price: Price, last_price: Price) -> Self {
        Self {
            symbol,
            mark_price,
            index_price,
            last_price,
        }
    }
}
