//! 헤지(양방향 포지션) 뷰.
//!
//! 같은 심볼의 롱+숏 포지션 쌍을 읽기 전용 뷰로 묶습니다.
//! 메인 레그가 청산 리스크를 부담하고, 지지 레그는 보호 역할을 합니다.
//! 뷰는 필요 시점에 두 포지션으로부터 계산되며, 포지션 간 상호 참조를
//! 저장하지 않습니다.

use rust_decimal::Decimal;

use crate::domain::position::Position;

/// 롱+숏 포지션 쌍에 대한 읽기 전용 헤지 뷰.
#[derive(Debug)]
pub struct Hedge<'a> {
    /// 청산 리스크를 부담하는 메인 레그
    pub main: &'a Position,
    /// 보호 역할의 지지 레그
    pub support: &'a Position,
}

impl<'a> Hedge<'a> {
    /// 두 포지션으로부터 메인/지지 레그를 결정합니다.
    ///
    /// 결정 규칙 (순서대로):
    /// 1. `is_main` 플래그가 한쪽에만 설정된 경우 그 레그가 메인
    /// 2. 먼저 오픈된 레그가 메인
    /// 3. 동시 오픈이면 명목 가치가 큰 레그가 메인
    pub fn resolve(a: &'a Position, b: &'a Position) -> Hedge<'a> {
        let (main, support) = if a.is_main != b.is_main {
            if a.is_main {
                (a, b)
            } else {
                (b, a)
            }
        } else if a.opened_at != b.opened_at {
            if a.opened_at < b.opened_at {
                (a, b)
            } else {
                (b, a)
            }
        } else if a.value >= b.value {
            (a, b)
        } else {
            (b, a)
        };

        Hedge { main, support }
    }

    /// 양쪽 레그가 완전히 상쇄되는지 확인합니다.
    pub fn is_equivalent(&self) -> bool {
        self.main.size == self.support.size
    }

    /// 지지 레그로 상쇄되지 않는 메인 레그 수량을 반환합니다.
    pub fn not_covered_size(&self) -> Decimal {
        (self.main.size - self.support.size).max(Decimal::ZERO)
    }
}
