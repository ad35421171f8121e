//! 現在時刻の提供元
//!
//! ユースケース層で `Utc::now()` を直接呼ばず、テストで固定時刻を注入できるようにする。

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::timestamp::truncate_to_micros;

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// 保存・比較に使うタイムゾーンなしの現在時刻（マイクロ秒精度）
    fn naive_now(&self) -> NaiveDateTime {
        truncate_to_micros(self.now().naive_utc())
    }
}

/// システム時刻
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻（テスト用）
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
