//! 一覧取得の絞り込み条件
//!
//! クエリパラメータ `completed` / `window` から、ストアに渡す不変の述語オブジェクトを作る。
//! 条件はすべて AND で合成する。

use chrono::{Duration, NaiveDateTime};

use crate::errors::FilterError;
use crate::todo::Todo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoFilter {
    completed_only: bool,
    deadline_until: Option<NaiveDateTime>,
}

impl TodoFilter {
    /// 絞り込みなし
    pub fn all() -> Self {
        Self::default()
    }

    /// クエリパラメータから組み立てる
    ///
    /// `window` は 0 以上の日数。`now + window 日` 以前に締切がある Todo に限定する。
    pub fn from_params(
        completed: Option<&str>,
        window: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Self, FilterError> {
        let mut filter = Self::all();

        if completed.is_some_and(is_truthy) {
            filter = filter.with_completed_only();
        }

        if let Some(raw) = window {
            let days = parse_window(raw)?;
            filter = filter.with_deadline_until(window_bound(now, days));
        }

        Ok(filter)
    }

    pub fn with_completed_only(mut self) -> Self {
        self.completed_only = true;
        self
    }

    pub fn with_deadline_until(mut self, bound: NaiveDateTime) -> Self {
        self.deadline_until = Some(bound);
        self
    }

    pub fn completed_only(&self) -> bool {
        self.completed_only
    }

    pub fn deadline_until(&self) -> Option<NaiveDateTime> {
        self.deadline_until
    }

    pub fn is_unfiltered(&self) -> bool {
        !self.completed_only && self.deadline_until.is_none()
    }

    /// Todo が条件を満たすか
    ///
    /// 締切の上限がある場合、締切を持たない Todo は一致しない。
    pub fn matches(&self, todo: &Todo) -> bool {
        if self.completed_only && !todo.completed {
            return false;
        }
        match (self.deadline_until, todo.deadline_at) {
            (None, _) => true,
            (Some(bound), Some(deadline)) => deadline <= bound,
            (Some(_), None) => false,
        }
    }
}

/// フラグ値の真偽判定
///
/// 値の中身は見ず、空文字以外はすべて真（`completed=false` も真）。
pub fn is_truthy(raw: &str) -> bool {
    !raw.is_empty()
}

fn parse_window(raw: &str) -> Result<i64, FilterError> {
    match raw.trim().parse::<i64>() {
        Ok(days) if days >= 0 => Ok(days),
        _ => Err(FilterError::InvalidWindow(raw.to_string())),
    }
}

/// 暦の範囲を超える場合は最大値に丸める
fn window_bound(now: NaiveDateTime, days: i64) -> NaiveDateTime {
    Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .unwrap_or(NaiveDateTime::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::TodoId;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn todo(id: i64, completed: bool, deadline_in_days: Option<i64>) -> Todo {
        Todo {
            id: TodoId::new(id).unwrap(),
            title: format!("todo {id}"),
            description: None,
            completed,
            deadline_at: deadline_in_days.map(|d| now() + Duration::days(d)),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_no_params_is_unfiltered() {
        let filter = TodoFilter::from_params(None, None, now()).unwrap();

        assert!(filter.is_unfiltered());
        assert!(filter.matches(&todo(1, false, None)));
        assert!(filter.matches(&todo(2, true, Some(100))));
    }

    #[test]
    fn test_completed_flag_truthiness() {
        for raw in ["true", "1", "false", "0", "no", "off", " "] {
            let filter = TodoFilter::from_params(Some(raw), None, now()).unwrap();
            assert!(filter.completed_only(), "{raw:?} should be truthy");
        }

        let filter = TodoFilter::from_params(Some(""), None, now()).unwrap();
        assert!(!filter.completed_only());
    }

    #[test]
    fn test_completed_filter_excludes_incomplete_items() {
        let filter = TodoFilter::from_params(Some("true"), None, now()).unwrap();

        assert!(filter.matches(&todo(1, true, None)));
        assert!(!filter.matches(&todo(2, false, None)));
    }

    #[test]
    fn test_window_selects_deadlines_within_days() {
        // Arrange: 締切が 0, 5, 10 日後の Todo
        let items = [todo(1, false, Some(0)), todo(2, false, Some(5)), todo(3, false, Some(10))];

        // Act: window=6
        let filter = TodoFilter::from_params(None, Some("6"), now()).unwrap();
        let ids: Vec<i64> = items
            .iter()
            .filter(|t| filter.matches(t))
            .map(|t| t.id.value())
            .collect();

        // Assert: 0 日後と 5 日後のみ
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_window_bound_is_inclusive_and_skips_missing_deadlines() {
        let filter = TodoFilter::from_params(None, Some("5"), now()).unwrap();

        assert!(filter.matches(&todo(1, false, Some(5))));
        assert!(!filter.matches(&todo(2, false, None)));
    }

    #[test]
    fn test_window_zero_includes_overdue_items() {
        let filter = TodoFilter::from_params(None, Some("0"), now()).unwrap();

        assert!(filter.matches(&todo(1, false, Some(-3))));
        assert!(!filter.matches(&todo(2, false, Some(1))));
    }

    #[test]
    fn test_invalid_window_echoes_raw_string() {
        for raw in ["-1", "abc", "", "1.5", "6 days"] {
            let err = TodoFilter::from_params(None, Some(raw), now()).unwrap_err();
            assert_eq!(err, FilterError::InvalidWindow(raw.to_string()));
        }
    }

    #[test]
    fn test_window_tolerates_whitespace_and_plus_sign() {
        let filter = TodoFilter::from_params(None, Some(" +3 "), now()).unwrap();
        assert_eq!(filter.deadline_until(), Some(now() + Duration::days(3)));
    }

    #[test]
    fn test_huge_window_saturates() {
        let filter = TodoFilter::from_params(None, Some(&i64::MAX.to_string()), now()).unwrap();

        assert_eq!(filter.deadline_until(), Some(NaiveDateTime::MAX));
        assert!(filter.matches(&todo(1, false, Some(36_500))));
    }

    #[test]
    fn test_filters_compose_conjunctively() {
        let filter = TodoFilter::from_params(Some("true"), Some("6"), now()).unwrap();

        assert!(filter.matches(&todo(1, true, Some(5))));
        assert!(!filter.matches(&todo(2, false, Some(5))));
        assert!(!filter.matches(&todo(3, true, Some(10))));
        assert!(!filter.matches(&todo(4, true, None)));
    }
}
