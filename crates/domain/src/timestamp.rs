//! タイムゾーンを持たない ISO-8601 タイムスタンプの解析と整形
//!
//! 内部表現は `NaiveDateTime`（UTC 相当）で、精度はマイクロ秒に揃える。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ストア保存用の固定幅フォーマット（辞書順 = 時系列順）
const FIXED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const FIXED_UPPER_BOUND: &str = "9999-12-31T23:59:59.999999";

/// ISO-8601 文字列を解析する
///
/// オフセット付き（RFC 3339）の場合は UTC に変換したうえでオフセットを落とす。
/// 日付のみの場合はその日の 00:00:00 とする。
pub fn parse_iso8601(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(truncate_to_micros(with_offset.naive_utc()));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(truncate_to_micros(parsed));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// ナノ秒以下を切り捨ててマイクロ秒精度にする
pub fn truncate_to_micros(value: NaiveDateTime) -> NaiveDateTime {
    let nanos = value.nanosecond() / 1_000 * 1_000;
    value.with_nanosecond(nanos).unwrap_or(value)
}

/// 固定幅の文字列に整形する（年が 4 桁を超える値は上限に丸める）
pub fn format_fixed(value: &NaiveDateTime) -> String {
    let formatted = value.format(FIXED_FORMAT).to_string();
    if formatted.len() != FIXED_UPPER_BOUND.len() || formatted.starts_with('+') {
        return FIXED_UPPER_BOUND.to_string();
    }
    formatted
}

/// `format_fixed` の逆変換
pub fn parse_fixed(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, FIXED_FORMAT).ok()
}
