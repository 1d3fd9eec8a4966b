use crate::domain::fortune::{HistoryRecord, TrendDirection};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TrendDataPoint {
    pub date: NaiveDate,
    pub score: u8,
    pub label: String,
    pub keyword: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionTrendPoint {
    pub date: NaiveDate,
    pub label: String,
    pub career: u8,
    pub wealth: u8,
    pub romance: u8,
    pub health: u8,
    pub academic: u8,
    pub travel: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: TrendDirection,
    pub avg_score: u8,
    pub max_day: TrendDataPoint,
    pub min_day: TrendDataPoint,
    pub volatility: Volatility,
    pub suggestion: String,
}

const TREND_DIRECTION_MARGIN: f64 = 5.0;
const VOLATILITY_HIGH: f64 = 15.0;
const VOLATILITY_MEDIUM: f64 = 8.0;

pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "today".to_string()
    } else if Some(date) == today.pred_opt() {
        "yesterday".to_string()
    } else {
        format!("{}/{}", date.month(), date.day())
    }
}

fn point_of(record: &HistoryRecord, today: NaiveDate) -> TrendDataPoint {
    TrendDataPoint {
        date: record.date,
        score: record.fortune.total_score,
        label: date_label(record.date, today),
        keyword: record.fortune.main_theme.keyword.clone(),
        emoji: record.fortune.main_theme.emoji.clone(),
    }
}

/// The last `days` records in date-ascending order.
fn window(records: &[HistoryRecord], days: usize) -> Vec<&HistoryRecord> {
    let mut sorted: Vec<&HistoryRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.date);
    let skip = sorted.len().saturating_sub(days);
    sorted.into_iter().skip(skip).collect()
}

pub fn recent_trends(records: &[HistoryRecord], today: NaiveDate, days: usize) -> Vec<TrendDataPoint> {
    window(records, days)
        .into_iter()
        .map(|record| point_of(record, today))
        .collect()
}

pub fn dimension_trends(
    records: &[HistoryRecord],
    today: NaiveDate,
    days: usize,
) -> Vec<DimensionTrendPoint> {
    window(records, days)
        .into_iter()
        .map(|record| {
            let d = record.fortune.dimensions;
            DimensionTrendPoint {
                date: record.date,
                label: date_label(record.date, today),
                career: d.career,
                wealth: d.wealth,
                romance: d.romance,
                health: d.health,
                academic: d.academic,
                travel: d.travel,
            }
        })
        .collect()
}

/// Trend, volatility and a canned suggestion over the recent window.
/// Needs at least two points; fewer is an explicit no-result, not an error.
pub fn analyze_trend(
    records: &[HistoryRecord],
    today: NaiveDate,
    days: usize,
) -> Option<TrendAnalysis> {
    let points = recent_trends(records, today, days);
    if points.len() < 2 {
        return None;
    }

    let avg_score = mean(&points).round() as u8;

    // First-encountered point wins ties, scanning date-ascending.
    let mut max_day = &points[0];
    let mut min_day = &points[0];
    for point in &points[1..] {
        if point.score > max_day.score {
            max_day = point;
        }
        if point.score < min_day.score {
            min_day = point;
        }
    }

    let mid = points.len() / 2;
    let first_avg = mean(&points[..mid]);
    let second_avg = mean(&points[mid..]);
    let trend = if second_avg > first_avg + TREND_DIRECTION_MARGIN {
        TrendDirection::Up
    } else if second_avg < first_avg - TREND_DIRECTION_MARGIN {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    // Population standard deviation around the rounded mean, as displayed.
    let variance = points
        .iter()
        .map(|point| (point.score as f64 - avg_score as f64).powi(2))
        .sum::<f64>()
        / points.len() as f64;
    let std_dev = variance.sqrt();
    let volatility = if std_dev > VOLATILITY_HIGH {
        Volatility::High
    } else if std_dev > VOLATILITY_MEDIUM {
        Volatility::Medium
    } else {
        Volatility::Low
    };

    let suggestion = suggestion_for(trend, avg_score, volatility).to_string();

    Some(TrendAnalysis {
        trend,
        avg_score,
        max_day: max_day.clone(),
        min_day: min_day.clone(),
        volatility,
        suggestion,
    })
}

/// Historical best days: every record projected to a point, sorted by score.
/// The sort is stable, so tied scores keep the store's recency order.
pub fn top_days(records: &[HistoryRecord], today: NaiveDate, limit: usize) -> Vec<TrendDataPoint> {
    let mut points: Vec<TrendDataPoint> = records
        .iter()
        .map(|record| point_of(record, today))
        .collect();
    points.sort_by(|a, b| b.score.cmp(&a.score));
    points.truncate(limit);
    points
}

fn mean(points: &[TrendDataPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|point| point.score as f64).sum::<f64>() / points.len() as f64
}

fn suggestion_for(trend: TrendDirection, avg_score: u8, volatility: Volatility) -> &'static str {
    match trend {
        TrendDirection::Up => {
            if avg_score >= 75 {
                "Momentum keeps climbing. This is the window to push forward on the things that matter."
            } else {
                "Scores are recovering. There is still headroom, but the direction is right, so keep moving steadily."
            }
        }
        TrendDirection::Down => {
            if avg_score < 60 {
                "A trough period. Conserve energy, focus on groundwork, and wait for the turn."
            } else {
                "A mild dip on an otherwise decent stretch. Slow the pace a little and avoid rash moves."
            }
        }
        TrendDirection::Stable => {
            if volatility == Volatility::High {
                "Scores swing widely day to day. Keep a level head and do not overreact to any single reading."
            } else if avg_score >= 75 {
                "Holding steady at a high level. Keeping the current rhythm is the best play."
            } else {
                "Flat, with no big swings either way. Consider actively seeking a new opening."
            }
        }
    }
}
