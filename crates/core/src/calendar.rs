use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

/// 6 weeks of 7 days; every month view renders the same fixed grid.
pub const GRID_CELLS: usize = 42;

const BEST_DAYS_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub score: Option<u8>,
    pub is_today: bool,
    pub is_current_month: bool,
    pub is_weekend: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
    pub average: Option<u8>,
    pub best_days: Vec<DayCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Mediocre,
    Poor,
}

/// Score floor for each band, highest first.
const SCORE_BANDS: [(u8, ScoreBand); 5] = [
    (85, ScoreBand::Excellent),
    (70, ScoreBand::Good),
    (60, ScoreBand::Fair),
    (50, ScoreBand::Mediocre),
    (0, ScoreBand::Poor),
];

impl ScoreBand {
    pub fn for_score(score: u8) -> ScoreBand {
        SCORE_BANDS
            .iter()
            .copied()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, band)| band)
            .unwrap_or(ScoreBand::Poor)
    }
}

/// 42 cells covering `view`'s month. Leading previous-month days put the 1st
/// in its Sunday-based weekday column; trailing next-month days pad the grid.
pub fn build_month(
    view: NaiveDate,
    today: NaiveDate,
    score_lookup: impl Fn(NaiveDate) -> Option<u8>,
) -> Vec<DayCell> {
    let first = view - Duration::days(view.day0() as i64);
    let lead = first.weekday().num_days_from_sunday() as i64;
    let start = first - Duration::days(lead);

    (0..GRID_CELLS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            DayCell {
                date,
                score: score_lookup(date),
                is_today: date == today,
                is_current_month: date.year() == view.year() && date.month() == view.month(),
                is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            }
        })
        .collect()
}

/// Statistics over the current-month cells that have a known score. No known
/// scores means no average and no best days, not an error.
pub fn month_stats(cells: &[DayCell]) -> MonthStats {
    let scored: Vec<&DayCell> = cells
        .iter()
        .filter(|cell| cell.is_current_month && cell.score.is_some())
        .collect();

    if scored.is_empty() {
        return MonthStats {
            average: None,
            best_days: Vec::new(),
        };
    }

    let sum: u32 = scored.iter().filter_map(|cell| cell.score).map(u32::from).sum();
    let average = (sum as f64 / scored.len() as f64).round() as u8;

    let mut best_days: Vec<DayCell> = scored.into_iter().cloned().collect();
    best_days.sort_by(|a, b| b.score.cmp(&a.score));
    best_days.truncate(BEST_DAYS_LIMIT);

    MonthStats {
        average: Some(average),
        best_days,
    }
}
