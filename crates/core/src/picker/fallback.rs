use crate::domain::fortune::{Dimension, DimensionScores, FortuneSnapshot};
use crate::domain::recommendation::{
    risk_for_score, DateRecommendation, Purpose, RecommendReport, RecommendRequest, RiskLevel,
    ScanSummary, ScanTrend,
};
use crate::picker::{CancelToken, DayFortuneProvider};
use anyhow::bail;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashSet;

const RANGE_DAYS_MIN: u32 = 3;
const RANGE_DAYS_MAX: u32 = 60;
const TOP_N_MIN: u32 = 3;
const TOP_N_MAX: u32 = 20;
const TOP_N_DEFAULT: u32 = 10;

const PURPOSE_WEIGHT_DIMENSION: f64 = 0.65;
const PURPOSE_WEIGHT_TOTAL: f64 = 0.35;
const CONFIDENCE_DISCOUNT_STEP: i32 = 4;
const CONFIDENCE_MIN: i32 = 35;
const CONFIDENCE_MAX: i32 = 95;
const ENHANCED_WINDOW_FLOOR: u8 = 80;
const CAUTION_FLOOR: u8 = 58;
const SUMMARY_TREND_MARGIN: f64 = 4.0;

/// Preferred start-of-day slots per purpose; the weekday picks the slot.
const TIME_WINDOWS: [(Purpose, [&str; 3]); 7] = [
    (Purpose::Moving, ["07:00-09:00", "09:00-11:00", "13:00-15:00"]),
    (Purpose::Opening, ["09:00-11:00", "11:00-13:00", "15:00-17:00"]),
    (Purpose::Travel, ["07:00-09:00", "13:00-15:00", "17:00-19:00"]),
    (Purpose::Romance, ["11:00-13:00", "15:00-17:00", "19:00-21:00"]),
    (Purpose::Wealth, ["09:00-11:00", "13:00-15:00", "15:00-17:00"]),
    (Purpose::Academic, ["07:00-09:00", "09:00-11:00", "19:00-21:00"]),
    (Purpose::Other, ["09:00-11:00", "13:00-15:00", "15:00-17:00"]),
];

/// Local ranking over `[start, start + range_days)`. One fortune fetch per
/// retained date, strictly sequential; a single failed day is skipped and
/// counted, but a scan that yields nothing is an error.
pub async fn scan(
    provider: &dyn DayFortuneProvider,
    req: &RecommendRequest,
    today: NaiveDate,
    cancel: &CancelToken,
) -> anyhow::Result<RecommendReport> {
    let start = req.start_date.unwrap_or(today);
    let range_days = req.range_days.clamp(RANGE_DAYS_MIN, RANGE_DAYS_MAX);
    let top_n = req.top_n.unwrap_or(TOP_N_DEFAULT).clamp(TOP_N_MIN, TOP_N_MAX) as usize;
    let policy = req.weekend_policy.unwrap_or_default();
    let excluded: HashSet<NaiveDate> = req.excluded_dates.iter().flatten().copied().collect();

    let mut candidates: Vec<DateRecommendation> = Vec::new();
    let mut skipped_days = 0u32;
    let mut failed_days = 0u32;

    for offset in 0..range_days {
        if cancel.is_cancelled() {
            bail!("date scan cancelled after {} of {range_days} days", offset);
        }

        let date = start + Duration::days(offset as i64);
        if excluded.contains(&date) || !policy.admits(date) {
            skipped_days += 1;
            continue;
        }

        match provider.day_fortune(&req.profile, date).await {
            Ok(fortune) => candidates.push(candidate_for(date, req.purpose, &fortune)),
            Err(err) => {
                failed_days += 1;
                tracing::warn!(%date, error = %err, "day fortune fetch failed; skipping date");
            }
        }
    }

    if candidates.is_empty() {
        bail!("no usable dates in the scanned range; adjust the filters or retry");
    }

    let mut recommendations = candidates.clone();
    recommendations.sort_by(|a, b| {
        b.purpose_score
            .cmp(&a.purpose_score)
            .then_with(|| a.date.cmp(&b.date))
    });
    recommendations.truncate(top_n);

    let mut timeline = candidates;
    timeline.sort_by_key(|candidate| candidate.date);

    let summary = summarize(&recommendations, &timeline, failed_days);

    Ok(RecommendReport {
        purpose: req.purpose,
        start_date: start,
        range_days,
        scanned_days: timeline.len() as u32,
        skipped_days,
        failed_days,
        recommended_count: recommendations.len() as u32,
        recommendations,
        timeline,
        summary,
    })
}

fn candidate_for(date: NaiveDate, purpose: Purpose, fortune: &FortuneSnapshot) -> DateRecommendation {
    let total_score = fortune.total_score;
    let dimensions = fortune.dimensions;
    let dimension_score = match purpose.dimension() {
        Some(dimension) => dimensions.get(dimension),
        None => total_score,
    };

    let purpose_score = purpose_score(dimension_score, total_score);
    let (risk_level, risk_weight) = risk_for_score(purpose_score);
    let confidence = (purpose_score as i32 - risk_weight as i32 * CONFIDENCE_DISCOUNT_STEP)
        .clamp(CONFIDENCE_MIN, CONFIDENCE_MAX) as u8;
    let weekday = date.weekday().num_days_from_monday() as u8;

    DateRecommendation {
        date,
        weekday,
        total_score,
        purpose_score,
        confidence,
        risk_level,
        risk_weight,
        best_time_window: time_window(purpose, weekday, purpose_score),
        main_theme: Some(fortune.main_theme.clone()),
        dimensions,
        highlights: highlights(&dimensions),
        cautions: cautions(&dimensions),
        tags: tags(purpose_score, total_score, risk_level),
    }
}

pub fn purpose_score(dimension_score: u8, total_score: u8) -> u8 {
    let blended = dimension_score as f64 * PURPOSE_WEIGHT_DIMENSION
        + total_score as f64 * PURPOSE_WEIGHT_TOTAL;
    blended.clamp(0.0, 100.0).round() as u8
}

fn time_window(purpose: Purpose, weekday: u8, purpose_score: u8) -> String {
    let slots = TIME_WINDOWS
        .iter()
        .find(|(candidate, _)| *candidate == purpose)
        .map(|(_, slots)| *slots)
        .unwrap_or(TIME_WINDOWS[TIME_WINDOWS.len() - 1].1);
    let slot = slots[weekday as usize % slots.len()];

    if purpose_score > ENHANCED_WINDOW_FLOOR {
        format!("{slot} (prime window)")
    } else {
        slot.to_string()
    }
}

fn ranked_dimensions(dimensions: &DimensionScores) -> Vec<(Dimension, u8)> {
    let mut entries: Vec<(Dimension, u8)> = dimensions.entries().to_vec();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

fn highlights(dimensions: &DimensionScores) -> Vec<String> {
    ranked_dimensions(dimensions)
        .into_iter()
        .take(2)
        .map(|(dimension, score)| format!("{} momentum is strong ({score})", dimension.key()))
        .collect()
}

fn cautions(dimensions: &DimensionScores) -> Vec<String> {
    let ranked = ranked_dimensions(dimensions);
    let weak: Vec<String> = ranked
        .iter()
        .rev()
        .filter(|(_, score)| *score < CAUTION_FLOOR)
        .take(2)
        .map(|(dimension, score)| {
            format!("{} is running weak ({score}); keep plans conservative", dimension.key())
        })
        .collect();

    if weak.is_empty() {
        vec!["overall risk looks manageable; proceed as planned".to_string()]
    } else {
        weak
    }
}

fn tags(purpose_score: u8, total_score: u8, risk_level: RiskLevel) -> Vec<String> {
    let mut tags = Vec::new();
    if purpose_score >= 88 {
        tags.push("high purpose fit".to_string());
    }
    if total_score >= 85 {
        tags.push("peak momentum".to_string());
    }
    if risk_level == RiskLevel::Low {
        tags.push("low risk".to_string());
    }
    if tags.is_empty() {
        tags.push("balanced".to_string());
    }
    tags.truncate(3);
    tags
}

fn summarize(
    recommendations: &[DateRecommendation],
    timeline: &[DateRecommendation],
    failed_days: u32,
) -> ScanSummary {
    let best = &recommendations[0];
    let worst = &timeline[timeline.len() - 1];

    let mid = timeline.len() / 2;
    let first_avg = mean_purpose(&timeline[..mid.max(1)]);
    let second_avg = mean_purpose(&timeline[mid..]);
    let trend = if second_avg > first_avg + SUMMARY_TREND_MARGIN {
        ScanTrend::Rising
    } else if first_avg > second_avg + SUMMARY_TREND_MARGIN {
        ScanTrend::Falling
    } else {
        ScanTrend::Stable
    };

    let average_confidence = (timeline
        .iter()
        .map(|candidate| candidate.confidence as f64)
        .sum::<f64>()
        / timeline.len() as f64)
        .round() as u8;

    ScanSummary {
        best_date: best.date,
        best_score: best.purpose_score,
        worst_date: worst.date,
        worst_score: worst.purpose_score,
        trend,
        average_confidence,
        failed_days,
    }
}

fn mean_purpose(candidates: &[DateRecommendation]) -> f64 {
    candidates
        .iter()
        .map(|candidate| candidate.purpose_score as f64)
        .sum::<f64>()
        / candidates.len() as f64
}
