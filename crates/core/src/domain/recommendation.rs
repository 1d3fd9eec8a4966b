use crate::domain::fortune::{BirthProfile, Dimension, DimensionScores, MainTheme};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The user's stated intent for a future-date search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Moving,
    Opening,
    Travel,
    Romance,
    Wealth,
    Academic,
    Other,
}

/// Purpose to ranked dimension. `None` means the overall total score.
const PURPOSE_DIMENSION: [(Purpose, Option<Dimension>); 7] = [
    (Purpose::Moving, Some(Dimension::Career)),
    (Purpose::Opening, Some(Dimension::Wealth)),
    (Purpose::Travel, Some(Dimension::Travel)),
    (Purpose::Romance, Some(Dimension::Romance)),
    (Purpose::Wealth, Some(Dimension::Wealth)),
    (Purpose::Academic, Some(Dimension::Academic)),
    (Purpose::Other, None),
];

impl Purpose {
    pub fn dimension(self) -> Option<Dimension> {
        PURPOSE_DIMENSION
            .iter()
            .find(|(purpose, _)| *purpose == self)
            .and_then(|(_, dimension)| *dimension)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekendPolicy {
    #[default]
    All,
    WeekendOnly,
    WorkdayOnly,
}

impl WeekendPolicy {
    pub fn admits(self, date: NaiveDate) -> bool {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        match self {
            WeekendPolicy::All => true,
            WeekendPolicy::WeekendOnly => weekend,
            WeekendPolicy::WorkdayOnly => !weekend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Purpose-score floor to (risk level, confidence discount weight).
pub const RISK_BANDS: [(u8, RiskLevel, u8); 3] = [
    (78, RiskLevel::Low, 1),
    (60, RiskLevel::Medium, 2),
    (0, RiskLevel::High, 4),
];

pub fn risk_for_score(purpose_score: u8) -> (RiskLevel, u8) {
    let (_, level, weight) = RISK_BANDS
        .iter()
        .copied()
        .find(|(floor, _, _)| purpose_score >= *floor)
        .unwrap_or(RISK_BANDS[RISK_BANDS.len() - 1]);
    (level, weight)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(flatten)]
    pub profile: BirthProfile,
    pub purpose: Purpose,
    pub range_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend_policy: Option<WeekendPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_dates: Option<Vec<NaiveDate>>,
}

/// One scanned candidate day. `weekday` is Monday=0, matching the remote
/// service payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRecommendation {
    pub date: NaiveDate,
    pub weekday: u8,
    pub total_score: u8,
    pub purpose_score: u8,
    pub confidence: u8,
    pub risk_level: RiskLevel,
    pub risk_weight: u8,
    pub best_time_window: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_theme: Option<MainTheme>,
    pub dimensions: DimensionScores,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub cautions: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanTrend {
    Rising,
    Stable,
    Falling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub best_date: NaiveDate,
    pub best_score: u8,
    pub worst_date: NaiveDate,
    pub worst_score: u8,
    pub trend: ScanTrend,
    pub average_confidence: u8,
    pub failed_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendReport {
    pub purpose: Purpose,
    pub start_date: NaiveDate,
    pub range_days: u32,
    pub scanned_days: u32,
    pub skipped_days: u32,
    pub failed_days: u32,
    pub recommended_count: u32,
    pub recommendations: Vec<DateRecommendation>,
    pub timeline: Vec<DateRecommendation>,
    pub summary: ScanSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn purpose_maps_to_its_ranked_dimension() {
        assert_eq!(Purpose::Moving.dimension(), Some(Dimension::Career));
        assert_eq!(Purpose::Opening.dimension(), Some(Dimension::Wealth));
        assert_eq!(Purpose::Travel.dimension(), Some(Dimension::Travel));
        assert_eq!(Purpose::Romance.dimension(), Some(Dimension::Romance));
        assert_eq!(Purpose::Wealth.dimension(), Some(Dimension::Wealth));
        assert_eq!(Purpose::Academic.dimension(), Some(Dimension::Academic));
        assert_eq!(Purpose::Other.dimension(), None);
    }

    #[test]
    fn risk_bands_cover_the_documented_thresholds() {
        assert_eq!(risk_for_score(78), (RiskLevel::Low, 1));
        assert_eq!(risk_for_score(100), (RiskLevel::Low, 1));
        assert_eq!(risk_for_score(77), (RiskLevel::Medium, 2));
        assert_eq!(risk_for_score(60), (RiskLevel::Medium, 2));
        assert_eq!(risk_for_score(59), (RiskLevel::High, 4));
        assert_eq!(risk_for_score(0), (RiskLevel::High, 4));
    }

    #[test]
    fn weekend_policy_filters_saturdays_and_sundays() {
        let saturday = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();

        assert!(WeekendPolicy::All.admits(saturday));
        assert!(WeekendPolicy::All.admits(monday));
        assert!(WeekendPolicy::WeekendOnly.admits(saturday));
        assert!(!WeekendPolicy::WeekendOnly.admits(monday));
        assert!(!WeekendPolicy::WorkdayOnly.admits(saturday));
        assert!(WeekendPolicy::WorkdayOnly.admits(monday));
    }

    #[test]
    fn weekend_policy_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(WeekendPolicy::WeekendOnly).unwrap(),
            serde_json::json!("weekend_only")
        );
    }
}
