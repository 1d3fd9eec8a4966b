use crate::domain::fortune::{BirthProfile, TrendDirection};
use crate::domain::recommendation::{RiskLevel, ScanTrend};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeMapRequest {
    #[serde(flatten)]
    pub profile: BirthProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// Year-over-year movement attached to a trend point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Momentum {
    pub delta: f64,
    pub trend: TrendDirection,
}

/// One projected year. `gan_zhi` is an opaque calendrical label supplied by
/// the remote service for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeMapPoint {
    pub year: i32,
    pub gan_zhi: String,
    pub overall: u8,
    pub career: u8,
    pub wealth: u8,
    pub romance: u8,
    pub health: u8,
    pub academic: u8,
    pub travel: u8,
    pub risk_level: RiskLevel,
    pub confidence: u8,
    pub momentum: Momentum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeMapMilestone {
    #[serde(rename = "type")]
    pub kind: String,
    pub year: i32,
    pub title: String,
    pub score: u8,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeMapStrategyItem {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub priority: StrategyPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeMapSummary {
    pub average: f64,
    pub volatility: f64,
    pub trend: ScanTrend,
    pub confidence: u8,
    pub peak_year: i32,
    pub trough_year: i32,
    pub failed_years: Vec<i32>,
    pub milestone_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeMapData {
    pub start_year: i32,
    pub years: u32,
    pub points: Vec<LifeMapPoint>,
    pub milestones: Vec<LifeMapMilestone>,
    pub summary: LifeMapSummary,
    pub strategy: Vec<LifeMapStrategyItem>,
    pub failed_years: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_remote_life_map_payload() {
        let v = json!({
            "startYear": 2026,
            "years": 2,
            "points": [
                {
                    "year": 2026,
                    "ganZhi": "丙午",
                    "overall": 74, "career": 70, "wealth": 78, "romance": 66,
                    "health": 72, "academic": 64, "travel": 71,
                    "riskLevel": "medium",
                    "confidence": 80,
                    "momentum": {"delta": 3.5, "trend": "up"}
                },
                {
                    "year": 2027,
                    "ganZhi": "丁未",
                    "overall": 69, "career": 68, "wealth": 70, "romance": 65,
                    "health": 70, "academic": 66, "travel": 68,
                    "riskLevel": "low",
                    "confidence": 77,
                    "momentum": {"delta": -5.0, "trend": "down"}
                }
            ],
            "milestones": [
                {"type": "peak", "year": 2026, "title": "Peak year", "score": 74, "detail": "strongest stretch"}
            ],
            "summary": {
                "average": 71.5,
                "volatility": 2.5,
                "trend": "falling",
                "confidence": 78,
                "peakYear": 2026,
                "troughYear": 2027,
                "failedYears": [],
                "milestoneCount": 1
            },
            "strategy": [
                {"id": "s1", "title": "Front-load big moves", "detail": "use the stronger first year", "priority": "high"}
            ],
            "failedYears": []
        });

        let data: LifeMapData = serde_json::from_value(v).unwrap();
        assert_eq!(data.points.len(), 2);
        assert_eq!(data.points[0].momentum.trend, TrendDirection::Up);
        assert_eq!(data.points[1].risk_level, RiskLevel::Low);
        assert_eq!(data.summary.trend, ScanTrend::Falling);
        assert_eq!(data.milestones[0].kind, "peak");
        assert_eq!(data.strategy[0].priority, StrategyPriority::High);
    }
}
