use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the six fixed life-aspect categories scored per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Career,
    Wealth,
    Romance,
    Health,
    Academic,
    Travel,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Career,
        Dimension::Wealth,
        Dimension::Romance,
        Dimension::Health,
        Dimension::Academic,
        Dimension::Travel,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dimension::Career => "career",
            Dimension::Wealth => "wealth",
            Dimension::Romance => "romance",
            Dimension::Health => "health",
            Dimension::Academic => "academic",
            Dimension::Travel => "travel",
        }
    }
}

/// Direction of a short score series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainTheme {
    pub keyword: String,
    pub emoji: String,
}

/// Flat per-dimension scores, each 0..=100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionScores {
    pub career: u8,
    pub wealth: u8,
    pub romance: u8,
    pub health: u8,
    pub academic: u8,
    pub travel: u8,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Career => self.career,
            Dimension::Wealth => self.wealth,
            Dimension::Romance => self.romance,
            Dimension::Health => self.health,
            Dimension::Academic => self.academic,
            Dimension::Travel => self.travel,
        }
    }

    pub fn entries(&self) -> [(Dimension, u8); 6] {
        Dimension::ALL.map(|d| (d, self.get(d)))
    }
}

/// The computed outcome for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FortuneSnapshot {
    pub total_score: u8,
    pub main_theme: MainTheme,
    pub dimensions: DimensionScores,
}

/// One persisted history entry. `date` is unique per store; `timestamp`
/// (epoch milliseconds) only orders entries by capture recency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub timestamp: i64,
    pub fortune: FortuneSnapshot,
}

/// Request preamble shared by every upstream fortune endpoint.
/// `custom_yong_shen` is opaque to this crate and forwarded as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthProfile {
    pub birth_date: NaiveDate,
    pub birth_time: String,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_yong_shen: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_record_round_trips_with_camel_case_keys() {
        let v = json!({
            "date": "2026-08-01",
            "timestamp": 1_785_500_000_000i64,
            "fortune": {
                "totalScore": 82,
                "mainTheme": {"keyword": "breakthrough", "emoji": "🚀"},
                "dimensions": {
                    "career": 88, "wealth": 75, "romance": 60,
                    "health": 70, "academic": 65, "travel": 80
                }
            }
        });

        let record: HistoryRecord = serde_json::from_value(v.clone()).unwrap();
        assert_eq!(record.fortune.total_score, 82);
        assert_eq!(record.fortune.dimensions.get(Dimension::Career), 88);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn dimension_entries_follow_the_fixed_order() {
        let scores = DimensionScores {
            career: 1,
            wealth: 2,
            romance: 3,
            health: 4,
            academic: 5,
            travel: 6,
        };
        let entries = scores.entries();
        assert_eq!(entries[0], (Dimension::Career, 1));
        assert_eq!(entries[5], (Dimension::Travel, 6));
    }
}
