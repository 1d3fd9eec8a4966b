use crate::config::Settings;
use crate::domain::fortune::{BirthProfile, DimensionScores, FortuneSnapshot, MainTheme};
use crate::domain::recommendation::{RecommendReport, RecommendRequest};
use crate::picker::{DayFortuneProvider, RecommendService};
use crate::remote::RemoteApiClient;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const RECOMMEND_PATH: &str = "/api/date-picker/recommend";
const DAY_FORTUNE_PATH: &str = "/api/fortune";

/// Remote date ranking over the shared envelope client.
#[derive(Debug, Clone)]
pub struct HttpRecommendService {
    client: RemoteApiClient,
}

impl HttpRecommendService {
    pub fn new(client: RemoteApiClient) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(RemoteApiClient::from_base_url(
            settings.require_fortune_api_base_url()?,
        )?))
    }
}

#[async_trait::async_trait]
impl RecommendService for HttpRecommendService {
    async fn recommend(&self, req: &RecommendRequest) -> anyhow::Result<RecommendReport> {
        self.client
            .post_envelope("date-picker", RECOMMEND_PATH, req)
            .await
    }
}

/// Per-day fortune fetch against the upstream fortune endpoint. The upstream
/// nests each dimension as `{score}`; flatten on the way in.
#[derive(Debug, Clone)]
pub struct HttpDayFortuneProvider {
    client: RemoteApiClient,
}

impl HttpDayFortuneProvider {
    pub fn new(client: RemoteApiClient) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(RemoteApiClient::from_base_url(
            settings.require_fortune_api_base_url()?,
        )?))
    }
}

#[derive(Debug, Serialize)]
struct DayFortuneRequest<'a> {
    #[serde(flatten)]
    profile: &'a BirthProfile,
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct DayFortuneData {
    fortune: WireFortune,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFortune {
    total_score: u8,
    main_theme: MainTheme,
    dimensions: WireDimensions,
}

#[derive(Debug, Deserialize)]
struct WireDimensions {
    career: WireScore,
    wealth: WireScore,
    romance: WireScore,
    health: WireScore,
    academic: WireScore,
    travel: WireScore,
}

#[derive(Debug, Deserialize)]
struct WireScore {
    score: u8,
}

impl WireFortune {
    fn into_snapshot(self) -> FortuneSnapshot {
        FortuneSnapshot {
            total_score: self.total_score,
            main_theme: self.main_theme,
            dimensions: DimensionScores {
                career: self.dimensions.career.score,
                wealth: self.dimensions.wealth.score,
                romance: self.dimensions.romance.score,
                health: self.dimensions.health.score,
                academic: self.dimensions.academic.score,
                travel: self.dimensions.travel.score,
            },
        }
    }
}

#[async_trait::async_trait]
impl DayFortuneProvider for HttpDayFortuneProvider {
    async fn day_fortune(
        &self,
        profile: &BirthProfile,
        date: NaiveDate,
    ) -> anyhow::Result<FortuneSnapshot> {
        let payload = DayFortuneRequest { profile, date };
        let data: DayFortuneData = self
            .client
            .post_envelope("fortune", DAY_FORTUNE_PATH, &payload)
            .await?;
        Ok(data.fortune.into_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_nested_dimensions_flatten_into_a_snapshot() {
        let v = json!({
            "fortune": {
                "totalScore": 76,
                "mainTheme": {"keyword": "flow", "emoji": "🌊"},
                "dimensions": {
                    "career": {"score": 70},
                    "wealth": {"score": 85},
                    "romance": {"score": 66},
                    "health": {"score": 72},
                    "academic": {"score": 61},
                    "travel": {"score": 79}
                }
            }
        });

        let data: DayFortuneData = serde_json::from_value(v).unwrap();
        let snapshot = data.fortune.into_snapshot();
        assert_eq!(snapshot.total_score, 76);
        assert_eq!(snapshot.dimensions.wealth, 85);
        assert_eq!(snapshot.dimensions.travel, 79);
    }

    #[test]
    fn day_fortune_request_flattens_the_profile() {
        let profile = BirthProfile {
            birth_date: "1991-02-03".parse().unwrap(),
            birth_time: "07:45".to_string(),
            longitude: 116.4,
            gender: Some("male".to_string()),
            custom_yong_shen: None,
        };
        let payload = DayFortuneRequest {
            profile: &profile,
            date: "2026-08-12".parse().unwrap(),
        };

        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["birthDate"], "1991-02-03");
        assert_eq!(v["birthTime"], "07:45");
        assert_eq!(v["date"], "2026-08-12");
        // Unset optional fields stay off the wire.
        assert!(v.get("customYongShen").is_none());
    }
}
