pub mod calendar;
pub mod domain;
pub mod lifemap;
pub mod picker;
pub mod remote;
pub mod retry;
pub mod storage;
pub mod trends;

pub mod config {
    use anyhow::Context;

    use crate::domain::fortune::BirthProfile;

    const DEFAULT_BIRTH_TIME: &str = "12:00";
    const DEFAULT_LONGITUDE: f64 = 120.0;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub fortune_api_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub birth_date: Option<String>,
        pub birth_time: Option<String>,
        pub longitude: Option<String>,
        pub gender: Option<String>,
        pub custom_yong_shen: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                fortune_api_base_url: std::env::var("FORTUNE_API_BASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                birth_date: std::env::var("BIRTH_DATE").ok(),
                birth_time: std::env::var("BIRTH_TIME").ok(),
                longitude: std::env::var("LONGITUDE").ok(),
                gender: std::env::var("GENDER").ok(),
                custom_yong_shen: std::env::var("CUSTOM_YONG_SHEN").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_fortune_api_base_url(&self) -> anyhow::Result<&str> {
            self.fortune_api_base_url
                .as_deref()
                .context("FORTUNE_API_BASE_URL is required")
        }

        /// Birth profile for the upstream fortune services. Only the birth
        /// date is mandatory; time and longitude fall back to the upstream
        /// defaults.
        pub fn birth_profile(&self) -> anyhow::Result<BirthProfile> {
            let birth_date = self.birth_date.as_deref().context("BIRTH_DATE is required")?;
            let birth_date = chrono::NaiveDate::parse_from_str(birth_date, "%Y-%m-%d")
                .context("BIRTH_DATE must be YYYY-MM-DD")?;

            let longitude = match self.longitude.as_deref() {
                Some(s) => s.parse::<f64>().context("LONGITUDE must be numeric")?,
                None => DEFAULT_LONGITUDE,
            };

            Ok(BirthProfile {
                birth_date,
                birth_time: self
                    .birth_time
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BIRTH_TIME.to_string()),
                longitude,
                gender: self.gender.clone(),
                custom_yong_shen: self
                    .custom_yong_shen
                    .clone()
                    .map(serde_json::Value::String),
            })
        }
    }
}
