//! HTTP provider for the learning platform API
//!
//! Responses are JSON arrays of loosely shaped records. Each record is
//! decoded on its own: a record that does not decode, or whose timestamp
//! does not parse, is logged and skipped while its siblings are kept.

use crate::error::ProviderError;
use crate::provider::{parse_timestamp, DataProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use wtd_core::{Course, CourseSelection, Goal, Project, ProviderConfig, TimeReport, UserId};

/// Platform client
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
}

impl HttpProvider {
    /// Create from provider config.
    ///
    /// # Errors
    /// Returns `reqwest::Error` if the client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        Self::with_timeout(&config.base_url, config.fetch_timeout())
    }

    /// Create for a base URL with a request timeout.
    ///
    /// # Errors
    /// Returns `reqwest::Error` if the client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, endpoint: &str, token: Option<&str>) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let http_err = |source| ProviderError::Http {
            endpoint: endpoint.to_string(),
            source,
        };
        let response = request.send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        response.json::<Value>().await.map_err(http_err)
    }

    /// Fetch a record array, decoding each element independently
    async fn get_records<W, T>(
        &self,
        endpoint: &str,
        token: Option<&str>,
        convert: fn(W) -> Result<T, String>,
    ) -> Result<Vec<T>, ProviderError>
    where
        W: DeserializeOwned,
    {
        let items = match self.get_json(endpoint, token).await? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                tracing::warn!(endpoint, kind = json_kind(&other), "expected a record array, got none");
                Vec::new()
            }
        };

        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let decoded = serde_json::from_value::<W>(item)
                    .map_err(|e| e.to_string())
                    .and_then(convert);
                match decoded {
                    Ok(record) => Some(record),
                    Err(reason) => {
                        tracing::warn!(endpoint, index, %reason, "skipping malformed record");
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(endpoint, total, kept = records.len(), "records fetched");
        Ok(records)
    }
}

#[async_trait]
impl DataProvider for HttpProvider {
    async fn selections(&self, token: &str) -> Result<Vec<CourseSelection>, ProviderError> {
        self.get_records("/course/fetch_selections", Some(token), WireSelection::convert)
            .await
    }

    async fn catalog(&self) -> Result<Vec<Course>, ProviderError> {
        self.get_records("/course/fetch_all_courses", None, WireCourse::convert)
            .await
    }

    async fn open_projects(&self) -> Result<Vec<Project>, ProviderError> {
        self.get_records("/inno/fetch_current_projects", None, WireProject::convert)
            .await
    }

    async fn current_goal(&self, user: UserId) -> Result<Option<Goal>, ProviderError> {
        let endpoint = format!("/users/fetch_goal/{user}");
        let value = self.get_json(&endpoint, None).await?;
        if value.is_null() {
            return Ok(None);
        }

        let decoded = serde_json::from_value::<WireGoal>(value)
            .map_err(|e| e.to_string())
            .and_then(WireGoal::convert);
        match decoded {
            Ok(goal) => Ok(Some(goal)),
            Err(reason) => {
                tracing::warn!(endpoint = %endpoint, %reason, "skipping malformed goal");
                Ok(None)
            }
        }
    }

    async fn reports(&self, user: UserId) -> Result<Vec<TimeReport>, ProviderError> {
        let endpoint = format!("/users/fetch_reports/{user}");
        self.get_records(&endpoint, None, WireReport::convert).await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn timestamp(field: &str, raw: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    parse_timestamp(raw).map_err(|e| format!("bad {field} {raw:?}: {e}"))
}

#[derive(Deserialize)]
struct WireSelection {
    sele_id: u64,
    course_id: u64,
    course_title: String,
    chapter_title: String,
    current_serial: u32,
    deadline: String,
    url: String,
    shushi_name: Option<String>,
}

impl WireSelection {
    fn convert(self) -> Result<CourseSelection, String> {
        Ok(CourseSelection {
            selection_id: self.sele_id,
            course_id: self.course_id,
            course_title: self.course_title,
            chapter_title: self.chapter_title,
            current_serial: self.current_serial,
            deadline: timestamp("deadline", &self.deadline)?,
            url: self.url,
            mentor_name: self.shushi_name,
        })
    }
}

#[derive(Deserialize)]
struct WireCourse {
    id: u64,
    title: String,
    desc: Option<String>,
    director_name: Option<String>,
    finish_selections_num: Option<u32>,
}

impl WireCourse {
    #[allow(clippy::unnecessary_wraps)]
    fn convert(self) -> Result<Course, String> {
        Ok(Course {
            id: self.id,
            title: self.title,
            description: self.desc.unwrap_or_default(),
            director_name: self.director_name,
            finished_count: self.finish_selections_num.unwrap_or(0),
        })
    }
}

#[derive(Deserialize)]
struct WireProject {
    id: u64,
    title: String,
    publisher: String,
    taker_id: Option<u64>,
    deadline: String,
    planed_hour: f64,
    bonus: Option<f64>,
    desc: Option<String>,
}

impl WireProject {
    fn convert(self) -> Result<Project, String> {
        Ok(Project {
            id: self.id,
            title: self.title,
            publisher: self.publisher,
            taker_id: self.taker_id,
            deadline: timestamp("deadline", &self.deadline)?,
            planned_hours: self.planed_hour,
            bonus: self.bonus.unwrap_or(0.0),
            description: self.desc.unwrap_or_default(),
        })
    }
}

#[derive(Deserialize)]
struct WireGoal {
    id: u64,
    content: String,
    start_time: String,
}

impl WireGoal {
    fn convert(self) -> Result<Goal, String> {
        Ok(Goal {
            id: self.id,
            content: self.content,
            started_at: timestamp("start_time", &self.start_time)?,
        })
    }
}

#[derive(Deserialize)]
struct WireReport {
    id: u64,
    report_time: String,
    #[serde(default)]
    time_reported: f64,
    activity: Option<String>,
}

impl WireReport {
    fn convert(self) -> Result<TimeReport, String> {
        Ok(TimeReport {
            id: self.id,
            reported_at: timestamp("report_time", &self.report_time)?,
            hours: self.time_reported,
            activity: self.activity,
        })
    }
}
