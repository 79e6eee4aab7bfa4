//! Task candidates produced by the extraction collaborator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::DAY_MINUTES;
use crate::error::ValidationError;

/// Longest accepted task name.
pub const MAX_TASK_NAME_LEN: usize = 200;

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Priority {
    /// Additive score boost for this priority.
    pub fn boost(&self) -> f64 {
        match self {
            Self::High => 0.33,
            Self::Medium => 0.20,
            Self::Low => 0.10,
        }
    }

    /// Ordering rank, higher schedules first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named time-of-day range used to bias placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 4] = [
        TimeBucket::Morning,
        TimeBucket::Midday,
        TimeBucket::Afternoon,
        TimeBucket::Evening,
    ];

    /// Half-open `[start, end)` range in minutes since midnight.
    pub fn range(&self) -> (u32, u32) {
        match self {
            Self::Morning => (7 * 60, 12 * 60),
            Self::Midday => (12 * 60, 14 * 60),
            Self::Afternoon => (14 * 60, 17 * 60),
            Self::Evening => (17 * 60, 21 * 60),
        }
    }

    /// The bucket containing `minute`, if any. Nights belong to no bucket.
    pub fn of_minute(minute: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| {
            let (start, end) = bucket.range();
            (start..end).contains(&minute)
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task to place. Read-only input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCandidate {
    #[serde(alias = "title", alias = "task_name")]
    pub name: String,
    #[serde(alias = "duration_minutes", alias = "estimated_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        alias = "preferred_bucket",
        alias = "time_preference",
        with = "bucket_preference"
    )]
    pub preferred_bucket: Option<TimeBucket>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Free-form note from the extractor about why the task belongs where it does.
    #[serde(default, alias = "reasoning")]
    pub hint: Option<String>,
}

impl TaskCandidate {
    pub fn new(name: impl Into<String>, duration_minutes: u32, priority: Priority) -> Self {
        Self {
            name: name.into(),
            duration_minutes,
            priority,
            preferred_bucket: None,
            deadline: None,
            hint: None,
        }
    }

    pub fn prefer(mut self, bucket: TimeBucket) -> Self {
        self.preferred_bucket = Some(bucket);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Reject names and durations the engine cannot place meaningfully.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: "task name is required".to_string(),
            });
        }
        if name.chars().count() > MAX_TASK_NAME_LEN {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: format!("task name must be {MAX_TASK_NAME_LEN} characters or less"),
            });
        }
        if self.duration_minutes == 0 || self.duration_minutes > DAY_MINUTES {
            return Err(ValidationError::InvalidDuration {
                task: self.name.clone(),
                minutes: self.duration_minutes,
            });
        }
        Ok(())
    }
}

/// Accepts a bucket name, `"none"`/`"any"`, or null.
mod bucket_preference {
    use super::TimeBucket;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<TimeBucket>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bucket) => bucket.serialize(serializer),
            None => serializer.serialize_str("none"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TimeBucket>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "any" | "anytime" => Ok(None),
            "morning" => Ok(Some(TimeBucket::Morning)),
            "midday" | "noon" => Ok(Some(TimeBucket::Midday)),
            "afternoon" => Ok(Some(TimeBucket::Afternoon)),
            "evening" | "night" => Ok(Some(TimeBucket::Evening)),
            other => Err(serde::de::Error::custom(format!(
                "unknown time bucket '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(TimeBucket::of_minute(7 * 60), Some(TimeBucket::Morning));
        assert_eq!(TimeBucket::of_minute(12 * 60 - 1), Some(TimeBucket::Morning));
        assert_eq!(TimeBucket::of_minute(12 * 60), Some(TimeBucket::Midday));
        assert_eq!(TimeBucket::of_minute(14 * 60), Some(TimeBucket::Afternoon));
        assert_eq!(TimeBucket::of_minute(17 * 60), Some(TimeBucket::Evening));
        assert_eq!(TimeBucket::of_minute(21 * 60), None);
        assert_eq!(TimeBucket::of_minute(3 * 60), None);
    }

    #[test]
    fn test_priority_boost_and_rank() {
        assert_eq!(Priority::High.boost(), 0.33);
        assert_eq!(Priority::Medium.boost(), 0.20);
        assert_eq!(Priority::Low.boost(), 0.10);
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn test_candidate_from_extractor_json() {
        let json = r#"{
            "title": "Have dinner",
            "duration_minutes": 60,
            "priority": "High",
            "time_preference": "evening",
            "reasoning": "Evening meal"
        }"#;
        let task: TaskCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(task.name, "Have dinner");
        assert_eq!(task.duration_minutes, 60);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.preferred_bucket, Some(TimeBucket::Evening));
        assert_eq!(task.hint.as_deref(), Some("Evening meal"));
    }

    #[test]
    fn test_candidate_defaults() {
        let task: TaskCandidate =
            serde_json::from_str(r#"{"name": "Read", "durationMinutes": 20, "preferredBucket": "none"}"#)
                .unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.preferred_bucket, None);
        assert_eq!(task.deadline, None);
    }

    #[test]
    fn test_unknown_bucket_rejected() {
        let json = r#"{"name": "Read", "durationMinutes": 20, "preferredBucket": "brunch"}"#;
        assert!(serde_json::from_str::<TaskCandidate>(json).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(TaskCandidate::new("Study", 90, Priority::High).validate().is_ok());
        assert!(matches!(
            TaskCandidate::new("Study", 0, Priority::High).validate(),
            Err(ValidationError::InvalidDuration { minutes: 0, .. })
        ));
        assert!(TaskCandidate::new("Study", 1441, Priority::High).validate().is_err());
        assert!(TaskCandidate::new("   ", 30, Priority::Low).validate().is_err());
        assert!(TaskCandidate::new("x".repeat(201), 30, Priority::Low).validate().is_err());
    }
}
