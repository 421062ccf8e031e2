use crate::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type CourseId = String;

pub const ALL: &str = "all";
pub const PROGRESS_MAX: i64 = 100;

/// Where a course record came from. Fallback courses are synthesized locally
/// when the provider cannot be reached.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CourseSource {
    #[default]
    Provider,
    Fallback,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(alias = "_id")]
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Minor currency units; 0 means free.
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub enrolled_count: Option<u64>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: CourseSource,
}

impl Course {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price: 0,
            level: String::new(),
            instructor: String::new(),
            rating: None,
            enrolled_count: None,
            is_premium: false,
            created_at: None,
            source: CourseSource::Provider,
        }
    }

    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    pub fn is_fallback(&self) -> bool {
        self.source == CourseSource::Fallback
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: CourseId,
    pub progress: u8,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new(course_id: impl Into<String>, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            course_id: course_id.into(),
            progress: 0,
            enrolled_at,
            completed: false,
            completed_at: None,
            completed_lessons: Vec::new(),
            last_accessed_at: None,
        }
    }

    /// Returns a copy with `update` merged in. The record itself is left
    /// untouched when the merged percentage is out of range.
    pub fn merged(&self, update: &ProgressUpdate, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let mut next = self.clone();
        if let Some(p) = update.progress {
            if !(0..=PROGRESS_MAX).contains(&p) {
                return Err(CoreError::InvalidProgress(p));
            }
            next.progress = p as u8;
        }
        if let Some(lesson) = &update.completed_lesson {
            if !next.completed_lessons.iter().any(|l| l == lesson) {
                next.completed_lessons.push(lesson.clone());
            }
        }
        next.last_accessed_at = Some(now);
        if i64::from(next.progress) == PROGRESS_MAX && !next.completed {
            next.completed = true;
            next.completed_at = Some(now);
        }
        Ok(next)
    }
}

/// Partial progress data sent by the learner.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub completed_lesson: Option<String>,
}

impl ProgressUpdate {
    pub fn percent(progress: i64) -> Self {
        Self {
            progress: Some(progress),
            completed_lesson: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    #[default]
    All,
    Free,
    Premium,
}

impl FromStr for PricingMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(PricingMode::All),
            "free" => Ok(PricingMode::Free),
            "premium" | "paid" => Ok(PricingMode::Premium),
            _ => Err(CoreError::Invalid("pricing must be all, free or premium")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Popular,
    Rating,
    Newest,
    PriceLow,
    PriceHigh,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Popular => "popular",
            SortKey::Rating => "rating",
            SortKey::Newest => "newest",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popular" => Ok(SortKey::Popular),
            "rating" => Ok(SortKey::Rating),
            "newest" => Ok(SortKey::Newest),
            "price-low" => Ok(SortKey::PriceLow),
            "price-high" => Ok(SortKey::PriceHigh),
            _ => Err(CoreError::Invalid("unknown sort key")),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub category: String,
    pub level: String,
    pub pricing: PricingMode,
    pub search: String,
    pub sort: SortKey,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            category: ALL.to_string(),
            level: ALL.to_string(),
            pricing: PricingMode::All,
            search: String::new(),
            sort: SortKey::Popular,
        }
    }
}

impl Criteria {
    /// Shallow merge; every field present in `patch` wins.
    pub fn merge(&mut self, patch: CriteriaPatch) {
        if let Some(c) = patch.category {
            self.category = c;
        }
        if let Some(l) = patch.level {
            self.level = l;
        }
        if let Some(p) = patch.pricing {
            self.pricing = p;
        }
        if let Some(s) = patch.search {
            self.search = s;
        }
        if let Some(s) = patch.sort {
            self.sort = s;
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Criteria::default()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaPatch {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub pricing: Option<PricingMode>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortKey>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

/// Query parameters sent to the provider. `None` means "no constraint".
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CourseQuery {
    pub fn from_criteria(criteria: &Criteria) -> Self {
        fn constraint(v: &str) -> Option<String> {
            let v = v.trim();
            if v.is_empty() || v.eq_ignore_ascii_case(ALL) {
                None
            } else {
                Some(v.to_string())
            }
        }
        Self {
            category: constraint(&criteria.category),
            level: constraint(&criteria.level),
            search: constraint(&criteria.search),
            sort: Some(criteria.sort),
            page: None,
            limit: None,
        }
    }

    /// Criteria equivalent used when a provider evaluates the query itself.
    pub fn to_criteria(&self) -> Criteria {
        Criteria {
            category: self.category.clone().unwrap_or_else(|| ALL.to_string()),
            level: self.level.clone().unwrap_or_else(|| ALL.to_string()),
            pricing: PricingMode::All,
            search: self.search.clone().unwrap_or_default(),
            sort: self.sort.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CoursePage {
    pub courses: Vec<Course>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// A course identifier as providers send it: text or a bare number.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IdValue {
    Text(String),
    Number(u64),
}

impl IdValue {
    pub fn into_string(self) -> String {
        match self {
            IdValue::Text(s) => s,
            IdValue::Number(n) => n.to_string(),
        }
    }
}

/// Providers reference the enrolled course either by id or by embedding the
/// course document. Both collapse to a plain id on ingestion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CourseRef {
    Raw(IdValue),
    Embedded {
        #[serde(alias = "_id")]
        id: IdValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

impl CourseRef {
    pub fn id(id: impl Into<String>) -> Self {
        CourseRef::Raw(IdValue::Text(id.into()))
    }

    pub fn into_id(self) -> CourseId {
        match self {
            CourseRef::Raw(v) => v.into_string(),
            CourseRef::Embedded { id, .. } => id.into_string(),
        }
    }
}

/// Enrollment as it arrives from a provider, before normalization.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    #[serde(alias = "course")]
    pub course_id: CourseRef,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl EnrollmentRecord {
    /// Fractional progress is truncated, so only the provider's own
    /// `completed` flag or a raw value of at least 100 completes a course.
    pub fn normalize(self, now: DateTime<Utc>) -> Enrollment {
        let max = PROGRESS_MAX as f64;
        let progress = self.progress.trunc().clamp(0.0, max) as u8;
        Enrollment {
            course_id: self.course_id.into_id(),
            progress,
            enrolled_at: self.enrolled_at.unwrap_or(now),
            completed: self.completed || self.progress >= max,
            completed_at: self.completed_at,
            completed_lessons: self.completed_lessons,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

impl From<&Enrollment> for EnrollmentRecord {
    fn from(e: &Enrollment) -> Self {
        Self {
            course_id: CourseRef::id(e.course_id.clone()),
            progress: f64::from(e.progress),
            enrolled_at: Some(e.enrolled_at),
            completed: e.completed,
            completed_at: e.completed_at,
            completed_lessons: e.completed_lessons.clone(),
            last_accessed_at: e.last_accessed_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollAck {
    pub message: String,
    #[serde(default)]
    pub course: Option<Course>,
    #[serde(default)]
    pub enrollment: Option<EnrollmentRecord>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentCheck {
    pub is_enrolled: bool,
    #[serde(default)]
    pub enrollment: Option<EnrollmentRecord>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStatus {
    pub is_enrolled: bool,
    pub enrollment: Option<Enrollment>,
}
