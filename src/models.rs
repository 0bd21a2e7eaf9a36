use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown difficulty `{0}`")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(UnknownDifficulty(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub question: String,
    pub answer: String,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: i32,
    pub title: String,
    pub duration: String,
    pub content: String,
    pub objectives: Vec<String>,
    #[serde(default)]
    pub exercises: Option<Vec<Exercise>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub id: i32,
    pub title: String,
    pub lessons: Vec<Lesson>,
}

/// Validated course fields, everything a stored course carries except the
/// repository-assigned `id` and `createdAt`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub duration: String,
    pub module_count: i32,
    pub lesson_count: i32,
    pub modules: Vec<Module>,
}

impl NewCourse {
    pub fn actual_lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i32,
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub duration: String,
    pub module_count: i32,
    pub lesson_count: i32,
    pub modules: Vec<Module>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn from_new(id: i32, created_at: DateTime<Utc>, new: NewCourse) -> Self {
        Self {
            id,
            title: new.title,
            topic: new.topic,
            difficulty: new.difficulty,
            duration: new.duration,
            module_count: new.module_count,
            lesson_count: new.lesson_count,
            modules: new.modules,
            created_at,
        }
    }

    /// True when the query is a case-insensitive substring of the title or
    /// topic, or of the initials of either ("ml" for "Machine Learning").
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        [&self.title, &self.topic].into_iter().any(|field| {
            let haystack = field.to_lowercase();
            haystack.contains(&needle) || initials(&haystack).contains(&needle)
        })
    }
}

fn initials(text: &str) -> String {
    text.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/courses/generate`, after validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: Difficulty,
}

/// Body of `POST /api/lessons/content`, after validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LessonContentRequest {
    pub lesson_title: String,
    pub module_title: String,
    pub difficulty: Difficulty,
}
