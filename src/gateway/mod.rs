//! Course generation through an external text-generation service.
//!
//! [`CourseGateway`] turns `(topic, difficulty)` into a validated
//! [`NewCourse`]. It makes exactly one upstream call per invocation and
//! never retries; everything the upstream returns is treated as untrusted
//! and goes through [`crate::schema::validate_course`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GenerationError;
use crate::models::{Difficulty, NewCourse};
use crate::schema;

pub mod gemini;

pub use gemini::GeminiClient;

/// One prompt for the upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    /// Ask the service for a JSON document rather than prose.
    pub json: bool,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, req: TextRequest) -> Result<String, GenerationError>;
}

/// Maps an upstream failure description onto the error taxonomy.
/// Quota exhaustion wins over a bare 429 since quota errors usually carry both.
pub fn classify_upstream(message: &str) -> GenerationError {
    let lower = message.to_lowercase();
    if lower.contains("quota") {
        GenerationError::QuotaExhausted
    } else if lower.contains("429") || lower.contains("too many requests") {
        GenerationError::RateLimited
    } else {
        GenerationError::Upstream(message.to_string())
    }
}

const COURSE_SYSTEM_PROMPT: &str = r#"You are an expert educational content creator. Create a comprehensive course structure for the given topic and difficulty level.

The course should include:
- A clear, engaging title
- 4-8 modules with logical progression
- 3-6 lessons per module
- Learning objectives for each lesson
- Detailed content for each lesson
- Interactive exercises where appropriate

Respond with JSON in this exact format:
{
  "title": "Course Title",
  "topic": "Original topic",
  "difficulty": "beginner|intermediate|advanced",
  "duration": "X hours",
  "moduleCount": number,
  "lessonCount": number,
  "modules": [
    {
      "id": 1,
      "title": "Module Title",
      "lessons": [
        {
          "id": 1,
          "title": "Lesson Title",
          "duration": "X minutes",
          "content": "Detailed lesson content with explanations, examples, and practical information",
          "objectives": ["Learning objective 1", "Learning objective 2"],
          "exercises": [
            {
              "question": "Practice question",
              "answer": "Expected answer or solution"
            }
          ]
        }
      ]
    }
  ]
}"#;

fn course_prompt(topic: &str, difficulty: Difficulty) -> String {
    format!(
        "Create a comprehensive {difficulty}-level course on: {topic}\n\n\
         Make sure the course is practical, engaging, and follows modern educational best practices. \
         Include real-world examples and hands-on exercises where applicable."
    )
}

fn lesson_prompt(lesson_title: &str, module_title: &str, difficulty: Difficulty) -> String {
    format!(
        "Create detailed educational content for a {difficulty}-level lesson titled \"{lesson_title}\" \
         which is part of the module \"{module_title}\".\n\n\
         The content should be:\n\
         - Comprehensive and educational\n\
         - Well-structured with clear explanations\n\
         - Include practical examples\n\
         - Suitable for self-paced learning\n\
         - Engaging and easy to understand\n\n\
         Format the response as clean, educational text with proper structure."
    )
}

#[derive(Clone)]
pub struct CourseGateway {
    generator: Arc<dyn TextGenerator>,
}

impl CourseGateway {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<NewCourse, GenerationError> {
        tracing::info!(topic, %difficulty, "requesting course from AI service");
        let raw = self
            .generator
            .generate_text(TextRequest {
                system_instruction: Some(COURSE_SYSTEM_PROMPT.to_string()),
                prompt: course_prompt(topic, difficulty),
                json: true,
            })
            .await?;

        let course = parse_course(&raw)?;
        tracing::info!(
            title = %course.title,
            modules = course.modules.len(),
            lessons = course.actual_lesson_count(),
            "AI course accepted"
        );
        Ok(course)
    }

    pub async fn lesson_content(
        &self,
        lesson_title: &str,
        module_title: &str,
        difficulty: Difficulty,
    ) -> Result<String, GenerationError> {
        let text = self
            .generator
            .generate_text(TextRequest {
                system_instruction: None,
                prompt: lesson_prompt(lesson_title, module_title, difficulty),
                json: false,
            })
            .await?;
        if text.trim().is_empty() {
            return Err(GenerationError::Malformed("Empty response from AI service".into()));
        }
        Ok(text)
    }
}

/// Decodes and validates raw upstream text. A course only comes out of
/// here when it has at least one module and every module has a lesson.
fn parse_course(raw: &str) -> Result<NewCourse, GenerationError> {
    if raw.trim().is_empty() {
        return Err(GenerationError::Malformed("Empty response from AI service".into()));
    }
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| GenerationError::Malformed(format!("AI response is not valid JSON: {e}")))?;

    let has_title = value
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    let has_modules = value.get("modules").is_some_and(Value::is_array);
    if !has_title || !has_modules {
        return Err(GenerationError::Malformed(
            "Invalid course structure received from AI".into(),
        ));
    }

    let course = schema::validate_course(&value)?;

    if course.modules.is_empty() {
        return Err(GenerationError::Malformed("AI course has no modules".into()));
    }
    if let Some(m) = course.modules.iter().find(|m| m.lessons.is_empty()) {
        return Err(GenerationError::Malformed(format!(
            "AI course module {} has no lessons",
            m.id
        )));
    }
    Ok(course)
}
