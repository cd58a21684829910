//! Structured outputs of the classifier and assessor stages.
//!
//! Each result has a response schema (sent to the model) and a strict
//! parser: the payload either matches the expected shape and ranges, or
//! the stage fails with a parse error. Nothing is filled in with guesses.

use serde::{Deserialize, Serialize};

use super::json::extract_json_object;

// ── Subject ─────────────────────────────────────────────────────────

/// Subject detected by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Subject {
    Math,
    Science,
    History,
    English,
    ComputerScience,
    /// Anything else, with the label the model gave.
    Other(String),
}

impl Subject {
    pub fn label(&self) -> &str {
        match self {
            Self::Math => "Math",
            Self::Science => "Science",
            Self::History => "History",
            Self::English => "English",
            Self::ComputerScience => "CS",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Subject {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "math" | "mathematics" | "maths" => Self::Math,
            "science" => Self::Science,
            "history" => Self::History,
            "english" => Self::English,
            "cs" | "computer science" => Self::ComputerScience,
            "" => Self::Other("Other".to_string()),
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.label().to_string()
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Difficulty ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(format!("difficulty must be Easy, Medium or Hard, got '{raw}'")),
        }
    }
}

impl From<Difficulty> for String {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.label().to_string()
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Classifier ──────────────────────────────────────────────────────

/// Output of stage 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub subject: Subject,
    pub topic: String,
    pub subtopic: String,
    /// 0-100.
    pub confidence: f64,
    pub keywords: Vec<String>,
    /// Analysis steps the model went through.
    pub reasoning: Vec<String>,
}

impl ClassifierResult {
    /// Parse and validate a classifier payload.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let result: Self = serde_json::from_str(extract_json_object(raw))
            .map_err(|e| format!("JSON parse error: {e}"))?;
        check_confidence(result.confidence)?;
        if result.topic.trim().is_empty() {
            return Err("topic must not be empty".to_string());
        }
        Ok(result)
    }

    /// Response schema sent with the request.
    pub fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "subject": { "type": "STRING" },
                "topic": { "type": "STRING" },
                "subtopic": { "type": "STRING" },
                "confidence": { "type": "NUMBER" },
                "keywords": { "type": "ARRAY", "items": { "type": "STRING" } },
                "reasoning": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["subject", "topic", "subtopic", "confidence", "keywords", "reasoning"]
        })
    }
}

// ── Assessor ────────────────────────────────────────────────────────

/// Output of stage 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessorResult {
    pub intrinsic_difficulty: Difficulty,
    pub grade_level: String,
    pub adjusted_difficulty: Difficulty,
    pub complexity_factors: Vec<String>,
    /// Why the difficulty was assigned.
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AssessorResult {
    /// Parse and validate an assessor payload.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let result: Self = serde_json::from_str(extract_json_object(raw))
            .map_err(|e| format!("JSON parse error: {e}"))?;
        if let Some(confidence) = result.confidence {
            check_confidence(confidence)?;
        }
        if result.grade_level.trim().is_empty() {
            return Err("gradeLevel must not be empty".to_string());
        }
        Ok(result)
    }

    pub fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "intrinsicDifficulty": { "type": "STRING", "enum": ["Easy", "Medium", "Hard"] },
                "gradeLevel": { "type": "STRING" },
                "adjustedDifficulty": { "type": "STRING", "enum": ["Easy", "Medium", "Hard"] },
                "complexityFactors": { "type": "ARRAY", "items": { "type": "STRING" } },
                "reasoning": { "type": "STRING" },
                "confidence": { "type": "NUMBER" }
            },
            "required": [
                "intrinsicDifficulty",
                "gradeLevel",
                "adjustedDifficulty",
                "complexityFactors",
                "reasoning"
            ]
        })
    }
}

fn check_confidence(confidence: f64) -> Result<(), String> {
    if confidence.is_finite() && (0.0..=100.0).contains(&confidence) {
        Ok(())
    } else {
        Err(format!("confidence must be within 0-100, got {confidence}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIFIER_OK: &str = r#"{
        "subject": "Math",
        "topic": "Algebra",
        "subtopic": "Linear equations",
        "confidence": 92,
        "keywords": ["solve", "equation"],
        "reasoning": ["contains a variable", "single unknown"]
    }"#;

    const ASSESSOR_OK: &str = r#"{
        "intrinsicDifficulty": "easy",
        "gradeLevel": "Grade 7",
        "adjustedDifficulty": "Easy",
        "complexityFactors": ["two steps"],
        "reasoning": "one variable, integer answer"
    }"#;

    #[test]
    fn parse_classifier() {
        let result = ClassifierResult::parse(CLASSIFIER_OK).unwrap();
        assert_eq!(result.subject, Subject::Math);
        assert_eq!(result.topic, "Algebra");
        assert_eq!(result.confidence, 92.0);
        assert_eq!(result.keywords.len(), 2);
    }

    #[test]
    fn parse_classifier_in_code_fence() {
        let raw = format!("```json\n{CLASSIFIER_OK}\n```");
        assert!(ClassifierResult::parse(&raw).is_ok());
    }

    #[test]
    fn classifier_missing_field_rejected() {
        let raw = r#"{"subject": "Math", "topic": "Algebra", "confidence": 90}"#;
        let err = ClassifierResult::parse(raw).unwrap_err();
        assert!(err.contains("missing field"));
    }

    #[test]
    fn classifier_confidence_out_of_range_rejected() {
        let raw = CLASSIFIER_OK.replace("92", "140");
        let err = ClassifierResult::parse(&raw).unwrap_err();
        assert!(err.contains("0-100"));
    }

    #[test]
    fn classifier_not_json_rejected() {
        assert!(ClassifierResult::parse("I think this is math.").is_err());
    }

    #[test]
    fn unknown_subject_kept_as_other() {
        let raw = CLASSIFIER_OK.replace("\"Math\"", "\"Geography\"");
        let result = ClassifierResult::parse(&raw).unwrap();
        assert_eq!(result.subject, Subject::Other("Geography".into()));
        assert_eq!(result.subject.label(), "Geography");
    }

    #[test]
    fn subject_aliases() {
        assert_eq!(Subject::from("Computer Science".to_string()), Subject::ComputerScience);
        assert_eq!(Subject::from("maths".to_string()), Subject::Math);
        assert_eq!(Subject::from(" ".to_string()).label(), "Other");
    }

    #[test]
    fn parse_assessor_case_insensitive_difficulty() {
        let result = AssessorResult::parse(ASSESSOR_OK).unwrap();
        assert_eq!(result.intrinsic_difficulty, Difficulty::Easy);
        assert_eq!(result.adjusted_difficulty, Difficulty::Easy);
        assert_eq!(result.grade_level, "Grade 7");
        assert!(result.confidence.is_none());
    }

    #[test]
    fn assessor_unknown_difficulty_rejected() {
        let raw = ASSESSOR_OK.replace("\"Easy\"", "\"Trivial\"");
        let err = AssessorResult::parse(&raw).unwrap_err();
        assert!(err.contains("Easy, Medium or Hard"));
    }

    #[test]
    fn assessor_confidence_validated_when_present() {
        let raw = ASSESSOR_OK.replace(
            "\"reasoning\": \"one variable, integer answer\"",
            "\"reasoning\": \"x\", \"confidence\": -5",
        );
        assert!(AssessorResult::parse(&raw).is_err());
    }

    #[test]
    fn assessor_serializes_camel_case() {
        let result = AssessorResult::parse(ASSESSOR_OK).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["adjustedDifficulty"], "Easy");
        assert_eq!(json["gradeLevel"], "Grade 7");
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn schemas_declare_required_fields() {
        assert_eq!(ClassifierResult::schema()["required"].as_array().unwrap().len(), 6);
        assert!(
            AssessorResult::schema()["required"]
                .as_array()
                .unwrap()
                .iter()
                .all(|f| f != "confidence")
        );
    }
}
