use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a submission, independent of its position in the
/// workbench list. Grading outcomes are applied by this id, never by a
/// live index, so a response that arrives after the list was reordered or
/// shrunk still lands on the right entry (or nowhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Source language of a submission. The numeric code is the compact menu
/// encoding; the extension feeds the judge submit payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    C,
    Cpp,
    Pascal,
    Python,
    Java,
}

impl Language {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::C),
            1 => Some(Self::Cpp),
            2 => Some(Self::Pascal),
            3 => Some(Self::Python),
            4 => Some(Self::Java),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::C => 0,
            Self::Cpp => 1,
            Self::Pascal => 2,
            Self::Python => 3,
            Self::Java => 4,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Pascal => "pas",
            Self::Python => "py",
            Self::Java => "java",
        }
    }
}

/// Local edit/submit lifecycle of a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Unsaved,
    Saved,
    Submitted,
}

/// One judged test case within a grading report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseOutcome {
    pub name: String,
    pub verdict: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Judge outcome for one submission. An empty report means the judge has
/// accepted the submission and grading is still pending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<TestCaseOutcome>,
}

impl GradingReport {
    /// Report written right after a submit is accepted, before any verdict.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.verdict.is_none() && self.details.is_empty()
    }
}

/// One user-authored source file tracked for a single problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    /// Display name; unique within a workbench (collision triggers the
    /// overwrite decision, never a silent replace).
    pub name: String,
    /// Judge-side problem identifier.
    pub problem: String,
    pub language: Language,
    pub content: String,
    #[serde(default)]
    pub save_status: SaveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GradingReport>,
}

impl Submission {
    pub fn new(
        name: impl Into<String>,
        problem: impl Into<String>,
        language: Language,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            name: name.into(),
            problem: problem.into(),
            language,
            content: content.into(),
            save_status: SaveStatus::Unsaved,
            result: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for code in 0..5 {
            let language = Language::from_code(code).expect("known code");
            assert_eq!(language.code(), code);
        }
        assert_eq!(Language::from_code(99), None);
    }

    #[test]
    fn pending_report_serializes_to_empty_object() {
        let json = serde_json::to_value(GradingReport::pending()).expect("serialize");
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn report_with_verdict_is_not_pending() {
        let report = GradingReport {
            verdict: Some("accepted".to_string()),
            details: Vec::new(),
        };
        assert!(!report.is_pending());
        assert!(GradingReport::pending().is_pending());
    }

    #[test]
    fn submission_round_trips_through_json() {
        let submission = Submission::new("sol", "p1", Language::Cpp, "int main() {}");
        let json = serde_json::to_string(&submission).expect("serialize");
        let back: Submission = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, submission);
    }
}
