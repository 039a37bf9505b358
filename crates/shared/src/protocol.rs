use serde::{Deserialize, Serialize};

use crate::domain::Submission;

/// Wire payload for one judge submission. The judge signals acceptance
/// with a success status and a response body of the literal JSON `true`;
/// anything else is a submission failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub problem: String,
    pub ext: String,
    pub content: String,
}

impl SubmitRequest {
    pub fn for_submission(submission: &Submission) -> Self {
        Self {
            problem: submission.problem.clone(),
            ext: format!(".{}", submission.language.extension()),
            content: submission.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Language;

    #[test]
    fn request_carries_dotted_extension() {
        let submission = Submission::new("sol", "p1", Language::Python, "print(1)");
        let request = SubmitRequest::for_submission(&submission);
        assert_eq!(request.problem, "p1");
        assert_eq!(request.ext, ".py");
        assert_eq!(request.content, "print(1)");
    }
}
