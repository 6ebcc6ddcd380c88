//! Judge prompt construction.

use benchmaker_domain::ChatMessage;

/// Fixed grading rubric sent as the judge's system prompt
pub const JUDGE_RUBRIC: &str = "\
You are an impartial evaluator grading a candidate response produced by another language model.

Score the candidate on a scale from 0 to 100 using these anchors:
- 90-100: fully correct, complete, and follows every instruction in the original prompt
- 70-89: correct in substance with minor omissions or stylistic problems
- 40-69: partially correct; important parts are missing, vague, or wrong
- 10-39: mostly incorrect or largely ignores the instructions
- 0-9: empty, irrelevant, refused without cause, or entirely wrong

When a reference answer is supplied, judge agreement in meaning rather than exact wording.
Do not reward length for its own sake.

Reply with a single JSON object and nothing else:
{\"score\": <integer 0-100>, \"reasoning\": \"<one or two sentences>\"}";

/// Assembled judge request
#[derive(Debug, Clone, PartialEq)]
pub struct JudgePrompt {
    /// Rubric plus optional suite addendum
    pub system: String,
    /// Task block
    pub user: String,
}

impl JudgePrompt {
    /// Build the prompt for one candidate response
    pub fn build(
        prompt: &str,
        response: &str,
        reference: Option<&str>,
        rubric_addendum: Option<&str>,
    ) -> Self {
        let system = match rubric_addendum.map(str::trim).filter(|a| !a.is_empty()) {
            Some(addendum) => format!("{JUDGE_RUBRIC}\n\nAdditional grading instructions:\n{addendum}"),
            None => JUDGE_RUBRIC.to_string(),
        };

        let mut user = format!("## Original Prompt\n{}\n\n", prompt.trim());
        if let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) {
            user.push_str(&format!("## Reference Answer\n{}\n\n", reference));
        }
        user.push_str(&format!("## Candidate Response\n{}\n", response.trim()));

        Self { system, user }
    }

    /// Chat messages for the gateway
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(&self.system), ChatMessage::user(&self.user)]
    }
}
