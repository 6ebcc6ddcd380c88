//! Judge reply parsing.
//!
//! Judge models rarely answer in exactly the requested shape. The reply is run
//! through an ordered chain of independent stages, and the first stage that
//! recognises a score wins:
//!
//! 1. structured rubric fields (constraint / semantic / persona)
//! 2. a JSON object, fenced or embedded in prose
//! 3. a `score`/`rating` phrase or a bare number
//!
//! A reply no stage understands scores 0 with confidence 0. It is never
//! given a neutral default.

use benchmaker_domain::ScoringResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Confidence when the rubric fields were all present
pub const RUBRIC_CONFIDENCE: f64 = 0.85;
/// Confidence for a parsed JSON verdict
pub const JSON_CONFIDENCE: f64 = 0.9;
/// Confidence for a number recovered from prose
pub const FREE_TEXT_CONFIDENCE: f64 = 0.7;

const DIAGNOSTIC_LIMIT: usize = 200;

type Stage = fn(&str) -> Option<ScoringResult>;

const STAGES: [Stage; 3] = [parse_rubric, parse_json, parse_free_text];

static CONSTRAINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)constraint[\s_-]*satisfaction\W{0,5}(yes|no)\b").expect("constraint regex is valid")
});

static SEMANTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&rubric_field("semantic")).expect("semantic regex is valid")
});

static PERSONA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&rubric_field("persona")).expect("persona regex is valid")
});

/// Pattern for one rubric score field.
///
/// Groups: 1 the upper bound of a scale label such as `(0-10)` or
/// `(out of 100)`, 2 the value, 3 an explicit `/10` or `/100` suffix.
fn rubric_field(name: &str) -> String {
    format!(
        r"(?i){}[\s_-]*score\s*(?:\(\s*(?:\d+(?:\.\d+)?\s*[-\x{{2013}}]\s*|out\s+of\s+)?(\d+(?:\.\d+)?)\s*\))?\W{{0,5}}?(\d+(?:\.\d+)?)(?:\s*/\s*(10|100)\b)?",
        name
    )
}

static FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("fence regex is valid"));

static LABELLED_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:score|rating)\b[^\d\n]{0,20}?(\d+(?:\.\d+)?)(?:\s*(?:/|out\s+of)\s*(10|100)\b)?")
        .expect("score phrase regex is valid")
});

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(?:/\s*(10|100))?\s*\.?\s*$").expect("bare number regex is valid")
});

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("leading number regex is valid"));

const SCORE_KEYS: [&str; 2] = ["score", "rating"];
const NOTE_KEYS: [&str; 5] = ["reasoning", "rationale", "explanation", "notes", "reason"];

/// Parse a judge reply into a normalized score
pub fn parse_judge_reply(reply: &str) -> ScoringResult {
    STAGES
        .iter()
        .find_map(|stage| stage(reply))
        .unwrap_or_else(|| unparseable(reply))
}

/// Rescale to 0..=100.
///
/// An explicit `/10` multiplies by ten and an explicit `/100` is taken as is.
/// Without a suffix, values up to 10 are assumed to be on a 10-point scale.
fn to_hundred(value: f64, scale: Option<&str>) -> f64 {
    let scaled = match scale {
        Some("10") => value * 10.0,
        Some(_) => value,
        None if value <= 10.0 => value * 10.0,
        None => value,
    };
    scaled.clamp(0.0, 100.0)
}

fn from_hundred(value: f64, confidence: f64) -> ScoringResult {
    ScoringResult::new(value / 100.0)
        .with_confidence(confidence)
        .with_raw(value, 100.0)
}

fn captured_score(caps: &regex::Captures<'_>) -> Option<f64> {
    let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
    Some(to_hundred(value, caps.get(2).map(|m| m.as_str())))
}

/// A rubric field scaled to 0..=100, honouring a scale label when present
fn rubric_score(caps: &regex::Captures<'_>) -> Option<f64> {
    let value = caps.get(2)?.as_str().parse::<f64>().ok()?;
    if let Some(suffix) = caps.get(3) {
        return Some(to_hundred(value, Some(suffix.as_str())));
    }
    match caps.get(1) {
        Some(bound) => {
            let max = bound.as_str().parse::<f64>().ok().filter(|m| *m > 0.0)?;
            Some((value / max * 100.0).clamp(0.0, 100.0))
        }
        None => Some(to_hundred(value, None)),
    }
}

/// Stage 1/// Stage 1: all three rubric fields, in any order
pub fn parse_rubric(reply: &str) -> Option<ScoringResult> {
    let satisfied = CONSTRAINT.captures(reply)?.get(1)?.as_str().eq_ignore_ascii_case("yes");
    let semantic = rubric_score(&SEMANTIC.captures(reply)?)?;
    let persona = rubric_score(&PERSONA.captures(reply)?)?;

    let average = if satisfied { (semantic + persona) / 2.0 } else { 0.0 };

    Some(from_hundred(average, RUBRIC_CONFIDENCE).with_notes(format!(
        "Constraint satisfaction: {}; semantic {:.0}/100, persona {:.0}/100",
        if satisfied { "yes" } else { "no" },
        semantic,
        persona
    )))
}

/// Stage 2: a JSON object carrying a `score` or `rating` field
pub fn parse_json(reply: &str) -> Option<ScoringResult> {
    let candidate = FENCED
        .captures_iter(reply)
        .filter_map(|caps| caps.get(1))
        .find_map(|body| balanced_object(body.as_str()))
        .or_else(|| balanced_object(reply))?;

    let value: Value = serde_json::from_str(&strip_trailing_commas(candidate)).ok()?;
    let raw = find_field(&value, &SCORE_KEYS, &coerce_number)?;

    let mut clamped = raw.clamp(0.0, 100.0);
    if clamped <= 10.0 {
        clamped *= 10.0;
    }

    let mut result = from_hundred(clamped, JSON_CONFIDENCE);
    if let Some(notes) = find_field(&value, &NOTE_KEYS, &note_text) {
        result = result.with_notes(notes);
    }
    Some(result)
}

/// Stage 3: a labelled score in prose, or a reply that is only a number
pub fn parse_free_text(reply: &str) -> Option<ScoringResult> {
    let caps = LABELLED_SCORE
        .captures(reply)
        .or_else(|| BARE_NUMBER.captures(reply))?;
    let value = captured_score(&caps)?;

    Some(
        from_hundred(value, FREE_TEXT_CONFIDENCE)
            .with_notes(format!("Score recovered from free text: {:.0}/100", value)),
    )
}

/// Terminal stage: zero score, zero confidence, truncated reply for diagnosis
pub fn unparseable(reply: &str) -> ScoringResult {
    let trimmed = reply.trim();
    let excerpt = if trimmed.chars().count() > DIAGNOSTIC_LIMIT {
        let head: String = trimmed.chars().take(DIAGNOSTIC_LIMIT).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    };
    ScoringResult::unreliable(format!("Unparseable judge reply: {excerpt}"))
}

/// First `{` through its matching `}`, skipping braces inside strings
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop commas that directly precede `}` or `]` outside strings
fn strip_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn note_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .or_else(|| LEADING_NUMBER.find(s).and_then(|m| m.as_str().parse().ok()))
        }
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Look up a key case-insensitively, top level first, then nested values
fn find_field<T>(value: &Value, keys: &[&str], extract: &dyn Fn(&Value) -> Option<T>) -> Option<T> {
    match value {
        Value::Object(map) => {
            for key in keys {
                let hit = map
                    .iter()
                    .filter(|(k, _)| k.eq_ignore_ascii_case(key))
                    .find_map(|(_, v)| extract(v));
                if hit.is_some() {
                    return hit;
                }
            }
            map.values().find_map(|v| find_field(v, keys, extract))
        }
        Value::Array(items) => items.iter().find_map(|v| find_field(v, keys, extract)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ========================================================================
    // Cascade
    // ========================================================================

    #[test]
    fn test_clean_json() {
        let result = parse_judge_reply(r#"{"score": 85, "reasoning": "good"}"#);
        assert!(approx(result.score, 0.85));
        assert_eq!(result.confidence, Some(JSON_CONFIDENCE));
        assert_eq!(result.notes.as_deref(), Some("good"));
        assert_eq!(result.raw_score, Some(85.0));
        assert_eq!(result.max_score, Some(100.0));
    }

    #[test]
    fn test_ten_point_heuristic_in_json() {
        let result = parse_judge_reply(r#"{"score": 7}"#);
        assert!(approx(result.score, 0.7));
    }

    #[test]
    fn test_rubric_constraint_failure_zeroes_score() {
        let result =
            parse_judge_reply("Constraint Satisfaction: No\nSemantic Score: 9/10\nPersona Score: 8/10");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(RUBRIC_CONFIDENCE));
    }

    #[test]
    fn test_rubric_averages_sub_scores() {
        let result =
            parse_judge_reply("Persona Score: 80/100\nconstraint satisfaction: YES\nSemantic Score: 9");
        assert!(approx(result.score, 0.85));
        assert_eq!(result.confidence, Some(RUBRIC_CONFIDENCE));
    }

    #[test]
    fn test_rubric_scale_labels_are_not_read_as_scores() {
        let result = parse_judge_reply(
            "Constraint Satisfaction: yes\nSemantic Score (0-10): 9\nPersona Score (0-10): 8",
        );
        assert!(approx(result.score, 0.85));
        assert_eq!(result.confidence, Some(RUBRIC_CONFIDENCE));

        let result = parse_judge_reply(
            "Constraint Satisfaction: yes\nSemantic Score (0-100): 70\nPersona Score (out of 100): 90",
        );
        assert!(approx(result.score, 0.8));

        let result = parse_judge_reply(
            "Constraint Satisfaction: yes\nSemantic Score (1-5): 4\nPersona Score (1-5): 5",
        );
        assert!(approx(result.score, 0.9));
    }

    #[test]
    fn test_labelled_rubric_with_failed_constraint() {
        let result = parse_judge_reply(
            "Constraint Satisfaction: no\nSemantic Score (0-10): 9\nPersona Score (0-10): 8",
        );
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(RUBRIC_CONFIDENCE));
    }

    #[test]
    fn test_partial_rubric_falls_through() {
        let result = parse_judge_reply("Constraint Satisfaction: yes\nSemantic Score: 9/10");
        assert_eq!(result.confidence, Some(FREE_TEXT_CONFIDENCE));
        assert!(approx(result.score, 0.9));
    }

    #[test]
    fn test_garbage_is_unreliable() {
        let result = parse_judge_reply("garbage text with no number");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.notes.unwrap().starts_with("Unparseable judge reply: garbage"));
    }

    #[test]
    fn test_empty_reply_is_unreliable() {
        assert_eq!(parse_judge_reply("   ").confidence, Some(0.0));
    }

    // ========================================================================
    // JSON stage
    // ========================================================================

    #[test]
    fn test_fenced_json_with_prose() {
        let reply = "Here is my evaluation:\n```json\n{\"rating\": \"92\", \"explanation\": \"thorough\"}\n```\nThanks!";
        let result = parse_json(reply).unwrap();
        assert!(approx(result.score, 0.92));
        assert_eq!(result.notes.as_deref(), Some("thorough"));
    }

    #[test]
    fn test_embedded_json_with_braces_in_strings() {
        let reply = r#"I think {"reasoning": "uses a {placeholder} and \"quotes\"", "Score": 64} is fair."#;
        let result = parse_json(reply).unwrap();
        assert!(approx(result.score, 0.64));
        assert_eq!(result.notes.as_deref(), Some(r#"uses a {placeholder} and "quotes""#));
    }

    #[test]
    fn test_trailing_commas_tolerated() {
        let result = parse_json("{\"score\": 55, \"tags\": [\"a\", \"b\",],}").unwrap();
        assert!(approx(result.score, 0.55));
    }

    #[test]
    fn test_nested_score_field() {
        let result = parse_json(r#"{"evaluation": {"score": 40, "rationale": "thin"}}"#).unwrap();
        assert!(approx(result.score, 0.4));
        assert_eq!(result.notes.as_deref(), Some("thin"));
    }

    #[test]
    fn test_json_score_is_clamped() {
        assert!(approx(parse_json(r#"{"score": 250}"#).unwrap().score, 1.0));
        assert_eq!(parse_json(r#"{"score": -4}"#).unwrap().score, 0.0);
    }

    #[test]
    fn test_json_without_score_field_falls_through() {
        assert!(parse_json(r#"{"verdict": "fine"}"#).is_none());
        assert!(parse_json("no braces here").is_none());
        assert!(parse_json("{unterminated").is_none());
    }

    // ========================================================================
    // Free-text stage
    // ========================================================================

    #[test]
    fn test_labelled_score_in_prose() {
        let result = parse_free_text("Overall I would give this a score of 78.").unwrap();
        assert!(approx(result.score, 0.78));
        assert_eq!(result.confidence, Some(FREE_TEXT_CONFIDENCE));

        let result = parse_free_text("Rating: 8/10, solid work").unwrap();
        assert!(approx(result.score, 0.8));
    }

    #[test]
    fn test_explicit_hundred_scale_is_kept() {
        let result = parse_free_text("Score: 7 out of 100").unwrap();
        assert!(approx(result.score, 0.07));
    }

    #[test]
    fn test_bare_number_reply() {
        assert!(approx(parse_free_text("  85 ").unwrap().score, 0.85));
        assert!(approx(parse_free_text("6").unwrap().score, 0.6));
        assert!(parse_free_text("The answer has 3 parts").is_none());
    }

    #[test]
    fn test_unparseable_truncates_long_replies() {
        let reply = "x".repeat(500);
        let notes = unparseable(&reply).notes.unwrap();
        assert!(notes.ends_with("..."));
        assert_eq!(notes.len(), "Unparseable judge reply: ".len() + DIAGNOSTIC_LIMIT + 3);
    }
}
