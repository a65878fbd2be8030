//! Session-log (`.jsonl`) inspection: method detection, validation and the sample template.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::DashboardError;

const MIN_PROFILE_CHARS: usize = 10;

/// True when the file name carries the session-log extension the server accepts.
pub fn is_session_log_name(name: &str) -> bool {
    name.ends_with(".jsonl")
}

/// Method names taken from the key set of `rounds[0].responses` of the first record.
///
/// Never fails: a malformed first record is logged and yields an empty list.
pub fn detect_methods(text: &str) -> Vec<String> {
    let first = match text.trim().split('\n').next() {
        Some(line) => line,
        None => return Vec::new(),
    };
    let record: Value = match serde_json::from_str(first) {
        Ok(value) => value,
        Err(err) => {
            warn!("could not parse first session record: {err}");
            return Vec::new();
        }
    };
    let methods: Vec<String> = record
        .get("rounds")
        .and_then(Value::as_array)
        .and_then(|rounds| rounds.first())
        .and_then(|round| round.get("responses"))
        .and_then(Value::as_object)
        .map(|responses| responses.keys().cloned().collect())
        .unwrap_or_default();
    debug!(count = methods.len(), "methods detected from first record");
    methods
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSummary {
    pub sessions: usize,
    pub rounds: usize,
    /// Sorted; the server compares method sets, not orderings.
    pub methods: Vec<String>,
}

/// Apply the server's upload rules to a whole log.
pub fn validate_log(text: &str) -> Result<LogSummary, DashboardError> {
    if text.lines().next().is_none() {
        return Err(invalid(1, "empty file"));
    }

    let mut methods: Option<BTreeSet<String>> = None;
    let mut sessions = 0;
    let mut rounds_total = 0;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(line)
            .map_err(|err| invalid(line_no, format!("invalid JSON - {err}")))?;

        for field in ["session_id", "user_profile", "rounds"] {
            if record.get(field).is_none() {
                return Err(invalid(line_no, format!("missing required field '{field}'")));
            }
        }
        match record["session_id"].as_str() {
            Some(id) if !id.is_empty() => {}
            _ => return Err(invalid(line_no, "'session_id' must be a non-empty string")),
        }
        match record["user_profile"].as_str() {
            Some(profile) if profile.chars().count() >= MIN_PROFILE_CHARS => {}
            _ => {
                return Err(invalid(
                    line_no,
                    format!("'user_profile' must be a string with at least {MIN_PROFILE_CHARS} chars"),
                ))
            }
        }
        let rounds = match record["rounds"].as_array() {
            Some(rounds) if !rounds.is_empty() => rounds,
            _ => return Err(invalid(line_no, "'rounds' must be a non-empty array")),
        };

        for (r_idx, round) in rounds.iter().enumerate() {
            let round_no = r_idx + 1;
            for field in ["round", "user_message", "responses"] {
                if round.get(field).is_none() {
                    return Err(invalid(
                        line_no,
                        format!("round {round_no}: missing '{field}' field"),
                    ));
                }
            }
            let responses = match round["responses"].as_object() {
                Some(map) if !map.is_empty() => map,
                _ => {
                    return Err(invalid(
                        line_no,
                        format!("round {round_no}: 'responses' must be a non-empty object"),
                    ))
                }
            };
            let current: BTreeSet<String> = responses.keys().cloned().collect();
            match &methods {
                None => methods = Some(current),
                Some(expected) if *expected != current => {
                    return Err(invalid(
                        line_no,
                        format!(
                            "round {round_no}: inconsistent methods, expected {} got {}",
                            join(expected),
                            join(&current)
                        ),
                    ));
                }
                Some(_) => {}
            }
            rounds_total += 1;
        }
        sessions += 1;
    }

    Ok(LogSummary {
        sessions,
        rounds: rounds_total,
        methods: methods.unwrap_or_default().into_iter().collect(),
    })
}

/// The sample session served as `template.jsonl`.
pub fn template_record() -> Value {
    json!({
        "session_id": "user_001_session_001",
        "user_profile": "He is a 22-year-old college student studying anthropology...",
        "user_personality": "He is curious and open-minded...",
        "rounds": [
            {
                "round": 1,
                "user_message": "Hey, just added you as a friend!",
                "responses": {
                    "Base": "Hello! How can I help you today?",
                    "YourMethod": "Hey! Nice to meet you! How's your day going?"
                }
            },
            {
                "round": 2,
                "user_message": "Just got out of class, a bit tired",
                "responses": {
                    "Base": "I understand. Rest is important for productivity.",
                    "YourMethod": "Classes can be exhausting! What subject was it?"
                }
            }
        ]
    })
}

/// One-line `.jsonl` rendering of [`template_record`].
pub fn template_jsonl() -> String {
    format!("{}\n", template_record())
}

fn invalid(line: usize, reason: impl Into<String>) -> DashboardError {
    DashboardError::InvalidLog {
        line,
        reason: reason.into(),
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, methods: &[&str]) -> String {
        let responses: serde_json::Map<String, Value> = methods
            .iter()
            .map(|m| (m.to_string(), Value::from(format!("{m} says hi"))))
            .collect();
        json!({
            "session_id": id,
            "user_profile": "A retired teacher who loves gardening.",
            "rounds": [
                {"round": 1, "user_message": "hello", "responses": responses},
                {"round": 2, "user_message": "again", "responses": responses}
            ]
        })
        .to_string()
    }

    #[test]
    fn detect_uses_first_record_key_order() {
        let text = format!(
            "{}\n{}\n",
            session("s1", &["PersonaSteer", "Base", "RAG"]),
            session("s2", &["Other"])
        );
        assert_eq!(detect_methods(&text), vec!["PersonaSteer", "Base", "RAG"]);
    }

    #[test]
    fn detect_is_lenient_on_garbage() {
        assert!(detect_methods("not-json\n{}").is_empty());
        assert!(detect_methods("").is_empty());
        assert!(detect_methods(r#"{"rounds": []}"#).is_empty());
        assert!(detect_methods(r#"{"rounds": [{"round": 1}]}"#).is_empty());
    }

    #[test]
    fn validate_accepts_consistent_log() {
        let text = format!("{}\n\n{}\n", session("s1", &["Base", "RAG"]), session("s2", &["RAG", "Base"]));
        let summary = validate_log(&text).unwrap();
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.rounds, 4);
        assert_eq!(summary.methods, vec!["Base", "RAG"]);
    }

    #[test]
    fn validate_reports_line_of_inconsistent_methods() {
        let text = format!("{}\n{}\n", session("s1", &["Base"]), session("s2", &["RAG"]));
        match validate_log(&text) {
            Err(DashboardError::InvalidLog { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("inconsistent methods"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_short_profile_and_bad_json() {
        let short = r#"{"session_id": "s", "user_profile": "short", "rounds": []}"#;
        assert!(matches!(
            validate_log(short),
            Err(DashboardError::InvalidLog { line: 1, .. })
        ));
        assert!(matches!(
            validate_log("{oops"),
            Err(DashboardError::InvalidLog { line: 1, .. })
        ));
        assert!(validate_log("").is_err());
    }

    #[test]
    fn validate_accepts_blank_lines_only() {
        let summary = validate_log("\n  \n\n").unwrap();
        assert_eq!(summary.sessions, 0);
        assert_eq!(summary.rounds, 0);
        assert!(summary.methods.is_empty());
    }

    #[test]
    fn template_passes_validation() {
        let summary = validate_log(&template_jsonl()).unwrap();
        assert_eq!(summary.methods, vec!["Base", "YourMethod"]);
        assert_eq!(detect_methods(&template_jsonl()), vec!["Base", "YourMethod"]);
    }
}
