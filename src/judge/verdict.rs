use rust_decimal::Decimal;
use serde_json::Value;

use super::JudgeError;
use crate::models::Side;

/// Default confidence when the judge omits or garbles it.
const DEFAULT_CONFIDENCE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// A binary verdict extracted from the judge's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub result: Side,
    pub confidence: Decimal,
    pub reason: String,
}

/// Parse the judge's raw reply.
///
/// 1. A fenced code block (```json or plain ```) holding a JSON object.
/// 2. Otherwise the first `{ ... }` object anywhere in the text that has a
///    `result` key, or failing that the first object at all.
/// 3. Only if no JSON object exists: bare "yes"/"no" detection.
///
/// When a JSON object is found its `result` must be exactly "yes" or "no";
/// anything else is rejected without falling back to text detection.
pub fn parse_verdict(raw: &str) -> Result<Verdict, JudgeError> {
    let json = fenced_block(raw)
        .and_then(|block| serde_json::from_str::<Value>(block.trim()).ok())
        .filter(Value::is_object)
        .or_else(|| first_object(raw));

    match json {
        Some(obj) => verdict_from_json(&obj, raw),
        None => bare_text_verdict(raw).ok_or_else(|| parse_error("no JSON verdict or bare yes/no", raw)),
    }
}

fn verdict_from_json(obj: &Value, raw: &str) -> Result<Verdict, JudgeError> {
    let result = obj
        .get("result")
        .and_then(Value::as_str)
        .map(str::trim)
        .and_then(Side::from_db_str)
        .ok_or_else(|| {
            let got = obj.get("result").map(Value::to_string).unwrap_or_else(|| "nothing".into());
            parse_error(&format!("result must be \"yes\" or \"no\", got {got}"), raw)
        })?;

    let confidence = obj
        .get("confidence")
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        })
        .filter(|f| f.is_finite())
        .and_then(|f| Decimal::try_from(f.clamp(0.0, 1.0)).ok())
        .map(|d| d.round_dp(4))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Ok(Verdict {
        result,
        confidence,
        reason,
    })
}

/// Contents of the first fenced code block, without the language tag.
fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after = &raw[start + 3..];
    // Skip the info string (e.g. "json") up to the end of the line.
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// First balanced `{ ... }` substring that parses as a JSON object carrying
/// `result`; the first object of any shape if none does.
fn first_object(raw: &str) -> Option<Value> {
    let mut fallback = None;
    let mut search_from = 0;
    while let Some(rel) = raw[search_from..].find('{') {
        let start = search_from + rel;
        if let Some(end) = matching_brace(&raw[start..]) {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..start + end + 1]) {
                if value.get("result").is_some() {
                    return Some(value);
                }
                if value.is_object() && fallback.is_none() {
                    fallback = Some(value);
                }
            }
        }
        search_from = start + 1;
    }
    fallback
}

/// Byte offset of the brace closing the one at offset 0, honouring strings.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// "yes" xor "no" as a standalone word.
fn bare_text_verdict(raw: &str) -> Option<Verdict> {
    let lower = raw.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let has_yes = words.contains(&"yes");
    let has_no = words.contains(&"no");

    let result = match (has_yes, has_no) {
        (true, false) => Side::Yes,
        (false, true) => Side::No,
        _ => return None,
    };

    Some(Verdict {
        result,
        confidence: DEFAULT_CONFIDENCE,
        reason: raw.trim().chars().take(500).collect(),
    })
}

fn parse_error(message: &str, raw: &str) -> JudgeError {
    JudgeError::Parse {
        message: message.to_string(),
        raw: raw.to_string(),
    }
}
