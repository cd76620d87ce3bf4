//! Response recovery: turn free-form model output into structured fields.
//!
//! Cascade, first success wins:
//! 1. the whole body is a JSON object
//! 2. the first fenced code block (optionally tagged `json`) is a JSON object
//! 3. line scan for `name`/`名称` and `description`/`描述` labels
//! 4. [`RecoveryExhausted`]; the caller substitutes the persona fallback

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use nimbus_core::{CloudFeatures, GenerationOrigin, GenerationResult, RecoveryLevel, StylePersona};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?```").expect("fenced block pattern is valid")
});

/// A `"key": "value"` pair, as found in inline or truncated JSON.
static QUOTED_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"\\]+)"\s*[:：]\s*"((?:[^"\\]|\\.)*)""#).expect("quoted pair pattern is valid")
});

/// No recovery level produced usable fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No usable fields in model output ({len} bytes)")]
pub struct RecoveryExhausted {
    pub len: usize,
}

/// Fields recovered from a model answer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecoveredFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub features: Option<CloudFeatures>,
    pub level: Option<RecoveryLevel>,
}

impl RecoveredFields {
    fn has_text(&self) -> bool {
        self.name.is_some() || self.description.is_some()
    }
}

/// Run the recovery cascade over a raw answer.
pub fn parse_response(raw: &str) -> Result<RecoveredFields, RecoveryExhausted> {
    let exhausted = RecoveryExhausted { len: raw.len() };
    let body = raw.trim();
    if body.is_empty() {
        return Err(exhausted);
    }

    if let Some(fields) = json_object(body).map(|obj| fields_from_object(&obj, RecoveryLevel::WholeBody)) {
        if fields.has_text() {
            return Ok(fields);
        }
    }

    if let Some(block) = fenced_block(body) {
        if let Some(fields) = json_object(block).map(|obj| fields_from_object(&obj, RecoveryLevel::FencedBlock)) {
            if fields.has_text() {
                return Ok(fields);
            }
        }
    }

    let scanned = line_scan(body);
    if scanned.has_text() {
        return Ok(scanned);
    }

    Err(exhausted)
}

/// Build a [`GenerationResult`] from a raw answer.
///
/// `features` fills in whatever the model did not report. A missing name or
/// description is replaced by the persona fallback.
pub fn recover_generation(
    raw: &str,
    persona: StylePersona,
    features: &CloudFeatures,
) -> Result<GenerationResult, RecoveryExhausted> {
    let fields = parse_response(raw)?;
    let level = fields.level.unwrap_or(RecoveryLevel::LineScan);
    let detected = fields.features.unwrap_or_else(|| features.clone());
    Ok(GenerationResult::new(
        fields.name.unwrap_or_default(),
        fields.description.unwrap_or_default(),
        persona,
        detected,
        GenerationOrigin::Model(level),
    )
    .with_keywords(fields.keywords))
}

/// Recover a shape/color/texture triple from a recognition answer.
pub fn parse_features(raw: &str) -> Option<CloudFeatures> {
    let body = raw.trim();
    json_object(body)
        .or_else(|| fenced_block(body).and_then(json_object))
        .and_then(|obj| features_from_object(&obj, &CloudFeatures::unknown()))
}

fn json_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn keywords_field(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("keywords") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split(|c: char| c == ',' || c == '，' || c == '、')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn features_from_object(obj: &Map<String, Value>, fill: &CloudFeatures) -> Option<CloudFeatures> {
    let shape = string_field(obj, "shape");
    let color = string_field(obj, "color");
    let texture = string_field(obj, "texture");
    if shape.is_none() && color.is_none() && texture.is_none() {
        return None;
    }
    Some(CloudFeatures::new(
        shape.unwrap_or_else(|| fill.shape.clone()),
        color.unwrap_or_else(|| fill.color.clone()),
        texture.unwrap_or_else(|| fill.texture.clone()),
    ))
}

fn fields_from_object(obj: &Map<String, Value>, level: RecoveryLevel) -> RecoveredFields {
    let features = match obj.get("features") {
        Some(Value::Object(inner)) => features_from_object(inner, &CloudFeatures::unknown()),
        _ => None,
    };
    RecoveredFields {
        name: string_field(obj, "name"),
        description: string_field(obj, "description"),
        keywords: keywords_field(obj),
        features,
        level: Some(level),
    }
}

/// Split at the first ASCII or full-width colon.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(|c: char| c == ':' || c == '：')?;
    let sep_len = line[idx..].chars().next().map(char::len_utf8).unwrap_or(1);
    Some((&line[..idx], &line[idx + sep_len..]))
}

fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_end_matches(',')
        .trim_end_matches('，')
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
        .to_string()
}

/// Decode JSON string escapes, keeping the raw text if they are invalid.
fn unescape(value: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", value)).unwrap_or_else(|_| value.to_string())
}

/// Label/value pairs on one line: every quoted pair, else the text around
/// the first colon.
fn line_pairs(line: &str) -> Vec<(String, String)> {
    let quoted: Vec<(String, String)> = QUOTED_PAIR
        .captures_iter(line)
        .map(|caps| (caps[1].to_string(), unescape(caps[2].trim())))
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }
    split_label(line)
        .map(|(label, value)| vec![(label.to_string(), clean_value(value))])
        .unwrap_or_default()
}

fn line_scan(body: &str) -> RecoveredFields {
    let mut fields = RecoveredFields::default();
    for (label, value) in body.lines().flat_map(line_pairs) {
        let label = label.to_lowercase();
        if value.is_empty() {
            continue;
        }
        if label.contains("name") || label.contains("名称") {
            fields.name.get_or_insert(value);
        } else if label.contains("description") || label.contains("描述") {
            fields.description.get_or_insert(value);
        }
    }
    if fields.has_text() {
        fields.level = Some(RecoveryLevel::LineScan);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level1_whole_body_json() {
        let raw = r#"{"name":"泡面云","description":"等水开的五分钟","style":"hand"}"#;
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::WholeBody));
        assert_eq!(fields.name.as_deref(), Some("泡面云"));
        assert_eq!(fields.description.as_deref(), Some("等水开的五分钟"));
    }

    #[test]
    fn test_level1_description_and_keywords() {
        let raw = r#"{"description":"软得不合理","keywords":["软","猫"," "]}"#;
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::WholeBody));
        assert!(fields.name.is_none());
        assert_eq!(fields.keywords, vec!["软".to_string(), "猫".to_string()]);
    }

    #[test]
    fn test_level2_fenced_json_block() {
        let raw = "Here you go:\n```json\n{\"name\": \"棉花糖\", \"description\": \"飞走了\"}\n```\nEnjoy!";
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::FencedBlock));
        assert_eq!(fields.name.as_deref(), Some("棉花糖"));
    }

    #[test]
    fn test_level2_untagged_fence() {
        let raw = "```\n{\"name\": \"A\", \"description\": \"B\"}\n```";
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::FencedBlock));
        assert_eq!(fields.description.as_deref(), Some("B"));
    }

    #[test]
    fn test_level3_line_scan() {
        let raw = "名称：漏水的胖河马云\n描述: 它在哭鼻子，\"还放了屁\"";
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::LineScan));
        assert_eq!(fields.name.as_deref(), Some("漏水的胖河马云"));
        assert_eq!(fields.description.as_deref(), Some("它在哭鼻子，\"还放了屁"));
    }

    #[test]
    fn test_level3_takes_text_after_first_colon() {
        let raw = "name: 时间: 下午三点的云\ndescription: ok";
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.name.as_deref(), Some("时间: 下午三点的云"));
    }

    #[test]
    fn test_level3_broken_json_lines() {
        let raw = "{\n  \"name\": \"卡住的云\",\n  \"description\": \"它在等红灯\",\n";
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::LineScan));
        assert_eq!(fields.name.as_deref(), Some("卡住的云"));
        assert_eq!(fields.description.as_deref(), Some("它在等红灯"));
    }

    #[test]
    fn test_level3_inline_json_after_prose() {
        let raw = r#"Sure! {"name":"A","description":"B"}"#;
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.level, Some(RecoveryLevel::LineScan));
        assert_eq!(fields.name.as_deref(), Some("A"));
        assert_eq!(fields.description.as_deref(), Some("B"));
    }

    #[test]
    fn test_level3_inline_pair_keeps_escaped_quotes() {
        let raw = r#"好的 {"name": "说\"你好\"的云", "description": "它会说话"} 希望喜欢"#;
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.name.as_deref(), Some("说\"你好\"的云"));
        assert_eq!(fields.description.as_deref(), Some("它会说话"));
    }

    #[test]
    fn test_level4_exhausted() {
        assert!(parse_response("I cannot help with that.").is_err());
        assert!(parse_response("").is_err());
        assert!(parse_response("{\"style\":\"hand\"}").is_err());
    }

    #[test]
    fn test_recover_generation_uses_model_features() {
        let raw = r#"{"name":"喵住云","description":"归我","features":{"shape":"层云","color":"灰色"}}"#;
        let result =
            recover_generation(raw, StylePersona::PossessiveCat, &CloudFeatures::unknown()).unwrap();
        assert_eq!(result.name(), "喵住云");
        assert_eq!(result.detected_features().shape, "层云");
        assert_eq!(result.detected_features().texture, "未知");
        assert_eq!(
            result.origin(),
            GenerationOrigin::Model(RecoveryLevel::WholeBody)
        );
    }

    #[test]
    fn test_recover_generation_fills_missing_name() {
        let raw = r#"{"description":"只有描述"}"#;
        let features = CloudFeatures::typical();
        let result = recover_generation(raw, StylePersona::PlayfulChild, &features).unwrap();
        assert_eq!(result.description(), "只有描述");
        assert_eq!(result.name(), StylePersona::PlayfulChild.fallback_name(&features));
    }

    #[test]
    fn test_parse_features() {
        let raw = r#"{"shape":"卷云","color":"白色","texture":"轻柔","confidence":0.9}"#;
        assert_eq!(parse_features(raw), Some(CloudFeatures::new("卷云", "白色", "轻柔")));

        let fenced = "```json\n{\"shape\":\"层云\"}\n```";
        assert_eq!(
            parse_features(fenced),
            Some(CloudFeatures::new("层云", "未知", "未知"))
        );
        assert_eq!(parse_features("no json here"), None);
    }

    #[test]
    fn test_keywords_from_string() {
        let raw = r#"{"description":"x","keywords":"软，白、蓬松,云"}"#;
        let fields = parse_response(raw).unwrap();
        assert_eq!(fields.keywords, vec!["软", "白", "蓬松", "云"]);
    }
}
