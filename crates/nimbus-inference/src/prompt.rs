//! Prompt construction for naming, description and feature recognition.
//!
//! Every prompt embeds the persona's style, a slice of its few-shot corpus,
//! the capture context and an explicit JSON output contract so that the
//! recovery cascade has something well-formed to look for.

use std::fmt::Write;

use nimbus_core::defaults::{FEW_SHOT_EXAMPLES, NATURAL_WEATHER, UNKNOWN_PLACE, UNKNOWN_TIME};
use nimbus_core::{CloudFeatures, StylePersona};

/// Context describing when and where the photo was taken.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptContext {
    pub time: Option<String>,
    pub weather: Option<String>,
    pub place: Option<String>,
}

impl PromptContext {
    fn time_text(&self) -> &str {
        non_blank(self.time.as_deref()).unwrap_or(UNKNOWN_TIME)
    }

    fn weather_text(&self) -> &str {
        self.weather_known().unwrap_or(NATURAL_WEATHER)
    }

    fn weather_known(&self) -> Option<&str> {
        non_blank(self.weather.as_deref())
    }

    /// Place text with the persona's whimsical substitute for "当前位置".
    fn place_text(&self, persona: StylePersona) -> &str {
        match non_blank(self.place.as_deref()) {
            Some(place) => persona.personalize_location(place),
            None => UNKNOWN_PLACE,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn examples_block(persona: StylePersona) -> String {
    persona
        .examples()
        .iter()
        .take(FEW_SHOT_EXAMPLES)
        .map(|example| format!("- {}", example))
        .collect::<Vec<_>>()
        .join("\n")
}

fn persona_header(out: &mut String, persona: StylePersona) {
    let style = persona.style();
    let _ = writeln!(out, "**工具类型**: {} ({})", style.id, style.label);
    let _ = writeln!(out, "**风格要求**: {}", style.naming_instruction);
    out.push('\n');
    let _ = writeln!(out, "**参考示例**（重要：格式为\"名字｜描述\"）:");
    out.push_str(&examples_block(persona));
    out.push_str("\n\n");
    out.push_str(
        "**关键格式说明**:\n\
         - 上面每个示例都是\"名字｜描述\"的格式\n\
         - ｜是分隔符，左边是云朵名字，右边是对应的描述\n\
         - 你需要创造一个新的\"名字｜描述\"组合，风格要与示例保持一致\n\n",
    );
}

fn context_block(out: &mut String, persona: StylePersona, context: &PromptContext) {
    let _ = writeln!(out, "**拍摄环境**:");
    let _ = writeln!(out, "- 时间: {}", context.time_text());
    let _ = writeln!(out, "- 天气: {}", context.weather_text());
    let _ = writeln!(out, "- 地点: {}", context.place_text(persona));
    if context.weather_known().is_none() {
        let _ = writeln!(
            out,
            "\n提示：由于天气信息不可用，请自由发挥创意，重点体现{}的风格特色。",
            persona.style().label
        );
    }
    out.push('\n');
}

/// Naming prompt built from already-recognized features (text only).
pub fn naming_prompt_from_features(
    persona: StylePersona,
    features: &CloudFeatures,
    context: &PromptContext,
) -> String {
    let style = persona.style();
    let mut out = String::from("你是云朵命名大师，需要为一朵云起名字并写描述。\n\n");
    persona_header(&mut out, persona);

    let _ = writeln!(out, "**云朵特征参考**:");
    let _ = writeln!(out, "- 形状: {}", features.shape);
    let _ = writeln!(out, "- 颜色: {}", features.color);
    let _ = writeln!(out, "- 质感: {}\n", features.texture);

    context_block(&mut out, persona, context);

    let _ = write!(
        out,
        "请以{label}为这朵云生成：\n\
         1. 一个富有创意的**名字**（参考示例中｜左边的风格）\n\
         2. 一句生动的**描述**（参考示例中｜右边的风格，不超过30字）\n\n\
         **输出格式**：\n\
         {{\n    \"name\": \"云朵名称\",\n    \"description\": \"生动的描述文字\",\n    \"style\": \"{id}\"\n}}\n\n\
         请务必按照JSON格式返回，不要包含其他文字。",
        label = style.label,
        id = style.id,
    );
    out
}

/// Naming prompt for a vision request; the model also reports features.
pub fn naming_prompt_from_image(persona: StylePersona, context: &PromptContext) -> String {
    let style = persona.style();
    let mut out = format!(
        "你是云朵命名大师，现在要为一朵云起名字。请仔细观察这张云朵图片，然后以{}为这朵云生成一个富有创意的名字和简短描述。\n\n",
        style.label
    );
    persona_header(&mut out, persona);
    context_block(&mut out, persona, context);

    let _ = write!(
        out,
        "**创作要求**：\n\
         - 仔细观察图片中云朵的具体形状、颜色、质感和背景\n\
         - 结合拍摄环境创造有趣的故事和角色\n\
         - 名字必须严格符合{label}的风格特色，描述要呼应名字\n\n\
         **输出格式**：\n\
         {{\n    \"name\": \"云朵名称\",\n    \"description\": \"生动的描述文字\",\n    \"style\": \"{id}\",\n    \"features\": {{\n        \"shape\": \"识别到的云朵形状\",\n        \"color\": \"识别到的云朵颜色\",\n        \"texture\": \"识别到的云朵质感\"\n    }}\n}}\n\n\
         请务必按照JSON格式返回，不要包含其他文字。",
        label = style.label,
        id = style.id,
    );
    out
}

/// Description prompt, optionally anchored on an existing name.
pub fn description_prompt(
    persona: StylePersona,
    name: Option<&str>,
    features: Option<&CloudFeatures>,
    context: &PromptContext,
) -> String {
    let style = persona.style();
    let mut out = match non_blank(name) {
        Some(name) => format!(
            "请观察这朵云，这朵云名为\"{}\"。\n\n请以{}的风格，为这个名称和云朵写一句针对性的描述。\n\n",
            name, style.label
        ),
        None => format!("请观察这朵云，以{}的风格写一句描述。\n\n", style.label),
    };
    let _ = writeln!(out, "{}\n", style.description_instruction);

    if let Some(f) = features {
        let _ = writeln!(
            out,
            "**特征参考**: {}形状，{}颜色，{}质感\n",
            f.shape, f.color, f.texture
        );
    }
    context_block(&mut out, persona, context);

    let _ = write!(
        out,
        "要求：\n\
         - 生动有趣，充满创意\n\
         - 符合{label}风格\n\
         - JSON格式返回\n\n\
         返回格式：\n\
         {{\n    \"description\": \"创意描述\",\n    \"keywords\": [\"关键词1\", \"关键词2\", \"关键词3\"]\n}}",
        label = style.label,
    );
    out
}

/// Recognition prompt asking for shape, color and texture.
pub fn feature_analysis_prompt() -> String {
    "请分析这张云朵图片，并以JSON格式返回以下信息：\n\
     1. 云朵的形状特征（如：积云、层云、卷云、高积云等）\n\
     2. 云朵的颜色特征（如：白色、灰色、粉色、金色等）\n\
     3. 云朵的纹理特征（如：蓬松、厚重、轻柔、斑驳等）\n\
     4. 分析的置信度（0-1之间的小数）\n\n\
     请确保返回的是合法的JSON格式，包含以下字段：\n\
     {\n    \"shape\": \"云朵形状描述\",\n    \"color\": \"云朵颜色描述\",\n    \"texture\": \"云朵纹理描述\",\n    \"confidence\": 0.95\n}\n\n\
     注意：请用中文描述，形状请使用专业的云类型名称。"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PromptContext {
        PromptContext {
            time: Some("2025-05-01T08:00:00Z".to_string()),
            weather: Some("晴".to_string()),
            place: Some("天安门广场".to_string()),
        }
    }

    #[test]
    fn test_naming_from_image_embeds_style_and_examples() {
        let persona = StylePersona::PossessiveCat;
        let prompt = naming_prompt_from_image(persona, &context());
        assert!(prompt.contains(persona.style().label));
        assert!(prompt.contains(persona.style().naming_instruction));
        for example in persona.examples().iter().take(FEW_SHOT_EXAMPLES) {
            assert!(prompt.contains(example));
        }
        assert!(!prompt.contains(persona.examples()[FEW_SHOT_EXAMPLES]));
        assert!(prompt.contains("\"features\""));
        assert!(prompt.contains("天安门广场"));
    }

    #[test]
    fn test_missing_weather_adds_creative_note() {
        let ctx = PromptContext {
            weather: None,
            ..context()
        };
        let prompt = naming_prompt_from_image(StylePersona::PlayfulChild, &ctx);
        assert!(prompt.contains("- 天气: 自然天气"));
        assert!(prompt.contains("自由发挥创意"));

        let with_weather = naming_prompt_from_image(StylePersona::PlayfulChild, &context());
        assert!(with_weather.contains("- 天气: 晴"));
        assert!(!with_weather.contains("由于天气信息不可用"));
    }

    #[test]
    fn test_unknown_context_placeholders() {
        let prompt = naming_prompt_from_image(StylePersona::PlainspokenLife, &PromptContext::default());
        assert!(prompt.contains("- 时间: 未知时间"));
        assert!(prompt.contains("- 地点: 未知地点"));
    }

    #[test]
    fn test_current_location_is_personalized() {
        let ctx = PromptContext {
            place: Some("当前位置".to_string()),
            ..context()
        };
        let prompt = naming_prompt_from_image(StylePersona::LiteraryCurator, &ctx);
        assert!(prompt.contains("- 地点: 意念定位中…"));
    }

    #[test]
    fn test_naming_from_features_lists_features() {
        let features = CloudFeatures::new("卷云", "金色", "丝滑");
        let prompt = naming_prompt_from_features(StylePersona::PlayfulChild, &features, &context());
        assert!(prompt.contains("- 形状: 卷云"));
        assert!(prompt.contains("- 颜色: 金色"));
        assert!(prompt.contains("- 质感: 丝滑"));
        assert!(prompt.contains("\"style\": \"broom\""));
    }

    #[test]
    fn test_description_prompt_anchors_name() {
        let prompt = description_prompt(
            StylePersona::PlainspokenLife,
            Some("泡面云"),
            None,
            &context(),
        );
        assert!(prompt.contains("这朵云名为\"泡面云\""));
        assert!(prompt.contains("\"keywords\""));
        assert!(prompt.contains(StylePersona::PlainspokenLife.style().description_instruction));

        let unnamed = description_prompt(StylePersona::PlainspokenLife, Some("  "), None, &context());
        assert!(!unnamed.contains("这朵云名为"));
    }

    #[test]
    fn test_feature_analysis_prompt_contract() {
        let prompt = feature_analysis_prompt();
        for key in ["\"shape\"", "\"color\"", "\"texture\"", "\"confidence\""] {
            assert!(prompt.contains(key));
        }
    }
}
