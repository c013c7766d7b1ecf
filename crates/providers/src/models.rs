//! Wire model names for the OpenAI-compatible mode items.

use chatbox_config::UserConfig;

use crate::{legacy, session::Session};

const LEGACY_CUSTOM_MODEL: &str = "customModel";

/// Mode item → model value sent in the request body.
const MODEL_VALUES: &[(&str, &str)] = &[
    // OpenAI
    ("chatgptApi35", "gpt-3.5-turbo"),
    ("chatgptApi35_16k", "gpt-3.5-turbo-16k"),
    ("chatgptApi35_1106", "gpt-3.5-turbo-1106"),
    ("chatgptApi35_0125", "gpt-3.5-turbo-0125"),
    ("chatgptApi4o_128k", "gpt-4o"),
    ("chatgptApi4oMini", "gpt-4o-mini"),
    ("chatgptApi4_8k", "gpt-4"),
    ("chatgptApi4_8k_0613", "gpt-4"),
    ("chatgptApi4_128k", "gpt-4-turbo"),
    ("chatgptApi4_128k_preview", "gpt-4-turbo-preview"),
    ("chatgptApi4_128k_1106_preview", "gpt-4-1106-preview"),
    ("chatgptApi4_128k_0125_preview", "gpt-4-0125-preview"),
    ("chatgptApi5Latest", "gpt-5-chat-latest"),
    ("chatgptApi5_1Latest", "gpt-5.1-chat-latest"),
    ("chatgptApi4_1", "gpt-4.1"),
    ("chatgptApi4_1_mini", "gpt-4.1-mini"),
    ("chatgptApi4_1_nano", "gpt-4.1-nano"),
    ("gptApiInstruct", "gpt-3.5-turbo-instruct"),
    // ChatGLM
    ("chatglmTurbo", "GLM-4-Air"),
    ("chatglm4", "GLM-4-0520"),
    ("chatglmEmohaa", "Emohaa"),
    ("chatglmCharGLM3", "CharGLM-3"),
    // Moonshot
    ("moonshot_k2", "kimi-k2-0711-preview"),
    ("moonshot_kimi_latest", "kimi-latest"),
    ("moonshot_v1_8k", "moonshot-v1-8k"),
    ("moonshot_v1_32k", "moonshot-v1-32k"),
    ("moonshot_v1_128k", "moonshot-v1-128k"),
    // DeepSeek
    ("deepseek_chat", "deepseek-chat"),
    ("deepseek_reasoner", "deepseek-reasoner"),
    // OpenRouter
    ("openRouter_anthropic_claude_sonnet4", "anthropic/claude-sonnet-4"),
    ("openRouter_anthropic_claude_sonnet4_5", "anthropic/claude-sonnet-4.5"),
    ("openRouter_anthropic_claude_haiku4_5", "anthropic/claude-haiku-4.5"),
    ("openRouter_anthropic_claude_opus4_5", "anthropic/claude-opus-4.5"),
    ("openRouter_anthropic_claude_opus4_6", "anthropic/claude-opus-4.6"),
    ("openRouter_anthropic_claude_3_7_sonnet", "anthropic/claude-3.7-sonnet"),
    ("openRouter_google_gemini_3_pro", "google/gemini-3-pro-preview"),
    ("openRouter_google_gemini_3_flash", "google/gemini-3-flash-preview"),
    ("openRouter_google_gemini_3_1_pro", "google/gemini-3.1-pro-preview"),
    ("openRouter_google_gemini_2_5_pro", "google/gemini-2.5-pro"),
    ("openRouter_google_gemini_2_5_flash", "google/gemini-2.5-flash"),
    ("openRouter_openai_o3", "openai/o3"),
    ("openRouter_openai_gpt_4_1_mini", "openai/gpt-4.1-mini"),
    // AI/ML
    ("aiml_claude_3_7_sonnet_20250219", "claude-3-7-sonnet-20250219"),
    ("aiml_openai_o3_2025_04_16", "openai/o3-2025-04-16"),
    ("aiml_openai_gpt_4_1_2025_04_14", "openai/gpt-4.1-2025-04-14"),
    ("aiml_moonshot_kimi_k2_preview", "moonshot/kimi-k2-preview"),
];

/// Catalog value for a mode item, if the item is known.
#[must_use]
pub fn model_value(item_name: &str) -> Option<&'static str> {
    MODEL_VALUES
        .iter()
        .find(|(item, _)| *item == item_name)
        .map(|(_, value)| *value)
}

/// Model identifier to send for `session`.
#[must_use]
pub fn resolve_model_name(config: &UserConfig, session: &Session) -> String {
    let Some(mode) = &session.api_mode else {
        let model_name = session.model_name.trim();
        if model_name == LEGACY_CUSTOM_MODEL {
            return config
                .custom_model_name
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string();
        }
        return model_value(model_name)
            .unwrap_or_else(|| legacy::model_part(model_name))
            .to_string();
    };

    let custom_name = mode.custom_name.trim();
    if (mode.group_name.is_custom() || mode.is_custom) && !custom_name.is_empty() {
        return custom_name.to_string();
    }
    if mode.is_custom {
        return String::new();
    }
    model_value(&mode.item_name)
        .unwrap_or(mode.item_name.as_str())
        .to_string()
}
