//! Provider and endpoint inference for sessions saved before api modes
//! existed, which only carry a `modelName` such as `chatgptApi4oMini` or
//! `ollamaModel-llama3`.

use chatbox_config::BuiltinProvider;

const CUSTOM_MODEL_NAME: &str = "customModel";

#[derive(Debug, Clone, Copy)]
enum Preset {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Preset {
    fn matches(self, preset: &str) -> bool {
        match self {
            Self::Exact(name) => preset == name,
            Self::Prefix(prefix) => preset.starts_with(prefix),
        }
    }
}

/// Legacy presets in match order.
const LEGACY_PRESETS: &[(Preset, BuiltinProvider)] = &[
    (Preset::Exact("gptApiInstruct"), BuiltinProvider::OpenAi),
    (Preset::Exact("gptApiModelKeys"), BuiltinProvider::OpenAi),
    (Preset::Prefix("chatgptApi"), BuiltinProvider::OpenAi),
    (Preset::Prefix("deepseek_"), BuiltinProvider::DeepSeek),
    (Preset::Exact("deepSeekApiModelKeys"), BuiltinProvider::DeepSeek),
    (Preset::Prefix("moonshot_"), BuiltinProvider::Moonshot),
    (Preset::Exact("moonshotApiModelKeys"), BuiltinProvider::Moonshot),
    (Preset::Prefix("openRouter_"), BuiltinProvider::OpenRouter),
    (Preset::Exact("openRouterApiModelKeys"), BuiltinProvider::OpenRouter),
    (Preset::Prefix("aiml_"), BuiltinProvider::Aiml),
    (Preset::Exact("aimlModelKeys"), BuiltinProvider::Aiml),
    (Preset::Exact("aimlApiModelKeys"), BuiltinProvider::Aiml),
    (Preset::Exact("ollama"), BuiltinProvider::Ollama),
    (Preset::Exact("ollamaModel"), BuiltinProvider::Ollama),
    (Preset::Exact("ollamaApiModelKeys"), BuiltinProvider::Ollama),
    (Preset::Prefix("chatglm"), BuiltinProvider::ChatGlm),
    (Preset::Exact("customApiModelKeys"), BuiltinProvider::LegacyCustom),
];

const COMPLETION_PRESETS: &[&str] = &["gptApiInstruct", "gptApiModelKeys"];

/// Preset part of a legacy model name: everything before the first `-`.
fn preset(model_name: &str) -> &str {
    let model_name = model_name.trim();
    model_name
        .split_once('-')
        .map_or(model_name, |(preset, _)| preset)
}

/// Provider implied by a legacy `modelName`.
#[must_use]
pub fn provider_for_model_name(model_name: &str) -> Option<BuiltinProvider> {
    if model_name.trim() == CUSTOM_MODEL_NAME {
        return Some(BuiltinProvider::LegacyCustom);
    }
    let preset = preset(model_name);
    if preset.is_empty() {
        return None;
    }
    LEGACY_PRESETS
        .iter()
        .find(|(pattern, _)| pattern.matches(preset))
        .map(|(_, provider)| *provider)
}

/// Whether a legacy `modelName` targets the text-completion endpoint.
#[must_use]
pub fn is_completion_model_name(model_name: &str) -> bool {
    COMPLETION_PRESETS.contains(&preset(model_name))
}

/// Model part of a legacy name: everything after the first `-`, or the whole
/// name when there is none.
#[must_use]
pub fn model_part(model_name: &str) -> &str {
    model_name
        .split_once('-')
        .map_or(model_name, |(_, model)| model)
}
