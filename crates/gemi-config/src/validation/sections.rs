//! Per-section validators.

use crate::schema::GemiConfig;

use super::helpers::{validate_range, validate_range_f64, validate_range_u64, validate_url};

pub(crate) fn validate_bot(errors: &mut Vec<String>, config: &GemiConfig) {
    validate_url(errors, "bot.api_url", &config.bot.api_url);
    validate_range(
        errors,
        "bot.poll_timeout_secs",
        config.bot.poll_timeout_secs,
        0,
        50,
    );
    validate_range(
        errors,
        "bot.edit_interval_ms",
        config.bot.edit_interval_ms,
        100,
        10_000,
    );
    validate_range(
        errors,
        "bot.max_concurrent_updates",
        config.bot.max_concurrent_updates,
        1,
        1000,
    );
    validate_range(
        errors,
        "bot.max_message_chars",
        config.bot.max_message_chars,
        100,
        4096,
    );
}

pub(crate) fn validate_model(errors: &mut Vec<String>, config: &GemiConfig) {
    validate_url(errors, "model.api_base", &config.model.api_base);
    if config.model.model.trim().is_empty() {
        errors.push("model.model must not be empty".into());
    }
    validate_range_f64(
        errors,
        "model.temperature",
        config.model.temperature,
        0.0,
        2.0,
    );
    validate_range(
        errors,
        "model.max_output_tokens",
        config.model.max_output_tokens,
        1,
        65_536,
    );
}

pub(crate) fn validate_search(errors: &mut Vec<String>, config: &GemiConfig) {
    validate_url(errors, "search.base_url", &config.search.base_url);
    validate_range(
        errors,
        "search.default_max_results",
        config.search.default_max_results,
        1,
        10,
    );
}

pub(crate) fn validate_image(errors: &mut Vec<String>, config: &GemiConfig) {
    validate_range(errors, "image.count", config.image.count, 1, 4);
    for (i, provider) in config.image.providers.iter().enumerate() {
        validate_url(
            errors,
            &format!("image.providers[{i}].base_url"),
            &provider.base_url,
        );
    }
}

pub(crate) fn validate_voice(errors: &mut Vec<String>, config: &GemiConfig) {
    if config.voice.engine_and_voice().is_none() {
        errors.push(format!(
            "voice.tts_voice = {:?} must look like \"engine:voice\"",
            config.voice.tts_voice
        ));
    }
    if let Some(url) = config.voice.api_url.as_deref().filter(|u| !u.is_empty()) {
        validate_url(errors, "voice.api_url", url);
    }
    validate_range(
        errors,
        "voice.probe_interval_secs",
        config.voice.probe_interval_secs,
        1,
        600,
    );
}

pub(crate) fn validate_prompt(errors: &mut Vec<String>, config: &GemiConfig) {
    validate_range_u64(
        errors,
        "prompt.max_file_bytes",
        config.prompt.max_file_bytes,
        1,
        2_000_000_000,
    );
    if config.prompt.photo_byte_ceiling > config.prompt.max_file_bytes {
        errors.push(format!(
            "prompt.photo_byte_ceiling = {} exceeds prompt.max_file_bytes = {}",
            config.prompt.photo_byte_ceiling, config.prompt.max_file_bytes
        ));
    }
}

pub(crate) fn validate_session(errors: &mut Vec<String>, config: &GemiConfig) {
    validate_range(
        errors,
        "session.max_tool_rounds",
        config.session.max_tool_rounds,
        1,
        16,
    );
}

pub(crate) fn validate_logging(errors: &mut Vec<String>, config: &GemiConfig) {
    if config.logging.filter.trim().is_empty() {
        errors.push("logging.filter must not be empty".into());
    }
}
