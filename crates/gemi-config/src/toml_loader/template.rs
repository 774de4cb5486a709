//! Commented default config file written on first start.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Gemi Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Secrets are best supplied through the environment:
#   BOT_TOKEN, GOOGLE_API_KEY, TAVILY_API_KEY, IMAGE_API_KEY, VOICE_API_URL

[bot]
# api_url = "https://api.telegram.org"
# poll_timeout_secs = 30       # 0-50
# edit_interval_ms = 700       # 100-10000
# max_concurrent_updates = 20  # 1-1000
# max_message_chars = 4000     # 100-4096

[model]
# model = "gemini-2.0-flash"
# temperature = 0.6            # 0.0-2.0
# max_output_tokens = 4096
# system_prompt = "..."        # replaces the built-in instruction

[search]
# base_url = "https://api.tavily.com"
# default_max_results = 1      # 1-10

[image]
# count = 1                    # 1-4
# [[image.providers]]
# name = "openai"
# base_url = "https://api.openai.com/v1"
# model = "dall-e-3"

[voice]
# api_url = "http://localhost:8000"
# tts_voice = "piper:en_US-lessac-medium"
# probe_interval_secs = 10

[prompt]
# photo_byte_ceiling = 150000
# max_file_bytes = 20000000
# reply_order = "message_first"   # or "context_first"

[session]
# max_tool_rounds = 5          # 1-16
# idle_ttl_secs = 0            # 0 = never evict

[logging]
# filter = "gemi=info"
# ansi = true
"##
    .to_string()
}
