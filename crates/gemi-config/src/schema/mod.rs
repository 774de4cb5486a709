//! Configuration schema types for Gemi.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the bot ships with.

mod bot;
mod model;
mod prompt;
mod session;
mod system;
mod tools;

pub use bot::*;
pub use model::*;
pub use prompt::*;
pub use session::*;
pub use system::*;
pub use tools::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Gemi.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GemiConfig {
    pub bot: BotConfig,
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub image: ImageConfig,
    pub voice: VoiceConfig,
    pub prompt: PromptConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}
