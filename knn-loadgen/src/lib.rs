pub mod batch;
pub mod config;
pub mod sampler;
pub mod script;
pub mod templates;
pub mod test_util;

pub use config::{ConfigError, DataType, ResolvedConfig, ScriptConfig, SpaceType};
pub use sampler::{Value, ValueGenerator, ValueSampler};
pub use script::{EmitSummary, ScriptEmitter};
pub use templates::{ScriptTemplates, TemplateError};
