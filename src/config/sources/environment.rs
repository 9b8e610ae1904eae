//! Environment source: POSTSMITH__SECTION__KEY, e.g. POSTSMITH__LINKEDIN__ACCESS_TOKEN

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("POSTSMITH")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
