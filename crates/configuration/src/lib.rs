pub mod configuration;
pub mod error;
pub mod values;
pub mod version1;

pub use configuration::{generate_latest_schema, make_runtime_configuration, Configuration};
pub use values::{CompilerSettings, LimitPolicy};
pub use version1::{parse_configuration, write_parsed_configuration, ParsedConfiguration};
