mod settings;

pub use settings::{CompilerSettings, LimitPolicy};
