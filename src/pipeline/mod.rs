pub mod artifacts;
pub mod builder;
pub mod defaults;
pub mod entry;
pub mod resources;
pub mod runtime;
pub mod traits;
