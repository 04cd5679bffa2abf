pub mod alloc;
pub mod api;
pub mod asm;
pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod ir;
pub mod lower;
pub mod program;
pub mod span;

// Re-export public API: `stackasm::compile()` etc.
pub use api::*;
pub use config::BuildConfig;
pub use ir::parse::parse;
