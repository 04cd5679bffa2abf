pub mod build;
pub mod check;
pub mod emit;

use std::path::Path;
use std::process;

use stackasm::config::{self, BuildConfig};
use stackasm::CompileOptions;

/// Load the `stackasm.toml` governing `input`, exiting on a malformed file.
pub fn load_config(input: &Path) -> Option<BuildConfig> {
    match BuildConfig::discover(input) {
        Ok(config) => config,
        Err(e) => {
            e.render_plain();
            process::exit(1);
        }
    }
}

/// Combine flags and config into compile options.
pub fn resolve_options(
    registers: Option<u8>,
    no_comments: bool,
    config: Option<&BuildConfig>,
) -> CompileOptions {
    let registers = match config::resolve_registers(registers, config) {
        Ok(n) => n,
        Err(e) => {
            e.render_plain();
            process::exit(1);
        }
    };
    CompileOptions {
        registers,
        comments: !no_comments,
    }
}

/// Compile `input` or exit. Diagnostics are already rendered on failure.
pub fn compile_or_exit(input: &Path, options: &CompileOptions) -> stackasm::Compiled {
    match stackasm::compile_file(input, options) {
        Ok(compiled) => compiled,
        Err(_) => process::exit(1),
    }
}
