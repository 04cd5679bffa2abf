use std::path::PathBuf;

use clap::Args;

use super::{compile_or_exit, load_config, resolve_options};

#[derive(Args)]
pub struct CheckArgs {
    /// Input IR file
    pub input: PathBuf,
    /// Usable registers, 1-4 (default: stackasm.toml or 4)
    #[arg(long, value_name = "N")]
    pub registers: Option<u8>,
}

pub fn cmd_check(args: CheckArgs) {
    let config = load_config(&args.input);
    let options = resolve_options(args.registers, true, config.as_ref());
    let compiled = compile_or_exit(&args.input, &options);
    let program = &compiled.program;

    eprintln!("OK: {}", args.input.display());
    eprintln!(
        "  frame: {} slot(s), {} bytes",
        program.frame_size,
        program.frame_bytes()
    );
    eprintln!("  globals: {}", program.globals.len());
    eprintln!("  instructions: {}", compiled.instruction_count());
}
