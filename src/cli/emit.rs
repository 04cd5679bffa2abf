use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{compile_or_exit, load_config, resolve_options};

#[derive(Args)]
pub struct EmitArgs {
    /// Input IR file
    pub input: PathBuf,
    /// Output assembly file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Usable registers, 1-4 (default: stackasm.toml or 4)
    #[arg(long, value_name = "N")]
    pub registers: Option<u8>,
    /// Omit the per-instruction IR comments
    #[arg(long)]
    pub no_comments: bool,
}

pub fn cmd_emit(args: EmitArgs) {
    let EmitArgs {
        input,
        output,
        registers,
        no_comments,
    } = args;
    let config = load_config(&input);
    let options = resolve_options(registers, no_comments, config.as_ref());
    let compiled = compile_or_exit(&input, &options);

    match output {
        Some(path) => {
            if let Err(e) = stackasm::driver::write_assembly(&path, &compiled.asm) {
                e.render_plain();
                process::exit(1);
            }
            eprintln!("Compiled -> {}", path.display());
        }
        None => print!("{}", compiled.asm),
    }
}
