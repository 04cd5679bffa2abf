use std::path::PathBuf;
use std::process;

use clap::Args;

use stackasm::config;
use stackasm::driver::{self, Outputs};

use super::{compile_or_exit, load_config, resolve_options};

#[derive(Args)]
pub struct BuildArgs {
    /// Input IR file
    pub input: PathBuf,
    /// Output executable (default: input name without extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Directory containing runtime.o
    #[arg(long, value_name = "DIR")]
    pub runtime: Option<PathBuf>,
    /// C compiler driver used to assemble and link (default: gcc)
    #[arg(long)]
    pub cc: Option<String>,
    /// Usable registers, 1-4 (default: stackasm.toml or 4)
    #[arg(long, value_name = "N")]
    pub registers: Option<u8>,
    /// Omit the per-instruction IR comments
    #[arg(long)]
    pub no_comments: bool,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        input,
        output,
        runtime,
        cc,
        registers,
        no_comments,
    } = args;
    let config = load_config(&input);
    let options = resolve_options(registers, no_comments, config.as_ref());
    let env_runtime = std::env::var(config::RUNTIME_ENV).ok();
    let runtime_dir =
        config::resolve_runtime(runtime.as_deref(), env_runtime.as_deref(), config.as_ref());
    let cc = config::resolve_cc(cc.as_deref(), config.as_ref());

    let outputs = match Outputs::for_input(&input, output) {
        Ok(outputs) => outputs,
        Err(e) => {
            e.render_plain();
            process::exit(1);
        }
    };
    let compiled = compile_or_exit(&input, &options);

    if let Err(e) = driver::write_assembly(&outputs.assembly, &compiled.asm) {
        e.render_plain();
        process::exit(1);
    }
    if let Err(e) = driver::link(&cc, &runtime_dir, &outputs.assembly, &outputs.executable) {
        e.render_plain();
        process::exit(1);
    }
    eprintln!("Compiled -> {}", outputs.executable.display());
}
