mod cli;

use clap::{Parser, Subcommand};

use cli::build::{cmd_build, BuildArgs};
use cli::check::{cmd_check, CheckArgs};
use cli::emit::{cmd_emit, EmitArgs};

#[derive(Parser)]
#[command(
    name = "stackasm",
    version,
    about = "Stack IR to 32-bit x86 assembly compiler"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate an IR file to assembly
    Emit(EmitArgs),
    /// Translate, assemble and link an executable against the runtime
    Build(BuildArgs),
    /// Lower without writing anything and report frame and size figures
    Check(CheckArgs),
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Emit(args) => cmd_emit(args),
        Command::Build(args) => cmd_build(args),
        Command::Check(args) => cmd_check(args),
    }
}
