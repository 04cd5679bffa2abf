//! External toolchain: write the `.s` file and link it against the runtime.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Prebuilt runtime object inside the runtime directory.
pub const RUNTIME_OBJECT: &str = "runtime.o";

/// Suffix for the default executable when `<stem>` would be the input itself.
pub const EXECUTABLE_FALLBACK_SUFFIX: &str = "out";

/// Paths of one build: `<stem>.s` next to the input, executable `<stem>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Outputs {
    pub assembly: PathBuf,
    pub executable: PathBuf,
}

impl Outputs {
    /// Output paths for `input`. Never returns a path equal to the input,
    /// and never the same path for both outputs.
    pub fn for_input(input: &Path, executable: Option<PathBuf>) -> Result<Self, Diagnostic> {
        let err = |msg: String| Diagnostic::error(msg, Span::dummy());

        let stem = input
            .file_stem()
            .ok_or_else(|| err(format!("'{}' does not name a file", input.display())))?
            .to_string_lossy()
            .into_owned();
        let assembly = input.with_file_name(format!("{}.s", stem));
        if assembly == input {
            return Err(err(format!(
                "assembly output '{}' would overwrite the input",
                assembly.display()
            ))
            .with_help("rename the IR file, e.g. to use an `.ir` extension".to_string()));
        }

        let executable = match executable {
            Some(path) if path == input => {
                return Err(err(format!(
                    "executable '{}' would overwrite the input",
                    path.display()
                )));
            }
            Some(path) => path,
            None => {
                let plain = input.with_file_name(&stem);
                if plain == input {
                    input.with_file_name(format!("{}.{}", stem, EXECUTABLE_FALLBACK_SUFFIX))
                } else {
                    plain
                }
            }
        };
        if executable == assembly {
            return Err(err(format!(
                "executable '{}' would overwrite the generated assembly",
                executable.display()
            )));
        }

        Ok(Self {
            assembly,
            executable,
        })
    }
}

pub fn write_assembly(path: &Path, text: &str) -> Result<(), Diagnostic> {
    std::fs::write(path, text).map_err(|e| {
        Diagnostic::error(
            format!("cannot write '{}': {}", path.display(), e),
            Span::dummy(),
        )
    })?;
    log::info!("wrote {} ({} bytes)", path.display(), text.len());
    Ok(())
}

/// `<cc> -m32 -o <exe> <runtime>/runtime.o <asm>`
pub fn link_command(cc: &str, runtime_dir: &Path, assembly: &Path, executable: &Path) -> Command {
    let mut cmd = Command::new(cc);
    cmd.arg("-m32")
        .arg("-o")
        .arg(executable)
        .arg(runtime_dir.join(RUNTIME_OBJECT))
        .arg(assembly);
    cmd
}

/// Assemble and link. The compiler's stderr becomes the diagnostic note.
pub fn link(cc: &str, runtime_dir: &Path, assembly: &Path, executable: &Path) -> Result<(), Diagnostic> {
    let runtime = runtime_dir.join(RUNTIME_OBJECT);
    if !runtime.exists() {
        return Err(Diagnostic::error(
            format!("runtime object '{}' not found", runtime.display()),
            Span::dummy(),
        )
        .with_help(format!(
            "pass --runtime, set {} or add `runtime` under [build] in {}",
            crate::config::RUNTIME_ENV,
            crate::config::CONFIG_FILE
        )));
    }

    let mut cmd = link_command(cc, runtime_dir, assembly, executable);
    log::info!("running {:?}", cmd);
    let result = cmd.output().map_err(|e| {
        Diagnostic::error(format!("failed to run '{}': {}", cc, e), Span::dummy())
    })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let mut diag = Diagnostic::error(
            format!("'{}' failed ({})", cc, result.status),
            Span::dummy(),
        );
        if !stderr.trim().is_empty() {
            diag = diag.with_note(stderr.trim().to_string());
        }
        return Err(diag);
    }
    Ok(())
}
