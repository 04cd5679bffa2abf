//! Stack IR → x86 lowering.
//!
//! Walks the IR left to right, threading an `Env` that records where each
//! pending stack value lives. Each IR operation becomes a short, fixed
//! instruction sequence; binary operators are lowered per family in
//! `binop`.
//!
//! ```text
//! IR:              x86:
//!   CONST 2   →      movl  $2, %ebx
//!   CONST 3   →      movl  $3, %ecx
//!   BINOP +   →      addl  %ecx, %ebx
//! ```

mod binop;
#[cfg(test)]
mod tests;

use crate::alloc::{Env, StackUnderflow};
use crate::asm::{Instr, Operand, Reg, MAX_ALLOCATABLE};
use crate::diagnostic::Diagnostic;
use crate::ir::StackOp;
use crate::span::Spanned;

/// Runtime routine returning one integer in `%eax`.
pub const READ_ROUTINE: &str = "read";
/// Runtime routine taking one integer on the stack.
pub const WRITE_ROUTINE: &str = "write";

/// Result of lowering one procedure body.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub body: Vec<Instr>,
    /// Final environment: frame size and globals.
    pub env: Env,
    pub warnings: Vec<Diagnostic>,
}

/// x86 lowering for one IR stream.
#[derive(Debug, Clone)]
pub struct Lowering {
    registers: u8,
    comments: bool,
}

impl Default for Lowering {
    fn default() -> Self {
        Self::new(MAX_ALLOCATABLE)
    }
}

impl Lowering {
    /// Lowering that allocates from the first `registers` table entries.
    pub fn new(registers: u8) -> Self {
        Self {
            registers: registers.clamp(1, MAX_ALLOCATABLE),
            comments: true,
        }
    }

    /// Whether each IR op is preceded by a `# <op>` comment line.
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    pub fn registers(&self) -> u8 {
        self.registers
    }

    pub fn lower(&self, ops: &[Spanned<StackOp>]) -> Result<Lowered, Diagnostic> {
        let mut env = Env::new(self.registers);
        let mut body = Vec::new();

        for op in ops {
            log::trace!("lowering {} (depth {})", op.node, env.depth());
            if self.comments {
                body.push(Instr::Meta(format!("# {}", op.node)));
            }
            env = lower_op(&op.node, env, &mut body).map_err(|e| {
                Diagnostic::error(e.to_string(), op.span)
                    .with_note(format!("while lowering `{}`", op.node))
            })?;
        }

        let mut warnings = Vec::new();
        if env.depth() > 0 {
            if let Some(last) = ops.last() {
                warnings.push(
                    Diagnostic::warning(
                        format!("{} value(s) left on the stack at end of program", env.depth()),
                        last.span,
                    )
                    .with_help("values that are never stored or written are discarded".to_string()),
                );
            }
        }

        log::debug!(
            "lowered {} op(s): {} instruction(s), frame {} slot(s), {} global(s)",
            ops.len(),
            body.len(),
            env.frame_size(),
            env.globals().len()
        );
        Ok(Lowered {
            body,
            env,
            warnings,
        })
    }
}

/// Lower one IR operation, appending to `out`.
pub fn lower_op(op: &StackOp, env: Env, out: &mut Vec<Instr>) -> Result<Env, StackUnderflow> {
    match op {
        StackOp::Read => {
            let (dst, env) = env.allocate();
            call_runtime(READ_ROUTINE, None, &env, out);
            emit_move(Reg::EAX.into(), dst.clone(), out);
            Ok(env.push(dst))
        }
        StackOp::Write => {
            let (value, env) = env.pop()?;
            call_runtime(WRITE_ROUTINE, Some(value), &env, out);
            Ok(env)
        }
        StackOp::Const(n) => {
            let (dst, env) = env.allocate();
            out.push(Instr::Mov(Operand::Immediate(*n), dst.clone()));
            Ok(env.push(dst))
        }
        StackOp::Ld(name) => {
            let env = env.add_global(name);
            let (dst, env) = env.allocate();
            emit_move(Env::location_of(name), dst.clone(), out);
            Ok(env.push(dst))
        }
        StackOp::St(name) => {
            let env = env.add_global(name);
            let (src, env) = env.pop()?;
            emit_move(src, Env::location_of(name), out);
            Ok(env)
        }
        StackOp::Binop(bop) => {
            let (src, dst, env) = env.pop2()?;
            binop::lower_binop(*bop, src, dst.clone(), out);
            Ok(env.push(dst))
        }
    }
}

/// `movl src, dst`, staged through `%eax` when both sides are memory.
pub(crate) fn emit_move(src: Operand, dst: Operand, out: &mut Vec<Instr>) {
    if src.in_memory() && dst.in_memory() {
        out.push(Instr::Mov(src, Reg::EAX.into()));
        out.push(Instr::Mov(Reg::EAX.into(), dst));
    } else {
        out.push(Instr::Mov(src, dst));
    }
}

/// Call a runtime routine with at most one stack argument. Live
/// caller-saved registers are preserved across the call.
fn call_runtime(name: &str, arg: Option<Operand>, env: &Env, out: &mut Vec<Instr>) {
    let saved: Vec<Reg> = env.live_registers().filter(|r| r.is_caller_saved()).collect();
    for r in &saved {
        out.push(Instr::Push((*r).into()));
    }
    let has_arg = arg.is_some();
    if let Some(arg) = arg {
        out.push(Instr::Push(arg));
    }
    out.push(Instr::Call(name.to_string()));
    if has_arg {
        out.push(Instr::Pop(Reg::EAX.into()));
    }
    for r in saved.iter().rev() {
        out.push(Instr::Pop((*r).into()));
    }
}
