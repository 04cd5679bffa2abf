//! Program assembly: data section, `main` prologue/epilogue, text.

use crate::alloc::Env;
use crate::asm::{print, AluOp, Instr, Operand, Reg, WORD_SIZE};
use crate::lower::Lowered;

/// Entry symbol of the generated procedure.
pub const ENTRY: &str = "main";

/// A complete single-procedure program.
#[derive(Debug, Clone)]
pub struct Program {
    /// Globals in discovery order, one data cell each.
    pub globals: Vec<String>,
    /// Frame size in slots.
    pub frame_size: u32,
    /// Allocatable registers `main` must preserve for its caller.
    pub callee_saved: Vec<Reg>,
    pub body: Vec<Instr>,
}

impl Program {
    pub fn new(lowered: Lowered) -> Self {
        let Lowered { body, env, .. } = lowered;
        Self::from_parts(body, &env)
    }

    pub fn from_parts(body: Vec<Instr>, env: &Env) -> Self {
        let callee_saved = (0..env.allocatable())
            .map(Reg)
            .filter(|r| !r.is_caller_saved())
            .collect();
        Self {
            globals: env.globals().to_vec(),
            frame_size: env.frame_size(),
            callee_saved,
            body,
        }
    }

    /// Frame size in bytes.
    pub fn frame_bytes(&self) -> i32 {
        self.frame_size as i32 * WORD_SIZE
    }

    fn data_section(&self) -> Vec<Instr> {
        let mut out = vec![Instr::Meta("\t.data".to_string())];
        for name in &self.globals {
            let label = Env::location_of(name);
            out.push(Instr::Meta(format!("{}:\t.int\t0", label)));
        }
        out
    }

    fn prologue(&self) -> Vec<Instr> {
        let mut out = vec![
            Instr::Meta(format!("{}:", ENTRY)),
            Instr::Push(Reg::EBP.into()),
            Instr::Mov(Reg::ESP.into(), Reg::EBP.into()),
        ];
        if self.frame_size > 0 {
            out.push(Instr::Alu(
                AluOp::Sub,
                Operand::Immediate(self.frame_bytes()),
                Reg::ESP.into(),
            ));
        }
        for r in &self.callee_saved {
            out.push(Instr::Push((*r).into()));
        }
        out
    }

    fn epilogue(&self) -> Vec<Instr> {
        let mut out: Vec<Instr> = self
            .callee_saved
            .iter()
            .rev()
            .map(|r| Instr::Pop((*r).into()))
            .collect();
        out.push(Instr::Alu(AluOp::Xor, Reg::EAX.into(), Reg::EAX.into()));
        out.push(Instr::Mov(Reg::EBP.into(), Reg::ESP.into()));
        out.push(Instr::Pop(Reg::EBP.into()));
        out.push(Instr::Ret);
        out
    }

    /// The whole program as one instruction list.
    pub fn instructions(&self) -> Vec<Instr> {
        let mut out = vec![Instr::Meta(format!("\t.globl\t{}", ENTRY))];
        out.extend(self.data_section());
        out.push(Instr::Meta("\t.text".to_string()));
        out.extend(self.prologue());
        out.extend(self.body.iter().cloned());
        out.extend(self.epilogue());
        out
    }

    pub fn to_asm(&self) -> String {
        print::render(&self.instructions())
    }
}
