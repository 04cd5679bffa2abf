//! AT&T-syntax rendering of operands and instructions.

use std::fmt;

use super::{AluOp, Instr, Operand, WORD_SIZE};

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => f.write_str(r.name()),
            Operand::StackSlot(i) => write!(f, "-{}(%ebp)", (*i as i64 + 1) * WORD_SIZE as i64),
            Operand::Memory(name) => f.write_str(name),
            Operand::Immediate(v) => write!(f, "${}", v),
        }
    }
}

impl AluOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "addl",
            AluOp::Sub => "subl",
            AluOp::Mul => "imull",
            AluOp::And => "andl",
            AluOp::Or => "orl",
            AluOp::Xor => "xorl",
            AluOp::Cmp => "cmpl",
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Mov(s, d) => write!(f, "\tmovl\t{},\t{}", s, d),
            Instr::Alu(op, s, d) => write!(f, "\t{}\t{},\t{}", op.mnemonic(), s, d),
            Instr::Idiv(s) => write!(f, "\tidivl\t{}", s),
            Instr::Cltd => write!(f, "\tcltd"),
            Instr::Set(cond, b) => write!(f, "\tset{}\t{}", cond.suffix(), b.name()),
            Instr::Push(o) => write!(f, "\tpushl\t{}", o),
            Instr::Pop(o) => write!(f, "\tpopl\t{}", o),
            Instr::Call(name) => write!(f, "\tcall\t{}", name),
            Instr::Ret => write!(f, "\tret"),
            Instr::Meta(text) => f.write_str(text),
        }
    }
}

/// Render instructions one per line, newline-terminated.
pub fn render(instrs: &[Instr]) -> String {
    let mut out = String::new();
    for instr in instrs {
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}
