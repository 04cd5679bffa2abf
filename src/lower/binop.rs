//! Binary operator lowering, one fixed template per operator family.
//!
//! `src` is the right operand (popped first), `dst` the left one. The
//! result always lands in `dst`. `%eax` and `%edx` are scratch.

use super::emit_move;
use crate::asm::{AluOp, ByteReg, Cond, Instr, Operand, Reg};
use crate::ir::{Additive, BinOp, Connective, OpFamily, Product, Relation};

pub(super) fn lower_binop(op: BinOp, src: Operand, dst: Operand, out: &mut Vec<Instr>) {
    match op.family() {
        OpFamily::Arithmetic(additive) => {
            let alu_op = match additive {
                Additive::Add => AluOp::Add,
                Additive::Sub => AluOp::Sub,
            };
            alu(alu_op, src, dst, Reg::EDX, out);
        }
        OpFamily::Logical(connective) => {
            let alu_op = match connective {
                Connective::And => AluOp::And,
                Connective::Or => AluOp::Or,
            };
            logical(alu_op, src, dst, out);
        }
        OpFamily::Comparison(relation) => comparison(condition(relation), src, dst, out),
        OpFamily::Multiplicative(Product::Mul) => multiply(src, dst, out),
        OpFamily::Multiplicative(Product::Quotient) => divide(src, dst, Reg::EAX, out),
        OpFamily::Multiplicative(Product::Remainder) => divide(src, dst, Reg::EDX, out),
    }
}

/// Flags are set by `cmpl right, left`, so each suffix reads left-to-right.
fn condition(relation: Relation) -> Cond {
    match relation {
        Relation::Lt => Cond::Less,
        Relation::Le => Cond::LessEq,
        Relation::Eq => Cond::Equal,
        Relation::Ne => Cond::NotEqual,
        Relation::Ge => Cond::GreaterEq,
        Relation::Gt => Cond::Greater,
    }
}

/// `<op> src, dst`, staging `src` through `staging` when both are memory.
fn alu(op: AluOp, src: Operand, dst: Operand, staging: Reg, out: &mut Vec<Instr>) {
    if src.in_memory() && dst.in_memory() {
        out.push(Instr::Mov(src, staging.into()));
        out.push(Instr::Alu(op, staging.into(), dst));
    } else {
        out.push(Instr::Alu(op, src, dst));
    }
}

fn clear(reg: Reg, out: &mut Vec<Instr>) {
    out.push(Instr::Alu(AluOp::Xor, reg.into(), reg.into()));
}

/// Normalize `operand` to 0/1 in the scratch register behind `byte`.
fn truthiness(operand: &Operand, byte: ByteReg, out: &mut Vec<Instr>) {
    clear(byte.full(), out);
    out.push(Instr::Alu(AluOp::Cmp, Operand::Immediate(0), operand.clone()));
    out.push(Instr::Set(Cond::NotEqual, byte));
}

fn logical(op: AluOp, src: Operand, dst: Operand, out: &mut Vec<Instr>) {
    truthiness(&dst, ByteReg::Al, out);
    truthiness(&src, ByteReg::Dl, out);
    out.push(Instr::Alu(op, Reg::EDX.into(), Reg::EAX.into()));
    out.push(Instr::Mov(Reg::EAX.into(), dst));
}

fn comparison(cond: Cond, src: Operand, dst: Operand, out: &mut Vec<Instr>) {
    // Cleared before the compare: xorl overwrites the flags.
    clear(Reg::EAX, out);
    alu(AluOp::Cmp, src, dst.clone(), Reg::EDX, out);
    out.push(Instr::Set(cond, ByteReg::Al));
    out.push(Instr::Mov(Reg::EAX.into(), dst));
}

/// `imull` needs a register destination.
fn multiply(src: Operand, dst: Operand, out: &mut Vec<Instr>) {
    if dst.in_register() {
        out.push(Instr::Alu(AluOp::Mul, src, dst));
    } else {
        out.push(Instr::Mov(dst.clone(), Reg::EAX.into()));
        out.push(Instr::Alu(AluOp::Mul, src, Reg::EAX.into()));
        out.push(Instr::Mov(Reg::EAX.into(), dst));
    }
}

/// Signed `%edx:%eax / src`; `result` picks quotient or remainder.
fn divide(src: Operand, dst: Operand, result: Reg, out: &mut Vec<Instr>) {
    out.push(Instr::Mov(dst.clone(), Reg::EAX.into()));
    out.push(Instr::Cltd);
    out.push(Instr::Idiv(src));
    emit_move(result.into(), dst, out);
}
