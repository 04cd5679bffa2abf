
use super::*;
use crate::asm::machine::Machine;
use crate::asm::{AluOp, ByteReg, Cond};
use crate::ir::parse::parse;

fn lower_src(source: &str, registers: u8) -> Lowered {
    let ops = parse(source).expect("test IR should parse");
    Lowering::new(registers)
        .with_comments(false)
        .lower(&ops)
        .expect("test IR should lower")
}

/// Lower and execute, returning the machine and the final environment.
fn run(source: &str, registers: u8, input: &[i32]) -> (Machine, Env) {
    let lowered = lower_src(source, registers);
    let mut m = Machine::new(input);
    m.run(&lowered.body);
    (m, lowered.env)
}

/// Value of the single pending stack entry after running `source`.
fn eval(source: &str, registers: u8) -> i32 {
    let (m, env) = run(source, registers, &[]);
    assert_eq!(env.depth(), 1, "expected exactly one live value");
    m.read(&env.stack()[0])
}

fn reg(n: u8) -> Operand {
    Operand::Register(Reg(n))
}

// ── Scenario A: simple arithmetic ──

#[test]
fn test_const_add_const() {
    let lowered = lower_src("CONST 2\nCONST 3\nBINOP +\n", 4);
    assert_eq!(
        lowered.body,
        vec![
            Instr::Mov(Operand::Immediate(2), reg(0)),
            Instr::Mov(Operand::Immediate(3), reg(1)),
            Instr::Alu(AluOp::Add, reg(1), reg(0)),
        ]
    );
    assert_eq!(lowered.env.stack(), [reg(0)]);
    assert_eq!(eval("CONST 2\nCONST 3\nBINOP +\n", 4), 5);
}

#[test]
fn test_sub_is_left_minus_right() {
    assert_eq!(eval("CONST 10\nCONST 4\nBINOP -\n", 4), 6);
    assert_eq!(eval("CONST 4\nCONST 10\nBINOP -\n", 4), -6);
}

#[test]
fn test_arithmetic_between_slots_is_staged() {
    // One register: 1 sits in %ebx, 20 and 22 in slots 0 and 1.
    let src = "CONST 1\nCONST 20\nCONST 22\nBINOP +\n";
    let lowered = lower_src(src, 1);
    let slot0 = Operand::StackSlot(0);
    let slot1 = Operand::StackSlot(1);
    assert_eq!(
        &lowered.body[3..],
        [
            Instr::Mov(slot1, Reg::EDX.into()),
            Instr::Alu(AluOp::Add, Reg::EDX.into(), slot0.clone()),
        ]
    );
    let (m, env) = run(src, 1, &[]);
    assert_eq!(env.stack(), [reg(0), slot0.clone()]);
    assert_eq!(m.read(&slot0), 42);
}

// ── Scenario B: comparisons ──

#[test]
fn test_less_than() {
    assert_eq!(eval("CONST 0\nCONST 5\nBINOP <\n", 4), 1);
    assert_eq!(eval("CONST 5\nCONST 0\nBINOP <\n", 4), 0);
}

#[test]
fn test_comparison_sequence() {
    let lowered = lower_src("CONST 0\nCONST 5\nBINOP <=\n", 4);
    assert_eq!(
        &lowered.body[2..],
        [
            Instr::Alu(AluOp::Xor, Reg::EAX.into(), Reg::EAX.into()),
            Instr::Alu(AluOp::Cmp, reg(1), reg(0)),
            Instr::Set(Cond::LessEq, ByteReg::Al),
            Instr::Mov(Reg::EAX.into(), reg(0)),
        ]
    );
}

#[test]
fn test_all_comparisons_in_registers_and_slots() {
    let pairs = [(-3, 4), (4, -3), (7, 7), (0, 0), (-1, -2)];
    let table: [(&str, fn(i32, i32) -> bool); 6] = [
        ("<", |a, b| a < b),
        ("<=", |a, b| a <= b),
        ("==", |a, b| a == b),
        ("!=", |a, b| a != b),
        (">=", |a, b| a >= b),
        (">", |a, b| a > b),
    ];
    for (sym, expect) in table {
        for (a, b) in pairs {
            let in_regs = format!("CONST {}\nCONST {}\nBINOP {}\n", a, b, sym);
            assert_eq!(eval(&in_regs, 4), expect(a, b) as i32, "{} {} {}", a, sym, b);

            // Both operands spilled: exercises the %edx staging path.
            let spilled = format!("CONST 9\n{}", in_regs);
            let (m, env) = run(&spilled, 1, &[]);
            assert_eq!(env.depth(), 2);
            assert_eq!(m.read(&env.stack()[1]), expect(a, b) as i32, "{} {} {}", a, sym, b);
        }
    }
}

// ── Logical ──

#[test]
fn test_logical_normalizes_operands() {
    assert_eq!(eval("CONST 5\nCONST -3\nBINOP &&\n", 4), 1);
    assert_eq!(eval("CONST 5\nCONST 0\nBINOP &&\n", 4), 0);
    assert_eq!(eval("CONST 0\nCONST 0\nBINOP !!\n", 4), 0);
    assert_eq!(eval("CONST 0\nCONST 256\nBINOP !!\n", 4), 1);
    // 2 & 1 would be 0 without normalization.
    assert_eq!(eval("CONST 2\nCONST 1\nBINOP &&\n", 4), 1);
}

#[test]
fn test_logical_sequence() {
    let lowered = lower_src("CONST 1\nCONST 2\nBINOP !!\n", 4);
    assert_eq!(
        &lowered.body[2..],
        [
            Instr::Alu(AluOp::Xor, Reg::EAX.into(), Reg::EAX.into()),
            Instr::Alu(AluOp::Cmp, Operand::Immediate(0), reg(0)),
            Instr::Set(Cond::NotEqual, ByteReg::Al),
            Instr::Alu(AluOp::Xor, Reg::EDX.into(), Reg::EDX.into()),
            Instr::Alu(AluOp::Cmp, Operand::Immediate(0), reg(1)),
            Instr::Set(Cond::NotEqual, ByteReg::Dl),
            Instr::Alu(AluOp::Or, Reg::EDX.into(), Reg::EAX.into()),
            Instr::Mov(Reg::EAX.into(), reg(0)),
        ]
    );
}

#[test]
fn test_template_length_follows_family() {
    use crate::ir::{BinOp, OpFamily, Product};

    for op in BinOp::ALL {
        let lowered = lower_src(&format!("CONST 9\nCONST 4\nBINOP {}\n", op), 4);
        let template = &lowered.body[2..];
        let expected = match op.family() {
            OpFamily::Arithmetic(_) => 1,
            OpFamily::Logical(_) => 8,
            OpFamily::Comparison(_) => 4,
            OpFamily::Multiplicative(Product::Mul) => 1,
            OpFamily::Multiplicative(_) => 4,
        };
        assert_eq!(template.len(), expected, "template for {}", op);
        // Every template ends by writing the left operand's location.
        let last = template.last().unwrap();
        assert_eq!(last.operands().last().copied(), Some(&reg(0)), "result of {}", op);
    }
}

// ── Scenario C / D: globals ──

#[test]
fn test_ld_registers_global() {
    let lowered = lower_src("LD x\n", 4);
    assert_eq!(lowered.env.globals(), ["x"]);
    assert_eq!(
        lowered.body,
        vec![Instr::Mov(Operand::Memory("global_x".into()), reg(0))]
    );
}

#[test]
fn test_store_then_load_round_trips() {
    let (m, env) = run("CONST 7\nST g\nLD g\n", 4, &[]);
    assert_eq!(env.globals(), ["g"]);
    assert_eq!(m.global("global_g"), 7);
    assert_eq!(m.read(&env.stack()[0]), 7);
}

#[test]
fn test_global_moves_from_slots_go_through_eax() {
    let src = "CONST 1\nCONST 7\nST g\nLD g\n";
    let lowered = lower_src(src, 1);
    let global = Operand::Memory("global_g".into());
    let slot0 = Operand::StackSlot(0);
    assert_eq!(
        &lowered.body[2..],
        [
            Instr::Mov(slot0.clone(), Reg::EAX.into()),
            Instr::Mov(Reg::EAX.into(), global.clone()),
            Instr::Mov(global, Reg::EAX.into()),
            Instr::Mov(Reg::EAX.into(), slot0.clone()),
        ]
    );
    let (m, _) = run(src, 1, &[]);
    assert_eq!(m.read(&slot0), 7);
}

// ── Scenario E: spilling ──

#[test]
fn test_spill_slots_grow_from_zero() {
    let src = "CONST 1\nCONST 2\nCONST 3\nCONST 4\nCONST 5\nCONST 6\n";
    let lowered = lower_src(src, 4);
    assert_eq!(
        lowered.env.stack(),
        [
            reg(0),
            reg(1),
            reg(2),
            reg(3),
            Operand::StackSlot(0),
            Operand::StackSlot(1)
        ]
    );
    assert_eq!(lowered.env.frame_size(), 2);
    assert_eq!(lower_src(src, 2).env.frame_size(), 4);
}

#[test]
fn test_deep_expression_with_spills() {
    // ((1 + 2) * (3 + 4)) - ((5 + 6) * (7 - 8))
    let src = "CONST 1\nCONST 2\nBINOP +\nCONST 3\nCONST 4\nBINOP +\nBINOP *\n\
               CONST 5\nCONST 6\nBINOP +\nCONST 7\nCONST 8\nBINOP -\nBINOP *\nBINOP -\n";
    for registers in 1..=4 {
        assert_eq!(eval(src, registers), 32, "registers = {}", registers);
    }
}

// ── Scenario F: division ──

#[test]
fn test_div_and_mod() {
    assert_eq!(eval("CONST 7\nCONST 2\nBINOP /\n", 4), 3);
    assert_eq!(eval("CONST 7\nCONST 2\nBINOP %\n", 4), 1);
    assert_eq!(eval("CONST -7\nCONST 2\nBINOP /\n", 4), -3);
    assert_eq!(eval("CONST -7\nCONST 2\nBINOP %\n", 4), -1);
    assert_eq!(eval("CONST 7\nCONST -2\nBINOP /\n", 4), -3);
}

#[test]
fn test_div_sequence() {
    let lowered = lower_src("CONST 7\nCONST 2\nBINOP %\n", 4);
    assert_eq!(
        &lowered.body[2..],
        [
            Instr::Mov(reg(0), Reg::EAX.into()),
            Instr::Cltd,
            Instr::Idiv(reg(1)),
            Instr::Mov(Reg::EDX.into(), reg(0)),
        ]
    );
}

#[test]
fn test_division_with_spilled_operands() {
    let src = "CONST 100\nCONST 45\nCONST 7\nBINOP %\n";
    let (m, env) = run(src, 1, &[]);
    assert_eq!(m.read(&env.stack()[1]), 3);
    let src = "CONST 100\nCONST 45\nCONST 7\nBINOP /\nBINOP /\n";
    assert_eq!(eval(src, 1), 16);
}

// ── Multiplication ──

#[test]
fn test_mul_into_register() {
    let lowered = lower_src("CONST 6\nCONST 7\nBINOP *\n", 4);
    assert_eq!(lowered.body[2], Instr::Alu(AluOp::Mul, reg(1), reg(0)));
    assert_eq!(eval("CONST 6\nCONST 7\nBINOP *\n", 4), 42);
}

#[test]
fn test_mul_into_slot_stages_through_eax() {
    let src = "CONST 1\nCONST 6\nCONST 7\nBINOP *\n";
    let lowered = lower_src(src, 1);
    let slot0 = Operand::StackSlot(0);
    assert_eq!(
        &lowered.body[3..],
        [
            Instr::Mov(slot0.clone(), Reg::EAX.into()),
            Instr::Alu(AluOp::Mul, Operand::StackSlot(1), Reg::EAX.into()),
            Instr::Mov(Reg::EAX.into(), slot0.clone()),
        ]
    );
    let (m, _) = run(src, 1, &[]);
    assert_eq!(m.read(&slot0), 42);
}

// ── I/O ──

#[test]
fn test_read_write_sequences() {
    let lowered = lower_src("READ\nWRITE\n", 4);
    assert_eq!(
        lowered.body,
        vec![
            Instr::Call("read".into()),
            Instr::Mov(Reg::EAX.into(), reg(0)),
            Instr::Push(reg(0)),
            Instr::Call("write".into()),
            Instr::Pop(Reg::EAX.into()),
        ]
    );
    let (m, _) = run("READ\nWRITE\n", 4, &[17]);
    assert_eq!(m.output, vec![17]);
}

#[test]
fn test_live_ecx_survives_runtime_calls() {
    // %ecx holds 2 while `read` and `write` run.
    let src = "CONST 1\nCONST 2\nREAD\nBINOP +\nCONST 5\nWRITE\nBINOP +\nWRITE\n";
    let lowered = lower_src(src, 4);
    assert!(lowered.body.contains(&Instr::Push(reg(1))));
    assert!(lowered.body.contains(&Instr::Pop(reg(1))));
    let (m, _) = run(src, 4, &[10]);
    assert_eq!(m.output, vec![5, 13]);
}

#[test]
fn test_write_of_spilled_value() {
    let (m, _) = run("CONST 1\nCONST 2\nWRITE\nWRITE\n", 1, &[]);
    assert_eq!(m.output, vec![2, 1]);
}

// ── Comments, warnings, errors ──

#[test]
fn test_comment_precedes_each_op() {
    let ops = parse("CONST 2\nST x\n").unwrap();
    let lowered = Lowering::default().lower(&ops).unwrap();
    assert_eq!(lowered.body[0], Instr::Meta("# CONST 2".into()));
    assert_eq!(lowered.body[2], Instr::Meta("# ST x".into()));
    assert_eq!(lowered.body.len(), 4);
}

#[test]
fn test_leftover_values_warn() {
    let lowered = lower_src("CONST 1\nCONST 2\n", 4);
    assert_eq!(lowered.warnings.len(), 1);
    assert!(!lowered.warnings[0].is_error());
    assert!(lower_src("CONST 1\nWRITE\n", 4).warnings.is_empty());
}

#[test]
fn test_underflow_reports_offending_op() {
    let ops = parse("CONST 1\nBINOP *\n").unwrap();
    let err = Lowering::default().lower(&ops).unwrap_err();
    assert!(err.is_error());
    assert_eq!(err.message, "stack underflow: needs 2 values, stack holds 1");
    assert_eq!(err.span, ops[1].span);
    assert_eq!(err.notes, vec!["while lowering `BINOP *`"]);

    let ops = parse("WRITE\n").unwrap();
    assert!(Lowering::default().lower(&ops).is_err());
    let ops = parse("ST g\n").unwrap();
    assert!(Lowering::default().lower(&ops).is_err());
}

#[test]
fn test_register_count_is_clamped() {
    assert_eq!(Lowering::new(0).registers(), 1);
    assert_eq!(Lowering::new(9).registers(), MAX_ALLOCATABLE);
}
