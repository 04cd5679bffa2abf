//! 32-bit x86 operand and instruction model.
//!
//! Operands and instructions are plain values; `print` renders them in
//! AT&T syntax. Two-operand forms are stored in AT&T order: source first,
//! destination second.

pub mod print;

// ─── Registers ────────────────────────────────────────────────────

/// Machine word size in bytes.
pub const WORD_SIZE: i32 = 4;

/// Register table, in allocation order. Indices below the usable count
/// hold IR values; the rest are scratch and frame registers.
pub const REGISTERS: [&str; 8] = [
    "%ebx", "%ecx", "%esi", "%edi", "%eax", "%edx", "%ebp", "%esp",
];

/// Upper bound on the usable (allocatable) register count.
pub const MAX_ALLOCATABLE: u8 = 4;

/// A physical register, as an index into `REGISTERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub u8);

impl Reg {
    /// Accumulator. Scratch; receives call results and quotients.
    pub const EAX: Reg = Reg(4);
    /// Remainder half of the wide dividend. Scratch.
    pub const EDX: Reg = Reg(5);
    pub const EBP: Reg = Reg(6);
    pub const ESP: Reg = Reg(7);

    pub fn name(self) -> &'static str {
        REGISTERS[self.0 as usize]
    }

    /// Clobbered by a cdecl call.
    pub fn is_caller_saved(self) -> bool {
        matches!(self.name(), "%eax" | "%ecx" | "%edx")
    }
}

/// Low byte of a scratch register, the target of `set<cc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteReg {
    Al,
    Dl,
}

impl ByteReg {
    pub fn name(self) -> &'static str {
        match self {
            ByteReg::Al => "%al",
            ByteReg::Dl => "%dl",
        }
    }

    /// The full register this byte belongs to.
    pub fn full(self) -> Reg {
        match self {
            ByteReg::Al => Reg::EAX,
            ByteReg::Dl => Reg::EDX,
        }
    }
}

// ─── Operands ─────────────────────────────────────────────────────

/// Prefix that turns a global name into its data label.
pub const GLOBAL_PREFIX: &str = "global_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Reg),
    /// Frame slot `i`, at `-(i+1) * WORD_SIZE` from `%ebp`.
    StackSlot(u32),
    /// Named data cell (already prefixed).
    Memory(String),
    Immediate(i32),
}

impl Operand {
    pub fn in_memory(&self) -> bool {
        matches!(self, Operand::StackSlot(_) | Operand::Memory(_))
    }

    pub fn in_register(&self) -> bool {
        matches!(self, Operand::Register(_))
    }

    pub fn as_register(&self) -> Option<Reg> {
        match self {
            Operand::Register(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Reg> for Operand {
    fn from(r: Reg) -> Self {
        Operand::Register(r)
    }
}

// ─── Instructions ─────────────────────────────────────────────────

/// Two-operand ALU operations. Mnemonics are target ones, not IR ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Cmp,
}

/// Condition selected by `set<cc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Less,
    LessEq,
    Equal,
    NotEqual,
    GreaterEq,
    Greater,
}

impl Cond {
    pub fn suffix(self) -> &'static str {
        match self {
            Cond::Less => "l",
            Cond::LessEq => "le",
            Cond::Equal => "e",
            Cond::NotEqual => "ne",
            Cond::GreaterEq => "ge",
            Cond::Greater => "g",
        }
    }
}

/// One target instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `movl src, dst`
    Mov(Operand, Operand),
    /// `<op>l src, dst`
    Alu(AluOp, Operand, Operand),
    /// `idivl src`: divides `%edx:%eax`.
    Idiv(Operand),
    /// Sign-extend `%eax` into `%edx`.
    Cltd,
    Set(Cond, ByteReg),
    Push(Operand),
    Pop(Operand),
    Call(String),
    Ret,
    /// Directive, label or comment line, emitted verbatim.
    Meta(String),
}

impl Instr {
    /// Operands a memory-legality check must look at.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Instr::Mov(s, d) | Instr::Alu(_, s, d) => vec![s, d],
            Instr::Idiv(o) | Instr::Push(o) | Instr::Pop(o) => vec![o],
            Instr::Cltd | Instr::Set(..) | Instr::Call(_) | Instr::Ret | Instr::Meta(_) => {
                Vec::new()
            }
        }
    }

    /// True if more than one operand resides in memory.
    pub fn is_memory_to_memory(&self) -> bool {
        self.operands().iter().filter(|o| o.in_memory()).count() > 1
    }
}

// ─── Tests ────────────────────────────────────────────────────────
