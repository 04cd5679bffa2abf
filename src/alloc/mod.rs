//! Allocation environment: a symbolic mirror of the IR evaluation stack.
//!
//! Every entry of the symbolic stack is the location chosen for one
//! pending IR value. Locations are handed out by a greedy, stack-shaped
//! rule driven only by the current top: registers are used bottom-up,
//! then frame slots with increasing index. The environment is threaded
//! by value; each operation consumes it and returns the successor.


use std::fmt;

use crate::asm::{Operand, Reg, GLOBAL_PREFIX, MAX_ALLOCATABLE};

/// Pop on a symbolic stack that is too shallow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackUnderflow {
    pub needed: usize,
    pub depth: usize,
}

impl fmt::Display for StackUnderflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stack underflow: needs {} value{}, stack holds {}",
            self.needed,
            if self.needed == 1 { "" } else { "s" },
            self.depth
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Env {
    /// Pending values, bottom first.
    stack: Vec<Operand>,
    /// Most frame slots ever required at once.
    high_water: u32,
    /// Referenced globals in discovery order.
    globals: Vec<String>,
    /// Registers `Reg(0)..Reg(allocatable)` may hold values.
    allocatable: u8,
}

impl Env {
    /// Empty environment allocating from the first `allocatable` registers,
    /// clamped to 1..=MAX_ALLOCATABLE.
    pub fn new(allocatable: u8) -> Self {
        Self {
            stack: Vec::new(),
            high_water: 0,
            globals: Vec::new(),
            allocatable: allocatable.clamp(1, MAX_ALLOCATABLE),
        }
    }

    /// Choose the location for the next value without pushing it.
    pub fn allocate(mut self) -> (Operand, Env) {
        let loc = match self.stack.last() {
            None => Operand::Register(Reg(0)),
            Some(Operand::StackSlot(n)) => Operand::StackSlot(n + 1),
            Some(Operand::Register(Reg(n))) if n + 1 < self.allocatable => {
                Operand::Register(Reg(n + 1))
            }
            Some(_) => Operand::StackSlot(0),
        };
        if let Operand::StackSlot(k) = loc {
            if k + 1 > self.high_water {
                log::debug!("spill: frame grows to {} slot(s)", k + 1);
                self.high_water = k + 1;
            }
        }
        (loc, self)
    }

    pub fn push(mut self, operand: Operand) -> Env {
        self.stack.push(operand);
        self
    }

    pub fn pop(mut self) -> Result<(Operand, Env), StackUnderflow> {
        match self.stack.pop() {
            Some(top) => Ok((top, self)),
            None => Err(StackUnderflow {
                needed: 1,
                depth: 0,
            }),
        }
    }

    /// Pop the top two values, top first.
    pub fn pop2(mut self) -> Result<(Operand, Operand, Env), StackUnderflow> {
        let depth = self.stack.len();
        if depth < 2 {
            return Err(StackUnderflow { needed: 2, depth });
        }
        let mut pair = self.stack.split_off(depth - 2);
        let (top, second) = match (pair.pop(), pair.pop()) {
            (Some(top), Some(second)) => (top, second),
            _ => return Err(StackUnderflow { needed: 2, depth }),
        };
        Ok((top, second, self))
    }

    pub fn add_global(mut self, name: &str) -> Env {
        if !self.globals.iter().any(|g| g == name) {
            self.globals.push(name.to_string());
        }
        self
    }

    /// Data-section location of a global.
    pub fn location_of(name: &str) -> Operand {
        Operand::Memory(format!("{}{}", GLOBAL_PREFIX, name))
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    /// Frame size in slots.
    pub fn frame_size(&self) -> u32 {
        self.high_water
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Pending locations, bottom first.
    pub fn stack(&self) -> &[Operand] {
        &self.stack
    }

    pub fn allocatable(&self) -> u8 {
        self.allocatable
    }

    /// Registers currently holding pending values, in stack order.
    pub fn live_registers(&self) -> impl Iterator<Item = Reg> + '_ {
        self.stack.iter().filter_map(Operand::as_register)
    }
}
