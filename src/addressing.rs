//! Addressing modes, A.R.E. classification and register identifiers.
//!
//! Modeled as tagged enums rather than raw `0..4` integers.

use std::fmt;

/// One of the four addressing modes a single operand can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// `#number` — the operand value is used directly.
    Immediate,
    /// `label` — a symbolic reference resolved against the symbol table.
    Direct,
    /// `*r0`..`*r7` — the register holds the address of the value.
    IndirectRegister,
    /// `r0`..`r7` — the register holds the value directly.
    DirectRegister,
}

impl AddressingMode {
    /// The `0..3` encoding used in the instruction word's mode bitmask.
    pub fn bit_index(self) -> u8 {
        match self {
            AddressingMode::Immediate => 0,
            AddressingMode::Direct => 1,
            AddressingMode::IndirectRegister => 2,
            AddressingMode::DirectRegister => 3,
        }
    }

    /// Whether this mode is one of the two register modes, which share a
    /// single additional word when both operands use them.
    pub fn is_register(self) -> bool {
        matches!(
            self,
            AddressingMode::IndirectRegister | AddressingMode::DirectRegister
        )
    }
}

/// An operand slot: either present with a concrete addressing mode, or
/// absent (no operand in this position of the instruction).
pub type Operand = Option<AddressingMode>;

/// Absolute / Relocatable / External — the 3-bit relocation tag carried by
/// every emitted operand word. Mapped to its bit value only at emission
/// time, never stored as a raw integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Are {
    Absolute,
    Relocatable,
    External,
}

impl Are {
    /// The 3-bit value written into bits 2..0 of an emitted word.
    pub fn bits(self) -> u16 {
        match self {
            Are::Absolute => 4,
            Are::Relocatable => 2,
            Are::External => 1,
        }
    }
}

/// One of the 8 general-purpose registers, `r0`..`r7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(u8);

impl Register {
    /// Build a register from its number (0..7). Returns `None` out of range.
    pub fn new(number: u8) -> Option<Register> {
        if number <= 7 { Some(Register(number)) } else { None }
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
