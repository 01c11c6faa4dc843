//! Operand parsing, instruction sizing, and instruction-word encoding.
//!
//! One pure function per encoding concern: addressing-mode classification,
//! instruction length, and word assembly are each composed by the
//! dispatcher in [`encode_instruction`].

use crate::addressing::{AddressingMode, Are, Operand};
use crate::lexer;
use crate::opcode_table;
use crate::symbol::{SymbolKind, SymbolTable};

/// Split an instruction's operand field on the first comma into
/// `(source, target)`. If only one operand is present it is the target;
/// the source slot is then absent.
pub fn split_operands(operands: &str) -> (&str, &str) {
    let operands = operands.trim();
    match operands.split_once(',') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => ("", operands),
    }
}

/// Anything left over after the first comma, when there is a third
/// comma-delimited segment — a `Syntax` error.
pub fn has_extra_operand_segment(operands: &str) -> bool {
    let operands = operands.trim();
    match operands.split_once(',') {
        Some((_, rest)) => rest.contains(','),
        None => false,
    }
}

/// Classify a single operand token's addressing mode. An empty (or
/// whitespace-only) token means the operand slot is absent.
pub fn addressing_mode_of(token: &str) -> Operand {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.starts_with('#') && lexer::is_number(token) {
        return Some(AddressingMode::Immediate);
    }
    if token.starts_with('r') && lexer::is_register(token) {
        return Some(AddressingMode::DirectRegister);
    }
    if let Some(rest) = token.strip_prefix("*r") {
        if lexer::is_register(&format!("r{}", rest)) {
            return Some(AddressingMode::IndirectRegister);
        }
    }
    Some(AddressingMode::Direct)
}

/// Length, in words, of an instruction line. Returns `None` if the operand
/// count doesn't match the mnemonic's arity (a `Syntax` error for the
/// caller to log).
pub fn instruction_length(mnemonic: &str, operands: &str) -> Option<u16> {
    let entry = opcode_table::lookup(mnemonic)?;
    if has_extra_operand_segment(operands) {
        return None;
    }

    let (source, target) = split_operands(operands);
    let source_mode = addressing_mode_of(source);
    let target_mode = addressing_mode_of(target);

    let operand_count = source_mode.is_some() as u8 + target_mode.is_some() as u8;
    if operand_count != entry.arity {
        return None;
    }

    let length = match (source_mode, target_mode) {
        (Some(s), Some(t)) if s.is_register() && t.is_register() => 2,
        _ => 1 + operand_count as u16,
    };
    Some(length)
}

/// Count comma-separated values in a `.data` directive's operand field.
/// Returns `None` for an empty or malformed (e.g. trailing comma) list.
pub fn count_data_values(operands: &str) -> Option<usize> {
    let operands = operands.trim();
    if operands.is_empty() {
        return None;
    }
    let mut count = 0;
    for part in operands.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        count += 1;
    }
    Some(count)
}

/// One fully-encoded instruction: the base word plus up to one extra word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInstruction {
    pub words: Vec<u16>,
}

/// Result of resolving a single operand against the symbol table: its
/// value bits and A.R.E. tag, or a recorded external reference.
struct ResolvedOperand {
    value: u16,
    are: Are,
}

/// Error produced while encoding one instruction — halts assembly of this
/// file. Kept as a small enum (rather than a single unit struct) so the
/// caller can log the right [`crate::error::ErrorCategory`]: an unresolved
/// symbol is `Syntax`, but exceeding the per-external reference bound is
/// `Overflow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    UnresolvedSymbol,
    ExternalReferenceOverflow,
}

fn resolve_operand(
    token: &str,
    mode: AddressingMode,
    symbols: &SymbolTable,
) -> Result<(ResolvedOperand, Option<&'static str>), EncodeError> {
    match mode {
        AddressingMode::Immediate => {
            let value: i32 = token
                .trim_start_matches('#')
                .parse()
                .map_err(|_| EncodeError::UnresolvedSymbol)?;
            Ok((ResolvedOperand { value: (value as u16) & 0xFFF, are: Are::Absolute }, None))
        }
        AddressingMode::Direct => match symbols.get(token) {
            None => Err(EncodeError::UnresolvedSymbol),
            Some(symbol) if symbol.kind == SymbolKind::External => {
                Ok((ResolvedOperand { value: 0, are: Are::External }, Some("external")))
            }
            Some(symbol) => Ok((ResolvedOperand { value: symbol.address & 0xFFF, are: Are::Relocatable }, None)),
        },
        AddressingMode::IndirectRegister => {
            let reg = lexer::register_number(&token[1..]).ok_or(EncodeError::UnresolvedSymbol)?;
            Ok((ResolvedOperand { value: (reg as u16) & 0x7, are: Are::Absolute }, None))
        }
        AddressingMode::DirectRegister => {
            let reg = lexer::register_number(token).ok_or(EncodeError::UnresolvedSymbol)?;
            Ok((ResolvedOperand { value: (reg as u16) & 0x7, are: Are::Absolute }, None))
        }
    }
}

/// Encode one instruction at `address`, resolving symbolic operands against
/// `symbols`. On an external Direct-mode reference, records the reference
/// address into `externals` — `address + 1` for the first extra word
/// emitted, `address + 2` for the second, matching emission order rather
/// than logical source/target slot (a lone target operand is still the
/// first extra word).
pub fn encode_instruction(
    mnemonic: &str,
    operands: &str,
    symbols: &SymbolTable,
    externals: &mut crate::symbol::ExternalTable,
    address: u16,
) -> Result<EncodedInstruction, EncodeError> {
    let entry = opcode_table::lookup(mnemonic).ok_or(EncodeError::UnresolvedSymbol)?;
    let (source_tok, target_tok) = split_operands(operands);
    let source_mode = addressing_mode_of(source_tok);
    let target_mode = addressing_mode_of(target_tok);

    let mut first_word: u16 = (entry.opcode as u16) << 11;
    if let Some(mode) = source_mode {
        first_word |= 1 << (7 + mode.bit_index());
    }
    if let Some(mode) = target_mode {
        first_word |= 1 << (3 + mode.bit_index());
    }
    first_word |= Are::Absolute.bits();

    let mut words = vec![first_word];

    let both_registers = matches!(
        (source_mode, target_mode),
        (Some(s), Some(t)) if s.is_register() && t.is_register()
    );

    if both_registers {
        let (src, _) = resolve_operand(source_tok, source_mode.unwrap(), symbols)?;
        let (tgt, _) = resolve_operand(target_tok, target_mode.unwrap(), symbols)?;
        words.push(((src.value & 0x7) << 6) | ((tgt.value & 0x7) << 3) | Are::Absolute.bits());
    } else {
        // Extra words are emitted source-first, so a word's recorded
        // external-reference address is its emission position relative to
        // the instruction word — +1 for the first extra word, +2 for the
        // second — not fixed per logical slot. A lone target operand (no
        // source) is still the first extra word, hence +1.
        let mut next_offset: u16 = 1;
        if let Some(mode) = source_mode {
            let (resolved, external) = resolve_operand(source_tok, mode, symbols)?;
            if let Some(_name) = external {
                externals
                    .add_reference(source_tok, address + next_offset)
                    .map_err(|_| EncodeError::ExternalReferenceOverflow)?;
                words.push(Are::External.bits());
            } else {
                words.push(operand_word(mode, resolved));
            }
            next_offset += 1;
        }
        if let Some(mode) = target_mode {
            let (resolved, external) = resolve_operand(target_tok, mode, symbols)?;
            if let Some(_name) = external {
                externals
                    .add_reference(target_tok, address + next_offset)
                    .map_err(|_| EncodeError::ExternalReferenceOverflow)?;
                words.push(Are::External.bits());
            } else {
                words.push(operand_word(mode, resolved));
            }
        }
    }

    Ok(EncodedInstruction { words })
}

fn operand_word(mode: AddressingMode, resolved: ResolvedOperand) -> u16 {
    match mode {
        AddressingMode::Immediate | AddressingMode::Direct => {
            ((resolved.value & 0xFFF) << 3) | resolved.are.bits()
        }
        AddressingMode::IndirectRegister | AddressingMode::DirectRegister => {
            ((resolved.value & 0x7) << 6) | Are::Absolute.bits()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::symbol::ExternalTable;

    #[test]
    fn splits_on_first_comma() {
        assert_eq!(split_operands("LEN,r1"), ("LEN", "r1"));
        assert_eq!(split_operands("r1"), ("", "r1"));
        assert_eq!(split_operands(""), ("", ""));
    }

    #[test]
    fn addressing_modes_classify_correctly() {
        assert_eq!(addressing_mode_of("#3"), Some(AddressingMode::Immediate));
        assert_eq!(addressing_mode_of("r2"), Some(AddressingMode::DirectRegister));
        assert_eq!(addressing_mode_of("*r2"), Some(AddressingMode::IndirectRegister));
        assert_eq!(addressing_mode_of("LABEL"), Some(AddressingMode::Direct));
        assert_eq!(addressing_mode_of(""), None);
    }

    #[test]
    fn instruction_length_pairs_register_operands() {
        assert_eq!(instruction_length("add", "r1,r2"), Some(2));
        assert_eq!(instruction_length("mov", "#3,r2"), Some(3));
        assert_eq!(instruction_length("stop", ""), Some(1));
        assert_eq!(instruction_length("clr", "r1"), Some(2));
    }

    #[test]
    fn instruction_length_rejects_arity_mismatch() {
        assert_eq!(instruction_length("stop", "r1"), None);
        assert_eq!(instruction_length("mov", "r1"), None);
    }

    #[test]
    fn data_value_counting() {
        assert_eq!(count_data_values("5,-1"), Some(2));
        assert_eq!(count_data_values("5"), Some(1));
        assert_eq!(count_data_values(""), None);
        assert_eq!(count_data_values("5,"), None);
    }

    #[test]
    fn empty_program_stop_encodes_to_spec_word() {
        let symbols = SymbolTable::new();
        let mut ext = ExternalTable::new();
        let encoded = encode_instruction("stop", "", &symbols, &mut ext, 100).unwrap();
        assert_eq!(encoded.words, vec![0o74004]);
    }

    #[test]
    fn two_register_instruction_shares_one_word() {
        let symbols = SymbolTable::new();
        let mut ext = ExternalTable::new();
        let encoded = encode_instruction("add", "r1,r2", &symbols, &mut ext, 100).unwrap();
        assert_eq!(encoded.words.len(), 2);
        assert_eq!(encoded.words[1], (1 << 6) | (2 << 3) | 4);
    }

    #[test]
    fn lone_target_external_reference_recorded_at_address_plus_one() {
        // jmp EXT has no source operand, so the external word is the first
        // (and only) extra word, at address+1 (`.ext` line `EXT 0101` for a
        // `jmp` at 0100).
        let mut symbols = SymbolTable::new();
        symbols.insert("EXT", 0, SymbolKind::External, "f.as", 1).unwrap();
        let mut ext = ExternalTable::new();
        let encoded = encode_instruction("jmp", "EXT", &symbols, &mut ext, 100).unwrap();
        assert_eq!(encoded.words[1], 0x001);
        let grouped: Vec<_> = ext.iter_grouped().collect();
        assert_eq!(grouped[0], ("EXT", &[101u16][..]));
    }

    #[test]
    fn source_and_target_externals_recorded_at_plus_one_and_plus_two() {
        let mut symbols = SymbolTable::new();
        symbols.insert("EXT1", 0, SymbolKind::External, "f.as", 1).unwrap();
        symbols.insert("EXT2", 0, SymbolKind::External, "f.as", 2).unwrap();
        let mut ext = ExternalTable::new();
        let encoded = encode_instruction("mov", "EXT1,EXT2", &symbols, &mut ext, 100).unwrap();
        assert_eq!(encoded.words.len(), 3);
        let grouped: Vec<_> = ext.iter_grouped().collect();
        assert_eq!(grouped[0], ("EXT1", &[101u16][..]));
        assert_eq!(grouped[1], ("EXT2", &[102u16][..]));
    }

    #[test]
    fn direct_mode_internal_symbol_is_relocatable() {
        let mut symbols = SymbolTable::new();
        symbols.insert("LEN", 103, SymbolKind::Data, "f.as", 1).unwrap();
        let mut ext = ExternalTable::new();
        let encoded = encode_instruction("mov", "LEN,r1", &symbols, &mut ext, 100).unwrap();
        assert_eq!(encoded.words[1], (103 << 3) | 2);
    }

    #[test]
    fn unknown_direct_symbol_is_an_encode_error() {
        let symbols = SymbolTable::new();
        let mut ext = ExternalTable::new();
        assert!(encode_instruction("jmp", "NOPE", &symbols, &mut ext, 100).is_err());
    }
}
