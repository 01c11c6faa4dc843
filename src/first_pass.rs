//! First pass: symbol resolution and sizing.
//!
//! Iterates the intermediate source line by line, builds the symbol table,
//! and computes code/data addresses.

use crate::context::AssemblyContext;
use crate::encode;
use crate::error::{AssemblyError, ErrorCategory};
use crate::lexer;
use crate::opcode_table;
use crate::symbol::SymbolKind;

/// Run the first pass over `intermediate` (the macro-expanded source).
/// Populates `ctx`'s symbol table and counters. Returns `true` if no error
/// was logged, meaning the second pass may run.
pub fn run(intermediate: &str, ctx: &mut AssemblyContext) -> bool {
    let filename = ctx.filename.clone();
    let mut had_error = false;

    for (line_index, raw) in intermediate.lines().enumerate() {
        let line_number = line_index + 1;
        let canonical = lexer::canonicalize(raw);
        if canonical.is_empty() {
            continue;
        }
        if !lexer::is_line_length_ok(&canonical) {
            ctx.errors.push(AssemblyError::new(
                ErrorCategory::Syntax,
                "line exceeds maximum length",
                &filename,
                Some(line_number),
            ));
            had_error = true;
            continue;
        }

        let (raw_label, operation, operands) = lexer::split_line(&canonical);

        let label = match raw_label {
            Some(raw_label) => {
                if !lexer::is_label(raw_label) {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Syntax,
                        "illegal label",
                        &filename,
                        Some(line_number),
                    ));
                    had_error = true;
                    continue;
                }
                if ctx.macros.contains(raw_label) {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Symbol,
                        "symbol name conflicts with macro name",
                        &filename,
                        Some(line_number),
                    ));
                    had_error = true;
                    continue;
                }
                Some(raw_label)
            }
            None => None,
        };

        if lexer::is_directive(operation) {
            if !handle_directive(operation, operands, label, ctx, line_number) {
                had_error = true;
            }
        } else if opcode_table::is_mnemonic(operation) {
            match encode::instruction_length(operation, operands) {
                None => {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Syntax,
                        "invalid instruction format",
                        &filename,
                        Some(line_number),
                    ));
                    had_error = true;
                }
                Some(length) => {
                    if let Some(label) = label {
                        if ctx
                            .symbols
                            .insert(label, ctx.ic, SymbolKind::Code, &filename, line_number)
                            .is_err()
                        {
                            ctx.errors.push(AssemblyError::new(
                                ErrorCategory::Symbol,
                                "duplicate symbol definition",
                                &filename,
                                Some(line_number),
                            ));
                            had_error = true;
                        }
                    }
                    ctx.ic += length;
                }
            }
        } else {
            ctx.errors.push(AssemblyError::new(
                ErrorCategory::Syntax,
                "unknown operation",
                &filename,
                Some(line_number),
            ));
            had_error = true;
        }
    }

    let ic_final = ctx.ic;
    ctx.symbols.backpatch_data_addresses(ic_final);
    ctx.free_macro_table();

    !had_error
}

fn handle_directive(
    operation: &str,
    operands: &str,
    label: Option<&str>,
    ctx: &mut AssemblyContext,
    line_number: usize,
) -> bool {
    let filename = ctx.filename.clone();
    match operation {
        ".data" => {
            if let Some(label) = label {
                if ctx
                    .symbols
                    .insert(label, ctx.dc, SymbolKind::Data, &filename, line_number)
                    .is_err()
                {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Symbol,
                        "duplicate symbol definition",
                        &filename,
                        Some(line_number),
                    ));
                    return false;
                }
            }
            match encode::count_data_values(operands) {
                None => {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Syntax,
                        "invalid .data directive",
                        &filename,
                        Some(line_number),
                    ));
                    false
                }
                Some(count) => {
                    ctx.dc += count as u16;
                    true
                }
            }
        }
        ".string" => {
            if let Some(label) = label {
                if ctx
                    .symbols
                    .insert(label, ctx.dc, SymbolKind::Data, &filename, line_number)
                    .is_err()
                {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Symbol,
                        "duplicate symbol definition",
                        &filename,
                        Some(line_number),
                    ));
                    return false;
                }
            }
            if !lexer::validate_string(operands) {
                ctx.errors.push(AssemblyError::new(
                    ErrorCategory::Syntax,
                    "invalid .string directive",
                    &filename,
                    Some(line_number),
                ));
                false
            } else {
                ctx.dc += lexer::string_contents(operands).len() as u16 + 1;
                true
            }
        }
        ".entry" => {
            // label, if any, is ignored here; entry designation happens in
            // pass two (see DESIGN.md).
            true
        }
        ".extern" => {
            let operands = operands.trim();
            if operands.is_empty() {
                ctx.errors.push(AssemblyError::new(
                    ErrorCategory::Syntax,
                    "missing operand for .extern directive",
                    &filename,
                    Some(line_number),
                ));
                return false;
            }
            let mut ok = true;
            for name in operands.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()) {
                if ctx.symbols.insert(name, 0, SymbolKind::External, &filename, line_number).is_err() {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Symbol,
                        "duplicate external symbol definition",
                        &filename,
                        Some(line_number),
                    ));
                    ok = false;
                }
            }
            ok
        }
        _ => unreachable!("handle_directive called with a non-directive token"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::macros::MacroTable;

    fn run_source(source: &str) -> AssemblyContext {
        let mut ctx = AssemblyContext::new("f.as", MacroTable::new());
        run(source, &mut ctx);
        ctx
    }

    #[test]
    fn empty_program_sizes_to_one_word() {
        let ctx = run_source("stop\n");
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.ic_code(), 1);
        assert_eq!(ctx.dc, 0);
    }

    #[test]
    fn data_symbol_is_backpatched_after_ic_freezes() {
        // mov LEN,r1 occupies 3 words (100..102), stop occupies 1 more
        // (103), so IC freezes at 104 and LEN (DC-relative 0) backpatches
        // to 100 + 4 = 104.
        let ctx = run_source("LEN: .data 5,-1\nmain: mov LEN,r1\nstop\n");
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.symbols.get("main").unwrap().address, 100);
        assert_eq!(ctx.symbols.get("LEN").unwrap().address, 104);
        assert_eq!(ctx.ic_code(), 4);
        assert_eq!(ctx.dc, 2);
    }

    #[test]
    fn extern_symbols_land_at_address_zero() {
        let ctx = run_source(".extern EXT\njmp EXT\nstop\n");
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.symbols.get("EXT").unwrap().address, 0);
    }

    #[test]
    fn duplicate_symbol_is_rejected() {
        let ctx = run_source("main: stop\nmain: stop\n");
        assert!(!ctx.errors.is_empty());
        assert_eq!(ctx.errors.iter().next().unwrap().category, ErrorCategory::Symbol);
    }

    #[test]
    fn unknown_operation_is_syntax_error() {
        let ctx = run_source("bogus r1,r2\n");
        assert_eq!(ctx.errors.iter().next().unwrap().category, ErrorCategory::Syntax);
    }

    #[test]
    fn illegal_label_is_syntax_error() {
        let ctx = run_source("1bad: stop\n");
        assert_eq!(ctx.errors.iter().next().unwrap().category, ErrorCategory::Syntax);
    }

    #[test]
    fn empty_string_directive_counts_only_terminator() {
        let ctx = run_source("S: .string \"\"\nstop\n");
        assert!(ctx.errors.is_empty());
        assert_eq!(ctx.dc, 1);
    }

    #[test]
    fn label_colliding_with_macro_name_is_rejected() {
        let mut ctx = AssemblyContext::new("f.as", MacroTable::new());
        // simulate a macro named GREET surviving from the preprocessor
        let source = "macr GREET\nstop\nendmacr\nGREET: stop\n";
        let mut errors = crate::error::ErrorLog::new();
        let (expanded, table) = crate::macros::preprocess(source, "f.as", &mut errors).unwrap();
        ctx.macros = table;
        run(&expanded, &mut ctx);
        assert!(ctx.errors.iter().any(|e| e.category == ErrorCategory::Symbol));
    }
}
