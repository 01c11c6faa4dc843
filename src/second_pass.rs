//! Second pass: re-parses the intermediate source, resolving operands and
//! encoding instructions into the final memory word stream.
//!
//! Accumulates a `Vec<u16>` in memory — code words followed by data words,
//! addressed exactly as the first pass left them — rather than streaming
//! through a temporary object file.

use crate::context::AssemblyContext;
use crate::encode;
use crate::error::{AssemblyError, ErrorCategory};
use crate::lexer;
use crate::opcode_table;

fn data_words(operands: &str) -> Vec<u16> {
    operands
        .split(',')
        .map(|tok| {
            let value: i32 = tok.trim().parse().unwrap_or(0);
            (value as u16) & 0x7FFF
        })
        .collect()
}

fn string_words(operands: &str) -> Vec<u16> {
    let contents = lexer::string_contents(operands.trim());
    let mut words: Vec<u16> = contents.bytes().map(|b| b as u16).collect();
    words.push(0);
    words
}

/// The final, fully-encoded memory image: code words followed by data
/// words, in the order they'll be written to the `.ob` file.
pub struct MemoryImage {
    pub words: Vec<u16>,
}

/// Run the second pass over `intermediate`, the same macro-expanded text the
/// first pass consumed. `ctx` must already hold the symbol table and final
/// IC/DC produced by the first pass. Returns the encoded memory image, or
/// `None` if any error was logged.
pub fn run(intermediate: &str, ctx: &mut AssemblyContext) -> Option<MemoryImage> {
    let filename = ctx.filename.clone();
    let mut code_words: Vec<u16> = Vec::new();
    let mut data_words_acc: Vec<u16> = Vec::new();
    let mut address = crate::context::FIRST_ADDRESS;
    let mut had_error = false;

    for (line_index, raw) in intermediate.lines().enumerate() {
        let line_number = line_index + 1;
        let canonical = lexer::canonicalize(raw);
        if canonical.is_empty() {
            continue;
        }

        let (label, operation, operands) = lexer::split_line(&canonical);

        match operation {
            ".data" => {
                data_words_acc.extend(data_words(operands));
            }
            ".string" => {
                data_words_acc.extend(string_words(operands));
            }
            ".extern" => {
                // symbols already recorded in the first pass
            }
            ".entry" => {
                let name = operands.trim();
                if name.is_empty() {
                    ctx.errors.push(AssemblyError::new(
                        ErrorCategory::Syntax,
                        "missing operand for .entry directive",
                        &filename,
                        Some(line_number),
                    ));
                    had_error = true;
                    continue;
                }
                match ctx.symbols.promote_to_entry(name) {
                    Ok(true) => {}
                    Ok(false) => {
                        ctx.errors.push(AssemblyError::new(
                            ErrorCategory::Symbol,
                            "entry symbol not found in symbol table",
                            &filename,
                            Some(line_number),
                        ));
                        had_error = true;
                    }
                    Err(()) => {
                        ctx.errors.push(AssemblyError::new(
                            ErrorCategory::Symbol,
                            "symbol declared as both .extern and .entry",
                            &filename,
                            Some(line_number),
                        ));
                        had_error = true;
                    }
                }
            }
            op if opcode_table::is_mnemonic(op) => {
                match encode::encode_instruction(op, operands, &ctx.symbols, &mut ctx.externals, address) {
                    Ok(encoded) => {
                        address += encoded.words.len() as u16;
                        code_words.extend(encoded.words);
                    }
                    Err(encode::EncodeError::ExternalReferenceOverflow) => {
                        ctx.errors.push(AssemblyError::new(
                            ErrorCategory::Overflow,
                            "external symbol referenced more than 100 times",
                            &filename,
                            Some(line_number),
                        ));
                        had_error = true;
                    }
                    Err(encode::EncodeError::UnresolvedSymbol) => {
                        ctx.errors.push(AssemblyError::new(
                            ErrorCategory::Syntax,
                            "failed to encode instruction",
                            &filename,
                            Some(line_number),
                        ));
                        had_error = true;
                    }
                }
            }
            _ => {
                // labels with no operation, or already-reported first-pass
                // errors; nothing further to encode here.
                let _ = label;
            }
        }
    }

    if had_error {
        None
    } else {
        let mut words = code_words;
        words.extend(data_words_acc);
        Some(MemoryImage { words })
    }
}
