//! Single-pass macro preprocessor.
//!
//! Expands `macr`/`endmacr` blocks into their captured body lines, emitting
//! a plain text transform as an owned `String`.

use crate::error::{AssemblyError, ErrorCategory, ErrorLog};
use crate::lexer;
use crate::opcode_table;

const RESERVED_WORDS: &[&str] = &["macr", "endmacr", "data", "string", "entry", "extern"];

/// A named, captured block of source lines, re-emitted verbatim on
/// invocation.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub lines: Vec<String>,
}

/// The macro table built by the preprocessor. Retained past preprocessor
/// completion so the first pass can check symbol/macro name disjointness,
/// and freed when the first pass finishes.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable { macros: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

fn is_reserved_word(word: &str) -> bool {
    opcode_table::is_mnemonic(word) || lexer::is_register(word) || RESERVED_WORDS.contains(&word)
}

/// A macro name must start with a letter, contain only alphanumerics, and
/// not collide with a mnemonic, register, directive keyword or the `macr`/
/// `endmacr` keywords themselves.
fn is_valid_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    if !chars.all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    !is_reserved_word(name)
}

/// Expand all macro invocations in `source`, returning the intermediate
/// (`.am`-equivalent) text. Returns `None` if any `Macro` or `Syntax` error
/// was logged, halting the pipeline for this input.
pub fn preprocess(source: &str, filename: &str, errors: &mut ErrorLog) -> Option<(String, MacroTable)> {
    let mut table = MacroTable::new();
    let mut output = String::new();
    let mut had_error = false;

    let lines: Vec<&str> = source.lines().collect();
    let mut i = 0;
    let mut line_number = 0;

    while i < lines.len() {
        line_number += 1;
        let raw = lines[i];
        let canonical = lexer::canonicalize(raw);

        if !lexer::is_line_length_ok(&canonical) {
            errors.push(AssemblyError::new(
                ErrorCategory::Syntax,
                "line exceeds maximum length",
                filename,
                Some(line_number),
            ));
            had_error = true;
            i += 1;
            continue;
        }

        if let Some(rest) = canonical.strip_prefix("macr ").or_else(|| {
            if canonical == "macr" { Some("") } else { None }
        }) {
            let name = rest.trim();
            if name.is_empty() || !is_valid_macro_name(name) || table.contains(name) {
                errors.push(AssemblyError::new(
                    ErrorCategory::Macro,
                    if name.is_empty() || !is_valid_macro_name(name) {
                        "invalid macro name"
                    } else {
                        "macro redefinition"
                    },
                    filename,
                    Some(line_number),
                ));
                had_error = true;
                // Skip to the matching endmacr so a bad name doesn't also
                // spill the body into the output as ordinary lines.
                i += 1;
                while i < lines.len() && lexer::canonicalize(lines[i]) != "endmacr" {
                    i += 1;
                    line_number += 1;
                }
                i += 1;
                line_number += 1;
                continue;
            }

            let mut body = Vec::new();
            i += 1;
            while i < lines.len() {
                line_number += 1;
                if lexer::canonicalize(lines[i]) == "endmacr" {
                    break;
                }
                body.push(lines[i].to_string());
                i += 1;
            }
            table.macros.push(Macro { name: name.to_string(), lines: body });
            i += 1;
            continue;
        }

        if canonical == "endmacr" {
            // A stray `endmacr` with no open `macr` is ignored.
            i += 1;
            continue;
        }

        if let Some(m) = table.get(canonical.trim()) {
            for line in &m.lines {
                output.push_str(line);
                output.push('\n');
            }
        } else {
            output.push_str(raw);
            output.push('\n');
        }

        i += 1;
    }

    if had_error {
        None
    } else {
        Some((output, table))
    }
}
