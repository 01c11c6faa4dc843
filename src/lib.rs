//! A two-pass assembler for a 15-bit, word-addressed pedagogical machine,
//! featuring:
//! - a single-pass macro preprocessor
//! - symbol resolution across code, data, entry and external references
//! - instruction encoding across four addressing modes
//! - object/entry/external file generation

pub mod addressing;
pub mod context;
pub mod driver;
pub mod emitter;
pub mod encode;
pub mod error;
pub mod first_pass;
pub mod lexer;
pub mod logging;
pub mod macros;
pub mod opcode_table;
pub mod second_pass;
pub mod symbol;
