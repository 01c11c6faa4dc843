//! Per-file assembly context: one owned, explicitly-threaded value holding
//! the counters, tables, and error log for a single file's pipeline, rather
//! than process-wide mutable state.

use crate::error::ErrorLog;
use crate::macros::MacroTable;
use crate::symbol::{ExternalTable, SymbolTable};

/// First address assigned to code.
pub const FIRST_ADDRESS: u16 = 100;

/// Everything one file's assembly pipeline needs: counters, tables, and the
/// error log, all owned for the lifetime of that file's run and released
/// when the pipeline for that file exits.
pub struct AssemblyContext {
    pub filename: String,
    pub macros: MacroTable,
    pub symbols: SymbolTable,
    pub externals: ExternalTable,
    pub errors: ErrorLog,
    pub ic: u16,
    pub dc: u16,
}

impl AssemblyContext {
    pub fn new(filename: impl Into<String>, macros: MacroTable) -> AssemblyContext {
        AssemblyContext {
            filename: filename.into(),
            macros,
            symbols: SymbolTable::new(),
            externals: ExternalTable::new(),
            errors: ErrorLog::new(),
            ic: FIRST_ADDRESS,
            dc: 0,
        }
    }

    /// Drop the macro table once the first pass no longer needs it for
    /// name-disjointness checks — freed after the first pass, not before.
    pub fn free_macro_table(&mut self) {
        self.macros = MacroTable::new();
    }

    /// Number of code words, i.e. `IC_final - FIRST_ADDRESS`.
    pub fn ic_code(&self) -> u16 {
        self.ic - FIRST_ADDRESS
    }
}
