//! Per-file assembly pipeline and multi-file batch runner.
//!
//! Each filename is given the `.as` extension and processed independently
//! of the others — an error in one file never aborts the batch — and a
//! single combined error summary is printed once the whole batch finishes.

use crate::context::AssemblyContext;
use crate::emitter;
use crate::error::{AssemblyError, ErrorCategory, ErrorLog};
use crate::first_pass;
use crate::logging;
use crate::macros::{self, MacroTable};
use crate::second_pass;
use std::fs;
use std::path::Path;

/// Outcome of assembling a single file.
pub enum FileOutcome {
    Assembled,
    /// The file failed somewhere past opening it (preprocessor, first pass,
    /// second pass, or output writing).
    Failed,
    /// The source file itself could not be opened — distinguished from
    /// [`FileOutcome::Failed`] because the driver's exit code depends on
    /// whether at least one supplied file could be opened at all.
    OpenFailed,
}

/// Assemble one file, given without its `.as` extension. Writes `<name>.ob`
/// always, `<name>.ent`/`<name>.ext` when entry/external symbols exist.
/// Errors are appended to `errors` rather than returned, so the caller can
/// keep a single running summary across a batch.
pub fn assemble_file(base_name: &str, errors: &mut ErrorLog) -> FileOutcome {
    let source_path = format!("{}.as", base_name);

    let source = match fs::read_to_string(&source_path) {
        Ok(text) => text,
        Err(_) => {
            errors.push(AssemblyError::new(
                ErrorCategory::FileInput,
                "cannot open file (make sure it ends with .as)",
                &source_path,
                None,
            ));
            return FileOutcome::OpenFailed;
        }
    };

    let mut preprocess_errors = ErrorLog::new();
    let (expanded, macro_table) = match macros::preprocess(&source, &source_path, &mut preprocess_errors) {
        Some(result) => result,
        None => {
            errors.extend(preprocess_errors);
            errors.push(AssemblyError::new(
                ErrorCategory::FileInput,
                "preprocessor failed",
                &source_path,
                None,
            ));
            return FileOutcome::Failed;
        }
    };
    errors.extend(preprocess_errors);
    logging::notice(&format!("preprocessor done for file: {}", source_path));

    let mut ctx = AssemblyContext::new(source_path.clone(), macro_table);
    if !first_pass::run(&expanded, &mut ctx) {
        errors.extend(ctx.errors);
        errors.push(AssemblyError::new(
            ErrorCategory::Semantic,
            "first pass failed",
            &source_path,
            None,
        ));
        return FileOutcome::Failed;
    }

    let image = match second_pass::run(&expanded, &mut ctx) {
        Some(image) => image,
        None => {
            errors.extend(ctx.errors);
            errors.push(AssemblyError::new(
                ErrorCategory::Semantic,
                "second pass failed",
                &source_path,
                None,
            ));
            return FileOutcome::Failed;
        }
    };
    logging::notice(&format!("first and second pass are done for file: {}", source_path));

    if let Err(write_err) = write_outputs(base_name, &ctx, &image) {
        errors.push(AssemblyError::new(
            ErrorCategory::FileOutput,
            write_err,
            &source_path,
            None,
        ));
        errors.extend(ctx.errors);
        return FileOutcome::Failed;
    }

    errors.extend(ctx.errors);
    FileOutcome::Assembled
}

fn write_outputs(base_name: &str, ctx: &AssemblyContext, image: &second_pass::MemoryImage) -> Result<(), String> {
    let object = emitter::render_object(&image.words, ctx.ic_code(), ctx.dc);
    fs::write(format!("{}.ob", base_name), object).map_err(|e| e.to_string())?;

    if let Some(entries) = emitter::render_entries(&ctx.symbols) {
        fs::write(format!("{}.ent", base_name), entries).map_err(|e| e.to_string())?;
    }
    if let Some(externals) = emitter::render_externals(&ctx.externals) {
        fs::write(format!("{}.ext", base_name), externals).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Assemble a batch of files (base names, with or without a trailing
/// `.as`), printing progress notices per file and a combined error summary
/// at the end. Returns `1` if no file name was given at all, or if none of
/// the supplied files could even be opened; `0` otherwise — an assembly
/// failure (syntax/symbol/etc. errors) on an openable file still exits 0 —
/// normal completion, even if some files failed.
pub fn run(file_args: &[String]) -> i32 {
    if file_args.is_empty() {
        let mut errors = ErrorLog::new();
        errors.push(AssemblyError::new(
            ErrorCategory::FileInput,
            "no input files provided",
            "main",
            None,
        ));
        logging::print_error_summary(&errors);
        return 1;
    }

    let mut errors = ErrorLog::new();
    let mut any_opened = false;
    for arg in file_args {
        let base_name = strip_as_extension(arg);
        if !matches!(assemble_file(base_name, &mut errors), FileOutcome::OpenFailed) {
            any_opened = true;
        }
    }

    logging::print_error_summary(&errors);
    if any_opened { 0 } else { 1 }
}

fn strip_as_extension(arg: &str) -> &str {
    Path::new(arg)
        .to_str()
        .unwrap()
        .strip_suffix(".as")
        .unwrap_or(arg)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_trailing_as_extension() {
        assert_eq!(strip_as_extension("prog.as"), "prog");
        assert_eq!(strip_as_extension("prog"), "prog");
    }

    #[test]
    fn empty_batch_returns_error_exit_code() {
        assert_eq!(run(&[]), 1);
    }

    #[test]
    fn missing_file_is_logged_as_file_input_error() {
        let mut errors = ErrorLog::new();
        let outcome = assemble_file("/nonexistent/path/does-not-exist", &mut errors);
        assert!(matches!(outcome, FileOutcome::OpenFailed));
        assert!(errors.iter().any(|e| e.category == ErrorCategory::FileInput));
    }

    #[test]
    fn batch_with_only_unopenable_files_exits_with_error_code() {
        assert_eq!(run(&["/nonexistent/path/does-not-exist".to_string()]), 1);
    }
}
