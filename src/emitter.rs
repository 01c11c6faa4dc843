//! Object/entry/external file rendering.
//!
//! The object body is built as an in-memory word list during the second
//! pass and rendered here in one pass rather than staged through a
//! temporary file.

use crate::symbol::{ExternalTable, SymbolTable};

/// Render the `.ob` file body: a header line of `ic_code dc`, followed by
/// one `%04d %05o` line per memory word starting at address 100.
pub fn render_object(words: &[u16], ic_code: u16, dc: u16) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", ic_code, dc));
    for (offset, word) in words.iter().enumerate() {
        let address = 100 + offset as u16;
        out.push_str(&format!("{:04} {:05o}\n", address, word & 0x7FFF));
    }
    out
}

/// Render the `.ent` file body, one `name %04d` line per entry symbol, in
/// symbol-table order. Returns `None` if there are no entry symbols (the
/// caller should then not create the file at all).
pub fn render_entries(symbols: &SymbolTable) -> Option<String> {
    if !symbols.has_entries() {
        return None;
    }
    let mut out = String::new();
    for symbol in symbols.entries() {
        out.push_str(&format!("{} {:04}\n", symbol.name, symbol.address));
    }
    Some(out)
}

/// Render the `.ext` file body, one `name %04d` line per recorded reference,
/// grouped by external name in first-seen order. Returns `None` if no
/// external symbol was ever referenced.
pub fn render_externals(externals: &ExternalTable) -> Option<String> {
    if externals.is_empty() {
        return None;
    }
    let mut out = String::new();
    for (name, addresses) in externals.iter_grouped() {
        for address in addresses {
            out.push_str(&format!("{} {:04}\n", name, address));
        }
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::symbol::SymbolKind;

    #[test]
    fn object_header_and_word_lines() {
        let rendered = render_object(&[0o74004], 1, 0);
        assert_eq!(rendered, "1 0\n0100 74004\n");
    }

    #[test]
    fn object_addresses_start_at_100_and_increment() {
        let rendered = render_object(&[1, 2, 3], 3, 0);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "0100 00001");
        assert_eq!(lines[2], "0101 00002");
        assert_eq!(lines[3], "0102 00003");
    }

    #[test]
    fn no_entries_renders_none() {
        let symbols = SymbolTable::new();
        assert!(render_entries(&symbols).is_none());
    }

    #[test]
    fn entries_render_one_line_each() {
        let mut symbols = SymbolTable::new();
        symbols.insert("HELLO", 100, SymbolKind::Code, "f.as", 1).unwrap();
        symbols.promote_to_entry("HELLO").unwrap();
        let rendered = render_entries(&symbols).unwrap();
        assert_eq!(rendered, "HELLO 0100\n");
    }

    #[test]
    fn externals_group_by_name_in_first_seen_order() {
        let mut externals = ExternalTable::new();
        externals.add_reference("EXT", 101).unwrap();
        externals.add_reference("EXT", 105).unwrap();
        let rendered = render_externals(&externals).unwrap();
        assert_eq!(rendered, "EXT 0101\nEXT 0105\n");
    }

    #[test]
    fn no_external_references_renders_none() {
        let externals = ExternalTable::new();
        assert!(render_externals(&externals).is_none());
    }
}
