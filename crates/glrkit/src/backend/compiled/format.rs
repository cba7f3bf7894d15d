//! Line-oriented text persistence for [`CompiledTable`].
//!
//! ```text
//! glrkit-table,1,<flavor>,<states>,<lexemes>,<terminals>,<nonterminals>,<rules>
//! [lexemes]
//! <kind>                              one per line
//! [terminals]
//! $                                   the terminator, always first
//! <lexeme>                            plain lexeme kind
//! <lexeme>,=<text>                    literal refinement
//! <lexeme>,/<pattern>                 pattern refinement
//! [nonterminals]
//! <name>  or  <name>,<synthetic id>
//! [rules]
//! <lhs>,<length>
//! [table]                             canonical: one row per state,
//! <code>,<code>,...                   terminals then nonterminals, 0 = empty
//! ```
//!
//! Generalized tables replace `[table]` by `[actions]` (terminal cells, each
//! a `/`-separated list of codes) followed by `[gotos]` (nonterminal cells).
//! Strings escape `\`, `,`, newline and carriage return as `\\`, `\c`, `\n`
//! and `\r`.

use crate::backend::compiled::{CompiledTable, pack_action, unpack_action};
use crate::backend::{Action, RuleShape, SymbolTable, TableFlavor};
use crate::error::FormatError;
use crate::grammar::{LexemeKind, NonTerminal, Pattern, Refinement, Terminal};
use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::Path;

const MAGIC: &str = "glrkit-table";
const VERSION: &str = "1";

impl CompiledTable {
    /// Write the table to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// [`FormatError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FormatError> {
        std::fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Read a table written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// [`FormatError::Io`] if the file cannot be read, any other variant if
    /// its content is not a valid table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let file = std::fs::File::open(path)?;
        Self::read_from(std::io::BufReader::new(file))
    }

    /// # Errors
    ///
    /// [`FormatError::Io`] if `writer` fails.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), FormatError> {
        writer.write_all(self.to_text().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn read_from(reader: impl BufRead) -> Result<Self, FormatError> {
        Reader::new(reader).table()
    }

    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn from_text(text: &str) -> Result<Self, FormatError> {
        Self::read_from(text.as_bytes())
    }

    /// The text form; identical tables always render identically.
    #[must_use]
    pub fn to_text(&self) -> String {
        let symbols = &self.symbols;
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "{MAGIC},{VERSION},{},{},{},{},{},{}",
            self.flavor,
            self.states,
            symbols.lexemes().len(),
            symbols.terminals().len(),
            symbols.nonterminals().len(),
            symbols.rules().len()
        );

        out.push_str("[lexemes]\n");
        for kind in symbols.lexemes() {
            let _ = writeln!(out, "{}", escape(kind.as_str()));
        }

        out.push_str("[terminals]\n");
        for terminal in symbols.terminals() {
            let Terminal::Lexeme { kind, refinement } = terminal else {
                out.push_str("$\n");
                continue;
            };
            let lexeme = symbols.lexeme_index(kind).unwrap_or_default();
            match refinement {
                None => {
                    let _ = writeln!(out, "{lexeme}");
                }
                Some(Refinement::Literal(text)) => {
                    let _ = writeln!(out, "{lexeme},={}", escape(text));
                }
                Some(Refinement::Pattern(pattern)) => {
                    let _ = writeln!(out, "{lexeme},/{}", escape(pattern.as_str()));
                }
            }
        }

        out.push_str("[nonterminals]\n");
        for nonterminal in symbols.nonterminals() {
            match nonterminal.synthetic_id() {
                None => {
                    let _ = writeln!(out, "{}", escape(nonterminal.name()));
                }
                Some(id) => {
                    let _ = writeln!(out, "{},{id}", escape(nonterminal.name()));
                }
            }
        }

        out.push_str("[rules]\n");
        for rule in symbols.rules() {
            let _ = writeln!(out, "{},{}", rule.lhs, rule.len);
        }

        let terminals = symbols.terminals().len();
        let width = self.width();
        match self.flavor {
            TableFlavor::Canonical => {
                out.push_str("[table]\n");
                self.write_rows(&mut out, 0..width);
            }
            TableFlavor::Generalized => {
                out.push_str("[actions]\n");
                self.write_rows(&mut out, 0..terminals);
                out.push_str("[gotos]\n");
                self.write_rows(&mut out, terminals..width);
            }
        }
        out
    }

    fn write_rows(&self, out: &mut String, columns: std::ops::Range<usize>) {
        let width = self.width();
        for state in 0..self.states {
            let row = &self.cells[state * width..(state + 1) * width];
            for (i, cell) in row[columns.clone()].iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if cell.is_empty() {
                    out.push('0');
                }
                for (j, code) in cell.iter().enumerate() {
                    if j > 0 {
                        out.push('/');
                    }
                    let _ = write!(out, "{code}");
                }
            }
            out.push('\n');
        }
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ',' => escaped.push_str("\\c"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape(text: &str, line: usize) -> Result<CompactString, FormatError> {
    let mut out = CompactString::default();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('c') => out.push(','),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            other => {
                return Err(FormatError::malformed(
                    line,
                    format!("bad escape `\\{}`", other.map(String::from).unwrap_or_default()),
                ));
            }
        }
    }
    Ok(out)
}

struct Header {
    flavor: TableFlavor,
    states: usize,
    lexemes: usize,
    terminals: usize,
    nonterminals: usize,
    rules: usize,
}

impl Header {
    /// Checked against overflow by [`Reader::header`].
    const fn width(&self) -> usize {
        self.terminals + self.nonterminals
    }
}

struct Reader<R> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> Reader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self) -> Result<String, FormatError> {
        self.line += 1;
        match self.lines.next() {
            Some(line) => Ok(line?),
            None => Err(FormatError::malformed(self.line, "unexpected end of file")),
        }
    }

    fn section(&mut self, name: &str) -> Result<(), FormatError> {
        let line = self.next_line()?;
        if line.trim_end() == format!("[{name}]") {
            Ok(())
        } else {
            Err(FormatError::malformed(self.line, format!("expected section [{name}]")))
        }
    }

    fn number<N: std::str::FromStr<Err = std::num::ParseIntError>>(&self, field: &str) -> Result<N, FormatError> {
        field.trim().parse().map_err(|source| FormatError::InvalidNumber {
            line: self.line,
            source,
        })
    }

    fn table(mut self) -> Result<CompiledTable, FormatError> {
        let header = self.header()?;

        self.section("lexemes")?;
        let mut lexemes = Vec::new();
        for _ in 0..header.lexemes {
            let line = self.next_line()?;
            lexemes.push(LexemeKind::new(unescape(&line, self.line)?));
        }
        let lexeme_line = self.line;

        self.section("terminals")?;
        let mut terminals = Vec::new();
        for index in 0..header.terminals {
            let line = self.next_line()?;
            let terminal = self.terminal(&line, &lexemes)?;
            if terminal.is_terminator() != (index == 0) {
                return Err(FormatError::malformed(self.line, "the terminator must be terminal 0, and only it"));
            }
            terminals.push(terminal);
        }

        self.section("nonterminals")?;
        let mut nonterminals = Vec::new();
        for _ in 0..header.nonterminals {
            let line = self.next_line()?;
            let nonterminal = match line.split_once(',') {
                None => NonTerminal::new(unescape(&line, self.line)?),
                Some((name, id)) => NonTerminal::restore(unescape(name, self.line)?, Some(self.number(id)?)),
            };
            nonterminals.push(nonterminal);
        }

        self.section("rules")?;
        let mut rules = Vec::new();
        for _ in 0..header.rules {
            let line = self.next_line()?;
            let Some((lhs, len)) = line.split_once(',') else {
                return Err(FormatError::malformed(self.line, "expected `lhs,length`"));
            };
            let lhs: u32 = self.number(lhs)?;
            if lhs as usize >= header.nonterminals {
                return Err(FormatError::malformed(self.line, format!("unknown nonterminal {lhs}")));
            }
            rules.push(RuleShape {
                lhs,
                len: self.number(len)?,
            });
        }

        let symbols = SymbolTable::new(terminals, nonterminals, rules);
        if symbols.lexemes() != lexemes.as_slice() {
            return Err(FormatError::malformed(
                lexeme_line,
                "lexeme table does not match the terminals",
            ));
        }

        let width = header.width();
        let mut cells = Vec::new();
        match header.flavor {
            TableFlavor::Canonical => {
                self.section("table")?;
                self.rows(&header, &mut cells, 0..width, false)?;
            }
            TableFlavor::Generalized => {
                self.section("actions")?;
                self.rows(&header, &mut cells, 0..header.terminals, true)?;
                self.section("gotos")?;
                self.rows(&header, &mut cells, header.terminals..width, false)?;
            }
        }

        while let Some(line) = self.lines.next() {
            self.line += 1;
            if !line?.trim().is_empty() {
                return Err(FormatError::malformed(self.line, "trailing content"));
            }
        }

        Ok(CompiledTable {
            flavor: header.flavor,
            symbols,
            states: header.states,
            cells,
        })
    }

    fn header(&mut self) -> Result<Header, FormatError> {
        let line = self.next_line()?;
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        let [magic, version, flavor, states, lexemes, terminals, nonterminals, rules] = fields.as_slice() else {
            return Err(FormatError::malformed(self.line, "expected an 8-field header"));
        };
        if *magic != MAGIC {
            return Err(FormatError::malformed(self.line, "not a compiled table"));
        }
        if *version != VERSION {
            return Err(FormatError::malformed(self.line, format!("unsupported version {version}")));
        }
        let flavor = match *flavor {
            "canonical" => TableFlavor::Canonical,
            "glr" => TableFlavor::Generalized,
            other => {
                return Err(FormatError::malformed(self.line, format!("unknown flavor `{other}`")));
            }
        };
        let header = Header {
            flavor,
            states: self.number(states)?,
            lexemes: self.number(lexemes)?,
            terminals: self.number(terminals)?,
            nonterminals: self.number(nonterminals)?,
            rules: self.number(rules)?,
        };
        if header.terminals == 0 {
            return Err(FormatError::malformed(self.line, "a table needs the terminator"));
        }
        // symbol, state and rule ids are u32, and the cell grid must be addressable
        let limit = u32::MAX as usize;
        let counts = [header.states, header.lexemes, header.terminals, header.nonterminals, header.rules];
        if counts.iter().any(|&count| count > limit) {
            return Err(FormatError::malformed(self.line, "count out of range"));
        }
        if header
            .terminals
            .checked_add(header.nonterminals)
            .and_then(|width| width.checked_mul(header.states))
            .is_none()
        {
            return Err(FormatError::malformed(self.line, "table too large"));
        }
        Ok(header)
    }

    fn terminal(&self, line: &str, lexemes: &[LexemeKind]) -> Result<Terminal, FormatError> {
        if line == "$" {
            return Ok(Terminal::Terminator);
        }
        let (index, refinement) = match line.split_once(',') {
            None => (line, None),
            Some((index, refinement)) => (index, Some(refinement)),
        };
        let index: usize = self.number(index)?;
        let Some(kind) = lexemes.get(index) else {
            return Err(FormatError::malformed(self.line, format!("unknown lexeme {index}")));
        };
        let refinement = match refinement {
            None => None,
            Some(field) => {
                let mut chars = field.chars();
                let tag = chars.next();
                let body = unescape(chars.as_str(), self.line)?;
                match tag {
                    Some('=') => Some(Refinement::Literal(body)),
                    Some('/') => Some(Refinement::Pattern(Pattern::new(&body).map_err(|source| {
                        FormatError::InvalidPattern {
                            line: self.line,
                            source,
                        }
                    })?)),
                    _ => return Err(FormatError::malformed(self.line, "refinement must start with `=` or `/`")),
                }
            }
        };
        Ok(Terminal::Lexeme {
            kind: kind.clone(),
            refinement,
        })
    }

    /// Read one row per state into `columns` of `cells`. Only lists may hold
    /// several codes; goto columns may only hold shifts.
    ///
    /// `cells` grows one row at a time as lines arrive, so a header claiming
    /// more states than the body holds fails on the missing line instead of
    /// allocating up front.
    fn rows(
        &mut self,
        header: &Header,
        cells: &mut Vec<SmallVec<[u64; 1]>>,
        columns: std::ops::Range<usize>,
        lists: bool,
    ) -> Result<(), FormatError> {
        let width = header.width();
        for state in 0..header.states {
            let line = self.next_line()?;
            let fields: Vec<&str> = line.trim_end().split(',').collect();
            if fields.len() != columns.len() {
                return Err(FormatError::malformed(
                    self.line,
                    format!("expected {} cells, found {}", columns.len(), fields.len()),
                ));
            }
            let row_end = (state + 1) * width;
            if cells.len() < row_end {
                cells.resize(row_end, SmallVec::new());
            }
            for (column, field) in columns.clone().zip(fields) {
                let codes: SmallVec<[&str; 2]> = field.split('/').collect();
                if codes.len() > 1 && !lists {
                    return Err(FormatError::malformed(self.line, "several actions in a single-action cell"));
                }
                let cell = &mut cells[state * width + column];
                for code in codes {
                    let code: u64 = self.number(code)?;
                    if code == 0 {
                        continue;
                    }
                    let action = self.action(header, code, column >= header.terminals)?;
                    cell.push(pack_action(action));
                }
            }
        }
        Ok(())
    }

    fn action(&self, header: &Header, code: u64, goto: bool) -> Result<Action, FormatError> {
        let Some(action) = unpack_action(code) else {
            return Err(FormatError::malformed(self.line, format!("invalid action code {code}")));
        };
        match action {
            Action::Shift(target) if target as usize >= header.states => {
                Err(FormatError::malformed(self.line, format!("unknown state {target}")))
            }
            Action::Reduce(rule) if rule as usize >= header.rules => {
                Err(FormatError::malformed(self.line, format!("unknown rule {rule}")))
            }
            Action::Reduce(_) | Action::Accept if goto => {
                Err(FormatError::malformed(self.line, "a goto cell may only hold a state"))
            }
            action => Ok(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ParseTable;
    use crate::backend::TableBackend;
    use crate::backend::glr::GlrTable;
    use crate::backend::lr::CanonicalTable;
    use crate::grammar::{Grammar, Symbol};
    use crate::testing::{ambiguous_sum_grammar, sample_grammar};

    #[test]
    fn test_canonical_text() {
        let table = CanonicalTable::build(&sample_grammar()).unwrap();
        let compiled = CompiledTable::from_table(&table);
        let text = compiled.to_text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("glrkit-table,1,canonical,10,2,3,3,4"));
        assert_eq!(lines.next(), Some("[lexemes]"));
        assert!(text.contains("\n[table]\n"));
        assert_eq!(CompiledTable::from_text(&text).unwrap(), compiled);
    }

    #[test]
    fn test_glr_roundtrip_is_stable() {
        let table = GlrTable::build(&ambiguous_sum_grammar()).unwrap();
        let compiled = CompiledTable::from_table(&table);
        let text = compiled.to_text();
        assert!(text.contains("\n[actions]\n") && text.contains("\n[gotos]\n"));
        assert!(text.contains('/'));
        let loaded = CompiledTable::from_text(&text).unwrap();
        assert_eq!(loaded.to_text(), text);
        assert_eq!(loaded.stats(), compiled.stats());
    }

    #[test]
    fn test_refinements_and_escapes() {
        let s = NonTerminal::new("odd, name\\");
        let mut grammar = Grammar::new(s.clone());
        grammar.add_rule(
            s,
            [
                Symbol::Terminal(Terminal::literal("id", "a,b")),
                Symbol::Terminal(Terminal::pattern("id", "[0-9]+\\n?").unwrap()),
                Symbol::Terminal(Terminal::kind("id")),
            ]
            .into_iter()
            .collect(),
        );
        let compiled = CompiledTable::from_table(&GlrTable::build(&grammar).unwrap());
        let loaded = CompiledTable::from_text(&compiled.to_text()).unwrap();
        assert_eq!(loaded, compiled);
        assert_eq!(loaded.symbols().nonterminals()[1].name(), "odd, name\\");
    }

    #[test]
    fn test_temporary_ids_survive() {
        let mut grammar = Grammar::new(NonTerminal::new("S"));
        let temp = NonTerminal::temporary("S");
        grammar.add_rule(NonTerminal::new("S"), [Symbol::NonTerminal(temp.clone())].into_iter().collect());
        grammar.add_rule(temp.clone(), [Symbol::Terminal(Terminal::kind("x"))].into_iter().collect());
        let compiled = CompiledTable::from_table(&CanonicalTable::build(&grammar).unwrap());
        let loaded = CompiledTable::from_text(&compiled.to_text()).unwrap();
        assert!(loaded.symbols().nonterminals().contains(&temp));
    }

    fn corrupt(text: &str, from: &str, to: &str) -> String {
        text.replacen(from, to, 1)
    }

    #[test]
    fn test_malformed_inputs() {
        let text = CompiledTable::from_table(&CanonicalTable::build(&sample_grammar()).unwrap()).to_text();

        let err = CompiledTable::from_text("").unwrap_err();
        assert!(matches!(err, FormatError::Malformed { line: 1, .. }));

        let err = CompiledTable::from_text(&corrupt(&text, "glrkit-table", "other")).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { line: 1, .. }));

        let err = CompiledTable::from_text(&corrupt(&text, ",10,", ",ten,")).unwrap_err();
        assert!(matches!(err, FormatError::InvalidNumber { line: 1, .. }));

        let err = CompiledTable::from_text(&corrupt(&text, "[rules]", "[rulez]")).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));

        let truncated: String = text.lines().take(12).map(|l| format!("{l}\n")).collect();
        let err = CompiledTable::from_text(&truncated).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));

        let err = CompiledTable::from_text(&format!("{text}junk\n")).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));
    }

    #[test]
    fn test_oversized_headers_are_rejected() {
        let err = CompiledTable::from_text("glrkit-table,1,canonical,0,18446744073709551615,1,0,0\n[lexemes]\n")
            .unwrap_err();
        assert!(matches!(err, FormatError::Malformed { line: 1, .. }));

        let err = CompiledTable::from_text("glrkit-table,1,glr,4294967296,0,1,4294967296,0\n").unwrap_err();
        assert!(matches!(err, FormatError::Malformed { line: 1, .. }));

        // in range, but the body is far shorter than the counts claim
        let err = CompiledTable::from_text("glrkit-table,1,canonical,4000000000,0,1,0,0\n[lexemes]\n").unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));

        let err = CompiledTable::from_text(
            "glrkit-table,1,canonical,4000000000,0,1,4000000000,0\n[lexemes]\n[terminals]\n$\n[nonterminals]\nS\n",
        )
        .unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));
    }

    #[test]
    fn test_bad_pattern() {
        let mut grammar = Grammar::new(NonTerminal::new("S"));
        grammar.add_rule(
            NonTerminal::new("S"),
            [Symbol::Terminal(Terminal::pattern("id", "[a-z]").unwrap())].into_iter().collect(),
        );
        let text = CompiledTable::from_table(&CanonicalTable::build(&grammar).unwrap()).to_text();
        let err = CompiledTable::from_text(&corrupt(&text, ",/[a-z]", ",/[a-z")).unwrap_err();
        assert!(matches!(err, FormatError::InvalidPattern { .. }));
    }
}
