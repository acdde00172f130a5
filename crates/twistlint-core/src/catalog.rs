//! Static message catalog.
//!
//! Every checker declares its messages once as a `&'static [MessageDef]`.
//! The [`Catalog`] merges those declarations at registration time and
//! rejects duplicate codes or symbols, so message identifiers never depend
//! on registration order.

use std::collections::HashMap;

use crate::types::Severity;

/// Declaration of a single message a checker may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageDef {
    /// Message code (e.g., "W9208").
    pub code: &'static str,
    /// Symbolic name (e.g., "missing-docstring").
    pub symbol: &'static str,
    /// Summary template; each `{}` is replaced by the next format argument.
    pub summary: &'static str,
    /// Longer explanation shown by `list-msgs`.
    pub detail: &'static str,
    /// Whether the message is active without an explicit `enable`.
    pub default_enabled: bool,
}

impl MessageDef {
    /// Default severity derived from the code prefix.
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::from_code(self.code)
    }

    /// Renders the summary with positional arguments.
    ///
    /// Surplus placeholders are left as-is, surplus arguments are ignored.
    #[must_use]
    pub fn render(&self, args: &[String]) -> String {
        let mut out = String::with_capacity(self.summary.len());
        let mut rest = self.summary;
        let mut args = args.iter();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// Message reported by the host when a checker aborts a file.
pub const FATAL_CHECK_ERROR: MessageDef = MessageDef {
    code: "F9001",
    symbol: "fatal-check-error",
    summary: "Checking aborted: {}",
    detail: "A checker hit a lookup failure or a structural assumption \
             violation. Diagnostics emitted before the failure are kept, the \
             rest of the file was not checked.",
    default_enabled: true,
};

/// Errors raised while building the catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two messages share a code.
    #[error("duplicate message code {code} (declared by {first} and {second})")]
    DuplicateCode {
        /// The repeated code.
        code: &'static str,
        /// Checker that declared it first.
        first: &'static str,
        /// Checker that declared it again.
        second: &'static str,
    },
    /// Two messages share a symbol.
    #[error("duplicate message symbol {symbol} (declared by {first} and {second})")]
    DuplicateSymbol {
        /// The repeated symbol.
        symbol: &'static str,
        /// Checker that declared it first.
        first: &'static str,
        /// Checker that declared it again.
        second: &'static str,
    },
}

/// Catalog entry: a message plus the checker that owns it.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// The message declaration.
    pub def: &'static MessageDef,
    /// Owning checker name.
    pub checker: &'static str,
}

/// Merged, validated catalog of every registered message.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_code: HashMap<&'static str, usize>,
    by_symbol: HashMap<&'static str, usize>,
}

impl Catalog {
    /// Creates a catalog holding only the host's own messages.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::default();
        catalog.push("host", &FATAL_CHECK_ERROR);
        catalog
    }

    /// Registers all messages declared by a checker.
    ///
    /// # Errors
    ///
    /// Returns an error if a code or symbol is already registered.
    pub fn register(
        &mut self,
        checker: &'static str,
        defs: &'static [MessageDef],
    ) -> Result<(), CatalogError> {
        for def in defs {
            if let Some(&idx) = self.by_code.get(def.code) {
                return Err(CatalogError::DuplicateCode {
                    code: def.code,
                    first: self.entries[idx].checker,
                    second: checker,
                });
            }
            if let Some(&idx) = self.by_symbol.get(def.symbol) {
                return Err(CatalogError::DuplicateSymbol {
                    symbol: def.symbol,
                    first: self.entries[idx].checker,
                    second: checker,
                });
            }
            self.push(checker, def);
        }
        Ok(())
    }

    fn push(&mut self, checker: &'static str, def: &'static MessageDef) {
        let idx = self.entries.len();
        self.entries.push(CatalogEntry { def, checker });
        self.by_code.insert(def.code, idx);
        self.by_symbol.insert(def.symbol, idx);
    }

    /// Looks up a message by code or symbol.
    #[must_use]
    pub fn get(&self, code_or_symbol: &str) -> Option<&CatalogEntry> {
        self.by_code
            .get(code_or_symbol)
            .or_else(|| self.by_symbol.get(code_or_symbol))
            .map(|&idx| &self.entries[idx])
    }

    /// Iterates entries in code order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        let mut sorted: Vec<&CatalogEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.def.code);
        sorted.into_iter()
    }

    /// Number of registered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no message is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSGS: &[MessageDef] = &[
        MessageDef {
            code: "W9208",
            symbol: "missing-docstring",
            summary: "Missing docstring",
            detail: "",
            default_enabled: true,
        },
        MessageDef {
            code: "W9202",
            symbol: "missing-param-markup",
            summary: "Missing epytext markup @param for argument \"{}\"",
            detail: "",
            default_enabled: true,
        },
    ];

    const CLASH: &[MessageDef] = &[MessageDef {
        code: "W9208",
        symbol: "something-else",
        summary: "",
        detail: "",
        default_enabled: true,
    }];

    #[test]
    fn render_substitutes_in_order() {
        let msg = MSGS[1].render(&["request".to_string()]);
        assert_eq!(msg, "Missing epytext markup @param for argument \"request\"");
    }

    #[test]
    fn render_keeps_unfilled_placeholders() {
        let def = MessageDef {
            summary: "{} and {}",
            ..MSGS[0]
        };
        assert_eq!(def.render(&["a".to_string()]), "a and {}");
    }

    #[test]
    fn lookup_by_code_and_symbol() {
        let mut catalog = Catalog::new();
        catalog.register("docstring", MSGS).unwrap();
        assert_eq!(catalog.get("W9202").unwrap().def.symbol, "missing-param-markup");
        assert_eq!(catalog.get("missing-docstring").unwrap().checker, "docstring");
        assert_eq!(catalog.get("F9001").unwrap().checker, "host");
        assert!(catalog.get("W0000").is_none());
    }

    #[test]
    fn duplicate_code_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.register("docstring", MSGS).unwrap();
        let err = catalog.register("other", CLASH).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateCode {
                code: "W9208",
                first: "docstring",
                second: "other",
            }
        );
    }

    #[test]
    fn entries_are_sorted_by_code() {
        let mut catalog = Catalog::new();
        catalog.register("docstring", MSGS).unwrap();
        let codes: Vec<&str> = catalog.entries().map(|e| e.def.code).collect();
        assert_eq!(codes, vec!["F9001", "W9202", "W9208"]);
    }
}
