//! Declared type names and the mapping from IDL type expressions to
//! TypeScript types.

use std::fmt;
use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::ast::Import;
use crate::reporting::Error;
use crate::source::FileRange;
use crate::target;

/// A TypeScript type, as written in the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    Number,
    String,
    Boolean,
    Buffer,
    Any,
    Void,
    Array(Box<TsType>),
    /// A type declared in IDL, referred to by name.
    Named(String),
}

impl fmt::Display for TsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsType::Number => write!(f, "number"),
            TsType::String => write!(f, "string"),
            TsType::Boolean => write!(f, "boolean"),
            TsType::Buffer => write!(f, "Buffer"),
            TsType::Any => write!(f, "any"),
            TsType::Void => write!(f, "void"),
            TsType::Array(element) => write!(f, "Array<{element}>"),
            TsType::Named(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    TypeAlias,
    Struct,
    Exception,
    Enum,
    Interface,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            SymbolKind::TypeAlias => "a typedef",
            SymbolKind::Struct => "a struct",
            SymbolKind::Exception => "an exception",
            SymbolKind::Enum => "an enum",
            SymbolKind::Interface => "an interface",
        };
        f.write_str(description)
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// The IDL file containing the declaration.
    pub file: PathBuf,
    /// The generated file the declaration is emitted into.
    pub target: PathBuf,
    pub range: FileRange,
}

/// Type constructors and the `void` return type, which cannot be declared.
const RESERVED: &[&str] = &["sequence", "void"];

/// Built-in type names. They cannot be declared, and are suggested when a
/// type is misspelled.
const PRIMITIVES: &[&str] = &[
    "any",
    "boolean",
    "char",
    "double",
    "float",
    "long",
    "long double",
    "long long",
    "octet",
    "short",
    "string",
    "unsigned long",
    "unsigned long long",
    "unsigned short",
    "wchar",
    "wstring",
];

#[derive(Default)]
pub struct Registry {
    symbols: FxHashMap<String, Symbol>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Record a declared name. Names are unique across every file of a
    /// session.
    pub fn register(&mut self, name: &str, symbol: Symbol) -> Result<(), Error> {
        if PRIMITIVES.contains(&name) || RESERVED.contains(&name) {
            return Err(Error::ReservedName {
                name: name.to_owned(),
                range: symbol.range,
            });
        }
        if let Some(previous) = self.symbols.get(name) {
            return Err(Error::DuplicateSymbol {
                name: name.to_owned(),
                range: symbol.range,
                previous: previous.range,
            });
        }
        log::debug!("registered {} `{name}` from `{}`", symbol.kind, symbol.file.display());
        self.symbols.insert(name.to_owned(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Map an IDL type expression to a TypeScript type.
    ///
    /// References to names declared for a different output `target` push the
    /// corresponding import onto `imports`.
    pub fn resolve(
        &self,
        r#type: &str,
        range: FileRange,
        target: &Path,
        imports: &mut Vec<Import>,
    ) -> Result<TsType, Error> {
        if let Some(symbol) = self.symbols.get(r#type) {
            return Ok(named(r#type, symbol, target, imports));
        }

        let r#type = normalize(r#type);
        if let Some(symbol) = self.symbols.get(&r#type) {
            return Ok(named(&r#type, symbol, target, imports));
        }
        if generic_argument(&r#type, "string").is_some()
            || generic_argument(&r#type, "wstring").is_some()
        {
            return Ok(TsType::String);
        }
        if r#type == "sequence<octet>" {
            return Ok(TsType::Buffer);
        }
        if let Some(element) = generic_argument(&r#type, "sequence") {
            let element = self.resolve(element, range, target, imports)?;
            return Ok(TsType::Array(Box::new(element)));
        }

        primitive(&r#type).ok_or_else(|| Error::UnknownType {
            suggestion: self.suggest(&r#type),
            r#type,
            range,
        })
    }

    /// Like [`Registry::resolve`], but also accepts `void`.
    pub fn resolve_return(
        &self,
        r#type: &str,
        range: FileRange,
        target: &Path,
        imports: &mut Vec<Import>,
    ) -> Result<TsType, Error> {
        match normalize(r#type).as_str() {
            "void" => Ok(TsType::Void),
            _ => self.resolve(r#type, range, target, imports),
        }
    }

    /// Check that `name` refers to a declared exception.
    pub fn resolve_exception(&self, name: &str, range: FileRange) -> Result<(), Error> {
        match self.symbols.get(name) {
            Some(symbol) if symbol.kind == SymbolKind::Exception => Ok(()),
            symbol => Err(Error::NotAnException {
                name: name.to_owned(),
                range,
                kind: symbol.map(|symbol| symbol.kind),
            }),
        }
    }

    fn suggest(&self, r#type: &str) -> Option<String> {
        let candidates = PRIMITIVES
            .iter()
            .copied()
            .chain(self.symbols.keys().map(String::as_str));

        candidates
            .map(|candidate| (levenshtein::levenshtein(r#type, candidate), candidate))
            .filter(|(distance, _)| *distance <= 2)
            .min()
            .map(|(_, candidate)| candidate.to_owned())
    }
}

fn named(name: &str, symbol: &Symbol, target: &Path, imports: &mut Vec<Import>) -> TsType {
    if symbol.target != target {
        imports.push(Import {
            name: name.to_owned(),
            from: target::import_specifier(target, &symbol.target),
        });
    }
    TsType::Named(name.to_owned())
}

/// Collapse runs of whitespace, and drop whitespace around angle brackets,
/// so that `sequence < octet >` and `sequence<octet>` compare equal.
pub fn normalize(r#type: &str) -> String {
    r#type
        .split_whitespace()
        .join(" ")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace("> ", ">")
}

fn generic_argument<'a>(r#type: &'a str, constructor: &str) -> Option<&'a str> {
    r#type
        .strip_prefix(constructor)?
        .strip_prefix('<')?
        .strip_suffix('>')
}

fn primitive(r#type: &str) -> Option<TsType> {
    if let Some(integer) = r#type.strip_prefix("unsigned ") {
        return match integer {
            "short" | "long" | "long long" => Some(TsType::Number),
            _ => None,
        };
    }
    match r#type {
        "octet" | "short" | "long" | "long long" | "float" | "double" | "long double" => {
            Some(TsType::Number)
        }
        "string" | "wstring" | "char" | "wchar" => Some(TsType::String),
        "boolean" => Some(TsType::Boolean),
        "any" => Some(TsType::Any),
        _ => None,
    }
}
