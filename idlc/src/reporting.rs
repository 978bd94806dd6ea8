//! Errors produced while compiling IDL sources.
//!
//! Every error is fatal to the compilation run. They can be converted to
//! [`Diagnostic`]s in order to present them to the user.
//!
//! [`Diagnostic`]: codespan_reporting::diagnostic::Diagnostic

use std::fmt;
use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::files::FileId;
use crate::registry::SymbolKind;
use crate::source::FileRange;

#[derive(Debug, Clone)]
pub enum Error {
    /// A `/*` without a matching `*/`.
    UnclosedBlockComment { range: FileRange },
    UnexpectedCharacter { range: FileRange },
    UnexpectedToken {
        range: FileRange,
        found: String,
        expected: &'static str,
    },
    UnexpectedEof {
        range: FileRange,
        expected: &'static str,
    },
    /// A method parameter that does not start with `in`, `out` or `inout`.
    InvalidDirection { range: FileRange, found: String },
    /// Anything other than `#include "path"`.
    MalformedInclude { range: FileRange },
    DuplicateDefine {
        name: String,
        range: FileRange,
        previous: FileRange,
    },
    DuplicateSymbol {
        name: String,
        range: FileRange,
        previous: FileRange,
    },
    /// A declaration named after a built-in type.
    ReservedName { name: String, range: FileRange },
    UnknownType {
        r#type: String,
        range: FileRange,
        suggestion: Option<String>,
    },
    /// A name in a `raises(...)` clause that is not a registered exception.
    NotAnException {
        name: String,
        range: FileRange,
        kind: Option<SymbolKind>,
    },
    IncludeCycle { path: PathBuf, range: FileRange },
    ReadFile {
        path: PathBuf,
        range: Option<FileRange>,
        message: String,
    },
    /// A source file whose generated output would replace it.
    OverwritesSource {
        path: PathBuf,
        range: Option<FileRange>,
    },
}

impl Error {
    pub fn range(&self) -> Option<FileRange> {
        match self {
            Error::UnclosedBlockComment { range }
            | Error::UnexpectedCharacter { range }
            | Error::UnexpectedToken { range, .. }
            | Error::UnexpectedEof { range, .. }
            | Error::InvalidDirection { range, .. }
            | Error::MalformedInclude { range }
            | Error::DuplicateDefine { range, .. }
            | Error::DuplicateSymbol { range, .. }
            | Error::ReservedName { range, .. }
            | Error::UnknownType { range, .. }
            | Error::NotAnException { range, .. }
            | Error::IncludeCycle { range, .. } => Some(*range),
            Error::ReadFile { range, .. } | Error::OverwritesSource { range, .. } => *range,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        let primary_label = |range: &FileRange| Label::primary(range.file_id(), *range);
        let secondary_label = |range: &FileRange| Label::secondary(range.file_id(), *range);

        let diagnostic = Diagnostic::error().with_message(self.to_string());
        let diagnostic = match self {
            Error::UnclosedBlockComment { range } => diagnostic
                .with_labels(vec![primary_label(range).with_message("comment starts here")])
                .with_notes(vec!["help: add a closing `*/`".to_owned()]),
            Error::UnexpectedCharacter { range } => {
                diagnostic.with_labels(vec![primary_label(range)])
            }
            Error::UnexpectedToken {
                range, expected, ..
            } => diagnostic
                .with_labels(vec![primary_label(range).with_message("unexpected token")])
                .with_notes(vec![format!("expected {expected}")]),
            Error::UnexpectedEof { range, expected } => diagnostic
                .with_labels(vec![primary_label(range).with_message("file ends here")])
                .with_notes(vec![format!("expected {expected}")]),
            Error::InvalidDirection { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("invalid direction")])
                .with_notes(vec![
                    "parameters must start with one of `in`, `out` or `inout`".to_owned(),
                ]),
            Error::MalformedInclude { range } => diagnostic
                .with_labels(vec![primary_label(range)])
                .with_notes(vec![
                    "expected `#include \"file.idl\"`".to_owned(),
                    "`#include <file.idl>` is not supported".to_owned(),
                ]),
            Error::DuplicateDefine {
                range, previous, ..
            } => diagnostic.with_labels(vec![
                primary_label(range).with_message("defined again here"),
                secondary_label(previous).with_message("first defined here"),
            ]),
            Error::DuplicateSymbol {
                range, previous, ..
            } => diagnostic.with_labels(vec![
                primary_label(range).with_message("declared again here"),
                secondary_label(previous).with_message("first declared here"),
            ]),
            Error::ReservedName { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("declared here")])
                .with_notes(vec!["built-in type names cannot be redeclared".to_owned()]),
            Error::UnknownType {
                range, suggestion, ..
            } => {
                let diagnostic =
                    diagnostic.with_labels(vec![primary_label(range).with_message("unknown type")]);
                match suggestion {
                    Some(suggestion) => {
                        diagnostic.with_notes(vec![format!("help: did you mean `{suggestion}`?")])
                    }
                    None => diagnostic,
                }
            }
            Error::NotAnException { range, kind, .. } => {
                let label = match kind {
                    Some(kind) => primary_label(range).with_message(format!("declared as {kind}")),
                    None => primary_label(range).with_message("unknown name"),
                };
                diagnostic.with_labels(vec![label]).with_notes(vec![
                    "exceptions must be declared before they are raised".to_owned(),
                ])
            }
            Error::IncludeCycle { range, .. } => diagnostic
                .with_labels(vec![primary_label(range).with_message("included here")]),
            Error::ReadFile { range, .. } => match range {
                Some(range) => {
                    diagnostic.with_labels(vec![primary_label(range).with_message("included here")])
                }
                None => diagnostic,
            },
            Error::OverwritesSource { range, .. } => {
                let diagnostic = match range {
                    Some(range) => diagnostic
                        .with_labels(vec![primary_label(range).with_message("included here")]),
                    None => diagnostic,
                };
                diagnostic.with_notes(vec!["help: rename the file to end in `.idl`".to_owned()])
            }
        };

        match self.range() {
            Some(range) => diagnostic.with_notes(vec![format!("at byte offset {}", range.start())]),
            None => diagnostic,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnclosedBlockComment { .. } => write!(f, "unclosed block comment"),
            Error::UnexpectedCharacter { .. } => write!(f, "unexpected character"),
            Error::UnexpectedToken {
                found, expected, ..
            } => write!(f, "unexpected {found}, expected {expected}"),
            Error::UnexpectedEof { expected, .. } => {
                write!(f, "unexpected end of file, expected {expected}")
            }
            Error::InvalidDirection { found, .. } => write!(f, "invalid direction `{found}`"),
            Error::MalformedInclude { .. } => write!(f, "malformed include directive"),
            Error::DuplicateDefine { name, .. } => write!(f, "`{name}` is defined already"),
            Error::DuplicateSymbol { name, .. } => write!(f, "`{name}` is declared already"),
            Error::ReservedName { name, .. } => write!(f, "`{name}` is a built-in type"),
            Error::UnknownType { r#type, .. } => write!(f, "unknown type `{}`", r#type),
            Error::NotAnException { name, .. } => {
                write!(f, "`{name}` is not a declared exception")
            }
            Error::IncludeCycle { path, .. } => {
                write!(f, "`{}` includes itself", path.display())
            }
            Error::ReadFile { path, message, .. } => {
                write!(f, "couldn't read `{}`: {message}", path.display())
            }
            Error::OverwritesSource { path, .. } => {
                write!(f, "the output for `{}` would overwrite it", path.display())
            }
        }
    }
}

impl std::error::Error for Error {}
