//! A recursive descent parser for IDL declarations.
//!
//! The parser works over the tokens of one file, resolving types against the
//! session's [`Registry`] as it goes, so that the returned declarations are
//! ready to be emitted. `#include` directives compile the included file
//! before the rest of the current file is parsed.
//!
//! [`Registry`]: crate::registry::Registry

use std::path::{Path, PathBuf};

use crate::ast::{
    Comment, Declaration, Direction, Enum, Field, Interface, Member, Method, Module, Parameter,
    Struct, TypeAlias,
};
use crate::files::FileId;
use crate::lexer::{Token, TokenKind};
use crate::registry::{Symbol, SymbolKind, TsType};
use crate::reporting::Error;
use crate::session::Session;
use crate::source::{BytePos, ByteRange, FileRange};
use crate::storage::Storage;
use crate::target;

/// Tokens that end a type expression, in addition to the ones passed to
/// [`Parser::type_and_name`].
const BRACES: [TokenKind; 2] = [TokenKind::OpenBrace, TokenKind::CloseBrace];

const FIELD_STOPS: &[TokenKind] = &[TokenKind::Comma, TokenKind::Semicolon, TokenKind::CloseParen];

/// A type expression followed by a declared name.
struct TypedName {
    r#type: String,
    type_range: FileRange,
    name: String,
    name_range: FileRange,
}

pub struct Parser<'a> {
    session: &'a mut Session,
    storage: &'a dyn Storage,
    path: &'a Path,
    source: &'a str,
    tokens: &'a [Token],
    file_id: FileId,
    cursor: usize,
    /// Declarations to place before the one currently being parsed.
    pending: Vec<Declaration>,
}

impl<'a> Parser<'a> {
    pub fn new(
        session: &'a mut Session,
        storage: &'a dyn Storage,
        path: &'a Path,
        source: &'a str,
        tokens: &'a [Token],
        file_id: FileId,
    ) -> Parser<'a> {
        Parser {
            session,
            storage,
            path,
            source,
            tokens,
            file_id,
            cursor: 0,
            pending: Vec::new(),
        }
    }

    /// Parse every declaration in the file, for emitting to `target`.
    pub fn file(&mut self, target: &Path) -> Result<Vec<Declaration>, Error> {
        self.body(target, None)
    }

    /// Parse declarations up to, but not including, the closing token given
    /// by `end`, or up to the end of the file if `end` is `None`.
    fn body(
        &mut self,
        target: &Path,
        end: Option<(TokenKind, &'static str)>,
    ) -> Result<Vec<Declaration>, Error> {
        let mut body = Vec::new();
        loop {
            self.skip_comments();
            body.append(&mut self.pending);

            match (self.tokens.get(self.cursor), end) {
                (None, None) => return Ok(body),
                (None, Some((_, expected))) => return Err(self.unexpected_eof(expected)),
                (Some(token), Some((end, _))) if token.kind == end => return Ok(body),
                (Some(_), _) => body.extend(self.declaration(target)?),
            }
        }
    }

    /// Parse the next declaration, along with any comments and imports that
    /// need to precede it.
    fn declaration(&mut self, target: &Path) -> Result<Vec<Declaration>, Error> {
        let token = self.next_or_eof("a declaration")?;
        log::trace!(
            "{}:{}: {}",
            self.path.display(),
            token.position,
            token.kind.description(),
        );
        let declaration = match token.kind {
            TokenKind::DirectiveDefine => {
                self.define()?;
                None
            }
            TokenKind::DirectiveIfndef => {
                let mut body = self.ifndef(target)?;
                self.pending.append(&mut body);
                None
            }
            TokenKind::DirectiveInclude => {
                self.include(token)?;
                None
            }
            TokenKind::KeywordModule => Some(Declaration::Module(self.module(target)?)),
            TokenKind::KeywordTypedef => Some(Declaration::TypeAlias(self.typedef(target)?)),
            TokenKind::KeywordStruct => {
                let r#struct = self.r#struct(target, SymbolKind::Struct)?;
                Some(Declaration::Struct(r#struct))
            }
            TokenKind::KeywordException => {
                let r#struct = self.r#struct(target, SymbolKind::Exception)?;
                Some(Declaration::Exception(r#struct))
            }
            TokenKind::KeywordEnum => Some(Declaration::Enum(self.r#enum(target)?)),
            TokenKind::KeywordInterface => Some(Declaration::Interface(self.interface(target)?)),
            _ => return Err(self.unexpected(token, "a declaration")),
        };
        if declaration.is_some() {
            self.detach_comments();
        }

        let mut output = std::mem::take(&mut self.pending);
        output.extend(declaration);
        Ok(output)
    }

    fn define(&mut self) -> Result<(), Error> {
        let (name, range) = self.expect_name()?;
        log::debug!("defined `{name}`");
        self.session.macros_mut().define(&name, range)
    }

    /// Parse an `#ifndef` block, returning its declarations if the name was
    /// undefined at the start of the block.
    fn ifndef(&mut self, target: &Path) -> Result<Vec<Declaration>, Error> {
        let (name, _) = self.expect_name()?;
        let defined = self.session.macros().is_defined(&name);

        let body = self.body(target, Some((TokenKind::DirectiveEndif, "`#endif`")))?;
        self.expect(TokenKind::DirectiveEndif, "`#endif`")?;

        if defined {
            Ok(Vec::new())
        } else {
            Ok(body)
        }
    }

    fn include(&mut self, directive: Token) -> Result<(), Error> {
        let malformed = |range: FileRange| Error::MalformedInclude {
            range: directive.range.merge(&range).unwrap_or(directive.range),
        };

        let open = match self.tokens.get(self.cursor) {
            Some(token) if token.kind == TokenKind::DoubleQuote => *token,
            Some(token) => return Err(malformed(token.range)),
            None => return Err(malformed(directive.range)),
        };

        // The path is raw text up to the next quote on the same line, so it
        // may contain characters that would otherwise start a comment.
        let start = open.range.end() as usize;
        let line = &self.source[start..];
        let line = &line[..line.find(|c: char| c == '\r' || c == '\n').unwrap_or(line.len())];
        let written = match line.find('"') {
            Some(len) => &line[..len],
            None => return Err(malformed(open.range)),
        };
        let close = (start + written.len() + 1) as BytePos;
        let line_end = (start + line.len()) as BytePos;

        self.cursor += 1;
        while let Some(token) = self.tokens.get(self.cursor) {
            if token.range.start() >= close {
                break;
            }
            if token.range.end() > line_end {
                return Err(malformed(token.range));
            }
            self.cursor += 1;
        }

        let range = FileRange::new(self.file_id, ByteRange::new(directive.range.start(), close));
        // Paths starting with a name are relative to the including file.
        let path = if written.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            self.path.parent().unwrap_or_else(|| Path::new("")).join(written)
        } else {
            PathBuf::from(written)
        };

        log::debug!("including `{}` from `{}`", path.display(), self.path.display());
        self.session.include_file(self.storage, &path, range)
    }

    fn module(&mut self, parent: &Path) -> Result<Module, Error> {
        let (name, _) = self.expect_name()?;
        let target = target::module(parent, &name);

        self.expect(TokenKind::OpenBrace, "`{`")?;
        let body = self.body(&target, Some((TokenKind::CloseBrace, "`}`")))?;
        self.expect(TokenKind::CloseBrace, "`}`")?;
        self.expect(TokenKind::Semicolon, "`;`")?;

        self.session.emit(&target, &body);
        Ok(Module { name, body })
    }

    fn typedef(&mut self, target: &Path) -> Result<TypeAlias, Error> {
        let typed_name = self.type_and_name(&[TokenKind::Semicolon])?;
        self.expect(TokenKind::Semicolon, "`;`")?;

        let r#type = self.resolve(&typed_name.r#type, typed_name.type_range, target)?;
        self.register(&typed_name.name, SymbolKind::TypeAlias, typed_name.name_range, target)?;

        Ok(TypeAlias {
            name: typed_name.name,
            r#type,
        })
    }

    /// Parse the rest of a struct or exception, which share their syntax.
    fn r#struct(&mut self, target: &Path, kind: SymbolKind) -> Result<Struct, Error> {
        let (name, range) = self.expect_name()?;
        self.register(&name, kind, range, target)?;
        self.expect(TokenKind::OpenBrace, "`{`")?;

        let mut members = Vec::new();
        loop {
            self.take_comments(&mut members);
            if self.peek_kind() == Some(TokenKind::CloseBrace) {
                break;
            }

            let field = self.type_and_name(FIELD_STOPS)?;
            let token = self.next_or_eof("`;`")?;
            match token.kind {
                TokenKind::Semicolon | TokenKind::Comma => {}
                _ => return Err(self.unexpected(token, "`;`")),
            }

            let r#type = self.resolve(&field.r#type, field.type_range, target)?;
            self.hoist_comments(&mut members);
            members.push(Member::Item(Field {
                name: field.name,
                r#type,
            }));
        }

        self.expect(TokenKind::CloseBrace, "`}`")?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(Struct { name, members })
    }

    fn r#enum(&mut self, target: &Path) -> Result<Enum, Error> {
        let (name, range) = self.expect_name()?;
        self.register(&name, SymbolKind::Enum, range, target)?;
        self.expect(TokenKind::OpenBrace, "`{`")?;

        let mut members = Vec::new();
        self.take_comments(&mut members);
        if self.peek_kind() != Some(TokenKind::CloseBrace) {
            loop {
                let (value, _) = self.expect_name()?;
                members.push(Member::Item(value));
                self.take_comments(&mut members);

                match self.peek_kind() {
                    Some(TokenKind::Comma) => self.cursor += 1,
                    _ => break,
                }
                self.take_comments(&mut members);
            }
        }

        self.expect(TokenKind::CloseBrace, "`,` or `}`")?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(Enum { name, members })
    }

    fn interface(&mut self, target: &Path) -> Result<Interface, Error> {
        let (name, range) = self.expect_name()?;
        self.register(&name, SymbolKind::Interface, range, target)?;
        self.expect(TokenKind::OpenBrace, "`{`")?;

        let mut members = Vec::new();
        loop {
            self.take_comments(&mut members);
            if self.peek_kind() == Some(TokenKind::CloseBrace) {
                break;
            }
            let method = self.method(target)?;
            self.hoist_comments(&mut members);
            members.push(Member::Item(method));
        }

        self.expect(TokenKind::CloseBrace, "`}`")?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        Ok(Interface { name, members })
    }

    fn method(&mut self, target: &Path) -> Result<Method, Error> {
        let signature = self.type_and_name(&[TokenKind::OpenParen])?;
        let return_type = self.resolve_return(&signature.r#type, signature.type_range, target)?;
        self.expect(TokenKind::OpenParen, "`(`")?;

        let mut parameters = Vec::new();
        if self.peek_kind() == Some(TokenKind::CloseParen) {
            self.cursor += 1;
        } else {
            loop {
                parameters.push(self.parameter(target)?);
                let token = self.next_or_eof("`,` or `)`")?;
                match token.kind {
                    TokenKind::Comma => {}
                    TokenKind::CloseParen => break,
                    _ => return Err(self.unexpected(token, "`,` or `)`")),
                }
            }
        }

        let mut raises = Vec::new();
        if self.peek_kind() == Some(TokenKind::KeywordRaises) {
            self.cursor += 1;
            self.expect(TokenKind::OpenParen, "`(`")?;
            loop {
                let (name, range) = self.expect_name()?;
                self.session.registry().resolve_exception(&name, range)?;
                raises.push(name);

                let token = self.next_or_eof("`,` or `)`")?;
                match token.kind {
                    TokenKind::Comma => {}
                    TokenKind::CloseParen => break,
                    _ => return Err(self.unexpected(token, "`,` or `)`")),
                }
            }
        }
        self.expect(TokenKind::Semicolon, "`;`")?;

        Ok(Method {
            name: signature.name,
            return_type,
            parameters,
            raises,
        })
    }

    fn parameter(&mut self, target: &Path) -> Result<Parameter, Error> {
        let token = self.next_or_eof("a parameter direction")?;
        let direction = match token.kind {
            TokenKind::KeywordIn => Direction::In,
            TokenKind::KeywordOut => Direction::Out,
            TokenKind::KeywordInout => Direction::Inout,
            _ => {
                return Err(Error::InvalidDirection {
                    range: token.range,
                    found: token.text(self.source).to_owned(),
                })
            }
        };

        let parameter = self.type_and_name(FIELD_STOPS)?;
        let r#type = self.resolve(&parameter.r#type, parameter.type_range, target)?;
        Ok(Parameter {
            direction,
            name: parameter.name,
            r#type,
        })
    }

    /// Scan a type expression followed by a name, stopping before the first
    /// token in `stops` or a brace. The type is returned in a canonical form,
    /// with words separated by single spaces and symbols written without
    /// surrounding spaces.
    fn type_and_name(&mut self, stops: &[TokenKind]) -> Result<TypedName, Error> {
        let mut words = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.unexpected_eof("a type followed by a name")),
                Some(token) if stops.contains(&token.kind) || BRACES.contains(&token.kind) => {
                    break
                }
                Some(token) => {
                    self.cursor += 1;
                    words.push(token);
                }
            }
        }

        let (name_token, type_tokens) = match words.split_last() {
            Some((name, r#type)) if !r#type.is_empty() => (*name, r#type),
            _ => {
                let token = self.peek().or_else(|| words.last().copied());
                return Err(match token {
                    Some(token) => self.unexpected(token, "a type followed by a name"),
                    None => self.unexpected_eof("a type followed by a name"),
                });
            }
        };
        let name = self.name(name_token)?;

        let mut r#type = String::new();
        let mut previous: Option<TokenKind> = None;
        for token in type_tokens {
            if previous.map_or(false, |kind| kind.is_word_like()) && token.kind.is_word_like() {
                r#type.push(' ');
            }
            r#type.push_str(token.text(self.source));
            previous = Some(token.kind);
        }

        let first = type_tokens[0].range;
        let last = type_tokens[type_tokens.len() - 1].range;
        Ok(TypedName {
            r#type,
            type_range: first.merge(&last).unwrap_or(first),
            name,
            name_range: name_token.range,
        })
    }

    fn resolve(&mut self, r#type: &str, range: FileRange, target: &Path) -> Result<TsType, Error> {
        let mut imports = Vec::new();
        let r#type = self.session.registry().resolve(r#type, range, target, &mut imports)?;
        self.pending.extend(imports.into_iter().map(Declaration::Import));
        Ok(r#type)
    }

    fn resolve_return(
        &mut self,
        r#type: &str,
        range: FileRange,
        target: &Path,
    ) -> Result<TsType, Error> {
        let mut imports = Vec::new();
        let registry = self.session.registry();
        let r#type = registry.resolve_return(r#type, range, target, &mut imports)?;
        self.pending.extend(imports.into_iter().map(Declaration::Import));
        Ok(r#type)
    }

    fn register(
        &mut self,
        name: &str,
        kind: SymbolKind,
        range: FileRange,
        target: &Path,
    ) -> Result<(), Error> {
        let symbol = Symbol {
            kind,
            file: self.path.to_path_buf(),
            target: target.to_path_buf(),
            range,
        };
        self.session.registry_mut().register(name, symbol)
    }

    /// Move comments at the cursor into `pending`.
    fn skip_comments(&mut self) {
        while let Some(token) = self.tokens.get(self.cursor) {
            if !token.kind.is_comment() {
                break;
            }

            let previous_end = match self.cursor {
                0 => 0,
                cursor => self.tokens[cursor - 1].range.end(),
            };
            let leading = &self.source[previous_end as usize..token.range.start() as usize];
            self.pending.push(Declaration::Comment(Comment {
                leading: leading.to_owned(),
                text: token.text(self.source).to_owned(),
            }));
            self.cursor += 1;
        }
    }

    /// Move the pending comments into the members of a struct, enum or
    /// interface, leaving any imports in place.
    fn take_comments<T>(&mut self, members: &mut Vec<Member<T>>) {
        self.skip_comments();
        self.move_comments(members);
    }

    /// Move the comments found inside a member in front of it.
    fn hoist_comments<T>(&mut self, members: &mut Vec<Member<T>>) {
        self.detach_comments();
        self.move_comments(members);
    }

    /// Put the pending comments on lines of their own. They were found inside
    /// a declaration or member, but are emitted before it.
    fn detach_comments(&mut self) {
        for declaration in &mut self.pending {
            if let Declaration::Comment(comment) = declaration {
                if !comment.leading.contains('\n') {
                    comment.leading = "\n".to_owned();
                }
            }
        }
    }

    fn move_comments<T>(&mut self, members: &mut Vec<Member<T>>) {
        let mut pending = Vec::new();
        for declaration in self.pending.drain(..) {
            match declaration {
                Declaration::Comment(comment) => members.push(Member::Comment(comment)),
                declaration => pending.push(declaration),
            }
        }
        self.pending = pending;
    }

    fn peek(&mut self) -> Option<Token> {
        self.skip_comments();
        self.tokens.get(self.cursor).copied()
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn next_or_eof(&mut self, expected: &'static str) -> Result<Token, Error> {
        let token = self.peek().ok_or_else(|| self.unexpected_eof(expected))?;
        self.cursor += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, Error> {
        let token = self.next_or_eof(expected)?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(token, expected))
        }
    }

    fn expect_name(&mut self) -> Result<(String, FileRange), Error> {
        let token = self.next_or_eof("a name")?;
        Ok((self.name(token)?, token.range))
    }

    /// Check that `token` is an identifier.
    fn name(&self, token: Token) -> Result<String, Error> {
        let text = token.text(self.source);
        let is_identifier = token.kind == TokenKind::Word
            && text.starts_with(|c: char| c.is_alphabetic() || c == '_')
            && text.chars().all(|c| c.is_alphanumeric() || c == '_');

        if is_identifier {
            Ok(text.to_owned())
        } else {
            Err(self.unexpected(token, "a name"))
        }
    }

    fn unexpected(&self, token: Token, expected: &'static str) -> Error {
        Error::UnexpectedToken {
            range: token.range,
            found: format!("`{}`", token.text(self.source)),
            expected,
        }
    }

    fn unexpected_eof(&self, expected: &'static str) -> Error {
        let end = self.source.len() as BytePos;
        Error::UnexpectedEof {
            range: FileRange::new(self.file_id, ByteRange::point(end)),
            expected,
        }
    }
}
