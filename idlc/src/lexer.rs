use logos::Logos;

use crate::files::FileId;
use crate::reporting::Error;
use crate::source::{BytePos, ByteRange, FileRange, Position, MAX_SOURCE_LEN};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Logos)]
pub enum TokenKind {
    #[regex(r#"[^ \t\n\r\x0C()<>/*;,'"{}]+"#)]
    Word,

    #[token("module")]
    KeywordModule,
    #[token("typedef")]
    KeywordTypedef,
    #[token("struct")]
    KeywordStruct,
    #[token("exception")]
    KeywordException,
    #[token("enum")]
    KeywordEnum,
    #[token("interface")]
    KeywordInterface,
    #[token("raises")]
    KeywordRaises,
    #[token("in")]
    KeywordIn,
    #[token("out")]
    KeywordOut,
    #[token("inout")]
    KeywordInout,

    #[token("#include")]
    DirectiveInclude,
    #[token("#ifndef")]
    DirectiveIfndef,
    #[token("#endif")]
    DirectiveEndif,
    #[token("#define")]
    DirectiveDefine,

    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("/")]
    ForwardSlash,
    #[token("*")]
    Star,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("'")]
    Quote,
    #[token("\"")]
    DoubleQuote,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,

    #[regex(r"//[^\r\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    #[error]
    #[regex(r"[ \t\n\r\x0C]+", logos::skip)]
    Error,
}

const OPEN: &str = "/*";
const CLOSE: &str = "*/";

/// Consumes the rest of a block comment. Comments do not nest.
fn block_comment(lexer: &mut logos::Lexer<'_, TokenKind>) -> bool {
    match lexer.remainder().find(CLOSE) {
        Some(end) => {
            lexer.bump(end + CLOSE.len());
            true
        }
        None => {
            lexer.bump(lexer.remainder().len());
            false
        }
    }
}

impl TokenKind {
    pub fn description(&self) -> &'static str {
        match self {
            TokenKind::Word => "name",
            TokenKind::KeywordModule => "module",
            TokenKind::KeywordTypedef => "typedef",
            TokenKind::KeywordStruct => "struct",
            TokenKind::KeywordException => "exception",
            TokenKind::KeywordEnum => "enum",
            TokenKind::KeywordInterface => "interface",
            TokenKind::KeywordRaises => "raises",
            TokenKind::KeywordIn => "in",
            TokenKind::KeywordOut => "out",
            TokenKind::KeywordInout => "inout",
            TokenKind::DirectiveInclude => "#include",
            TokenKind::DirectiveIfndef => "#ifndef",
            TokenKind::DirectiveEndif => "#endif",
            TokenKind::DirectiveDefine => "#define",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::ForwardSlash => "/",
            TokenKind::Star => "*",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Quote => "'",
            TokenKind::DoubleQuote => "\"",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::LineComment => "line comment",
            TokenKind::BlockComment => "block comment",
            TokenKind::Error => "error",
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Words and keywords, the tokens that can spell part of a type
    /// expression or a declared name.
    pub fn is_word_like(&self) -> bool {
        matches!(
            self,
            TokenKind::Word
                | TokenKind::KeywordModule
                | TokenKind::KeywordTypedef
                | TokenKind::KeywordStruct
                | TokenKind::KeywordException
                | TokenKind::KeywordEnum
                | TokenKind::KeywordInterface
                | TokenKind::KeywordRaises
                | TokenKind::KeywordIn
                | TokenKind::KeywordOut
                | TokenKind::KeywordInout
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: FileRange,
    pub position: Position,
}

impl Token {
    pub fn text<'source>(&self, source: &'source str) -> &'source str {
        &source[std::ops::Range::<usize>::from(self.range)]
    }
}

/// Split `source` into tokens, dropping whitespace.
///
/// Comments are kept as tokens so that they can be passed through to the
/// generated code.
pub fn tokens(file_id: FileId, source: &str) -> Result<Vec<Token>, Error> {
    assert!(
        source.len() <= MAX_SOURCE_LEN,
        "`source` must be less than 4GiB in length"
    );

    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    let mut position = Position::START;
    let mut consumed = 0;

    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        advance(&mut position, &source[consumed..span.start]);
        consumed = span.start;

        let start = span.start as BytePos;
        let end = span.end as BytePos;
        match kind {
            TokenKind::Error if lexer.slice().starts_with(OPEN) => {
                let open = ByteRange::new(start, start + OPEN.len() as BytePos);
                return Err(Error::UnclosedBlockComment {
                    range: FileRange::new(file_id, open),
                });
            }
            TokenKind::Error => {
                return Err(Error::UnexpectedCharacter {
                    range: FileRange::new(file_id, ByteRange::new(start, end)),
                });
            }
            kind => tokens.push(Token {
                kind,
                range: FileRange::new(file_id, ByteRange::new(start, end)),
                position,
            }),
        }
    }

    Ok(tokens)
}

/// Move `position` past `text`. Carriage returns do not advance the column.
fn advance(position: &mut Position, text: &str) {
    for c in text.chars() {
        match c {
            '\n' => {
                position.line += 1;
                position.col = 1;
            }
            '\r' => {}
            _ => position.col += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::Files;

    fn lex(source: &str) -> Result<Vec<Token>, Error> {
        let mut files = Files::new();
        let file_id = files.add("test.idl", source);
        tokens(file_id, source)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().iter().map(|token| token.kind).collect()
    }

    #[test]
    fn keywords_need_a_boundary() {
        assert_eq!(
            kinds("module moduleX module{"),
            vec![
                TokenKind::KeywordModule,
                TokenKind::Word,
                TokenKind::KeywordModule,
                TokenKind::OpenBrace,
            ],
        );
    }

    #[test]
    fn directives_are_single_tokens() {
        let source = "#include \"types.idl\"\n#ifndef A\n#define A\n#endif";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::DirectiveInclude,
                TokenKind::DoubleQuote,
                TokenKind::Word,
                TokenKind::DoubleQuote,
                TokenKind::DirectiveIfndef,
                TokenKind::Word,
                TokenKind::DirectiveDefine,
                TokenKind::Word,
                TokenKind::DirectiveEndif,
            ],
        );
    }

    #[test]
    fn symbols_split_words() {
        let source = "sequence<octet>;";
        let tokens = lex(source).unwrap();
        let texts: Vec<_> = tokens.iter().map(|token| token.text(source)).collect();
        assert_eq!(texts, vec!["sequence", "<", "octet", ">", ";"]);
    }

    #[test]
    fn comments_are_kept() {
        let source = "// one\n/* two */ typedef";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        assert_eq!(tokens[0].text(source), "// one");
        assert_eq!(tokens[1].kind, TokenKind::BlockComment);
        assert_eq!(tokens[1].text(source), "/* two */");
        assert_eq!(tokens[2].kind, TokenKind::KeywordTypedef);
    }

    #[test]
    fn line_comments_stop_before_carriage_returns() {
        let source = "// one\r\ntypedef";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens[0].text(source), "// one");
        assert_eq!(tokens[1].kind, TokenKind::KeywordTypedef);
        assert_eq!(tokens[1].position, Position { line: 2, col: 1 });
    }

    #[test]
    fn positions_after_block_comment() {
        let source = "/* a\n b\n */ struct\n  enum";
        let tokens = lex(source).unwrap();
        assert_eq!(tokens[0].position, Position { line: 1, col: 1 });
        assert_eq!(tokens[1].position, Position { line: 3, col: 5 });
        assert_eq!(tokens[2].position, Position { line: 4, col: 3 });
    }

    #[test]
    fn unterminated_block_comment() {
        match lex("typedef /* oops") {
            Err(Error::UnclosedBlockComment { range }) => {
                assert_eq!((range.start(), range.end()), (8, 10));
            }
            result => panic!("unexpected result: {result:?}"),
        }
    }
}
