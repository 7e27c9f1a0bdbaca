use super::token::*;
use crate::trace::{trace_log, Phase};
use std::fmt;

/// Every operator the scanner knows. Fixed for the lifetime of the program.
const OPERATORS: [&str; 18] = [
    "+", "-", "*", "/", "(", ")", ":=", "<", ">", "==", "<>", "<=", ">=", "and", "or", "not",
    "begin", "end",
];

/// Word operators are only recognised ahead of generic words when followed by a space.
const WORD_OPERATORS: [&str; 5] = ["and", "not", "or", "begin", "end"];

fn operator_token(op: &str) -> Option<TokenType> {
    let tok = match op {
        "+" => TokenType::Plus,
        "-" => TokenType::Minus,
        "*" => TokenType::Star,
        "/" => TokenType::Slash,
        "(" => TokenType::LeftParen,
        ")" => TokenType::RightParen,
        ":=" => TokenType::Assign,
        "<" => TokenType::Less,
        ">" => TokenType::Greater,
        "==" => TokenType::EqualEqual,
        "<>" => TokenType::NotEqual,
        "<=" => TokenType::LessEqual,
        ">=" => TokenType::GreaterEqual,
        "and" => TokenType::And,
        "or" => TokenType::Or,
        "not" => TokenType::Not,
        "begin" => TokenType::Begin,
        "end" => TokenType::End,
        _ => return None,
    };
    Some(tok)
}

fn is_operator_prefix(buf: &str) -> bool {
    OPERATORS.iter().any(|op| op.starts_with(buf))
}

fn starts_operator(c: char) -> bool {
    OPERATORS.iter().any(|op| op.starts_with(c))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanErr {
    MalformedNumber { text: String, line: usize },
    UnterminatedComment { line: usize },
    UnknownOperator { op: String, line: usize },
}

impl fmt::Display for ScanErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedNumber { text, line } => {
                write!(f, "[line {line}] Malformed real number '{text}'.")
            }
            Self::UnterminatedComment { line } => {
                write!(f, "[line {line}] Missing closing tag '}}' for comment.")
            }
            Self::UnknownOperator { op, line } => {
                write!(f, "[line {line}] Unknown operator '{op}'.")
            }
        }
    }
}

struct Scanner<'a> {
    str: &'a [char],
    index: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(str: &'a [char]) -> Self {
        Self {
            str,
            index: 0,
            line: 1,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.str.get(self.index).copied();
        if c.is_some() {
            self.index += 1;
        }
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.str.get(self.index + offset).copied()
    }

    fn line(&self) -> usize {
        self.line
    }

    /// True if `word` followed by a single space starts at the current position.
    fn lookahead(&self, word: &str) -> bool {
        let mut len = 0;
        for (i, c) in word.chars().enumerate() {
            if self.peek_at(i) != Some(c) {
                return false;
            }
            len = i + 1;
        }
        self.peek_at(len) == Some(' ')
    }

    fn number(&mut self) -> Result<TokenType, ScanErr> {
        let mut buf = String::new();
        while let Some(c) = self.peek() {
            if c == '.' {
                if buf.contains('.') {
                    buf.push(c);
                    return Err(ScanErr::MalformedNumber {
                        text: buf,
                        line: self.line,
                    });
                }
            } else if !c.is_ascii_digit() {
                break;
            }
            buf.push(c);
            self.advance();
        }
        Ok(TokenType::Number(buf.into()))
    }

    fn hex_number(&mut self) -> TokenType {
        let mut buf = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
            buf.push(c);
            self.advance();
        }
        TokenType::HexNumber(buf.into())
    }

    fn text(&mut self) -> TokenType {
        let mut buf = String::new();
        while let Some(c) = self.advance() {
            match c {
                '"' => break,
                '\\' => match self.peek() {
                    Some('"') => {
                        self.advance();
                        buf.push('"');
                    }
                    Some('n') => {
                        self.advance();
                        buf.push('\n');
                    }
                    Some('t') => {
                        self.advance();
                        buf.push('\t');
                    }
                    // Unknown escape: keep the backslash, rescan what follows.
                    _ => buf.push('\\'),
                },
                c => buf.push(c),
            }
        }
        TokenType::Text(buf.into())
    }

    fn line_comment(&mut self) {
        while !matches!(self.peek(), Some('\n' | '\r') | None) {
            self.advance();
        }
    }

    fn block_comment(&mut self) -> Result<(), ScanErr> {
        let line = self.line;
        loop {
            match self.advance() {
                Some('}') => return Ok(()),
                Some(_) => continue,
                None => return Err(ScanErr::UnterminatedComment { line }),
            }
        }
    }

    fn word(&mut self) -> TokenType {
        for op in WORD_OPERATORS {
            if self.lookahead(op) {
                for _ in op.chars() {
                    self.advance();
                }
                if let Some(tok) = operator_token(op) {
                    return tok;
                }
            }
        }

        let mut buf = String::new();
        while let Some(c) = self
            .peek()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        {
            buf.push(c);
            self.advance();
        }

        TokenType::keyword(&buf).unwrap_or_else(|| TokenType::Identifier(buf.into()))
    }

    fn operator(&mut self) -> Result<TokenType, ScanErr> {
        let mut buf = String::new();
        while let Some(c) = self.peek() {
            buf.push(c);
            if !is_operator_prefix(&buf) {
                buf.pop();
                break;
            }
            self.advance();
        }

        operator_token(&buf).ok_or(ScanErr::UnknownOperator {
            op: buf,
            line: self.line,
        })
    }
}

pub fn scan(code: &str) -> Result<Vec<Token>, ScanErr> {
    let chars = code.chars().collect::<Vec<_>>();
    let mut scanner = Scanner::new(&chars);
    let mut result = vec![];

    while let Some(c) = scanner.peek() {
        let line = scanner.line();
        let tok = match c {
            '0'..='9' => scanner.number()?,
            '#' => {
                scanner.advance();
                scanner.hex_number()
            }
            '"' => {
                scanner.advance();
                scanner.text()
            }
            '/' if scanner.peek_at(1) == Some('/') => {
                scanner.line_comment();
                continue;
            }
            '{' => {
                scanner.advance();
                scanner.block_comment()?;
                continue;
            }
            c if c.is_alphabetic() => scanner.word(),
            c if starts_operator(c) => scanner.operator()?,
            _ => {
                scanner.advance();
                continue;
            }
        };

        result.push(Token::new(tok, line));
    }

    trace_log!(Phase::Scan, "{} tokens over {} lines", result.len(), scanner.line());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<TokenType> {
        scan(code).unwrap().into_iter().map(|t| t.data).collect()
    }

    #[test]
    fn assignment_and_arithmetic() {
        assert_eq!(
            kinds("x := 2 + 3 * 4;"),
            vec![
                TokenType::Identifier("x".into()),
                TokenType::Assign,
                TokenType::Number("2".into()),
                TokenType::Plus,
                TokenType::Number("3".into()),
                TokenType::Star,
                TokenType::Number("4".into()),
            ]
        );
    }

    #[test]
    fn number_literal_keeps_digits() {
        for lit in ["0", "42", "3.14", "007", "10."] {
            let toks = scan(lit).unwrap();
            assert_eq!(toks.len(), 1);
            assert_eq!(toks[0].text(), lit);
        }
    }

    #[test]
    fn second_decimal_point() {
        assert!(matches!(
            scan("x := 1.2.3"),
            Err(ScanErr::MalformedNumber { line: 1, .. })
        ));
    }

    #[test]
    fn comparison_operators_longest_match() {
        assert_eq!(
            kinds("< <= <> > >= =="),
            vec![
                TokenType::Less,
                TokenType::LessEqual,
                TokenType::NotEqual,
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::EqualEqual,
            ]
        );
        assert_eq!(kinds("a<>b").len(), 3);
    }

    #[test]
    fn lone_colon_is_rejected() {
        assert!(matches!(scan("x : 1"), Err(ScanErr::UnknownOperator { .. })));
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("writeln write if then else while for do repeat until break continue"),
            vec![
                TokenType::Writeln,
                TokenType::Write,
                TokenType::If,
                TokenType::Then,
                TokenType::Else,
                TokenType::While,
                TokenType::For,
                TokenType::Do,
                TokenType::Repeat,
                TokenType::Until,
                TokenType::Break,
                TokenType::Continue,
            ]
        );
    }

    #[test]
    fn word_operators_need_trailing_space() {
        assert_eq!(
            kinds("a and b or not c"),
            vec![
                TokenType::Identifier("a".into()),
                TokenType::And,
                TokenType::Identifier("b".into()),
                TokenType::Or,
                TokenType::Not,
                TokenType::Identifier("c".into()),
            ]
        );
        assert_eq!(kinds("and(")[0], TokenType::Identifier("and".into()));
        assert_eq!(kinds("android")[0], TokenType::Identifier("android".into()));
        assert_eq!(kinds("begin\nend"), vec![TokenType::Begin, TokenType::End]);
    }

    #[test]
    fn identifiers_allow_underscore_and_dollar() {
        assert_eq!(kinds("a_b$1")[0], TokenType::Identifier("a_b$1".into()));
    }

    #[test]
    fn hex_literal() {
        assert_eq!(kinds("#FF")[0], TokenType::HexNumber("FF".into()));
        assert_eq!(kinds("#1a2b")[0], TokenType::HexNumber("1a2b".into()));
    }

    #[test]
    fn text_escapes() {
        assert_eq!(
            kinds(r#""say \"hi\"\n\tok""#)[0],
            TokenType::Text("say \"hi\"\n\tok".into())
        );
        assert_eq!(kinds(r#""a\qb""#)[0], TokenType::Text("a\\qb".into()));
        assert_eq!(kinds(r#""open"#)[0], TokenType::Text("open".into()));
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("// nothing here\nx { also\nnothing } y"),
            vec![
                TokenType::Identifier("x".into()),
                TokenType::Identifier("y".into()),
            ]
        );
        assert_eq!(kinds("1 / 2").len(), 3);
    }

    #[test]
    fn unterminated_block_comment() {
        assert_eq!(
            scan("x := 1\n{ never closed"),
            Err(ScanErr::UnterminatedComment { line: 2 })
        );
    }

    #[test]
    fn lines_are_tracked() {
        let toks = scan("a\n\"b\nc\"\nd").unwrap();
        let lines: Vec<usize> = toks.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }
}
