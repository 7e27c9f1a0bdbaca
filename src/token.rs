use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub data: TokenType,
    pub line: usize,
}

impl Token {
    pub fn new(data: TokenType, line: usize) -> Self {
        Token { data, line }
    }

    /// Literal payload of the token. Empty for keywords and operators.
    pub fn text(&self) -> &str {
        match &self.data {
            TokenType::Number(x)
            | TokenType::HexNumber(x)
            | TokenType::Identifier(x)
            | TokenType::Text(x) => x,
            _ => "",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.data.name(), self.text())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Number(Rc<str>),
    HexNumber(Rc<str>),
    Identifier(Rc<str>),
    Text(Rc<str>),

    Writeln,
    Write,
    If,
    Then,
    Else,
    Begin,
    End,
    While,
    For,
    Do,
    Repeat,
    Until,
    Break,
    Continue,

    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Not,
    NotEqual,
    Or,
    And,

    LeftParen,
    RightParen,

    Eof,
}

impl TokenType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number(_) => "NUM",
            Self::HexNumber(_) => "HEX_NUM",
            Self::Identifier(_) => "WORD",
            Self::Text(_) => "TEXT",
            Self::Writeln => "WRITELN",
            Self::Write => "WRITE",
            Self::If => "IF",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::Begin => "BEGIN",
            Self::End => "END",
            Self::While => "WHILE",
            Self::For => "FOR",
            Self::Do => "DO",
            Self::Repeat => "REPEAT",
            Self::Until => "UNTIL",
            Self::Break => "BREAK",
            Self::Continue => "CONTINUE",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Star => "STAR",
            Self::Slash => "SLASH",
            Self::Assign => "ASSIGN",
            Self::EqualEqual => "EQUALEQUAL",
            Self::Greater => "GREATER",
            Self::GreaterEqual => "GREATEREQUAL",
            Self::Less => "LESS",
            Self::LessEqual => "LESSEQUAL",
            Self::Not => "NOT",
            Self::NotEqual => "NOTEQUAL",
            Self::Or => "OR",
            Self::And => "AND",
            Self::LeftParen => "LPAREN",
            Self::RightParen => "RPAREN",
            Self::Eof => "EOF",
        }
    }

    /// Maps a scanned word onto its keyword, if it is reserved.
    pub fn keyword(word: &str) -> Option<TokenType> {
        let kw = match word {
            "writeln" => Self::Writeln,
            "write" => Self::Write,
            "if" => Self::If,
            "then" => Self::Then,
            "else" => Self::Else,
            "begin" => Self::Begin,
            "end" => Self::End,
            "while" => Self::While,
            "for" => Self::For,
            "do" => Self::Do,
            "repeat" => Self::Repeat,
            "until" => Self::Until,
            "break" => Self::Break,
            "continue" => Self::Continue,
            _ => return None,
        };
        Some(kw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_format() {
        assert_eq!(Token::new(TokenType::Number("14".into()), 1).to_string(), "NUM 14");
        assert_eq!(Token::new(TokenType::Assign, 1).to_string(), "ASSIGN ");
        assert_eq!(Token::new(TokenType::Identifier("x".into()), 3).text(), "x");
    }

    #[test]
    fn reserved_words() {
        assert_eq!(TokenType::keyword("until"), Some(TokenType::Until));
        assert_eq!(TokenType::keyword("for"), Some(TokenType::For));
        assert_eq!(TokenType::keyword("and"), None);
        assert_eq!(TokenType::keyword("Writeln"), None);
    }
}
