use crate::expr::*;
use crate::statement::Stmt;
use crate::token::*;
use crate::trace::{trace_log, Phase};

use num_traits::Num;
use std::{fmt, fmt::Display};

type ExprResult = Result<ExprRef, ParseErr>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrType {
    ExpectedToken(TokenType),
    NotLvalue,
    UnknownStatement,
    UnknownExpression,
    MalformedNumber,
}

/// A grammar violation. `source` is the token the parser choked on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseErr {
    pub data: ParseErrType,
    pub source: Token,
}

impl ParseErr {
    fn new(data: ParseErrType, source: Token) -> Self {
        ParseErr { data, source }
    }
}

fn describe(tok: &Token) -> String {
    match &tok.data {
        TokenType::Eof => "end of input".to_string(),
        TokenType::Text(x) => format!("TEXT \"{}\"", x.escape_debug()),
        TokenType::Number(_) | TokenType::HexNumber(_) | TokenType::Identifier(_) => {
            format!("{} '{}'", tok.data.name(), tok.text())
        }
        other => other.name().to_string(),
    }
}

impl Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] ", self.source.line)?;
        let got = describe(&self.source);
        match &self.data {
            ParseErrType::ExpectedToken(t) => write!(f, "Expected {} but got {}.", t.name(), got),
            ParseErrType::NotLvalue => write!(f, "Cannot assign to {}.", got),
            ParseErrType::UnknownStatement => write!(f, "Unknown statement starting with {}.", got),
            ParseErrType::UnknownExpression => write!(f, "Unknown expression {}.", got),
            ParseErrType::MalformedNumber => write!(f, "Malformed number {}.", got),
        }
    }
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    eof: Token,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        let line = tokens.last().map_or(1, |t| t.line);
        Parser {
            tokens,
            index: 0,
            eof: Token::new(TokenType::Eof, line),
        }
    }

    fn has_next(&self) -> bool {
        self.index < self.tokens.len()
    }

    /// Reading past the last token yields `Eof` forever.
    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.index + offset).unwrap_or(&self.eof)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        self.index += 1;
        tok
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.index - 1]
    }

    fn check(&self, tok: &TokenType) -> bool {
        self.peek().data == *tok
    }

    fn match_next_lits<const N: usize>(&mut self, ttypes: [TokenType; N]) -> bool {
        let res = ttypes.iter().any(|x| self.check(x));
        if res {
            self.index += 1;
        }
        res
    }

    fn match_op<T: Copy, const N: usize>(&mut self, ops: [(TokenType, T); N]) -> Option<T> {
        let data = &self.peek().data;
        let op = ops.iter().find(|(t, _)| t == data).map(|(_, op)| *op)?;
        self.index += 1;
        Some(op)
    }

    fn consume(&mut self, tok: &TokenType) -> Result<&Token, ParseErr> {
        if !self.check(tok) {
            return Err(ParseErr::new(
                ParseErrType::ExpectedToken(tok.clone()),
                self.peek().clone(),
            ));
        }
        self.index += 1;

        Ok(self.previous())
    }

    // Parsing the actual grammar.
    pub fn parse(&mut self) -> Result<Stmt, ParseErr> {
        let mut res = vec![];
        while self.has_next() {
            res.push(self.statement()?);
        }
        trace_log!(Phase::Parse, "{} top-level statements", res.len());
        Ok(Stmt::Block(res))
    }

    fn statement(&mut self) -> Result<Stmt, ParseErr> {
        if self.match_next_lits([TokenType::Writeln]) {
            Ok(Stmt::Write {
                expr: self.expression()?,
                newline: true,
            })
        } else if self.match_next_lits([TokenType::Write]) {
            Ok(Stmt::Write {
                expr: self.expression()?,
                newline: false,
            })
        } else if self.match_next_lits([TokenType::If]) {
            self.if_statement()
        } else if self.match_next_lits([TokenType::Break]) {
            Ok(Stmt::Break)
        } else if self.match_next_lits([TokenType::Continue]) {
            Ok(Stmt::Continue)
        } else if self.match_next_lits([TokenType::While]) {
            self.while_statement()
        } else if self.match_next_lits([TokenType::Repeat]) {
            self.repeat_statement()
        } else {
            self.assignment()
        }
    }

    fn statement_or_block(&mut self) -> Result<Stmt, ParseErr> {
        if self.check(&TokenType::Begin) {
            self.block()
        } else {
            self.statement()
        }
    }

    fn block(&mut self) -> Result<Stmt, ParseErr> {
        self.consume(&TokenType::Begin)?;
        let mut res = vec![];
        while !self.match_next_lits([TokenType::End]) {
            if !self.has_next() {
                return Err(ParseErr::new(
                    ParseErrType::ExpectedToken(TokenType::End),
                    self.peek().clone(),
                ));
            }
            res.push(self.statement()?);
        }
        Ok(Stmt::Block(res))
    }

    fn assignment(&mut self) -> Result<Stmt, ParseErr> {
        let target = self.peek().clone();
        let next = self.peek_at(1).clone();
        match (&target.data, next.data == TokenType::Assign) {
            (TokenType::Identifier(id), true) => {
                self.index += 2;
                Ok(Stmt::Assign(id.clone(), self.expression()?))
            }
            (TokenType::Identifier(_), false) => Err(ParseErr::new(
                ParseErrType::ExpectedToken(TokenType::Assign),
                next,
            )),
            (_, true) => Err(ParseErr::new(ParseErrType::NotLvalue, target.clone())),
            (_, false) => Err(ParseErr::new(ParseErrType::UnknownStatement, target.clone())),
        }
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseErr> {
        let cond = self.expression()?;
        self.consume(&TokenType::Then)?;
        let stmt = self.statement_or_block()?;
        if self.match_next_lits([TokenType::Else]) {
            let other = self.statement_or_block()?;
            Ok(Stmt::If(cond, Box::new(stmt), Some(Box::new(other))))
        } else {
            Ok(Stmt::If(cond, Box::new(stmt), None))
        }
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseErr> {
        let cond = self.expression()?;
        self.consume(&TokenType::Do)?;
        let body = self.statement_or_block()?;
        Ok(Stmt::While(cond, Box::new(body)))
    }

    fn repeat_statement(&mut self) -> Result<Stmt, ParseErr> {
        let body = self.statement_or_block()?;
        self.consume(&TokenType::Until)?;
        let cond = self.expression()?;
        Ok(Stmt::RepeatUntil(Box::new(body), cond))
    }

    fn expression(&mut self) -> ExprResult {
        self.logic_or()
    }

    fn logic_or(&mut self) -> ExprResult {
        let mut expr = self.logic_and()?;
        while self.match_next_lits([TokenType::Or]) {
            let right = self.logic_and()?;
            expr = Box::new(Expr::Logical(LogicOp::Or, expr, right));
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while self.match_next_lits([TokenType::And]) {
            let right = self.equality()?;
            expr = Box::new(Expr::Logical(LogicOp::And, expr, right));
        }
        Ok(expr)
    }

    // Not left-folded: `a == b == c` leaves `== c` for the caller.
    fn equality(&mut self) -> ExprResult {
        let expr = self.comparison()?;
        match self.match_op([
            (TokenType::EqualEqual, RelOp::Equal),
            (TokenType::NotEqual, RelOp::NotEqual),
        ]) {
            Some(op) => {
                let right = self.comparison()?;
                Ok(Box::new(Expr::Relational(op, expr, right)))
            }
            None => Ok(expr),
        }
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while let Some(op) = self.match_op([
            (TokenType::Less, RelOp::Less),
            (TokenType::LessEqual, RelOp::LessEqual),
            (TokenType::Greater, RelOp::Greater),
            (TokenType::GreaterEqual, RelOp::GreaterEqual),
        ]) {
            let right = self.term()?;
            expr = Box::new(Expr::Relational(op, expr, right));
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while let Some(op) = self.match_op([
            (TokenType::Plus, ArithOp::Add),
            (TokenType::Minus, ArithOp::Sub),
        ]) {
            let right = self.factor()?;
            expr = Box::new(Expr::Arithmetic(op, expr, right));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while let Some(op) = self.match_op([
            (TokenType::Star, ArithOp::Mul),
            (TokenType::Slash, ArithOp::Div),
        ]) {
            let right = self.unary()?;
            expr = Box::new(Expr::Arithmetic(op, expr, right));
        }
        Ok(expr)
    }

    // The operand of a sign is a primary, so `--x` does not parse.
    fn unary(&mut self) -> ExprResult {
        match self.match_op([(TokenType::Minus, Sign::Minus), (TokenType::Plus, Sign::Plus)]) {
            Some(op) => Ok(Box::new(Expr::Unary(op, self.primary()?))),
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> ExprResult {
        let tok = self.advance();
        let res = match &tok.data {
            TokenType::Number(x) => match x.parse() {
                Ok(num) => Expr::Literal(Val::Num(num)),
                Err(_) => return Err(ParseErr::new(ParseErrType::MalformedNumber, tok.clone())),
            },
            TokenType::HexNumber(x) => match <f64 as Num>::from_str_radix(x, 16) {
                Ok(num) if !x.is_empty() => Expr::Literal(Val::Num(num)),
                _ => return Err(ParseErr::new(ParseErrType::MalformedNumber, tok.clone())),
            },
            TokenType::Identifier(x) => Expr::Variable(x.clone()),
            TokenType::Text(x) => Expr::Literal(Val::String(x.clone())),
            TokenType::LeftParen => {
                let expr = *self.expression()?;
                // A missing `)` is tolerated.
                self.match_next_lits([TokenType::RightParen]);
                expr
            }
            _ => return Err(ParseErr::new(ParseErrType::UnknownExpression, tok)),
        };

        Ok(Box::new(res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;

    fn parse(code: &str) -> Result<Stmt, ParseErr> {
        let tokens = scan(code).unwrap();
        Parser::new(&tokens).parse()
    }

    fn parse_expr(code: &str) -> String {
        let Stmt::Block(stmts) = parse(&format!("x := {code}")).unwrap() else {
            panic!("program is not a block");
        };
        let Stmt::Assign(_, expr) = &stmts[0] else {
            panic!("not an assignment: {:?}", stmts[0]);
        };
        expr.to_string()
    }

    fn err(code: &str) -> ParseErrType {
        parse(code).unwrap_err().data
    }

    #[test]
    fn precedence_ladder() {
        assert_eq!(parse_expr("2 + 3 * 4"), "[2 + [3 * 4]]");
        assert_eq!(parse_expr("(2 + 3) * 4"), "[[2 + 3] * 4]");
        assert_eq!(parse_expr("1 - 2 - 3"), "[[1 - 2] - 3]");
        assert_eq!(parse_expr("a < b + 1"), "[a < [b + 1]]");
        assert_eq!(parse_expr("a == 1 or b == 2 and c"), "[[a == 1] or [[b == 2] and c]]");
        assert_eq!(parse_expr("a < b == c > d"), "[[a < b] == [c > d]]");
        assert_eq!(parse_expr("-a * b"), "[[- a] * b]");
    }

    #[test]
    fn equality_binds_once() {
        // The second `==` cannot start a statement.
        assert_eq!(err("x := a == b == c"), ParseErrType::UnknownStatement);
    }

    #[test]
    fn sign_takes_primary() {
        assert_eq!(parse_expr("-(1 + 2)"), "[- [1 + 2]]");
        assert_eq!(err("x := --1"), ParseErrType::UnknownExpression);
    }

    #[test]
    fn literals() {
        assert_eq!(parse_expr("#ff"), "255");
        assert_eq!(parse_expr("#10"), "16");
        assert_eq!(parse_expr("1.5"), "1.5");
        assert_eq!(parse_expr("\"hi\""), "\"hi\"");
        assert_eq!(err("x := #"), ParseErrType::MalformedNumber);
    }

    #[test]
    fn unclosed_paren_is_tolerated() {
        assert_eq!(parse_expr("(1 + 2"), "[1 + 2]");
    }

    #[test]
    fn statements_render() {
        let program = parse(
            "if a then writeln 1 else write 2
             while x < 3 do begin x := x + 1 break end
             repeat continue until 1",
        )
        .unwrap();
        assert_eq!(
            program.to_string(),
            "begin\n\
             if a then writeln 1\nelse write 2\n\
             while [x < 3] do begin\nx := [x + 1]\nbreak\nend\n\
             repeat continue until 1\n\
             end"
        );
    }

    #[test]
    fn dangling_else_binds_inner() {
        let Stmt::Block(stmts) = parse("if a then if b then x := 1 else x := 2").unwrap() else {
            panic!("program is not a block");
        };
        assert_eq!(stmts.len(), 1);
        let Stmt::If(_, inner, None) = &stmts[0] else {
            panic!("outer if has an else");
        };
        assert!(matches!(**inner, Stmt::If(_, _, Some(_))));
    }

    #[test]
    fn missing_keywords() {
        assert_eq!(err("if 1 writeln 2"), ParseErrType::ExpectedToken(TokenType::Then));
        assert_eq!(err("while 1 writeln 2"), ParseErrType::ExpectedToken(TokenType::Do));
        assert_eq!(err("repeat x := 1"), ParseErrType::ExpectedToken(TokenType::Until));
        assert_eq!(err("while 1 do begin x := 1"), ParseErrType::ExpectedToken(TokenType::End));
    }

    #[test]
    fn bad_statements() {
        assert_eq!(err("5 := 3"), ParseErrType::NotLvalue);
        assert_eq!(err("x 5"), ParseErrType::ExpectedToken(TokenType::Assign));
        assert_eq!(err("then"), ParseErrType::UnknownStatement);
        assert_eq!(err("for"), ParseErrType::UnknownStatement);
        assert_eq!(err("writeln"), ParseErrType::UnknownExpression);
    }

    #[test]
    fn errors_name_the_token() {
        let e = parse("x := 1\nif x writeln x").unwrap_err();
        assert_eq!(e.source.line, 2);
        assert_eq!(e.to_string(), "[line 2] Expected THEN but got WRITELN.");

        let e = parse("writeln").unwrap_err();
        assert_eq!(e.to_string(), "[line 1] Unknown expression end of input.");
    }

    #[test]
    fn empty_program() {
        assert_eq!(parse("// nothing").unwrap(), Stmt::Block(vec![]));
    }
}
