use std::rc::Rc;

use mapl_core::{intern, FnDef, MapData, MaplError, Span, Spur, Value};

use crate::lexer::{tokenize, SpannedToken, Token};

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    arrow: Spur,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser {
            tokens,
            pos: 0,
            arrow: intern("->"),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or(Span { line: 0, col: 0 })
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), MaplError> {
        let span = self.span();
        match self.advance() {
            Some(t) if &t.token == expected => Ok(()),
            Some(t) => Err(MaplError::reader(
                format!("expected {expected:?}, got {:?}", t.token),
                span,
            )),
            None => Err(MaplError::reader(
                format!("expected {expected:?}, got end of input"),
                span,
            )),
        }
    }

    fn parse_expr(&mut self) -> Result<Value, MaplError> {
        let span = self.span();
        match self.peek() {
            None => Err(MaplError::reader("unexpected end of input", span)),
            Some(Token::LParen) => self.parse_application(),
            Some(Token::LBracket) => self.parse_sequence(),
            Some(Token::LBrace) => self.parse_brace(),
            Some(Token::RParen | Token::RBracket | Token::RBrace) => Err(MaplError::reader(
                "unexpected closing bracket",
                span,
            )),
            Some(_) => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Value, MaplError> {
        let span = self.span();
        match self.advance() {
            Some(SpannedToken {
                token: Token::Nat(n),
                ..
            }) => Ok(Value::natural(*n)),
            Some(SpannedToken {
                token: Token::Symbol(s),
                ..
            }) => Ok(Value::symbol(s)),
            Some(t) => Err(MaplError::reader(
                format!("unexpected token: {:?}", t.token),
                span,
            )),
            None => Err(MaplError::reader("unexpected end of input", span)),
        }
    }

    /// `(...)`: an application. Zero children is the no-op application.
    fn parse_application(&mut self) -> Result<Value, MaplError> {
        self.expect(&Token::LParen)?;
        let mut items = Vec::new();
        while self.peek() != Some(&Token::RParen) {
            if self.peek().is_none() {
                return Err(MaplError::reader("unclosed application", self.span()));
            }
            items.push(self.parse_expr()?);
        }
        self.expect(&Token::RParen)?;
        Ok(Value::call(items))
    }

    /// `[...]`: an indexed sequence, a mapping keyed by the canonical
    /// naturals 0..n in reading order.
    fn parse_sequence(&mut self) -> Result<Value, MaplError> {
        self.expect(&Token::LBracket)?;
        let mut items = Vec::new();
        while self.peek() != Some(&Token::RBracket) {
            if self.peek().is_none() {
                return Err(MaplError::reader("unclosed sequence literal", self.span()));
            }
            items.push(self.parse_expr()?);
        }
        self.expect(&Token::RBracket)?;
        Ok(Value::sequence(items))
    }

    /// `{...}`: either a function literal or a map literal. With at least
    /// three children and `->` second, the children are parameter list,
    /// arrow, and body sequence; otherwise they pair up into map entries.
    fn parse_brace(&mut self) -> Result<Value, MaplError> {
        let open_span = self.span();
        self.expect(&Token::LBrace)?;
        let mut children = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(MaplError::reader(
                    "unclosed map or function literal",
                    self.span(),
                ));
            }
            children.push(self.parse_expr()?);
        }
        self.expect(&Token::RBrace)?;

        if children.len() >= 3 && children[1].as_symbol_spur() == Some(self.arrow) {
            let params = self.parameter_names(&children[0], open_span)?;
            let body = children[2..].to_vec();
            return Ok(Value::Fn(Rc::new(FnDef { params, body })));
        }

        if children.len() % 2 != 0 {
            return Err(MaplError::reader(
                "map literal must have an even number of forms",
                open_span,
            ));
        }
        let mut map = MapData::new();
        for pair in children.chunks(2) {
            map.insert(pair[0].clone(), pair[1].clone());
        }
        Ok(Value::map(map))
    }

    /// Flatten a parameter application (operator + operands) into names.
    fn parameter_names(&self, list: &Value, span: Span) -> Result<Vec<Spur>, MaplError> {
        let items = list.as_call().ok_or_else(|| {
            MaplError::reader(
                format!("function parameters must be an application form, got {list}"),
                span,
            )
        })?;
        items
            .iter()
            .map(|item| {
                item.as_symbol_spur().ok_or_else(|| {
                    MaplError::reader(format!("function parameter must be a name, got {item}"), span)
                })
            })
            .collect()
    }
}

/// Read a single expression from a string.
pub fn read(input: &str) -> Result<Value, MaplError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    parser.parse_expr()
}

/// Read all top-level expressions from a string.
pub fn read_many(input: &str) -> Result<Vec<Value>, MaplError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(tokens);
    let mut exprs = Vec::new();
    while parser.peek().is_some() {
        exprs.push(parser.parse_expr()?);
    }
    Ok(exprs)
}
