//! Hand-written tokenizer and recursive-descent parser for path expressions.

use super::ast::{Expr, LocationPath, NodeTest, Predicate, Step};
use crate::error::{ReflectionError, ReflectionResult};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    At,
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Equals,
    Name(String),
    Number(f64),
    Literal(String),
}

fn tokenize(input: &str) -> ReflectionResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    tokens.push(Token::DoubleSlash);
                } else {
                    tokens.push(Token::Slash);
                }
            }
            '@' => {
                chars.next();
                tokens.push(Token::At);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Equals);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => literal.push(ch),
                        None => {
                            return Err(ReflectionError::Expression(
                                "unterminated string literal".to_string(),
                            ))
                        }
                    }
                }
                tokens.push(Token::Literal(literal));
            }
            '0'..='9' => {
                let mut number = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        number.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = number.parse().map_err(|_| {
                    ReflectionError::Expression(format!("invalid number '{}'", number))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(ReflectionError::Expression(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

/// Parse an expression string into its AST.
pub fn parse(input: &str) -> ReflectionResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ReflectionError::Expression("empty expression".to_string()));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ReflectionError::Expression(format!(
            "unexpected trailing input in '{}'",
            input
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> ReflectionResult<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(ReflectionError::Expression(format!(
                "expected {:?}, found {:?}",
                expected, other
            ))),
        }
    }

    fn parse_expr(&mut self) -> ReflectionResult<Expr> {
        match self.peek() {
            Some(Token::Literal(_)) => {
                if let Some(Token::Literal(s)) = self.next() {
                    Ok(Expr::StringLiteral(s))
                } else {
                    unreachable!()
                }
            }
            Some(Token::Number(_)) => {
                if let Some(Token::Number(n)) = self.next() {
                    Ok(Expr::NumberLiteral(n))
                } else {
                    unreachable!()
                }
            }
            // A name followed by '(' is a function call, except text(),
            // which is a node test and belongs to a path.
            Some(Token::Name(name))
                if self.peek_at(1) == Some(&Token::LParen) && name != "text" =>
            {
                self.parse_call()
            }
            _ => Ok(Expr::Path(self.parse_path()?)),
        }
    }

    fn parse_call(&mut self) -> ReflectionResult<Expr> {
        let name = match self.next() {
            Some(Token::Name(name)) => name,
            other => {
                return Err(ReflectionError::Expression(format!(
                    "expected function name, found {:?}",
                    other
                )))
            }
        };
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                match self.peek() {
                    Some(Token::Comma) => {
                        self.next();
                    }
                    _ => break,
                }
            }
        }
        self.expect(Token::RParen)?;
        Ok(Expr::Call { name, args })
    }

    fn parse_path(&mut self) -> ReflectionResult<LocationPath> {
        let (absolute, mut descendant) = match self.peek() {
            Some(Token::Slash) => {
                self.next();
                (true, false)
            }
            Some(Token::DoubleSlash) => {
                self.next();
                (true, true)
            }
            _ => (false, false),
        };

        let mut steps = Vec::new();
        loop {
            steps.push(self.parse_step(descendant)?);
            match self.peek() {
                Some(Token::Slash) => {
                    self.next();
                    descendant = false;
                }
                Some(Token::DoubleSlash) => {
                    self.next();
                    descendant = true;
                }
                _ => break,
            }
        }

        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self, descendant: bool) -> ReflectionResult<Step> {
        let test = match self.next() {
            Some(Token::At) => match self.next() {
                Some(Token::Name(name)) => NodeTest::Attribute(name),
                other => {
                    return Err(ReflectionError::Expression(format!(
                        "expected attribute name after '@', found {:?}",
                        other
                    )))
                }
            },
            Some(Token::Star) => NodeTest::Wildcard,
            Some(Token::Name(name)) => {
                if name == "text" && self.peek() == Some(&Token::LParen) {
                    self.next();
                    self.expect(Token::RParen)?;
                    NodeTest::Text
                } else {
                    NodeTest::Name(name)
                }
            }
            other => {
                return Err(ReflectionError::Expression(format!(
                    "expected a path step, found {:?}",
                    other
                )))
            }
        };

        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.next();
            predicates.push(self.parse_predicate()?);
            self.expect(Token::RBracket)?;
        }

        Ok(Step {
            descendant,
            test,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> ReflectionResult<Predicate> {
        if let Some(Token::Number(n)) = self.peek() {
            let n = *n;
            self.next();
            if n.fract() != 0.0 || n < 1.0 {
                return Err(ReflectionError::Expression(format!(
                    "position predicate must be a positive integer, got {}",
                    n
                )));
            }
            return Ok(Predicate::Position(n as usize));
        }

        let path = self.parse_path()?;
        self.expect(Token::Equals)?;
        match self.next() {
            Some(Token::Literal(literal)) => Ok(Predicate::Equals { path, literal }),
            other => Err(ReflectionError::Expression(format!(
                "expected string literal in predicate, found {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_path() {
        let expr = parse("/data/params/today").unwrap();
        match expr {
            Expr::Path(path) => {
                assert!(path.absolute);
                assert_eq!(path.steps.len(), 3);
                assert_eq!(path.steps[2].test, NodeTest::Name("today".into()));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn parses_attribute_step_and_predicates() {
        let expr = parse("/data/reflection-field/entry[@id='42']/@id").unwrap();
        match expr {
            Expr::Path(path) => {
                let entry = &path.steps[2];
                assert_eq!(entry.predicates.len(), 1);
                assert!(matches!(
                    entry.predicates[0],
                    Predicate::Equals { ref literal, .. } if literal == "42"
                ));
                assert_eq!(path.steps[3].test, NodeTest::Attribute("id".into()));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn parses_function_call_with_mixed_args() {
        let expr = parse("concat(/data/params/today, ' ', /data/params/current-time)").unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "concat");
                assert_eq!(args.len(), 3);
                assert_eq!(args[1], Expr::StringLiteral(" ".into()));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn parses_descendant_and_text_steps() {
        let expr = parse("//entry/title/text()").unwrap();
        match expr {
            Expr::Path(path) => {
                assert!(path.steps[0].descendant);
                assert_eq!(path.steps[2].test, NodeTest::Text);
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse("").is_err());
        assert!(parse("/data/[").is_err());
        assert!(parse("concat(/a,").is_err());
        assert!(parse("/data/entry[0]").is_err());
        assert!(parse("'unterminated").is_err());
        assert!(parse("/data/params ?").is_err());
    }

    #[test]
    fn position_predicate_is_one_based_integer() {
        let expr = parse("/data/*[2]").unwrap();
        match expr {
            Expr::Path(path) => {
                assert_eq!(path.steps[1].predicates[0], Predicate::Position(2));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }
}
