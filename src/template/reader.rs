//! Reader for template bodies.
//!
//! Turns s-expression source into a spanned AST. The grammar is deliberately
//! small:
//!
//! | Syntax           | Meaning                                   |
//! |------------------|-------------------------------------------|
//! | `(f a b)`        | call or special form                      |
//! | `[:p {..} a b]`  | vector; a node when it starts with a keyword |
//! | `{:k v}`         | map literal                               |
//! | `"text"`         | string (`\"`, `\\`, `\n`, `\t`)           |
//! | `42`, `-1.5`     | integer / float                           |
//! | `:name`          | keyword                                   |
//! | `nil` `true` `false` | constants                             |
//! | `; ...`          | comment to end of line                    |
//!
//! Commas count as whitespace.

use super::value::Value;

/// 1-based source position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Symbol(String),
    Call(Vec<Spanned>),
    Vector(Vec<Spanned>),
    Map(Vec<(Spanned, Spanned)>),
}

/// An expression with the position it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub span: Span,
    pub message: String,
}

/// Read every top-level form in `src`.
///
/// `first_line` is the line number `src` starts on within its file.
pub fn read_all(src: &str, first_line: usize) -> Result<Vec<Spanned>, ReadError> {
    let mut reader = Reader {
        chars: src.chars().collect(),
        pos: 0,
        line: first_line,
        column: 1,
    };

    let mut forms = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.peek().is_none() {
            return Ok(forms);
        }
        forms.push(reader.read_form()?);
    }
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

const fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';' | ',')
}

impl Reader {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == ';' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else if c.is_whitespace() || c == ',' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn read_form(&mut self) -> Result<Spanned, ReadError> {
        let span = self.span();
        let err = |message: String| ReadError { span, message };

        let expr = match self.peek() {
            Some('(') => {
                self.bump();
                Expr::Call(self.read_seq(')', span)?)
            }
            Some('[') => {
                self.bump();
                Expr::Vector(self.read_seq(']', span)?)
            }
            Some('{') => {
                self.bump();
                let items = self.read_seq('}', span)?;
                if items.len() % 2 != 0 {
                    return Err(err("map literal needs an even number of forms".into()));
                }
                let mut items = items.into_iter();
                let mut pairs = Vec::new();
                while let (Some(k), Some(v)) = (items.next(), items.next()) {
                    pairs.push((k, v));
                }
                Expr::Map(pairs)
            }
            Some(c @ (')' | ']' | '}')) => return Err(err(format!("unexpected `{c}`"))),
            Some('"') => {
                self.bump();
                Expr::Literal(Value::Str(self.read_string(span)?))
            }
            Some(':') => {
                self.bump();
                let name = self.read_atom();
                if name.is_empty() {
                    return Err(err("empty keyword".into()));
                }
                Expr::Literal(Value::Keyword(name))
            }
            Some(_) => parse_atom(self.read_atom()),
            None => return Err(err("unexpected end of input".into())),
        };

        Ok(Spanned { expr, span })
    }

    fn read_seq(&mut self, close: char, open: Span) -> Result<Vec<Spanned>, ReadError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(c) if c == close => {
                    self.bump();
                    return Ok(items);
                }
                Some(_) => items.push(self.read_form()?),
                None => {
                    return Err(ReadError {
                        span: open,
                        message: format!("unclosed delimiter, expected `{close}`"),
                    });
                }
            }
        }
    }

    fn read_string(&mut self, open: Span) -> Result<String, ReadError> {
        let mut out = String::new();
        loop {
            let escape_span = self.span();
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(c) => {
                        return Err(ReadError {
                            span: escape_span,
                            message: format!("unknown escape `\\{c}`"),
                        });
                    }
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(ReadError {
            span: open,
            message: "unterminated string".into(),
        })
    }

    fn read_atom(&mut self) -> String {
        let mut atom = String::new();
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            atom.push(c);
            self.bump();
        }
        atom
    }
}

fn parse_atom(atom: String) -> Expr {
    let mut chars = atom.chars();
    let numeric = match (chars.next(), chars.next()) {
        (Some(c), _) if c.is_ascii_digit() => true,
        (Some('-' | '+'), Some(c)) => c.is_ascii_digit(),
        _ => false,
    };

    if numeric {
        if let Ok(i) = atom.parse::<i64>() {
            return Expr::Literal(Value::Int(i));
        }
        if let Ok(f) = atom.parse::<f64>() {
            return Expr::Literal(Value::Float(f));
        }
    }

    match atom.as_str() {
        "nil" => Expr::Literal(Value::Nil),
        "true" => Expr::Literal(Value::Bool(true)),
        "false" => Expr::Literal(Value::Bool(false)),
        _ => Expr::Symbol(atom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(src: &str) -> Expr {
        let mut forms = read_all(src, 1).unwrap();
        assert_eq!(forms.len(), 1);
        forms.remove(0).expr
    }

    #[test]
    fn test_atoms() {
        assert_eq!(read_one("42"), Expr::Literal(Value::Int(42)));
        assert_eq!(read_one("-7"), Expr::Literal(Value::Int(-7)));
        assert_eq!(read_one("1.5"), Expr::Literal(Value::Float(1.5)));
        assert_eq!(read_one("nil"), Expr::Literal(Value::Nil));
        assert_eq!(read_one("true"), Expr::Literal(Value::Bool(true)));
        assert_eq!(read_one(":title"), Expr::Literal(Value::Keyword("title".into())));
        assert_eq!(read_one("+"), Expr::Symbol("+".into()));
        assert_eq!(read_one("-"), Expr::Symbol("-".into()));
        assert_eq!(read_one("site"), Expr::Symbol("site".into()));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            read_one(r#""a \"b\"\n\\""#),
            Expr::Literal(Value::Str("a \"b\"\n\\".into()))
        );
    }

    #[test]
    fn test_nested_forms() {
        let Expr::Vector(items) = read_one("[:p {:class \"x\"} (:title site)]") else {
            panic!("expected vector");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1].expr, Expr::Map(ref pairs) if pairs.len() == 1));
        assert!(matches!(items[2].expr, Expr::Call(ref call) if call.len() == 2));
    }

    #[test]
    fn test_comments_and_commas() {
        let forms = read_all("; heading\n[:p 1, 2] ; trailing\n(+ 1 2)", 1).unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[1].span, Span { line: 3, column: 1 });
    }

    #[test]
    fn test_span_respects_first_line() {
        let forms = read_all("\n  [:p]", 4).unwrap();
        assert_eq!(forms[0].span, Span { line: 5, column: 3 });
    }

    #[test]
    fn test_unclosed_reports_opener() {
        let err = read_all("[:p\n  (:title site", 1).unwrap_err();
        assert_eq!(err.span, Span { line: 2, column: 3 });
        assert!(err.message.contains("expected `)`"));
    }

    #[test]
    fn test_unexpected_closer() {
        let err = read_all("[:p])", 1).unwrap_err();
        assert_eq!(err.span, Span { line: 1, column: 5 });
        assert!(err.message.contains("unexpected `)`"));
    }

    #[test]
    fn test_odd_map() {
        let err = read_all("{:a}", 1).unwrap_err();
        assert!(err.message.contains("even number"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = read_all("[:p \"oops]", 1).unwrap_err();
        assert_eq!(err.span, Span { line: 1, column: 5 });
        assert_eq!(err.message, "unterminated string");
    }
}
