//! Evaluator for template expressions.
//!
//! Only `site` and `content` are bound up front; `let` and `for` add more.
//! There are no user-defined functions: calls dispatch to a fixed set of
//! special forms and builtins.

use super::{
    reader::{Expr, Span, Spanned},
    value::{Map, Node, Value},
};
use crate::render::escape;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalError {
    pub span: Span,
    pub message: String,
}

pub type EvalResult = Result<Value, EvalError>;

fn fail<T>(span: Span, message: impl Into<String>) -> Result<T, EvalError> {
    Err(EvalError {
        span,
        message: message.into(),
    })
}

/// Variable bindings, innermost last.
pub struct Scope {
    vars: Vec<(String, Value)>,
}

impl Scope {
    pub fn new(site: Value, content: &[Value]) -> Self {
        Self {
            vars: vec![
                ("site".into(), site),
                ("content".into(), Value::List(content.to_vec())),
            ],
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars
            .iter()
            .rev()
            .find_map(|(n, v)| (n == name).then_some(v))
    }
}

/// Evaluate every form and collect the results.
pub fn eval_forms(forms: &[Spanned], scope: &mut Scope) -> EvalResult {
    forms
        .iter()
        .map(|form| eval(form, scope))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

pub fn eval(form: &Spanned, scope: &mut Scope) -> EvalResult {
    let span = form.span;
    match &form.expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Symbol(name) => match scope.lookup(name) {
            Some(value) => Ok(value.clone()),
            None => fail(span, format!("unbound symbol `{name}`")),
        },
        Expr::Vector(items) => eval_vector(items, scope),
        Expr::Map(pairs) => {
            let mut map = Map::new();
            for (k, v) in pairs {
                let key = match eval(k, scope)? {
                    Value::Keyword(k) | Value::Str(k) => k,
                    other => {
                        return fail(k.span, format!("map key must be a keyword, got {}", other.type_name()));
                    }
                };
                map.insert(key, eval(v, scope)?);
            }
            Ok(Value::Map(map))
        }
        Expr::Call(items) => eval_call(items, span, scope),
    }
}

/// `[:tag {attrs}? children...]` builds a node, any other vector is a list.
fn eval_vector(items: &[Spanned], scope: &mut Scope) -> EvalResult {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(eval(item, scope)?);
    }

    let mut values = values.into_iter().peekable();
    match values.next() {
        Some(Value::Keyword(tag)) => {
            let attrs = match values.next_if(|v| matches!(v, Value::Map(_))) {
                Some(Value::Map(attrs)) => attrs,
                _ => Map::new(),
            };
            Ok(Value::Node(Node {
                tag,
                attrs,
                children: values.collect(),
            }))
        }
        Some(first) => Ok(Value::List(std::iter::once(first).chain(values).collect())),
        None => Ok(Value::List(Vec::new())),
    }
}

fn eval_call(items: &[Spanned], span: Span, scope: &mut Scope) -> EvalResult {
    let Some((head, args)) = items.split_first() else {
        return Ok(Value::Nil);
    };

    match &head.expr {
        Expr::Literal(Value::Keyword(key)) => {
            let key = Value::Keyword(key.clone());
            match args {
                [target] => lookup_field(target, &key, span, scope),
                [target, default] => match lookup_field(target, &key, span, scope)? {
                    Value::Nil => eval(default, scope),
                    found => Ok(found),
                },
                _ => fail(span, "keyword lookup takes a map and an optional default"),
            }
        }
        Expr::Symbol(name) => eval_named(name, args, span, scope),
        _ => fail(head.span, "only symbols and keywords can be called"),
    }
}

/// Field lookup that borrows a bound variable instead of cloning it whole.
fn lookup_field(target: &Spanned, key: &Value, span: Span, scope: &mut Scope) -> EvalResult {
    let result = match &target.expr {
        Expr::Symbol(name) if scope.lookup(name).is_some() => scope
            .lookup(name)
            .map(|value| value.field(key))
            .unwrap_or(Ok(Value::Nil)),
        _ => eval(target, scope)?.field(key),
    };
    result.or_else(|err| fail(span, err.to_string()))
}

fn eval_named(name: &str, args: &[Spanned], span: Span, scope: &mut Scope) -> EvalResult {
    match name {
        "if" => {
            let (cond, then, otherwise) = match args {
                [c, t] => (c, t, None),
                [c, t, e] => (c, t, Some(e)),
                _ => return fail(span, "`if` takes a condition, a branch and an optional else"),
            };
            if eval(cond, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                otherwise.map_or(Ok(Value::Nil), |e| eval(e, scope))
            }
        }
        "when" => {
            let Some((cond, body)) = args.split_first() else {
                return fail(span, "`when` needs a condition");
            };
            if eval(cond, scope)?.is_truthy() {
                eval_body(body, scope)
            } else {
                Ok(Value::Nil)
            }
        }
        "do" => eval_body(args, scope),
        "let" => {
            let Some((bindings, body)) = args.split_first() else {
                return fail(span, "`let` needs a binding vector");
            };
            let Expr::Vector(pairs) = &bindings.expr else {
                return fail(bindings.span, "`let` bindings must be a vector");
            };
            if pairs.len() % 2 != 0 {
                return fail(bindings.span, "`let` bindings need an even number of forms");
            }

            let depth = scope.vars.len();
            for pair in pairs.chunks(2) {
                let Expr::Symbol(var) = &pair[0].expr else {
                    scope.vars.truncate(depth);
                    return fail(pair[0].span, "`let` can only bind symbols");
                };
                match eval(&pair[1], scope) {
                    Ok(value) => scope.vars.push((var.clone(), value)),
                    Err(err) => {
                        scope.vars.truncate(depth);
                        return Err(err);
                    }
                }
            }
            let result = eval_body(body, scope);
            scope.vars.truncate(depth);
            result
        }
        "for" => eval_for(args, span, scope),
        "apply" => {
            let Some((func, rest)) = args.split_first() else {
                return fail(span, "`apply` needs a function");
            };
            let Some((last, leading)) = rest.split_last() else {
                return fail(span, "`apply` needs a collection");
            };

            let mut values = leading
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            match resolve(eval(last, scope)?, last.span)? {
                Value::List(items) => values.extend(items),
                Value::Nil => {}
                other => {
                    return fail(last.span, format!("`apply` expects a list, got {}", other.type_name()));
                }
            }

            match &func.expr {
                Expr::Symbol(name) if is_special(name) => {
                    fail(func.span, format!("cannot apply special form `{name}`"))
                }
                Expr::Symbol(name) => call_builtin(name, values, span),
                Expr::Literal(Value::Keyword(key)) => match values.as_slice() {
                    [target] => target
                        .field(&Value::Keyword(key.clone()))
                        .or_else(|err| fail(span, err.to_string())),
                    _ => fail(span, "keyword lookup takes exactly one map"),
                },
                _ => fail(func.span, "`apply` needs a function name"),
            }
        }
        _ => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(name, values, span)
        }
    }
}

fn is_special(name: &str) -> bool {
    matches!(name, "if" | "when" | "do" | "let" | "for" | "apply")
}

fn eval_body(body: &[Spanned], scope: &mut Scope) -> EvalResult {
    let mut last = Value::Nil;
    for form in body {
        last = eval(form, scope)?;
    }
    Ok(last)
}

/// `(for [x coll] body...)`: one result per item; several body forms per item
/// are grouped into a list.
fn eval_for(args: &[Spanned], span: Span, scope: &mut Scope) -> EvalResult {
    let Some((binding, body)) = args.split_first() else {
        return fail(span, "`for` needs a binding vector");
    };
    let (var, coll) = match &binding.expr {
        Expr::Vector(pair) => match pair.as_slice() {
            [
                Spanned {
                    expr: Expr::Symbol(var),
                    ..
                },
                coll,
            ] => (var, coll),
            _ => return fail(binding.span, "`for` binding must be `[name collection]`"),
        },
        _ => return fail(binding.span, "`for` binding must be a vector"),
    };

    let items = match resolve(eval(coll, scope)?, coll.span)? {
        Value::List(items) => items,
        Value::Nil => Vec::new(),
        other => return fail(coll.span, format!("cannot iterate over {}", other.type_name())),
    };

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        scope.vars.push((var.clone(), item));
        let result = if let [single] = body {
            eval(single, scope)
        } else {
            eval_forms(body, scope)
        };
        scope.vars.pop();
        results.push(result?);
    }
    Ok(Value::List(results))
}

fn resolve(value: Value, span: Span) -> EvalResult {
    value.resolve().or_else(|err| fail(span, err.to_string()))
}

// ============================================================================
// Builtins
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value, span: Span) -> Result<Self, EvalError> {
        match value {
            Value::Int(i) => Ok(Self::Int(*i)),
            Value::Float(f) => Ok(Self::Float(*f)),
            other => fail(span, format!("expected a number, got {}", other.type_name())),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(f) => Value::Float(f),
        }
    }

    fn arith(
        self,
        other: Self,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
        span: Span,
    ) -> Result<Self, EvalError> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => match int_op(a, b) {
                Some(n) => Ok(Self::Int(n)),
                None => fail(span, "integer overflow"),
            },
            (a, b) => Ok(Self::Float(float_op(a.as_f64(), b.as_f64()))),
        }
    }

    fn div(self, other: Self, span: Span) -> Result<Self, EvalError> {
        match (self, other) {
            (_, Self::Int(0)) => fail(span, "division by zero"),
            (Self::Int(a), Self::Int(b)) => match (a.checked_rem(b), a.checked_div(b)) {
                (Some(0), Some(n)) => Ok(Self::Int(n)),
                (Some(_), Some(_)) => Ok(Self::Float(a as f64 / b as f64)),
                _ => fail(span, "integer overflow"),
            },
            (a, b) => Ok(Self::Float(a.as_f64() / b.as_f64())),
        }
    }

    fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

fn fold_numbers(
    args: &[Value],
    init: Num,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
    span: Span,
) -> EvalResult {
    args.iter()
        .try_fold(init, |acc, v| acc.arith(Num::of(v, span)?, int_op, float_op, span))
        .map(Num::into_value)
}

fn call_builtin(name: &str, args: Vec<Value>, span: Span) -> EvalResult {
    let args = args
        .into_iter()
        .map(|v| resolve(v, span))
        .collect::<Result<Vec<_>, _>>()?;

    match name {
        "+" => fold_numbers(&args, Num::Int(0), i64::checked_add, |a, b| a + b, span),
        "*" => fold_numbers(&args, Num::Int(1), i64::checked_mul, |a, b| a * b, span),
        "-" => match args.split_first() {
            None => fail(span, "`-` needs at least one argument"),
            Some((only, [])) => Num::Int(0)
                .arith(Num::of(only, span)?, i64::checked_sub, |a, b| a - b, span)
                .map(Num::into_value),
            Some((first, rest)) => {
                fold_numbers(rest, Num::of(first, span)?, i64::checked_sub, |a, b| a - b, span)
            }
        },
        "/" => match args.split_first() {
            Some((first, rest)) if !rest.is_empty() => rest
                .iter()
                .try_fold(Num::of(first, span)?, |acc, v| acc.div(Num::of(v, span)?, span))
                .map(Num::into_value),
            _ => fail(span, "`/` needs at least two arguments"),
        },
        "=" => match args.split_first() {
            Some((first, rest)) => Ok(Value::Bool(rest.iter().all(|v| v == first))),
            None => fail(span, "`=` needs at least one argument"),
        },
        "not" => match args.as_slice() {
            [v] => Ok(Value::Bool(!v.is_truthy())),
            _ => fail(span, "`not` takes one argument"),
        },
        "<" | ">" | "<=" | ">=" => {
            let nums = args
                .iter()
                .map(|v| Num::of(v, span))
                .collect::<Result<Vec<_>, _>>()?;
            let holds = nums.windows(2).all(|w| {
                let ord = w[0].compare(w[1]);
                match name {
                    "<" => ord == Some(Ordering::Less),
                    ">" => ord == Some(Ordering::Greater),
                    "<=" => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                    _ => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                }
            });
            Ok(Value::Bool(holds))
        }
        "str" => Ok(Value::Str(args.iter().map(Value::to_text).collect())),
        "raw" => Ok(Value::Raw(args.iter().map(Value::to_text).collect())),
        "escape" => Ok(Value::Str(
            escape(&args.iter().map(Value::to_text).collect::<String>()).into_owned(),
        )),
        "get" => match args.as_slice() {
            [target, key] => target.field(key).or_else(|err| fail(span, err.to_string())),
            [target, key, default] => match target.field(key) {
                Ok(Value::Nil) => Ok(default.clone()),
                Ok(found) => Ok(found),
                Err(err) => fail(span, err.to_string()),
            },
            _ => fail(span, "`get` takes a collection, a key and an optional default"),
        },
        "count" => match args.as_slice() {
            [Value::List(items)] => Ok(Value::Int(items.len() as i64)),
            [Value::Map(map)] => Ok(Value::Int(map.len() as i64)),
            [Value::Str(s)] => Ok(Value::Int(s.chars().count() as i64)),
            [Value::Nil] => Ok(Value::Int(0)),
            [other] => fail(span, format!("cannot count {}", other.type_name())),
            _ => fail(span, "`count` takes one argument"),
        },
        "first" => match args.as_slice() {
            [Value::List(items)] => Ok(items.first().cloned().unwrap_or_default()),
            [Value::Nil] => Ok(Value::Nil),
            _ => fail(span, "`first` takes one list"),
        },
        "rest" => match args.as_slice() {
            [Value::List(items)] => Ok(Value::List(items.iter().skip(1).cloned().collect())),
            [Value::Nil] => Ok(Value::List(Vec::new())),
            _ => fail(span, "`rest` takes one list"),
        },
        "take" => match args.as_slice() {
            [Value::Int(n), Value::List(items)] => Ok(Value::List(
                items
                    .iter()
                    .take(usize::try_from(*n).unwrap_or(0))
                    .cloned()
                    .collect(),
            )),
            [Value::Int(_), Value::Nil] => Ok(Value::List(Vec::new())),
            _ => fail(span, "`take` takes a count and a list"),
        },
        "list" | "vector" => Ok(Value::List(args)),
        "concat" => {
            let mut out = Vec::new();
            for arg in args {
                match arg {
                    Value::List(items) => out.extend(items),
                    Value::Nil => {}
                    other => out.push(other),
                }
            }
            Ok(Value::List(out))
        }
        "join" => match args.as_slice() {
            [sep, Value::List(items)] => {
                let parts: Vec<_> = items.iter().map(Value::to_text).collect();
                Ok(Value::Str(parts.join(&sep.to_text())))
            }
            [_, Value::Nil] => Ok(Value::Str(String::new())),
            _ => fail(span, "`join` takes a separator and a list"),
        },
        _ => fail(span, format!("unknown function `{name}`")),
    }
}
