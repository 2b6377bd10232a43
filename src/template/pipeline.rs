//! Transformer registry.
//!
//! Transformers rewrite a composed document tree before serialization. They
//! run in registration order, each receiving the previous one's output.

use super::{
    compiler::{RenderFn, compile_body},
    error::TemplateError,
    reader::read_all,
    value::Value,
};
use std::fmt;

type Transformer = Box<dyn Fn(Value) -> Value>;

#[derive(Default)]
pub struct Pipeline {
    transformers: Vec<Transformer>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transformer.
    pub fn add_transformer(&mut self, f: impl Fn(Value) -> Value + 'static) -> &mut Self {
        self.transformers.push(Box::new(f));
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Run every transformer over `value`.
    pub fn transform(&self, value: Value) -> Value {
        self.transformers.iter().fold(value, |acc, f| f(acc))
    }

    /// Compile a single expression into a render function.
    ///
    /// The expression sees the usual `site` and `content` bindings; calling
    /// the result yields a one-element list holding its value.
    pub fn compile_expr(&self, src: &str) -> Result<RenderFn, TemplateError> {
        let forms = read_all(src, 1).map_err(|err| super::compiler::syntax_error("<expr>", err))?;
        if forms.len() != 1 {
            return Err(TemplateError::Syntax {
                template: "<expr>".into(),
                line: 1,
                column: 1,
                message: format!("expected exactly one expression, found {}", forms.len()),
            });
        }
        compile_body("<expr>", src, 1)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("transformers", &self.transformers.len())
            .finish()
    }
}
