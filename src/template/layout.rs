//! Layout chains.
//!
//! A layout may name its own `layout`, forming a chain that ends at the first
//! layout without one. The innermost layout receives the caller's content,
//! every outer layout receives the previous result as its single content item.

use super::{
    compiler::{Compiler, RenderFn, compile_raw},
    error::TemplateError,
    options::Format,
};
use rustc_hash::FxHashSet;

/// A whole layout chain folded into one render function.
#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    pub render: RenderFn,
    /// Format of the outermost layout that declares one.
    pub format: Option<Format>,
    /// Layout names, innermost first.
    pub chain: Vec<String>,
}

impl Compiler<'_> {
    /// Follow `layout` options starting at `start` and compose the chain.
    pub fn resolve_layout_chain(&self, start: &str) -> Result<ResolvedLayout, TemplateError> {
        let mut visited = FxHashSet::default();
        let mut chain: Vec<String> = Vec::new();
        let mut renders = Vec::new();
        let mut format = None;
        let mut next = Some(start.to_owned());

        while let Some(name) = next.take() {
            if !visited.insert(name.clone()) {
                chain.push(name);
                return Err(TemplateError::LayoutCycle(chain));
            }

            let raw = self.layouts.read(&name).map_err(|err| match err {
                TemplateError::MissingTemplate(_) => TemplateError::MissingLayout(name.clone()),
                other => other,
            })?;
            let (options, render) = compile_raw(&name, &raw)?;

            // outer layouts come later, so the last declared format wins
            if options.format.is_some() {
                format = options.format;
            }
            renders.push(render);
            chain.push(name);
            next = options.layout;
        }

        let render = RenderFn::new(move |site, content| {
            let mut renders = renders.iter();
            let Some(first) = renders.next() else {
                return Ok(content.to_vec().into());
            };
            let mut result = first.call(site, content)?;
            for render in renders {
                result = render.call(site, &[result])?;
            }
            Ok(result)
        });

        Ok(ResolvedLayout {
            render,
            format,
            chain,
        })
    }
}
