//! # URI Templates
//!
//! Status document links for register, renew and return are RFC 6570
//! templates such as `https://lsd.example/licenses/1/renew{?end,id,name}`.
//! The subset supported here covers what status servers emit:
//!
//! - `{var}` simple string expansion;
//! - `{?a,b}` form-style query expansion;
//! - `{&a,b}` form-style query continuation.
//!
//! Undefined variables are skipped. A defined but empty variable expands
//! to `name=`. Values are percent-encoded outside the RFC 3986 unreserved
//! set, so a space becomes `%20`, never `+`.

use std::fmt::Write;

use urlencoding::encode;

/// Error expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `{` without a matching `}`.
    #[error("unclosed expression at offset {0}")]
    Unclosed(usize),

    /// An operator outside the supported subset.
    #[error("unsupported template operator '{0}'")]
    UnsupportedOperator(char),
}

/// Expand `template` with `vars`.
pub fn expand(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let close = rest[open..]
            .find('}')
            .map(|c| open + c)
            .ok_or(TemplateError::Unclosed(offset + open))?;
        expand_expression(&rest[open + 1..close], vars, &mut out)?;
        offset += close + 1;
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn expand_expression(
    expr: &str,
    vars: &[(&str, &str)],
    out: &mut String,
) -> Result<(), TemplateError> {
    let (operator, names) = match expr.chars().next() {
        Some(c @ ('?' | '&')) => (Some(c), &expr[1..]),
        Some(c @ ('+' | '#' | '.' | '/' | ';' | '=' | ',' | '!' | '@' | '|')) => {
            return Err(TemplateError::UnsupportedOperator(c))
        }
        _ => (None, expr),
    };

    let defined = names
        .split(',')
        .map(str::trim)
        .filter_map(|name| lookup(vars, name).map(|value| (name, value)));

    match operator {
        None => {
            let values: Vec<String> = defined.map(|(_, v)| encode(v).into_owned()).collect();
            out.push_str(&values.join(","));
        }
        Some(first) => {
            for (i, (name, value)) in defined.enumerate() {
                out.push(if i == 0 { first } else { '&' });
                let _ = write!(out, "{name}={}", encode(value));
            }
        }
    }
    Ok(())
}

fn lookup<'a>(vars: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    vars.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}
