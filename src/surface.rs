//! Minimal textual surface for the CLI, driven from a source file. Byte
//! indexed recursive descent over an explicit scope `Context`, with
//! `extend`/`narrow` pushing and popping one binder at a time. Supports
//! lambda abstraction (`\x. body`), application (`(f a)`), decimal `cell`
//! literals, `if`/`then`/`else`, `fix`, and named primitive calls, keying
//! variable lookups by `Binder` identity instead of by name and narrowing
//! the name back out of scope once its lambda closes. A convenience wrapper
//! around the builder API, not a core concern.

use crate::agent::{BinaryFn, UnaryFn};
use crate::term::{
    apply, binary_call, cell, fix, if_then_else, lambda, unary_call, var, Binder, Term,
};
use std::rc::Rc;

type Str = [u8];

/// A context is a stack of (name, binder) assignments; shadowing is
/// resolved by scanning from the back.
type Context<'a> = Vec<(&'a Str, Binder)>;

fn extend<'a>(ctx: &mut Context<'a>, nam: &'a Str, b: Binder) {
    ctx.push((nam, b));
}

fn narrow(ctx: &mut Context) {
    ctx.pop();
}

fn lookup<'a>(ctx: &Context<'a>, nam: &Str) -> Option<Binder> {
    ctx.iter().rev().find(|(n, _)| *n == nam).map(|(_, b)| b.clone())
}

fn unary_fn(name: &Str) -> Option<UnaryFn> {
    match name {
        b"square" => Some(|x| x.wrapping_mul(x)),
        b"cube" => Some(|x| x.wrapping_mul(x).wrapping_mul(x)),
        b"is_zero" => Some(|x| (x == 0) as u64),
        b"is_one" => Some(|x| (x == 1) as u64),
        b"neg" => Some(|x| x.wrapping_neg()),
        _ => None,
    }
}

fn binary_fn(name: &Str) -> Option<BinaryFn> {
    match name {
        b"add" => Some(|a, b| a.wrapping_add(b)),
        b"subtract" => Some(|a, b| a.wrapping_sub(b)),
        b"multiply" => Some(|a, b| a.wrapping_mul(b)),
        b"divide" => Some(|a, b| if b == 0 { 0 } else { a / b }),
        b"equals" => Some(|a, b| (a == b) as u64),
        b"less_than" => Some(|a, b| (a < b) as u64),
        _ => None,
    }
}

fn is_sep(c: u8) -> bool {
    matches!(c, b' ' | b'\n' | b'\r' | b'\t' | b'(' | b')' | b'.' | b',')
}

fn skip_ws(code: &Str) -> &Str {
    let mut i = 0;
    while i < code.len() && matches!(code[i], b' ' | b'\n' | b'\r' | b'\t') {
        i += 1;
    }
    &code[i..]
}

fn parse_ident(code: &Str) -> Result<(&Str, &Str), String> {
    let code = skip_ws(code);
    let mut i = 0;
    while i < code.len() && !is_sep(code[i]) {
        i += 1;
    }
    if i == 0 {
        return Err("expected an identifier".to_string());
    }
    Ok((&code[i..], &code[..i]))
}

fn expect<'a>(code: &'a Str, tok: &[u8]) -> Result<&'a Str, String> {
    let code = skip_ws(code);
    if code.starts_with(tok) {
        Ok(&code[tok.len()..])
    } else {
        Err(format!(
            "expected {:?}, found {:?}",
            String::from_utf8_lossy(tok),
            String::from_utf8_lossy(&code[..code.len().min(16)])
        ))
    }
}

/// Parses one term, returning the unconsumed remainder alongside it.
fn parse_term<'a>(code: &'a Str, ctx: &mut Context<'a>) -> Result<(&'a Str, Rc<Term>), String> {
    let code = skip_ws(code);
    if code.is_empty() {
        return Err("unexpected end of input".to_string());
    }
    match code[0] {
        b'\\' => {
            let (code, nam) = parse_ident(&code[1..])?;
            let code = expect(code, b".")?;
            let b = Binder::new();
            extend(ctx, nam, b.clone());
            let (code, body) = parse_term(code, ctx)?;
            narrow(ctx);
            Ok((code, lambda(b, body)))
        }
        b'(' => {
            let mut code = &code[1..];
            let mut terms = Vec::new();
            loop {
                code = skip_ws(code);
                if code.first() == Some(&b')') {
                    code = &code[1..];
                    break;
                }
                let (rest, t) = parse_term(code, ctx)?;
                terms.push(t);
                code = rest;
            }
            if terms.is_empty() {
                return Err("empty parentheses".to_string());
            }
            // A single term in parens is just grouping (e.g. `fix (\f. ...)`);
            // two or more fold into a left-associative application chain.
            let mut it = terms.into_iter();
            let mut acc = it.next().unwrap();
            for arg in it {
                acc = apply(acc, arg);
            }
            Ok((code, acc))
        }
        b'0'..=b'9' => {
            let (code, digits) = parse_ident(code)?;
            let v: u64 = std::str::from_utf8(digits)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| format!("malformed cell literal: {:?}", String::from_utf8_lossy(digits)))?;
            Ok((code, cell(v)))
        }
        _ => {
            let (after_ident, word) = parse_ident(code)?;
            match word {
                b"if" => {
                    let (code, c) = parse_term(after_ident, ctx)?;
                    let code = expect(code, b"then")?;
                    let (code, t) = parse_term(code, ctx)?;
                    let code = expect(code, b"else")?;
                    let (code, e) = parse_term(code, ctx)?;
                    Ok((code, if_then_else(c, t, e)))
                }
                b"fix" => {
                    let (code, body) = parse_term(after_ident, ctx)?;
                    Ok((code, fix(body)))
                }
                name if unary_fn(name).is_some() => {
                    let code = expect(after_ident, b"(")?;
                    let (code, x) = parse_term(code, ctx)?;
                    let code = expect(code, b")")?;
                    Ok((code, unary_call(unary_fn(name).unwrap(), x)))
                }
                name if binary_fn(name).is_some() => {
                    let code = expect(after_ident, b"(")?;
                    let (code, x) = parse_term(code, ctx)?;
                    let code = expect(code, b",")?;
                    let (code, y) = parse_term(code, ctx)?;
                    let code = expect(code, b")")?;
                    Ok((code, binary_call(binary_fn(name).unwrap(), x, y)))
                }
                name => match lookup(ctx, name) {
                    Some(b) => Ok((after_ident, var(&b))),
                    None => Err(format!(
                        "unbound variable: {}",
                        String::from_utf8_lossy(name)
                    )),
                },
            }
        }
    }
}

/// Parses a whole source string into a term. Trailing input after
/// the term (other than whitespace) is an error.
pub fn parse(source: &str) -> Result<Rc<Term>, String> {
    let mut ctx = Context::new();
    let (rest, term) = parse_term(source.as_bytes(), &mut ctx)?;
    let rest = skip_ws(rest);
    if !rest.is_empty() {
        return Err(format!(
            "trailing input after term: {:?}",
            String::from_utf8_lossy(&rest[..rest.len().min(32)])
        ));
    }
    Ok(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity_applied_to_a_cell() {
        let term = parse("(\\x. x 5)").unwrap();
        assert!(matches!(term.as_ref(), Term::App(..)));
    }

    #[test]
    fn parses_if_and_primitives() {
        let term = parse("if is_zero(0) then 1 else add(2, 3)").unwrap();
        assert!(matches!(term.as_ref(), Term::IfThenElse(..)));
    }

    #[test]
    fn rejects_unbound_variables() {
        assert!(parse("x").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse("5 5").is_err());
    }

    #[test]
    fn parses_fix() {
        let term = parse("fix (\\rec. \\n. if is_zero(n) then 1 else n)").unwrap();
        assert!(matches!(term.as_ref(), Term::Fix(..)));
    }
}
