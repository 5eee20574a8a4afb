use std::iter::Peekable;
use std::str::Chars;

/// Expand environment variables in config text.
///
/// Supports `${VAR}`, `${VAR:-default}` and `$VAR`. Undefined variables expand to
/// nothing; a `$` not followed by a name is kept as is.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next();
            let inner: String = chars.by_ref().take_while(|&c| c != '}').collect();
            out.push_str(&lookup_braced(&inner));
        } else {
            let name = take_bare_name(&mut chars);
            if name.is_empty() {
                out.push('$');
            } else {
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
        }
    }
    out
}

fn lookup_braced(inner: &str) -> String {
    match inner.split_once(":-") {
        Some((name, fallback)) => match std::env::var(name) {
            Ok(val) if !val.is_empty() => val,
            _ => fallback.to_string(),
        },
        None => std::env::var(inner).unwrap_or_default(),
    }
}

fn take_bare_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}
