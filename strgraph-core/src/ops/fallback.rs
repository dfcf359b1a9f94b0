//! Fallback Backend
//!
//! Generic string operations, modelled on the string member methods of a
//! scripting language. The first argument is always the receiver; the
//! remaining arguments are its parameters. For example `replace(s, old, new)`
//! and `join(sep, s)`.
//!
//! Members that return something other than a string (`count`, `split`,
//! `isdigit`, ...) are registered too. Calling them is not an error at this
//! level; the dispatcher rejects their output.
//!
//! `concat` is not a member method, but it is registered here with the same
//! behavior as the native backend so that forcing the fallback never changes
//! a result.

use super::{Arity, Backend, OpFn, OpRegistry, Output};
use crate::error::OpError;

const ONE: Arity = Arity::exactly(1);
const TWO: Arity = Arity::exactly(2);
const ONE_OR_TWO: Arity = Arity::between(1, 2);

/// Builtin operations, in registration order.
const BUILTINS: &[(&str, Arity, OpFn)] = &[
    ("concat", TWO, concat),
    // String-valued members.
    ("capitalize", ONE, capitalize),
    ("casefold", ONE, casefold),
    ("format", Arity::at_least(1), format_fields),
    ("lower", ONE, lower),
    ("upper", ONE, upper),
    ("swapcase", ONE, swapcase),
    ("title", ONE, title),
    ("strip", ONE_OR_TWO, strip),
    ("lstrip", ONE_OR_TWO, lstrip),
    ("rstrip", ONE_OR_TWO, rstrip),
    ("replace", Arity::exactly(3), replace),
    ("join", TWO, join),
    ("removeprefix", TWO, removeprefix),
    ("removesuffix", TWO, removesuffix),
    ("expandtabs", ONE, expandtabs),
    // Members with non-string results.
    ("count", TWO, count),
    ("find", TWO, find),
    ("rfind", TWO, rfind),
    ("index", TWO, index),
    ("startswith", TWO, startswith),
    ("endswith", TWO, endswith),
    ("isalpha", ONE, isalpha),
    ("isalnum", ONE, isalnum),
    ("isdigit", ONE, isdigit),
    ("isspace", ONE, isspace),
    ("islower", ONE, islower),
    ("isupper", ONE, isupper),
    ("istitle", ONE, istitle),
    ("split", ONE_OR_TWO, split),
    ("rsplit", ONE_OR_TWO, rsplit),
    ("splitlines", ONE, splitlines),
    ("partition", TWO, partition),
];

const TAB_SIZE: usize = 8;

fn is_cased(c: char) -> bool {
    c.is_lowercase() || c.is_uppercase()
}

fn text(value: String) -> Result<Output, String> {
    Ok(Output::Str(value))
}

fn concat(args: &[&str]) -> Result<Output, String> {
    text(args.concat())
}

fn capitalize(args: &[&str]) -> Result<Output, String> {
    let mut chars = args[0].chars();
    let capitalized = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    text(capitalized)
}

fn lower(args: &[&str]) -> Result<Output, String> {
    text(args[0].to_lowercase())
}

fn upper(args: &[&str]) -> Result<Output, String> {
    text(args[0].to_uppercase())
}

/// Full case folding for the characters whose folded form is not their
/// lowercase form.
fn fold_special(c: char) -> Option<&'static str> {
    let folded = match c {
        'ß' | 'ẞ' => "ss",
        'ς' => "σ",
        'ſ' => "s",
        'µ' => "μ",
        'ŉ' => "ʼn",
        'ﬀ' => "ff",
        'ﬁ' => "fi",
        'ﬂ' => "fl",
        'ﬃ' => "ffi",
        'ﬄ' => "ffl",
        'ﬅ' | 'ﬆ' => "st",
        _ => return None,
    };
    Some(folded)
}

fn casefold(args: &[&str]) -> Result<Output, String> {
    let mut folded = String::with_capacity(args[0].len());
    for c in args[0].chars() {
        match fold_special(c) {
            Some(special) => folded.push_str(special),
            None => folded.extend(c.to_lowercase()),
        }
    }
    text(folded)
}

/// Positional `{}` / `{n}` substitution. `{{` and `}}` are literal braces.
fn format_fields(args: &[&str]) -> Result<Output, String> {
    let (template, values) = (args[0], &args[1..]);
    let mut formatted = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_auto = 0;
    let mut manual = None;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                formatted.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                formatted.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => return Err("expected '}' before end of string".into()),
                    }
                }

                let position = if field.is_empty() {
                    if manual == Some(true) {
                        return Err("cannot switch from manual field specification to \
                                    automatic field numbering"
                            .into());
                    }
                    manual = Some(false);
                    next_auto += 1;
                    next_auto - 1
                } else {
                    let position: usize = field
                        .parse()
                        .map_err(|_| format!("unsupported replacement field {{{field}}}"))?;
                    if manual == Some(false) {
                        return Err("cannot switch from automatic field numbering to \
                                    manual field specification"
                            .into());
                    }
                    manual = Some(true);
                    position
                };

                let value = values.get(position).ok_or_else(|| {
                    format!("replacement index {position} out of range for positional args tuple")
                })?;
                formatted.push_str(value);
            }
            '}' => return Err("single '}' encountered in format string".into()),
            c => formatted.push(c),
        }
    }
    text(formatted)
}

fn swapcase(args: &[&str]) -> Result<Output, String> {
    let mut swapped = String::with_capacity(args[0].len());
    for c in args[0].chars() {
        if c.is_uppercase() {
            swapped.extend(c.to_lowercase());
        } else if c.is_lowercase() {
            swapped.extend(c.to_uppercase());
        } else {
            swapped.push(c);
        }
    }
    text(swapped)
}

fn title(args: &[&str]) -> Result<Output, String> {
    let mut titled = String::with_capacity(args[0].len());
    let mut previous_cased = false;
    for c in args[0].chars() {
        if previous_cased {
            titled.extend(c.to_lowercase());
        } else {
            titled.extend(c.to_uppercase());
        }
        previous_cased = is_cased(c);
    }
    text(titled)
}

/// Characters to strip: whitespace by default, else any char of `args[1]`.
fn strip_set<'a>(args: &'a [&'a str]) -> impl Fn(char) -> bool + 'a {
    let chars = args.get(1).copied();
    move |c| match chars {
        Some(chars) => chars.contains(c),
        None => c.is_whitespace(),
    }
}

fn strip(args: &[&str]) -> Result<Output, String> {
    text(args[0].trim_matches(strip_set(args)).to_owned())
}

fn lstrip(args: &[&str]) -> Result<Output, String> {
    text(args[0].trim_start_matches(strip_set(args)).to_owned())
}

fn rstrip(args: &[&str]) -> Result<Output, String> {
    text(args[0].trim_end_matches(strip_set(args)).to_owned())
}

fn replace(args: &[&str]) -> Result<Output, String> {
    text(args[0].replace(args[1], args[2]))
}

fn join(args: &[&str]) -> Result<Output, String> {
    let pieces: Vec<String> = args[1].chars().map(String::from).collect();
    text(pieces.join(args[0]))
}

fn removeprefix(args: &[&str]) -> Result<Output, String> {
    text(args[0].strip_prefix(args[1]).unwrap_or(args[0]).to_owned())
}

fn removesuffix(args: &[&str]) -> Result<Output, String> {
    text(args[0].strip_suffix(args[1]).unwrap_or(args[0]).to_owned())
}

fn expandtabs(args: &[&str]) -> Result<Output, String> {
    let mut expanded = String::with_capacity(args[0].len());
    let mut column = 0;
    for c in args[0].chars() {
        match c {
            '\t' => {
                let pad = TAB_SIZE - column % TAB_SIZE;
                expanded.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                expanded.push(c);
                column = 0;
            }
            _ => {
                expanded.push(c);
                column += 1;
            }
        }
    }
    text(expanded)
}

/// Byte offset to char offset, as a signed position.
fn char_position(s: &str, byte_offset: Option<usize>) -> i64 {
    byte_offset.map_or(-1, |offset| s[..offset].chars().count() as i64)
}

fn count(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Int(args[0].matches(args[1]).count() as i64))
}

fn find(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Int(char_position(args[0], args[0].find(args[1]))))
}

fn rfind(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Int(char_position(args[0], args[0].rfind(args[1]))))
}

fn index(args: &[&str]) -> Result<Output, String> {
    match args[0].find(args[1]) {
        Some(offset) => Ok(Output::Int(char_position(args[0], Some(offset)))),
        None => Err("substring not found".into()),
    }
}

fn startswith(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Bool(args[0].starts_with(args[1])))
}

fn endswith(args: &[&str]) -> Result<Output, String> {
    Ok(Output::Bool(args[0].ends_with(args[1])))
}

fn all_nonempty(s: &str, predicate: impl Fn(char) -> bool) -> Result<Output, String> {
    Ok(Output::Bool(!s.is_empty() && s.chars().all(predicate)))
}

fn isalpha(args: &[&str]) -> Result<Output, String> {
    all_nonempty(args[0], char::is_alphabetic)
}

fn isalnum(args: &[&str]) -> Result<Output, String> {
    all_nonempty(args[0], char::is_alphanumeric)
}

fn isdigit(args: &[&str]) -> Result<Output, String> {
    all_nonempty(args[0], |c| c.is_ascii_digit())
}

fn isspace(args: &[&str]) -> Result<Output, String> {
    all_nonempty(args[0], char::is_whitespace)
}

fn islower(args: &[&str]) -> Result<Output, String> {
    let s = args[0];
    Ok(Output::Bool(
        s.chars().any(is_cased) && !s.chars().any(char::is_uppercase),
    ))
}

fn isupper(args: &[&str]) -> Result<Output, String> {
    let s = args[0];
    Ok(Output::Bool(
        s.chars().any(is_cased) && !s.chars().any(char::is_lowercase),
    ))
}

fn istitle(args: &[&str]) -> Result<Output, String> {
    let mut previous_cased = false;
    let mut seen_cased = false;
    for c in args[0].chars() {
        if c.is_uppercase() {
            if previous_cased {
                return Ok(Output::Bool(false));
            }
            previous_cased = true;
            seen_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return Ok(Output::Bool(false));
            }
            previous_cased = true;
            seen_cased = true;
        } else {
            previous_cased = false;
        }
    }
    Ok(Output::Bool(seen_cased))
}

fn separator<'a>(args: &[&'a str]) -> Result<Option<&'a str>, String> {
    match args.get(1).copied() {
        Some("") => Err("empty separator".into()),
        sep => Ok(sep),
    }
}

fn split(args: &[&str]) -> Result<Output, String> {
    let pieces = match separator(args)? {
        Some(sep) => args[0].split(sep).map(str::to_owned).collect(),
        None => args[0].split_whitespace().map(str::to_owned).collect(),
    };
    Ok(Output::List(pieces))
}

fn rsplit(args: &[&str]) -> Result<Output, String> {
    // Without a split limit both directions produce the same pieces.
    split(args)
}

fn splitlines(args: &[&str]) -> Result<Output, String> {
    Ok(Output::List(args[0].lines().map(str::to_owned).collect()))
}

fn partition(args: &[&str]) -> Result<Output, String> {
    let sep = separator(args)?.unwrap_or_default();
    let parts = match args[0].split_once(sep) {
        Some((head, tail)) => vec![head.to_owned(), sep.to_owned(), tail.to_owned()],
        None => vec![args[0].to_owned(), String::new(), String::new()],
    };
    Ok(Output::List(parts))
}

/// The fallback operation backend.
#[derive(Debug, Clone)]
pub struct FallbackBackend {
    registry: OpRegistry,
}

impl FallbackBackend {
    /// Create a backend with every builtin operation registered.
    pub fn new() -> Self {
        let mut registry = OpRegistry::new();
        for &(name, arity, func) in BUILTINS {
            registry.register(name, arity, func);
        }
        Self { registry }
    }

    /// Register an additional operation, or replace a builtin.
    pub fn register(mut self, name: &'static str, arity: Arity, func: OpFn) -> Self {
        self.registry.register(name, arity, func);
        self
    }
}

impl Default for FallbackBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for FallbackBackend {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn operations(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    fn supports(&self, operation: &str) -> bool {
        self.registry.contains(operation)
    }

    fn invoke(&self, operation: &str, args: &[&str]) -> Result<Output, OpError> {
        self.registry.call(operation, args)
    }
}
