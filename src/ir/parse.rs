//! Reader for the line-oriented IR text form.
//!
//! ```text
//! READ
//! CONST 2
//! BINOP +      # comments run to end of line
//! ST x
//! ```

use super::{BinOp, StackOp};
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};

/// Parse IR text into spanned operations, collecting every error.
pub fn parse(source: &str) -> Result<Vec<Spanned<StackOp>>, Vec<Diagnostic>> {
    let mut ops = Vec::new();
    let mut errors = Vec::new();
    let mut offset = 0usize;

    for line in source.split_inclusive('\n') {
        let code = match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        };
        let words = split_words(code, offset);
        offset += line.len();

        if words.is_empty() {
            continue;
        }
        match parse_words(&words) {
            Ok(op) => {
                let span = words[0].span.merge(words[words.len() - 1].span);
                ops.push(Spanned::new(op, span));
            }
            Err(diag) => errors.push(diag),
        }
    }

    if errors.is_empty() {
        Ok(ops)
    } else {
        Err(errors)
    }
}

/// Whitespace-separated words of one line with absolute spans.
fn split_words(code: &str, base: usize) -> Vec<Spanned<&str>> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    for (i, ch) in code.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                words.push(word(code, base, s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(word(code, base, s, code.len()));
    }
    words
}

fn word(code: &str, base: usize, start: usize, end: usize) -> Spanned<&str> {
    Spanned::new(
        &code[start..end],
        Span::new((base + start) as u32, (base + end) as u32),
    )
}

fn parse_words(words: &[Spanned<&str>]) -> Result<StackOp, Diagnostic> {
    let mnemonic = &words[0];
    let operands = &words[1..];
    match mnemonic.node {
        "READ" => {
            no_operand(mnemonic, operands)?;
            Ok(StackOp::Read)
        }
        "WRITE" => {
            no_operand(mnemonic, operands)?;
            Ok(StackOp::Write)
        }
        "CONST" => {
            let arg = one_operand(mnemonic, operands)?;
            arg.node.parse::<i32>().map(StackOp::Const).map_err(|_| {
                Diagnostic::error(format!("invalid integer `{}`", arg.node), arg.span)
                    .with_note("constants are 32-bit signed integers".to_string())
            })
        }
        "LD" => {
            let arg = one_operand(mnemonic, operands)?;
            Ok(StackOp::Ld(global_name(arg)?))
        }
        "ST" => {
            let arg = one_operand(mnemonic, operands)?;
            Ok(StackOp::St(global_name(arg)?))
        }
        "BINOP" => {
            let arg = one_operand(mnemonic, operands)?;
            arg.node.parse::<BinOp>().map(StackOp::Binop).map_err(|e| {
                let symbols: Vec<&str> = BinOp::ALL.iter().map(|op| op.symbol()).collect();
                Diagnostic::error(e.to_string(), arg.span)
                    .with_help(format!("expected one of {}", symbols.join(" ")))
            })
        }
        other => Err(Diagnostic::error(
            format!("unknown instruction `{}`", other),
            mnemonic.span,
        )
        .with_help("expected READ, WRITE, CONST, LD, ST or BINOP".to_string())),
    }
}

fn no_operand(mnemonic: &Spanned<&str>, operands: &[Spanned<&str>]) -> Result<(), Diagnostic> {
    match operands.first() {
        None => Ok(()),
        Some(extra) => Err(Diagnostic::error(
            format!("`{}` takes no operand", mnemonic.node),
            extra.span.merge(operands[operands.len() - 1].span),
        )),
    }
}

fn one_operand<'a, 'src>(
    mnemonic: &Spanned<&str>,
    operands: &'a [Spanned<&'src str>],
) -> Result<&'a Spanned<&'src str>, Diagnostic> {
    match operands {
        [arg] => Ok(arg),
        [] => Err(Diagnostic::error(
            format!("`{}` expects one operand", mnemonic.node),
            mnemonic.span,
        )),
        [_, extra @ ..] => Err(Diagnostic::error(
            format!("`{}` expects one operand", mnemonic.node),
            extra[0].span.merge(extra[extra.len() - 1].span),
        )),
    }
}

fn global_name(arg: &Spanned<&str>) -> Result<String, Diagnostic> {
    let mut chars = arg.node.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(arg.node.to_string())
    } else {
        Err(Diagnostic::error(
            format!("invalid global name `{}`", arg.node),
            arg.span,
        ))
    }
}
