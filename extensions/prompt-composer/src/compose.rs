//! Prompt composition
//!
//! Blocks are joined in request order and `{{key}}` placeholders inside each
//! block are filled from the supplied variables in a single pass; substituted
//! text is not scanned again and the separator is inserted verbatim.
//!
//! The output is measured before it is built, so a request whose prompt
//! would exceed the byte cap is refused without allocating it.

use std::collections::{BTreeSet, HashMap};

use crate::types::{Block, ComposerError, ComposerResult};

pub const DEFAULT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub prompt: String,
    /// Placeholder keys with no value, sorted and deduplicated
    pub unresolved: Vec<String>,
}

pub fn compose(
    blocks: &[Block],
    separator: &str,
    variables: &HashMap<String, String>,
    max_bytes: usize,
) -> ComposerResult<Composition> {
    let mut size: usize = 0;
    let mut unresolved = BTreeSet::new();
    for_each_piece(blocks, separator, variables, |piece, missing| {
        size = size.saturating_add(piece.len());
        if let Some(key) = missing {
            unresolved.insert(key);
        }
    });

    if size > max_bytes {
        return Err(ComposerError::OutputTooLarge {
            size,
            max: max_bytes,
        });
    }

    let mut prompt = String::with_capacity(size);
    for_each_piece(blocks, separator, variables, |piece, _| {
        prompt.push_str(piece)
    });

    Ok(Composition {
        prompt,
        unresolved: unresolved.into_iter().map(str::to_string).collect(),
    })
}

/// Placeholder keys: ASCII letters, digits, `_`, `-`, `.`
pub fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Feed the composed prompt to `emit` piece by piece
///
/// The second argument is the key of an unresolved placeholder, whose raw
/// text is the piece itself.
fn for_each_piece<'a>(
    blocks: &'a [Block],
    separator: &'a str,
    variables: &'a HashMap<String, String>,
    mut emit: impl FnMut(&'a str, Option<&'a str>),
) {
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            emit(separator, None);
        }
        scan(&block.content, variables, &mut emit);
    }
}

fn scan<'a>(
    text: &'a str,
    variables: &'a HashMap<String, String>,
    emit: &mut impl FnMut(&'a str, Option<&'a str>),
) {
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        emit(&rest[..start], None);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            emit(&rest[start..], None);
            return;
        };

        let key = after[..end].trim();
        if !is_placeholder_key(key) {
            // not a placeholder; keep the braces and rescan what follows
            emit("{{", None);
            rest = after;
            continue;
        }

        match variables.get(key) {
            Some(value) => emit(value.as_str(), None),
            None => emit(&rest[start..start + 2 + end + 2], Some(key)),
        }
        rest = &after[end + 2..];
    }

    emit(rest, None);
}
