//! Column slugs for ingested variables

/// Lowercase, URL-safe form of a variable name
///
/// The first `*...*` annotation (with the whitespace before it) is dropped,
/// then everything except ASCII word characters, dashes and spaces. Runs of
/// spaces become a single dash.
pub fn slugify(name: &str) -> String {
    let lower: Vec<char> = name.to_lowercase().chars().collect();
    let without_note = strip_first_annotation(&lower);

    let kept: String = without_note
        .iter()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_spaces = false;
    for c in kept.trim().chars() {
        if c == ' ' {
            if !in_spaces {
                slug.push('-');
            }
            in_spaces = true;
        } else {
            slug.push(c);
            in_spaces = false;
        }
    }
    slug
}

/// Slug of a legacy variable column
pub fn variable_slug(id: i64, name: &str) -> String {
    format!("{}-{}", id, slugify(name))
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn strip_first_annotation(chars: &[char]) -> Vec<char> {
    for open in 0..chars.len() {
        if chars[open] != '*' {
            continue;
        }

        // The annotation runs to the last star on the same line, with at
        // least one character in between
        let close = chars[open + 1..]
            .iter()
            .take_while(|&&c| !is_line_break(c))
            .enumerate()
            .filter(|&(offset, &c)| c == '*' && offset > 0)
            .map(|(offset, _)| open + 1 + offset)
            .last();

        if let Some(close) = close {
            let mut start = open;
            while start > 0 && chars[start - 1].is_whitespace() {
                start -= 1;
            }
            let mut out = chars[..start].to_vec();
            out.extend_from_slice(&chars[close + 1..]);
            return out;
        }
    }
    chars.to_vec()
}
