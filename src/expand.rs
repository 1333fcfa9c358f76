use crate::re::Captures;

/// Expand a replacement template, appending the result to `dst`.
///
/// A variable is `$name` or `${name}`, where a name is a non-empty run of
/// letters, digits and underscores. A purely numeric name refers to the
/// group with that index; any other name refers to a named group. In the
/// unbraced form the name is as long as possible: `$1x` is `${1x}`, not
/// `${1}x`. A reference to a missing or unmatched group expands to nothing,
/// a malformed reference is copied through verbatim, and `$$` produces a
/// literal `$`.
pub fn expand(caps: &Captures, mut template: &str, dst: &mut String) {
    while let Some(i) = template.find('$') {
        dst.push_str(&template[..i]);
        template = &template[i..];
        if template.as_bytes().get(1) == Some(&b'$') {
            dst.push('$');
            template = &template[2..];
            continue;
        }
        match extract(template) {
            None => {
                dst.push('$');
                template = &template[1..];
            }
            Some((name, num, rest)) => {
                template = rest;
                let text = match num {
                    Some(i) => caps.at(i),
                    None => caps.name(name),
                };
                if let Some(text) = text {
                    dst.push_str(text);
                }
            }
        }
    }
    dst.push_str(template);
}

/// Pull the name out of a leading `$name` or `${name}`. Returns the name,
/// its numeric value if it is a plain group index, and the rest of the
/// template.
fn extract(s: &str) -> Option<(&str, Option<usize>, &str)> {
    let s = &s[1..];
    let (brace, inner) = match s.strip_prefix('{') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let mut end = 0;
    for (i, c) in inner.char_indices() {
        if !c.is_alphanumeric() && c != '_' {
            break;
        }
        end = i + c.len_utf8();
    }
    if end == 0 {
        return None;
    }
    let name = &inner[..end];
    let mut rest = &inner[end..];
    if brace {
        rest = rest.strip_prefix('}')?;
    }
    let numeric = name.bytes().all(|b| b.is_ascii_digit())
        && !(name.len() > 1 && name.starts_with('0'))
        && name.len() < 9;
    let num = if numeric { name.parse().ok() } else { None };
    Some((name, num, rest))
}
