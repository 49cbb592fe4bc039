/// Appends `values` to `out`, separated by `separator`. Items that write
/// nothing do not produce a separator.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Writes `name` as a double quoted SQL identifier.
pub fn write_identifier(out: &mut String, name: &str) {
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$query
                .char_indices()
                .map(|(i, _)| i)
                .nth(497)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().count() > 497 { "..." } else { "" },
        )
    };
}
