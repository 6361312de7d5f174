/// Decode character references (`&amp;`, `&#65;`, `&#x41;`) in a text run.
/// Unknown or unterminated references are passed through untouched.
pub fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        let mut reference = String::new();
        let mut terminated = false;
        while let Some(&next) = chars.peek() {
            if next == ';' {
                chars.next();
                terminated = true;
                break;
            }
            if next == '#' || next.is_ascii_alphanumeric() {
                reference.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if terminated {
            match decode_reference(&reference) {
                Some(decoded) => result.push_str(&decoded),
                None => {
                    result.push('&');
                    result.push_str(&reference);
                    result.push(';');
                }
            }
        } else {
            result.push('&');
            result.push_str(&reference);
        }
    }

    result
}

/// Decode a single reference body (without `&` and `;`).
fn decode_reference(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric.strip_prefix('x').or_else(|| numeric.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse::<u32>().ok()?
        };
        return char::from_u32(code).map(|ch| ch.to_string());
    }

    let named = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00A0}",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "laquo" => "«",
        "raquo" => "»",
        "ndash" => "–",
        "mdash" => "—",
        "hellip" => "…",
        _ => return None,
    };
    Some(named.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("&#65;"), "A");
        assert_eq!(decode_entities("&#x41;"), "A");
        assert_eq!(decode_entities("&#54620;&#44397;"), "한국");
    }

    #[test]
    fn decodes_named_references() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;li&gt;"), "<li>");
        assert_eq!(decode_entities("&nbsp;"), "\u{00A0}");
    }

    #[test]
    fn passes_through_unknown_and_unterminated() {
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }
}
