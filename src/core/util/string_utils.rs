use regex::Regex;

lazy_static! {
    static ref UNICODE_ESCAPE: Regex = Regex::new(r"^u+([0-9a-fA-F]{4})").unwrap();
}

/// Returns `input` with all Java escape sequences replaced, i.e. \n, \t, \\, octal escapes and
/// \uXXXX escapes are replaced by the characters they denote. Backslashes that do not start a
/// valid escape sequence are kept verbatim.
pub fn replace_escapes(input: &str) -> String {
    match unescape(input, false) {
        Some(res) => res,
        None => input.to_string(),
    }
}

/// Returns `input` with all Java escape sequences replaced, or `None` if `input` contains a
/// backslash that does not start a valid escape sequence.
pub fn replace_escapes_strict(input: &str) -> Option<String> {
    unescape(input, true)
}

/// Returns the single character denoted by the escaped string `input`, or `None` if `input`
/// is malformed or denotes zero or several characters.
pub fn single_char(input: &str) -> Option<char> {
    let unescaped = replace_escapes_strict(input)?;
    let mut chars = unescaped.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn unescape(input: &str, strict: bool) -> Option<String> {
    let mut res = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('\\') {
        res.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match decode_escape(after) {
            Some((c, consumed)) => {
                res.push(c);
                rest = &after[consumed..];
            }
            None => {
                if strict {
                    return None;
                }
                res.push('\\');
                rest = after;
            }
        }
    }

    res.push_str(rest);
    Some(res)
}

/// Decodes the escape sequence at the head of `rest` (the text following a backslash),
/// returning the decoded character and the number of bytes consumed.
fn decode_escape(rest: &str) -> Option<(char, usize)> {
    let first = rest.chars().next()?;

    let simple = match first {
        'n' => Some('\n'),
        't' => Some('\t'),
        'b' => Some('\u{8}'),
        'r' => Some('\r'),
        'f' => Some('\u{c}'),
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        _ => None,
    };
    if let Some(c) = simple {
        return Some((c, 1));
    }

    if first.is_digit(8) {
        // Octal escapes stop at \377.
        let max_len = if first <= '3' { 3 } else { 2 };
        let len = rest
            .bytes()
            .take(max_len)
            .take_while(|b| (b'0'..=b'7').contains(b))
            .count();
        let code = u32::from_str_radix(&rest[..len], 8).ok()?;
        return std::char::from_u32(code).map(|c| (c, len));
    }

    let caps = UNICODE_ESCAPE.captures(rest)?;
    let code = u32::from_str_radix(&caps[1], 16).ok()?;
    std::char::from_u32(code).map(|c| (c, caps[0].len()))
}
