use go_surface_syntax::literal;

/// Value of `key` in a struct tag, or `""` when absent.
///
/// `raw` is the tag literal as written; backticks anywhere in it are dropped
/// first. The remainder follows Go's conventional `key:"value"` grammar:
/// space-separated pairs, values in interpreted-string syntax. Scanning stops
/// at the first malformed pair.
pub fn lookup(raw: &str, key: &str) -> String {
    let cleaned: String;
    let mut tag = if raw.contains('`') {
        cleaned = raw.replace('`', "");
        cleaned.as_str()
    } else {
        raw
    };

    while !tag.is_empty() {
        tag = tag.trim_start_matches(' ');
        if tag.is_empty() {
            break;
        }

        let bytes = tag.as_bytes();
        let mut i = 0;
        while i < bytes.len() && bytes[i] > b' ' && bytes[i] != b':' && bytes[i] != b'"' && bytes[i] != 0x7f {
            i += 1;
        }
        if i == 0 || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
            break;
        }
        let name = &tag[..i];
        tag = &tag[i + 1..];

        let bytes = tag.as_bytes();
        let mut j = 1;
        while j < bytes.len() && bytes[j] != b'"' {
            if bytes[j] == b'\\' {
                j += 1;
            }
            j += 1;
        }
        if j >= bytes.len() {
            break;
        }
        let quoted = &tag[..=j];
        tag = &tag[j + 1..];

        if name == key {
            return match literal::unquote(quoted) {
                Ok(value) => value.into_owned(),
                Err(_) => String::new(),
            };
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::lookup;

    #[test]
    fn finds_keys_in_backticked_literal() {
        let raw = r#"`json:"name,omitempty" xml:"-"`"#;
        assert_eq!(lookup(raw, "json"), "name,omitempty");
        assert_eq!(lookup(raw, "xml"), "-");
        assert_eq!(lookup(raw, "missing"), "");
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(lookup(r#"`a:"x\"y" b:"\tz"`"#, "a"), "x\"y");
        assert_eq!(lookup(r#"`a:"x\"y" b:"\tz"`"#, "b"), "\tz");
    }

    #[test]
    fn stops_at_malformed_pair() {
        assert_eq!(lookup(r#"`json: "a" xml:"b"`"#, "xml"), "");
        assert_eq!(lookup(r#"`json:"unterminated`"#, "json"), "");
        assert_eq!(lookup("", "json"), "");
    }

    #[test]
    fn first_occurrence_wins() {
        assert_eq!(lookup(r#"`k:"1" k:"2"`"#, "k"), "1");
    }
}
