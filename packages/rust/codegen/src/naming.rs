//! Identifier rules shared by every rendering. Models and bindings must agree on these,
//! so nothing else in the crate builds identifiers by hand.

/// Keywords that cannot appear as plain identifiers in generated source.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "gen",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that are not accepted as raw identifiers either; these get a trailing `_`.
const RESERVED_PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Generated field identifier for a wire name: the first letter and every letter after
/// an underscore are upper-cased, underscores dropped.
///
/// `chat_id` → `ChatId`, `from` → `From`, `self` → `Self_`.
pub fn field_name(wire: &str) -> String {
    escape_keyword(pascal_case(wire))
}

/// Request struct name for an operation: `sendMessage` → `SendMessageRequest`.
pub fn request_type_name(operation: &str) -> String {
    format!("{}Request", pascal_case(operation))
}

fn pascal_case(wire: &str) -> String {
    let mut out = String::with_capacity(wire.len());
    let mut upper = true;

    for c in wire.chars() {
        if c == '_' {
            upper = true;
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }

    out
}

/// Method name for an operation, in snake case: `getMe` → `get_me`.
///
/// Runs of capitals stay together (`getURL` → `get_url`). Keywords are emitted as raw
/// identifiers.
pub fn method_name(operation: &str) -> String {
    let chars: Vec<char> = operation.chars().collect();
    let mut out = String::with_capacity(operation.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    escape_keyword(out)
}

fn escape_keyword(ident: String) -> String {
    if RESERVED_PATH_KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_pascal_case() {
        assert_eq!(field_name("chat_id"), "ChatId");
        assert_eq!(field_name("from"), "From");
        assert_eq!(field_name("type"), "Type");
        assert_eq!(field_name("reply_to_message_id"), "ReplyToMessageId");
        assert_eq!(field_name("sendMessage"), "SendMessage");
        assert_eq!(field_name("_private__x"), "PrivateX");
    }

    #[test]
    fn request_names() {
        assert_eq!(request_type_name("sendMessage"), "SendMessageRequest");
        assert_eq!(request_type_name("getMe"), "GetMeRequest");
    }

    #[test]
    fn method_names_are_snake_case() {
        assert_eq!(method_name("getMe"), "get_me");
        assert_eq!(method_name("sendMessage"), "send_message");
        assert_eq!(method_name("getUserProfilePhotos"), "get_user_profile_photos");
        assert_eq!(method_name("close"), "close");
        assert_eq!(method_name("getURL"), "get_url");
        assert_eq!(method_name("setHTTPHook"), "set_http_hook");
        assert_eq!(method_name("send2Factor"), "send2_factor");
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        assert_eq!(method_name("move"), "r#move");
        assert_eq!(method_name("type"), "r#type");
    }

    #[test]
    fn path_keywords_get_a_suffix() {
        assert_eq!(field_name("self"), "Self_");
        assert_eq!(field_name("self_id"), "SelfId");
        assert_eq!(method_name("self"), "self_");
        assert_eq!(method_name("super"), "super_");
        assert_eq!(request_type_name("self"), "SelfRequest");
    }
}
