//! Return-type inference from an operation's description prose.
//!
//! The templates are tried strictly in order and the first match wins. Their order is
//! part of the behavior: several descriptions match more than one template.

use std::sync::LazyLock;

use regex::Regex;

use docbind_shared::{DocbindError, Result, TypeExpr};

use crate::infer::canonical_type;

/// Return-type templates, highest priority first.
///
/// Templates with two groups capture an optional "array of" marker and the type token;
/// the single-group template captures the token only.
pub const RETURN_TEMPLATES: [&str; 5] = [
    r"([aA]n [aA]rray of).+?([A-Z][a-zA-Z]+).+?is returned",
    r"[rR]eturns ([aA]rray of )?([a-zA-Z*]+) on success",
    r"[oO]n success, returns[^A-Z]+?(\*?[aA]rray\*? of )?([A-Z][a-zA-Z]+)",
    r"[oO]n success,[^A-Z]+?(\*?[aA]rray\*? of )?([A-Z][a-zA-Z*]+).+?is returned",
    r"[rR]eturns.+?([A-Z][a-zA-Z]+)",
];

static COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    RETURN_TEMPLATES
        .iter()
        .map(|tpl| Regex::new(tpl).expect("valid regex"))
        .collect()
});

/// Which template matched and what it captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnMatch {
    /// Index into [`RETURN_TEMPLATES`].
    pub template: usize,
    pub array: bool,
    pub token: String,
}

/// Find the first template matching `description`.
pub fn match_return(description: &str) -> Option<ReturnMatch> {
    COMPILED.iter().enumerate().find_map(|(template, re)| {
        let caps = re.captures(description)?;
        let groups = caps.len() - 1;
        let token = caps.get(groups)?.as_str().to_string();
        let array = groups > 1 && caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        Some(ReturnMatch {
            template,
            array,
            token,
        })
    })
}

/// Infer the (unresolved) return type of an operation from its description.
///
/// No matching template is a [`DocbindError::Classification`]: the documentation no
/// longer reads the way the templates assume.
pub fn infer_return_type(description: &str) -> Result<TypeExpr> {
    let found = match_return(description).ok_or_else(|| {
        DocbindError::classification(format!("could not infer return type from: {description}"))
    })?;

    let base = canonical_type(&found.token, None)?;
    Ok(TypeExpr::array_of(base, usize::from(found.array)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbind_shared::Scalar;

    fn reference(name: &str) -> TypeExpr {
        TypeExpr::Reference(name.into())
    }

    #[test]
    fn templates_compile() {
        assert_eq!(COMPILED.len(), RETURN_TEMPLATES.len());
    }

    #[test]
    fn array_is_returned() {
        let text = "Use this method to receive incoming updates. An Array of Update objects is returned.";
        let found = match_return(text).unwrap();
        assert_eq!(found.template, 0);
        assert!(found.array);
        assert_eq!(infer_return_type(text).unwrap(), TypeExpr::array_of(reference("Update"), 1));
    }

    #[test]
    fn returns_token_on_success() {
        let text = "Use this method to set a webhook. Returns *True* on success.";
        let found = match_return(text).unwrap();
        assert_eq!(found.template, 1);
        assert!(!found.array);
        assert_eq!(infer_return_type(text).unwrap(), TypeExpr::Scalar(Scalar::Bool));
    }

    #[test]
    fn on_success_returns() {
        let text = "Use this method to send a game. On success, returns the sent *Messages*.";
        let found = match_return(text).unwrap();
        assert_eq!(found.template, 2);
        assert_eq!(infer_return_type(text).unwrap(), reference("Messages"));

        let text = "On success, returns an *Array* of ChatMember objects.";
        assert_eq!(
            infer_return_type(text).unwrap(),
            TypeExpr::array_of(reference("ChatMember"), 1)
        );
    }

    #[test]
    fn on_success_is_returned() {
        let text = "Use this method to send text messages. On success, the sent Message is returned.";
        let found = match_return(text).unwrap();
        assert_eq!(found.template, 3);
        assert_eq!(infer_return_type(text).unwrap(), reference("Message"));
    }

    #[test]
    fn returns_fallback() {
        let text = "Returns a Widget on success.";
        let found = match_return(text).unwrap();
        assert_eq!(found.template, 4);
        assert_eq!(infer_return_type(text).unwrap(), reference("Widget"));

        let text = "Returns basic information about the bot in form of a User object.";
        assert_eq!(infer_return_type(text).unwrap(), reference("User"));
    }

    #[test]
    fn earlier_templates_win() {
        // Matches both the "is returned" array template and the "Returns" fallback.
        let text = "Returns nothing useful. An array of GameHighScore objects is returned.";
        let found = match_return(text).unwrap();
        assert_eq!(found.template, 0);
        assert_eq!(found.token, "GameHighScore");
    }

    #[test]
    fn unmatched_prose_is_a_classification_error() {
        let err = infer_return_type("Use this method to do something.").unwrap_err();
        assert!(matches!(err, DocbindError::Classification { .. }));
        assert!(err.to_string().contains("do something"));
    }

    #[test]
    fn lowercase_token_is_a_parse_error() {
        let err = infer_return_type("Returns the on success.").unwrap_err();
        assert!(matches!(err, DocbindError::Parse { .. }));
    }
}
