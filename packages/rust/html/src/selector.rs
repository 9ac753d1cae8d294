//! Compact selector dialect: `tag?( '#' id | '.' class | '[' attr ('=' value)? ']' )*`.
//!
//! Only what the scraper needs. No combinators, no pseudo-classes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use scraper::Node;

use docbind_shared::{DocbindError, Result};

/// Requirement placed on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrPredicate {
    /// `[attr=value]` (and `#id`): attribute must be present with exactly this value.
    Equals(String),
    /// `[attr]`: any value, and a missing attribute does not fail the match.
    Any,
}

/// A compiled selector. Build once, match many times.
#[derive(Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, AttrPredicate>,
}

impl Selector {
    /// Compile a selector string, peeling `#id`, `.class` and `[attr=value]` suffixes
    /// right-to-left until only the bare tag name is left.
    pub fn parse(input: &str) -> Result<Self> {
        let mut rest = input.trim();
        let mut classes = Vec::new();
        let mut attributes = BTreeMap::new();

        loop {
            if rest.ends_with(']') {
                let open = rest.rfind('[').ok_or_else(|| {
                    DocbindError::selector(format!("unmatched ']' in selector \"{input}\""))
                })?;
                let body = &rest[open + 1..rest.len() - 1];
                let (name, predicate) = match body.split_once('=') {
                    Some((name, value)) => (name, AttrPredicate::Equals(unquote(value).to_string())),
                    None => (body, AttrPredicate::Any),
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(DocbindError::selector(format!(
                        "empty attribute name in selector \"{input}\""
                    )));
                }
                attributes.insert(name.to_ascii_lowercase(), predicate);
                rest = &rest[..open];
                continue;
            }

            let Some(idx) = rest.rfind(['#', '.', '[']) else {
                break;
            };

            let value = &rest[idx + 1..];
            match rest.as_bytes()[idx] {
                b'[' => {
                    return Err(DocbindError::selector(format!(
                        "unterminated '[' in selector \"{input}\""
                    )));
                }
                _ if value.is_empty() => {
                    return Err(DocbindError::selector(format!(
                        "empty name after '{}' in selector \"{input}\"",
                        &rest[idx..=idx]
                    )));
                }
                b'#' => {
                    attributes.insert("id".to_string(), AttrPredicate::Equals(value.to_string()));
                }
                _ => classes.push(value.to_string()),
            }
            rest = &rest[..idx];
        }

        let tag = (!rest.is_empty()).then(|| rest.to_ascii_lowercase());

        Ok(Self {
            source: input.to_string(),
            tag,
            classes,
            attributes,
        })
    }

    /// Test a tree node against every part of the selector.
    pub fn matches(&self, node: &Node) -> bool {
        let Node::Element(element) = node else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if !element.name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        let attr = |name: &str| {
            element
                .attrs()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        };

        if !self.classes.is_empty() {
            let Some(class_attr) = attr("class") else {
                return false;
            };
            let present: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }

        self.attributes
            .iter()
            .all(|(name, predicate)| match (predicate, attr(name)) {
                (AttrPredicate::Any, _) => true,
                (AttrPredicate::Equals(expected), Some(found)) => found == expected,
                (AttrPredicate::Equals(_), None) => false,
            })
    }

    /// Lowercased tag, if one was given.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrPredicate> {
        &self.attributes
    }
}

/// Compile a selector plus its nested chain in one go.
pub fn compile_chain(selector: &str, nested: &[&str]) -> Result<Vec<Selector>> {
    std::iter::once(selector)
        .chain(nested.iter().copied())
        .map(Selector::parse)
        .collect()
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

impl FromStr for Selector {
    type Err = DocbindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("source", &self.source)
            .field("tag", &self.tag)
            .field("classes", &self.classes)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    /// Match `selector` against the first element of `fragment` with the given tag.
    fn matches_first(selector: &str, fragment: &str, tag: &str) -> bool {
        let html = Html::parse_fragment(fragment);
        let node = html
            .tree
            .root()
            .descendants()
            .find(|n| matches!(n.value(), Node::Element(e) if e.name() == tag))
            .expect("fixture element");
        Selector::parse(selector).unwrap().matches(node.value())
    }

    #[test]
    fn parse_peels_suffixes() {
        let sel = Selector::parse("DIV#main.a.b[data-x=1][hidden]").unwrap();
        assert_eq!(sel.tag(), Some("div"));
        assert_eq!(sel.classes(), &["b".to_string(), "a".to_string()]);
        assert_eq!(sel.attributes().get("id"), Some(&AttrPredicate::Equals("main".into())));
        assert_eq!(sel.attributes().get("data-x"), Some(&AttrPredicate::Equals("1".into())));
        assert_eq!(sel.attributes().get("hidden"), Some(&AttrPredicate::Any));
    }

    #[test]
    fn attribute_value_may_contain_dots() {
        let sel = Selector::parse("a[href=\"page.html#top\"]").unwrap();
        assert_eq!(sel.tag(), Some("a"));
        assert!(sel.classes().is_empty());
        assert_eq!(
            sel.attributes().get("href"),
            Some(&AttrPredicate::Equals("page.html#top".into()))
        );
    }

    #[test]
    fn unterminated_bracket_is_an_error() {
        let err = Selector::parse("a[href").unwrap_err();
        assert!(matches!(err, DocbindError::Selector { .. }));
        assert!(err.to_string().contains("unterminated"));

        assert!(Selector::parse("a]").is_err());
        assert!(Selector::parse("div.").is_err());
    }

    #[test]
    fn empty_selector_matches_any_element() {
        let sel = Selector::parse("").unwrap();
        assert_eq!(sel.tag(), None);
        assert!(matches_first("", "<span>x</span>", "span"));
    }

    #[test]
    fn class_matching_requires_every_class() {
        assert!(matches_first("div.a.b", r#"<div class="a b c"></div>"#, "div"));
        assert!(matches_first("div.b", r#"<div class="  c   b "></div>"#, "div"));
        assert!(!matches_first("div.a.b", r#"<div class="a"></div>"#, "div"));
        assert!(!matches_first("div.a", "<div></div>", "div"));
        assert!(!matches_first("div.a", r#"<div class="ab"></div>"#, "div"));
    }

    #[test]
    fn tag_matching_is_case_insensitive() {
        assert!(matches_first("TABLE", "<table></table>", "table"));
        assert!(!matches_first("p", "<table></table>", "table"));
    }

    #[test]
    fn attribute_predicates() {
        assert!(matches_first("a#x", r#"<a id="x"></a>"#, "a"));
        assert!(!matches_first("a#x", r#"<a id="y"></a>"#, "a"));
        assert!(!matches_first("a#x", "<a></a>", "a"));

        assert!(matches_first("a[name]", r#"<a name="anything"></a>"#, "a"));
        assert!(matches_first("a[name]", "<a>x</a>", "a"));
        assert!(!matches_first("p[name]", "<a>x</a>", "a"));

        assert!(matches_first("a[NAME=go]", r#"<a name="go"></a>"#, "a"));
        assert!(!matches_first("a[name=go]", r#"<a name="Go"></a>"#, "a"));
    }

    #[test]
    fn text_nodes_never_match() {
        let html = Html::parse_fragment("plain text");
        let sel = Selector::parse("").unwrap();
        let text = html
            .tree
            .root()
            .descendants()
            .find(|n| n.value().is_text())
            .expect("text node");
        assert!(!sel.matches(text.value()));
    }

    #[test]
    fn chain_compiles_every_part() {
        let chain = compile_chain("tbody", &["tr", "td"]).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[2].tag(), Some("td"));
        assert!(compile_chain("tbody", &["tr[x"]).is_err());
    }
}
