//! Entry segmentation: headings carrying an anchor link start an entry, and the
//! paragraph, blockquote and table that follow it (up to the next heading) belong to it.

use std::sync::LazyLock;

use tracing::{debug, info, instrument, warn};

use docbind_html::{Document, DomNode, Selector};
use docbind_shared::{DocbindError, FieldSpec, ParamSpec, Result, ScrapeConfig};

use crate::infer::normalize_type_cell;
use crate::prose::extract_prose;

fn tag(name: &str) -> Selector {
    Selector::parse(name).expect("valid selector")
}

static P: LazyLock<Selector> = LazyLock::new(|| tag("p"));
static BLOCKQUOTE: LazyLock<Selector> = LazyLock::new(|| tag("blockquote"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| tag("table"));
static TH: LazyLock<Selector> = LazyLock::new(|| tag("th"));
static TBODY: LazyLock<Selector> = LazyLock::new(|| tag("tbody"));
static TR: LazyLock<Selector> = LazyLock::new(|| tag("tr"));
static EM: LazyLock<Selector> = LazyLock::new(|| tag("em"));

/// Minimum cells in a data-type row: name, type, description.
const DATA_TYPE_COLUMNS: usize = 3;
/// Minimum cells in an operation row: name, type, required, description.
const OPERATION_COLUMNS: usize = 4;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Final classification of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    DataType,
    Operation,
}

/// One heading and the blocks that belong to it, before type inference.
#[derive(Debug, Clone)]
pub struct RawEntry<'a> {
    pub title: String,
    pub description: String,
    pub additional_notes: String,
    pub table: Option<DomNode<'a>>,
    /// Provisional kind from the heading's case: lowercase first letter means callable.
    pub is_callable_heuristic: bool,
}

impl RawEntry<'_> {
    /// Final kind. A table whose first header cell reads `Field` wins over the
    /// heading-case heuristic.
    pub fn classify(&self) -> EntryKind {
        if !self.is_callable_heuristic {
            return EntryKind::DataType;
        }

        let field_table = self
            .table
            .and_then(|table| table.select_first(std::slice::from_ref(&*TH)))
            .is_some_and(|th| th.inner_text().trim().eq_ignore_ascii_case("field"));

        if field_table {
            info!(title = %self.title, "lowercase heading has a field table, classified as data type");
            EntryKind::DataType
        } else {
            EntryKind::Operation
        }
    }

    /// Fields of a data-type entry, in table order. No table means no fields.
    pub fn fields(&self) -> Result<Vec<FieldSpec>> {
        let Some(table) = self.table else {
            return Ok(Vec::new());
        };

        body_rows(table)
            .into_iter()
            .enumerate()
            .map(|(index, cells)| self.field(index, &cells))
            .collect()
    }

    /// Parameters of an operation entry, in table order. No table means no parameters.
    pub fn parameters(&self) -> Result<Vec<ParamSpec>> {
        let Some(table) = self.table else {
            return Ok(Vec::new());
        };

        body_rows(table)
            .into_iter()
            .enumerate()
            .map(|(index, cells)| self.parameter(index, &cells))
            .collect()
    }

    fn field(&self, index: usize, cells: &[DomNode<'_>]) -> Result<FieldSpec> {
        self.require_columns(index, cells, DATA_TYPE_COLUMNS)?;

        let name = cells[0].inner_text().trim().to_string();
        let ty = normalize_type_cell(cells[1], &name)?;
        let has_em = cells[2].select_first(std::slice::from_ref(&*EM)).is_some();

        let (optional, description) = if cells.len() == DATA_TYPE_COLUMNS {
            (has_em, extract_prose(cells[2]))
        } else {
            let marked = cells[2]
                .inner_text()
                .trim()
                .to_lowercase()
                .starts_with("optional");
            (has_em || marked, extract_prose(cells[3]))
        };

        Ok(FieldSpec {
            name,
            ty,
            optional,
            description: description.trim().to_string(),
        })
    }

    fn parameter(&self, index: usize, cells: &[DomNode<'_>]) -> Result<ParamSpec> {
        self.require_columns(index, cells, OPERATION_COLUMNS)?;

        let name = cells[0].inner_text().trim().to_string();
        let ty = normalize_type_cell(cells[1], &name)?;
        let required = cells[2].inner_text().trim().eq_ignore_ascii_case("yes");

        Ok(ParamSpec {
            name,
            ty,
            required,
            description: extract_prose(cells[3]).trim().to_string(),
        })
    }

    fn require_columns(&self, index: usize, cells: &[DomNode<'_>], min: usize) -> Result<()> {
        if cells.len() < min {
            return Err(DocbindError::parse(format!(
                "{}: row {} has {} columns, expected at least {min}",
                self.title,
                index + 1,
                cells.len()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Segmenter
// ---------------------------------------------------------------------------

/// Compiled heading/anchor/content selectors.
#[derive(Debug, Clone)]
pub struct Segmenter {
    heading: Selector,
    anchor: Selector,
    content: Selector,
}

impl Segmenter {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        Ok(Self {
            heading: Selector::parse(&config.heading_selector)?,
            anchor: Selector::parse(&config.anchor_selector)?,
            content: Selector::parse(&config.content_selector)?,
        })
    }

    /// The container searched for headings.
    pub fn content<'a>(&self, doc: &'a Document) -> Result<DomNode<'a>> {
        doc.root()
            .select_first(std::slice::from_ref(&self.content))
            .ok_or_else(|| {
                DocbindError::parse(format!("no element matches content selector '{}'", self.content))
            })
    }

    /// Split `content` into entries, in document order.
    #[instrument(skip_all)]
    pub fn segment<'a>(&self, content: DomNode<'a>) -> Vec<RawEntry<'a>> {
        let mut headings: Vec<DomNode<'a>> = content
            .select_all(&[self.heading.clone(), self.anchor.clone()])
            .into_iter()
            .filter_map(|anchor| anchor.parent())
            .collect();
        // A heading with several anchors is reached once per anchor.
        headings.dedup();

        let entries: Vec<RawEntry<'a>> = headings
            .into_iter()
            .filter_map(|heading| self.entry(heading))
            .collect();

        debug!(entries = entries.len(), "page segmented");
        entries
    }

    fn entry<'a>(&self, heading: DomNode<'a>) -> Option<RawEntry<'a>> {
        let title = heading.inner_text().trim().to_string();
        if title.is_empty() {
            warn!(heading = %heading.outer_markup(), "skipping heading with empty title");
            return None;
        }

        let next_heading = heading.next_matching(&self.heading);
        let within = |selector: &Selector| {
            heading
                .next_matching(selector)
                .filter(|block| block.between(Some(heading), next_heading))
        };

        Some(RawEntry {
            is_callable_heuristic: title.starts_with(|c: char| c.is_lowercase()),
            description: block_prose(within(&*P)),
            additional_notes: block_prose(within(&*BLOCKQUOTE)),
            table: within(&*TABLE),
            title,
        })
    }
}

fn block_prose(block: Option<DomNode<'_>>) -> String {
    block
        .map(|b| extract_prose(b).trim().to_string())
        .unwrap_or_default()
}

/// Body rows that carry `td` cells, as their direct cells. Header rows the parser moved
/// into `tbody` have only `th` cells and are skipped.
fn body_rows<'a>(table: DomNode<'a>) -> Vec<Vec<DomNode<'a>>> {
    table
        .select_all(&[TBODY.clone(), TR.clone()])
        .into_iter()
        .map(|row| row.children().filter(|c| c.tag_name() == "td").collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbind_shared::{Scalar, TypeExpr};

    fn segmenter() -> Segmenter {
        Segmenter::new(&ScrapeConfig::default()).unwrap()
    }

    fn entries(doc: &Document) -> Vec<RawEntry<'_>> {
        let seg = segmenter();
        seg.segment(seg.content(doc).unwrap())
    }

    const PAGE: &str = r##"<html><body>
<h3>Available types</h3>
<h4><a class="anchor" name="user" href="#user"></a>User</h4>
<p>This object represents a <em>user</em>.</p>
<table class="table">
<thead><tr><th>Field</th><th>Type</th><th>Description</th></tr></thead>
<tbody>
<tr><td>id</td><td>Integer</td><td>Unique identifier</td></tr>
<tr><td>username</td><td>String</td><td><em>Optional</em>. Username</td></tr>
</tbody>
</table>
<blockquote><p>Note the id.</p></blockquote>
<h4><a class="anchor" name="nothing" href="#nothing"></a>Nothing</h4>
<p>Heading without a table.</p>
<h4>Unanchored</h4>
<p>Not an entry.</p>
<h4><a class="anchor" name="getme" href="#getme"></a>getMe</h4>
<p>A simple method. Returns basic information about the bot in form of a User object.</p>
<h4><a class="anchor" name="sendmessage" href="#sendmessage"></a>sendMessage</h4>
<p>Send text. On success, the sent Message is returned.</p>
<table class="table">
<thead><tr><th>Parameter</th><th>Type</th><th>Required</th><th>Description</th></tr></thead>
<tbody>
<tr><td>chat_id</td><td>Integer or String</td><td>Yes</td><td>Target chat</td></tr>
<tr><td>text</td><td>String</td><td>Optional</td><td>Text of the <strong>message</strong></td></tr>
</tbody>
</table>
</body></html>"##;

    #[test]
    fn headings_with_anchors_start_entries() {
        let doc = Document::parse(PAGE);
        let titles: Vec<String> = entries(&doc).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["User", "Nothing", "getMe", "sendMessage"]);
    }

    #[test]
    fn blocks_stop_at_next_heading() {
        let doc = Document::parse(PAGE);
        let entries = entries(&doc);

        let user = &entries[0];
        assert_eq!(user.description, "This object represents a *user*.");
        assert_eq!(user.additional_notes, "Note the id.");
        assert!(user.table.is_some());
        assert!(!user.is_callable_heuristic);

        let nothing = &entries[1];
        assert_eq!(nothing.description, "Heading without a table.");
        assert!(nothing.additional_notes.is_empty());
        assert!(nothing.table.is_none());

        // The operation table belongs to sendMessage, not getMe.
        let get_me = &entries[2];
        assert!(get_me.is_callable_heuristic);
        assert!(get_me.table.is_none());
        assert!(entries[3].table.is_some());
    }

    #[test]
    fn data_type_fields_three_columns() {
        let doc = Document::parse(PAGE);
        let fields = entries(&doc)[0].fields().unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].ty, TypeExpr::Scalar(Scalar::Int64));
        assert!(!fields[0].optional);
        assert_eq!(fields[0].description, "Unique identifier");

        assert_eq!(fields[1].name, "username");
        assert!(fields[1].optional);
        assert_eq!(fields[1].description, "*Optional*. Username");
    }

    #[test]
    fn data_type_fields_four_columns() {
        let doc = Document::parse(
            r##"<body><h4><a class="anchor" href="#w"></a>Widget</h4>
<table><tr><th>Field</th><th>Type</th><th>Required</th><th>Description</th></tr>
<tr><td>size</td><td>Float</td><td>Optional</td><td>Size in <code>cm</code></td></tr>
<tr><td>label</td><td>String</td><td>Yes</td><td>Label</td></tr>
</table></body>"##,
        );
        let entries = entries(&doc);
        let fields = entries[0].fields().unwrap();

        assert_eq!(fields.len(), 2);
        assert!(fields[0].optional);
        assert_eq!(fields[0].description, "Size in `cm`");
        assert!(!fields[1].optional);
    }

    #[test]
    fn operation_parameters() {
        let doc = Document::parse(PAGE);
        let entries = entries(&doc);
        let send = &entries[3];
        assert_eq!(send.classify(), EntryKind::Operation);

        let params = send.parameters().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "chat_id");
        assert!(params[0].required);
        assert_eq!(
            params[0].ty,
            TypeExpr::Union(vec![TypeExpr::Scalar(Scalar::Int64), TypeExpr::Scalar(Scalar::String)])
        );
        assert!(!params[1].required);
        assert_eq!(params[1].description, "Text of the **message**");

        assert!(entries[2].parameters().unwrap().is_empty());
    }

    #[test]
    fn field_table_overrides_heading_case() {
        let doc = Document::parse(
            r##"<body><h4><a class="anchor" href="#x"></a>inputThing</h4>
<p>Looks like a method.</p>
<table><tr><th>Field</th><th>Type</th><th>Description</th></tr>
<tr><td>kind</td><td>String</td><td>Kind</td></tr></table></body>"##,
        );
        let entries = entries(&doc);
        assert!(entries[0].is_callable_heuristic);
        assert_eq!(entries[0].classify(), EntryKind::DataType);
    }

    #[test]
    fn uppercase_heading_is_data_type() {
        let doc = Document::parse(PAGE);
        assert_eq!(entries(&doc)[0].classify(), EntryKind::DataType);
        assert_eq!(entries(&doc)[2].classify(), EntryKind::Operation);
    }

    #[test]
    fn missing_columns_are_parse_errors() {
        let doc = Document::parse(
            r##"<body><h4><a class="anchor" href="#x"></a>sendThing</h4>
<table><tr><th>Parameter</th><th>Type</th><th>Description</th></tr>
<tr><td>a</td><td>String</td><td>only three</td></tr></table></body>"##,
        );
        let entries = entries(&doc);
        let err = entries[0].parameters().unwrap_err();
        assert!(matches!(err, DocbindError::Parse { .. }));
        let message = err.to_string();
        assert!(message.contains("sendThing"));
        assert!(message.contains("row 1"));
    }

    #[test]
    fn empty_titles_are_skipped() {
        let doc = Document::parse(
            r##"<body><h4><a class="anchor" href="#x"></a>  </h4><p>orphan</p>
<h4><a class="anchor" href="#y"></a>Real</h4></body>"##,
        );
        let titles: Vec<String> = entries(&doc).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["Real"]);
    }

    #[test]
    fn missing_content_is_an_error() {
        let seg = Segmenter::new(&ScrapeConfig {
            content_selector: "div#dev_page_content".into(),
            ..ScrapeConfig::default()
        })
        .unwrap();
        let doc = Document::parse(PAGE);
        assert!(matches!(seg.content(&doc), Err(DocbindError::Parse { .. })));
    }

    #[test]
    fn bad_selectors_fail_construction() {
        let config = ScrapeConfig {
            anchor_selector: "a[name".into(),
            ..ScrapeConfig::default()
        };
        assert!(matches!(Segmenter::new(&config), Err(DocbindError::Selector { .. })));
    }
}
