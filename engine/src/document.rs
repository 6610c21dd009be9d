//! Parsed source documents.
//!
//! A [`SourceDocument`] is the engine's read-only view of one `.graphql` file:
//! its top-level definitions split into operations, fragments and type-system
//! definitions. Parsing is delegated to `graphql-parser`; canonical text is
//! that crate's printer output, so two documents that differ only in
//! formatting print identically.

use crate::{Error, Result};
use graphql_parser::query::{
    self, Definition, Document, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
};

/// An operation definition owned by a [`SourceDocument`].
pub type Operation = OperationDefinition<'static, String>;

/// A fragment definition owned by a [`SourceDocument`].
pub type Fragment = FragmentDefinition<'static, String>;

/// A top-level definition of a source document.
#[derive(Debug, Clone)]
pub enum SourceDefinition {
    /// Query, mutation or subscription
    Operation(Operation),
    /// Named fragment, only usable through spreads
    Fragment(Fragment),
    /// Schema, type or directive definition; ignored by the builder
    TypeSystem,
}

/// One parsed source unit.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Where the document came from (file path or a caller label)
    pub location: String,
    /// Top-level definitions in document order
    pub definitions: Vec<SourceDefinition>,
}

impl SourceDocument {
    /// Parse document text.
    ///
    /// Executable documents are tried first, then pure type-system
    /// documents. Text that is neither is split at its top-level definitions
    /// and each one is parsed on its own, so a file mixing operations with
    /// type definitions still yields its operations.
    pub fn parse(location: impl Into<String>, text: &str) -> Result<Self> {
        let location = location.into();
        let query_error = match query::parse_query::<String>(text) {
            Ok(document) => return Ok(Self::from_query(location, document.into_static())),
            Err(error) => error,
        };
        if let Ok(schema) = graphql_parser::parse_schema::<String>(text) {
            tracing::debug!(%location, "document only holds type-system definitions");
            return Ok(Self {
                location,
                definitions: type_system(schema.definitions.len()),
            });
        }

        let chunks = split_definitions(text);
        let mut definitions = Vec::new();
        if chunks.len() > 1 {
            for chunk in &chunks {
                if let Ok(document) = query::parse_query::<String>(chunk) {
                    definitions.extend(Self::from_query("", document.into_static()).definitions);
                } else if let Ok(schema) = graphql_parser::parse_schema::<String>(chunk) {
                    definitions.extend(type_system(schema.definitions.len()));
                } else {
                    definitions.clear();
                    break;
                }
            }
        }
        if definitions.is_empty() {
            return Err(Error::Parse {
                location,
                message: query_error.to_string(),
            });
        }

        tracing::debug!(%location, definitions = definitions.len(), "mixed document parsed per definition");
        Ok(Self {
            location,
            definitions,
        })
    }

    /// Wrap an already parsed executable document.
    pub fn from_query(location: impl Into<String>, document: Document<'static, String>) -> Self {
        let definitions = document
            .definitions
            .into_iter()
            .map(|definition| match definition {
                Definition::Operation(operation) => SourceDefinition::Operation(operation),
                Definition::Fragment(fragment) => SourceDefinition::Fragment(fragment),
            })
            .collect();
        Self {
            location: location.into(),
            definitions,
        }
    }

    /// Operation definitions in document order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.definitions.iter().filter_map(|definition| match definition {
            SourceDefinition::Operation(operation) => Some(operation),
            _ => None,
        })
    }

    /// Fragment definitions in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.definitions.iter().filter_map(|definition| match definition {
            SourceDefinition::Fragment(fragment) => Some(fragment),
            _ => None,
        })
    }
}

/// Name of an operation, `None` for anonymous operations.
pub fn operation_name(operation: &Operation) -> Option<&str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

/// Canonical text of an operation.
pub fn print_operation(operation: &Operation) -> String {
    print_definition(Definition::Operation(operation.clone()))
}

/// Canonical text of a fragment.
pub fn print_fragment(fragment: &Fragment) -> String {
    print_definition(Definition::Fragment(fragment.clone()))
}

fn print_definition(definition: Definition<'static, String>) -> String {
    let document = Document {
        definitions: vec![definition],
    };
    document.to_string().trim_end().to_string()
}

/// Fragment names spread by an operation, in document order, nested
/// selections included. Repeated spreads are listed once per occurrence.
pub fn operation_spreads(operation: &Operation) -> Vec<String> {
    let selection_set = match operation {
        OperationDefinition::SelectionSet(set) => set,
        OperationDefinition::Query(query) => &query.selection_set,
        OperationDefinition::Mutation(mutation) => &mutation.selection_set,
        OperationDefinition::Subscription(subscription) => &subscription.selection_set,
    };
    let mut spreads = Vec::new();
    collect_spreads(selection_set, &mut spreads);
    spreads
}

/// Fragment names spread by a fragment, in document order.
pub fn fragment_spreads(fragment: &Fragment) -> Vec<String> {
    let mut spreads = Vec::new();
    collect_spreads(&fragment.selection_set, &mut spreads);
    spreads
}

fn collect_spreads(set: &SelectionSet<'static, String>, spreads: &mut Vec<String>) {
    for item in &set.items {
        match item {
            Selection::Field(field) => collect_spreads(&field.selection_set, spreads),
            Selection::FragmentSpread(spread) => spreads.push(spread.fragment_name.clone()),
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, spreads),
        }
    }
}

/// Reprint query text through the parser so formatting differences vanish.
///
/// Returns `None` when the text is not a valid executable document.
pub fn normalize(text: &str) -> Option<String> {
    query::parse_query::<String>(text)
        .ok()
        .map(|document| document.to_string())
}

/// Whether two query texts are the same document once formatting is ignored.
///
/// Texts that fail to parse are only equivalent when byte-identical.
pub fn equivalent(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    match (normalize(left), normalize(right)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn type_system(count: usize) -> Vec<SourceDefinition> {
    (0..count).map(|_| SourceDefinition::TypeSystem).collect()
}

/// Keywords that open a top-level definition.
const DEFINITION_KEYWORDS: &[&str] = &[
    "query",
    "mutation",
    "subscription",
    "fragment",
    "schema",
    "scalar",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "directive",
    "extend",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Previous {
    Start,
    Extend,
    CloseBrace,
    Other,
}

/// Split document text into its top-level definitions.
///
/// Only lexes enough to find the boundaries: nesting, strings and comments.
/// A description string stays with the definition it precedes.
fn split_definitions(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut chunks = Vec::new();
    let mut chunk_start = 0;
    let mut depth = 0usize;
    let mut previous = Previous::Start;
    let mut description: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        match byte {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'"' => {
                let start = i;
                if bytes[i..].starts_with(b"\"\"\"") {
                    i += 3;
                    while i < bytes.len() && !bytes[i..].starts_with(b"\"\"\"") {
                        i += if bytes[i..].starts_with(b"\\\"\"\"") { 4 } else { 1 };
                    }
                    i += 3;
                } else {
                    i += 1;
                    while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\n' {
                        i += if bytes[i] == b'\\' { 2 } else { 1 };
                    }
                    i += 1;
                }
                if depth == 0 && description.is_none() {
                    description = Some(start);
                }
                continue;
            }
            b'{' if depth == 0 && previous == Previous::CloseBrace => {
                boundary(text, description.take().unwrap_or(i), &mut chunk_start, &mut chunks);
                depth += 1;
                previous = Previous::Other;
            }
            b'{' | b'(' | b'[' => {
                depth += 1;
                previous = Previous::Other;
            }
            b'}' | b')' | b']' => {
                depth = depth.saturating_sub(1);
                previous = if depth == 0 && byte == b'}' {
                    Previous::CloseBrace
                } else {
                    Previous::Other
                };
            }
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => {
                let start = i;
                while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                if depth == 0 {
                    let name = &text[start..i];
                    if DEFINITION_KEYWORDS.contains(&name) && previous != Previous::Extend {
                        boundary(
                            text,
                            description.take().unwrap_or(start),
                            &mut chunk_start,
                            &mut chunks,
                        );
                    }
                    description = None;
                    previous = if name == "extend" {
                        Previous::Extend
                    } else {
                        Previous::Other
                    };
                }
                continue;
            }
            byte if byte.is_ascii_whitespace() || byte == b',' => {}
            _ => {
                if depth == 0 {
                    description = None;
                    previous = Previous::Other;
                }
            }
        }
        i += 1;
    }
    boundary(text, text.len(), &mut chunk_start, &mut chunks);
    chunks
}

/// Close the chunk that runs up to `at`.
fn boundary<'a>(text: &'a str, at: usize, chunk_start: &mut usize, chunks: &mut Vec<&'a str>) {
    let chunk = text[*chunk_start..at].trim();
    let has_content = chunk.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if has_content {
        chunks.push(chunk);
    }
    *chunk_start = at;
}
