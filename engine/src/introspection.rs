//! The schema introspection query.
//!
//! Tooling such as IDEs and code generators introspect the schema. With an
//! allow-list enforced, that only works if the introspection query itself
//! is listed.

use crate::collection::QueryEntry;

/// Operation name of the introspection query.
pub const INTROSPECTION_QUERY_NAME: &str = "IntrospectionQuery";

/// The standard introspection query, descriptions included.
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType {
      name
    }
    mutationType {
      name
    }
    subscriptionType {
      name
    }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type {
    ...TypeRef
  }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Allow-list entry for the introspection query.
pub fn introspection_entry() -> QueryEntry {
    QueryEntry::new(INTROSPECTION_QUERY_NAME, INTROSPECTION_QUERY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{operation_name, SourceDocument};

    #[test]
    fn introspection_query_parses() {
        let doc = SourceDocument::parse("introspection", INTROSPECTION_QUERY).unwrap();
        let names: Vec<_> = doc.operations().filter_map(operation_name).collect();
        assert_eq!(names, vec![INTROSPECTION_QUERY_NAME]);
        assert_eq!(doc.fragments().count(), 3);
    }

    #[test]
    fn entry_uses_operation_name() {
        let entry = introspection_entry();
        assert_eq!(entry.name, "IntrospectionQuery");
        assert!(entry.query.starts_with("query IntrospectionQuery"));
    }
}
