//! JSON-LD context for linked-data output.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Key under which the context is attached.
pub const CONTEXT_KEY: &str = "@context";

/// A term-to-IRI mapping attached to a document as `@context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedDataContext {
    terms: IndexMap<String, String>,
}

impl LinkedDataContext {
    pub fn new() -> Self {
        Self {
            terms: IndexMap::new(),
        }
    }

    /// The schema.org mapping used for coverage output.
    pub fn schema_org() -> Self {
        Self::new()
            .with_term("dataType", "http://schema.org/DataType")
            .with_term("description", "http://schema.org/description")
            .with_term("domainType", "http://schema.org/additionalType")
            .with_term("type", "http://schema.org/additionalType")
    }

    pub fn with_term(mut self, term: impl Into<String>, iri: impl Into<String>) -> Self {
        self.terms.insert(term.into(), iri.into());
        self
    }

    pub fn iri(&self, term: &str) -> Option<&str> {
        self.terms.get(term).map(String::as_str)
    }

    /// The context object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.terms
                .iter()
                .map(|(term, iri)| (term.clone(), Value::String(iri.clone())))
                .collect(),
        )
    }

    /// Attach the context as the first member of a JSON object.
    ///
    /// Non-object documents are left unchanged. An existing context is replaced.
    pub fn attach(&self, document: &mut Value) {
        let Value::Object(members) = document else {
            return;
        };

        let mut with_context = Map::with_capacity(members.len() + 1);
        with_context.insert(CONTEXT_KEY.to_string(), self.to_value());
        for (key, value) in std::mem::take(members) {
            if key != CONTEXT_KEY {
                with_context.insert(key, value);
            }
        }
        *members = with_context;
    }
}

impl Default for LinkedDataContext {
    fn default() -> Self {
        Self::schema_org()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_org_terms() {
        let context = LinkedDataContext::schema_org();
        assert_eq!(context.iri("dataType"), Some("http://schema.org/DataType"));
        assert_eq!(context.iri("type"), Some("http://schema.org/additionalType"));
        assert_eq!(context.iri("values"), None);
    }

    #[test]
    fn test_attach_first_member() {
        let mut document = json!({ "type": "Coverage", "domain": {} });
        LinkedDataContext::schema_org().attach(&mut document);

        let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["@context", "type", "domain"]);
        assert_eq!(document["@context"]["description"], "http://schema.org/description");
    }

    #[test]
    fn test_attach_replaces_existing_context() {
        let mut document = json!({ "@context": "old", "type": "Coverage" });
        LinkedDataContext::new()
            .with_term("type", "http://example.org/type")
            .attach(&mut document);

        assert_eq!(document.as_object().unwrap().len(), 2);
        assert_eq!(document["@context"]["type"], "http://example.org/type");
    }

    #[test]
    fn test_attach_ignores_non_objects() {
        let mut document = json!([1, 2]);
        LinkedDataContext::schema_org().attach(&mut document);
        assert_eq!(document, json!([1, 2]));
    }
}
