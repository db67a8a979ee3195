//! Incident filter trees.
//!
//! The filtered-listing endpoint takes a boolean expression tree serialized
//! to JSON and passed as a single `filter` query parameter: leaf
//! property/comparison/value filters combined by a junction inside each
//! group, groups (optionally nested via `children`) combined by a top-level
//! union operator. Key names here must match the service's wire format
//! exactly.

use serde::{Deserialize, Serialize};

/// Boolean operator combining filters or groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Junction {
    And,
    Or,
}

/// Comparison applied by a leaf filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Equals,
    NotEquals,
    Contains,
}

/// A leaf filter: one property compared against one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub property: String,
    pub comparison: Comparison,
    pub value: String,
}

impl Filter {
    /// Creates a leaf filter.
    pub fn new(property: impl Into<String>, comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            comparison,
            value: value.into(),
        }
    }
}

/// A group of leaf filters joined by a junction, optionally nesting
/// sub-groups via `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ComplexFilter>>,

    pub filters: Vec<Filter>,

    pub junction: Junction,
}

impl ComplexFilter {
    /// Creates a flat group over the given leaf filters.
    pub fn group(filters: Vec<Filter>, junction: Junction) -> Self {
        Self {
            children: None,
            filters,
            junction,
        }
    }
}

/// The top-level filter tree the endpoint accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub complexfilters: Vec<ComplexFilter>,

    pub union: Junction,
}

impl FilterRequest {
    /// Creates a request over the given groups.
    pub fn new(complexfilters: Vec<ComplexFilter>, union: Junction) -> Self {
        Self {
            complexfilters,
            union,
        }
    }

    /// Creates the common single-leaf request: one property compared against
    /// one value.
    pub fn single(property: impl Into<String>, comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            complexfilters: vec![ComplexFilter::group(
                vec![Filter::new(property, comparison, value)],
                Junction::And,
            )],
            union: Junction::And,
        }
    }

    /// Serializes the tree for use as the `filter` query parameter value.
    /// URL encoding is the HTTP client's job.
    pub fn to_query_value(&self) -> String {
        serde_json::to_string(self).expect("filter tree serializes to JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_filter_matches_wire_format() {
        // URL-decoded form of the query the reference suite sends.
        let expected = r#"{"complexfilters":[{"filters":[{"property":"Reporter","comparison":"equals","value":"Jill"}],"junction":"and"}],"union":"and"}"#;

        let request = FilterRequest::single("Reporter", Comparison::Equals, "Jill");
        assert_eq!(request.to_query_value(), expected);
    }

    #[test]
    fn test_wire_format_round_trips() {
        let json = r#"{"complexfilters":[{"filters":[{"property":"Reporter","comparison":"equals","value":"Jill"}],"junction":"and"}],"union":"and"}"#;
        let request: FilterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            FilterRequest::single("Reporter", Comparison::Equals, "Jill")
        );
    }

    #[test]
    fn test_comparison_wire_names() {
        assert_eq!(
            serde_json::to_string(&Comparison::NotEquals).unwrap(),
            "\"notequals\""
        );
        assert_eq!(
            serde_json::to_string(&Comparison::Contains).unwrap(),
            "\"contains\""
        );
    }

    #[test]
    fn test_nested_children_serialize() {
        let inner = ComplexFilter::group(
            vec![Filter::new("State", Comparison::NotEquals, "closed")],
            Junction::Or,
        );
        let outer = ComplexFilter {
            children: Some(vec![inner]),
            filters: vec![Filter::new("Reporter", Comparison::Contains, "Ji")],
            junction: Junction::And,
        };
        let request = FilterRequest::new(vec![outer], Junction::Or);

        let json = request.to_query_value();
        assert!(json.contains(r#""children":[{"filters""#));
        assert!(json.contains(r#""union":"or""#));

        let back: FilterRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_flat_group_omits_children_key() {
        let request = FilterRequest::single("Reporter", Comparison::Equals, "Jill");
        assert!(!request.to_query_value().contains("children"));
    }
}
