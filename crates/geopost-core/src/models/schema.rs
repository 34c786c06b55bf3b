use serde::{Deserialize, Serialize};

/// Field types a geo-index mapping can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Keyword,
    Text,
    GeoPoint,
    /// Untyped nested object, as produced by dynamic mapping
    Object,
}

impl FieldType {
    /// Elasticsearch mapping type name
    pub fn es_type(&self) -> &'static str {
        match self {
            FieldType::Keyword => "keyword",
            FieldType::Text => "text",
            FieldType::GeoPoint => "geo_point",
            FieldType::Object => "object",
        }
    }
}

/// Declared field types of the post index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub fields: Vec<(String, FieldType)>,
}

impl IndexSchema {
    /// Mapping for post documents; `location` must be a geo-point for radius queries
    pub fn posts() -> Self {
        Self {
            fields: vec![
                ("id".to_string(), FieldType::Keyword),
                ("user".to_string(), FieldType::Keyword),
                ("message".to_string(), FieldType::Text),
                ("location".to_string(), FieldType::GeoPoint),
                ("url".to_string(), FieldType::Keyword),
            ],
        }
    }

    /// What an index looks like when documents arrive before any mapping
    pub fn dynamic() -> Self {
        Self {
            fields: vec![("location".to_string(), FieldType::Object)],
        }
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn supports_radius_queries(&self) -> bool {
        self.field_type("location") == Some(FieldType::GeoPoint)
    }

    /// Render as an Elasticsearch `mappings` body
    pub fn to_es_mappings(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), serde_json::json!({ "type": ty.es_type() })))
            .collect();

        serde_json::json!({ "mappings": { "properties": properties } })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_schema_declares_geo_point() {
        let schema = IndexSchema::posts();
        assert_eq!(schema.field_type("location"), Some(FieldType::GeoPoint));
        assert!(schema.supports_radius_queries());
        assert!(!IndexSchema::dynamic().supports_radius_queries());
    }

    #[test]
    fn test_es_mappings_body() {
        let body = IndexSchema::posts().to_es_mappings();
        assert_eq!(body["mappings"]["properties"]["location"]["type"], "geo_point");
        assert_eq!(body["mappings"]["properties"]["user"]["type"], "keyword");
    }
}
