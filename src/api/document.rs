//! Document payload sent to the registration endpoint.
//!
//! Field names on the wire are kept exactly as the endpoint expects them,
//! which is a mix of `snake_case` and `camelCase`.

use serde::{Deserialize, Serialize};

/// A document registration request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub description: Description,
    pub doc_id: String,
    pub doc_status: String,
    pub doc_type: String,
    #[serde(rename = "importRequest")]
    pub import_request: bool,
    pub owner_inn: String,
    pub participant_inn: String,
    pub producer_inn: String,
    pub production_date: String,
    pub production_type: String,
    pub products: Vec<Product>,
    pub reg_date: String,
    pub reg_number: String,
}

/// Nested description block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Description {
    #[serde(rename = "participantInn")]
    pub participant_inn: String,
}

/// One product entry of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub certificate_document: String,
    pub certificate_document_date: String,
    pub certificate_document_number: String,
    pub owner_inn: String,
    pub producer_inn: String,
    pub production_date: String,
    pub tnved_code: String,
    pub uit_code: String,
    pub uitu_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn sample() -> Document {
        Document {
            description: Description {
                participant_inn: "7700000000".to_string(),
            },
            doc_id: "doc-1".to_string(),
            doc_type: "LP_INTRODUCE_GOODS".to_string(),
            import_request: true,
            products: vec![Product {
                tnved_code: "6401100000".to_string(),
                uit_code: "010463003407001221SxMGorvNuq6Wk91fgh".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["description"]["participantInn"], "7700000000");
        assert_eq!(value["importRequest"], Value::Bool(true));
        assert_eq!(value["doc_type"], "LP_INTRODUCE_GOODS");
        assert_eq!(value["products"][0]["tnved_code"], "6401100000");
        assert!(value.get("import_request").is_none());
        assert!(value["description"].get("participant_inn").is_none());
    }

    #[test]
    fn test_product_carries_every_field() {
        let value = serde_json::to_value(Product::default()).unwrap();
        let fields = value.as_object().unwrap();

        assert_eq!(fields.len(), 9);
        assert!(fields.contains_key("certificate_document_number"));
        assert!(fields.contains_key("uitu_code"));
    }

    #[test]
    fn test_partial_document_from_json() {
        let json = r#"{
            "description": { "participantInn": "123" },
            "doc_id": "abc",
            "products": [{ "uit_code": "u1" }]
        }"#;

        let document: Document = serde_json::from_str(json).unwrap();

        assert_eq!(document.description.participant_inn, "123");
        assert_eq!(document.doc_id, "abc");
        assert!(!document.import_request);
        assert_eq!(document.products.len(), 1);
        assert_eq!(document.products[0].uit_code, "u1");
    }
}
