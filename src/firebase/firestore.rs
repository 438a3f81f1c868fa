//! Document Store over the Firestore v1 REST API.
//!
//! Documents cross the wire in Firestore's typed-value encoding
//! (`{"stringValue": …}`, `{"mapValue": {"fields": …}}`, …); the codec
//! below converts to and from plain JSON so the rest of the crate only
//! ever sees `serde_json::Value`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::GoogleToken;
use crate::error::BackendError;
use crate::GetField;

const SERVICE: &str = "firestore";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, BackendError>;
    /// Write a document under a caller-chosen id, replacing it whole
    /// if it already exists (last write wins).
    async fn set(&self, collection: &str, id: &str, doc: &Value) -> Result<(), BackendError>;
    /// Append a document under a store-assigned id; returns the id.
    async fn add(&self, collection: &str, doc: &Value) -> Result<String, BackendError>;
    /// Equality query on one field, as `(id, document)` pairs.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: Option<u32>,
    ) -> Result<Vec<(String, Value)>, BackendError>;
}

pub struct Firestore {
    http: reqwest::Client,
    token: GoogleToken,
    base: String,
}

impl Firestore {
    pub fn new(http: reqwest::Client, token: GoogleToken, project_id: &str) -> Self {
        Self {
            http,
            token,
            base: format!(
                "https://firestore.googleapis.com/v1/projects/{project_id}/databases/(default)/documents"
            ),
        }
    }
}

#[async_trait]
impl DocumentStore for Firestore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, BackendError> {
        let bearer = self.token.bearer().await?;
        let resp = self
            .http
            .get(format!("{}/{collection}/{id}", self.base))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = super::json_or_error(SERVICE, resp).await?;
        let fields = body.get("fields").cloned().unwrap_or_else(|| json!({}));
        Ok(Some(decode_fields(&fields)))
    }

    async fn set(&self, collection: &str, id: &str, doc: &Value) -> Result<(), BackendError> {
        let bearer = self.token.bearer().await?;
        // PATCH without an updateMask replaces the whole document
        let resp = self
            .http
            .patch(format!("{}/{collection}/{id}", self.base))
            .bearer_auth(bearer)
            .json(&json!({ "fields": encode_fields(doc) }))
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        super::json_or_error(SERVICE, resp).await?;
        Ok(())
    }

    async fn add(&self, collection: &str, doc: &Value) -> Result<String, BackendError> {
        let bearer = self.token.bearer().await?;
        let resp = self
            .http
            .post(format!("{}/{collection}", self.base))
            .bearer_auth(bearer)
            .json(&json!({ "fields": encode_fields(doc) }))
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        let body = super::json_or_error(SERVICE, resp).await?;
        let name = body
            .get_str_field("name")
            .map_err(|e| BackendError::new(SERVICE, e))?;
        Ok(doc_id(&name).to_owned())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        limit: Option<u32>,
    ) -> Result<Vec<(String, Value)>, BackendError> {
        let bearer = self.token.bearer().await?;
        let mut query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value },
                    }
                },
            }
        });
        if let Some(limit) = limit {
            query["structuredQuery"]["limit"] = json!(limit);
        }

        let resp = self
            .http
            .post(format!("{}:runQuery", self.base))
            .bearer_auth(bearer)
            .json(&query)
            .send()
            .await
            .map_err(|e| BackendError::new(SERVICE, e))?;

        let body = super::json_or_error(SERVICE, resp).await?;
        let rows = body.as_array().cloned().unwrap_or_default();

        let mut out = Vec::new();
        for row in &rows {
            // rows without a document (readTime-only) terminate empty results
            let Some(doc) = row.get("document") else {
                continue;
            };
            let name = doc
                .get_str_field("name")
                .map_err(|e| BackendError::new(SERVICE, e))?;
            let fields = doc.get("fields").cloned().unwrap_or_else(|| json!({}));
            out.push((doc_id(&name).to_owned(), decode_fields(&fields)));
        }
        Ok(out)
    }
}

fn doc_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn encode_fields(doc: &Value) -> Value {
    let mut fields = Map::new();
    if let Some(obj) = doc.as_object() {
        for (key, value) in obj {
            fields.insert(key.clone(), encode_value(value));
        }
    }
    Value::Object(fields)
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(_) => json!({ "mapValue": { "fields": encode_fields(value) } }),
    }
}

fn decode_fields(fields: &Value) -> Value {
    let mut out = Map::new();
    if let Some(obj) = fields.as_object() {
        for (key, value) in obj {
            out.insert(key.clone(), decode_value(value));
        }
    }
    Value::Object(out)
}

fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_owned());
    }
    if let Some(s) = obj.get("timestampValue").and_then(Value::as_str) {
        return Value::String(s.to_owned());
    }
    if let Some(i) = obj.get("integerValue") {
        // integers arrive as strings on the wire
        let parsed = i
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| i.as_i64());
        if let Some(i) = parsed {
            return json!(i);
        }
    }
    if let Some(d) = obj.get("doubleValue").and_then(Value::as_f64) {
        return json!(d);
    }
    if let Some(b) = obj.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if let Some(items) = value.pointer("/arrayValue/values").and_then(Value::as_array) {
        return Value::Array(items.iter().map(decode_value).collect());
    }
    if let Some(fields) = value.pointer("/mapValue/fields") {
        return decode_fields(fields);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_typed_values() {
        let doc = json!({
            "email": "a@x.com",
            "roles": ["cliente"],
            "location": { "lat": 1.5, "lng": -2.0 },
            "visits": 3,
            "active": true,
        });
        let fields = encode_fields(&doc);

        assert_eq!(fields["email"], json!({ "stringValue": "a@x.com" }));
        assert_eq!(
            fields["roles"],
            json!({ "arrayValue": { "values": [{ "stringValue": "cliente" }] } })
        );
        assert_eq!(fields["visits"], json!({ "integerValue": "3" }));
        assert_eq!(fields["active"], json!({ "booleanValue": true }));
        assert_eq!(
            fields["location"]["mapValue"]["fields"]["lat"],
            json!({ "doubleValue": 1.5 })
        );
    }

    #[test]
    fn decode_reverses_encode() {
        let doc = json!({
            "email": "a@x.com",
            "roles": ["cliente", "proveedor"],
            "location": { "lat": 1.0, "lng": 2.0 },
            "document_url": null,
        });
        assert_eq!(decode_fields(&encode_fields(&doc)), doc);
    }

    #[test]
    fn decodes_wire_integers_and_timestamps() {
        let fields = json!({
            "count": { "integerValue": "42" },
            "timestamp": { "timestampValue": "2024-05-01T10:00:00Z" },
        });
        let doc = decode_fields(&fields);
        assert_eq!(doc["count"], json!(42));
        assert_eq!(doc["timestamp"], json!("2024-05-01T10:00:00Z"));
    }
}
