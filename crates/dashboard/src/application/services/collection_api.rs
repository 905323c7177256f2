//! Typed CRUD over one REST collection.
//!
//! Wraps an `Arc<dyn RequestGateway>` and converts between `serde_json::Value`
//! and the collection's record type.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use worldline_domain::{RecordId, SyncRecord};

use crate::ports::outbound::{GatewayError, HttpMethod, RequestGateway};

pub struct CollectionApi<T> {
    gateway: Arc<dyn RequestGateway>,
    path: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for CollectionApi<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            path: self.path.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: SyncRecord> CollectionApi<T> {
    pub fn new(gateway: Arc<dyn RequestGateway>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            gateway,
            path: format!("/{}", path.trim_matches('/')),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: &RecordId) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Fetch the full collection.
    ///
    /// Accepts a bare array or an object carrying the array under `items` or
    /// `data`.
    pub async fn list(&self) -> Result<Vec<T>, GatewayError> {
        let value = self.gateway.request(HttpMethod::Get, &self.path, None).await?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut object) => match object.remove("items").or_else(|| object.remove("data")) {
                Some(Value::Array(items)) => items,
                _ => return Err(GatewayError::Decode(format!("{}: expected a list", self.path))),
            },
            Value::Null => Vec::new(),
            _ => return Err(GatewayError::Decode(format!("{}: expected a list", self.path))),
        };
        serde_json::from_value(Value::Array(items)).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Create a record. The draft need not carry an id.
    pub async fn create<B: Serialize + Sync>(&self, draft: &B) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(draft).map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.gateway
            .request(HttpMethod::Post, &self.path, Some(body))
            .await
    }

    pub async fn update(&self, record: &T) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(record).map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.gateway
            .request(HttpMethod::Put, &self.item_path(record.record_id()), Some(body))
            .await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), GatewayError> {
        self.gateway
            .request(HttpMethod::Delete, &self.item_path(id), None)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::request_gateway::MockRequestGateway;
    use serde_json::json;
    use worldline_domain::Customer;

    fn api(gateway: MockRequestGateway) -> CollectionApi<Customer> {
        CollectionApi::new(Arc::new(gateway), "customers/")
    }

    #[tokio::test]
    async fn test_list_accepts_bare_and_wrapped_arrays() {
        let mut gateway = MockRequestGateway::new();
        let mut responses = vec![
            json!([{"id": 1, "name": "Mayuri"}]),
            json!({"items": [{"id": "2", "name": "Faris"}]}),
        ]
        .into_iter();
        gateway
            .expect_request()
            .withf(|method, path, body| *method == HttpMethod::Get && path == "/customers" && body.is_none())
            .times(2)
            .returning(move |_, _, _| Ok(responses.next().unwrap_or(Value::Null)));
        let api = api(gateway);

        let first = api.list().await.unwrap();
        let second = api.list().await.unwrap();

        assert_eq!(first[0].id.as_str(), "1");
        assert_eq!(second[0].name, "Faris");
    }

    #[tokio::test]
    async fn test_list_rejects_non_list_payload() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_request()
            .returning(|_, _, _| Ok(json!({"total": 3})));

        let err = api(gateway).list().await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_target_item_path() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_request()
            .withf(|method, path, body| {
                *method == HttpMethod::Put
                    && path == "/customers/7"
                    && body.as_ref().and_then(|b| b.get("name")) == Some(&json!("Ruka"))
            })
            .times(1)
            .returning(|_, _, body| Ok(body.unwrap_or(Value::Null)));
        gateway
            .expect_request()
            .withf(|method, path, _| *method == HttpMethod::Delete && path == "/customers/7")
            .times(1)
            .returning(|_, _, _| Ok(Value::Null));
        let api = api(gateway);

        let ruka = Customer {
            id: RecordId::parse("7").unwrap(),
            name: "Ruka".into(),
            email: None,
            company: None,
            phone: None,
        };
        api.update(&ruka).await.unwrap();
        api.delete(&ruka.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_gateway_errors_propagate() {
        let mut gateway = MockRequestGateway::new();
        gateway
            .expect_request()
            .returning(|_, _, _| Err(GatewayError::status(500, "Internal Server Error")));

        let err = api(gateway).create(&json!({"name": "Nae"})).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }
}
