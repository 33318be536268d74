use std::collections::HashMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tokio::sync::Mutex;

use super::error::QueryError;
use crate::frame::Frame;

/// Outcome of one sub-query: frames on success, an error otherwise
#[derive(Debug, Default, Serialize)]
pub struct QueryResponse {
    pub frames: Vec<Frame>,
    #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

impl QueryResponse {
    pub fn with_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            error: None,
        }
    }

    pub fn with_error(error: QueryError) -> Self {
        Self {
            frames: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn serialize_error<S: Serializer>(error: &Option<QueryError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Responses of one request, keyed by ref id
#[derive(Debug, Default, Serialize)]
pub struct QueryDataResponse {
    pub responses: HashMap<String, QueryResponse>,
}

impl QueryDataResponse {
    pub fn get(&self, ref_id: &str) -> Option<&QueryResponse> {
        self.responses.get(ref_id)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// Response map shared by the sub-query tasks of one request
#[derive(Debug, Clone, Default)]
pub struct Responses {
    inner: Arc<Mutex<HashMap<String, QueryResponse>>>,
}

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the response for a ref id, replacing any earlier one
    pub async fn set(&self, ref_id: String, response: QueryResponse) {
        self.inner.lock().await.insert(ref_id, response);
    }

    /// Takes everything collected so far
    pub async fn take(&self) -> QueryDataResponse {
        QueryDataResponse {
            responses: std::mem::take(&mut *self.inner.lock().await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_set() {
        let responses = Responses::new();
        let mut tasks = Vec::new();
        for i in 0..32 {
            let responses = responses.clone();
            tasks.push(tokio::spawn(async move {
                let frame = Frame::new(format!("Q{}", i));
                responses.set(format!("Q{}", i), QueryResponse::with_frames(vec![frame])).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let collected = responses.take().await;
        assert_eq!(collected.len(), 32);
        assert_eq!(collected.get("Q7").unwrap().frames[0].name(), "Q7");
        assert!(responses.take().await.is_empty());
    }

    #[test]
    fn test_serialize_error_as_message() {
        let response = QueryResponse::with_error(QueryError::Cancelled);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "Query cancelled");
        assert_eq!(json["frames"], serde_json::json!([]));

        let json = serde_json::to_value(QueryResponse::default()).unwrap();
        assert!(json.get("error").is_none());
    }
}
