//! A `Transport` that answers from canned responses and remembers what it
//! was asked. No network involved.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use vecto::{
    transport::{ApiRequest, Body, MultipartForm, Transport},
    Config, Result, Vecto,
};

#[derive(Clone, Default)]
pub struct RecordingTransport {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<Value>>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl RecordingTransport {
    /// Queues `value` as the next answer for requests to `path`.
    pub fn respond(&self, path: &str, value: Value) -> &Self {
        self.push(path, Ok(value))
    }

    pub fn fail(&self, path: &str, error: vecto::VectoError) -> &Self {
        self.push(path, Err(error))
    }

    fn push(&self, path: &str, response: Result<Value>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Value::Null));
        self.requests.lock().unwrap().push(request);
        response
    }
}

pub const USER_TOKEN: &str = "user-token";
pub const MANAGEMENT_TOKEN: &str = "mgmt-token";

pub fn client() -> (Vecto, RecordingTransport) {
    let transport = RecordingTransport::default();
    let config = Config::new("http://vecto.test")
        .with_user_token(USER_TOKEN)
        .with_management_token(MANAGEMENT_TOKEN);
    (Vecto::with_transport(config, transport.clone()), transport)
}

pub fn space_json(id: u64, name: &str, model: &str, modality: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "model": {"id": 1, "name": model, "description": "", "modality": modality},
    })
}

pub fn form(request: &ApiRequest) -> &MultipartForm {
    match &request.body {
        Body::Multipart(form) => form,
        other => panic!("expected a multipart body, got {other:?}"),
    }
}
