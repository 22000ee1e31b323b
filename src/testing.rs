//! In-memory collaborators and HTTP fixtures for tests.

use crate::directory::DirectoryService;
use crate::error::{GenerationError, StoreError, SyncError};
use crate::graph::{GraphRecord, GraphSession, GraphStore, GraphValue};
use crate::llm::{ChatModel, ChatRequest};
use crate::models::{ModelVariant, SyncOperation};
use async_trait::async_trait;
use axum::Router;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_http_fixture(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Build a record from column/value pairs.
pub fn record(columns: &[(&str, GraphValue)]) -> GraphRecord {
    columns
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// A node reduced to its property map.
pub fn node(properties: &[(&str, GraphValue)]) -> GraphValue {
    GraphValue::Map(
        properties
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

pub fn text(value: &str) -> GraphValue {
    GraphValue::String(value.to_string())
}

#[derive(Default)]
struct FakeStoreState {
    responses: HashMap<String, Result<Vec<GraphRecord>, StoreError>>,
    delays: HashMap<String, Duration>,
    open_error: Option<StoreError>,
    executed: Vec<String>,
    sessions_opened: usize,
    sessions_closed: usize,
}

/// Graph store answering from a script; unscripted statements return no records.
#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<FakeStoreState>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, statement: &str, result: Result<Vec<GraphRecord>, StoreError>) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(statement.to_string(), result);
        self
    }

    pub fn delay(self, statement: &str, delay: Duration) -> Self {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(statement.to_string(), delay);
        self
    }

    pub fn fail_open(self, error: StoreError) -> Self {
        self.state.lock().unwrap().open_error = Some(error);
        self
    }

    /// Statements in the order the store received them.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.lock().unwrap().sessions_closed
    }
}

#[async_trait]
impl GraphStore for FakeStore {
    async fn open_session(
        &self,
        _statement_timeout: Duration,
    ) -> Result<Box<dyn GraphSession>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.open_error.clone() {
            return Err(error);
        }
        state.sessions_opened += 1;
        Ok(Box::new(FakeSession {
            state: self.state.clone(),
        }))
    }

    async fn close(&self) {}
}

struct FakeSession {
    state: Arc<Mutex<FakeStoreState>>,
}

#[async_trait]
impl GraphSession for FakeSession {
    async fn run(&mut self, statement: &str) -> Result<Vec<GraphRecord>, StoreError> {
        let (delay, result) = {
            let mut state = self.state.lock().unwrap();
            state.executed.push(statement.to_string());
            (
                state.delays.get(statement).copied(),
                state
                    .responses
                    .get(statement)
                    .cloned()
                    .unwrap_or_else(|| Ok(Vec::new())),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn close(self: Box<Self>) {
        self.state.lock().unwrap().sessions_closed += 1;
    }
}

/// Directory that records every operation it is handed.
#[derive(Clone)]
pub struct FakeDirectory {
    sent: Arc<Mutex<Vec<SyncOperation>>>,
    reply: Result<Option<u16>, SyncError>,
}

impl Default for FakeDirectory {
    fn default() -> Self {
        Self {
            sent: Arc::default(),
            reply: Ok(Some(200)),
        }
    }
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(reply: Result<Option<u16>, SyncError>) -> Self {
        Self {
            reply,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SyncOperation> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn send(&self, operation: &SyncOperation) -> Result<Option<u16>, SyncError> {
        self.sent.lock().unwrap().push(operation.clone());
        self.reply.clone()
    }
}

/// Chat model replaying scripted replies in order.
#[derive(Clone, Default)]
pub struct FakeChatModel {
    replies: Arc<Mutex<VecDeque<Result<String, GenerationError>>>>,
    calls: Arc<Mutex<Vec<(ModelVariant, ChatRequest)>>>,
}

impl FakeChatModel {
    pub fn with_replies(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<(ModelVariant, ChatRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(
        &self,
        variant: ModelVariant,
        request: &ChatRequest,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push((variant, request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Malformed("no scripted reply".to_string())))
    }
}
