//! Method registry for the RPC server.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::protocol::{method, PaperIdParams};
use super::{Fault, PaperService};
use crate::models::{MethodResult, NewPaper};

/// A remote method that can be called by clients
#[derive(Debug, Clone)]
pub struct Method {
    /// Method name as it appears on the wire (e.g., "AddPaper")
    pub name: String,

    /// Handler executing the method
    pub handler: Arc<dyn MethodHandler>,
}

/// Handler for executing a method
///
/// `execute` returns the serialized `MethodResult` on success. Domain errors
/// belong inside that value; `Err(Fault)` is reserved for calls that could
/// not be processed at all.
#[async_trait::async_trait]
pub trait MethodHandler: Send + Sync + std::fmt::Debug {
    async fn execute(&self, params: Value) -> Result<Value, Fault>;
}

/// Registry of all remote methods
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: HashMap<String, Method>,
}

impl MethodRegistry {
    /// Create a registry with the four paper methods bound to `service`
    pub fn new(service: PaperService) -> Self {
        let mut registry = Self {
            methods: HashMap::new(),
        };

        registry.register(Method {
            name: method::ADD_PAPER.to_string(),
            handler: Arc::new(AddPaperHandler {
                service: service.clone(),
            }),
        });

        registry.register(Method {
            name: method::LIST_PAPERS.to_string(),
            handler: Arc::new(ListPapersHandler {
                service: service.clone(),
            }),
        });

        registry.register(Method {
            name: method::GET_PAPER_DETAILS.to_string(),
            handler: Arc::new(GetPaperDetailsHandler {
                service: service.clone(),
            }),
        });

        registry.register(Method {
            name: method::FETCH_PAPER_CONTENT.to_string(),
            handler: Arc::new(FetchPaperContentHandler { service }),
        });

        registry
    }

    /// Register a method
    pub fn register(&mut self, method: Method) {
        self.methods.insert(method.name.clone(), method);
    }

    /// Get a method by name
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Names of all registered methods
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(|s| s.as_str())
    }

    /// Execute a method by name
    pub async fn dispatch(&self, name: &str, params: Value) -> Result<Value, Fault> {
        let method = self
            .get(name)
            .ok_or_else(|| Fault::UnknownMethod(name.to_string()))?;

        method.handler.execute(params).await
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, Fault> {
    serde_json::from_value(params).map_err(|e| Fault::InvalidParams {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

fn encode_result<T: Serialize>(result: MethodResult<T>) -> Result<Value, Fault> {
    serde_json::to_value(&result).map_err(|e| Fault::Encode(e.to_string()))
}

#[derive(Debug)]
struct AddPaperHandler {
    service: PaperService,
}

#[async_trait::async_trait]
impl MethodHandler for AddPaperHandler {
    async fn execute(&self, params: Value) -> Result<Value, Fault> {
        let paper: NewPaper = parse_params(method::ADD_PAPER, params)?;
        let result = self.service.add_paper(paper);
        if let Err(e) = &result {
            tracing::info!("AddPaper rejected: {}", e);
        }
        encode_result(result)
    }
}

#[derive(Debug)]
struct ListPapersHandler {
    service: PaperService,
}

#[async_trait::async_trait]
impl MethodHandler for ListPapersHandler {
    async fn execute(&self, _params: Value) -> Result<Value, Fault> {
        encode_result(self.service.list_papers())
    }
}

#[derive(Debug)]
struct GetPaperDetailsHandler {
    service: PaperService,
}

#[async_trait::async_trait]
impl MethodHandler for GetPaperDetailsHandler {
    async fn execute(&self, params: Value) -> Result<Value, Fault> {
        let PaperIdParams { id } = parse_params(method::GET_PAPER_DETAILS, params)?;
        encode_result(self.service.get_paper_details(id))
    }
}

#[derive(Debug)]
struct FetchPaperContentHandler {
    service: PaperService,
}

#[async_trait::async_trait]
impl MethodHandler for FetchPaperContentHandler {
    async fn execute(&self, params: Value) -> Result<Value, Fault> {
        let PaperIdParams { id } = parse_params(method::FETCH_PAPER_CONTENT, params)?;
        encode_result(self.service.fetch_paper_content(id))
    }
}
