// src/mcp.rs
// MCP server: exposes the searcher to LLM clients over stdio
//
// Tool failures are reported as {"error": "..."} payloads, never as
// transport-level errors, so clients can always parse the response body.

use crate::error::SymdexError;
use crate::search::Searcher;
use crate::types::SymbolKind;
use rmcp::{
    ErrorData, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters},
    model::{
        CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo,
    },
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;

/// MCP server state
#[derive(Clone)]
pub struct SymdexServer {
    searcher: Arc<Searcher>,
    tool_router: ToolRouter<Self>,
}

impl SymdexServer {
    pub fn new(searcher: Arc<Searcher>) -> Self {
        Self {
            searcher,
            tool_router: Self::tool_router(),
        }
    }
}

fn error_json(err: &SymdexError) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        serde_json::json!({ "error": format!("serialization failed: {e}") }).to_string()
    })
}

// Request types for tools with parameters

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchCodeRequest {
    #[schemars(description = "Natural language or keyword search query")]
    pub query: String,
    #[schemars(description = "Maximum number of results to return")]
    pub limit: Option<usize>,
    #[schemars(description = "Search mode: hybrid (default), semantic, or fulltext")]
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupSymbolRequest {
    #[schemars(description = "Symbol name (e.g. 'parse_config' or 'MyClass.my_method')")]
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CallGraphRequest {
    #[schemars(description = "Qualified name of the symbol")]
    pub qualified_name: String,
    #[schemars(description = "How many call-graph hops to traverse (default 1)")]
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileImportsRequest {
    #[schemars(description = "Path to the file (relative or absolute)")]
    pub file_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListSymbolsRequest {
    #[schemars(description = "Filter by symbol kind: function/method/class/module")]
    pub kind: Option<String>,
    #[schemars(description = "SQL LIKE pattern for name filtering (e.g. 'get_%')")]
    pub pattern: Option<String>,
    #[schemars(description = "Filter to symbols in this file")]
    pub file_path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ClassHierarchyRequest {
    #[schemars(description = "Class name or qualified class name")]
    pub class_name: String,
}

#[tool_router]
impl SymdexServer {
    #[tool(
        description = "Hybrid semantic + full-text search across all indexed code symbols. Returns functions, methods, and classes matching the query with file path and line number."
    )]
    async fn search_code(
        &self,
        Parameters(req): Parameters<SearchCodeRequest>,
    ) -> Result<String, String> {
        let limit = req.limit.unwrap_or(10);
        let mode = req.mode.as_deref().unwrap_or("hybrid");
        let result = self
            .searcher
            .search(&req.query, limit, mode == "semantic", mode == "fulltext")
            .await;
        Ok(match result {
            Ok(results) => to_json(&results),
            Err(e) => error_json(&e),
        })
    }

    #[tool(
        description = "Look up a code symbol by exact name or qualified name. Returns full signature, docstring, parameters, return type, file path and line number."
    )]
    async fn lookup_symbol(
        &self,
        Parameters(req): Parameters<LookupSymbolRequest>,
    ) -> Result<String, String> {
        Ok(match self.searcher.lookup_symbol(&req.name).await {
            Ok(symbols) => to_json(&symbols),
            Err(e) => error_json(&e),
        })
    }

    #[tool(description = "Find all functions/methods that call the specified symbol.")]
    async fn get_callers(
        &self,
        Parameters(req): Parameters<CallGraphRequest>,
    ) -> Result<String, String> {
        let depth = req.depth.unwrap_or(1);
        Ok(match self.searcher.get_callers(&req.qualified_name, depth).await {
            Ok(symbols) => to_json(&symbols),
            Err(e) => error_json(&e),
        })
    }

    #[tool(description = "Find all functions/methods called by the specified symbol.")]
    async fn get_callees(
        &self,
        Parameters(req): Parameters<CallGraphRequest>,
    ) -> Result<String, String> {
        let depth = req.depth.unwrap_or(1);
        Ok(match self.searcher.get_callees(&req.qualified_name, depth).await {
            Ok(symbols) => to_json(&symbols),
            Err(e) => error_json(&e),
        })
    }

    #[tool(description = "Count the callers of a symbol within a call-graph depth.")]
    async fn count_callers(
        &self,
        Parameters(req): Parameters<CallGraphRequest>,
    ) -> Result<String, String> {
        let depth = req.depth.unwrap_or(1);
        Ok(match self.searcher.count_callers(&req.qualified_name, depth).await {
            Ok(count) => serde_json::json!({ "count": count }).to_string(),
            Err(e) => error_json(&e),
        })
    }

    #[tool(description = "Count the callees of a symbol within a call-graph depth.")]
    async fn count_callees(
        &self,
        Parameters(req): Parameters<CallGraphRequest>,
    ) -> Result<String, String> {
        let depth = req.depth.unwrap_or(1);
        Ok(match self.searcher.count_callees(&req.qualified_name, depth).await {
            Ok(count) => serde_json::json!({ "count": count }).to_string(),
            Err(e) => error_json(&e),
        })
    }

    #[tool(description = "Show what modules a file imports and what other files import it.")]
    async fn get_file_imports(
        &self,
        Parameters(req): Parameters<FileImportsRequest>,
    ) -> Result<String, String> {
        Ok(match self.searcher.get_file_imports(&req.file_path).await {
            Ok(imports) => to_json(&imports),
            Err(e) => error_json(&e),
        })
    }

    #[tool(
        description = "List symbols filtered by kind, name pattern, or file. Useful for structural queries like 'all classes in module x'."
    )]
    async fn list_symbols(
        &self,
        Parameters(req): Parameters<ListSymbolsRequest>,
    ) -> Result<String, String> {
        let kind = match req.kind.as_deref() {
            Some(raw) => match SymbolKind::parse(raw) {
                Some(kind) => Some(kind),
                None => {
                    return Ok(serde_json::json!({
                        "error": format!("unknown symbol kind: {raw}")
                    })
                    .to_string());
                }
            },
            None => None,
        };
        Ok(
            match self.searcher.list_symbols(kind, req.pattern, req.file_path).await {
                Ok(symbols) => to_json(&symbols),
                Err(e) => error_json(&e),
            },
        )
    }

    #[tool(
        description = "Get the inheritance hierarchy for a class: its parent classes and all known subclasses."
    )]
    async fn get_class_hierarchy(
        &self,
        Parameters(req): Parameters<ClassHierarchyRequest>,
    ) -> Result<String, String> {
        Ok(match self.searcher.get_class_hierarchy(&req.class_name).await {
            Ok(hierarchy) => to_json(&hierarchy),
            Err(e) => error_json(&e),
        })
    }
}

impl ServerHandler for SymdexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "symdex".into(),
                title: Some("symdex - per-repository code index".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "symdex answers structural, textual, and semantic questions about the indexed \
                 repository: symbol lookup, call graphs, class hierarchies, and hybrid search."
                    .into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        }))
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let ctx = ToolCallContext::new(self, request, context);
            self.tool_router.call(ctx).await
        }
    }
}
