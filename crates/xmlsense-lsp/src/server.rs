//! Language server backend
//!
//! Keeps the open documents and the active settings, and answers
//! formatting, folding, outline and selection requests from the cached
//! parse tree of each document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::{
    self as lsp, DidChangeConfigurationParams, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DocumentFormattingParams,
    DocumentRangeFormattingParams, DocumentSymbolParams, DocumentSymbolResponse, FoldingRange,
    FoldingRangeParams, FoldingRangeProviderCapability, FormattingOptions, InitializeParams,
    InitializeResult, InitializedParams, MessageType, OneOf, SelectionRange,
    SelectionRangeParams, SelectionRangeProviderCapability, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url,
};
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};
use xmlsense_core::{
    parse, CancellationToken, FormatError, Formatter, FormattingSettings,
    InternalSubsetContentModel, TextEdit,
};
use xmlsense_dom::{Document, Range};

use crate::config::Settings;
use crate::document::{from_lsp_position, from_lsp_range, to_lsp_range, TextDocument};
use crate::intelligence::SelectionAnalyzer;
use crate::structural::{FoldingAnalyzer, SymbolAnalyzer};

/// LSP Backend state
struct Backend {
    /// LSP client for sending notifications
    client: Client,
    /// Document store for open documents
    documents: Arc<RwLock<HashMap<Url, TextDocument>>>,
    /// Workspace settings with client overrides applied
    settings: Arc<RwLock<Settings>>,
}

impl Backend {
    /// Create a new backend instance
    fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
            settings: Arc::new(RwLock::new(Settings::default())),
        }
    }

    /// Parse tree of an open document
    ///
    /// A missing tree is built on a blocking worker without holding the
    /// document lock, then cached unless the text changed meanwhile.
    async fn get_tree(&self, uri: &Url) -> Option<Arc<Document>> {
        let (text, dialect) = {
            let docs = self.documents.read().await;
            let document = docs.get(uri)?;
            if let Some(tree) = document.cached_tree() {
                return Some(tree);
            }
            (document.text().to_string(), document.dialect())
        };

        let tree = match tokio::task::spawn_blocking(move || parse(&text, dialect)).await {
            Ok(tree) => Arc::new(tree),
            Err(error) => {
                warn!("Parser task failed for {}: {}", uri, error);
                return None;
            }
        };

        let mut docs = self.documents.write().await;
        if let Some(document) = docs.get_mut(uri) {
            if !document.cache_tree(Arc::clone(&tree)) {
                debug!("Document {} changed while parsing", uri);
            }
        }
        Some(tree)
    }

    /// Store or replace a document
    async fn store_document(&self, uri: Url, document: TextDocument) {
        let mut docs = self.documents.write().await;
        docs.insert(uri, document);
    }

    /// Remove document from store
    async fn remove_document(&self, uri: &Url) {
        let mut docs = self.documents.write().await;
        docs.remove(uri);
    }

    /// Run the formatter on a blocking worker
    ///
    /// Dropping the returned future, which tower-lsp does when the client
    /// cancels the request, cancels the formatter.
    async fn format(
        &self,
        uri: &Url,
        options: &FormattingOptions,
        range: Option<lsp::Range>,
    ) -> Result<Option<Vec<lsp::TextEdit>>> {
        let Some(tree) = self.get_tree(uri).await else {
            warn!("Document not found for formatting: {}", uri);
            return Ok(None);
        };
        let settings = self.settings.read().await.format_for_request(options);
        let range = range.map(from_lsp_range);

        let guard = CancelOnDrop(CancellationToken::new());
        let token = guard.0.clone();
        let result =
            tokio::task::spawn_blocking(move || format_tree(&tree, &settings, range, Some(token)))
                .await;
        drop(guard);

        match result {
            Ok(Ok(edits)) => {
                debug!("Generated {} formatting edits for {}", edits.len(), uri);
                Ok(Some(edits.into_iter().map(to_lsp_edit).collect()))
            }
            Ok(Err(FormatError::Cancelled)) => {
                debug!("Formatting cancelled for {}", uri);
                Err(Error::new(ErrorCode::RequestCancelled))
            }
            Ok(Err(FormatError::OutOfRange(error))) => Err(Error::invalid_params(error.to_string())),
            Err(error) => {
                warn!("Formatter task failed for {}: {}", uri, error);
                Err(Error::internal_error())
            }
        }
    }
}

/// Cancels the token when the owning request goes away
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Format `tree`, consulting its internal subset for mixed-content models
pub fn format_tree(
    tree: &Document,
    settings: &FormattingSettings,
    range: Option<Range>,
    cancellation: Option<CancellationToken>,
) -> xmlsense_core::Result<Vec<TextEdit>> {
    let provider = InternalSubsetContentModel::from_document(tree);
    let mut formatter = Formatter::new(settings).with_provider(&provider);
    if let Some(token) = cancellation {
        formatter = formatter.with_cancellation(token);
    }
    match range {
        Some(range) => formatter.format_range(tree, range),
        None => formatter.format(tree),
    }
}

pub fn to_lsp_edit(edit: TextEdit) -> lsp::TextEdit {
    lsp::TextEdit {
        range: to_lsp_range(edit.range),
        new_text: edit.new_text,
    }
}

/// Path used to pick the dialect of a document
fn document_path(uri: &Url) -> PathBuf {
    uri.to_file_path()
        .unwrap_or_else(|_| Path::new(uri.path()).to_path_buf())
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first()) {
        return folder.uri.to_file_path().ok();
    }
    #[allow(deprecated)]
    let root = params.root_uri.as_ref();
    root.and_then(|uri| uri.to_file_path().ok())
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("xmlsense LSP server initializing");

        let mut settings = match workspace_root(&params) {
            Some(root) => Settings::load_from_dir(&root).unwrap_or_else(|error| {
                warn!("{}, using defaults", error);
                Settings::default()
            }),
            None => Settings::default(),
        };
        if let Some(options) = &params.initialization_options {
            settings.apply_client_settings(options);
        }
        *self.settings.write().await = settings;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                selection_range_provider: Some(SelectionRangeProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "xmlsense-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("xmlsense LSP server initialized");
        self.client
            .log_message(MessageType::INFO, "xmlsense language server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("xmlsense LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        debug!("Document opened: {}", item.uri);
        let dialect = self.settings.read().await.dialect_for(&document_path(&item.uri));
        let document = TextDocument::new(item.text, item.version, dialect);
        self.store_document(item.uri, document).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document changed: {}", uri);
        let mut docs = self.documents.write().await;
        let Some(document) = docs.get_mut(&uri) else {
            warn!("Change for unknown document: {}", uri);
            return;
        };
        if let Err(error) =
            document.apply_changes(params.text_document.version, &params.content_changes)
        {
            warn!("Rejected change for {}: {}", uri, error);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        self.remove_document(&params.text_document.uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let mut settings = self.settings.write().await;
        if settings.apply_client_settings(&params.settings) {
            info!("Formatting settings updated");
        } else {
            debug!("Ignoring configuration change without xml.format");
        }
    }

    async fn formatting(
        &self,
        params: DocumentFormattingParams,
    ) -> Result<Option<Vec<lsp::TextEdit>>> {
        let uri = params.text_document.uri;
        debug!("Formatting request for: {}", uri);
        self.format(&uri, &params.options, None).await
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<lsp::TextEdit>>> {
        let uri = params.text_document.uri;
        debug!("Range formatting request for: {}", uri);
        self.format(&uri, &params.options, Some(params.range)).await
    }

    async fn folding_range(
        &self,
        params: FoldingRangeParams,
    ) -> Result<Option<Vec<FoldingRange>>> {
        let uri = params.text_document.uri;
        debug!("Folding range request for: {}", uri);

        let Some(tree) = self.get_tree(&uri).await else {
            warn!("Document not found for folding: {}", uri);
            return Ok(None);
        };

        let ranges = FoldingAnalyzer::generate_ranges(&tree);
        debug!("Generated {} folding ranges for {}", ranges.len(), uri);

        Ok(Some(ranges))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        debug!("Document symbol request for: {}", uri);

        let Some(tree) = self.get_tree(&uri).await else {
            warn!("Document not found for symbols: {}", uri);
            return Ok(None);
        };

        let symbols = SymbolAnalyzer::extract_symbols(&tree);
        debug!("Generated {} document symbols for {}", symbols.len(), uri);

        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn selection_range(
        &self,
        params: SelectionRangeParams,
    ) -> Result<Option<Vec<SelectionRange>>> {
        let uri = params.text_document.uri;
        debug!("Selection range request for: {}", uri);

        let Some(tree) = self.get_tree(&uri).await else {
            warn!("Document not found for selection: {}", uri);
            return Ok(None);
        };

        // One entry per requested position, in order
        let analyzer = SelectionAnalyzer::new(&tree);
        let mut ranges = Vec::with_capacity(params.positions.len());
        for position in params.positions {
            let offset = tree
                .offset_at(from_lsp_position(position))
                .map_err(|error| Error::invalid_params(error.to_string()))?;
            let selection = analyzer.selection_range(offset).unwrap_or(SelectionRange {
                range: lsp::Range::new(position, position),
                parent: None,
            });
            ranges.push(selection);
        }

        Ok(Some(ranges))
    }
}

/// Run the LSP server on stdin/stdout
pub async fn run_server() {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting xmlsense Language Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlsense_core::{apply_edits, parse};
    use xmlsense_dom::{Dialect, Position};

    #[test]
    fn test_format_tree_whole_document() {
        let tree = parse("<a><b/></a>", Dialect::Xml);
        let edits = format_tree(&tree, &FormattingSettings::default(), None, None).unwrap();
        assert_eq!(apply_edits(tree.text(), &edits), "<a>\n  <b />\n</a>");
    }

    #[test]
    fn test_format_tree_uses_internal_subset() {
        let text = "<!DOCTYPE p [\n  <!ELEMENT p (#PCDATA|b)*>\n]>\n<p><b>two</b></p>";
        let tree = parse(text, Dialect::Xml);
        let edits = format_tree(&tree, &FormattingSettings::default(), None, None).unwrap();
        assert!(edits.is_empty(), "mixed content stays inline: {:?}", edits);
    }

    #[test]
    fn test_format_tree_cancelled() {
        let tree = parse("<a><b/></a>", Dialect::Xml);
        let token = CancellationToken::new();
        token.cancel();
        let result = format_tree(&tree, &FormattingSettings::default(), None, Some(token));
        assert_eq!(result, Err(FormatError::Cancelled));
    }

    #[test]
    fn test_format_tree_range_out_of_bounds() {
        let tree = parse("<a/>", Dialect::Xml);
        let range = Range::new(Position::new(0, 0), Position::new(9, 0));
        let result = format_tree(&tree, &FormattingSettings::default(), Some(range), None);
        assert!(matches!(result, Err(FormatError::OutOfRange(_))));
    }

    #[test]
    fn test_cancel_on_drop() {
        let guard = CancelOnDrop(CancellationToken::new());
        let token = guard.0.clone();
        assert!(!token.is_cancelled());
        drop(guard);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_to_lsp_edit() {
        let tree = parse("<a>  <b/></a>", Dialect::Xml);
        let edits = format_tree(&tree, &FormattingSettings::default(), None, None).unwrap();
        let edit = to_lsp_edit(edits[0].clone());
        assert_eq!(edit.range.start, lsp::Position::new(0, 3));
        assert_eq!(edit.range.end, lsp::Position::new(0, 5));
        assert_eq!(edit.new_text, "\n  ");
    }

    #[test]
    fn test_document_path_for_untitled() {
        let uri = Url::parse("untitled:schema.dtd").unwrap();
        let settings = Settings::default();
        assert_eq!(settings.dialect_for(&document_path(&uri)), Dialect::Dtd);
    }
}
