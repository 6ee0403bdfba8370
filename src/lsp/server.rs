use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::config::ServerOptions;
use crate::lsp::backend::Backend;

/// Serve LSP over stdio until the client disconnects
pub async fn serve(options: ServerOptions) -> Result<()> {
    match &options.grammar_path {
        Some(path) => log::info!("Using grammar {}", path.display()),
        None => log::info!("Using the built-in NWScript grammar"),
    }

    let (service, socket) = LspService::new(move |client| Backend::new(client, options.clone()));

    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
