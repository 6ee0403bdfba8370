use anyhow::Result;
use env_logger::Env;
use nwscript_language_server::config::ServerOptions;
use nwscript_language_server::lsp::serve;

#[tokio::main]
async fn main() -> Result<()> {
    let options = ServerOptions::from_args_and_env()?;

    // RUST_LOG wins over --log-level; output goes to stderr, stdout carries LSP
    env_logger::Builder::from_env(Env::default().default_filter_or(options.log_level.as_str()))
        .init();

    log::info!(
        "Starting nwscript-language-server {}",
        env!("CARGO_PKG_VERSION")
    );
    serve(options).await
}
