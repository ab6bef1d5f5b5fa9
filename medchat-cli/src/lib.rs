//! # medchat-cli
//!
//! Console front end for [`medchat_rag`]: loads one report, builds its
//! index, then answers questions line by line until `exit`, Ctrl-C or
//! end of input.

pub mod cli;
pub mod console;
pub mod settings;
pub mod telemetry;

use std::io;
use std::sync::Arc;

use medchat_rag::{
    DocumentLoader, GeminiModel, OpenAIEmbeddingProvider, RagPipeline, loader_for_path,
};
use tracing::info;

pub use cli::Args;
pub use console::{Console, EditorInput, Input, LineSource};
pub use settings::ProviderSettings;

/// Run the whole program for already-parsed arguments.
pub async fn run(args: Args) -> anyhow::Result<()> {
    let settings = ProviderSettings::from_env()?;
    let config = args.rag_config()?;

    let embedder = OpenAIEmbeddingProvider::new(&settings.openai_api_key)?
        .with_model(&settings.embedding_model)
        .with_timeout(settings.timeout);
    let model = GeminiModel::new(&settings.google_api_key, &settings.chat_model)?
        .with_temperature(settings.temperature)
        .with_timeout(settings.timeout);

    let document = loader_for_path(&args.document).load(&args.document).await?;

    let pipeline = RagPipeline::builder()
        .config(config.clone())
        .embedding_provider(Arc::new(embedder))
        .language_model(Arc::new(model))
        .build()?;

    println!("Indexing {}...", document.source);
    let mut session = pipeline.open_session(&document).await?;
    info!(session.id = %session.id(), "ready for questions");

    let mut input = EditorInput::new()?;
    Console::new(io::stdout(), config.preview_chars).run(&mut session, &mut input).await
}
