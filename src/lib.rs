pub mod api;
pub mod app;
pub mod error;
pub mod event_bus;
pub mod gateway;
pub mod prefs;
pub mod tracing_setup;
pub mod ui;
pub mod user_config;

pub use event_bus::*;

use std::collections::HashMap;
use std::sync::Arc;

use api::catalog::{ModelInfo, ShowcaseModel};
use api::execute::ExecOutcome;
use app::App;
use prefs::{FilePrefs, PrefStore};
use user_config::UserConfig;

#[derive(Clone, Debug)]
pub enum CatalogEvent {
    /// Both catalog calls settled; showcase may be empty on partial failure.
    Loaded {
        models: Vec<ModelInfo>,
        showcase: HashMap<String, ShowcaseModel>,
    },
    Failed {
        message: String,
    },
}

#[derive(Clone, Debug)]
pub enum ExecEvent {
    Completed { outcome: Box<ExecOutcome> },
    Failed { message: String },
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    /// Work for the gateway manager.
    Gateway(gateway::Command),
    Catalog(CatalogEvent),
    Exec(ExecEvent),
}

impl AppEvent {
    pub fn priority(&self) -> EventPriority {
        match self {
            // Commands are consumed off the UI thread.
            AppEvent::Gateway(_) => EventPriority::Background,
            // Results feed the draw loop.
            AppEvent::Catalog(_) => EventPriority::Realtime,
            AppEvent::Exec(_) => EventPriority::Realtime,
        }
    }
}

pub async fn try_main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();

    let config = UserConfig::load()?;
    tracing::debug!("config: base_url={}", config.base_url);

    let event_bus = Arc::new(EventBus::new(EventBusCaps::default()));
    let prefs: Arc<dyn PrefStore> = Arc::new(FilePrefs::load(UserConfig::prefs_path())?);

    let client = api::ApiClient::new(&config);
    tokio::spawn(gateway::gateway_manager(
        event_bus.subscribe(EventPriority::Background),
        client,
        Arc::clone(&event_bus),
    ));

    let terminal = ratatui::init();
    let app = App::new(config, prefs, &event_bus);
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}
