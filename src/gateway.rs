//! Background worker owning all gateway traffic.
//!
//! The UI task never awaits the network directly: it broadcasts a
//! [`Command`] and keeps drawing, and results come back as realtime events.
//! Each command runs in its own task so a slow execution cannot block a
//! catalog refresh.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::api::{ApiClient, catalog, execute};
use crate::event_bus::EventBus;
use crate::{AppEvent, CatalogEvent, ExecEvent};

#[derive(Clone, Debug)]
pub enum Command {
    /// Reload the model catalog and showcase metadata.
    RefreshCatalog,
    /// Submit a prompt under the given rules template.
    Execute {
        model: String,
        rules_template: String,
        prompt: String,
    },
}

pub async fn gateway_manager(
    mut event_rx: broadcast::Receiver<AppEvent>,
    client: ApiClient,
    event_bus: Arc<EventBus>,
) {
    while let Ok(event) = event_rx.recv().await {
        if let AppEvent::Gateway(cmd) = event {
            tracing::info!("gateway command: {:?}", cmd);
            let client = client.clone();
            let bus = Arc::clone(&event_bus);
            tokio::spawn(handle_command(cmd, client, bus));
        }
    }
}

async fn handle_command(cmd: Command, client: ApiClient, bus: Arc<EventBus>) {
    match cmd {
        Command::RefreshCatalog => {
            // Both calls run concurrently; showcase failures are already
            // absorbed inside list_showcase.
            let (models, showcase) =
                tokio::join!(catalog::list_models(&client), catalog::list_showcase(&client));
            match models {
                Ok(models) => {
                    tracing::info!(
                        "catalog loaded: {} models, {} showcase entries",
                        models.len(),
                        showcase.len()
                    );
                    bus.send(AppEvent::Catalog(CatalogEvent::Loaded { models, showcase }));
                }
                Err(e) => {
                    tracing::warn!("catalog load failed: {e}");
                    bus.send(AppEvent::Catalog(CatalogEvent::Failed {
                        message: e.friendly_message(),
                    }));
                }
            }
        }
        Command::Execute {
            model,
            rules_template,
            prompt,
        } => match execute::execute(&client, &model, &rules_template, &prompt).await {
            Ok(outcome) => {
                bus.send(AppEvent::Exec(ExecEvent::Completed {
                    outcome: Box::new(outcome),
                }));
            }
            Err(e) => {
                tracing::warn!("execute failed: {e}");
                bus.send(AppEvent::Exec(ExecEvent::Failed {
                    message: e.friendly_message(),
                }));
            }
        },
    }
}
