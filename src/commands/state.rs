use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::Result;
use crate::models::SelectedFile;
use crate::services::api_client::{ReviewApi, ReviewApiClient};
use crate::services::config_service::Config;
use crate::services::file_collector::FileCollector;
use crate::services::file_service::FsStore;
use crate::services::markdown_service::MessageRenderer;
use crate::services::session_service::SessionController;
use crate::services::store_service::{ObjectStore, RecordStore};
use crate::services::submit_service::RecordSubmitter;

/// Everything one window of the app owns. Commands borrow it; nothing else
/// mutates the session or the file selection.
pub struct AppState {
    pub config: Config,
    pub(crate) session: SessionController,
    pub(crate) collector: FileCollector,
    /// The upload form's view of the file selection, fed by the collector.
    pub(crate) selection: watch::Receiver<Vec<SelectedFile>>,
    pub(crate) submitter: RecordSubmitter,
    pub(crate) renderer: MessageRenderer,
}

impl AppState {
    pub fn new(
        config: Config,
        api: Arc<dyn ReviewApi>,
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let (selection_tx, selection) = watch::channel(Vec::new());
        let collector = FileCollector::new(config.max_file_size, move |files| {
            selection_tx.send_replace(files.to_vec());
        });

        Self {
            session: SessionController::new(api).with_allowed_host(config.allowed_host.clone()),
            collector,
            selection,
            submitter: RecordSubmitter::new(records, objects, &config),
            renderer: MessageRenderer::new(&config.theme),
            config,
        }
    }

    /// Wires the HTTP backend and the on-disk store described by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let api = Arc::new(ReviewApiClient::from_config(&config)?);
        let store = Arc::new(FsStore::open(config.data_dir.as_deref())?);
        Ok(Self::new(config, api, store.clone(), store))
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn selected_files(&self) -> Vec<SelectedFile> {
        self.selection.borrow().clone()
    }
}
