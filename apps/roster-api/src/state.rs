use std::sync::Arc;

use roster_providers::verification::VerificationClient;
use roster_service::RosterService;
use roster_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RosterService>,
	db: Option<Arc<Db>>,
}
impl AppState {
	pub async fn new(config: roster_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let db = Arc::new(db);
		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let verification = VerificationClient::new(&config.providers.verification)?;
		let service = RosterService::new(config, db.clone(), Arc::new(qdrant), verification)?;

		Ok(Self { service: Arc::new(service), db: Some(db) })
	}

	/// Wraps a service built over caller-supplied backends. Nothing is closed on shutdown.
	pub fn from_service(service: RosterService) -> Self {
		Self { service: Arc::new(service), db: None }
	}

	pub async fn close(&self) {
		if let Some(db) = &self.db {
			db.close().await;
		}
	}
}
