mod routes;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use taskboard_db::Db;
use taskboard_service::LocalService;
use taskboard_store::ObjectStore;
use tokio::net::TcpListener;

pub async fn serve(listener: TcpListener, db: Db, store: Arc<dyn ObjectStore>) -> Result<()> {
    let service = LocalService::new(db, store.clone());
    let app = routes::build_router(service, store);
    axum::serve(listener, app).await?;
    Ok(())
}
