pub mod reading;
pub mod routes;

use std::future::Future;

use tokio::net::TcpListener;

pub use reading::{Addressing, Comfort};
pub use routes::{TemperatureQuery, build_router};

/// Serve the mock API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router())
        .with_graceful_shutdown(shutdown)
        .await
}
