pub mod error;
pub mod router;
pub mod sensors;
pub mod server;
pub mod state;
pub mod temperature;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use server::{ApiServer, shutdown_signal};
pub use state::{AppState, SharedState};
pub use temperature::TemperatureClient;
