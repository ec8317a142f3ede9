pub mod api;
pub mod client;
pub mod config;
pub mod poller;
pub mod sensor;
pub mod state;

pub use client::Client;
pub use client::DeviceRecord;
pub use client::FetchError;
pub use config::Config;
pub use state::SharedState;
pub use state::State;
