//! Configuration: env-var wire shape (`raw`), resolved types (`types`),
//! loading/defaulting logic (`load`) — mirrors the reference architecture's
//! three-way config split.

mod load;
mod raw;
mod types;

pub use load::load;
pub use types::{BackendConfig, ChatConfig, Config, FaqStoreConfig, InternalApiConfig, PubSubConfig};
