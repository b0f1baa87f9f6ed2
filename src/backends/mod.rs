//! Thin HTTP clients for the external collaborators named in spec §6.
//! Business logic for leaf commands lives elsewhere (out of scope per
//! spec §1); these are just typed request/response shims with a shared
//! per-client timeout.

pub mod faq_store;
pub mod mirror;
pub mod platform;
pub mod presence;
pub mod score;
pub mod tournament_api;

pub use faq_store::FaqStore;
pub use platform::PlatformApi;
pub use presence::PresenceApi;
pub use score::ScoreApi;
pub use tournament_api::TournamentApi;
