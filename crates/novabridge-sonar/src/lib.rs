//! NovaBridge Sonar - client for the SteelSeries Sonar mixing service.
//!
//! Sonar runs a local web server whose address changes on every start. This
//! crate discovers it through the GG core props file and sub-app registry,
//! then talks to it over blocking HTTP. Sonar's routes and payloads differ
//! between GG releases, so reads and writes probe known variants in order
//! (see [`probe`]).

pub mod client;
pub mod discovery;
pub mod error;
pub mod http;
pub mod presets;
pub mod probe;
pub mod volume;

pub use client::SonarClient;
pub use discovery::{CoreProps, ServiceDiscovery, ServiceEndpoints};
pub use error::{SonarError, SonarResult};
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use presets::PresetStore;
pub use probe::{Verdict, try_candidates_in_order};
pub use volume::{extract_channel_mute, extract_channel_volume, looks_like_volume_payload};
