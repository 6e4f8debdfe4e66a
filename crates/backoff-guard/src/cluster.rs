mod client;
pub mod errors;

// This is required to mock the `ClusterClient` inside of our tests
#[mockall_double::double]
pub use client::ClusterClient;
