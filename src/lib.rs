//! Real-time client for the VistaScan imaging consultation platform.
//!
//! Maintains one persistent WebSocket to the notification endpoint and turns
//! server events into two side effects: query-cache invalidation (so stale
//! UI data is refetched) and role/identity-aware transient notifications.
//! Connection drops are recovered with exponential backoff; a heartbeat
//! keeps idle channels alive.
//!
//! The host application supplies three collaborators: a [`CredentialStore`]
//! (auth token plus viewer identity), a [`CacheStore`] (tag-indexed query
//! cache), and a [`NotificationSink`] (banner display). Nothing in this
//! crate ever throws into the host; failures are logged and absorbed.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vistascan_realtime::{
//!     CacheStore, CacheTag, ConnectionGuard, MemoryCredentialStore, Notification,
//!     NotificationSink, Role, SocketConfig, SocketManager,
//! };
//!
//! struct QueryCache;
//! impl CacheStore for QueryCache {
//!     fn invalidate(&self, tags: &[CacheTag]) { /* mark regions stale */ }
//! }
//!
//! struct Banners;
//! impl NotificationSink for Banners {
//!     fn show(&self, n: Notification) { println!("{}: {}", n.title, n.body); }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let credentials = Arc::new(MemoryCredentialStore::new());
//!     credentials.set_session("jwt", "user-1", Role::Patient);
//!
//!     let manager = Arc::new(SocketManager::new(
//!         SocketConfig::new("wss://api.example.com/ws"),
//!         credentials,
//!         Arc::new(QueryCache),
//!         Arc::new(Banners),
//!     ));
//!
//!     // Hold the guard for the authenticated session; dropping it
//!     // disconnects and suppresses reconnection.
//!     let _session = ConnectionGuard::new(Arc::clone(&manager)).await;
//! }
//! ```

pub mod cache;
pub mod credentials;
pub mod error;
pub mod frame;
pub mod notify;
pub mod socket;
pub mod types;

pub use cache::{invalidation_tags, CacheStore, CacheTag};
pub use credentials::{CredentialStore, MemoryCredentialStore, Viewer};
pub use error::{RealtimeError, Result};
pub use frame::Frame;
pub use notify::{notification_for, Notification, NotificationKind, NotificationSink};
pub use socket::{ConnectionGuard, ReconnectPolicy, SocketConfig, SocketManager};
pub use types::{EventKind, NotificationEvent, Role};
