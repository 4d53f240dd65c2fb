//! Voyage Hub - room registry and broadcast hub
//!
//! This crate admits logical connections into named rooms ("voyages"),
//! enforces that each limited role has at most one occupant per room, and
//! fans messages out to every member of a room. It has no HTTP dependencies
//! and never touches transport framing: a transport plugs in by implementing
//! [`Connection`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voyage_hub::{Connection, ConnectionHub, ConnectionId, HubConfig, SendError, VoyageMessage};
//!
//! struct Printer(ConnectionId);
//!
//! impl Connection for Printer {
//!     fn id(&self) -> ConnectionId {
//!         self.0
//!     }
//!
//!     async fn send_text(&self, text: Arc<str>) -> Result<(), SendError> {
//!         println!("{}: {}", self.0, text);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = ConnectionHub::new(HubConfig::default());
//!     let captain = Arc::new(Printer(ConnectionId::next()));
//!
//!     hub.admit(&captain, "space", "Captain").await.unwrap();
//!     hub.broadcast(&VoyageMessage::system("Captain has joined the voyage."), "space")
//!         .await
//!         .unwrap();
//!
//!     let status = hub.role_status("space").await;
//!     assert_eq!(status.get("Captain"), Some(&true));
//! }
//! ```

mod connection;
mod error;
mod history;
mod hub;
mod message;
mod registry;

pub use connection::{Connection, ConnectionId};
pub use error::{HubError, ROLE_OCCUPIED_CLOSE_CODE, Rejection, SendError};
pub use hub::{Admission, ConnectionHub, HubConfig};
pub use message::{RoleStatus, VoyageMessage};
pub use registry::RoomId;
