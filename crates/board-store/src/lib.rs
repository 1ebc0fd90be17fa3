//! Board Store - where team dashboards live
//!
//! Three interchangeable [`TeamStore`] backends:
//! - [`MemoryStore`]: volatile, for the in-memory variant and tests
//! - [`LocalStore`]: one JSON entry per team in a string-keyed
//!   [`StorageArea`] (quota-limited memory or a directory of files)
//! - [`RemoteStore`]: a subscribed [`DocumentService`] behind an
//!   authentication gate
//!
//! # Example
//!
//! ```rust,ignore
//! use board_store::{FileArea, LocalStore, TeamStore};
//!
//! let store = LocalStore::new(FileArea::new("/var/lib/board"));
//! store.init().await?;
//! let doc = store.load(&"PUD".parse()?).await?;
//! ```

#![warn(unreachable_pub)]

pub mod auth;
pub mod error;
pub mod local;
pub mod memory;
pub mod remote;
pub mod store;

pub use auth::{Authenticator, CredentialRecord, PasswordAuthenticator, Session};
pub use error::{AuthError, StoreError};
pub use local::{FileArea, LocalStore, MemoryArea, StorageArea, DEFAULT_KEY_PREFIX};
pub use memory::MemoryStore;
pub use remote::{DocumentService, InMemoryDocumentService, RemoteStore, DEFAULT_COLLECTION};
pub use store::{Snapshot, Subscription, TeamStore};
