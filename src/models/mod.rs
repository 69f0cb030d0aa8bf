//! # Data Models
//!
//! This module contains all the data models used throughout the Comunica Hub
//! service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod notification;
pub mod publication;
pub mod search_history;

pub use notification::Entity as Notification;
pub use publication::Entity as Publication;
pub use search_history::Entity as SearchHistory;

pub use notification::{NotificationKind, NotificationPriority};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "comunica-hub".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
