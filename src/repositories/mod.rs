//! # Repositories
//!
//! Data access layer over the SeaORM entities. Each repository borrows the
//! shared connection pool and returns [`RepositoryError`](crate::error::RepositoryError).

pub mod notification;
pub mod publication;
pub mod search_history;

pub use notification::NotificationRepository;
pub use publication::PublicationRepository;
pub use search_history::SearchHistoryRepository;
