// Service exports
pub mod auth;
pub mod cache;
pub mod memory;
pub mod nearby;
pub mod postgres;
pub mod storage;
pub mod store;

pub use auth::{bearer_token, AuthError, Authenticator, Claims};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use memory::InMemoryUserStore;
pub use nearby::NearbyService;
pub use postgres::PostgresStore;
pub use storage::{StorageError, UploadStorage};
pub use store::{StoreError, UserStore};
