// Authentication module
// Credential storage, refresh exchange and the single-flight refresh episode

mod credentials;
mod episode;
mod refresh;
mod types;

pub use credentials::{
    CredentialStore, MemoryStorage, SqliteStorage, TokenStorage, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
pub use types::{SessionEvent, TokenPair};

pub(crate) use episode::{Admission, EpisodeGuard, RefreshCoordinator};
pub(crate) use refresh::exchange_refresh_token;
pub(crate) use types::token_preview;
