mod auth;
mod blob;
mod media;
mod project;
mod reconcile;
mod settings;
mod store;

#[cfg(feature = "http")]
pub mod http;

pub use auth::{
    AuthError, AuthGate, AuthMode, Claims, Credentials, Login, TokenError, TokenSigner,
    ADMIN_PASSWORD_HEADER,
};
pub use blob::{
    content_etag, BlobError, BlobMeta, BlobObject, BlobStore, FileSystemBlobStore,
    InMemoryBlobStore, PutCondition,
};
pub use media::{
    media_key, media_keys, media_refs, media_url, sanitize_filename, MEDIA_ROUTE_PREFIX,
};
pub use project::{
    builtin_projects, ConfigDocument, DocumentError, ProjectRecord, CONFIG_KEY, SCHEMA_VERSION,
};
pub use reconcile::{MediaReconciler, ReconcilerStats, MIN_INTERVAL as MIN_RECONCILE_INTERVAL};
pub use settings::{
    AuthSettings, Settings, SettingsError, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
    DEFAULT_RECONCILE_GRACE, DEFAULT_TOKEN_TTL,
};
pub use store::{
    CleanupReport, ConfigStore, Fallback, ReconcileReport, Snapshot, StoreError, VersionPolicy,
    VersionTag, WriteOutcome,
};
