//! Persisted settings and API key resolution

pub mod credentials;
pub mod settings;

pub use credentials::{
    BACKEND_KEY_ENV, CredentialError, KeyPreference, KeySource, ResolvedKey, backend_key_from_env,
    mask_key, resolve_api_key,
};
pub use settings::{
    ApiConfig, ApiSettings, CredentialSettings, DEFAULT_BASE_URL, MAX_BATCH_SIZE, Settings,
    SubmissionSettings,
};
