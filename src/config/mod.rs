mod settings;

pub use settings::{
    CacheBackend, CacheConfig, GcpConfig, LogFormat, ServerConfig, Settings, load_settings,
};
