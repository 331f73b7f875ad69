//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `keyward_core::defaults`.

use keyward_core::defaults;

/// Generate default value functions that forward to keyward_core::defaults constants.
macro_rules! default_fns {
    // For Copy types (integers, bool, etc.)
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

default_fns! {
    default_auto_update_database   => DEFAULT_AUTO_UPDATE_DATABASE: bool,
    default_plain_text_password    => DEFAULT_PLAIN_TEXT_PASSWORD: bool,
    default_migration_retry_secs   => DEFAULT_MIGRATION_RETRY_SECS: u64,
    default_pool_max_connections   => DEFAULT_POOL_MAX_CONNECTIONS: u32,
    default_pool_min_connections   => DEFAULT_POOL_MIN_CONNECTIONS: u32,
    default_pool_acquire_timeout_secs => DEFAULT_POOL_ACQUIRE_TIMEOUT_SECS: u64,
    default_pool_idle_timeout_secs => DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64,
    default_pool_max_lifetime_secs => DEFAULT_POOL_MAX_LIFETIME_SECS: u64,
}
