//! Environment-driven configuration for the Address Book binary (§7.1).
//! Variables are prefixed `ADDRESS_BOOK_`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AddressBookConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    pub basic_auth_username: String,
    pub basic_auth_password: String,
}

fn default_max_connections() -> u32 {
    5
}

impl AddressBookConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("ADDRESS_BOOK_")
    }
}
