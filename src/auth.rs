use chrono::Local;
use sha2::{Digest, Sha512};

use crate::requests::MethodRequest;

/// Salt appended to account+login for ordinary principals.
pub const SALT: &str = "Otus";
/// Login of the administrative principal.
pub const ADMIN_LOGIN: &str = "admin";
/// Salt appended to the hour stamp for the administrative digest.
pub const ADMIN_SALT: &str = "42";

/// Lowercase-hex SHA-512 of the input, the fixed digest format of every
/// authentication token.
pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Checks the submitted token against the expected digest.
///
/// The administrative digest rotates hourly (local-time hour stamp plus the
/// admin salt); ordinary digests cover account + login + shared salt, with a
/// missing account treated as the empty string. The outcome is a plain
/// boolean — the dispatcher maps a failure to Forbidden.
pub fn check_auth(request: &MethodRequest) -> bool {
    let digest = if request.is_admin() {
        let hour_stamp = Local::now().format("%Y%m%d%H").to_string();
        sha512_hex(&format!("{hour_stamp}{ADMIN_SALT}"))
    } else {
        let account = request.account.as_deref().unwrap_or("");
        sha512_hex(&format!("{}{}{}", account, request.login, SALT))
    };
    digest == request.token
}
