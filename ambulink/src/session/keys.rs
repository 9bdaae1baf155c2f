//! Key names used in the session area.

/// Partner id as written at login.
pub const USER_ID: &str = "user_id";

/// Partner id as written by the profile fetch. Kept in sync with [`USER_ID`].
pub const USER_ID_ALIAS: &str = "userId";

/// Cached partner display name.
pub const NAME: &str = "name";

/// Cached partner phone number.
pub const PHONE: &str = "phone";

/// Cached partner email address.
pub const EMAIL: &str = "email";

/// Cached partner photo URL.
pub const PHOTO_URL: &str = "photoUrl";

/// Server-issued key correlating the in-progress ride with location updates.
pub const SESSION_KEY: &str = "sessionKey";

/// Every key the session area may hold.
pub const ALL: [&str; 7] = [
    USER_ID,
    USER_ID_ALIAS,
    NAME,
    PHONE,
    EMAIL,
    PHOTO_URL,
    SESSION_KEY,
];
