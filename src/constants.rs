/// Minimum accepted password length for registration and password updates.
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Length of issued bearer tokens, in alphanumeric characters.
pub const ACCESS_TOKEN_LENGTH: usize = 40;
