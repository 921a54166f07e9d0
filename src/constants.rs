/// Medicines with quantity strictly below this are reported as low stock
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 8;

/// Session lifetime when SESSION_TTL_SECS is not set (24 hours)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

/// Name of the cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "medstock_session";

/// Date format used for expiry dates, in forms and in mass import
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of comma-separated fields in a mass import line
pub const IMPORT_FIELD_COUNT: usize = 5;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

pub const ERR_EMAIL_REGISTERED: &str = "Email already registered.";

pub const ERR_NOT_ENOUGH_STOCK: &str = "Not enough stock available.";

pub const ERR_NO_MEDICINES_SELECTED: &str = "No medicines selected.";

pub const ERR_QUANTITY_NOT_POSITIVE: &str = "Quantity must be a positive integer";
