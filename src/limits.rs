//! Hard limits on input sizes and store growth.

/// Max venues in one store.
pub const MAX_VENUES: usize = 10_000;

/// Max accepted lectures on a single venue (all dates).
pub const MAX_LECTURES_PER_VENUE: usize = 100_000;

/// Max byte length of a venue name.
pub const MAX_NAME_LEN: usize = 256;

/// Max byte length of course / department / level text.
pub const MAX_FIELD_LEN: usize = 256;

/// Max request body accepted by the HTTP layer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;
