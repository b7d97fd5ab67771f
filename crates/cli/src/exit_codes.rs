//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part of the
//! shell contract — nightly import scripts branch on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success: every record applied cleanly                 |
//! | 1    | Runtime error (unreadable file, bad snapshot, IO)     |
//! | 2    | Usage / invalid config                                |
//! | 3    | Records queued for human review                       |
//! | 4    | Malformed vendor records rejected                     |

/// Success - every vendor record applied (or was already up to date).
pub const EXIT_SUCCESS: u8 = 0;

/// Runtime error - unreadable input, bad inventory snapshot, IO failure.
pub const EXIT_RUNTIME: u8 = 1;

/// Usage error - bad arguments or a config that fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 2;

/// One or more records were routed to the review queue.
pub const EXIT_REVIEW_QUEUED: u8 = 3;

/// One or more vendor rows were malformed and rejected.
pub const EXIT_REJECTED: u8 = 4;
