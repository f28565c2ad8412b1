//! Application-wide constants.

/// Per-question mark cap; max score for an aspect dimension is
/// `question_count * MARKS_PER_QUESTION`, independent of option count.
pub const MARKS_PER_QUESTION: i32 = 5;

/// OTP codes are 6-digit numeric strings.
pub const OTP_LENGTH: usize = 6;

/// OTP codes expire 10 minutes after issue.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Invitations expire 7 days after (re)send.
pub const INVITE_TTL_DAYS: i64 = 7;

/// How many recent conversation turns the chatbot forwards as context.
pub const CHAT_HISTORY_TURNS: usize = 5;
