//! One-time credential generation: numeric OTP codes and invite tokens.

use quadra_core::constants::OTP_LENGTH;
use uuid::Uuid;

/// Generate a 6-digit numeric OTP, zero-padding allowed ("042137" is valid).
pub fn generate_otp() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Invite tokens are plain v4 UUIDs; uniqueness is enforced by the store.
pub fn generate_invite_token() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_numeric_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn invite_tokens_are_unique() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }
}
