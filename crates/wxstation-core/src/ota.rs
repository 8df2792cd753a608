use log::warn;

use crate::StationError;
use crate::config::OTA_PASSWORD;

/// Password check in front of over-the-air uploads
pub struct OtaGate<'a> {
    password: &'a str,
}

impl Default for OtaGate<'static> {
    fn default() -> Self {
        Self::new(OTA_PASSWORD)
    }
}

impl<'a> OtaGate<'a> {
    pub const fn new(password: &'a str) -> Self {
        Self { password }
    }

    /// Accept only the exact password. The comparison time does not depend on
    /// where the candidate first differs.
    pub fn authorize(&self, candidate: &str) -> Result<(), StationError> {
        let expected = self.password.as_bytes();
        let candidate = candidate.as_bytes();

        let mut diff = u8::from(expected.len() != candidate.len());
        for (i, &e) in expected.iter().enumerate() {
            diff |= e ^ candidate.get(i).copied().unwrap_or(!e);
        }

        if diff == 0 {
            Ok(())
        } else {
            warn!("OTA upload refused: bad password");
            Err(StationError::OtaRejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_password() {
        let gate = OtaGate::default();
        assert!(gate.authorize("admin").is_ok());
    }

    #[test]
    fn test_rejects_near_misses() {
        let gate = OtaGate::default();
        for candidate in ["", "admi", "admin ", "Admin", "adminadmin"] {
            assert!(
                matches!(gate.authorize(candidate), Err(StationError::OtaRejected)),
                "{candidate:?} accepted"
            );
        }
    }

    #[test]
    fn test_custom_password() {
        let gate = OtaGate::new("s3cret");
        assert!(gate.authorize("s3cret").is_ok());
        assert!(gate.authorize("admin").is_err());
    }
}
