use base64::{STANDARD, decode_config};

/// Length of an uncompressed P-256 public key, the form VAPID keys take.
pub const APPLICATION_SERVER_KEY_LEN: usize = 65;

#[derive(Debug, thiserror::Error)]
pub enum KeyDecodeError {
    #[error("application server key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Raw bytes handed to the platform push API as the application server key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationServerKey(Vec<u8>);

impl ApplicationServerKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_uncompressed_p256(&self) -> bool {
        self.0.len() == APPLICATION_SERVER_KEY_LEN && self.0[0] == 0x04
    }
}

/// Converts a URL-safe base64 key (padding optional) into raw key bytes.
///
/// The input is padded to a multiple of four, the URL-safe alphabet is mapped
/// back onto the standard one and the result is decoded. A failure here means
/// the server handed out a corrupt key; callers must not mask it.
pub fn url_base64_to_key(encoded: &str) -> Result<ApplicationServerKey, KeyDecodeError> {
    let padding = "=".repeat((4 - encoded.len() % 4) % 4);
    let standard: String = encoded
        .chars()
        .chain(padding.chars())
        .map(|ch| match ch {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let raw = decode_config(&standard, STANDARD)?;
    Ok(ApplicationServerKey(raw))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use base64::{URL_SAFE_NO_PAD, encode_config};

    const VAPID_PUBLIC_KEY: &str =
        "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U";

    #[test]
    fn url_base64_to_key__should_decode_vapid_public_key() {
        // When
        let key = url_base64_to_key(VAPID_PUBLIC_KEY).expect("decode key");

        // Then
        assert_eq!(key.len(), APPLICATION_SERVER_KEY_LEN);
        assert!(key.is_uncompressed_p256());
        assert_eq!(key.as_bytes()[1], 0x24);
    }

    #[test]
    fn url_base64_to_key__should_be_deterministic() {
        // When
        let first = url_base64_to_key(VAPID_PUBLIC_KEY).expect("decode key");
        let second = url_base64_to_key(VAPID_PUBLIC_KEY).expect("decode key");

        // Then
        assert_eq!(first, second);
    }

    #[test]
    fn url_base64_to_key__should_handle_every_padding_remainder() {
        for len in [1usize, 2, 3, 16, 32, 64, 65] {
            // Given
            let bytes: Vec<u8> = (0..len).map(|i| (i * 37 % 256) as u8).collect();
            let encoded = encode_config(&bytes, URL_SAFE_NO_PAD);

            // When
            let key = url_base64_to_key(&encoded).expect("decode key");

            // Then
            assert_eq!(key.len(), len, "length {len}");
            assert_eq!(key.as_bytes(), bytes.as_slice());
        }
    }

    #[test]
    fn url_base64_to_key__should_map_url_safe_characters() {
        // Given
        let bytes = [0xfb, 0xff, 0xbf];

        // When
        let key = url_base64_to_key("-_-_").expect("decode key");

        // Then
        assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn url_base64_to_key__should_accept_already_padded_input() {
        // When
        let key = url_base64_to_key("AQI=").expect("decode key");

        // Then
        assert_eq!(key.as_bytes(), &[1, 2]);
    }

    #[test]
    fn url_base64_to_key__should_reject_corrupt_keys() {
        assert!(url_base64_to_key("a").is_err());
        assert!(url_base64_to_key("not base64!").is_err());
    }
}
