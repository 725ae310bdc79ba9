// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use failure::Fail;

/// IEEE Std 802.11-2016, 12.7.2 a)-k). Stateless checks a single frame must
/// pass regardless of session state.
#[derive(Debug, Fail, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[fail(display = "unsupported key descriptor version, expected 2")]
    UnsupportedDescriptorVersion,
    #[fail(display = "unsupported handshake type, expected pairwise")]
    UnsupportedHandshakeType,
    #[fail(display = "unexpected Install bit for this message")]
    UnexpectedInstall,
    #[fail(display = "expected ACK bit to be set")]
    ExpectedAck,
    #[fail(display = "unexpected MIC bit for this message")]
    UnexpectedMic,
    #[fail(display = "Authenticator must not set Error or Request bits")]
    AuthenticatorMustNotSet,
    #[fail(display = "unexpected Encrypted Key Data bit for this message")]
    UnexpectedEncryption,
    #[fail(display = "SMK Message bit must not be set")]
    UnexpectedSmk,
    #[fail(display = "invalid KeyLength, expected 16")]
    InvalidKeyLength,
    #[fail(display = "nonce must not be zero")]
    InvalidNonce,
    #[fail(display = "RSC must be zero in message 1")]
    InvalidRsc,
    #[fail(display = "expected non-empty Key Data")]
    ExpectedData,
}

/// Checks that couple an incoming frame to the current session (IEEE Std
/// 802.11-2016, 12.7.2 d) and the admissibility predicate of the current
/// handshake state).
#[derive(Debug, Fail, PartialEq)]
pub enum StateViolation {
    #[fail(display = "key replay counter did not advance")]
    ReplayCounterNotAdvanced,
    #[fail(display = "cannot validate MIC, no PTK derived yet")]
    CannotValidateMic,
    #[fail(display = "invalid MIC")]
    InvalidMic,
    #[fail(display = "cannot decrypt key data, no PTK derived yet")]
    CannotDecrypt,
    #[fail(display = "failed to decrypt key data")]
    DecryptionFailed,
    #[fail(display = "message 3 nonce does not match message 1's aNonce")]
    NonceMismatch,
    #[fail(display = "message is unexpected for the current handshake state")]
    UnexpectedMessageForState,
}

/// Checks on the parsed, decrypted contents of a frame's key data.
#[derive(Debug, Fail, PartialEq)]
pub enum SemanticViolation {
    #[fail(display = "message 3 key data did not contain an RSN element")]
    MissingIe,
    #[fail(display = "message 3 key data did not contain a GTK KDE")]
    MissingGtk,
    #[fail(display = "message 3's RSN element differs from the association RSNE")]
    RsnMismatch,
}

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum CryptoError {
    #[fail(display = "passphrase or SSID has an invalid length")]
    InvalidPskInput,
    #[fail(display = "AES Key Unwrap failed, IV mismatch")]
    KeyUnwrapFailed,
}

/// Every frame-processing path returns `Ok` or one of these. See `spec.md`
/// §7 for the taxonomy this mirrors one-to-one.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "malformed key data: {}", _0)]
    Malformed(String),
    #[fail(display = "{}", _0)]
    Integrity(IntegrityViolation),
    #[fail(display = "{}", _0)]
    State(StateViolation),
    #[fail(display = "{}", _0)]
    Semantic(SemanticViolation),
    #[fail(display = "{}", _0)]
    Crypto(CryptoError),
    #[fail(display = "transport error: {}", _0)]
    Transport(eapol::TransportError),
}

impl From<IntegrityViolation> for Error {
    fn from(e: IntegrityViolation) -> Error {
        Error::Integrity(e)
    }
}

impl From<StateViolation> for Error {
    fn from(e: StateViolation) -> Error {
        Error::State(e)
    }
}

impl From<SemanticViolation> for Error {
    fn from(e: SemanticViolation) -> Error {
        Error::Semantic(e)
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Error {
        Error::Crypto(e)
    }
}

impl From<eapol::TransportError> for Error {
    fn from(e: eapol::TransportError) -> Error {
        Error::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_never_includes_hex_looking_secrets() {
        let errors: Vec<Error> = vec![
            IntegrityViolation::InvalidNonce.into(),
            StateViolation::InvalidMic.into(),
            SemanticViolation::RsnMismatch.into(),
            CryptoError::KeyUnwrapFailed.into(),
        ];
        for e in errors {
            let msg = e.to_string();
            let hex_digits = msg.chars().filter(|c| c.is_ascii_hexdigit()).count();
            assert!(hex_digits < msg.len() / 2, "message looks like it leaked key material: {}", msg);
        }
    }
}
