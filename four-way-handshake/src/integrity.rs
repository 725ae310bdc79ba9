// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Stateless checks a single EAPOL-Key frame must pass to be considered a
//! well-formed message 1 or message 3, independent of any session state.
//! Grounded in the original Go implementation's `isIntegrous`.

use eapol::{KeyFrame, MessageNumber};

use crate::error::IntegrityViolation as E;

/// Runs every check in IEEE Std 802.11-2016 12.7.2's table for the message
/// implied by the frame's `Secure` bit, returning that message number on
/// success. Checks run in a fixed order; the first failing check is
/// reported.
pub fn validate(frame: &KeyFrame) -> Result<MessageNumber, E> {
    let msg = frame.info.inferred_message();
    let is_first = msg == MessageNumber::First;

    if frame.info.descriptor_version() != 2 {
        return Err(E::UnsupportedDescriptorVersion);
    }
    if !frame.info.key_type() {
        return Err(E::UnsupportedHandshakeType);
    }
    if frame.info.install() == is_first {
        return Err(E::UnexpectedInstall);
    }
    if !frame.info.ack() {
        return Err(E::ExpectedAck);
    }
    if frame.info.mic() == is_first {
        return Err(E::UnexpectedMic);
    }
    if frame.info.error() || frame.info.request() {
        return Err(E::AuthenticatorMustNotSet);
    }
    if frame.info.encrypted_key_data() == is_first {
        return Err(E::UnexpectedEncryption);
    }
    if frame.info.smk_message() {
        return Err(E::UnexpectedSmk);
    }
    if frame.length != 16 {
        return Err(E::InvalidKeyLength);
    }
    if frame.nonce == [0u8; 32] {
        return Err(E::InvalidNonce);
    }
    if is_first && frame.rsc != [0u8; 8] {
        return Err(E::InvalidRsc);
    }
    if !is_first && frame.data.is_empty() {
        return Err(E::ExpectedData);
    }

    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use eapol::KeyInfo;

    fn base_msg1() -> KeyFrame {
        let mut info = KeyInfo::default();
        info.set_descriptor_version(2);
        info.set_key_type(true);
        info.set_ack(true);

        KeyFrame {
            version: 2,
            packet_type: 3,
            descriptor_type: eapol::DESCRIPTOR_TYPE_IEEE802DOT11,
            info,
            length: 16,
            replay_counter: 1,
            nonce: [0x11u8; 32],
            iv: [0u8; 16],
            rsc: [0u8; 8],
            mic: Bytes::from(vec![0u8; 16]),
            data: Bytes::new(),
        }
    }

    fn base_msg3() -> KeyFrame {
        let mut frame = base_msg1();
        frame.info.set_ack(true);
        frame.info.set_install(true);
        frame.info.set_mic(true);
        frame.info.set_secure(true);
        frame.info.set_encrypted_key_data(true);
        frame.replay_counter = 2;
        frame.data = Bytes::from(vec![1, 2, 3, 4]);
        frame
    }

    #[test]
    fn accepts_well_formed_message1() {
        let frame = base_msg1();
        assert_eq!(validate(&frame).unwrap(), MessageNumber::First);
    }

    #[test]
    fn accepts_well_formed_message3() {
        let frame = base_msg3();
        assert_eq!(validate(&frame).unwrap(), MessageNumber::Third);
    }

    #[test]
    fn rejects_unsupported_descriptor_version() {
        let mut frame = base_msg1();
        frame.info.set_descriptor_version(1);
        assert_eq!(validate(&frame).unwrap_err(), E::UnsupportedDescriptorVersion);
    }

    #[test]
    fn rejects_group_handshake_type() {
        let mut frame = base_msg1();
        frame.info.set_key_type(false);
        assert_eq!(validate(&frame).unwrap_err(), E::UnsupportedHandshakeType);
    }

    #[test]
    fn rejects_message1_with_mic_bit_set() {
        let mut frame = base_msg1();
        frame.info.set_mic(true);
        assert_eq!(validate(&frame).unwrap_err(), E::UnexpectedMic);
    }

    #[test]
    fn rejects_message1_without_ack() {
        let mut frame = base_msg1();
        frame.info.set_ack(false);
        assert_eq!(validate(&frame).unwrap_err(), E::ExpectedAck);
    }

    #[test]
    fn rejects_error_bit() {
        let mut frame = base_msg1();
        frame.info.set_error(true);
        assert_eq!(validate(&frame).unwrap_err(), E::AuthenticatorMustNotSet);
    }

    #[test]
    fn rejects_zero_nonce() {
        let mut frame = base_msg1();
        frame.nonce = [0u8; 32];
        assert_eq!(validate(&frame).unwrap_err(), E::InvalidNonce);
    }

    #[test]
    fn rejects_message1_with_nonzero_rsc() {
        let mut frame = base_msg1();
        frame.rsc = [1u8; 8];
        assert_eq!(validate(&frame).unwrap_err(), E::InvalidRsc);
    }

    #[test]
    fn rejects_message3_without_install() {
        let mut frame = base_msg3();
        frame.info.set_install(false);
        assert_eq!(validate(&frame).unwrap_err(), E::UnexpectedInstall);
    }

    #[test]
    fn rejects_message3_with_empty_data() {
        let mut frame = base_msg3();
        frame.data = Bytes::new();
        assert_eq!(validate(&frame).unwrap_err(), E::ExpectedData);
    }
}
