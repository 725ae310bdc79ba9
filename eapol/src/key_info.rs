// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use bitfield::bitfield;

// IEEE Std 802.11-2016, 12.7.2, Figure 12-33
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct KeyInfo(u16);
    impl Debug;
    pub descriptor_version, set_descriptor_version: 2, 0;
    pub key_type, set_key_type: 3;
    // Bits 4-5 reserved.
    pub install, set_install: 6;
    pub ack, set_ack: 7;
    pub mic, set_mic: 8;
    pub secure, set_secure: 9;
    pub error, set_error: 10;
    pub request, set_request: 11;
    pub encrypted_key_data, set_encrypted_key_data: 12;
    pub smk_message, set_smk_message: 13;
    // Bits 14-15 reserved.

    pub value, _: 15, 0;
}

impl Default for KeyInfo {
    fn default() -> KeyInfo {
        KeyInfo(0)
    }
}

impl KeyInfo {
    pub fn from_raw(value: u16) -> KeyInfo {
        KeyInfo(value)
    }
}

/// Which of the two messages a Supplicant can receive this frame represents.
///
/// IEEE Std 802.11-2016 12.7.2 b.7) requires the Authenticator to set the
/// `Secure` bit only on the frame that carries the last key needed to
/// complete the Supplicant's initialization. In the 4-Way Handshake that is
/// always the third message, so the bit alone is enough to tell the two
/// apart; there is no explicit message-number field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageNumber {
    First,
    Third,
}

impl KeyInfo {
    /// IEEE Std 802.11-2016 12.7.2 b.7)
    pub fn inferred_message(&self) -> MessageNumber {
        if self.secure() {
            MessageNumber::Third
        } else {
            MessageNumber::First
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_version_occupies_low_three_bits() {
        let info = KeyInfo(0b0000_0000_0000_0010);
        assert_eq!(info.descriptor_version(), 2);
    }

    #[test]
    fn round_trips_through_value() {
        let mut info = KeyInfo::default();
        info.set_ack(true);
        info.set_mic(true);
        info.set_descriptor_version(2);
        let raw = info.value();
        assert_eq!(KeyInfo(raw).value(), raw);
        assert!(KeyInfo(raw).ack());
        assert!(KeyInfo(raw).mic());
    }

    #[test]
    fn secure_bit_selects_third_message() {
        let mut info = KeyInfo::default();
        assert_eq!(info.inferred_message(), MessageNumber::First);
        info.set_secure(true);
        assert_eq!(info.inferred_message(), MessageNumber::Third);
    }
}
