// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Crypto primitives needed by the 4-Way Handshake: PSK derivation, the IEEE
//! 802.11 PRF, PTK derivation, MIC computation, and RFC 3394 AES Key Wrap.
//!
//! Key material is wrapped in `Secret` so it is overwritten on drop; see
//! IEEE Std 802.11-2016 12.7.1.3 on the lifetime of the PTK's components.

use crypto as rust_crypto;
use rust_crypto::aessafe::{AesSafe128Decryptor, AesSafe128Encryptor};
use rust_crypto::hmac::Hmac;
use rust_crypto::mac::Mac;
use rust_crypto::pbkdf2::pbkdf2;
use rust_crypto::sha1::Sha1;
use rust_crypto::symmetriccipher::{BlockDecryptor, BlockEncryptor};
use rand::os::OsRng;
use rand::Rng;
use std::fmt;
use std::ops::Deref;

use crate::error::{CryptoError, Error};

/// Owned key material that zeroes itself when dropped.
pub struct Secret(Vec<u8>);

impl Secret {
    fn new(bytes: Vec<u8>) -> Secret {
        Secret(bytes)
    }
}

impl Deref for Secret {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = 0;
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Secret(REDACTED, {} bytes)", self.0.len())
    }
}

/// The three keys derived from the PMK and both nonces (IEEE Std
/// 802.11-2016 12.7.1.3).
pub struct Ptk {
    kck: Secret,
    kek: Secret,
    tk: Secret,
}

impl Ptk {
    pub fn kck(&self) -> &[u8] {
        &self.kck
    }

    pub fn kek(&self) -> &[u8] {
        &self.kek
    }

    pub fn tk(&self) -> &[u8] {
        &self.tk
    }
}

impl fmt::Debug for Ptk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ptk").finish()
    }
}

/// IEEE Std 802.11-2016, 12.7.1.2: PSK = PBKDF2-HMAC-SHA1(passphrase, SSID,
/// 4096, 256 bits).
pub fn psk(passphrase: &[u8], ssid: &[u8]) -> Result<Secret, Error> {
    if passphrase.len() < 8 || passphrase.len() > 63 {
        return Err(CryptoError::InvalidPskInput.into());
    }
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(CryptoError::InvalidPskInput.into());
    }

    let mut mac = Hmac::new(Sha1::new(), passphrase);
    let mut output = vec![0u8; 32];
    pbkdf2(&mut mac, ssid, 4096, &mut output);
    Ok(Secret::new(output))
}

/// IEEE Std 802.11-2016, 12.7.1.2: PRF-n(K, A, B) = the first n bits of
/// HMAC-SHA1(K, A || 0x00 || B || i) for i = 0, 1, 2, ... concatenated.
pub fn prf(key: &[u8], label: &str, data: &[u8], bits: usize) -> Vec<u8> {
    const SHA1_OUTPUT_BYTES: usize = 20;
    let bytes_needed = (bits + 7) / 8;
    let mut result = Vec::with_capacity(bytes_needed + SHA1_OUTPUT_BYTES);

    let mut counter: u8 = 0;
    while result.len() < bytes_needed {
        let mut hmac = Hmac::new(Sha1::new(), key);
        hmac.input(label.as_bytes());
        hmac.input(&[0u8]);
        hmac.input(data);
        hmac.input(&[counter]);
        result.extend_from_slice(hmac.result().code());
        counter += 1;
    }
    result.truncate(bytes_needed);
    result
}

/// IEEE Std 802.11-2016, 12.7.1.3: PTK = PRF-384(PMK, "Pairwise key
/// expansion", Min(AA,SPA) || Max(AA,SPA) || Min(ANonce,SNonce) ||
/// Max(ANonce,SNonce)).
pub fn derive_ptk(
    pmk: &[u8],
    sta_addr: &[u8; 6],
    peer_addr: &[u8; 6],
    a_nonce: &[u8; 32],
    s_nonce: &[u8; 32],
) -> Ptk {
    let (min_addr, max_addr) = if sta_addr <= peer_addr {
        (sta_addr, peer_addr)
    } else {
        (peer_addr, sta_addr)
    };
    let (min_nonce, max_nonce) = if a_nonce <= s_nonce {
        (a_nonce, s_nonce)
    } else {
        (s_nonce, a_nonce)
    };

    let mut data = Vec::with_capacity(6 + 6 + 32 + 32);
    data.extend_from_slice(&min_addr[..]);
    data.extend_from_slice(&max_addr[..]);
    data.extend_from_slice(&min_nonce[..]);
    data.extend_from_slice(&max_nonce[..]);

    let raw = prf(pmk, "Pairwise key expansion", &data, 384);
    Ptk {
        kck: Secret::new(raw[0..16].to_vec()),
        kek: Secret::new(raw[16..32].to_vec()),
        tk: Secret::new(raw[32..48].to_vec()),
    }
}

/// IEEE Std 802.11-2016, 12.7.3: a station's nonce is generated from a local
/// random key run through the same PRF construction used for PTK expansion.
pub fn generate_nonce(addr: &[u8; 6]) -> [u8; 32] {
    let mut rng = OsRng::new().expect("failed to access platform RNG");
    let mut random_key = [0u8; 32];
    rng.fill_bytes(&mut random_key);
    let mut random_counter = [0u8; 8];
    rng.fill_bytes(&mut random_counter);

    let mut data = Vec::with_capacity(6 + 8);
    data.extend_from_slice(&addr[..]);
    data.extend_from_slice(&random_counter);

    let raw = prf(&random_key, "Init Counter", &data, 256);
    let mut nonce = [0u8; 32];
    nonce.copy_from_slice(&raw);
    nonce
}

/// IEEE Std 802.11-2016, 12.7.2: MIC = HMAC-SHA1(KCK, frame)[0..16], computed
/// with the frame's MIC field zeroed.
pub fn mic(kck: &[u8], frame_with_zeroed_mic: &[u8]) -> Vec<u8> {
    let mut hmac = Hmac::new(Sha1::new(), kck);
    hmac.input(frame_with_zeroed_mic);
    let mut code = hmac.result().code().to_vec();
    code.truncate(16);
    code
}

/// Constant-time comparison, used so MIC validation does not leak timing
/// information about the expected value.
pub fn fixed_time_eq(a: &[u8], b: &[u8]) -> bool {
    rust_crypto::util::fixed_time_eq(a, b)
}

const KEY_WRAP_IV: [u8; 8] = [0xA6; 8];

fn xor_be_u64(block: &mut [u8; 8], t: u64) {
    let t_bytes = t.to_be_bytes();
    for i in 0..8 {
        block[i] ^= t_bytes[i];
    }
}

/// RFC 3394 AES Key Wrap, used to encrypt the GTK KDE/RSN IE carried in
/// message 3's Key Data field.
pub fn key_wrap(kek: &[u8], plaintext: &[u8]) -> Vec<u8> {
    assert_eq!(plaintext.len() % 8, 0, "key wrap input must be a multiple of 8 bytes");
    let n = plaintext.len() / 8;

    let mut r: Vec<[u8; 8]> = (0..n)
        .map(|i| {
            let mut block = [0u8; 8];
            block.copy_from_slice(&plaintext[i * 8..i * 8 + 8]);
            block
        })
        .collect();
    let mut a = KEY_WRAP_IV;

    let encryptor = AesSafe128Encryptor::new(kek);
    for j in 0..=5u64 {
        for i in 1..=n {
            let mut block = [0u8; 16];
            block[..8].copy_from_slice(&a);
            block[8..].copy_from_slice(&r[i - 1]);
            let mut out = [0u8; 16];
            encryptor.encrypt_block(&block, &mut out);

            a.copy_from_slice(&out[..8]);
            xor_be_u64(&mut a, n as u64 * j + i as u64);
            r[i - 1].copy_from_slice(&out[8..]);
        }
    }

    let mut result = Vec::with_capacity(8 + plaintext.len());
    result.extend_from_slice(&a);
    for block in r {
        result.extend_from_slice(&block);
    }
    result
}

/// RFC 3394 AES Key Unwrap, the inverse of `key_wrap`. Fails if the integrity
/// check value does not match, which indicates either a wrong KEK or a
/// corrupted/tampered ciphertext.
pub fn key_unwrap(kek: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
    if ciphertext.len() < 16 || ciphertext.len() % 8 != 0 {
        return Err(CryptoError::KeyUnwrapFailed.into());
    }
    let n = ciphertext.len() / 8 - 1;

    let mut r: Vec<[u8; 8]> = (1..=n)
        .map(|i| {
            let mut block = [0u8; 8];
            block.copy_from_slice(&ciphertext[i * 8..i * 8 + 8]);
            block
        })
        .collect();
    let mut a = [0u8; 8];
    a.copy_from_slice(&ciphertext[0..8]);

    let decryptor = AesSafe128Decryptor::new(kek);
    for j in (0..=5u64).rev() {
        for i in (1..=n).rev() {
            let mut t = a;
            xor_be_u64(&mut t, n as u64 * j + i as u64);

            let mut block = [0u8; 16];
            block[..8].copy_from_slice(&t);
            block[8..].copy_from_slice(&r[i - 1]);
            let mut out = [0u8; 16];
            decryptor.decrypt_block(&block, &mut out);

            a.copy_from_slice(&out[..8]);
            r[i - 1].copy_from_slice(&out[8..]);
        }
    }

    if a != KEY_WRAP_IV {
        return Err(CryptoError::KeyUnwrapFailed.into());
    }
    Ok(r.into_iter().flat_map(|block| block.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known PSK known-answer test: SSID "IEEE", passphrase "password".
    #[test]
    fn psk_matches_known_answer() {
        let derived = psk(b"password", b"IEEE").expect("valid PSK input");
        let expected =
            hex::decode("f42c6fc52df0ebef9ebb4b90b38a5f902e83fe1b135a70e23aed762e9710a12e")
                .expect("valid test hex");
        assert_eq!(&derived[..], &expected[..]);
    }

    #[test]
    fn psk_rejects_short_passphrase() {
        assert!(psk(b"short", b"IEEE").is_err());
    }

    #[test]
    fn psk_rejects_empty_ssid() {
        assert!(psk(b"validpassphrase", b"").is_err());
    }

    #[test]
    fn prf_output_length_matches_requested_bits() {
        let out = prf(b"some key material", "Pairwise key expansion", b"context", 384);
        assert_eq!(out.len(), 48);
    }

    #[test]
    fn derive_ptk_is_order_independent_in_addresses_and_nonces() {
        let pmk = vec![0x11u8; 32];
        let sta = [1, 2, 3, 4, 5, 6];
        let peer = [6, 5, 4, 3, 2, 1];
        let a_nonce = [0xAAu8; 32];
        let s_nonce = [0xBBu8; 32];

        let ptk1 = derive_ptk(&pmk, &sta, &peer, &a_nonce, &s_nonce);
        let ptk2 = derive_ptk(&pmk, &peer, &sta, &s_nonce, &a_nonce);
        assert_eq!(ptk1.kck(), ptk2.kck());
        assert_eq!(ptk1.kek(), ptk2.kek());
        assert_eq!(ptk1.tk(), ptk2.tk());
    }

    #[test]
    fn key_wrap_round_trips() {
        let kek = [0x22u8; 16];
        let plaintext = b"0123456789ABCDEF".to_vec();
        let wrapped = key_wrap(&kek, &plaintext);
        let unwrapped = key_unwrap(&kek, &wrapped).expect("round trip should succeed");
        assert_eq!(unwrapped, plaintext);
    }

    // RFC 3394 §4.1, 128-bit KEK wrapping 128 bits of key data.
    #[test]
    fn key_wrap_matches_rfc3394_test_vector() {
        let kek = hex::decode("000102030405060708090A0B0C0D0E0F").unwrap();
        let plaintext = hex::decode("00112233445566778899AABBCCDDEEFF").unwrap();
        let expected_ciphertext = hex::decode(
            "1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5",
        )
        .unwrap();
        let wrapped = key_wrap(&kek, &plaintext);
        assert_eq!(wrapped, expected_ciphertext);
        let unwrapped = key_unwrap(&kek, &wrapped).expect("round trip should succeed");
        assert_eq!(unwrapped, plaintext);
    }

    #[test]
    fn key_unwrap_rejects_tampered_ciphertext() {
        let kek = [0x33u8; 16];
        let plaintext = vec![0u8; 16];
        let mut wrapped = key_wrap(&kek, &plaintext);
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;
        assert!(key_unwrap(&kek, &wrapped).is_err());
    }

    #[test]
    fn fixed_time_eq_distinguishes_mismatches() {
        assert!(fixed_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!fixed_time_eq(&[1, 2, 3], &[1, 2, 4]));
    }
}
