//! LoRaWAN cryptographic operations
//!
//! This module provides the LoRaWAN 1.0.x security primitives:
//! - Message Integrity Code (MIC) computation with AES-CMAC
//! - FRMPayload encryption/decryption (AES-128 in counter mode)
//! - Join accept decryption
//! - Session key derivation

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use cmac::{Cmac, Mac as DigestMac};
use heapless::Vec;

use crate::config::device::{AESKey, DevAddr};

/// MIC size in bytes
pub const MIC_SIZE: usize = 4;

/// Largest PHY payload handled by the stack
pub const MAX_PAYLOAD_SIZE: usize = 256;

/// Block size for AES-128
const BLOCK_SIZE: usize = 16;

/// Direction identifiers for cryptographic operations
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Uplink (device to network)
    Up = 0,
    /// Downlink (network to device)
    Down = 1,
}

fn cipher(key: &AESKey) -> Aes128 {
    Aes128::new(GenericArray::from_slice(key.as_bytes()))
}

fn cmac(key: &AESKey, parts: &[&[u8]]) -> [u8; MIC_SIZE] {
    let mut mac = <Cmac<Aes128> as DigestMac>::new(GenericArray::from_slice(key.as_bytes()));
    for part in parts {
        mac.update(part);
    }
    let tag = mac.finalize().into_bytes();
    let mut mic = [0u8; MIC_SIZE];
    mic.copy_from_slice(&tag[..MIC_SIZE]);
    mic
}

/// Compute the MIC of a data frame
///
/// # Arguments
/// * `key` - Network session key
/// * `data` - MHDR through FRMPayload
/// * `dev_addr` - Device address
/// * `fcnt` - Full 32-bit frame counter
/// * `dir` - Message direction
pub fn compute_mic(
    key: &AESKey,
    data: &[u8],
    dev_addr: DevAddr,
    fcnt: u32,
    dir: Direction,
) -> [u8; MIC_SIZE] {
    let mut b0 = [0u8; BLOCK_SIZE];
    b0[0] = 0x49;
    b0[5] = dir as u8;
    b0[6..10].copy_from_slice(dev_addr.as_bytes());
    b0[10..14].copy_from_slice(&fcnt.to_le_bytes());
    b0[15] = data.len() as u8;
    cmac(key, &[&b0, data])
}

/// Compute the MIC of a join request or a decrypted join accept
pub fn compute_join_mic(key: &AESKey, data: &[u8]) -> [u8; MIC_SIZE] {
    cmac(key, &[data])
}

/// Encrypt or decrypt an FRMPayload (the operation is symmetric)
///
/// # Arguments
/// * `key` - AppSKey, or NwkSKey for port 0
/// * `dev_addr` - Device address
/// * `fcnt` - Full 32-bit frame counter
/// * `dir` - Message direction
/// * `payload` - Data to encrypt/decrypt
pub fn encrypt_payload(
    key: &AESKey,
    dev_addr: DevAddr,
    fcnt: u32,
    dir: Direction,
    payload: &[u8],
) -> Vec<u8, MAX_PAYLOAD_SIZE> {
    let cipher = cipher(key);
    let mut result = Vec::new();

    for (i, chunk) in payload.chunks(BLOCK_SIZE).enumerate() {
        let mut a = [0u8; BLOCK_SIZE];
        a[0] = 0x01;
        a[5] = dir as u8;
        a[6..10].copy_from_slice(dev_addr.as_bytes());
        a[10..14].copy_from_slice(&fcnt.to_le_bytes());
        a[15] = (i + 1) as u8;

        let mut s = GenericArray::from(a);
        cipher.encrypt_block(&mut s);

        for (byte, key_byte) in chunk.iter().zip(s.iter()) {
            // Capacity exceeds any legal payload; excess bytes are dropped
            let _ = result.push(byte ^ key_byte);
        }
    }

    result
}

/// Decrypt a join accept (MHDR excluded)
///
/// The network encrypts with AES decrypt, so the device applies AES encrypt.
pub fn decrypt_join_accept(key: &AESKey, data: &[u8]) -> Vec<u8, 32> {
    let cipher = cipher(key);
    let mut result = Vec::new();

    for chunk in data.chunks(BLOCK_SIZE) {
        let mut block = GenericArray::from([0u8; BLOCK_SIZE]);
        block[..chunk.len()].copy_from_slice(chunk);
        cipher.encrypt_block(&mut block);
        for &b in &block[..chunk.len()] {
            let _ = result.push(b);
        }
    }

    result
}

/// Derive network and application session keys from a join accept
///
/// # Arguments
/// * `app_key` - Application key
/// * `app_nonce` - Application nonce from join accept
/// * `net_id` - Network ID from join accept
/// * `dev_nonce` - Device nonce from join request
pub fn derive_session_keys(
    app_key: &AESKey,
    app_nonce: &[u8; 3],
    net_id: &[u8; 3],
    dev_nonce: u16,
) -> (AESKey, AESKey) {
    let cipher = cipher(app_key);

    let derive = |prefix: u8| {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = prefix;
        block[1..4].copy_from_slice(app_nonce);
        block[4..7].copy_from_slice(net_id);
        block[7..9].copy_from_slice(&dev_nonce.to_le_bytes());
        let mut block = GenericArray::from(block);
        cipher.encrypt_block(&mut block);
        let mut key = [0u8; BLOCK_SIZE];
        key.copy_from_slice(&block);
        AESKey::new(key)
    };

    (derive(0x01), derive(0x02))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_encryption_is_symmetric() {
        let key = AESKey::new([0x01; 16]);
        let dev_addr = DevAddr::new([0x01, 0x02, 0x03, 0x04]);
        let payload = b"Hello LoRaWAN, more than one block";

        let encrypted = encrypt_payload(&key, dev_addr, 1, Direction::Up, payload);
        assert_eq!(encrypted.len(), payload.len());
        assert_ne!(&encrypted[..], &payload[..]);

        let decrypted = encrypt_payload(&key, dev_addr, 1, Direction::Up, &encrypted);
        assert_eq!(&decrypted[..], &payload[..]);
    }

    #[test]
    fn test_mic_depends_on_counter_and_direction() {
        let key = AESKey::new([0x01; 16]);
        let dev_addr = DevAddr::new([0x01, 0x02, 0x03, 0x04]);
        let data = b"Test Data";

        let up1 = compute_mic(&key, data, dev_addr, 1, Direction::Up);
        let up2 = compute_mic(&key, data, dev_addr, 2, Direction::Up);
        let down1 = compute_mic(&key, data, dev_addr, 1, Direction::Down);
        assert_ne!(up1, up2);
        assert_ne!(up1, down1);
        assert_eq!(up1, compute_mic(&key, data, dev_addr, 1, Direction::Up));
    }

    #[test]
    fn test_session_keys_differ() {
        let app_key = AESKey::new([0x01; 16]);
        let (nwk_skey, app_skey) =
            derive_session_keys(&app_key, &[0x01, 0x02, 0x03], &[0x04, 0x05, 0x06], 0x0708);
        assert_ne!(nwk_skey.as_bytes(), app_skey.as_bytes());
        assert_ne!(nwk_skey.as_bytes(), app_key.as_bytes());
    }
}
