// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/core/address.rs
// Version: 1.2.0
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file decodes the payout address into the output script paid by every
// coinbase, located in the core subdirectory. Segwit addresses go through
// bech32/bech32m, legacy ones through base58check; both checksums are
// verified.
//
// Tree Location:
// - src/core/address.rs (address decoding)
// - Depends on: crate::core::codec, crate::core::error, log

use crate::core::codec::sha256d;
use crate::core::error::AddressError;
use log::error;

const LOG_TARGET: &str = "solo_pool::core::address";

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const BECH32_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BECH32_CONST: u32 = 1;
const BECH32M_CONST: u32 = 0x2bc8_30a3;
const SEGWIT_HRPS: [&str; 3] = ["bc", "tb", "bcrt"];

/// Provably unspendable script used by the lenient fallback.
pub const OP_RETURN_SCRIPT: [u8; 1] = [0x6a];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
}

impl ScriptType {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptType::P2pkh => "P2PKH",
            ScriptType::P2sh => "P2SH",
            ScriptType::P2wpkh => "P2WPKH",
            ScriptType::P2wsh => "P2WSH",
            ScriptType::P2tr => "P2TR",
        }
    }
}

/// A decoded payout address and the output script that pays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutScript {
    pub address: String,
    pub script_type: ScriptType,
    pub script: Vec<u8>,
}

impl PayoutScript {
    pub fn script_hex(&self) -> String {
        hex::encode(&self.script)
    }
}

/// Decodes `address` into its output script, failing on any malformed input.
pub fn decode_address(address: &str) -> Result<PayoutScript, AddressError> {
    let address = address.trim();
    let lower = address.to_ascii_lowercase();
    let is_segwit = SEGWIT_HRPS
        .iter()
        .any(|hrp| lower.starts_with(&format!("{hrp}1")));

    let (script_type, script) = if is_segwit {
        let (version, program) = bech32_decode(address)?;
        witness_script(version, &program)?
    } else {
        let (version, hash) = base58check_decode(address)?;
        legacy_script(version, &hash)?
    };

    Ok(PayoutScript {
        address: address.to_string(),
        script_type,
        script,
    })
}

/// Lenient form of [`decode_address`]: an undecodable address yields an
/// `OP_RETURN` script. Anything paid to that script is destroyed, so this path
/// is logged as an error every time it is taken.
pub fn address_to_script(address: &str) -> Vec<u8> {
    match decode_address(address) {
        Ok(payout) => payout.script,
        Err(e) => {
            error!(target: LOG_TARGET,
                "🔥 Could not decode address {:?} ({}); falling back to OP_RETURN, block rewards WILL BE BURNED",
                address, e
            );
            OP_RETURN_SCRIPT.to_vec()
        }
    }
}

fn witness_script(version: u8, program: &[u8]) -> Result<(ScriptType, Vec<u8>), AddressError> {
    let script_type = match (version, program.len()) {
        (0, 20) => ScriptType::P2wpkh,
        (0, 32) => ScriptType::P2wsh,
        (1, 32) => ScriptType::P2tr,
        (0 | 1, len) => return Err(AddressError::InvalidLength(len)),
        (v, _) => return Err(AddressError::UnsupportedWitnessVersion(v)),
    };
    let opcode = if version == 0 { 0x00 } else { 0x50 + version };
    let mut script = Vec::with_capacity(program.len() + 2);
    script.push(opcode);
    script.push(program.len() as u8);
    script.extend_from_slice(program);
    Ok((script_type, script))
}

fn legacy_script(version: u8, hash: &[u8; 20]) -> Result<(ScriptType, Vec<u8>), AddressError> {
    match version {
        // mainnet 1..., testnet m/n...
        0x00 | 0x6f => {
            let mut script = vec![0x76, 0xa9, 0x14];
            script.extend_from_slice(hash);
            script.extend_from_slice(&[0x88, 0xac]);
            Ok((ScriptType::P2pkh, script))
        }
        // mainnet 3..., testnet 2...
        0x05 | 0xc4 => {
            let mut script = vec![0xa9, 0x14];
            script.extend_from_slice(hash);
            script.push(0x87);
            Ok((ScriptType::P2sh, script))
        }
        v => Err(AddressError::UnknownVersion(v)),
    }
}

/// Decodes a base58check address into its version byte and 20-byte hash.
pub fn base58check_decode(address: &str) -> Result<(u8, [u8; 20]), AddressError> {
    // big-endian accumulator, multiply-add per digit
    let mut bytes: Vec<u8> = Vec::with_capacity(25);
    for c in address.chars() {
        let digit = BASE58_ALPHABET
            .iter()
            .position(|&a| a as char == c)
            .ok_or(AddressError::InvalidCharacter(c))? as u32;
        let mut carry = digit;
        for byte in bytes.iter_mut().rev() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let leading_ones = address.chars().take_while(|&c| c == '1').count();
    let mut decoded = vec![0u8; leading_ones];
    decoded.extend_from_slice(&bytes);

    if decoded.len() != 25 {
        return Err(AddressError::InvalidLength(decoded.len()));
    }
    let (payload, checksum) = decoded.split_at(21);
    if sha256d(payload)[..4] != *checksum {
        return Err(AddressError::BadChecksum);
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok((payload[0], hash))
}

/// Decodes a segwit address into its witness version and program.
///
/// Version 0 must carry a bech32 checksum, later versions bech32m.
pub fn bech32_decode(address: &str) -> Result<(u8, Vec<u8>), AddressError> {
    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }
    let lower = address.to_ascii_lowercase();
    if lower.len() > 90 {
        return Err(AddressError::InvalidLength(lower.len()));
    }
    let sep = lower.rfind('1').ok_or(AddressError::UnknownFormat)?;
    let (hrp, data_part) = (&lower[..sep], &lower[sep + 1..]);
    if !SEGWIT_HRPS.contains(&hrp) {
        return Err(AddressError::UnknownHrp(hrp.to_string()));
    }
    if data_part.len() < 7 {
        return Err(AddressError::InvalidLength(data_part.len()));
    }

    let values = data_part
        .chars()
        .map(|c| {
            BECH32_CHARSET
                .iter()
                .position(|&b| b as char == c)
                .map(|p| p as u8)
                .ok_or(AddressError::InvalidCharacter(c))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let mut check = hrp_expand(hrp);
    check.extend_from_slice(&values);
    let constant = polymod(&check);

    let version = values[0];
    let expected = if version == 0 { BECH32_CONST } else { BECH32M_CONST };
    if constant != expected {
        return Err(AddressError::BadChecksum);
    }
    if version > 16 {
        return Err(AddressError::UnsupportedWitnessVersion(version));
    }

    let program = convert_5_to_8(&values[1..values.len() - 6])?;
    if !(2..=40).contains(&program.len()) {
        return Err(AddressError::InvalidLength(program.len()));
    }
    Ok((version, program))
}

fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ v as u32;
        for (i, g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut out: Vec<u8> = hrp.bytes().map(|b| b >> 5).collect();
    out.push(0);
    out.extend(hrp.bytes().map(|b| b & 0x1f));
    out
}

/// Repacks 5-bit groups into bytes; leftover padding must be short and zero.
fn convert_5_to_8(data: &[u8]) -> Result<Vec<u8>, AddressError> {
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    for &v in data {
        acc = (acc << 5) | v as u32;
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    if bits >= 5 || (acc << (8 - bits)) & 0xff != 0 {
        return Err(AddressError::InvalidLength(data.len()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2wpkh() {
        let payout = decode_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq").unwrap();
        assert_eq!(payout.script_type, ScriptType::P2wpkh);
        assert_eq!(payout.script.len(), 22);
        assert!(payout.script_hex().starts_with("0014"));
    }

    #[test]
    fn test_p2wpkh_uppercase() {
        let lower = decode_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq").unwrap();
        let upper = decode_address("BC1QAR0SRRR7XFKVY5L643LYDNW9RE59GTZZWF5MDQ").unwrap();
        assert_eq!(lower.script, upper.script);
    }

    #[test]
    fn test_p2tr() {
        let payout =
            decode_address("bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr").unwrap();
        assert_eq!(payout.script_type, ScriptType::P2tr);
        assert_eq!(payout.script.len(), 34);
        assert_eq!(&payout.script[..2], &[0x51, 0x20]);
    }

    #[test]
    fn test_p2pkh() {
        let payout = decode_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2").unwrap();
        assert_eq!(payout.script_type, ScriptType::P2pkh);
        assert_eq!(payout.script.len(), 25);
        assert!(payout.script_hex().starts_with("76a914"));
        assert!(payout.script_hex().ends_with("88ac"));
    }

    #[test]
    fn test_p2sh() {
        let payout = decode_address("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy").unwrap();
        assert_eq!(payout.script_type, ScriptType::P2sh);
        assert_eq!(payout.script.len(), 23);
        assert!(payout.script_hex().starts_with("a914"));
        assert!(payout.script_hex().ends_with("87"));
    }

    #[test]
    fn test_testnet_p2wpkh() {
        let payout = decode_address("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx").unwrap();
        assert_eq!(payout.script_type, ScriptType::P2wpkh);
        assert_eq!(payout.script_hex(), "0014751e76e8199196d454941c45d1b3a323f1433bd6");
    }

    #[test]
    fn test_bad_checksums_rejected() {
        assert_eq!(
            decode_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN3"),
            Err(AddressError::BadChecksum)
        );
        assert_eq!(
            decode_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdp"),
            Err(AddressError::BadChecksum)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode_address("").is_err());
        assert!(decode_address("not-an-address").is_err());
        assert!(decode_address("bc1qOOOO").is_err());
    }

    #[test]
    fn test_fallback_only_for_undecodable() {
        assert_eq!(address_to_script("garbage"), OP_RETURN_SCRIPT.to_vec());
        let good = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";
        assert_ne!(address_to_script(good), OP_RETURN_SCRIPT.to_vec());
    }

    #[test]
    fn test_address_to_script_is_idempotent() {
        for address in [
            "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq",
            "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2",
            "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy",
        ] {
            assert_eq!(address_to_script(address), address_to_script(address));
        }
    }
}

// Changelog:
// - v1.2.0 (2026-10-17): Added bech32m, P2WSH and testnet/regtest prefixes.
// - v1.1.0 (2026-10-17): Verify bech32 and base58check checksums.
// - v1.0.0 (2026-10-17): Initial payout address decoding.
