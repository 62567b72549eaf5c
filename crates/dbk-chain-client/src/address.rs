//! Bech32 address codec and credential extraction.
//!
//! Shelley-style payload layout: one header byte (address type in the high
//! nibble, network id in the low nibble) followed by a 28-byte payment
//! credential hash and, for base addresses, a 28-byte stake credential
//! hash. Reward addresses carry the stake hash directly after the header.

use thiserror::Error;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

/// Length of a credential hash in bytes (Blake2b-224).
pub const CREDENTIAL_HASH_LEN: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address has no separator")]
    MissingSeparator,
    #[error("address mixes upper and lower case")]
    MixedCase,
    #[error("address contains an invalid character")]
    InvalidCharacter,
    #[error("address checksum does not verify")]
    BadChecksum,
    #[error("address payload is too short")]
    TooShort,
    #[error("address payload has invalid bit padding")]
    InvalidPadding,
    #[error("address payload is empty")]
    Empty,
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &v in values {
        let b = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(v);
        for (i, r#gen) in GENERATOR.iter().enumerate() {
            if (b >> i) & 1 == 1 {
                chk ^= *r#gen;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(hrp.len() * 2 + 1);
    for b in hrp.bytes() {
        out.push(b >> 5);
    }
    out.push(0);
    for b in hrp.bytes() {
        out.push(b & 0x1f);
    }
    out
}

/// Regroup bits between 8-bit and 5-bit words.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, AddressError> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::new();
    let max: u32 = (1 << to) - 1;

    for &value in data {
        if u32::from(value) >> from != 0 {
            return Err(AddressError::InvalidCharacter);
        }
        acc = (acc << from) | u32::from(value);
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max) != 0 {
        return Err(AddressError::InvalidPadding);
    }

    Ok(out)
}

/// Decode a bech32 string into its human-readable part and 8-bit payload.
/// Cardano addresses exceed the BIP-173 length cap, so no cap is enforced.
pub fn decode(s: &str) -> Result<(String, Vec<u8>), AddressError> {
    let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }
    let s = s.to_ascii_lowercase();

    let sep = s.rfind('1').ok_or(AddressError::MissingSeparator)?;
    if sep == 0 || sep + 7 > s.len() {
        return Err(AddressError::TooShort);
    }
    let hrp = &s[..sep];
    let data_part = &s[sep + 1..];

    let mut data = Vec::with_capacity(data_part.len());
    for c in data_part.bytes() {
        let idx = CHARSET
            .iter()
            .position(|&x| x == c)
            .ok_or(AddressError::InvalidCharacter)?;
        data.push(idx as u8);
    }

    let mut check = hrp_expand(hrp);
    check.extend_from_slice(&data);
    if polymod(&check) != 1 {
        return Err(AddressError::BadChecksum);
    }

    let payload = convert_bits(&data[..data.len() - 6], 5, 8, false)?;
    if payload.is_empty() {
        return Err(AddressError::Empty);
    }
    Ok((hrp.to_owned(), payload))
}

/// Encode an 8-bit payload under `hrp`.
pub fn encode(hrp: &str, payload: &[u8]) -> Result<String, AddressError> {
    if payload.is_empty() {
        return Err(AddressError::Empty);
    }
    let data = convert_bits(payload, 8, 5, true)?;

    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    values.extend_from_slice(&[0; 6]);
    let plm = polymod(&values) ^ 1;

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    out.push_str(hrp);
    out.push('1');
    for d in data {
        out.push(CHARSET[d as usize] as char);
    }
    for i in 0..6 {
        let idx = ((plm >> (5 * (5 - i))) & 0x1f) as usize;
        out.push(CHARSET[idx] as char);
    }
    Ok(out)
}

/// Hex-encoded payment credential hash of a spending address.
pub fn payment_key_hash(address: &str) -> Result<String, AddressError> {
    let (_, payload) = decode(address)?;
    if payload.len() < 1 + CREDENTIAL_HASH_LEN {
        return Err(AddressError::TooShort);
    }
    Ok(hex::encode(&payload[1..1 + CREDENTIAL_HASH_LEN]))
}

/// Hex-encoded stake credential hash of a reward address.
pub fn stake_key_hash(stake_address: &str) -> Result<String, AddressError> {
    let (_, payload) = decode(stake_address)?;
    if payload.len() < 1 + CREDENTIAL_HASH_LEN {
        return Err(AddressError::TooShort);
    }
    Ok(hex::encode(&payload[1..1 + CREDENTIAL_HASH_LEN]))
}

/// The reward address embedded in a base spending address, when the
/// address carries a stake credential.
pub fn stake_address_of(address: &str) -> Result<Option<String>, AddressError> {
    let (hrp, payload) = decode(address)?;
    if payload.len() < 1 + 2 * CREDENTIAL_HASH_LEN {
        return Ok(None);
    }
    let network = payload[0] & 0x0f;
    let mut reward = Vec::with_capacity(1 + CREDENTIAL_HASH_LEN);
    reward.push(0xe0 | network);
    reward.extend_from_slice(&payload[1 + CREDENTIAL_HASH_LEN..1 + 2 * CREDENTIAL_HASH_LEN]);
    let stake_hrp = if hrp.ends_with("_test") {
        "stake_test"
    } else {
        "stake"
    };
    Ok(Some(encode(stake_hrp, &reward)?))
}

/// Bech32 rendering of a raw spending-address payload (header byte
/// included), picking the hrp from the network bit.
pub fn encode_payment_address(payload: &[u8]) -> Result<String, AddressError> {
    if payload.is_empty() {
        return Err(AddressError::Empty);
    }
    let hrp = if payload[0] & 0x01 == 1 {
        "addr"
    } else {
        "addr_test"
    };
    encode(hrp, payload)
}
