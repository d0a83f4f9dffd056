//! # ABI Codec
//!
//! Minimal Solidity ABI encoding for the handful of types the diamond core
//! puts on the wire: the `diamondCut` argument tuple, custom-error payloads
//! and event data.
//!
//! Encoding follows the standard head/tail layout: static values are inlined
//! as 32-byte words, dynamic values are referenced by an offset relative to
//! the start of the enclosing tuple.

use crate::domain::entities::{FacetCut, FacetCutAction};
use crate::domain::value_objects::{Address, Bytes, Selector, U256};
use crate::errors::AbiError;

/// Size of one ABI word.
pub const WORD: usize = 32;

// =============================================================================
// TYPES
// =============================================================================

/// A decoded or to-be-encoded ABI value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `address`
    Address(Address),
    /// `uintN`
    Uint(U256),
    /// `bytesN` (N <= 32), left-aligned.
    FixedBytes(Vec<u8>),
    /// `bytes` / `string`
    Bytes(Vec<u8>),
    /// `T[]`
    Array(Vec<Token>),
    /// `(T1, T2, ...)`
    Tuple(Vec<Token>),
}

/// The shape of an ABI value, used to drive decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// `address`
    Address,
    /// `uintN`, with N in bits.
    Uint(usize),
    /// `bytesN`, with N in bytes.
    FixedBytes(usize),
    /// `bytes`
    Bytes,
    /// `T[]`
    Array(Box<ParamType>),
    /// `(T1, T2, ...)`
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Returns true if values of this type live in the tail section.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes | Self::Array(_) => true,
            Self::Tuple(items) => items.iter().any(Self::is_dynamic),
            _ => false,
        }
    }

    /// Size of this type in the head section.
    fn head_size(&self) -> usize {
        match self {
            Self::Tuple(items) if !self.is_dynamic() => items.iter().map(Self::head_size).sum(),
            _ => WORD,
        }
    }
}

impl Token {
    /// Returns true if this value lives in the tail section.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Bytes(_) | Self::Array(_) => true,
            Self::Tuple(items) => items.iter().any(Self::is_dynamic),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            Self::Tuple(items) if !self.is_dynamic() => items.iter().map(Self::head_size).sum(),
            _ => WORD,
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a list of values as the ABI tuple of their types.
#[must_use]
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    encode_sequence(tokens)
}

fn encode_sequence(tokens: &[Token]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(Token::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(address) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(address.as_bytes());
            word.to_vec()
        }
        Token::Uint(value) => {
            let mut word = [0u8; WORD];
            value.to_big_endian(&mut word);
            word.to_vec()
        }
        Token::FixedBytes(bytes) => {
            let mut word = [0u8; WORD];
            let n = bytes.len().min(WORD);
            word[..n].copy_from_slice(&bytes[..n]);
            word.to_vec()
        }
        Token::Bytes(bytes) => {
            let mut out = usize_word(bytes.len()).to_vec();
            out.extend_from_slice(bytes);
            out.resize(WORD + padded_len(bytes.len()), 0);
            out
        }
        Token::Array(items) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_sequence(items));
            out
        }
        Token::Tuple(items) => encode_sequence(items),
    }
}

fn usize_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes `data` as the ABI tuple of `types`.
///
/// # Errors
///
/// Returns an [`AbiError`] if the data is truncated, an offset points
/// outside the buffer, or a value does not fit its declared type.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_sequence(types, data, 0)
}

fn decode_sequence(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, AbiError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut cursor = base;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            let at = base
                .checked_add(offset)
                .ok_or(AbiError::OffsetOverflow { offset: cursor })?;
            tokens.push(decode_param(ty, data, at)?);
            cursor += WORD;
        } else {
            tokens.push(decode_param(ty, data, cursor)?);
            cursor += ty.head_size();
        }
    }

    Ok(tokens)
}

fn decode_param(ty: &ParamType, data: &[u8], at: usize) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            let word = read_word(data, at)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::DirtyPadding { offset: at });
            }
            Ok(Token::Address(Address::from_slice(&word[12..]).unwrap_or_default()))
        }
        ParamType::Uint(bits) => {
            let value = U256::from_big_endian(read_word(data, at)?);
            if *bits < 256 && (value >> *bits) != U256::zero() {
                return Err(AbiError::ValueOutOfRange { offset: at, bits: *bits });
            }
            Ok(Token::Uint(value))
        }
        ParamType::FixedBytes(len) => {
            let word = read_word(data, at)?;
            if word[*len..].iter().any(|b| *b != 0) {
                return Err(AbiError::DirtyPadding { offset: at });
            }
            Ok(Token::FixedBytes(word[..*len].to_vec()))
        }
        ParamType::Bytes => {
            let len = read_usize(data, at)?;
            let start = at + WORD;
            let end = start
                .checked_add(len)
                .ok_or(AbiError::OffsetOverflow { offset: at })?;
            let bytes = data.get(start..end).ok_or(AbiError::OutOfBounds {
                offset: start,
                len: data.len(),
            })?;
            Ok(Token::Bytes(bytes.to_vec()))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, at)?;
            // Every element occupies at least one head word.
            let remaining = data.len().saturating_sub(at + WORD);
            if len > remaining / WORD {
                return Err(AbiError::OutOfBounds {
                    offset: at,
                    len: data.len(),
                });
            }
            let types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_sequence(&types, data, at + WORD)?))
        }
        ParamType::Tuple(items) => Ok(Token::Tuple(decode_sequence(items, data, at)?)),
    }
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], AbiError> {
    at.checked_add(WORD)
        .and_then(|end| data.get(at..end))
        .ok_or(AbiError::OutOfBounds {
            offset: at,
            len: data.len(),
        })
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let word = read_word(data, at)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::OffsetOverflow { offset: at });
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(raw)).map_err(|_| AbiError::OffsetOverflow { offset: at })
}

// =============================================================================
// DIAMOND CUT ARGUMENTS
// =============================================================================

/// `(address,uint8,bytes4[])`
#[must_use]
pub fn facet_cut_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Uint(8),
        ParamType::Array(Box::new(ParamType::FixedBytes(4))),
    ])
}

/// `((address,uint8,bytes4[])[],address,bytes)`
#[must_use]
pub fn diamond_cut_types() -> Vec<ParamType> {
    vec![
        ParamType::Array(Box::new(facet_cut_type())),
        ParamType::Address,
        ParamType::Bytes,
    ]
}

/// Converts a cut into its ABI tuple.
#[must_use]
pub fn facet_cut_token(cut: &FacetCut) -> Token {
    Token::Tuple(vec![
        Token::Address(cut.facet_address),
        Token::Uint(U256::from(cut.action as u8)),
        Token::Array(
            cut.function_selectors
                .iter()
                .map(|s| Token::FixedBytes(s.0.to_vec()))
                .collect(),
        ),
    ])
}

/// Encodes the `diamondCut` arguments (without selector).
#[must_use]
pub fn encode_diamond_cut_args(cuts: &[FacetCut], init: Address, calldata: &[u8]) -> Vec<u8> {
    encode(&[
        Token::Array(cuts.iter().map(facet_cut_token).collect()),
        Token::Address(init),
        Token::Bytes(calldata.to_vec()),
    ])
}

/// Encodes a full `diamondCut` call payload, selector included.
#[must_use]
pub fn encode_diamond_cut_call(cuts: &[FacetCut], init: Address, calldata: &[u8]) -> Bytes {
    let mut out = crate::domain::services::diamond_cut_selector().0.to_vec();
    out.extend(encode_diamond_cut_args(cuts, init, calldata));
    Bytes::from(out)
}

/// Decodes the `diamondCut` arguments (without selector).
///
/// # Errors
///
/// Returns an [`AbiError`] on malformed data or an out-of-range action.
pub fn decode_diamond_cut_args(data: &[u8]) -> Result<(Vec<FacetCut>, Address, Bytes), AbiError> {
    let mut tokens = decode(&diamond_cut_types(), data)?.into_iter();

    let (Some(Token::Array(raw_cuts)), Some(Token::Address(init)), Some(Token::Bytes(calldata))) =
        (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(AbiError::UnexpectedShape);
    };

    let cuts = raw_cuts
        .into_iter()
        .map(cut_from_token)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((cuts, init, Bytes::from(calldata)))
}

fn cut_from_token(token: Token) -> Result<FacetCut, AbiError> {
    let Token::Tuple(fields) = token else {
        return Err(AbiError::UnexpectedShape);
    };
    let mut fields = fields.into_iter();
    let (Some(Token::Address(facet)), Some(Token::Uint(action)), Some(Token::Array(selectors))) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Err(AbiError::UnexpectedShape);
    };

    let action = FacetCutAction::try_from(action.low_u32() as u8)?;
    let function_selectors = selectors
        .into_iter()
        .map(|t| match t {
            Token::FixedBytes(raw) => <[u8; 4]>::try_from(raw.as_slice())
                .map(Selector::new)
                .map_err(|_| AbiError::UnexpectedShape),
            _ => Err(AbiError::UnexpectedShape),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FacetCut {
        facet_address: facet,
        action,
        function_selectors,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn word(hex_str: &str) -> Vec<u8> {
        let raw = hex::decode(hex_str).unwrap();
        let mut w = vec![0u8; WORD - raw.len()];
        w.extend(raw);
        w
    }

    #[test]
    fn test_encode_static_values() {
        let out = encode(&[
            Token::Address(Address::from_low_u8(0xaa)),
            Token::Uint(U256::from(1u8)),
            Token::FixedBytes(vec![0x12, 0x34, 0x56, 0x78]),
        ]);
        assert_eq!(out.len(), 3 * WORD);
        assert_eq!(&out[..WORD], word("aa").as_slice());
        assert_eq!(&out[WORD..2 * WORD], word("01").as_slice());
        assert_eq!(&out[2 * WORD..2 * WORD + 4], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_encode_bytes_is_offset_then_length_then_padded_data() {
        let out = encode(&[Token::Bytes(vec![0xde, 0xad])]);
        assert_eq!(out.len(), 3 * WORD);
        assert_eq!(&out[..WORD], word("20").as_slice()); // offset
        assert_eq!(&out[WORD..2 * WORD], word("02").as_slice()); // length
        assert_eq!(&out[2 * WORD..2 * WORD + 2], &[0xde, 0xad]);
        assert!(out[2 * WORD + 2..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_diamond_cut_args_decode_what_was_encoded() {
        let cuts = vec![
            FacetCut::add(
                Address::from_low_u8(1),
                vec![Selector::from_u32(0xaaaa_aaaa), Selector::from_u32(0xbbbb_bbbb)],
            ),
            FacetCut::remove(vec![Selector::from_u32(0xcccc_cccc)]),
        ];
        let init = Address::from_low_u8(9);
        let payload = vec![1, 2, 3, 4, 5];

        let encoded = encode_diamond_cut_args(&cuts, init, &payload);
        let (decoded, decoded_init, decoded_payload) = decode_diamond_cut_args(&encoded).unwrap();

        assert_eq!(decoded, cuts);
        assert_eq!(decoded_init, init);
        assert_eq!(decoded_payload.as_slice(), payload.as_slice());
    }

    #[test]
    fn test_diamond_cut_call_has_selector_prefix() {
        let call = encode_diamond_cut_call(&[], Address::ZERO, &[]);
        assert_eq!(&call.as_slice()[..4], &[0x1f, 0x93, 0x1c, 0x1c]);
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let cuts = vec![FacetCut::add(
            Address::from_low_u8(1),
            vec![Selector::from_u32(1)],
        )];
        let encoded = encode_diamond_cut_args(&cuts, Address::ZERO, &[]);
        let truncated = &encoded[..encoded.len() - WORD];
        assert!(decode_diamond_cut_args(truncated).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        let mut cut = facet_cut_token(&FacetCut::add(
            Address::from_low_u8(1),
            vec![Selector::from_u32(1)],
        ));
        if let Token::Tuple(fields) = &mut cut {
            fields[1] = Token::Uint(U256::from(3u8));
        }
        let encoded = encode(&[
            Token::Array(vec![cut]),
            Token::Address(Address::ZERO),
            Token::Bytes(vec![]),
        ]);
        assert!(matches!(
            decode_diamond_cut_args(&encoded),
            Err(AbiError::InvalidCutAction(3))
        ));
    }

    #[test]
    fn test_decode_rejects_dirty_address() {
        let mut data = word("01");
        data[0] = 0xff;
        assert!(matches!(
            decode(&[ParamType::Address], &data),
            Err(AbiError::DirtyPadding { offset: 0 })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_array_length() {
        // offset 0x20, then a length far larger than the buffer
        let mut data = word("20");
        data.extend(word("ffffffff"));
        assert!(decode(&[ParamType::Array(Box::new(ParamType::Address))], &data).is_err());
    }
}
