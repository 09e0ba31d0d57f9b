use {
    crate::primitives::{B256, U256},
    alloy::primitives::keccak256,
};

/// Commitment over the sealed fields of a bid.
///
/// Equivalent to `soliditySha3(rate, value, celerValue, salt)` with all four
/// arguments as `uint256`: keccak256 over their 32 byte big-endian encodings.
pub fn bid_hash(rate: U256, value: U256, celer_value: U256, salt: U256) -> B256 {
    let mut buf = [0u8; 128];
    for (chunk, word) in buf
        .chunks_exact_mut(32)
        .zip([rate, value, celer_value, salt])
    {
        chunk.copy_from_slice(&word.to_be_bytes::<32>());
    }
    keccak256(buf)
}
