//! Concrete [`MintDateProvider`](super::MintDateProvider) implementations.

mod events;
mod explorer;
mod http;

pub use events::EventsApiProvider;
pub use explorer::ExplorerProvider;

/// Tezos burn/mint null address.
pub const TEZOS_NULL_ADDRESS: &str = "tz1Ke2h7sDdakHJQh8WX4Z372du1KChsksyU";

/// Whether a transfer sender marks a mint: missing, empty, the EVM zero
/// address or the Tezos null address.
pub fn is_mint_sender(from: Option<&str>) -> bool {
    let Some(from) = from.map(str::trim) else {
        return true;
    };
    if from.is_empty() || from == TEZOS_NULL_ADDRESS {
        return true;
    }
    let hex = from
        .strip_prefix("0x")
        .or_else(|| from.strip_prefix("0X"))
        .unwrap_or(from);
    !hex.is_empty() && hex.len() <= 40 && hex.bytes().all(|b| b == b'0')
}
