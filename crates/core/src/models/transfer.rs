//! Transfer requests, call descriptors and history records.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use super::{Address, DecimalAmount, TxHash, U256, format_units};

// =============================================================================
// Form Input
// =============================================================================

/// Editable fields of the transfer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    TokenAddress,
    Recipient,
    Amount,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::TokenAddress, Field::Recipient, Field::Amount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::TokenAddress => "tokenAddress",
            Field::Recipient => "recipient",
            Field::Amount => "amount",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw user input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub token_address: String,
    pub recipient: String,
    pub amount: String,
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::TokenAddress => &self.token_address,
            Field::Recipient => &self.recipient,
            Field::Amount => &self.amount,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::TokenAddress => self.token_address = value,
            Field::Recipient => self.recipient = value,
            Field::Amount => self.amount = value,
        }
    }

    /// Every field is empty.
    pub fn is_blank(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    /// Every field is non-empty.
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| !self.get(*f).is_empty())
    }
}

// =============================================================================
// Token Metadata
// =============================================================================

/// Balance of an account in a token, with the metadata needed to scale it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    /// Balance in base units.
    #[serde(serialize_with = "serialize_decimal")]
    pub value: U256,
    /// Token decimals.
    pub decimals: u8,
    /// Token symbol (e.g., "ZEN").
    pub symbol: String,
    /// Token name, when the contract exposes one.
    pub name: Option<String>,
}

impl TokenBalance {
    /// Balance as an exact decimal.
    pub fn amount(&self) -> DecimalAmount {
        DecimalAmount::from_base_units(self.value, self.decimals)
    }

    /// Balance rendered for display.
    pub fn formatted(&self) -> String {
        format_units(self.value, self.decimals)
    }
}

/// Lookup state of the selected token's balance and metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TokenStatus {
    /// No well-formed token address, or no connected account.
    #[default]
    Unset,
    /// Lookup in flight.
    Loading,
    /// Balance and metadata known.
    Loaded(TokenBalance),
    /// Lookup failed.
    Failed { reason: String },
}

impl TokenStatus {
    /// The known balance, if loaded.
    pub fn balance(&self) -> Option<&TokenBalance> {
        match self {
            TokenStatus::Loaded(balance) => Some(balance),
            _ => None,
        }
    }
}

// =============================================================================
// Transfer Request
// =============================================================================

/// A fully-parsed transfer, built from valid input and known token metadata.
///
/// Immutable once handed to the simulation gate; any edit produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub token_address: Address,
    pub recipient: Address,
    pub amount: DecimalAmount,
    pub decimals: u8,
}

impl TransferRequest {
    /// Amount in token base units, if representable.
    pub fn base_units(&self) -> Option<U256> {
        self.amount.to_base_units(self.decimals)
    }
}

// =============================================================================
// Call Descriptor
// =============================================================================

/// ERC-20 `transfer(address,uint256)` selector.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// A directly executable contract call.
///
/// Produced by a successful simulation and handed unchanged to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDescriptor {
    /// Sending account.
    pub from: Address,
    /// Contract being called.
    pub to: Address,
    /// ABI-encoded calldata.
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
    /// Native value attached (wei).
    #[serde(serialize_with = "serialize_decimal")]
    pub value: U256,
    /// Gas limit, once estimated.
    pub gas: Option<u64>,
}

impl CallDescriptor {
    /// Draft descriptor for `token.transfer(recipient, amount)`.
    pub fn erc20_transfer(from: Address, token: Address, recipient: Address, amount: U256) -> Self {
        let mut data = Vec::with_capacity(4 + 32 + 32);
        data.extend_from_slice(&TRANSFER_SELECTOR);
        data.extend_from_slice(recipient.into_word().as_slice());
        data.extend_from_slice(&amount.to_be_bytes::<32>());

        Self {
            from,
            to: token,
            data,
            value: U256::ZERO,
            gas: None,
        }
    }

    /// Calldata as 0x-prefixed hex.
    pub fn data_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }
}

// JSON numbers cannot carry the uint256 range.
fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

// =============================================================================
// Receipts
// =============================================================================

/// Inclusion result of a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Execution status (false means reverted).
    pub success: bool,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Gas consumed.
    pub gas_used: Option<u64>,
}

// =============================================================================
// History
// =============================================================================

/// Status of a recorded transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Success,
    Error,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Success => "success",
            TransferStatus::Error => "error",
        }
    }

    /// Whether this status is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

/// One entry of the transfer history.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub token_address: Address,
    pub recipient: Address,
    /// Amount as entered (human units).
    pub amount: String,
    pub symbol: String,
    pub tx_hash: Option<TxHash>,
    pub status: TransferStatus,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Link to the transaction on a block explorer (e.g., `https://sepolia.etherscan.io`).
    pub fn explorer_url(&self, base: &str) -> Option<String> {
        self.tx_hash
            .map(|hash| format!("{}/tx/{}", base.trim_end_matches('/'), hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_transfer_calldata_layout() {
        let from = Address::repeat_byte(0x11);
        let token = Address::repeat_byte(0xaa);
        let recipient = Address::repeat_byte(0xbb);
        let call = CallDescriptor::erc20_transfer(from, token, recipient, U256::from(2_000_000u64));

        assert_eq!(call.to, token);
        assert_eq!(call.data.len(), 68);
        assert_eq!(&call.data[..4], &TRANSFER_SELECTOR);
        assert_eq!(&call.data[4..16], &[0u8; 12]);
        assert_eq!(&call.data[16..36], &[0xbb; 20]);
        assert_eq!(U256::from_be_slice(&call.data[36..68]), U256::from(2_000_000u64));
        assert!(call.data_hex().starts_with("0xa9059cbb"));
    }

    #[test]
    fn erc20_transfer_encodes_full_uint256() {
        let amount = U256::MAX - U256::from(1u8);
        let call = CallDescriptor::erc20_transfer(
            Address::repeat_byte(0x11),
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0xbb),
            amount,
        );
        assert_eq!(&call.data[36..67], &[0xff; 31]);
        assert_eq!(call.data[67], 0xfe);

        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["value"], "0");
    }

    #[test]
    fn form_completeness() {
        let mut form = FormFields::default();
        assert!(form.is_blank());
        form.set(Field::Amount, "1".into());
        assert!(!form.is_blank());
        assert!(!form.is_complete());
        form.set(Field::TokenAddress, "x".into());
        form.set(Field::Recipient, "y".into());
        assert!(form.is_complete());
    }

    #[test]
    fn explorer_url_only_with_hash() {
        let mut record = TransactionRecord {
            token_address: Address::repeat_byte(0xaa),
            recipient: Address::repeat_byte(0xbb),
            amount: "2".into(),
            symbol: "ZEN".into(),
            tx_hash: None,
            status: TransferStatus::Error,
            timestamp: Utc::now(),
        };
        assert_eq!(record.explorer_url("https://etherscan.io"), None);

        record.tx_hash = Some(TxHash::repeat_byte(0x01));
        let url = record.explorer_url("https://sepolia.etherscan.io/").unwrap();
        assert!(url.starts_with("https://sepolia.etherscan.io/tx/0x0101"));
    }

    #[test]
    fn token_balance_formatting() {
        let balance = TokenBalance {
            value: U256::from(5u8) << 128usize,
            decimals: 18,
            symbol: "ZEN".into(),
            name: Some("Zen Token".into()),
        };
        assert_eq!(balance.formatted(), "1701411834604692317316.87303715884105728");
        assert_eq!(
            balance.amount(),
            DecimalAmount::parse("1701411834604692317316.87303715884105728").unwrap()
        );

        let json = serde_json::to_value(&balance).unwrap();
        assert_eq!(json["value"], "1701411834604692317316873037158841057280");
        assert_eq!(json["name"], "Zen Token");
    }
}
