//! ERC20/ERC721 bindings, deployment artifacts and dynamic contract calls.
//!
//! Contracts are consumed as ABI + creation bytecode. Creation bytecode comes
//! from a compiled artifact JSON (Hardhat `"bytecode": "0x..."` or Foundry
//! `"bytecode": { "object": "0x..." }`) or is passed in directly.
//!
//! Constructor conventions:
//! - ERC20: `constructor(string name, string symbol, uint8 decimals, uint256 initialSupply)`
//! - ERC721: `constructor(string name, string symbol)`

use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::hex;
use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::{sol_data, SolCall, SolType, SolValue};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::units;

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }

    interface IERC721 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function ownerOf(uint256 tokenId) external view returns (address);
        function tokenURI(uint256 tokenId) external view returns (string);
        function balanceOf(address owner) external view returns (uint256);
        function mint(address to, uint256 tokenId, string uri) external;
    }
}

/// Read creation bytecode from a compiled artifact file.
pub fn load_artifact_bytecode(path: &Path) -> BlockchainResult<Bytes> {
    let content = fs::read_to_string(path).map_err(|e| {
        BlockchainError::Contract(format!("cannot read artifact {}: {}", path.display(), e))
    })?;
    let artifact: Value = serde_json::from_str(&content).map_err(|e| {
        BlockchainError::Contract(format!("invalid artifact JSON {}: {}", path.display(), e))
    })?;

    let bytecode = match artifact.get("bytecode") {
        Some(Value::String(code)) => code.as_str(),
        Some(Value::Object(obj)) => obj
            .get("object")
            .and_then(Value::as_str)
            .ok_or_else(|| BlockchainError::Contract("artifact bytecode has no 'object'".to_string()))?,
        _ => {
            return Err(BlockchainError::Contract(format!(
                "artifact {} has no 'bytecode' field",
                path.display()
            )))
        }
    };

    parse_bytecode(bytecode)
}

/// Decode hex creation bytecode, rejecting empty code.
pub fn parse_bytecode(bytecode: &str) -> BlockchainResult<Bytes> {
    let code = hex::decode(bytecode.trim())
        .map_err(|e| BlockchainError::Contract(format!("invalid bytecode hex: {}", e)))?;
    if code.is_empty() {
        return Err(BlockchainError::Contract(
            "bytecode is empty (abstract contract or interface?)".to_string(),
        ));
    }
    Ok(code.into())
}

/// `(string, string, uint8, uint256)` ERC20 constructor parameters.
pub type Erc20Constructor = (sol_data::String, sol_data::String, sol_data::Uint<8>, sol_data::Uint<256>);

/// Creation code followed by ABI-encoded ERC20 constructor arguments.
pub fn erc20_deploy_code(bytecode: &Bytes, name: &str, symbol: &str, decimals: u8, initial_supply: U256) -> Bytes {
    let args = Erc20Constructor::abi_encode_params(&(
        name.to_string(),
        symbol.to_string(),
        decimals,
        initial_supply,
    ));
    [bytecode.as_ref(), args.as_slice()].concat().into()
}

/// Creation code followed by ABI-encoded ERC721 constructor arguments.
pub fn erc721_deploy_code(bytecode: &Bytes, name: &str, symbol: &str) -> Bytes {
    let args = (name.to_string(), symbol.to_string()).abi_encode_params();
    [bytecode.as_ref(), args.as_slice()].concat().into()
}

/// Decode the return data of a typed call.
pub fn decode_returns<C: SolCall>(data: &[u8]) -> BlockchainResult<C::Return> {
    C::abi_decode_returns(data)
        .map_err(|e| BlockchainError::Contract(format!("cannot decode {} return data: {}", C::SIGNATURE, e)))
}

/// A function parsed from a human-readable signature.
#[derive(Debug, Clone)]
pub struct DynamicCall {
    function: Function,
}

impl DynamicCall {
    /// Parse e.g. `"balanceOf(address) returns (uint256)"`.
    pub fn parse(signature: &str) -> BlockchainResult<Self> {
        let signature = signature.trim();
        let signature = signature.strip_prefix("function ").unwrap_or(signature);
        let function = Function::parse(signature).map_err(|e| {
            BlockchainError::InvalidInput(format!("invalid function signature '{}': {}", signature, e))
        })?;
        Ok(Self { function })
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Encode calldata, coercing JSON arguments to the declared parameter types.
    pub fn encode(&self, args: &[Value]) -> BlockchainResult<Bytes> {
        if args.len() != self.function.inputs.len() {
            return Err(BlockchainError::InvalidInput(format!(
                "{} expects {} argument(s), got {}",
                self.function.signature(),
                self.function.inputs.len(),
                args.len()
            )));
        }

        let values = self
            .function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty: DynSolType = param.resolve().map_err(|e| {
                    BlockchainError::InvalidInput(format!("unsupported type '{}': {}", param.ty, e))
                })?;
                coerce_arg(&ty, arg)
            })
            .collect::<BlockchainResult<Vec<_>>>()?;

        self.function
            .abi_encode_input(&values)
            .map(Bytes::from)
            .map_err(|e| BlockchainError::Contract(format!("cannot encode call: {}", e)))
    }

    /// Decode return data into JSON values, one per declared output.
    pub fn decode_output(&self, data: &[u8], chain_id: u64) -> BlockchainResult<Vec<Value>> {
        let values = self
            .function
            .abi_decode_output(data)
            .map_err(|e| BlockchainError::Contract(format!("cannot decode return data: {}", e)))?;
        Ok(values.iter().map(|v| value_to_json(v, chain_id)).collect())
    }
}

fn coerce_arg(ty: &DynSolType, arg: &Value) -> BlockchainResult<DynSolValue> {
    let text = match arg {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    ty.coerce_str(&text).map_err(|e| {
        BlockchainError::InvalidInput(format!("cannot convert '{}' to {}: {}", text, ty.sol_type_name(), e))
    })
}

/// Render a decoded ABI value as JSON. Integers become decimal strings.
pub fn value_to_json(value: &DynSolValue, chain_id: u64) -> Value {
    match value {
        DynSolValue::Bool(b) => json!(b),
        DynSolValue::Int(i, _) => json!(i.to_string()),
        DynSolValue::Uint(u, _) => json!(u.to_string()),
        DynSolValue::Address(a) => json!(units::checksum(a, chain_id)),
        DynSolValue::FixedBytes(word, size) => json!(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Bytes(b) => json!(hex::encode_prefixed(b)),
        DynSolValue::String(s) => json!(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(|v| value_to_json(v, chain_id)).collect())
        }
        #[allow(unreachable_patterns)]
        other => json!(format!("{:?}", other)),
    }
}

/// Whether an address has contract code.
pub fn is_contract_code(code: &Bytes) -> bool {
    !code.is_empty()
}

/// Zero address check used before minting or transferring.
pub fn require_nonzero(address: &Address, what: &str) -> BlockchainResult<()> {
    if address.is_zero() {
        return Err(BlockchainError::InvalidInput(format!("{} must not be the zero address", what)));
    }
    Ok(())
}
