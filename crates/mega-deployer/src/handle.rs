use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes};

/// A contract bound to its on-chain address.
///
/// Binding is local: no RPC is needed to obtain a handle, and every capability check runs
/// against the contract's ABI.
#[derive(Clone, Debug)]
pub struct ContractHandle {
    name: String,
    address: Address,
    abi: JsonAbi,
}

impl ContractHandle {
    /// Binds `abi` to the contract deployed at `address`.
    pub fn bind(name: impl Into<String>, address: Address, abi: JsonAbi) -> Self {
        Self { name: name.into(), address, abi }
    }

    /// Contract name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deployed address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the overload of `method` taking a single `address`, if the ABI declares one.
    pub fn address_setter(&self, method: &str) -> Option<&Function> {
        self.abi
            .function(method)?
            .iter()
            .find(|function| matches!(function.inputs.as_slice(), [param] if param.ty == "address"))
    }

    /// Encodes a call of `setter` with `value` as its argument.
    pub fn encode_setter(
        &self,
        setter: &Function,
        value: Address,
    ) -> Result<Bytes, alloy_dyn_abi::Error> {
        setter.abi_encode_input(&[DynSolValue::Address(value)]).map(Bytes::from)
    }
}
