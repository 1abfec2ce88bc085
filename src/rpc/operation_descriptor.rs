use crate::codec::WireType;
use crate::constants::MAX_WIRE_NESTING_DEPTH;
use crate::rpc::DescriptorError;
use xxhash_rust::xxh3::xxh3_64;

/// Static description of a single callable: name, ordered parameter types and
/// return type.
///
/// Descriptors are immutable once built. The fingerprint is the xxh3-64 hash
/// of the canonical signature (e.g. `square(i32)->f64`) and travels with
/// every call, so a client and a host that derived "the same" operation
/// differently are detected on the first request instead of producing
/// garbage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationDescriptor {
    name: String,
    params: Vec<WireType>,
    returns: WireType,
    fingerprint: u64,
}

impl OperationDescriptor {
    pub fn new(
        name: impl Into<String>,
        params: Vec<WireType>,
        returns: WireType,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DescriptorError::EmptyOperationName);
        }

        // The decoder refuses anything deeper, so such an operation could
        // never be called.
        if let Some(ty) = params
            .iter()
            .chain(std::iter::once(&returns))
            .find(|ty| ty.nesting_depth() > MAX_WIRE_NESTING_DEPTH)
        {
            return Err(DescriptorError::NestingTooDeep {
                operation: name,
                ty: ty.to_string(),
                depth: ty.nesting_depth(),
                max: MAX_WIRE_NESTING_DEPTH,
            });
        }

        let fingerprint = xxh3_64(Self::render_signature(&name, &params, &returns).as_bytes());

        Ok(Self {
            name,
            params,
            returns,
            fingerprint,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[WireType] {
        &self.params
    }

    pub fn returns(&self) -> &WireType {
        &self.returns
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Canonical signature text, e.g. `square(i32)->f64`.
    pub fn signature(&self) -> String {
        Self::render_signature(&self.name, &self.params, &self.returns)
    }

    fn render_signature(name: &str, params: &[WireType], returns: &WireType) -> String {
        let params = params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{name}({params})->{returns}")
    }
}
