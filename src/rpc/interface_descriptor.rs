use crate::rpc::{DescriptorError, OperationDescriptor};

/// An interface as declared by a user: a name and the operations it lists.
///
/// Only interfaces with exactly one operation can be hosted or called. The
/// check happens in [`InterfaceDescriptor::single_operation`], which hosts and
/// clients call at construction time, before any socket is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    name: String,
    operations: Vec<OperationDescriptor>,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    /// Shorthand for an interface that declares exactly `operation`.
    pub fn of(name: impl Into<String>, operation: OperationDescriptor) -> Self {
        Self::new(name).with_operation(operation)
    }

    pub fn with_operation(mut self, operation: OperationDescriptor) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Returns the interface's only operation, or a configuration error if it
    /// declares zero or several.
    pub fn single_operation(&self) -> Result<&OperationDescriptor, DescriptorError> {
        match self.operations.as_slice() {
            [operation] => Ok(operation),
            [] => Err(DescriptorError::NoOperations {
                interface: self.name.clone(),
            }),
            many => Err(DescriptorError::MultipleOperations {
                interface: self.name.clone(),
                operations: many.iter().map(|op| op.name().to_owned()).collect(),
            }),
        }
    }
}
