//! Method resolution.
//!
//! After the mount point has been consumed, exactly one path segment must
//! remain and it must name a method of the bound service:
//!
//! ```text
//! /test.rpc.TestService/Echo
//!  \___ mount ________/ \__/ method
//! ```

use protobind_model::{MethodDescriptor, ServiceDescriptor};

use crate::path::PathStack;

/// Resolve the method named by the last remaining path segment.
///
/// Returns `None` (a binding miss) when no segment is left, when more than one
/// segment is left, or when the segment is not an exact, case-sensitive method
/// name of `service`.
pub fn resolve_method(
    service: &ServiceDescriptor,
    path: &mut PathStack,
) -> Option<MethodDescriptor> {
    let name = path.pop()?;
    if !path.is_at_end() {
        return None;
    }
    service.methods().find(|m| m.name() == name)
}
