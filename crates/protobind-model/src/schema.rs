//! Building descriptor pools in code.
//!
//! Services normally ship a compiled `FileDescriptorSet`. For small services
//! and fixtures, [`ProtoFileBuilder`] assembles a single `.proto` file
//! descriptor directly and loads it into a [`DescriptorPool`].

use prost::Message;
use prost_reflect::{DescriptorPool, ServiceDescriptor};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};

use crate::error::RpcError;

/// Scalar or message type of a singular field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// `bool`
    Bool,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `double`
    Double,
    /// `float`
    Float,
    /// A message type, by local or fully qualified name.
    Message(String),
}

impl FieldType {
    fn proto_type(&self) -> Type {
        match self {
            Self::String => Type::String,
            Self::Bytes => Type::Bytes,
            Self::Bool => Type::Bool,
            Self::Int32 => Type::Int32,
            Self::Int64 => Type::Int64,
            Self::Uint32 => Type::Uint32,
            Self::Uint64 => Type::Uint64,
            Self::Double => Type::Double,
            Self::Float => Type::Float,
            Self::Message(_) => Type::Message,
        }
    }
}

/// Builder for a single proto3 file descriptor.
#[derive(Debug, Clone)]
pub struct ProtoFileBuilder {
    file: FileDescriptorProto,
}

impl ProtoFileBuilder {
    /// Start a file named `name` declaring `package`.
    #[must_use]
    pub fn new(name: &str, package: &str) -> Self {
        Self {
            file: FileDescriptorProto {
                name: Some(name.to_owned()),
                package: Some(package.to_owned()),
                syntax: Some("proto3".to_owned()),
                ..FileDescriptorProto::default()
            },
        }
    }

    /// Declare a message with singular fields given as `(name, number, type)`.
    #[must_use]
    pub fn message(mut self, name: &str, fields: &[(&str, i32, FieldType)]) -> Self {
        let field = fields
            .iter()
            .map(|(field_name, number, ty)| FieldDescriptorProto {
                name: Some((*field_name).to_owned()),
                number: Some(*number),
                label: Some(Label::Optional as i32),
                r#type: Some(ty.proto_type() as i32),
                type_name: match ty {
                    FieldType::Message(type_name) => Some(self.qualify(type_name)),
                    _ => None,
                },
                ..FieldDescriptorProto::default()
            })
            .collect();

        self.file.message_type.push(DescriptorProto {
            name: Some(name.to_owned()),
            field,
            ..DescriptorProto::default()
        });
        self
    }

    /// Declare a service with methods given as `(name, input, output)`.
    ///
    /// Input and output types are message names, local to this file's package
    /// unless they start with a `.`.
    #[must_use]
    pub fn service(mut self, name: &str, methods: &[(&str, &str, &str)]) -> Self {
        let method = methods
            .iter()
            .map(|(method_name, input, output)| MethodDescriptorProto {
                name: Some((*method_name).to_owned()),
                input_type: Some(self.qualify(input)),
                output_type: Some(self.qualify(output)),
                ..MethodDescriptorProto::default()
            })
            .collect();

        self.file.service.push(ServiceDescriptorProto {
            name: Some(name.to_owned()),
            method,
            ..ServiceDescriptorProto::default()
        });
        self
    }

    /// Resolve and link the file into a fresh descriptor pool.
    pub fn build(self) -> Result<DescriptorPool, RpcError> {
        let name = self.file.name().to_owned();
        let set = FileDescriptorSet {
            file: vec![self.file],
        };
        DescriptorPool::decode(set.encode_to_vec().as_slice()).map_err(|e| {
            RpcError::invalid_descriptor(format!("invalid descriptor for {name}: {e}"))
        })
    }

    fn qualify(&self, type_name: &str) -> String {
        if type_name.starts_with('.') {
            type_name.to_owned()
        } else {
            format!(".{}.{type_name}", self.file.package())
        }
    }
}

/// Look up a service by its fully qualified name.
pub fn find_service(pool: &DescriptorPool, full_name: &str) -> Result<ServiceDescriptor, RpcError> {
    pool.get_service_by_name(full_name).ok_or_else(|| {
        RpcError::invalid_descriptor(format!("service {full_name} not found in descriptor pool"))
    })
}
