//! Input and output slots of a node

use super::factory::DataType;

/// Index of a slot within its side of the node
pub type PortId = usize;

/// Which side of the node a slot sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortType {
    Input,
    Output,
}

/// A typed connection point on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    pub data_type: DataType,
    pub port_type: PortType,
}

impl Port {
    /// Creates a new port
    pub fn new(id: PortId, name: impl Into<String>, data_type: DataType, port_type: PortType) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            port_type,
        }
    }

    /// Checks if this port is an input
    pub fn is_input(&self) -> bool {
        matches!(self.port_type, PortType::Input)
    }

    /// Checks if this port is an output
    pub fn is_output(&self) -> bool {
        matches!(self.port_type, PortType::Output)
    }
}
