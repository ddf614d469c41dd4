//! Sparse equation rows and the per-port unknown layout.

use crate::direction::FlowDirection;

/// Scalar unknowns carried by every connection point, in block order.
pub const QUANTITIES_PER_PORT: usize = 3;

/// Offset of an unknown inside a connection point's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unknown {
    MassFlow = 0,
    Pressure = 1,
    InternalEnergy = 2,
}

impl Unknown {
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// One linear equation `Σ coefficient·x[index] = rhs`.
///
/// `indices` and `coefficients` are parallel and of equal length. Repeated
/// indices are summed on assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationRow {
    indices: Vec<usize>,
    coefficients: Vec<f64>,
    rhs: f64,
}

impl EquationRow {
    pub fn new(terms: impl IntoIterator<Item = (usize, f64)>, rhs: f64) -> Self {
        let (indices, coefficients) = terms.into_iter().unzip();
        Self {
            indices,
            coefficients,
            rhs,
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// `(index, coefficient)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .copied()
            .zip(self.coefficients.iter().copied())
    }

    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().copied().max()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// An element's view of the global unknown vector during row generation.
///
/// `base` is the element's `matrix_index`, `prev` its previous-solution cache,
/// `nodes[i]` the `matrix_index` of the junction at port `i`.
#[derive(Debug, Clone, Copy)]
pub struct PortView<'a> {
    base: usize,
    prev: &'a [f64],
    nodes: &'a [usize],
}

impl<'a> PortView<'a> {
    pub fn new(base: usize, prev: &'a [f64], nodes: &'a [usize]) -> Self {
        Self { base, prev, nodes }
    }

    pub fn index(&self, port: usize, unknown: Unknown) -> usize {
        self.base + port * QUANTITIES_PER_PORT + unknown.offset()
    }

    pub fn node_index(&self, port: usize, unknown: Unknown) -> usize {
        self.nodes[port] + unknown.offset()
    }

    pub fn prev(&self, port: usize, unknown: Unknown) -> f64 {
        self.prev[port * QUANTITIES_PER_PORT + unknown.offset()]
    }

    pub fn direction(&self, port: usize) -> FlowDirection {
        FlowDirection::from_mass_flow(self.prev(port, Unknown::MassFlow))
    }

    /// `P_port − P_node = 0`
    pub fn pressure_to_node(&self, port: usize) -> EquationRow {
        EquationRow::new(
            [
                (self.index(port, Unknown::Pressure), 1.0),
                (self.node_index(port, Unknown::Pressure), -1.0),
            ],
            0.0,
        )
    }

    /// `u_port − u_node = 0`: fluid entering here carries the junction's energy.
    pub fn energy_from_node(&self, port: usize) -> EquationRow {
        EquationRow::new(
            [
                (self.index(port, Unknown::InternalEnergy), 1.0),
                (self.node_index(port, Unknown::InternalEnergy), -1.0),
            ],
            0.0,
        )
    }

    /// `x = value` for one unknown of one port.
    pub fn fixed(&self, port: usize, unknown: Unknown, value: f64) -> EquationRow {
        EquationRow::new([(self.index(port, unknown), 1.0)], value)
    }

    /// `m_a + m_b = 0`
    pub fn continuity(&self, a: usize, b: usize) -> EquationRow {
        EquationRow::new(
            [
                (self.index(a, Unknown::MassFlow), 1.0),
                (self.index(b, Unknown::MassFlow), 1.0),
            ],
            0.0,
        )
    }
}
