//! Virtual-to-physical qubit assignment.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use svalin_ir::QubitId;

use crate::error::{TranspileError, TranspileResult};

/// A bijective assignment of virtual circuit qubits to physical device
/// qubits.
///
/// Both directions are kept as maps so lookup is O(1) either way;
/// [`swap_physical`](Self::swap_physical) keeps them consistent when a
/// routing pass inserts a SWAP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    virt_to_phys: FxHashMap<QubitId, u32>,
    phys_to_virt: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity layout: virtual qubit i on physical qubit i.
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.insert(QubitId(i), i);
        }
        layout
    }

    /// Build a layout from a physical-qubit list.
    ///
    /// Entry i of the list is the physical qubit assigned to virtual
    /// qubit i. The list length must equal the circuit width, every
    /// entry must be on the device, and entries must be distinct.
    pub fn from_physical_list(
        physical: &[u32],
        num_circuit_qubits: u32,
        num_device_qubits: u32,
    ) -> TranspileResult<Self> {
        if physical.len() as u32 != num_circuit_qubits {
            return Err(TranspileError::InvalidConfiguration(format!(
                "initial_layout has {} entries but the circuit has {} qubits",
                physical.len(),
                num_circuit_qubits
            )));
        }
        let mut layout = Self::new();
        for (virt, &phys) in physical.iter().enumerate() {
            if phys >= num_device_qubits {
                return Err(TranspileError::InvalidConfiguration(format!(
                    "initial_layout assigns physical qubit {phys} but the device has {num_device_qubits} qubits"
                )));
            }
            if layout.phys_to_virt.contains_key(&phys) {
                return Err(TranspileError::InvalidConfiguration(format!(
                    "initial_layout assigns physical qubit {phys} more than once"
                )));
            }
            layout.insert(QubitId(virt as u32), phys);
        }
        Ok(layout)
    }

    /// Build a layout from explicit virtual-to-physical pairs.
    ///
    /// Both sides must be free of duplicates.
    pub fn from_virtual_map(
        pairs: impl IntoIterator<Item = (QubitId, u32)>,
    ) -> TranspileResult<Self> {
        let mut layout = Self::new();
        for (virt, phys) in pairs {
            if layout.virt_to_phys.contains_key(&virt) {
                return Err(TranspileError::InvalidConfiguration(format!(
                    "initial_layout maps virtual qubit {virt} more than once"
                )));
            }
            if layout.phys_to_virt.contains_key(&phys) {
                return Err(TranspileError::InvalidConfiguration(format!(
                    "initial_layout assigns physical qubit {phys} more than once"
                )));
            }
            layout.insert(virt, phys);
        }
        Ok(layout)
    }

    fn insert(&mut self, virt: QubitId, phys: u32) {
        self.virt_to_phys.insert(virt, phys);
        self.phys_to_virt.insert(phys, virt);
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.virt_to_phys.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.virt_to_phys.is_empty()
    }

    /// Physical qubit holding a virtual qubit.
    pub fn physical(&self, virt: QubitId) -> Option<u32> {
        self.virt_to_phys.get(&virt).copied()
    }

    /// Virtual qubit held by a physical qubit.
    pub fn virtual_qubit(&self, phys: u32) -> Option<QubitId> {
        self.phys_to_virt.get(&phys).copied()
    }

    /// Exchange the virtual qubits held by two physical qubits.
    ///
    /// Either side may be unoccupied; the occupied one moves.
    pub fn swap_physical(&mut self, a: u32, b: u32) {
        let va = self.phys_to_virt.remove(&a);
        let vb = self.phys_to_virt.remove(&b);
        if let Some(v) = vb {
            self.phys_to_virt.insert(a, v);
            self.virt_to_phys.insert(v, a);
        }
        if let Some(v) = va {
            self.phys_to_virt.insert(b, v);
            self.virt_to_phys.insert(v, b);
        }
    }

    /// Iterate over (virtual, physical) pairs in virtual-qubit order.
    pub fn iter_virtual(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        let mut pairs: Vec<_> = self
            .virt_to_phys
            .iter()
            .map(|(&v, &p)| (v, p))
            .collect();
        pairs.sort_unstable_by_key(|&(v, _)| v.0);
        pairs.into_iter()
    }

    /// Physical qubits in virtual-qubit order.
    pub fn as_physical_list(&self) -> Vec<u32> {
        self.iter_virtual().map(|(_, p)| p).collect()
    }

    /// Check the layout is a bijection over exactly `0..num_qubits`
    /// virtual qubits.
    pub fn is_complete(&self, num_qubits: u32) -> bool {
        self.virt_to_phys.len() as u32 == num_qubits
            && (0..num_qubits).all(|i| self.virt_to_phys.contains_key(&QubitId(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial() {
        let layout = Layout::trivial(3);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.physical(QubitId(2)), Some(2));
        assert_eq!(layout.virtual_qubit(0), Some(QubitId(0)));
        assert!(layout.is_complete(3));
    }

    #[test]
    fn test_from_physical_list() {
        let layout = Layout::from_physical_list(&[2, 0, 1], 3, 3).unwrap();
        assert_eq!(layout.physical(QubitId(0)), Some(2));
        assert_eq!(layout.virtual_qubit(1), Some(QubitId(2)));
        assert_eq!(layout.as_physical_list(), vec![2, 0, 1]);
    }

    #[test]
    fn test_physical_list_validation() {
        assert!(matches!(
            Layout::from_physical_list(&[0, 1], 3, 3),
            Err(TranspileError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Layout::from_physical_list(&[0, 0, 1], 3, 3),
            Err(TranspileError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Layout::from_physical_list(&[0, 1, 7], 3, 3),
            Err(TranspileError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_swap_physical() {
        let mut layout = Layout::trivial(2);
        layout.swap_physical(0, 1);
        assert_eq!(layout.physical(QubitId(0)), Some(1));
        assert_eq!(layout.physical(QubitId(1)), Some(0));
        assert_eq!(layout.virtual_qubit(0), Some(QubitId(1)));
    }

    #[test]
    fn test_swap_with_unoccupied() {
        let mut layout = Layout::from_physical_list(&[0], 1, 3).unwrap();
        layout.swap_physical(0, 2);
        assert_eq!(layout.physical(QubitId(0)), Some(2));
        assert_eq!(layout.virtual_qubit(0), None);
    }

    #[test]
    fn test_virtual_map_duplicates() {
        let err = Layout::from_virtual_map([(QubitId(0), 1), (QubitId(1), 1)]).unwrap_err();
        assert!(matches!(err, TranspileError::InvalidConfiguration(_)));
    }
}
