//! Native entry-point ABI and the shims that keep panics and errors on the
//! plugin's side of the boundary.

pub mod abi;
pub mod safety;
