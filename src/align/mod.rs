pub mod global;
pub mod multi;
pub mod mutations;

pub use global::{align_global, align_global_with_buf, AlignBuffer, AlignScoring, GlobalAlignment};
pub use mutations::{nt_to_aa, Mutation, Mutations};
