pub mod dna;
pub mod mapping;
