pub mod cli;
pub mod commands;
pub mod error;

pub mod core {
    pub mod allele;
    pub mod codec;
    pub mod genotype;
    pub mod header;
    pub mod record;
    pub mod version;
}

pub mod io {
    pub mod readers;
    pub mod vcf_reader;
    pub mod vcf_writer;
}

pub mod utils {
    pub mod util;
}

pub mod constants;

pub use constants::*;
