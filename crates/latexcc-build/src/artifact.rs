use sha2::{Digest, Sha256};

/// The PDF produced by a successful compilation, plus what is known about
/// how it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledDocument {
    pdf: Vec<u8>,
    passes: u32,
    warnings: Vec<String>,
}

impl CompiledDocument {
    pub fn new(pdf: Vec<u8>, passes: u32, warnings: Vec<String>) -> Self {
        Self {
            pdf,
            passes,
            warnings,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.pdf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pdf
    }

    /// Number of engine passes that ran.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Warnings from the final pass's log.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Hex SHA-256 of the PDF bytes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.pdf);
        hex::encode(hasher.finalize())
    }
}
