//! An `io::Write` sink computing the double-SHA256 digest used for
//! transaction ids and sighash digests.

use sha2::{Digest, Sha256};
use std::io;

/// A writer that hashes everything written to it with SHA256d.
#[derive(Default)]
pub struct Writer {
    hash: Sha256,
}

impl Writer {
    /// Consume the writer and produce the double-SHA256 digest.
    pub fn finish(self) -> [u8; 32] {
        let first = self.hash.finalize();
        let second = Sha256::digest(&first);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&second);
        digest
    }
}

impl io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hash.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One-shot SHA256d over a byte slice.
pub fn digest(data: &[u8]) -> [u8; 32] {
    use std::io::Write;

    let mut writer = Writer::default();
    writer
        .write_all(data)
        .expect("writing to a hasher never fails");
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_preimage() {
        cashtx_test::init();

        // SHA256(SHA256("")) is a fixed, well-known vector.
        assert_eq!(
            hex::encode(digest(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }
}
