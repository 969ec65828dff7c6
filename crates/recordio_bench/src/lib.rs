//! Shared helpers for recordio benchmarks.

use rand::Rng;
use recordio_core::RecordWriter;
use recordio_storage::InMemoryBackend;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Build an in-memory log holding `count` records of `payload_size` bytes.
pub fn prepared_log(count: usize, payload_size: usize) -> InMemoryBackend {
    let mut writer = RecordWriter::new(InMemoryBackend::new()).expect("writer");
    let payloads: Vec<_> = (0..count).map(|_| random_data(payload_size)).collect();
    writer.write_batch(&payloads).expect("write batch");
    writer.into_inner()
}
