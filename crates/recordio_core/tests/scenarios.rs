//! End-to-end scenarios over file-backed logs.

use recordio_core::{
    recovery, Cursor, LogConfig, LogError, RecordReader, RecordWriter, StopReason,
};
use recordio_storage::{FileBackend, StorageBackend};
use std::fs::OpenOptions;
use std::path::Path;
use tempfile::tempdir;

fn open_reader(path: &Path) -> RecordReader<FileBackend> {
    RecordReader::new(FileBackend::open(path).unwrap()).unwrap()
}

#[test]
fn separate_records_are_never_concatenated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");

    let (first, second, third) = {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        let first = writer.write(b"hello ").unwrap();
        let second = writer.write(b"world").unwrap();
        let third = writer.write(b"goodbye").unwrap();
        writer.sync().unwrap();
        (first, second, third)
    };
    assert!(first < second && second < third);

    let reader = open_reader(&path);
    let mut it = reader.iter();

    assert_ne!(it.cursor(), reader.end());
    let record = it.next().unwrap().unwrap();
    assert_eq!(record.payload, b"hello ");
    assert_eq!(record.offset, first);

    assert_ne!(it.cursor(), reader.end());
    let record = it.next().unwrap().unwrap();
    assert_eq!(record.payload, b"world");
    assert_eq!(record.offset, second);

    assert_ne!(it.cursor(), reader.end());
    let record = it.next().unwrap().unwrap();
    assert_eq!(record.payload, b"goodbye");
    assert_eq!(record.offset, third);

    assert!(it.next().is_none());
    assert_eq!(it.cursor(), reader.end());
    assert_eq!(it.stop_reason(), Some(&StopReason::EndOfData));
}

#[test]
fn gather_write_is_one_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");

    {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        writer
            .write_chunks(&[b"hello ".as_slice(), b"world".as_slice()])
            .unwrap();
        writer.write_chunks(&[b"goodbye".as_slice()]).unwrap();
        writer.sync().unwrap();
    }

    let reader = open_reader(&path);
    let mut it = reader.iter();
    assert_eq!(it.next().unwrap().unwrap().payload, b"hello world");
    assert_eq!(it.next().unwrap().unwrap().payload, b"goodbye");
    assert!(it.next().is_none());
    assert_eq!(it.cursor(), Cursor::End);
}

#[test]
fn reopened_writer_appends_after_existing_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");

    for batch in [["a", "b"], ["c", "d"]] {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        writer.write_batch(batch).unwrap();
        writer.sync().unwrap();
    }

    let payloads: Vec<_> = open_reader(&path)
        .iter()
        .map(|r| r.unwrap().payload)
        .collect();
    assert_eq!(payloads, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
}

#[test]
fn crash_mid_append_is_recovered_on_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");

    {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        writer.write(b"committed").unwrap();
        writer.write(&[0x5A; 900]).unwrap();
        writer.sync().unwrap();
    }

    // Simulate a torn second frame.
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(512 + 300).unwrap();
    drop(file);

    let payloads: Vec<_> = open_reader(&path)
        .iter()
        .map(|r| r.unwrap().payload)
        .collect();
    assert_eq!(payloads, vec![b"committed".to_vec()]);

    {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        assert_eq!(writer.position().unwrap(), 512);
        writer.write(b"after crash").unwrap();
        writer.sync().unwrap();
    }

    let payloads: Vec<_> = open_reader(&path)
        .iter()
        .map(|r| r.unwrap().payload)
        .collect();
    assert_eq!(payloads, vec![b"committed".to_vec(), b"after crash".to_vec()]);
}

#[test]
fn mid_log_corruption_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");

    {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        writer.write_batch(["a", "b", "c", "d"]).unwrap();
        writer.sync().unwrap();
    }

    // Flip one checksum bit in the second frame.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[512 + 8] ^= 0x01;
    std::fs::write(&path, &bytes).unwrap();

    let err = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap_err();
    assert!(matches!(err, LogError::CorruptLog { offset: 512, .. }));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);

    let mut backend = FileBackend::open(&path).unwrap();
    let report = recovery::recover(&mut backend, &LogConfig::default()).unwrap();
    assert_eq!(report.records, 1);

    let mut writer = RecordWriter::new(backend).unwrap();
    assert_eq!(writer.write(b"e").unwrap(), 512);
    writer.sync().unwrap();

    let payloads: Vec<_> = open_reader(&path)
        .iter()
        .map(|r| r.unwrap().payload)
        .collect();
    assert_eq!(payloads, vec![b"a".to_vec(), b"e".to_vec()]);
}

#[test]
fn reader_sees_consistent_prefix_while_writer_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");

    let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
    writer.write(b"one").unwrap();
    writer.flush().unwrap();

    let reader = open_reader(&path);
    writer.write(b"two").unwrap();
    writer.flush().unwrap();

    let before: Vec<_> = reader.iter().map(|r| r.unwrap().payload).collect();
    assert_eq!(before, vec![b"one".to_vec()]);

    reader.backend().resync().unwrap();
    let after: Vec<_> = reader.iter().map(|r| r.unwrap().payload).collect();
    assert_eq!(after, vec![b"one".to_vec(), b"two".to_vec()]);
}

#[test]
fn oversized_record_appends_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");
    let config = LogConfig::new().max_record_size(1024);

    let mut writer =
        RecordWriter::with_config(FileBackend::open(&path).unwrap(), config.clone()).unwrap();
    writer.write(&[1u8; 1024]).unwrap();
    let size = writer.position().unwrap();

    let err = writer.write(&[1u8; 1025]).unwrap_err();
    assert!(matches!(err, LogError::OversizedRecord { len: 1025, max: 1024 }));
    writer.sync().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), size);

    let reader =
        RecordReader::with_config(FileBackend::open(&path).unwrap(), &config).unwrap();
    assert_eq!(reader.iter().count(), 1);
}

#[test]
fn verify_and_recover_on_damaged_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.log");
    let config = LogConfig::default();

    {
        let mut writer = RecordWriter::new(FileBackend::open(&path).unwrap()).unwrap();
        writer.write_batch([b"x".as_slice(), b"y".as_slice(), b"z".as_slice()]).unwrap();
        writer.sync().unwrap();
    }

    // Damage the payload of the second record.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[512 + 12] = b'Y';
    std::fs::write(&path, &bytes).unwrap();

    let mut backend = FileBackend::open(&path).unwrap();
    let report = recovery::scan(&backend, &config).unwrap();
    assert_eq!(report.records, 1);
    assert!(!report.is_clean());
    assert_eq!(report.trailing_bytes(), 1024);

    recovery::recover(&mut backend, &config).unwrap();
    assert_eq!(backend.size().unwrap(), 512);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 512);
}
