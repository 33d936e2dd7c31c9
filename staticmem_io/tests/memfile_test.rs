use std::io::{BufRead, BufReader, Read as _, Seek as _, SeekFrom, Write as _};
use std::sync::Arc;

use staticmem::{Error, Handle, MemStore, ProtocolRegistry, StreamAdapter, StreamContext};
use staticmem_io::{error_kind_to_str, error_to_error_kind, MemFile};

fn setup() -> (Arc<MemStore>, ProtocolRegistry) {
    let store = Arc::new(MemStore::new());
    let registry = ProtocolRegistry::new();
    StreamAdapter::new(Arc::clone(&store))
        .register(&registry)
        .unwrap();
    (store, registry)
}

fn open(registry: &ProtocolRegistry, handle: Handle) -> MemFile {
    MemFile::open(
        registry,
        &format!("staticmem://{handle}"),
        &StreamContext::new(),
    )
    .unwrap()
}

#[test]
fn lines_round_trip_through_std_io() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    let mut file = open(&registry, handle);

    writeln!(file, "line1").unwrap();
    writeln!(file, "line2").unwrap();
    writeln!(file, "line3").unwrap();
    file.rewind().unwrap();

    let lines: Vec<String> = BufReader::new(&mut file)
        .lines()
        .map(Result::unwrap)
        .collect();
    assert_eq!(lines, vec!["line1", "line2", "line3"]);
    assert_eq!(store.get(handle).unwrap(), b"line1\nline2\nline3\n");
    assert!(file.eof().unwrap());
}

#[test]
fn read_to_end_after_seek() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    store.set(handle, b"hello world").unwrap();
    let mut file = open(&registry, handle);

    assert_eq!(file.seek(SeekFrom::End(-5)).unwrap(), 6);
    let mut rest = Vec::new();
    file.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"world");
}

#[test]
fn std_seek_out_of_range_is_invalid_input() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    let mut file = open(&registry, handle);

    let err = file.seek(SeekFrom::Start(1)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    let err = file.seek(SeekFrom::Start(u64::MAX)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    assert_eq!(file.tell().unwrap(), 0);
}

#[test]
fn std_errors_keep_the_store_error() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    let mut file = open(&registry, handle);
    store.release(handle).unwrap();

    let err = file.write(b"x").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    let inner = err.into_inner().unwrap().downcast::<Error>().unwrap();
    assert_eq!(*inner, Error::UnknownHandle(handle));
}

#[test]
fn embedded_io_read_write_seek() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    let mut file = open(&registry, handle);

    embedded_io::Write::write_all(&mut file, b"abcdef").unwrap();
    assert_eq!(
        embedded_io::Seek::seek(&mut file, embedded_io::SeekFrom::Start(2)).unwrap(),
        2
    );

    let mut buf = [0u8; 3];
    embedded_io::Read::read_exact(&mut file, &mut buf).unwrap();
    assert_eq!(&buf, b"cde");

    assert_eq!(
        embedded_io::Seek::seek(&mut file, embedded_io::SeekFrom::Current(-10)),
        Err(embedded_io::ErrorKind::InvalidInput)
    );
    assert_eq!(file.tell().unwrap(), 5);
}

#[test]
fn closed_file_reports_not_connected() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    let mut file = open(&registry, handle);

    file.close().unwrap();
    assert!(!store.exists(handle));

    let mut buf = [0u8; 1];
    assert_eq!(
        embedded_io::Read::read(&mut file, &mut buf),
        Err(embedded_io::ErrorKind::NotConnected)
    );
    assert_eq!(file.close(), Err(Error::SessionClosed));
}

#[test]
fn drop_without_close_keeps_buffer() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    {
        let mut file = open(&registry, handle);
        file.write_all(b"kept").unwrap();
    }
    assert_eq!(store.get(handle).unwrap(), b"kept");
}

#[test]
fn reopen_after_close_reports_not_found() {
    let (store, registry) = setup();
    let handle = store.allocate().unwrap();
    let url = format!("staticmem://{handle}");
    let mut file = open(&registry, handle);
    file.close().unwrap();

    let err = MemFile::open(&registry, &url, &StreamContext::new()).unwrap_err();
    assert_eq!(err, Error::UnknownHandle(handle));
    assert_eq!(error_kind_to_str(error_to_error_kind(&err)), "not found");
}
