#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::*;
use userial::{Codec, Reflect, UserialError, Value};

fn nested(depth: usize) -> Value {
    let mut value = Value::Int(1);
    for _ in 1..depth {
        value = Value::Sequence {
            type_name: "Vec".into(),
            items: vec![value],
        };
    }
    value
}

// --- File I/O ---

#[test]
#[cfg(not(target_arch = "wasm32"))]
fn save_and_load_through_a_file() -> userial::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("student.bin");
    let codec = Codec::for_type::<Student>()?;

    codec.save(&path, &student())?;
    let loaded: Student = codec.load_as(&path)?;
    assert_eq!(loaded, student());

    let on_disk = std::fs::read(&path)?;
    assert_eq!(on_disk, codec.encode(&student())?);
    Ok(())
}

#[test]
#[cfg(not(target_arch = "wasm32"))]
fn empty_file_is_truncated() -> userial::Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    match Codec::default().load(file.path()) {
        Err(UserialError::TruncatedStream { offset: 0, .. }) => {}
        other => panic!("expected truncation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let result = Codec::default().load("/definitely/not/here.bin");
    assert!(matches!(result, Err(UserialError::Io(_))));
}

// --- Free functions ---

#[test]
fn free_functions_register_on_the_fly() -> userial::Result<()> {
    let bytes = userial::encode(&student())?;
    let back: Student = userial::decode(&bytes)?;
    assert_eq!(back, student());
    Ok(())
}

// --- Depth limit ---

#[test]
fn depth_limit_applies_to_both_directions() -> userial::Result<()> {
    let shallow = Codec::builder().max_depth(3).build()?;
    let bytes = shallow.encode_value(&nested(3))?;
    assert_eq!(shallow.decode(&bytes)?, nested(3));

    let tighter = Codec::builder().max_depth(2).build()?;
    assert!(matches!(
        tighter.encode_value(&nested(3)),
        Err(UserialError::DepthLimitExceeded(2))
    ));
    assert!(matches!(
        tighter.decode(&bytes),
        Err(UserialError::DepthLimitExceeded(2))
    ));
    Ok(())
}

#[test]
fn default_depth_limit_stops_runaway_nesting() -> userial::Result<()> {
    let deep = nested(userial::constants::DEFAULT_MAX_DEPTH + 10);

    let unbounded = Codec::builder().unbounded_depth().build()?;
    let bytes = unbounded.encode_value(&deep)?;
    assert_eq!(unbounded.decode(&bytes)?, deep);

    let codec = Codec::default();
    assert!(matches!(
        codec.encode_value(&deep),
        Err(UserialError::DepthLimitExceeded(_))
    ));
    assert!(matches!(
        codec.decode(&bytes),
        Err(UserialError::DepthLimitExceeded(_))
    ));
    Ok(())
}

#[test]
fn inspector_honours_the_depth_limit() -> userial::Result<()> {
    let deep = nested(userial::constants::DEFAULT_MAX_DEPTH + 10);
    let unbounded = Codec::builder().unbounded_depth().build()?;
    let bytes = unbounded.encode_value(&deep)?;

    assert!(matches!(
        Codec::default().inspect(&bytes),
        Err(UserialError::DepthLimitExceeded(limit))
            if limit == userial::constants::DEFAULT_MAX_DEPTH
    ));
    let report = unbounded.inspect(&bytes)?;
    assert_eq!(report.total_size, bytes.len() as u64);
    Ok(())
}

// --- Builder ---

#[derive(Reflect, Debug)]
#[userial(name = "int")]
struct Impostor {
    value: i32,
}

#[test]
fn registration_errors_surface_at_build() {
    let result = Codec::builder()
        .register::<Student>()
        .register::<Impostor>()
        .build();
    assert!(matches!(result, Err(UserialError::Format(_))));
}

#[test]
fn options_are_reported() -> userial::Result<()> {
    let codec = Codec::builder()
        .register::<Student>()
        .max_depth(16)
        .allow_trailing_bytes(true)
        .build()?;
    assert_eq!(codec.options().max_depth, Some(16));
    assert!(codec.options().allow_trailing_bytes);
    assert!(codec.registry().contains(&Human::type_identifier()));
    Ok(())
}

// --- Inspector ---

#[test]
fn inspector_reports_every_frame() -> userial::Result<()> {
    let codec = Codec::for_type::<Student>()?;
    let bytes = codec.encode(&student())?;
    let report = codec.inspect(&bytes)?;

    assert_eq!(report.total_size, bytes.len() as u64);
    assert_eq!(report.root.offset, 0);
    assert_eq!(report.root.length, bytes.len() as u64);
    assert_eq!(report.root.identifier, Student::type_identifier());
    assert_eq!(report.root.kind, "composite");
    assert_eq!(report.root.children.len(), 6);

    let university = &report.root.children[1];
    assert_eq!(university.identifier, University::type_identifier());
    assert_eq!(university.children.len(), 2);

    let age = &report.root.children[4];
    assert_eq!(age.identifier, "int");
    assert_eq!(age.detail.as_deref(), Some("21"));

    let gender = &report.root.children[5];
    assert_eq!(gender.kind, "enum");
    assert_eq!(gender.detail.as_deref(), Some("Male"));

    // Same stream, same checksum.
    assert_eq!(codec.inspect(&bytes)?.checksum, report.checksum);

    let rendered = report.to_string();
    assert!(rendered.contains("USERIAL INSPECTOR REPORT"));
    assert!(rendered.contains("(composite)"));

    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["root"]["children"].as_array().map(Vec::len), Some(6));
    Ok(())
}

#[test]
fn inspector_fails_where_decoding_fails() -> userial::Result<()> {
    let codec = Codec::for_type::<Student>()?;
    let bytes = codec.encode(&student())?;
    assert!(matches!(
        codec.inspect(&bytes[..10]),
        Err(UserialError::TruncatedStream { .. })
    ));
    Ok(())
}

// --- Concurrency ---

#[test]
fn batches_match_single_calls() -> userial::Result<()> {
    let codec = Codec::for_type::<Student>()?;
    let students: Vec<Student> = (0..16)
        .map(|i| {
            let mut s = student();
            s.human.age = 18 + i;
            s
        })
        .collect();

    let batch = codec.encode_batch(&students)?;
    for (student, bytes) in students.iter().zip(&batch) {
        assert_eq!(&codec.encode(student)?, bytes);
    }

    let decoded = codec.decode_batch(&batch)?;
    for (student, value) in students.iter().zip(decoded) {
        assert_eq!(&Student::from_value(value)?, student);
    }
    Ok(())
}

#[test]
fn batch_reports_the_first_failure() -> userial::Result<()> {
    let codec = Codec::for_type::<Student>()?;
    let good = codec.encode(&student())?;
    let streams = vec![good.clone(), good[..good.len() / 2].to_vec(), good];
    assert!(codec.decode_batch(&streams).is_err());
    Ok(())
}

#[test]
fn one_codec_many_threads() -> userial::Result<()> {
    let codec = Arc::new(Codec::for_type::<Vec<Student>>()?);
    let expected = codec.encode(&vec![student()])?;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let codec = Arc::clone(&codec);
                scope.spawn(move || -> userial::Result<Vec<Student>> {
                    let bytes = codec.encode(&vec![student()])?;
                    codec.decode_as(&bytes)
                })
            })
            .collect();
        for handle in handles {
            let decoded = handle.join().expect("thread completes");
            assert_eq!(decoded.ok(), Some(vec![student()]));
        }
    });

    assert_eq!(codec.encode(&vec![student()])?, expected);
    Ok(())
}
