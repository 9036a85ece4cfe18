//! Unit tests for writer module.

use sql_seeder::codec::SqlDialect;
use sql_seeder::synth::StatementBatch;
use sql_seeder::writer::BatchWriter;
use std::fs;
use tempfile::TempDir;

fn batch() -> StatementBatch {
    StatementBatch {
        inserts: vec![
            "INSERT INTO \"t\" (\"id\", \"ref\") VALUES (1, NULL)".to_string(),
            "INSERT INTO \"t\" (\"id\", \"ref\") VALUES (2, 1)".to_string(),
        ],
        updates: vec!["UPDATE \"t\" SET \"ref\" = 2 WHERE \"id\" = 1".to_string()],
        sequence_fixes: vec!["SELECT setval('\"t_id_seq\"', 2, true)".to_string()],
    }
}

#[test]
fn test_write_to_file_postgres() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seed.sql");

    let stats = BatchWriter::new(SqlDialect::Postgres)
        .with_transaction(true)
        .write_to(&batch(), Some(&path))
        .unwrap();
    let output = fs::read_to_string(&path).unwrap();

    assert_eq!(stats.statements_written, 4);
    assert_eq!(stats.bytes_written, output.len() as u64);
    assert!(output.contains("-- Statements: 4"));
    assert!(output.contains("SET client_encoding = 'UTF8';"));
    assert!(output.contains("BEGIN;"));
    assert!(output.trim_end().ends_with("COMMIT;"));

    let insert = output.find("VALUES (2, 1);").unwrap();
    let update = output.find("UPDATE \"t\"").unwrap();
    let fix = output.find("SELECT setval").unwrap();
    assert!(insert < update && update < fix);
}

#[test]
fn test_transaction_wrappers_per_dialect() {
    let cases = [
        (SqlDialect::MySql, "START TRANSACTION;", "COMMIT;"),
        (SqlDialect::Sqlite, "BEGIN TRANSACTION;", "COMMIT;"),
        (SqlDialect::Mssql, "BEGIN TRANSACTION;", "COMMIT TRANSACTION;"),
    ];

    for (dialect, begin, commit) in cases {
        let mut out = Vec::new();
        BatchWriter::new(dialect)
            .with_header(false)
            .with_transaction(true)
            .write(&batch(), &mut out)
            .unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.starts_with(begin), "{dialect}: {output}");
        assert!(output.trim_end().ends_with(commit), "{dialect}: {output}");
    }
}

#[test]
fn test_empty_batch() {
    let mut out = Vec::new();
    let stats = BatchWriter::new(SqlDialect::Sqlite)
        .with_header(false)
        .write(&StatementBatch::default(), &mut out)
        .unwrap();
    assert_eq!(stats.statements_written, 0);
    assert!(out.is_empty());
}
