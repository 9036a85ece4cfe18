//! Writes a synthesized statement batch as an SQL script.

use crate::codec::SqlDialect;
use crate::synth::StatementBatch;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Statistics from writing a batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub statements_written: usize,
    pub bytes_written: u64,
}

/// SQL script writer for a statement batch
pub struct BatchWriter {
    dialect: SqlDialect,
    add_header: bool,
    add_transaction: bool,
}

impl BatchWriter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            add_header: true,
            add_transaction: false,
        }
    }

    pub fn with_header(mut self, add_header: bool) -> Self {
        self.add_header = add_header;
        self
    }

    pub fn with_transaction(mut self, add_transaction: bool) -> Self {
        self.add_transaction = add_transaction;
        self
    }

    /// Write the batch to a file, or stdout when `path` is `None`
    pub fn write_to(&self, batch: &StatementBatch, path: Option<&Path>) -> io::Result<WriteStats> {
        match path {
            Some(p) => {
                let file = File::create(p)?;
                self.write(batch, BufWriter::with_capacity(WRITER_BUFFER_SIZE, file))
            }
            None => self.write(batch, BufWriter::new(io::stdout().lock())),
        }
    }

    pub fn write<W: Write>(&self, batch: &StatementBatch, mut w: W) -> io::Result<WriteStats> {
        let mut out = CountingWriter::new(&mut w);

        if self.add_header {
            self.write_header(&mut out, batch)?;
        }
        if self.add_transaction {
            out.write_all(self.transaction_start().as_bytes())?;
        }

        let mut statements_written = 0;
        for (section, statements) in [
            ("Inserts", &batch.inserts),
            ("Deferred relation patches", &batch.updates),
            ("Sequence reconciliation", &batch.sequence_fixes),
        ] {
            if statements.is_empty() {
                continue;
            }
            if self.add_header {
                writeln!(out, "-- {}", section)?;
            }
            for stmt in statements {
                writeln!(out, "{};", stmt)?;
                statements_written += 1;
            }
            writeln!(out)?;
        }

        if self.add_transaction {
            out.write_all(self.transaction_end().as_bytes())?;
        }
        out.flush()?;

        Ok(WriteStats {
            statements_written,
            bytes_written: out.count,
        })
    }

    fn write_header<W: Write>(&self, w: &mut W, batch: &StatementBatch) -> io::Result<()> {
        writeln!(w, "-- Seed data")?;
        writeln!(w, "-- Generated by sql-seeder")?;
        writeln!(w, "-- Statements: {}", batch.len())?;
        writeln!(w, "-- Dialect: {}", self.dialect)?;
        writeln!(w)?;

        match self.dialect {
            SqlDialect::MySql => writeln!(w, "SET NAMES utf8mb4;")?,
            SqlDialect::Postgres => writeln!(w, "SET client_encoding = 'UTF8';")?,
            SqlDialect::Sqlite => writeln!(w, "PRAGMA foreign_keys = ON;")?,
            SqlDialect::Mssql => writeln!(w, "SET NOCOUNT ON;")?,
        }
        writeln!(w)?;

        Ok(())
    }

    fn transaction_start(&self) -> &'static str {
        match self.dialect {
            SqlDialect::MySql => "START TRANSACTION;\n\n",
            SqlDialect::Postgres => "BEGIN;\n\n",
            SqlDialect::Sqlite => "BEGIN TRANSACTION;\n\n",
            SqlDialect::Mssql => "BEGIN TRANSACTION;\n\n",
        }
    }

    fn transaction_end(&self) -> &'static str {
        match self.dialect {
            SqlDialect::Mssql => "COMMIT TRANSACTION;\n",
            _ => "COMMIT;\n",
        }
    }
}

/// Byte-counting pass-through writer
struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> StatementBatch {
        StatementBatch {
            inserts: vec!["INSERT INTO \"a\" (\"id\") VALUES (1)".to_string()],
            updates: vec!["UPDATE \"a\" SET \"ref\" = 1 WHERE \"id\" = 1".to_string()],
            sequence_fixes: vec![],
        }
    }

    #[test]
    fn test_write_plain() {
        let mut out = Vec::new();
        let stats = BatchWriter::new(SqlDialect::Postgres)
            .with_header(false)
            .write(&batch(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(stats.statements_written, 2);
        assert_eq!(stats.bytes_written, text.len() as u64);
        assert_eq!(
            text,
            "INSERT INTO \"a\" (\"id\") VALUES (1);\n\nUPDATE \"a\" SET \"ref\" = 1 WHERE \"id\" = 1;\n\n"
        );
    }

    #[test]
    fn test_write_transaction_mysql() {
        let mut out = Vec::new();
        BatchWriter::new(SqlDialect::MySql)
            .with_transaction(true)
            .write(&batch(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("SET NAMES utf8mb4;"));
        assert!(text.contains("START TRANSACTION;"));
        assert!(text.trim_end().ends_with("COMMIT;"));
        assert!(text.contains("-- Deferred relation patches"));
        assert!(!text.contains("-- Sequence reconciliation"));
    }
}
