//! End-to-end tests for the sql-seeder command line.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

const MODELS: &str = r#"
models:
  - name: author
    schema: dbo
    fields:
      - { kind: scalar, name: id, type: int, is_id: true, is_generated: true, has_default: true, sequence: { identifier: author_seq } }
      - { kind: scalar, name: name, type: nvarchar(100), is_nullable: false }
  - name: book
    schema: dbo
    fields:
      - { kind: scalar, name: id, type: int, is_id: true }
      - { kind: scalar, name: author_id, type: int, is_nullable: false }
      - { kind: scalar, name: in_print, type: bit, is_nullable: false, has_default: true }
      - { kind: relation, name: author, target: author, from: [author_id], to: [id] }
"#;

const ROWS: &str = r#"{
  "book": [ { "id": 100, "author_id": 1 } ],
  "author": [ { "id": 1, "name": "Zoë" } ]
}"#;

fn sql_seeder_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sql-seeder"))
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("models.yaml"), MODELS).unwrap();
    fs::write(dir.path().join("rows.json"), ROWS).unwrap();
    dir
}

#[test]
fn test_synthesize_with_config_file() {
    let dir = setup();
    fs::write(
        dir.path().join("seed.yaml"),
        "dialect: mssql\nschema: models.yaml\nrows: rows.json\noutput: seed.sql\ntransaction: true\n",
    )
    .unwrap();

    let output = sql_seeder_bin()
        .args(["synthesize", "--config"])
        .arg(dir.path().join("seed.yaml"))
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let sql = fs::read_to_string(dir.path().join("seed.sql")).unwrap();
    assert!(sql.starts_with("-- Seed data"));
    assert!(sql.contains("-- Dialect: mssql"));
    assert!(sql.contains("BEGIN TRANSACTION;"));
    assert!(sql.trim_end().ends_with("COMMIT TRANSACTION;"));

    let author = sql
        .find("SET IDENTITY_INSERT [dbo].[author] ON; INSERT INTO [dbo].[author] ([id], [name]) VALUES (1, N'Zoë'); SET IDENTITY_INSERT [dbo].[author] OFF;")
        .expect("author insert");
    let book = sql
        .find("INSERT INTO [dbo].[book] ([id], [author_id], [in_print]) VALUES (100, 1, DEFAULT);")
        .expect("book insert");
    assert!(author < book);

    assert!(sql.contains("ALTER SEQUENCE [dbo].[author_seq] RESTART WITH"));
}

#[test]
fn test_flags_override_config() {
    let dir = setup();
    fs::write(
        dir.path().join("seed.yaml"),
        "dialect: mssql\nschema: models.yaml\nrows: rows.json\n",
    )
    .unwrap();

    let output = sql_seeder_bin()
        .args(["synthesize", "--no-header", "--no-sequences", "-d", "postgres", "-c"])
        .arg(dir.path().join("seed.yaml"))
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let sql = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        sql,
        "INSERT INTO \"dbo\".\"author\" (\"id\", \"name\") OVERRIDING SYSTEM VALUE VALUES (1, 'Zoë');\n\
         INSERT INTO \"dbo\".\"book\" (\"id\", \"author_id\", \"in_print\") VALUES (100, 1, DEFAULT);\n\n"
    );
}

#[test]
fn test_verbose_reports_to_stderr() {
    let dir = setup();
    let output = sql_seeder_bin()
        .current_dir(dir.path())
        .args([
            "synthesize", "-s", "models.yaml", "-r", "rows.json", "-d", "mysql", "--verbose",
        ])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded 2 models and 2 rows (dialect: mysql)"));
    assert!(stderr.contains("1. author (1 rows)"));
    assert!(stderr.contains("2. book (1 rows)"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SET NAMES utf8mb4;"));
    assert!(stdout.contains("INSERT INTO `dbo`.`author` (`id`, `name`) VALUES (1, 'Zoë')"));
}

#[test]
fn test_circular_dependency_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("models.yaml"),
        r#"
models:
  - name: node
    fields:
      - { kind: scalar, name: id, type: int, is_id: true }
      - { kind: scalar, name: ref_id, type: int, is_nullable: false }
      - { kind: relation, name: ref, target: node, from: [ref_id], to: [id] }
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("rows.json"),
        r#"{ "node": [ { "id": 1, "ref_id": 2 }, { "id": 2, "ref_id": 1 } ] }"#,
    )
    .unwrap();
    let out = dir.path().join("seed.sql");

    let output = sql_seeder_bin()
        .current_dir(dir.path())
        .args(["synthesize", "-s", "models.yaml", "-r", "rows.json", "-o"])
        .arg(&out)
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("circular dependency"));
    assert!(!out.exists());
}

#[test]
fn test_missing_input_file() {
    let dir = setup();
    let output = sql_seeder_bin()
        .current_dir(dir.path())
        .args(["synthesize", "-s", "models.yaml", "-r", "missing.json"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("input file does not exist"));
}

#[test]
fn test_order_reports_cycles() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("models.yaml"),
        r#"
models:
  - name: team
    fields:
      - { kind: scalar, name: id, type: int, is_id: true }
      - { kind: scalar, name: captain_id, type: int }
      - { kind: relation, name: captain, target: player, from: [captain_id], to: [id], is_nullable: true }
  - name: player
    fields:
      - { kind: scalar, name: id, type: int, is_id: true }
      - { kind: scalar, name: team_id, type: int, is_nullable: false }
      - { kind: relation, name: team, target: team, from: [team_id], to: [id] }
"#,
    )
    .unwrap();

    let output = sql_seeder_bin()
        .current_dir(dir.path())
        .args(["order", "models.yaml"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. player  (cycle)"));
    assert!(stdout.contains("2. team"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Circular dependencies detected"));
}

#[test]
fn test_completions() {
    let output = sql_seeder_bin()
        .args(["completions", "bash"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sql-seeder"));
}
