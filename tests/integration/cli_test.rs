use anyhow::Result;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const SCHEMA: &str = "name:string,score:int";

fn heapdb(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_heapdb")).args(args).output()?)
}

// Run a subcommand against `file` with the test schema and return stdout
fn run(subcommand: &str, file: &Path, extra: &[&str]) -> Result<String> {
    let file = file.to_string_lossy().into_owned();
    let mut args = vec![subcommand, file.as_str(), "--schema", SCHEMA];
    args.extend_from_slice(extra);

    let output = heapdb(&args)?;
    assert!(
        output.status.success(),
        "heapdb {} failed: {}",
        subcommand,
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8(output.stdout)?)
}

fn insert_rows(file: &Path, rows: &[&str]) -> Result<Vec<String>> {
    rows.iter()
        .map(|values| run("insert", file, &["--values", values]))
        .collect()
}

#[test]
fn test_cli_create_and_inspect() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("scores.dat");

    let output = run("create", &file, &["--pages", "2"])?;
    assert!(output.contains("now holds 2 pages"), "unexpected output: {}", output);

    insert_rows(&file, &["a,1", "b,5", "a,2"])?;

    let output = run("inspect", &file, &["--page", "0"])?;
    assert!(output.contains("Slots:         30"), "unexpected output: {}", output);
    assert!(output.contains("Used slots:    3"), "unexpected output: {}", output);
    assert!(output.contains("Header bytes:  4"), "unexpected output: {}", output);
    assert!(output.contains("Bitmap:        07000000"), "unexpected output: {}", output);
    Ok(())
}

#[test]
fn test_cli_insert_and_dump() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("scores.dat");

    let inserted = insert_rows(&file, &["a,1", "b,5", "a,2"])?;
    assert_eq!(inserted[0].trim(), "Inserted record at table#1/page#0/slot#0");
    assert_eq!(inserted[2].trim(), "Inserted record at table#1/page#0/slot#2");

    let output = run("dump", &file, &[])?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "table#1/page#0/slot#0\ta\t1",
            "table#1/page#0/slot#1\tb\t5",
            "table#1/page#0/slot#2\ta\t2",
        ]
    );
    Ok(())
}

#[test]
fn test_cli_grouped_aggregate() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("scores.dat");
    insert_rows(&file, &["a,1", "b,5", "a,2"])?;

    let output = run("aggregate", &file, &["--op", "sum", "--field", "score", "--group-by", "name"])?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines, vec!["name\tsum score", "a\t3", "b\t5"]);

    let output = run("aggregate", &file, &["--op", "avg", "--field", "score"])?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines, vec!["avg score", "2.6666666666666665"]);
    Ok(())
}

#[test]
fn test_cli_rejects_bad_input() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("scores.dat");
    let file = path.to_string_lossy().into_owned();

    // Wrong number of values
    let output = heapdb(&["insert", file.as_str(), "--schema", SCHEMA, "--values", "a"])?;
    assert!(!output.status.success());

    // SUM is not defined over a STRING field
    insert_rows(&path, &["a,1"])?;
    let output = heapdb(&["aggregate", file.as_str(), "--schema", SCHEMA, "--op", "sum", "--field", "name"])?;
    assert!(!output.status.success());

    // Unknown field
    let output = heapdb(&["aggregate", file.as_str(), "--schema", SCHEMA, "--op", "count", "--field", "missing"])?;
    assert!(!output.status.success());
    Ok(())
}
