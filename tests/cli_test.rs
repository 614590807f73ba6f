use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn sample_csv() -> tempfile::NamedTempFile {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "product_code, destination_code, amount, pin").unwrap();
    writeln!(csv, "S5, 08123456789, 5000, 1234").unwrap();
    writeln!(csv, "S10, 08198765432, 10000, 1234").unwrap();
    csv
}

#[test]
fn test_import_reports_inserted_count() {
    let csv = sample_csv();

    let mut cmd = Command::new(cargo_bin!("txdispatch"));
    cmd.arg("import").arg(csv.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("imported 2 transactions"));
}

#[test]
fn test_import_skips_malformed_lines() {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "product_code, destination_code, amount, pin").unwrap();
    writeln!(csv, "S5, 08123456789, 5000, 1234").unwrap();
    writeln!(csv, "S10, 0819").unwrap();
    writeln!(csv, "S25, 08111111111, 25000, 1234").unwrap();

    let mut cmd = Command::new(cargo_bin!("txdispatch"));
    cmd.arg("import").arg(csv.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading draft"))
        .stdout(predicate::str::contains("imported 2 transactions"));
}

#[test]
fn test_send_rejects_delay_below_minimum() {
    let csv = sample_csv();

    let mut cmd = Command::new(cargo_bin!("txdispatch"));
    cmd.arg("send")
        .arg("--channel")
        .arg("phone")
        .arg("--destination")
        .arg("628123456789")
        .arg("--delay-ms")
        .arg("499")
        .arg("--input")
        .arg(csv.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("delay_ms must be at least 500"));
}

#[test]
fn test_list_writes_csv_header() {
    let mut cmd = Command::new(cargo_bin!("txdispatch"));
    cmd.arg("list");

    cmd.assert().success().stdout(predicate::str::contains(
        "id,product_code,destination_code,amount,pin,status,sent_to,sent_at,error_message",
    ));
}
