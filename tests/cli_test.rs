use std::fs;
use std::path::Path;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

/// The binary with a settings path that does not exist, so defaults apply
fn ftk(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ftk").unwrap();
    cmd.arg("-c").arg(dir.join("missing-config.yaml"));
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        Command::cargo_bin("ftk")
            .unwrap()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_formats_for_one_source() {
        let dir = tempdir().unwrap();
        ftk(dir.path())
            .args(["formats", "csv"])
            .assert()
            .success()
            .stdout(predicate::str::contains("csv → pdf, txt, png, docx, xlsx, json"));
    }

    #[test]
    fn test_convert_csv_to_json() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        fs::write(&input, "name,age\nAsha,30\n").unwrap();

        ftk(dir.path())
            .arg("convert")
            .arg(&input)
            .args(["--to", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Converted successfully"));

        let json = fs::read_to_string(dir.path().join("people.json")).unwrap();
        assert!(json.contains("\"name\": \"Asha\""));
    }

    #[test]
    fn test_convert_with_explicit_source_and_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("export.data");
        fs::write(&input, "a|b\n1|2\n").unwrap();
        let output = dir.path().join("out/table.csv");

        ftk(dir.path())
            .arg("convert")
            .arg(&input)
            .args(["-f", "txt", "-t", "csv", "--delimiter", "|", "-o"])
            .arg(&output)
            .assert()
            .success();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "\u{feff}a,b\n1,2\n"
        );
    }

    #[test]
    fn test_unsupported_conversion_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        fs::write(&input, "a\n").unwrap();

        ftk(dir.path())
            .arg("convert")
            .arg(&input)
            .args(["--to", "zip"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Conversion not supported: csv → zip"));
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempdir().unwrap();
        ftk(dir.path())
            .arg("convert")
            .arg(dir.path().join("nope.csv"))
            .args(["--to", "json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Input file not found"));
    }

    #[test]
    fn test_unknown_extension_needs_from() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("blob.bin");
        fs::write(&input, "x").unwrap();

        ftk(dir.path())
            .arg("convert")
            .arg(&input)
            .args(["--to", "json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("pass --from"));
    }

    #[test]
    fn test_bad_delimiter_is_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, "a b\n").unwrap();

        ftk(dir.path())
            .arg("convert")
            .arg(&input)
            .args(["--to", "csv", "--delimiter", ";;"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("single character"));
    }

    #[test]
    fn test_translate_missing_input_fails() {
        let dir = tempdir().unwrap();
        ftk(dir.path())
            .arg("translate")
            .arg(dir.path().join("nope.txt"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Input file not found"));
    }

    #[test]
    fn test_menu_exits_on_choice() {
        let dir = tempdir().unwrap();
        ftk(dir.path())
            .write_stdin("3\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("===== File Toolkit ====="))
            .stdout(predicate::str::contains("Goodbye!"));
    }

    #[test]
    fn test_menu_exits_on_eof() {
        let dir = tempdir().unwrap();
        ftk(dir.path())
            .write_stdin("")
            .assert()
            .success()
            .stdout(predicate::str::contains("Session summary"));
    }

    #[test]
    fn test_menu_image_conversion_finishes() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("long.csv");
        let rows: Vec<String> = (1..=81).map(|n| format!("{n},row {n}")).collect();
        fs::write(&input, format!("id,name\n{}\n", rows.join("\n"))).unwrap();

        ftk(dir.path())
            .write_stdin(format!("1\n{}\n\n3\n\nn\n3\n", input.display()))
            .timeout(Duration::from_secs(60))
            .assert()
            .success()
            .stdout(predicate::str::contains("1 conversions attempted"));
    }

    #[test]
    fn test_convert_deletes_output_after_delay() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        fs::write(&input, "name,age\nAsha,30\n").unwrap();

        ftk(dir.path())
            .arg("convert")
            .arg(&input)
            .args(["--to", "json", "--delete-after", "1"])
            .timeout(Duration::from_secs(60))
            .assert()
            .success()
            .stdout(predicate::str::contains("Output will be deleted in 1s"));

        assert!(!dir.path().join("people.json").exists());
    }
}
