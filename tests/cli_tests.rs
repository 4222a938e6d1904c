use assert_cmd::Command;
use predicates::str;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args() {
    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.assert().failure().stderr(str::contains("Usage"));
}

fn create_test_gff(path: &Path) {
    let gff_content = "##gff-version 3\n\
seq1\tdante\tDomain\t100\t400\t.\t+\t.\tName=RT,Final_Classification=Class_I/LTR/Ty3_gypsy,Identity=0.82,Similarity=0.91,Relat_Length=0.97,Relat_Interruptions=0.2\n\
seq1\tdante\tDomain\t900\t1100\t.\t-\t.\tName=INT,Final_Classification=Class_I/LTR/Ty1_copia,Identity=0.12,Similarity=0.30,Relat_Length=0.40,Relat_Interruptions=8.0\n";
    fs::write(path, gff_content).unwrap();
}

#[test]
fn test_filter_subcommand() {
    let temp_dir = tempdir().unwrap();
    let input_path = temp_dir.path().join("domains.gff3");
    let output_path = temp_dir.path().join("filtered.gff3");

    create_test_gff(&input_path);

    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.arg("filter")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .stderr(str::contains("Kept 1 of 2 records"));

    let written = fs::read_to_string(&output_path).unwrap();
    assert!(written.starts_with("##gff-version 3\n"));
    assert!(written.contains("Name=RT"));
    assert!(!written.contains("Name=INT"));
}

#[test]
fn test_filter_classification_selector() {
    let temp_dir = tempdir().unwrap();
    let input_path = temp_dir.path().join("domains.gff3");
    let output_path = temp_dir.path().join("filtered.gff3");

    create_test_gff(&input_path);

    // The only record passing the quality thresholds is Ty3_gypsy, so
    // selecting Ty1_copia leaves nothing.
    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.arg("filter")
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .arg("--classification")
        .arg("Ty1_copia")
        .assert()
        .success()
        .stderr(str::contains("Kept 0 of 2 records"));
}

#[test]
fn test_filter_missing_input() {
    let temp_dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.arg("filter")
        .arg(temp_dir.path().join("does_not_exist.gff3"))
        .arg("--output")
        .arg(temp_dir.path().join("out.gff3"))
        .assert()
        .failure();
}

#[test]
fn test_profile_rejects_overlap_not_smaller_than_window() {
    let temp_dir = tempdir().unwrap();
    let query_path = temp_dir.path().join("query.fa");
    let tbl_path = temp_dir.path().join("annot.tsv");
    let cls_path = temp_dir.path().join("reads.cls");

    fs::write(&query_path, ">seq1\nACGTACGTACGT\n").unwrap();
    fs::write(&tbl_path, "1\tLTR/Ty3_gypsy\n").unwrap();
    fs::write(&cls_path, ">CL1 1 read\nread_a\n").unwrap();

    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.arg("profile")
        .arg(&query_path)
        .arg("-d")
        .arg(temp_dir.path().join("db"))
        .arg("-a")
        .arg(&tbl_path)
        .arg("-c")
        .arg(&cls_path)
        .arg("-w")
        .arg("100")
        .arg("-o")
        .arg("100")
        .arg("-q")
        .assert()
        .failure()
        .stderr(str::contains("greater than overlap"));
}

#[test]
fn test_profile_missing_annotation_table() {
    let temp_dir = tempdir().unwrap();
    let query_path = temp_dir.path().join("query.fa");
    fs::write(&query_path, ">seq1\nACGT\n").unwrap();

    let mut cmd = Command::cargo_bin("repcov").unwrap();
    cmd.arg("profile")
        .arg(&query_path)
        .arg("-d")
        .arg(temp_dir.path().join("db"))
        .arg("-a")
        .arg(temp_dir.path().join("missing.tsv"))
        .arg("-c")
        .arg(temp_dir.path().join("missing.cls"))
        .arg("-q")
        .assert()
        .failure()
        .stderr(str::contains("annotation table"));
}
