//! Common code for running regression tests.
use float_cmp::approx_eq;
use itertools::Itertools;
use pathways::cli::RunOpts;
use pathways::cli::example::handle_example_run_command;
use pathways::settings::Settings;
use std::fs::{File, read_dir};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const FLOAT_CMP_TOLERANCE: f64 = 1e-10;

// This file is also built as a test target of its own, where nothing calls this function
/// Run a regression test for an example, comparing its tables against the expected tables
#[allow(dead_code)]
pub fn run_regression_test(example_name: &str) {
    unsafe { std::env::set_var("PATHWAYS_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
    };
    handle_example_run_command(example_name, &opts, Some(Settings::default())).unwrap();

    let test_data_dir = PathBuf::from(format!("tests/data/{example_name}/tables"));
    compare_table_dirs(&tempdir.path().join("tables"), &test_data_dir);
}

/// Compare every expected table against the table of the same name in the output
fn compare_table_dirs(output_dir: &Path, expected_dir: &Path) {
    let output_names = get_csv_file_names(output_dir);
    let expected_names = get_csv_file_names(expected_dir);
    assert!(!expected_names.is_empty());

    let mut errors = Vec::new();
    for file_name in expected_names {
        if output_names.contains(&file_name) {
            compare_lines(output_dir, expected_dir, &file_name, &mut errors);
        } else {
            errors.push(format!("{file_name}: Missing from output"));
        }
    }

    assert!(
        errors.is_empty(),
        "The following errors occurred:\n  * {}",
        errors.join("\n  * ")
    );
}

fn compare_lines(
    output_dir: &Path,
    expected_dir: &Path,
    file_name: &str,
    errors: &mut Vec<String>,
) {
    let lines1 = read_lines(&output_dir.join(file_name));
    let lines2 = read_lines(&expected_dir.join(file_name));

    // Check for different number of lines
    if lines1.len() != lines2.len() {
        errors.push(format!(
            "{file_name}: Different number of lines: {} vs {}",
            lines1.len(),
            lines2.len()
        ));
    }

    // Compare each line
    for (num, (line1, line2)) in lines1.into_iter().zip(lines2).enumerate() {
        if !compare_line(&line1, &line2) {
            errors.push(format!(
                "{file_name}: line {num}:\n    + \"{line1}\"\n    - \"{line2}\""
            ));
        }
    }
}

/// Compare two CSV lines field by field. Numbers are compared with a tolerance.
fn compare_line(line1: &str, line2: &str) -> bool {
    let fields1 = line1.split(',').collect_vec();
    let fields2 = line2.split(',').collect_vec();

    fields1.len() == fields2.len()
        && fields1
            .into_iter()
            .zip(fields2)
            .all(|(f1, f2)| try_compare_floats(f1, f2).unwrap_or_else(|| f1 == f2))
}

/// Parse a string into an `f64`, returning `None` if parsing fails or value is infinite/NaN
fn parse_finite(s: &str) -> Option<f64> {
    s.parse().ok().filter(|f: &f64| f.is_finite())
}

fn try_compare_floats(s1: &str, s2: &str) -> Option<bool> {
    let float1 = parse_finite(s1)?;
    let float2 = parse_finite(s2)?;

    Some(approx_eq!(
        f64,
        float1,
        float2,
        epsilon = FLOAT_CMP_TOLERANCE
    ))
}

/// Get the sorted names of the CSV files in the given folder
fn get_csv_file_names(dir_path: &Path) -> Vec<String> {
    read_dir(dir_path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|file_name| file_name.ends_with(".csv"))
        .sorted()
        .collect()
}

// Read all lines from a file into a `Vec`
fn read_lines(path: &Path) -> Vec<String> {
    let file = File::open(path).unwrap();
    BufReader::new(file).lines().map_while(Result::ok).collect()
}
