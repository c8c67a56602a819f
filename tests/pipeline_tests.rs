use eventseq::cli::run::{run_pipeline, RunError};
use eventseq::config::parse_config;
use eventseq::config::Config;
use eventseq::source::ReaderError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn access_line(ip: &str, time: &str, request: &str) -> String {
    format!(
        "{} - - [04/Dec/2025:{} +0000] \"{}\" 200 512 \"-\" \"curl/8.0\"\n",
        ip, time, request
    )
}

fn write_log(dir: &Path, name: &str, lines: &[(&str, &str)]) {
    let content: String = lines
        .iter()
        .enumerate()
        .map(|(i, (time, request))| access_line(&format!("10.0.0.{}", i + 1), time, request))
        .collect();
    fs::write(dir.join(name), content).unwrap();
}

fn config(input: &Path, output: &Path, parser: &str) -> Config {
    let yaml = format!(
        r#"
input_dir: {input}
output_dir: {output}
log_format: '<IP> - - [<Date>:<Time> <Timezone>] "<Request>" <Status> <Size> "<Referrer>" "<UserAgent>"'
message_field: Request
timestamp:
  template: '<Date>:<Time> <Timezone>'
  format: '%d/%b/%Y:%H:%M:%S %z'
parser:
{parser}
datasets:
  - name: train
    file: train.log
  - name: test_normal
    file: normal.log
  - name: test_abnormal
    file: abnormal.log
"#,
        input = input.display(),
        output = output.display(),
        parser = parser,
    );
    parse_config(&yaml).unwrap()
}

const RAW: &str = "  kind: raw";
const SPELL: &str = "  kind: spell\n  tau: 0.5";

#[test]
fn test_raw_keys_shared_across_datasets() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write_log(
        &input,
        "train.log",
        &[
            ("10:00:05", "GET /a"),
            ("10:00:40", "GET /b"),
            ("10:01:10", "GET /a"),
        ],
    );
    write_log(&input, "normal.log", &[("11:00:00", "GET /b"), ("11:05:30", "GET /a")]);
    write_log(&input, "abnormal.log", &[("12:00:00", "POST /admin"), ("12:00:01", "GET /a")]);

    let summary = run_pipeline(&config(&input, &output, RAW)).unwrap();

    assert_eq!(summary.vocabulary_size, 3);
    assert_eq!(fs::read_to_string(output.join("train")).unwrap(), "1 2 \n1 \n");
    assert_eq!(
        fs::read_to_string(output.join("test_normal")).unwrap(),
        "2 \n\n\n\n\n1 \n"
    );
    assert_eq!(fs::read_to_string(output.join("test_abnormal")).unwrap(), "3 1 \n");

    let normal = &summary.datasets[1];
    assert_eq!(normal.name, "test_normal");
    assert_eq!(normal.records, 2);
    assert_eq!(normal.windows, 6);
    assert_eq!(normal.empty_windows, 4);
    assert_eq!(normal.unknown_events, 0);
}

#[test]
fn test_spell_templates_generalize_across_datasets() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write_log(
        &input,
        "train.log",
        &[
            ("10:00:00", "GET /static/app.js HTTP/1.1"),
            ("10:00:10", "POST /login HTTP/1.1"),
        ],
    );
    write_log(&input, "normal.log", &[("10:00:00", "GET /static/app.css HTTP/1.1")]);
    write_log(&input, "abnormal.log", &[("10:00:00", "POST /login HTTP/1.1")]);

    let summary = run_pipeline(&config(&input, &output, SPELL)).unwrap();

    // the GET lines collapse into one template once the second dataset is read
    assert_eq!(summary.vocabulary_size, 2);
    assert_eq!(fs::read_to_string(output.join("train")).unwrap(), "1 2 \n");
    assert_eq!(fs::read_to_string(output.join("test_normal")).unwrap(), "1 \n");
    assert_eq!(fs::read_to_string(output.join("test_abnormal")).unwrap(), "2 \n");
}

#[test]
fn test_event_conservation_and_window_count() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();

    let times: Vec<String> = (0..120)
        .map(|i| format!("10:{:02}:{:02}", (i / 4) % 60, (i * 15) % 60))
        .collect();
    let lines: Vec<(&str, &str)> = times
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), if i % 2 == 0 { "GET /x" } else { "GET /y" }))
        .collect();
    write_log(&input, "train.log", &lines);
    write_log(&input, "normal.log", &[]);
    write_log(&input, "abnormal.log", &[]);

    let summary = run_pipeline(&config(&input, &output, RAW)).unwrap();

    let content = fs::read_to_string(output.join("train")).unwrap();
    let events: usize = content.lines().map(|l| l.split_whitespace().count()).sum();
    assert_eq!(events, 120);
    assert_eq!(content.lines().count(), 30);
    assert_eq!(summary.datasets[0].windows, 30);
}

#[test]
fn test_empty_dataset_writes_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write_log(&input, "train.log", &[("10:00:00", "GET /a")]);
    write_log(&input, "normal.log", &[]);
    write_log(&input, "abnormal.log", &[]);

    let summary = run_pipeline(&config(&input, &output, RAW)).unwrap();

    assert_eq!(fs::read_to_string(output.join("test_normal")).unwrap(), "");
    assert_eq!(summary.datasets[1].windows, 0);
}

#[test]
fn test_malformed_line_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write_log(&input, "train.log", &[("10:00:00", "GET /a")]);
    let mut normal = access_line("10.0.0.1", "10:00:00", "GET /a");
    normal.push_str("corrupted line\n");
    fs::write(input.join("normal.log"), normal).unwrap();
    write_log(&input, "abnormal.log", &[("10:00:00", "GET /a")]);

    let err = run_pipeline(&config(&input, &output, RAW)).unwrap_err();

    match err {
        RunError::Reader(ReaderError::ParseFailure { dataset, line, .. }) => {
            assert_eq!(dataset, "test_normal");
            assert_eq!(line, 2);
        }
        other => panic!("expected parse failure, got {other}"),
    }
    assert!(!output.join("train").exists());
}

#[test]
fn test_missing_input_file_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();

    write_log(&input, "train.log", &[("10:00:00", "GET /a")]);

    let err = run_pipeline(&config(&input, &output, RAW)).unwrap_err();

    assert!(matches!(err, RunError::Reader(ReaderError::Io { .. })));
    assert!(err.to_string().contains("normal.log"));
}

#[test]
fn test_missing_output_dir_without_create() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();
    write_log(&input, "train.log", &[("10:00:00", "GET /a")]);
    write_log(&input, "normal.log", &[]);
    write_log(&input, "abnormal.log", &[]);

    let mut config = config(&input, &output, RAW);
    config.create_output_dir = false;

    let err = run_pipeline(&config).unwrap_err();
    assert!(matches!(err, RunError::OutputDir { .. }));
}

#[test]
fn test_rerun_replaces_previous_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    fs::create_dir(&input).unwrap();
    write_log(&input, "train.log", &[("10:00:00", "GET /a")]);
    write_log(&input, "normal.log", &[]);
    write_log(&input, "abnormal.log", &[]);

    let config = config(&input, &output, RAW);
    run_pipeline(&config).unwrap();
    run_pipeline(&config).unwrap();

    assert_eq!(fs::read_to_string(output.join("train")).unwrap(), "1 \n");
}
