mod common;

use std::{fs, process::Command};

use common::*;

fn position_chart() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_position-chart"));
    cmd.env_remove("POSITION_CHART_CONFIG")
        .env_remove("KLINE_DATA_DIR")
        .env_remove("BINANCE_FAPI_URL");
    cmd
}

#[test]
fn missing_arguments_print_usage_and_fail() {
    let output = position_chart().arg("only_one.json").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[test]
fn help_exits_cleanly() {
    let output = position_chart().arg("--help").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("<TRADES_PATH>"));
}

#[test]
fn invalid_config_file_fails_before_any_work() {
    let ws = workspace("BTCUSDT_4h");
    let config = ws.data_dir.with_file_name("chart.toml");
    fs::write(&config, "page_size = 5\n").unwrap();

    let output = position_chart()
        .arg(&ws.trades_path)
        .arg(&ws.output_path)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loading configuration"), "{stderr}");
    assert!(!ws.output_path.exists());
}

#[test]
fn unrecognised_trades_path_fails() {
    let ws = workspace("no-symbol-here");

    let output = position_chart()
        .arg(&ws.trades_path)
        .arg(&ws.output_path)
        .env("KLINE_DATA_DIR", &ws.data_dir)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<symbol>_<timeframe>"), "{stderr}");
}
