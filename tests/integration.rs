use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

const CONFIG: &str = "\
[input]
raw_file = \"Twist__twist.xvg\"

[channels]
n_channels = 8
first = 3
last = 6

[blocks]
boundaries = [ 0.0, 50000.0, 100000.0, 150000.0, 200000.0,]
";

fn write_trajectory(traj_dir: &Path, base_twist: f64) {
    fs::create_dir_all(traj_dir).expect("failed to create trajectory directory");
    fs::write(traj_dir.join("config.toml"), CONFIG).expect("failed to write config file");

    let mut raw = String::new()
        + "# This file was created by a twist analysis tool\n"
        + "@    title \"Twist\"\n"
        + "@    xaxis  label \"Time (ps)\"\n";
    for i_frame in 0..=400 {
        let time = i_frame as f64 * 500.0;
        raw += &format!("{time:12.3}");
        for i_chan in 0..8 {
            let val = match (i_frame, i_chan) {
                // Frame without any valid internal step.
                (7, _) => 999.0,
                (_, 0 | 7) => 150.0,
                (_, 3) if i_frame % 5 == 0 => -12.0,
                _ => base_twist + ((i_frame * 7 + i_chan * 3) % 11) as f64 * 0.1,
            };
            raw += &format!(" {val:8.3}");
        }
        raw += "\n";
    }
    fs::write(traj_dir.join("Twist__twist.xvg"), raw).expect("failed to write raw table");
}

fn run_bin(args: &[&str]) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_twistblock"));

    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn run_bin_ok(args: &[&str]) {
    let output = run_bin(args);

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let seq_a = test_dir.join("seq-a");
    let seq_b = test_dir.join("seq-b");
    write_trajectory(&seq_a, 34.6);
    write_trajectory(&seq_b, 35.4);

    let seq_a_str = seq_a.to_str().expect("failed to convert directory to string");
    let seq_b_str = seq_b.to_str().expect("failed to convert directory to string");
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    run_bin_ok(&["reduce", "--traj-dir", seq_a_str]);

    let series = fs::read_to_string(seq_a.join("twist_internal_avg.xvg"))
        .expect("failed to read reduced series");
    let data_lines: Vec<&str> = series.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(data_lines.len(), 401);
    assert!(data_lines[7].trim_end().ends_with("nan"));
    assert!(series.contains("Internal steps 3-6 of 8 (excluding steps 1-2 and 7-8)"));

    run_bin_ok(&["block", "--traj-dir", seq_a_str]);
    run_bin_ok(&["analyze", "--traj-dir", seq_b_str]);

    for traj_dir in [&seq_a, &seq_b] {
        let block_means = fs::read_to_string(traj_dir.join("block_averages_for_plotting.dat"))
            .expect("failed to read block means");
        assert_eq!(block_means.lines().count(), 4);
        for line in block_means.lines() {
            let mean: f64 = line.parse().expect("failed to parse block mean");
            assert!((34.0..36.5).contains(&mean), "unexpected block mean {mean}");
        }
        assert!(traj_dir.join("results.msgpack").is_file());
    }

    run_bin_ok(&["combine", "--root", test_dir_str]);
    assert!(test_dir.join("ensemble.msgpack").is_file());

    run_bin_ok(&["clean", "--traj-dir", seq_a_str]);
    assert!(!seq_a.join("twist_internal_avg.xvg").exists());
    assert!(!seq_a.join("results.msgpack").exists());
    assert!(seq_a.join("Twist__twist.xvg").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn rejects_non_increasing_boundaries() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("bad_boundaries");

    fs::remove_dir_all(&test_dir).ok();
    write_trajectory(&test_dir, 35.0);
    let config = CONFIG.replace("100000.0, 150000.0", "150000.0, 100000.0");
    fs::write(test_dir.join("config.toml"), config).expect("failed to write config file");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");
    let output = run_bin(&["analyze", "--traj-dir", test_dir_str]);
    assert!(!output.status.success());

    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_str.contains("strictly increasing"), "stderr:\n{stderr_str}");

    fs::remove_dir_all(&test_dir).ok();
}
