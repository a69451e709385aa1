//! End-to-end checks of the `vtshim` binary writing into pipes.

use std::env;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;

fn scratch_home() -> PathBuf {
    let home = env::temp_dir().join(format!("vtshim-test-{}", std::process::id()));
    let _ = std::fs::create_dir_all(&home);
    home
}

fn spawn_vtshim() -> Child {
    let home = scratch_home();
    Command::new(env!("CARGO_BIN_EXE_vtshim"))
        .env("HOME", &home)
        .env("USERPROFILE", &home)
        .env_remove("VTSHIM_SKIP_ANSI_EMULATION")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn vtshim")
}

#[test]
fn test_closed_reader_exits_like_sigpipe() {
    let mut child = spawn_vtshim();

    let mut stdin = child.stdin.take().unwrap();
    let feeder = thread::spawn(move || {
        let line = b"hello\n";
        // Stops once vtshim exits and its stdin closes
        for _ in 0..400_000 {
            if stdin.write_all(line).is_err() {
                break;
            }
        }
    });

    let mut stdout = child.stdout.take().unwrap();
    let mut first = [0u8; 1];
    stdout.read_exact(&mut first).unwrap();
    assert_eq!(first[0], b'h');
    drop(stdout);

    let status = child.wait().unwrap();
    let _ = feeder.join();
    assert_eq!(status.code(), Some(141));
}

#[test]
fn test_pipe_output_is_passed_through() {
    let mut child = spawn_vtshim();

    let input = b"\x1b[31mred\x1b[0m caf\xe9\n".to_vec();
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(&input).unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, input);
}
