use jshell_core::{HostConfig, HostError, ScriptHost, STATUS_OK, STATUS_SCRIPT_ERROR};
use std::path::Path;

fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("script fixture");
    path
}

fn host_in(dir: &Path) -> ScriptHost {
    ScriptHost::with_base_dir(HostConfig::default(), dir).expect("host construction")
}

#[test]
fn completed_script_returns_status_ok() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = write_script(dir.path(), "ok.js", "var x = 1 + 1;");

    let mut host = host_in(dir.path());
    let status = host.run_file(&script).expect("script should run");
    assert_eq!(status, STATUS_OK);
}

#[test]
fn quit_status_is_propagated() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = write_script(dir.path(), "quit.js", "Quit(3); Println('unreachable');");

    let mut host = host_in(dir.path());
    let status = host.run_file(&script).expect("script should run");
    assert_eq!(status, 3);
}

#[test]
fn quit_wins_even_when_caught() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = write_script(
        dir.path(),
        "caught.js",
        "try { Quit(7); } catch (e) { }",
    );

    let mut host = host_in(dir.path());
    let status = host.run_file(&script).expect("script should run");
    assert_eq!(status, 7);
}

#[test]
fn uncaught_exception_maps_to_error_status() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = write_script(dir.path(), "boom.js", "throw new Error('boom');");

    let mut host = host_in(dir.path());
    let status = host.run_file(&script).expect("host itself should not fail");
    assert_eq!(status, STATUS_SCRIPT_ERROR);
}

#[test]
fn interpreter_line_is_skipped() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = write_script(
        dir.path(),
        "hashbang.js",
        "#!/usr/bin/env jshell\nvar x = 2;\n",
    );

    let mut host = host_in(dir.path());
    let status = host.run_file(&script).expect("script should run");
    assert_eq!(status, STATUS_OK);
}

#[test]
fn missing_script_is_a_host_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut host = host_in(dir.path());

    let err = host
        .run_file(dir.path().join("ghost.js"))
        .expect_err("missing file must fail");
    assert!(matches!(err, HostError::ScriptRead { .. }));
    assert!(err.to_string().contains("ghost.js"));
}

#[test]
fn eval_exposes_builtin_globals() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut host = host_in(dir.path());

    let value = host
        .eval("SHELL_VERSION > 0 && typeof Print === 'function'")
        .expect("eval should succeed");
    assert!(value.to_boolean());
}

#[test]
fn eval_errors_are_stringified() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut host = host_in(dir.path());

    let message = host.eval("nope(").expect_err("syntax error must fail");
    assert!(!message.is_empty());
}

#[test]
fn script_args_reach_the_script() {
    let dir = tempfile::tempdir().expect("temp dir");
    let script = write_script(
        dir.path(),
        "args.js",
        "if (ARGS.join(' ') !== 'in.txt out.txt') { throw new Error('bad args'); }",
    );

    let config = HostConfig {
        script_args: vec!["in.txt".to_string(), "out.txt".to_string()],
        ..HostConfig::default()
    };
    let mut host = ScriptHost::with_base_dir(config, dir.path()).expect("host construction");
    let status = host.run_file(&script).expect("script should run");
    assert_eq!(status, STATUS_OK);
}

#[test]
fn libraries_register_through_the_host() {
    let dir = tempfile::tempdir().expect("temp dir");
    let host = host_in(dir.path());

    assert!(!host.has_library("curses"));
    host.register_library("curses", Box::new(0u8), None)
        .expect("registration");
    assert!(host.has_library("curses"));

    let err = host
        .register_library("curses", Box::new(1u8), None)
        .expect_err("duplicate must be rejected");
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn network_flag_reaches_scripts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = HostConfig {
        no_network: true,
        ..HostConfig::default()
    };
    let mut host = ScriptHost::with_base_dir(config, dir.path()).expect("host construction");

    let value = host.eval("NETWORK_AVAILABLE").expect("eval");
    assert!(!value.to_boolean());
}
