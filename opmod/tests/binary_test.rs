//! The built binary: one JSON object on stdout, exit code from the report

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use std::io::Write;
    use std::path::Path;
    use std::process::{Command, Output, Stdio};

    const OPMOD: &str = env!("CARGO_BIN_EXE_opmod");

    fn report(output: &Output) -> Value {
        let stdout = String::from_utf8(output.stdout.clone()).unwrap();
        assert_eq!(stdout.trim().lines().count(), 1, "stdout: {}", stdout);
        serde_json::from_str(stdout.trim()).unwrap()
    }

    fn command(program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("OPMOD_ENV_FILE", "/nonexistent/environment")
            .env_remove("OPMOD_LOG");
        cmd
    }

    #[test]
    fn test_symlink_named_after_module() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("mktemp");
        std::os::unix::fs::symlink(OPMOD, &link).unwrap();

        let args_file = dir.path().join("args");
        std::fs::write(
            &args_file,
            format!("path={} prefix=grid.", dir.path().display()),
        )
        .unwrap();

        let output = command(&link).arg(&args_file).output().unwrap();
        assert_eq!(output.status.code(), Some(0));

        let body = report(&output);
        assert_eq!(body["changed"], true);
        let created = body["path"].as_str().unwrap();
        assert!(Path::new(created).is_dir());
        assert!(created.starts_with(dir.path().join("grid.").to_str().unwrap()));
    }

    #[test]
    fn test_arguments_from_stdin() {
        let mut resolv = tempfile::NamedTempFile::new().unwrap();
        resolv.write_all(b"nameserver 10.0.0.53\n").unwrap();

        let mut child = command(Path::new(OPMOD))
            .arg("nameservers_facts")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let args = serde_json::json!({"ANSIBLE_MODULE_ARGS": {"path": resolv.path()}});
        child
            .stdin
            .take()
            .unwrap()
            .write_all(args.to_string().as_bytes())
            .unwrap();
        let output = child.wait_with_output().unwrap();

        assert_eq!(output.status.code(), Some(0));
        let body = report(&output);
        assert_eq!(body["ansible_facts"]["ansible_nameservers"][0], "10.0.0.53");
    }

    #[test]
    fn test_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args");
        std::fs::write(&args_file, "path=/nonexistent/resolv.conf").unwrap();

        let output = command(Path::new(OPMOD))
            .args(["nameservers_facts", args_file.to_str().unwrap(), "-v"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let body = report(&output);
        assert_eq!(body["failed"], true);
        assert!(body["msg"].as_str().unwrap().starts_with("Unable to read /nonexistent/resolv.conf"));
    }
}
