//! Integration tests for depstash

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn depstash() -> Command {
        cargo_bin_cmd!("depstash")
    }

    #[test]
    fn help_displays() {
        depstash()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache key"));
    }

    #[test]
    fn version_displays() {
        depstash()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depstash"));
    }

    #[test]
    fn keys_plain_with_requirements() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("requirements.txt"), "requests==2.31.0\n").unwrap();

        depstash()
            .current_dir(project.path())
            .env("RUNNER_OS", "Linux")
            .args([
                "keys",
                "--no-local",
                "--python-version",
                "3.11.4",
                "--project",
                ".",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("depstash-Linux-"))
            .stdout(predicate::str::contains("-python-3.11.4-pip"));
    }

    #[test]
    fn keys_json_has_bundle_fields() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("requirements.txt"), "flask\n").unwrap();

        depstash()
            .current_dir(project.path())
            .args([
                "keys",
                "--no-local",
                "--python-version",
                "3.11.4",
                "--project",
                ".",
                "--format",
                "json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("primary_key"))
            .stdout(predicate::str::contains("restore_keys"));
    }

    #[test]
    fn keys_github_format() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("requirements.txt"), "flask\n").unwrap();

        depstash()
            .current_dir(project.path())
            .args([
                "keys",
                "--no-local",
                "--python-version",
                "3.11.4",
                "--project",
                ".",
                "--format",
                "github",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("primary-key="))
            .stdout(predicate::str::contains("restore-keys="));
    }

    #[test]
    fn keys_without_dependency_files_still_yields_key() {
        let project = TempDir::new().unwrap();

        depstash()
            .current_dir(project.path())
            .args([
                "keys",
                "--no-local",
                "--python-version",
                "3.11.4",
                "--project",
                ".",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("-pip-"));
    }

    #[test]
    fn keys_reads_local_config_overlay() {
        let project = TempDir::new().unwrap();
        fs::create_dir_all(project.path().join("svc")).unwrap();
        fs::write(project.path().join("svc/requirements.txt"), "requests\n").unwrap();
        fs::write(
            project.path().join(".depstash.toml"),
            "[python]\nversion = \"3.12.1\"\n",
        )
        .unwrap();

        depstash()
            .current_dir(project.path())
            .args(["keys", "--project", "."])
            .assert()
            .success()
            .stdout(predicate::str::contains("-python-3.12.1-pip"));
    }

    #[test]
    fn keys_rejects_unknown_manager() {
        let project = TempDir::new().unwrap();
        let config = project.path().join("npm.toml");
        fs::write(&config, "[cache]\nmanager = \"npm\"\n").unwrap();

        depstash()
            .current_dir(project.path())
            .args([
                "keys",
                "--no-local",
                "--python-version",
                "3.11.4",
                "--config",
            ])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported package manager"));
    }

    #[test]
    fn config_path() {
        depstash()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        depstash()
            .current_dir(dir.path())
            .args(["config", "show", "--no-local"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"));
    }

    #[test]
    fn setup_check_runs() {
        depstash()
            .args(["setup", "--check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("depstash Setup"));
    }

    #[test]
    fn status_runs() {
        depstash()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Toolchain Status"));
    }

    #[test]
    fn dirs_help() {
        depstash()
            .args(["dirs", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache directories"));
    }
}
