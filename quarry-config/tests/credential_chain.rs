use quarry_common::observability::{LogConfig, init_logging};
use quarry_config::credentials::{CREDENTIAL_ENV, CREDENTIAL_FILE};
use quarry_config::{Credential, CredentialResolver, EnvSource, FileSource};
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn init_tracing() {
    let _ = init_logging(LogConfig {
        app_name: "quarry-config-tests",
        log_dir: Some(std::env::temp_dir().join("quarry-config-tests")),
        default_filter: "trace",
        ..LogConfig::default()
    });
}

/// Switches the working directory for the lifetime of the guard.
struct CwdGuard {
    previous: PathBuf,
}

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().expect("current dir");
        std::env::set_current_dir(dir).expect("enter temp dir");
        Self { previous }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

/// Layout: `<tmp>/work` is the working directory and
/// `<tmp>/install/crate/src/credentials.rs` the module file, so `<tmp>/install`
/// is the install-relative root.
struct Layout {
    _tmp: TempDir,
    work: PathBuf,
    install_root: PathBuf,
    module_file: PathBuf,
}

fn layout() -> Layout {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    let install_root = tmp.path().join("install");
    let module_dir = install_root.join("crate").join("src");
    let module_file = module_dir.join("credentials.rs");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(&module_file, "").unwrap();
    Layout {
        _tmp: tmp,
        work,
        install_root,
        module_file,
    }
}

fn chain_for(l: &Layout) -> CredentialResolver {
    CredentialResolver::new(vec![
        Box::new(EnvSource::new(CREDENTIAL_ENV)),
        Box::new(FileSource::working_dir(CREDENTIAL_FILE)),
        Box::new(FileSource::install_relative_to(&l.module_file, CREDENTIAL_FILE)),
    ])
}

#[test]
#[serial]
fn environment_wins_when_every_source_is_populated() {
    init_tracing();
    let l = layout();
    fs::write(l.work.join(CREDENTIAL_FILE), "from-cwd\n").unwrap();
    fs::write(l.install_root.join(CREDENTIAL_FILE), "from-install\n").unwrap();
    let _cwd = CwdGuard::enter(&l.work);

    temp_env::with_var(CREDENTIAL_ENV, Some("from-env"), || {
        let got = chain_for(&l).resolve().unwrap();
        assert_eq!(got, Some(Credential::new("from-env")));
    });
}

#[test]
#[serial]
fn working_directory_file_is_trimmed() {
    init_tracing();
    let l = layout();
    fs::write(l.work.join(CREDENTIAL_FILE), "abc123\n").unwrap();
    let _cwd = CwdGuard::enter(&l.work);

    temp_env::with_var_unset(CREDENTIAL_ENV, || {
        let got = CredentialResolver::standard().resolve().unwrap();
        assert_eq!(got.as_ref().map(Credential::expose), Some("abc123"));
    });
}

#[test]
#[serial]
fn working_directory_beats_install_root() {
    init_tracing();
    let l = layout();
    fs::write(l.work.join(CREDENTIAL_FILE), "from-cwd").unwrap();
    fs::write(l.install_root.join(CREDENTIAL_FILE), "from-install").unwrap();
    let _cwd = CwdGuard::enter(&l.work);

    temp_env::with_var_unset(CREDENTIAL_ENV, || {
        let got = chain_for(&l).resolve().unwrap();
        assert_eq!(got, Some(Credential::new("from-cwd")));
    });
}

#[test]
#[serial]
fn install_root_file_is_the_last_resort() {
    init_tracing();
    let l = layout();
    fs::write(l.install_root.join(CREDENTIAL_FILE), "  xyz789  ").unwrap();
    let _cwd = CwdGuard::enter(&l.work);

    temp_env::with_var_unset(CREDENTIAL_ENV, || {
        let got = chain_for(&l).resolve().unwrap();
        assert_eq!(got, Some(Credential::new("xyz789")));
    });
}

#[test]
#[serial]
fn empty_environment_value_falls_through() {
    init_tracing();
    let l = layout();
    fs::write(l.install_root.join(CREDENTIAL_FILE), "from-install").unwrap();
    let _cwd = CwdGuard::enter(&l.work);

    temp_env::with_var(CREDENTIAL_ENV, Some(""), || {
        let got = chain_for(&l).resolve().unwrap();
        assert_eq!(got, Some(Credential::new("from-install")));
    });
}

#[test]
#[serial]
fn nothing_anywhere_is_absence_not_error() {
    init_tracing();
    let l = layout();
    let _cwd = CwdGuard::enter(&l.work);

    temp_env::with_var_unset(CREDENTIAL_ENV, || {
        let got = chain_for(&l).resolve();
        assert!(matches!(got, Ok(None)));
    });
}

#[test]
#[serial]
fn resolution_is_fresh_on_every_call() {
    init_tracing();
    let l = layout();
    let _cwd = CwdGuard::enter(&l.work);
    let resolver = chain_for(&l);

    temp_env::with_var_unset(CREDENTIAL_ENV, || {
        fs::write(l.work.join(CREDENTIAL_FILE), "first").unwrap();
        assert_eq!(resolver.resolve().unwrap(), Some(Credential::new("first")));

        fs::write(l.work.join(CREDENTIAL_FILE), "second").unwrap();
        assert_eq!(resolver.resolve().unwrap(), Some(Credential::new("second")));
    });
}
